// src/config.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, VerifyError};

pub const DEFAULT_TRUSTED_DOMAINS: [&str; 4] = ["bbc.com", "reuters.com", "ndtv.com", "thehindu.com"];
pub const DEFAULT_OFFICIAL_DOMAINS: [&str; 4] = ["bbc.com", "reuters.com", "thehindu.com", "ndtv.com"];

/// Process-wide settings. Built once at startup and handed to each component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trusted_domains: Vec<String>,
    /// Domains used for `site:` filters when searching for official coverage; order is kept.
    pub official_domains: Vec<String>,
    pub portal_threshold: f64,
    pub retrieval: RetrievalConfig,
    pub embedding: Option<EmbeddingConfig>,
    pub model_path: PathBuf,
    pub history_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub endpoint: String,
    pub hl: String,
    pub gl: String,
    pub ceid: String,
    pub timeout_secs: u64,
    pub limit: usize,
    pub query_keywords: usize,
    pub max_qps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trusted_domains: DEFAULT_TRUSTED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            official_domains: DEFAULT_OFFICIAL_DOMAINS.iter().map(|d| d.to_string()).collect(),
            portal_threshold: 0.62,
            retrieval: RetrievalConfig::default(),
            embedding: None,
            model_path: PathBuf::from("models/best_model.json"),
            history_path: PathBuf::from("data/history.jsonl"),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://news.google.com/rss/search".into(),
            hl: "en-IN".into(),
            gl: "IN".into(),
            ceid: "IN:en".into(),
            timeout_secs: 8,
            limit: 12,
            query_keywords: 6,
            max_qps: 2,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".into(),
            base_url: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Reads a JSON config file when given, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| VerifyError::Config(format!("{}: {e}", path.display())))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.portal_threshold) {
            return Err(VerifyError::Config(format!(
                "portal_threshold must be within [0, 1], got {}",
                self.portal_threshold
            )));
        }
        if self.trusted_domains.iter().all(|d| d.trim().is_empty()) {
            return Err(VerifyError::Config("trusted_domains is empty".into()));
        }
        if self.official_domains.iter().all(|d| d.trim().is_empty()) {
            return Err(VerifyError::Config("official_domains is empty".into()));
        }
        let r = &self.retrieval;
        if r.limit == 0 || r.timeout_secs == 0 || r.query_keywords == 0 || r.max_qps == 0 {
            return Err(VerifyError::Config(
                "retrieval limit, timeout_secs, query_keywords and max_qps must be positive".into(),
            ));
        }
        if let Some(e) = &self.embedding {
            if e.model.trim().is_empty() || e.timeout_secs == 0 {
                return Err(VerifyError::Config("embedding needs a model name and a positive timeout".into()));
            }
        }
        Ok(())
    }
}
