// src/history.rs
//! Append-only verification log kept as JSON lines, with paging, clearing and CSV export.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::types::{ResultCategory, VerificationMethod};

pub const SUMMARY_MAX_CHARS: usize = 140;
pub const CSV_HEADER: [&str; 5] = ["Date", "News Summary", "Source", "Result", "Method"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: u64,
    pub created_at: String,
    pub news_summary: String,
    pub source_url: Option<String>,
    pub result: ResultCategory,
    pub method: VerificationMethod,
}

/// Write-only destination for completed verifications.
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(
        &self,
        news_text: &str,
        source_url: Option<&str>,
        result: ResultCategory,
        method: VerificationMethod,
    ) -> Result<()>;
}

/// Whitespace-collapsed text cut to `max_len` characters, ending in `...` when shortened.
pub fn summarize_text(text: &str, max_len: usize) -> String {
    let clean = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.chars().count() <= max_len {
        return clean;
    }
    let mut cut: String = clean.chars().take(max_len.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_row(fields: &[&str]) -> String {
    let mut line = fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

pub struct JsonlHistory {
    path: PathBuf,
    // Highest id written so far; `None` until the file has been scanned once.
    last_id: Mutex<Option<u64>>,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), last_id: Mutex::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<HistoryRecord>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };
        let mut out = Vec::new();
        for (n, line) in raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
            match serde_json::from_str::<HistoryRecord>(line) {
                Ok(rec) => out.push(rec),
                Err(err) => warn!(line = n + 1, error = %err, "skipping unreadable history line"),
            }
        }
        Ok(out)
    }

    /// Newest first. `result_filter` narrows to one category.
    pub async fn fetch(
        &self,
        limit: usize,
        offset: usize,
        result_filter: Option<ResultCategory>,
    ) -> Result<Vec<HistoryRecord>> {
        let _guard = self.last_id.lock().await;
        let mut rows = self.read_all().await?;
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows
            .into_iter()
            .filter(|r| result_filter.map_or(true, |f| r.result == f))
            .skip(offset)
            .take(limit)
            .collect())
    }

    pub async fn clear(&self) -> Result<()> {
        let mut last_id = self.last_id.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("clearing {}", self.path.display())),
        }
        *last_id = Some(0);
        info!(path = %self.path.display(), "history cleared");
        Ok(())
    }

    /// Writes every record, newest first, as CSV and returns the written path.
    pub async fn export_csv(&self, out: &Path) -> Result<PathBuf> {
        let rows = self.fetch(usize::MAX, 0, None).await?;
        if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut body = csv_row(&CSV_HEADER);
        for r in &rows {
            body.push_str(&csv_row(&[
                r.created_at.as_str(),
                r.news_summary.as_str(),
                r.source_url.as_deref().unwrap_or(""),
                r.result.as_str(),
                r.method.as_str(),
            ]));
        }
        tokio::fs::write(out, body).await.with_context(|| format!("writing {}", out.display()))?;
        info!(rows = rows.len(), path = %out.display(), "history exported");
        Ok(out.to_path_buf())
    }
}

#[async_trait]
impl HistorySink for JsonlHistory {
    async fn record(
        &self,
        news_text: &str,
        source_url: Option<&str>,
        result: ResultCategory,
        method: VerificationMethod,
    ) -> Result<()> {
        let mut last_id = self.last_id.lock().await;
        let prev = match *last_id {
            Some(id) => id,
            None => self.read_all().await?.iter().map(|r| r.id).max().unwrap_or(0),
        };
        let next_id = prev + 1;
        let rec = HistoryRecord {
            id: next_id,
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            news_summary: summarize_text(news_text, SUMMARY_MAX_CHARS),
            source_url: source_url.map(str::trim).filter(|u| !u.is_empty()).map(str::to_string),
            result,
            method,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let mut line = serde_json::to_string(&rec)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        *last_id = Some(next_id);
        Ok(())
    }
}
