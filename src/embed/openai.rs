use anyhow::Result;
use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};

use super::Embedder;
use crate::config::EmbeddingConfig;

/// Sentence embeddings from an OpenAI-compatible `/embeddings` endpoint (for example a local
/// text-embeddings server hosting all-MiniLM-L6-v2).
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(model: String, base_url: Option<String>, api_key: Option<String>) -> Self {
        let mut cfg = OpenAIConfig::default();
        if let Some(url) = base_url { cfg = cfg.with_api_base(url); }
        if let Some(key) = api_key { cfg = cfg.with_api_key(key); }
        let client = Client::with_config(cfg);
        Self { client, model }
    }

    pub fn from_config(cfg: &EmbeddingConfig) -> Self {
        Self::new(cfg.model.clone(), cfg.base_url.clone(), cfg.api_key.clone())
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let req = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(inputs)
            .build()?;
        let resp = self.client.embeddings().create(req).await?;
        let mut data = resp.data;
        data.sort_by_key(|e| e.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}
