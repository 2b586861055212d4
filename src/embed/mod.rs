//! Optional dense-embedding similarity. `NoEmbeddings` stands in when no backend is configured.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::similarity::best_of;
use crate::types::SimilarityResult;

/// Turns strings into dense vectors, one per input, in order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Best embedding similarity between `text` and the candidates. Never fails: an unavailable
/// backend scores `(0.0, -1)`.
#[async_trait]
pub trait EmbeddingSimilarity: Send + Sync {
    async fn score(&self, text: &str, candidates: &[String]) -> SimilarityResult;
}

pub struct NoEmbeddings;

#[async_trait]
impl EmbeddingSimilarity for NoEmbeddings {
    async fn score(&self, _text: &str, _candidates: &[String]) -> SimilarityResult {
        SimilarityResult::NONE
    }
}

/// Cosine similarity over unit-normalised embeddings from any `Embedder`.
pub struct DenseSimilarity<E> {
    embedder: E,
    timeout: Duration,
}

impl<E: Embedder> DenseSimilarity<E> {
    pub fn new(embedder: E, timeout: Duration) -> Self {
        Self { embedder, timeout }
    }

    async fn try_score(&self, text: &str, candidates: &[String]) -> Result<SimilarityResult> {
        let inputs: Vec<String> = std::iter::once(text.to_string()).chain(candidates.iter().cloned()).collect();
        let expected = inputs.len();
        let vectors = tokio::time::timeout(self.timeout, self.embedder.embed(inputs)).await??;
        if vectors.len() != expected {
            anyhow::bail!("embedder returned {} vectors for {expected} inputs", vectors.len());
        }
        let unit: Vec<Vec<f32>> = vectors.into_iter().map(normalize).collect();
        let (source, targets) = unit.split_first().ok_or_else(|| anyhow::anyhow!("no embeddings"))?;
        if targets.iter().any(|t| t.len() != source.len()) {
            anyhow::bail!("embedding dimensions differ");
        }
        let scores: Vec<f64> = targets
            .iter()
            .map(|t| t.iter().zip(source).map(|(a, b)| f64::from(a * b)).sum())
            .collect();
        Ok(best_of(&scores))
    }
}

fn normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

#[async_trait]
impl<E: Embedder> EmbeddingSimilarity for DenseSimilarity<E> {
    async fn score(&self, text: &str, candidates: &[String]) -> SimilarityResult {
        if text.trim().is_empty() || candidates.is_empty() {
            return SimilarityResult::NONE;
        }
        match self.try_score(text, candidates).await {
            Ok(r) => r,
            Err(err) => {
                warn!(error = %err, "embedding similarity unavailable, scoring zero");
                SimilarityResult::NONE
            }
        }
    }
}
