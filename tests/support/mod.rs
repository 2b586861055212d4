#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use newscheck_rs::classifier::{ClassifierAdapter, ModelBundle, ModelSpec, TfidfVectorizer};
use newscheck_rs::config::Config;
use newscheck_rs::embed::EmbeddingSimilarity;
use newscheck_rs::search::Searcher;
use newscheck_rs::types::{OfficialArticle, SimilarityResult};
use newscheck_rs::HybridVerifier;

#[derive(Default)]
pub struct FakeSearcher {
    pub results: Vec<OfficialArticle>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearcher {
    pub fn with(results: Vec<OfficialArticle>) -> Self {
        Self { results, queries: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl Searcher for FakeSearcher {
    async fn search(&self, query: &str, _timeout: Duration, limit: usize) -> Vec<OfficialArticle> {
        self.queries.lock().unwrap().push(query.to_string());
        self.results.iter().take(limit).cloned().collect()
    }
}

pub struct FixedEmbeddings(pub SimilarityResult);

#[async_trait]
impl EmbeddingSimilarity for FixedEmbeddings {
    async fn score(&self, _text: &str, candidates: &[String]) -> SimilarityResult {
        if candidates.is_empty() { SimilarityResult::NONE } else { self.0 }
    }
}

pub fn article(title: &str, summary: &str, link: &str) -> OfficialArticle {
    OfficialArticle {
        title: title.into(),
        summary: summary.into(),
        link: link.into(),
        source_domain: "https://www.bbc.com".into(),
    }
}

fn vectorizer() -> TfidfVectorizer {
    let vocabulary: HashMap<String, usize> =
        [("election".to_string(), 0), ("official".to_string(), 1)].into_iter().collect();
    TfidfVectorizer { vocabulary, idf: vec![1.0, 1.0], ngram_range: (1, 1), sublinear_tf: false }
}

/// Logistic model that ignores its input: a negative intercept always says Fake, a positive one Real.
pub fn constant_bundle(intercept: f64) -> ModelBundle {
    ModelBundle {
        model_name: None,
        vectorizer: vectorizer(),
        model: ModelSpec::LogisticRegression { coef: vec![0.0, 0.0], intercept, classes: vec![0, 1] },
        label_map: BTreeMap::from([(0, "Fake".to_string()), (1, "Real".to_string())]),
    }
}

/// Margin-only model: no probabilities, so confidence is the neutral 0.5.
pub fn margin_bundle() -> ModelBundle {
    ModelBundle {
        model: ModelSpec::LinearSvc { coef: vec![1.0, 1.0], intercept: -0.1, classes: vec![0, 1] },
        ..constant_bundle(0.0)
    }
}

pub fn verifier(
    searcher: Arc<dyn Searcher>,
    embeddings: Arc<dyn EmbeddingSimilarity>,
    bundle: ModelBundle,
) -> HybridVerifier {
    let clf = Arc::new(ClassifierAdapter::from_bundle(bundle).unwrap());
    HybridVerifier::new(&Config::default(), searcher, embeddings, clf)
}
