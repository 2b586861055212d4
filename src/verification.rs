// src/verification.rs
//! The hybrid pipeline: trusted-URL check, official article retrieval and similarity, classifier,
//! then arbitration into one response.

use std::sync::Arc;
use tracing::{debug, info};

use crate::classifier::ClassifierAdapter;
use crate::config::{Config, RetrievalConfig};
use crate::decision::{make_final_decision, trusted_source_decision};
use crate::embed::{openai::OpenAiEmbedder, DenseSimilarity, EmbeddingSimilarity, NoEmbeddings};
use crate::error::Result;
use crate::preprocess::{extract_entities, extract_keywords, preprocess_text, DEFAULT_KEYWORDS};
use crate::retrieve::fetch_official_articles;
use crate::search::{GoogleNewsRss, Searcher};
use crate::similarity::{combine, tfidf_similarity};
use crate::source::{normalize_domain, TrustedDomains};
use crate::types::*;

/// Confidence reported when the trusted-URL rule decides.
pub const TRUSTED_SOURCE_CONFIDENCE: f64 = 1.0;

/// Response category from the final label text alone.
pub fn result_category(final_label: &str) -> ResultCategory {
    let text = final_label.to_lowercase();
    if text.contains("unverified") || text.contains("suspicious") {
        ResultCategory::Unverified
    } else if text.contains("fake") {
        ResultCategory::Fake
    } else if text.contains("verified official source") || text.starts_with("real") {
        ResultCategory::Real
    } else {
        ResultCategory::Unverified
    }
}

/// Shared, read-only pipeline state. Each `analyze` call builds its own per-request values.
#[derive(Clone)]
pub struct HybridVerifier {
    trusted: TrustedDomains,
    official_domains: Vec<String>,
    portal_threshold: f64,
    retrieval: RetrievalConfig,
    searcher: Arc<dyn Searcher>,
    embeddings: Arc<dyn EmbeddingSimilarity>,
    classifier: Arc<ClassifierAdapter>,
}

impl HybridVerifier {
    pub fn new(
        cfg: &Config,
        searcher: Arc<dyn Searcher>,
        embeddings: Arc<dyn EmbeddingSimilarity>,
        classifier: Arc<ClassifierAdapter>,
    ) -> Self {
        Self {
            trusted: TrustedDomains::new(&cfg.trusted_domains),
            official_domains: cfg.official_domains.clone(),
            portal_threshold: cfg.portal_threshold,
            retrieval: cfg.retrieval.clone(),
            searcher,
            embeddings,
            classifier,
        }
    }

    /// Validates the config and loads the classifier bundle; either failing stops startup.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        cfg.validate()?;
        let classifier = Arc::new(ClassifierAdapter::load(&cfg.model_path)?);
        let searcher: Arc<dyn Searcher> = Arc::new(GoogleNewsRss::new(&cfg.retrieval));
        let embeddings: Arc<dyn EmbeddingSimilarity> = match &cfg.embedding {
            Some(e) => {
                info!(model = %e.model, "embedding similarity enabled");
                Arc::new(DenseSimilarity::new(OpenAiEmbedder::from_config(e), e.timeout()))
            }
            None => Arc::new(NoEmbeddings),
        };
        Ok(Self::new(cfg, searcher, embeddings, classifier))
    }

    pub fn is_trusted(&self, url: &str) -> bool {
        self.trusted.is_trusted(url)
    }

    pub async fn analyze(&self, req: VerificationRequest) -> Result<VerificationResponse> {
        let VerificationRequest { text, source_url } = req.validated()?;

        let source_domain = source_url.as_deref().map(normalize_domain);
        let trusted_source = source_url.as_deref().is_some_and(|u| self.trusted.is_trusted(u));
        let cleaned = preprocess_text(&text);
        let keywords = extract_keywords(&text, DEFAULT_KEYWORDS);
        let entities = extract_entities(&text);

        let articles = fetch_official_articles(
            self.searcher.as_ref(),
            &text,
            &self.official_domains,
            self.retrieval.query_keywords,
            self.retrieval.timeout(),
            self.retrieval.limit,
        )
        .await;
        let article_texts: Vec<String> = articles.iter().map(OfficialArticle::combined_text).collect();

        let lexical = tfidf_similarity(&text, &article_texts);
        let embedding = self.embeddings.score(&text, &article_texts).await;
        let best = combine(lexical, embedding);
        debug!(?lexical, ?embedding, "similarity scored");

        let matched_article = best.candidate().and_then(|i| articles.get(i)).map(|a| MatchedArticle {
            title: a.title.clone(),
            link: a.link.clone(),
            source: a.source_domain.clone(),
            similarity_score: round4(best.score),
        });

        let verdict = self.classifier.predict(&cleaned);

        let (decision, confidence, confidence_calibrated) = if trusted_source {
            (trusted_source_decision(matched_article), TRUSTED_SOURCE_CONFIDENCE, true)
        } else {
            let d = make_final_decision(
                best.score,
                self.portal_threshold,
                &verdict.label,
                verdict.confidence,
                matched_article,
            );
            (d, verdict.confidence, verdict.calibrated)
        };

        let result = result_category(decision.final_label.as_str());
        info!(
            path = decision.decision_path.as_str(),
            result = result.as_str(),
            portal_score = best.score,
            ml_label = %verdict.label,
            ml_confidence = verdict.confidence,
            articles = articles.len(),
            "verification complete"
        );

        Ok(VerificationResponse {
            result,
            verification_method: decision.decision_path.method(),
            final_label: decision.final_label,
            prediction: verdict.label,
            reasoning: decision.reasoning,
            decision_path: decision.decision_path,
            confidence,
            confidence_calibrated,
            source_domain,
            keywords,
            entities,
            similarity: SimilarityBreakdown {
                tfidf: round4(lexical.score),
                embedding: round4(embedding.score),
                best: round4(best.score),
            },
            matched_article: decision.matched_article,
            official_articles_checked: articles.len(),
        })
    }
}
