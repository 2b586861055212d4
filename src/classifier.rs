// src/classifier.rs
//! Trained text classifier: the exported vectorizer + linear model bundle and the adapter that turns
//! normalised text into a labelled verdict.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

use crate::error::{Result, VerifyError};
use crate::types::ClassifierVerdict;

/// Reported when the model cannot give a calibrated probability. Carries no evidence either way.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Longest n-gram a vectorizer may request.
pub const MAX_NGRAM: usize = 10;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("static regex compiles"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    #[serde(default)]
    pub model_name: Option<String>,
    pub vectorizer: TfidfVectorizer,
    pub model: ModelSpec,
    #[serde(default = "default_label_map")]
    pub label_map: BTreeMap<i64, String>,
}

pub fn default_label_map() -> BTreeMap<i64, String> {
    BTreeMap::from([(0, "Fake".to_string()), (1, "Real".to_string())])
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub sublinear_tf: bool,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

pub type SparseVector = Vec<(usize, f64)>;

impl TfidfVectorizer {
    pub fn n_features(&self) -> usize {
        self.idf.len()
    }

    /// Same analyzer as at fit time: word tokens of two or more characters, n-grams over
    /// `ngram_range`, tf * idf, L2-normalised.
    pub fn transform(&self, text: &str) -> SparseVector {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_RE.find_iter(&lower).map(|m| m.as_str()).collect();
        let (lo, hi) = self.ngram_range;

        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for n in lo..=hi {
            if n == 0 || n > tokens.len() {
                continue;
            }
            for gram in tokens.windows(n) {
                if let Some(&col) = self.vocabulary.get(&gram.join(" ")) {
                    *counts.entry(col).or_insert(0.0) += 1.0;
                }
            }
        }

        let mut vec: SparseVector = counts
            .into_iter()
            .map(|(col, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (col, tf * self.idf[col])
            })
            .collect();
        let norm = vec.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vec.iter_mut().for_each(|(_, v)| *v /= norm);
        }
        vec
    }

    fn validate(&self) -> Result<()> {
        let n = self.idf.len();
        if n == 0 {
            return Err(VerifyError::ModelShape("vectorizer has no features".into()));
        }
        if let Some((term, col)) = self.vocabulary.iter().find(|(_, col)| **col >= n) {
            return Err(VerifyError::ModelShape(format!("vocabulary term {term:?} maps to column {col} but idf has {n} entries")));
        }
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi || hi > MAX_NGRAM {
            return Err(VerifyError::ModelShape(format!("invalid ngram_range ({lo}, {hi})")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression { coef: Vec<f64>, intercept: f64, classes: Vec<i64> },
    MultinomialNb { class_log_prior: Vec<f64>, feature_log_prob: Vec<Vec<f64>>, classes: Vec<i64> },
    /// Margin classifier with no probability output.
    LinearSvc { coef: Vec<f64>, intercept: f64, classes: Vec<i64> },
}

fn dot(x: &SparseVector, w: &[f64]) -> f64 {
    x.iter().map(|&(col, v)| v * w[col]).sum()
}

/// Predicts a class position (index into the model's `classes`).
pub trait Classifier: Send + Sync {
    fn predict(&self, x: &SparseVector) -> usize;
}

/// A classifier that can also report calibrated class probabilities.
pub trait ProbabilisticClassifier: Classifier {
    fn predict_proba(&self, x: &SparseVector) -> Vec<f64>;
}

struct LogisticRegression {
    coef: Vec<f64>,
    intercept: f64,
}

impl Classifier for LogisticRegression {
    fn predict(&self, x: &SparseVector) -> usize {
        usize::from(dot(x, &self.coef) + self.intercept > 0.0)
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, x: &SparseVector) -> Vec<f64> {
        let p = 1.0 / (1.0 + (-(dot(x, &self.coef) + self.intercept)).exp());
        vec![1.0 - p, p]
    }
}

struct MultinomialNb {
    class_log_prior: Vec<f64>,
    feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNb {
    fn joint_log_likelihood(&self, x: &SparseVector) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, flp)| prior + dot(x, flp))
            .collect()
    }
}

fn argmax(xs: &[f64]) -> usize {
    xs.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

impl Classifier for MultinomialNb {
    fn predict(&self, x: &SparseVector) -> usize {
        argmax(&self.joint_log_likelihood(x))
    }
}

impl ProbabilisticClassifier for MultinomialNb {
    fn predict_proba(&self, x: &SparseVector) -> Vec<f64> {
        let jll = self.joint_log_likelihood(x);
        let max = jll.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = jll.iter().map(|v| (v - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.into_iter().map(|v| v / total).collect()
    }
}

struct LinearSvc {
    coef: Vec<f64>,
    intercept: f64,
}

impl Classifier for LinearSvc {
    fn predict(&self, x: &SparseVector) -> usize {
        usize::from(dot(x, &self.coef) + self.intercept > 0.0)
    }
}

/// Probability support is decided once, when the bundle is loaded.
enum Scorer {
    Calibrated(Box<dyn ProbabilisticClassifier>),
    Uncalibrated(Box<dyn Classifier>),
}

impl Scorer {
    fn score(&self, x: &SparseVector) -> (usize, f64, bool) {
        match self {
            Scorer::Calibrated(m) => {
                let probs = m.predict_proba(x);
                let best = argmax(&probs);
                (best, probs[best], true)
            }
            Scorer::Uncalibrated(m) => (m.predict(x), NEUTRAL_CONFIDENCE, false),
        }
    }
}

fn check_len(what: &str, got: usize, want: usize) -> Result<()> {
    if got != want {
        return Err(VerifyError::ModelShape(format!("{what} has {got} entries, expected {want}")));
    }
    Ok(())
}

impl ModelSpec {
    fn into_scorer(self, n_features: usize) -> Result<(Scorer, Vec<i64>)> {
        match self {
            ModelSpec::LogisticRegression { coef, intercept, classes } => {
                check_len("logistic_regression.classes", classes.len(), 2)?;
                check_len("logistic_regression.coef", coef.len(), n_features)?;
                Ok((Scorer::Calibrated(Box::new(LogisticRegression { coef, intercept })), classes))
            }
            ModelSpec::MultinomialNb { class_log_prior, feature_log_prob, classes } => {
                if classes.len() < 2 {
                    return Err(VerifyError::ModelShape("multinomial_nb needs at least two classes".into()));
                }
                check_len("multinomial_nb.class_log_prior", class_log_prior.len(), classes.len())?;
                check_len("multinomial_nb.feature_log_prob", feature_log_prob.len(), classes.len())?;
                for row in &feature_log_prob {
                    check_len("multinomial_nb.feature_log_prob row", row.len(), n_features)?;
                }
                let model = MultinomialNb { class_log_prior, feature_log_prob };
                Ok((Scorer::Calibrated(Box::new(model)), classes))
            }
            ModelSpec::LinearSvc { coef, intercept, classes } => {
                check_len("linear_svc.classes", classes.len(), 2)?;
                check_len("linear_svc.coef", coef.len(), n_features)?;
                Ok((Scorer::Uncalibrated(Box::new(LinearSvc { coef, intercept })), classes))
            }
        }
    }
}

/// Fitted vectorizer and classifier, immutable after load and shared read-only across requests.
pub struct ClassifierAdapter {
    vectorizer: TfidfVectorizer,
    scorer: Scorer,
    classes: Vec<i64>,
    label_map: BTreeMap<i64, String>,
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("features", &self.vectorizer.n_features())
            .field("classes", &self.classes)
            .field("calibrated", &self.is_calibrated())
            .finish()
    }
}

impl ClassifierAdapter {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VerifyError::ModelNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let bundle: ModelBundle = serde_json::from_str(&raw)
            .map_err(|source| VerifyError::ModelFormat { path: path.to_path_buf(), source })?;
        let adapter = Self::from_bundle(bundle)?;
        info!(path = %path.display(), ?adapter, "classifier bundle loaded");
        Ok(adapter)
    }

    pub fn from_bundle(bundle: ModelBundle) -> Result<Self> {
        bundle.vectorizer.validate()?;
        let (scorer, classes) = bundle.model.into_scorer(bundle.vectorizer.n_features())?;
        Ok(Self { vectorizer: bundle.vectorizer, scorer, classes, label_map: bundle.label_map })
    }

    pub fn is_calibrated(&self) -> bool {
        matches!(self.scorer, Scorer::Calibrated(_))
    }

    fn label_for(&self, class_id: i64) -> String {
        self.label_map.get(&class_id).cloned().unwrap_or_else(|| class_id.to_string())
    }

    /// Label and confidence for text already run through `preprocess_text`.
    pub fn predict(&self, normalized_text: &str) -> ClassifierVerdict {
        let features = self.vectorizer.transform(normalized_text);
        let (pos, confidence, calibrated) = self.scorer.score(&features);
        ClassifierVerdict { label: self.label_for(self.classes[pos]), confidence, calibrated }
    }
}
