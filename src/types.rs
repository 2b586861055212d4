use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub text: String,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl VerificationRequest {
    /// Trims both fields; blank text is rejected and a blank URL becomes `None`.
    pub fn validated(self) -> Result<Self> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(VerifyError::EmptyText);
        }
        let source_url = self
            .source_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Ok(Self { text, source_url })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficialArticle {
    pub title: String,
    pub summary: String,
    pub link: String,
    pub source_domain: String,
}

impl OfficialArticle {
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.summary).trim().to_string()
    }
}

/// Best score and candidate index for one similarity method; `best_index == -1` means no candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    pub score: f64,
    pub best_index: i64,
}

impl SimilarityResult {
    pub const NONE: SimilarityResult = SimilarityResult { score: 0.0, best_index: -1 };

    pub fn candidate(&self) -> Option<usize> {
        usize::try_from(self.best_index).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub label: String,
    pub confidence: f64,
    /// False when the model has no probability output and `confidence` is the 0.5 placeholder.
    pub calibrated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPath {
    TrustedSourceUrl,
    OfficialPortalVerification,
    MlSecondaryCheck,
}

impl DecisionPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionPath::TrustedSourceUrl => "trusted_source_url",
            DecisionPath::OfficialPortalVerification => "official_portal_verification",
            DecisionPath::MlSecondaryCheck => "ml_secondary_check",
        }
    }

    pub fn method(&self) -> VerificationMethod {
        match self {
            DecisionPath::TrustedSourceUrl | DecisionPath::OfficialPortalVerification => {
                VerificationMethod::OfficialSourceComparison
            }
            DecisionPath::MlSecondaryCheck => VerificationMethod::MachineLearning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalLabel {
    #[serde(rename = "Real News (Verified Official Source)")]
    VerifiedOfficial,
    #[serde(rename = "Fake News")]
    Fake,
    #[serde(rename = "Real (Unverified)")]
    RealUnverified,
    #[serde(rename = "Suspicious / Unverified News")]
    Suspicious,
}

impl FinalLabel {
    pub const ALL: [FinalLabel; 4] = [
        FinalLabel::VerifiedOfficial,
        FinalLabel::Fake,
        FinalLabel::RealUnverified,
        FinalLabel::Suspicious,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FinalLabel::VerifiedOfficial => "Real News (Verified Official Source)",
            FinalLabel::Fake => "Fake News",
            FinalLabel::RealUnverified => "Real (Unverified)",
            FinalLabel::Suspicious => "Suspicious / Unverified News",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultCategory {
    Real,
    Fake,
    Unverified,
}

impl ResultCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCategory::Real => "Real",
            ResultCategory::Fake => "Fake",
            ResultCategory::Unverified => "Unverified",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Real" => Some(ResultCategory::Real),
            "Fake" => Some(ResultCategory::Fake),
            "Unverified" => Some(ResultCategory::Unverified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationMethod {
    #[serde(rename = "Official Source Comparison")]
    OfficialSourceComparison,
    #[serde(rename = "Machine Learning")]
    MachineLearning,
}

impl VerificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationMethod::OfficialSourceComparison => "Official Source Comparison",
            VerificationMethod::MachineLearning => "Machine Learning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedArticle {
    pub title: String,
    pub link: String,
    pub source: String,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub final_label: FinalLabel,
    pub reasoning: String,
    pub decision_path: DecisionPath,
    pub matched_article: Option<MatchedArticle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityBreakdown {
    pub tfidf: f64,
    pub embedding: f64,
    pub best: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResponse {
    pub result: ResultCategory,
    pub verification_method: VerificationMethod,
    pub final_label: FinalLabel,
    pub prediction: String,
    pub reasoning: String,
    pub decision_path: DecisionPath,
    pub confidence: f64,
    pub confidence_calibrated: bool,
    pub source_domain: Option<String>,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
    pub similarity: SimilarityBreakdown,
    pub matched_article: Option<MatchedArticle>,
    pub official_articles_checked: usize,
}

/// Rounds to 4 decimal places for the response payload.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation_trims_and_rejects_blank() {
        let req = VerificationRequest { text: "  hello  ".into(), source_url: Some("   ".into()) };
        let v = req.validated().unwrap();
        assert_eq!(v.text, "hello");
        assert!(v.source_url.is_none());

        let blank = VerificationRequest { text: " \n\t".into(), source_url: None };
        assert!(matches!(blank.validated(), Err(VerifyError::EmptyText)));
    }

    #[test]
    fn combined_text_joins_title_and_summary() {
        let a = OfficialArticle { title: "Title".into(), summary: "".into(), ..Default::default() };
        assert_eq!(a.combined_text(), "Title");
        let b = OfficialArticle { title: "T".into(), summary: "S".into(), ..Default::default() };
        assert_eq!(b.combined_text(), "T S");
    }

    #[test]
    fn enums_serialize_to_wire_strings() {
        assert_eq!(serde_json::to_value(FinalLabel::Suspicious).unwrap(), "Suspicious / Unverified News");
        assert_eq!(serde_json::to_value(DecisionPath::MlSecondaryCheck).unwrap(), "ml_secondary_check");
        assert_eq!(
            serde_json::to_value(VerificationMethod::OfficialSourceComparison).unwrap(),
            "Official Source Comparison"
        );
        for label in FinalLabel::ALL {
            assert_eq!(serde_json::to_value(label).unwrap(), label.as_str());
        }
    }

    #[test]
    fn round4_rounds_half_away() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(0.0), 0.0);
    }
}
