use crate::types::{Decision, DecisionPath, FinalLabel, MatchedArticle};

pub const FAKE_CONFIDENCE_THRESHOLD: f64 = 0.70;
pub const REAL_CONFIDENCE_THRESHOLD: f64 = 0.65;

pub const REASON_TRUSTED_URL: &str = "Input source URL belongs to trusted official domain.";
pub const REASON_PORTAL_MATCH: &str = "High similarity with official portal article.";
pub const REASON_ML_FAKE: &str = "Official verification failed and ML confidence for fake is high.";
pub const REASON_ML_REAL: &str = "Official verification not found, but ML confidence indicates likely real.";
pub const REASON_INCONCLUSIVE: &str = "Neither official verification nor ML confidence was strong enough.";

/// Priority-ordered verdict; the first matching rule wins. `matched_article` passes through untouched.
pub fn make_final_decision(
    portal_score: f64,
    portal_threshold: f64,
    ml_label: &str,
    ml_confidence: f64,
    matched_article: Option<MatchedArticle>,
) -> Decision {
    let (final_label, reasoning, decision_path) = if portal_score >= portal_threshold {
        (FinalLabel::VerifiedOfficial, REASON_PORTAL_MATCH, DecisionPath::OfficialPortalVerification)
    } else if ml_label.eq_ignore_ascii_case("fake") && ml_confidence >= FAKE_CONFIDENCE_THRESHOLD {
        (FinalLabel::Fake, REASON_ML_FAKE, DecisionPath::MlSecondaryCheck)
    } else if ml_label.eq_ignore_ascii_case("real") && ml_confidence >= REAL_CONFIDENCE_THRESHOLD {
        (FinalLabel::RealUnverified, REASON_ML_REAL, DecisionPath::MlSecondaryCheck)
    } else {
        (FinalLabel::Suspicious, REASON_INCONCLUSIVE, DecisionPath::MlSecondaryCheck)
    };
    Decision { final_label, reasoning: reasoning.to_string(), decision_path, matched_article }
}

/// Forced outcome when the submitted URL is itself on the trusted list.
pub fn trusted_source_decision(matched_article: Option<MatchedArticle>) -> Decision {
    Decision {
        final_label: FinalLabel::VerifiedOfficial,
        reasoning: REASON_TRUSTED_URL.to_string(),
        decision_path: DecisionPath::TrustedSourceUrl,
        matched_article,
    }
}
