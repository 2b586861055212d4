pub mod classifier;
pub mod config;
pub mod decision;
pub mod embed;
pub mod error;
pub mod history;
pub mod preprocess;
pub mod retrieve;
pub mod search;
pub mod segments;
pub mod similarity;
pub mod source;
pub mod types;
pub mod verification;

pub use error::VerifyError;
pub use types::{VerificationRequest, VerificationResponse};
pub use verification::HybridVerifier;
