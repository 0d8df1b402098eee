//! Intent classifier port
//!
//! Natural-language classification is an external collaborator; the
//! orchestrator only needs the resulting [`IntentClassification`].

use async_trait::async_trait;
use finsense_domain::IntentClassification;
use thiserror::Error;

/// Errors that can occur during classification
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed classification: {0}")]
    Malformed(String),
}

/// Classifies a user query given recent history lines.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// `context` holds the most recent history entries, oldest first.
    async fn classify(
        &self,
        query: &str,
        context: &[String],
    ) -> Result<IntentClassification, ClassifierError>;
}
