//! Billing error types

use thiserror::Error;
use uuid::Uuid;

pub type BillingResult<T> = Result<T, BillingError>;

/// Errors raised while calculating or recording partner billing
///
/// A calculation that legitimately finds nothing to bill returns a zero quote;
/// these variants are only for runs that could not produce an answer.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hasura request failed: {0}")]
    Transport(String),

    #[error("Hasura returned errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Malformed Hasura response: {0}")]
    MalformedResponse(String),

    #[error("No subscription found for partner {0}")]
    NoSubscription(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for BillingError {
    fn from(err: reqwest::Error) -> Self {
        BillingError::Transport(err.to_string())
    }
}

impl BillingError {
    /// True when the failure came from the Hasura side rather than the caller
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            BillingError::Transport(_)
                | BillingError::GraphQl(_)
                | BillingError::MalformedResponse(_)
        )
    }
}
