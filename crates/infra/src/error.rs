//! Store error model.

use thiserror::Error;

use stockroom_core::DomainError;

/// Error surfaced by store operations.
///
/// Domain failures pass through unchanged; everything the backing storage
/// throws (connection loss, failed commit) becomes `Storage` — the one kind
/// a caller may reasonably retry. The store itself never retries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Storage(e.to_string())
    }
}
