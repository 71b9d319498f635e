//! Store error types

use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document or version does not exist for the given owner.
    ///
    /// Cross-owner access reports NotFound rather than a permission error
    /// so that record existence is never leaked.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Version-number assignment kept colliding with concurrent appends
    #[error("Version conflict for document {document_id} after {attempts} attempts")]
    Conflict { document_id: String, attempts: u32 },

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Check whether this error is a not-found condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
