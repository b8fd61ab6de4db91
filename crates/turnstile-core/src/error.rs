//! Core errors

use thiserror::Error;

/// Core errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Inbound callback signature does not match the computed digest
    #[error("signature mismatch for invoice {invoice_id}")]
    SignatureMismatch {
        /// Invoice id from the rejected callback
        invoice_id: String,
    },

    /// A callback field failed to parse after signature verification
    #[error("malformed callback field: {0}")]
    MalformedCallback(&'static str),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] turnstile_db::DbError),

    /// Messenger delivery or channel administration error
    #[error("messenger error: {0}")]
    Messenger(String),

    /// Recurring-charge provider error
    #[error("charge provider error: {0}")]
    Provider(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Check if this is a callback rejection (bad signature or bad fields)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::SignatureMismatch { .. } | Self::MalformedCallback(_)
        )
    }

    /// Check if this is a transient store failure
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}
