//! Error surface shared by every session store backend.

use std::error::Error;
use thiserror::Error;

/// Result alias for session store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reported by a session store, whatever engine backs it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the operation.
    #[error("session store unavailable: {message}")]
    Unavailable {
        /// Operator-facing description of what failed.
        message: String,
        /// Underlying backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Wrap a backend failure with an operator-facing message.
    pub fn unavailable(
        message: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        StorageError::Unavailable {
            message: message.into(),
            source: Box::new(source),
        }
    }
}
