//! Error types for the secret-store client
//!
//! Provides unified error handling using thiserror. Every wire-layer failure is
//! normalized into one of these kinds so callers never see transport-library
//! errors directly.

use thiserror::Error;

// == Vault Error Enum ==
/// Unified error type for client operations.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The addressed secret does not exist
    #[error("Secret not found: {path}")]
    NotFound { path: String },

    /// No response was received from the server
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A response was received with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Protocol {
        status: u16,
        message: String,
        /// Server-reported error strings, when the body carried them
        errors: Vec<String>,
    },

    /// Caller-supplied input rejected before any wire call
    #[error("Validation error: {0}")]
    Validation(String),

    /// A success response whose body could not be decoded
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl VaultError {
    /// Create a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a protocol error from a status and the server's error list.
    ///
    /// The message joins the server errors, falling back to the bare status
    /// when the list is empty.
    pub fn protocol(status: u16, errors: Vec<String>) -> Self {
        let message = if errors.is_empty() {
            format!("HTTP {}", status)
        } else {
            errors.join("; ")
        };
        Self::Protocol {
            status,
            message,
            errors,
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true for [`VaultError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for client operations.
pub type Result<T> = std::result::Result<T, VaultError>;
