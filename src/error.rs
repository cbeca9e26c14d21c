//! Centralized error types for ezgmail.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the ezgmail library.
///
/// Base64 decode failures in bodies and attachment payloads are deliberately
/// absent: those degrade to empty bytes and never reach the caller.
#[derive(Error, Debug)]
pub enum GmailError {
    /// I/O error with the associated file path.
    #[error("I/O error accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The client-secret document could not be read or understood.
    #[error("Invalid client secret file '{path}': {reason}")]
    InvalidCredentials { path: PathBuf, reason: String },

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The authorization flow or a token exchange failed.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// The token cache file exists but cannot be used.
    #[error("Unusable token cache '{path}': {reason}")]
    TokenCache { path: PathBuf, reason: String },

    /// The API answered with a non-success HTTP status.
    #[error("Gmail API {operation} failed with status {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The request never produced an HTTP response (DNS, TLS, connection...).
    #[error("Gmail API {operation} could not be sent: {reason}")]
    Transport {
        operation: &'static str,
        reason: String,
    },

    /// The response body was not the JSON document we expected.
    #[error("Gmail API {operation} returned an unreadable response: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },
}

/// Convenience alias for `Result<T, GmailError>`.
pub type Result<T> = std::result::Result<T, GmailError>;

impl GmailError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// `true` for errors raised by a remote call (list, get, attachment, token).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Transport { .. } | Self::Decode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = GmailError::Api {
            operation: "messages.get",
            status: 404,
            message: "Not Found".into(),
        };
        assert_eq!(
            err.to_string(),
            "Gmail API messages.get failed with status 404: Not Found"
        );
        assert!(err.is_remote());
    }

    #[test]
    fn test_io_is_not_remote() {
        let err = GmailError::io(
            "client_secret.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(!err.is_remote());
        assert!(err.to_string().contains("client_secret.json"));
    }
}
