//! Access tokens for the lifetime of a session.
//!
//! A [`TokenSource`] hands out the current access token and refreshes it
//! (re-saving the cache) once it is about to expire, so long batches keep
//! working past the token's lifetime.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use tracing::info;

use super::token::{save_token, Token};
use super::TokenEndpoint;
use crate::error::{GmailError, Result};

pub struct TokenSource {
    token: Mutex<Token>,
    endpoint: Option<Box<dyn TokenEndpoint>>,
    cache_path: Option<PathBuf>,
}

impl TokenSource {
    /// Refresh through `endpoint` and write refreshed tokens to `cache_path`.
    pub fn new(
        token: Token,
        endpoint: Box<dyn TokenEndpoint>,
        cache_path: Option<PathBuf>,
    ) -> Self {
        Self {
            token: Mutex::new(token),
            endpoint: Some(endpoint),
            cache_path,
        }
    }

    /// A bearer token that never expires and is never refreshed.
    pub fn fixed(access_token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Token {
                access_token: access_token.into(),
                token_type: "Bearer".to_string(),
                refresh_token: None,
                expiry: None,
            }),
            endpoint: None,
            cache_path: None,
        }
    }

    /// Current access token, refreshed first if it has expired.
    ///
    /// The lock is held across the refresh so concurrent callers trigger a
    /// single request.
    pub fn access_token(&self) -> Result<String> {
        let mut token = self.lock();
        if !token.is_expired() {
            return Ok(token.access_token.clone());
        }

        let (Some(endpoint), Some(refresh_token)) =
            (self.endpoint.as_ref(), token.refresh_token.clone())
        else {
            return Err(GmailError::Authorization(
                "access token expired and cannot be refreshed".to_string(),
            ));
        };

        info!("Access token expired, refreshing");
        let refreshed = endpoint.refresh(&refresh_token)?;
        if let Some(path) = self.cache_path.as_deref() {
            save_token(path, &refreshed)?;
        }
        *token = refreshed;
        Ok(token.access_token.clone())
    }

    /// Snapshot of the current token.
    pub fn token(&self) -> Token {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Token> {
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSource")
            .field("refreshable", &self.endpoint.is_some())
            .field("cache_path", &self.cache_path)
            .finish_non_exhaustive()
    }
}
