//! Google client-secret documents.

use std::path::Path;

use serde::Deserialize;

use crate::error::{GmailError, Result};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Redirect used when the document lists none: the code is shown to the
/// user, who pastes it back.
pub const OUT_OF_BAND_REDIRECT: &str = "urn:ietf:wg:oauth:2.0:oob";

/// OAuth client registration, as downloaded from the Google console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// The document wraps the registration in `installed` or `web`.
#[derive(Deserialize)]
struct SecretDocument {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecret {
    /// Read and parse a client-secret file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| GmailError::io(path, e))?;
        Self::from_json(&contents).map_err(|reason| GmailError::InvalidCredentials {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse a client-secret document. `installed` wins over `web`.
    pub fn from_json(json: &str) -> std::result::Result<Self, String> {
        let doc: SecretDocument = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let secret = doc
            .installed
            .or(doc.web)
            .ok_or_else(|| "expected an \"installed\" or \"web\" section".to_string())?;
        if secret.client_id.is_empty() {
            return Err("client_id is empty".to_string());
        }
        Ok(secret)
    }

    /// First registered redirect URI.
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(OUT_OF_BAND_REDIRECT)
    }
}
