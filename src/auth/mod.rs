//! Delegated authorization: the OAuth2 installed-application flow.
//!
//! On startup the cached token is used if present, refreshed when expired.
//! Otherwise the user is shown a consent URL, pastes back the authorization
//! code, and the exchanged token is written to the cache.

pub mod secret;
pub mod source;
pub mod token;

use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use url::Url;

use crate::error::{GmailError, Result};
use crate::transport::{map_ureq_error, read_json};

use self::secret::ClientSecret;
use self::token::{load_token, save_token, Token, TokenResponse};

/// Read-only access to the mailbox.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// Opaque `state` value echoed back by the consent page.
const AUTH_STATE: &str = "state-token";

/// Consent URL requesting offline (refreshable) read-only access.
pub fn auth_code_url(secret: &ClientSecret) -> Result<Url> {
    Url::parse_with_params(
        &secret.auth_uri,
        &[
            ("access_type", "offline"),
            ("client_id", secret.client_id.as_str()),
            ("redirect_uri", secret.redirect_uri()),
            ("response_type", "code"),
            ("scope", GMAIL_READONLY_SCOPE),
            ("state", AUTH_STATE),
        ],
    )
    .map_err(|e| GmailError::Authorization(format!("invalid auth_uri '{}': {e}", secret.auth_uri)))
}

/// Read the authorization code: the first whitespace-delimited word of input.
pub fn read_auth_code(input: &mut dyn BufRead) -> Result<String> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = input
            .read_line(&mut line)
            .map_err(|e| GmailError::Authorization(format!("unable to read authorization code: {e}")))?;
        if read == 0 {
            return Err(GmailError::Authorization(
                "no authorization code entered".to_string(),
            ));
        }
        if let Some(code) = line.split_whitespace().next() {
            return Ok(code.to_string());
        }
    }
}

/// The two calls made against the OAuth token endpoint.
pub trait TokenEndpoint: Send + Sync {
    /// Trade an authorization code for a token.
    fn exchange(&self, code: &str) -> Result<Token>;

    /// Obtain a fresh access token from a refresh token.
    fn refresh(&self, refresh_token: &str) -> Result<Token>;
}

/// Exchanges codes and refresh tokens at the client's token endpoint.
pub struct TokenClient {
    agent: ureq::Agent,
    secret: ClientSecret,
}

impl TokenClient {
    pub fn new(secret: ClientSecret, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            secret,
        }
    }

    pub fn secret(&self) -> &ClientSecret {
        &self.secret
    }

    fn post(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        const OPERATION: &str = "oauth2.token";
        let response = self
            .agent
            .post(&self.secret.token_uri)
            .send_form(form)
            .map_err(|e| GmailError::Authorization(map_ureq_error(OPERATION, e).to_string()))?;
        read_json(OPERATION, response).map_err(|e| GmailError::Authorization(e.to_string()))
    }
}

impl TokenEndpoint for TokenClient {
    fn exchange(&self, code: &str) -> Result<Token> {
        let response = self.post(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("redirect_uri", self.secret.redirect_uri()),
        ])?;
        Ok(response.into_token(Utc::now(), None))
    }

    fn refresh(&self, refresh_token: &str) -> Result<Token> {
        let response = self.post(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
        ])?;
        Ok(response.into_token(Utc::now(), Some(refresh_token.to_string())))
    }
}

impl std::fmt::Debug for TokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClient")
            .field("client_id", &self.secret.client_id)
            .field("token_uri", &self.secret.token_uri)
            .finish_non_exhaustive()
    }
}

/// Obtain a usable token, prompting on stdin/stdout when nothing is cached.
pub fn authorize(client: &TokenClient, cache_path: &Path) -> Result<Token> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();
    authorize_with(client.secret(), client, cache_path, &mut input, &mut output)
}

/// [`authorize`] with an explicit endpoint and prompt streams.
pub fn authorize_with(
    secret: &ClientSecret,
    endpoint: &dyn TokenEndpoint,
    cache_path: &Path,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<Token> {
    match load_token(cache_path) {
        Ok(Some(token)) if !token.is_expired() => return Ok(token),
        Ok(Some(token)) => {
            if let Some(refresh_token) = token.refresh_token.as_deref() {
                info!("Cached token expired, refreshing");
                let refreshed = endpoint.refresh(refresh_token)?;
                save_token(cache_path, &refreshed)?;
                return Ok(refreshed);
            }
            warn!("Cached token expired and cannot be refreshed");
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unusable token cache"),
    }

    let token = authorize_interactively(secret, endpoint, input, output)?;
    writeln!(output, "Saving credential file to: {}", cache_path.display())
        .map_err(|e| GmailError::io(cache_path, e))?;
    save_token(cache_path, &token)?;
    Ok(token)
}

/// Run the consent prompt and exchange the pasted code.
pub fn authorize_interactively(
    secret: &ClientSecret,
    endpoint: &dyn TokenEndpoint,
    input: &mut dyn BufRead,
    output: &mut dyn Write,
) -> Result<Token> {
    let url = auth_code_url(secret)?;
    writeln!(
        output,
        "Go to the following link in your browser then type the authorization code:\n{url}"
    )
    .and_then(|()| output.flush())
    .map_err(|e| GmailError::Authorization(format!("unable to show consent URL: {e}")))?;

    let code = read_auth_code(input)?;
    endpoint.exchange(&code)
}
