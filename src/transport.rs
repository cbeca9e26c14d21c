//! Remote calls against the Gmail REST API.
//!
//! [`MailTransport`] is the seam between the query/parse core and the
//! network. [`HttpTransport`] is the real, blocking implementation; tests
//! substitute their own.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::api::{ListMessagesResponse, ListRequest, MessagePartBody, RawMessage};
use crate::auth::source::TokenSource;
use crate::error::{GmailError, Result};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// A transport shared between the service and every attachment it produces.
pub type SharedTransport = Arc<dyn MailTransport>;

/// The three remote operations this crate needs.
///
/// Every call is a single blocking round trip. Implementations must not
/// retry; the first failure is returned as-is.
pub trait MailTransport: Send + Sync {
    /// `users.messages.list`, a single page.
    fn list_messages(&self, user: &str, request: &ListRequest) -> Result<ListMessagesResponse>;

    /// `users.messages.get` in `full` format.
    fn get_message(&self, user: &str, id: &str) -> Result<RawMessage>;

    /// `users.messages.attachments.get`.
    fn get_attachment(
        &self,
        user: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<MessagePartBody>;
}

/// Blocking HTTP transport authenticated with a bearer token.
///
/// The token is looked up before every request, so an expired access token
/// is refreshed in the middle of a long batch.
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: Url,
    token: TokenSource,
}

impl HttpTransport {
    /// Create a transport for `base_url` authenticated through `token`.
    pub fn new(base_url: &str, token: TokenSource, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| GmailError::Config(format!("invalid API base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GmailError::Config(format!(
                "API base URL '{base_url}' cannot carry a path"
            )));
        }
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            agent,
            base_url,
            token,
        })
    }

    /// Build `<base>/users/<user>/messages/<extra...>` with each segment escaped.
    fn messages_url(&self, user: &str, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always matches.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["users", user, "messages"]);
            segments.extend(extra);
        }
        url
    }

    fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &Url,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let access_token = self.token.access_token()?;
        debug!(operation, url = %url, "Gmail API request");
        let mut request = self
            .agent
            .request_url("GET", url)
            .set("Authorization", &format!("Bearer {access_token}"));
        for (key, value) in query {
            request = request.query(key, value);
        }
        let response = request.call().map_err(|e| map_ureq_error(operation, e))?;
        read_json(operation, response)
    }
}

impl MailTransport for HttpTransport {
    fn list_messages(&self, user: &str, request: &ListRequest) -> Result<ListMessagesResponse> {
        let url = self.messages_url(user, &[]);
        let max_results = request.max_results.to_string();
        let mut query = vec![("maxResults", max_results.as_str())];
        if let Some(label) = request.label_id.as_deref() {
            query.push(("labelIds", label));
        }
        if let Some(q) = request.query.as_deref() {
            query.push(("q", q));
        }
        self.get("messages.list", &url, &query)
    }

    fn get_message(&self, user: &str, id: &str) -> Result<RawMessage> {
        let url = self.messages_url(user, &[id]);
        self.get("messages.get", &url, &[("format", "full")])
    }

    fn get_attachment(
        &self,
        user: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<MessagePartBody> {
        let url = self.messages_url(user, &[message_id, "attachments", attachment_id]);
        self.get("messages.attachments.get", &url, &[])
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Convert a `ureq` failure into the matching [`GmailError`] variant.
pub(crate) fn map_ureq_error(operation: &'static str, err: ureq::Error) -> GmailError {
    match err {
        ureq::Error::Status(status, response) => GmailError::Api {
            operation,
            status,
            message: response.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(transport) => GmailError::Transport {
            operation,
            reason: transport.to_string(),
        },
    }
}

/// Deserialize a JSON response body.
pub(crate) fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: ureq::Response,
) -> Result<T> {
    response.into_json().map_err(|e| GmailError::Decode {
        operation,
        reason: e.to_string(),
    })
}
