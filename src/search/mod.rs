//! Search and fetch: list matching ids, fetch each message, parse it.

pub mod query;

use std::sync::Arc;

use tracing::{debug, info};

use crate::api::{ListMessagesResponse, RawMessage};
use crate::auth::{self, secret::ClientSecret, source::TokenSource, TokenClient};
use crate::config::{self, Config};
use crate::error::{GmailError, Result};
use crate::model::attachment::AttachmentSource;
use crate::model::message::Message;
use crate::parser::mime::parse_message;
use crate::transport::{HttpTransport, SharedTransport};

use self::query::SearchCriteria;

/// The authenticated user.
pub const DEFAULT_USER: &str = "me";

/// Entry point for searching a mailbox.
///
/// Every method is blocking and issues its remote calls one after another.
#[derive(Clone)]
pub struct GmailService {
    transport: SharedTransport,
    user: String,
}

impl GmailService {
    /// Service over an already-authenticated transport, reading the
    /// authenticated user's mailbox.
    pub fn new(transport: SharedTransport) -> Self {
        Self {
            transport,
            user: DEFAULT_USER.to_string(),
        }
    }

    /// Read another mailbox the token has access to.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Authorize with `credentials_path` and connect to the API.
    ///
    /// Prompts on the terminal when no usable token is cached. The access
    /// token is refreshed (and the cache rewritten) whenever it expires
    /// during the session.
    pub fn from_credentials(credentials_path: &std::path::Path, config: &Config) -> Result<Self> {
        let secret = ClientSecret::from_file(credentials_path)?;
        let cache_path = config::token_cache_path(config).ok_or_else(|| {
            GmailError::Config("cannot locate the home directory for the token cache".to_string())
        })?;
        let client = TokenClient::new(secret, config.api.timeout());
        let token = auth::authorize(&client, &cache_path)?;
        let source = TokenSource::new(token, Box::new(client), Some(cache_path));
        let transport = HttpTransport::new(&config.api.base_url, source, config.api.timeout())?;
        info!(user = %config.account.user, "Connected to Gmail");
        Ok(Self::new(Arc::new(transport)).with_user(config.account.user.clone()))
    }

    /// [`Self::from_credentials`] with the configured credentials path.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::from_credentials(&config.account.credentials_path, config)
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// One page of the listing, as returned by the API.
    pub fn list(&self, criteria: &SearchCriteria) -> Result<ListMessagesResponse> {
        let request = criteria.to_list_request();
        debug!(
            query = request.query.as_deref().unwrap_or(""),
            label = request.label_id.as_deref().unwrap_or(""),
            max_results = request.max_results,
            "Listing messages"
        );
        self.transport.list_messages(&self.user, &request)
    }

    /// Ids of the matching messages. Only the first page is returned.
    pub fn list_ids(&self, criteria: &SearchCriteria) -> Result<Vec<String>> {
        Ok(self
            .list(criteria)?
            .messages
            .into_iter()
            .map(|m| m.id)
            .collect())
    }

    /// Fetch every matching message. The first failure aborts the batch.
    pub fn fetch_all(&self, criteria: &SearchCriteria) -> Result<Vec<RawMessage>> {
        self.fetch_all_with_progress(criteria, None)
    }

    /// [`Self::fetch_all`] reporting `(fetched, total)` after each message.
    pub fn fetch_all_with_progress(
        &self,
        criteria: &SearchCriteria,
        progress: Option<&dyn Fn(usize, usize)>,
    ) -> Result<Vec<RawMessage>> {
        let ids = self.list_ids(criteria)?;
        let total = ids.len();
        let mut messages = Vec::with_capacity(total);
        for (i, id) in ids.iter().enumerate() {
            messages.push(self.transport.get_message(&self.user, id)?);
            if let Some(progress) = progress {
                progress(i + 1, total);
            }
        }
        debug!(count = messages.len(), "Fetched messages");
        Ok(messages)
    }

    /// Fetch and parse every matching message, in listing order.
    pub fn get_messages(&self, criteria: &SearchCriteria) -> Result<Vec<Message>> {
        self.get_messages_with_progress(criteria, None)
    }

    pub fn get_messages_with_progress(
        &self,
        criteria: &SearchCriteria,
        progress: Option<&dyn Fn(usize, usize)>,
    ) -> Result<Vec<Message>> {
        let source = self.attachment_source();
        Ok(self
            .fetch_all_with_progress(criteria, progress)?
            .into_iter()
            .map(|raw| parse_message(raw, &source))
            .collect())
    }

    /// Fetch and parse a single message by provider id.
    pub fn get_message(&self, id: &str) -> Result<Message> {
        let raw = self.transport.get_message(&self.user, id)?;
        Ok(parse_message(raw, &self.attachment_source()))
    }

    fn attachment_source(&self) -> AttachmentSource {
        AttachmentSource::new(Arc::clone(&self.transport), self.user.clone())
    }
}

impl std::fmt::Debug for GmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmailService")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
