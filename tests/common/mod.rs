//! Shared helpers for integration tests: fixtures and an in-memory transport.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use ezgmail::api::{
    ListMessagesResponse, ListRequest, MessagePartBody, MessageRef, RawMessage,
};
use ezgmail::error::{GmailError, Result};
use ezgmail::transport::MailTransport;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_raw(name: &str) -> RawMessage {
    let json = std::fs::read_to_string(fixture(name)).unwrap();
    serde_json::from_str(&json).unwrap()
}

/// In-memory mailbox that records every call it receives.
#[derive(Default)]
pub struct StubTransport {
    /// Messages in listing order.
    messages: Vec<RawMessage>,
    /// Attachment payloads (base64) keyed by `(message id, attachment id)`.
    attachments: HashMap<(String, String), String>,
    /// `get_message` fails for this id.
    fail_on: Option<String>,
    pub list_requests: Mutex<Vec<ListRequest>>,
    /// Every call as `"<operation>:<user>"`.
    pub user_calls: Mutex<Vec<String>>,
    pub fetched: Mutex<Vec<String>>,
    pub attachment_calls: AtomicUsize,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, raw: RawMessage) -> Self {
        self.messages.push(raw);
        self
    }

    pub fn with_attachment(mut self, message_id: &str, attachment_id: &str, data: &str) -> Self {
        self.attachments.insert(
            (message_id.to_string(), attachment_id.to_string()),
            data.to_string(),
        );
        self
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.fail_on = Some(id.to_string());
        self
    }

    pub fn fetched_ids(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn user_calls(&self) -> Vec<String> {
        self.user_calls.lock().unwrap().clone()
    }

    fn record_user(&self, operation: &str, user: &str) {
        self.user_calls.lock().unwrap().push(format!("{operation}:{user}"));
    }

    pub fn attachment_call_count(&self) -> usize {
        self.attachment_calls.load(Ordering::SeqCst)
    }
}

impl MailTransport for StubTransport {
    fn list_messages(&self, user: &str, request: &ListRequest) -> Result<ListMessagesResponse> {
        self.record_user("list", user);
        self.list_requests.lock().unwrap().push(request.clone());
        let messages: Vec<MessageRef> = self
            .messages
            .iter()
            .take(request.max_results as usize)
            .map(|m| MessageRef {
                id: m.id.clone(),
                thread_id: m.thread_id.clone(),
            })
            .collect();
        Ok(ListMessagesResponse {
            result_size_estimate: messages.len() as u64,
            messages,
            next_page_token: None,
        })
    }

    fn get_message(&self, user: &str, id: &str) -> Result<RawMessage> {
        self.record_user("get", user);
        self.fetched.lock().unwrap().push(id.to_string());
        if self.fail_on.as_deref() == Some(id) {
            return Err(GmailError::Api {
                operation: "messages.get",
                status: 500,
                message: "backend error".to_string(),
            });
        }
        self.messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(GmailError::Api {
                operation: "messages.get",
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    fn get_attachment(
        &self,
        user: &str,
        message_id: &str,
        attachment_id: &str,
    ) -> Result<MessagePartBody> {
        self.record_user("att", user);
        self.attachment_calls.fetch_add(1, Ordering::SeqCst);
        let data = self
            .attachments
            .get(&(message_id.to_string(), attachment_id.to_string()))
            .cloned()
            .ok_or(GmailError::Api {
                operation: "messages.attachments.get",
                status: 404,
                message: "Not Found".to_string(),
            })?;
        Ok(MessagePartBody {
            attachment_id: Some(attachment_id.to_string()),
            size: data.len() as u64,
            data: Some(data),
        })
    }
}

/// A minimal single-part message with the given id.
pub fn simple_message(id: &str) -> RawMessage {
    let mut raw = load_raw("plain.json");
    raw.id = id.to_string();
    raw
}
