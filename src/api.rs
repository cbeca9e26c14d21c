//! Provider-native Gmail API resources.
//!
//! These mirror the JSON shapes returned by the `users.messages` endpoints.
//! Only the fields this crate reads are typed; everything defaults when
//! absent so partial responses still deserialize.

use serde::{Deserialize, Serialize};

/// A message resource as returned by `users.messages.get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMessage {
    pub id: String,
    pub thread_id: String,
    pub label_ids: Vec<String>,
    pub snippet: String,
    /// Returned by the API as a decimal string.
    pub history_id: Option<String>,
    /// Milliseconds since the epoch, as a decimal string.
    pub internal_date: Option<String>,
    pub size_estimate: u64,
    /// Root of the MIME part tree.
    pub payload: Option<MessagePart>,
}

/// One node of the MIME part tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePart {
    pub part_id: String,
    pub mime_type: String,
    pub filename: String,
    pub headers: Vec<Header>,
    pub body: Option<MessagePartBody>,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Body of a part, also the response of `users.messages.attachments.get`.
///
/// `data` is web-safe base64. Attachments carry an `attachment_id` and no
/// inline data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessagePartBody {
    pub attachment_id: Option<String>,
    pub size: u64,
    pub data: Option<String>,
}

/// Response of `users.messages.list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageRef>,
    pub next_page_token: Option<String>,
    pub result_size_estimate: u64,
}

/// Identifier pair returned by the list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageRef {
    pub id: String,
    pub thread_id: String,
}

/// Parameters of one `users.messages.list` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Rendered search query. `None` when no filter is set.
    pub query: Option<String>,
    pub label_id: Option<String>,
    pub max_results: u32,
}
