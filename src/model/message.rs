//! Parsed message record.

use super::attachment::Attachment;
use crate::api::RawMessage;

/// One fetched message, flattened from its MIME part tree.
///
/// Built by [`crate::parser::mime::parse_message`] in a single pass and
/// read-only afterwards.
#[derive(Debug, Default)]
pub struct Message {
    /// Provider message id.
    pub(crate) id: String,

    /// Value of the `Message-ID` header.
    pub(crate) message_id: String,

    pub(crate) subject: String,

    /// Decoded `text/plain` body; empty when absent or undecodable.
    pub(crate) body_text: Vec<u8>,

    /// Decoded `text/html` body; empty when absent or undecodable.
    pub(crate) body_html: Vec<u8>,

    pub(crate) attachments: Vec<Attachment>,

    /// MIME types in depth-first pre-order,
    /// e.g. `multipart/mixed`, `multipart/alternative`, `text/plain`, ...
    pub(crate) mime_flow: Vec<String>,

    pub(crate) raw: RawMessage,
}

impl Message {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body_text(&self) -> &[u8] {
        &self.body_text
    }

    pub fn body_html(&self) -> &[u8] {
        &self.body_html
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn mime_flow(&self) -> &[String] {
        &self.mime_flow
    }

    /// The message exactly as the API returned it.
    pub fn raw(&self) -> &RawMessage {
        &self.raw
    }

    pub fn has_subject(&self) -> bool {
        !self.subject.is_empty()
    }

    pub fn has_body_text(&self) -> bool {
        !self.body_text.is_empty()
    }

    pub fn has_body_html(&self) -> bool {
        !self.body_html.is_empty()
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Plain-text body as UTF-8, with invalid sequences replaced.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body_text).into_owned()
    }

    /// HTML body as UTF-8, with invalid sequences replaced.
    pub fn html_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body_html).into_owned()
    }
}
