//! MIME part-tree walking: subject, Message-ID, bodies and attachments.
//!
//! The API delivers a message as a tree of already-split parts. The walk is
//! depth-first pre-order. Every part is recorded in the MIME trace, and
//! `multipart/*` containers are descended into before the part's own leaf
//! action is taken.

use crate::api::{MessagePart, RawMessage};
use crate::model::attachment::{Attachment, AttachmentSource};
use crate::model::message::Message;

use super::decode::decode_payload;

/// Build a [`Message`] from a fetched message.
///
/// A message without a payload yields a record with only its id and raw
/// passthrough set.
pub fn parse_message(raw: RawMessage, source: &AttachmentSource) -> Message {
    let mut message = Message {
        id: raw.id.clone(),
        ..Message::default()
    };
    if let Some(root) = raw.payload.as_ref() {
        parse_part(root, &mut message, source);
    }
    message.raw = raw;
    message
}

/// Fold one part (and its descendants) into `message`.
///
/// `Subject` and `Message-ID` are overwritten by every part that carries
/// them, so the last occurrence in the tree wins. `Content-Disposition`
/// only applies to the part it was found on.
pub fn parse_part(part: &MessagePart, message: &mut Message, source: &AttachmentSource) {
    message.mime_flow.push(part.mime_type.clone());

    let mut disposition: Option<&str> = None;
    for header in &part.headers {
        match header.name.as_str() {
            "Subject" => message.subject = header.value.clone(),
            "Content-Disposition" => disposition = Some(header.value.as_str()),
            "Message-ID" => message.message_id = header.value.clone(),
            _ => {}
        }
    }

    if part.mime_type.starts_with("multipart") {
        for child in &part.parts {
            parse_part(child, message, source);
        }
    }

    let body = part.body.as_ref();
    match disposition {
        Some(value) if value.starts_with("attachment") => {
            let attachment = Attachment::new(
                source.clone(),
                message.id.clone(),
                body.and_then(|b| b.attachment_id.clone()).unwrap_or_default(),
                disposition_filename(value)
                    .map(String::from)
                    .unwrap_or_else(|| part.filename.clone()),
                part.mime_type.clone(),
                body.map(|b| b.size).unwrap_or(0),
            );
            message.attachments.push(attachment);
        }
        _ if part.mime_type == "text/plain" => {
            message.body_text = decode_body(part);
        }
        _ if part.mime_type == "text/html" => {
            message.body_html = decode_body(part);
        }
        _ => {}
    }
}

/// Filename from a raw `Content-Disposition` value.
///
/// Takes everything after `filename=` and trims surrounding double quotes.
/// `None` when the value has no `filename=` parameter.
pub fn disposition_filename(disposition: &str) -> Option<&str> {
    let pos = disposition.find("filename=")?;
    Some(disposition[pos + "filename=".len()..].trim_matches('"'))
}

fn decode_body(part: &MessagePart) -> Vec<u8> {
    part.body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .map(decode_payload)
        .unwrap_or_default()
}
