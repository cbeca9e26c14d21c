//! Attachment descriptors.
//!
//! The payload is NOT part of the fetched message. It is downloaded on the
//! first call to [`Attachment::data`] and kept for the lifetime of the
//! descriptor.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::Result;
use crate::parser::decode::decode_payload;
use crate::transport::SharedTransport;

/// Where an attachment's payload can be fetched from.
#[derive(Clone)]
pub struct AttachmentSource {
    pub(crate) transport: SharedTransport,
    pub(crate) user: String,
}

impl AttachmentSource {
    pub fn new(transport: SharedTransport, user: impl Into<String>) -> Self {
        Self {
            transport,
            user: user.into(),
        }
    }
}

/// A named attachment of a fetched message.
pub struct Attachment {
    source: AttachmentSource,
    message_id: String,
    attachment_id: String,
    filename: String,
    mime_type: String,
    size: u64,
    /// `Some` once downloaded. Held locked across the fetch so concurrent
    /// callers still trigger a single request.
    data: Mutex<Option<Vec<u8>>>,
}

impl Attachment {
    pub(crate) fn new(
        source: AttachmentSource,
        message_id: String,
        attachment_id: String,
        filename: String,
        mime_type: String,
        size: u64,
    ) -> Self {
        Self {
            source,
            message_id,
            attachment_id,
            filename,
            mime_type,
            size,
            data: Mutex::new(None),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size declared by the provider, in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn attachment_id(&self) -> &str {
        &self.attachment_id
    }

    /// Provider id of the owning message.
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn is_downloaded(&self) -> bool {
        self.slot().is_some()
    }

    /// Decoded payload, fetched on first use.
    ///
    /// A failed request leaves the attachment un-downloaded. A payload that
    /// is not valid base64 is cached as empty bytes.
    pub fn data(&self) -> Result<Vec<u8>> {
        let mut slot = self.slot();
        if let Some(bytes) = slot.as_ref() {
            return Ok(bytes.clone());
        }

        debug!(
            message_id = %self.message_id,
            filename = %self.filename,
            "Downloading attachment"
        );
        let body = self.source.transport.get_attachment(
            &self.source.user,
            &self.message_id,
            &self.attachment_id,
        )?;
        let bytes = decode_payload(body.data.as_deref().unwrap_or_default());
        *slot = Some(bytes.clone());
        Ok(bytes)
    }

    fn slot(&self) -> MutexGuard<'_, Option<Vec<u8>>> {
        // The guarded value is always consistent, even after a panic elsewhere.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("message_id", &self.message_id)
            .field("attachment_id", &self.attachment_id)
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .field("downloaded", &self.is_downloaded())
            .finish()
    }
}
