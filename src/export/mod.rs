//! Export functionality: saving attachments to disk.

pub mod attachment;
