//! Save attachment payloads to disk.

use std::path::{Path, PathBuf};

use crate::model::attachment::Attachment;
use crate::model::message::Message;

/// Download one attachment and write it into `output_dir`.
///
/// Never overwrites: an existing file gets a numbered sibling instead.
pub fn export_attachment(attachment: &Attachment, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let data = attachment.data()?;
    let filename = sanitize_filename_part(attachment.filename(), 150);
    let path = unique_path(&output_dir.join(&filename));
    std::fs::write(&path, &data)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "Saved attachment");
    Ok(path)
}

/// Save every attachment of one message.
pub fn export_all_attachments(message: &Message, output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(message.attachments().len());
    for att in message.attachments() {
        paths.push(export_attachment(att, output_dir)?);
    }
    Ok(paths)
}

/// Save the attachments of many messages, one subfolder per message:
/// `{output_dir}/{message id}/`.
///
/// Stops at the first failed download.
pub fn export_bulk_attachments(
    messages: &[Message],
    output_dir: &Path,
    progress: &dyn Fn(usize, usize),
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let mut all_paths = Vec::new();
    let total = messages.len();

    for (i, message) in messages.iter().enumerate() {
        progress(i, total);
        if !message.has_attachments() {
            continue;
        }

        let subfolder = output_dir.join(sanitize_filename_part(message.id(), 60));
        std::fs::create_dir_all(&subfolder)?;
        all_paths.extend(export_all_attachments(message, &subfolder)?);
    }
    progress(total, total);

    Ok(all_paths)
}

/// Sanitize a string for use in filenames.
///
/// Replaces invalid characters with `_` and truncates to `max_len`.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '@' {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// If `path` already exists, append a counter to make it unique.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    for i in 1..1000 {
        let candidate = if ext.is_empty() {
            parent.join(format!("{stem}_{i}"))
        } else {
            parent.join(format!("{stem}_{i}.{ext}"))
        };
        if !candidate.exists() {
            return candidate;
        }
    }

    parent.join(format!("{stem}_dup.{ext}"))
}
