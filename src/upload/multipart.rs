//! Multipart request parsing for upload batches.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};

use super::{UploadBatch, UploadLimits};
use crate::{DriveError, Result};

/// Combined size of the `path` and `relativePaths` text parts of one request.
pub const MAX_TEXT_BYTES: u64 = 256 * 1024;

fn invalid_multipart(e: MultipartError) -> DriveError {
    tracing::debug!("Failed to read multipart data: {}", e);
    DriveError::Validation(format!("invalid multipart data: {e}"))
}

/// Read a part into memory. Returns `None` as soon as it grows past `max`
/// bytes; the rest of the part is left unread.
async fn read_limited(field: &mut Field<'_>, max: u64) -> Result<Option<Bytes>> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(invalid_multipart)? {
        if (buf.len() + chunk.len()) as u64 > max {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Some(buf.freeze()))
}

/// Read a text part, charging its size against the remaining text budget.
async fn read_text(field: &mut Field<'_>, name: &str, budget: &mut u64) -> Result<String> {
    let data = read_limited(field, *budget).await?.ok_or_else(|| {
        DriveError::Validation(format!(
            "text parts exceed {MAX_TEXT_BYTES} bytes at '{name}'"
        ))
    })?;
    *budget -= data.len() as u64;

    String::from_utf8(data.to_vec())
        .map_err(|_| DriveError::Validation(format!("part '{name}' is not valid UTF-8")))
}

/// Parse a multipart upload request into a batch.
///
/// Recognized parts:
/// - `path`: base directory (text)
/// - `relativePaths`: newline-separated relative-path hints (text)
/// - `files` / `file`: file payloads; parts without a filename are ignored
///
/// Other parts are skipped. Reading stops at the first part that breaks a
/// limit: a file over the size ceiling, one file more than the batch allows,
/// or text parts over [`MAX_TEXT_BYTES`].
pub async fn read_multipart(mut multipart: Multipart, limits: &UploadLimits) -> Result<UploadBatch> {
    let mut batch = UploadBatch::new();
    let mut text_budget = MAX_TEXT_BYTES;

    while let Some(mut field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "path" => {
                let text = read_text(&mut field, &name, &mut text_budget).await?;
                batch.set_base_path(&text);
            }
            "relativePaths" => {
                let text = read_text(&mut field, &name, &mut text_budget).await?;
                batch.add_relative_paths(&text);
            }
            "files" | "file" => {
                let filename = match field.file_name() {
                    Some(f) if !f.is_empty() => f.to_string(),
                    _ => continue,
                };
                if batch.files().len() >= limits.max_files {
                    tracing::debug!(max_files = limits.max_files, "Upload batch over file limit");
                    return Err(DriveError::TooManyFiles(limits.max_files));
                }
                let data = read_limited(&mut field, limits.max_file_size)
                    .await?
                    .ok_or_else(|| limits.too_large(&filename))?;
                batch.add_file(filename, data, limits)?;
            }
            _ => {}
        }
    }

    Ok(batch)
}
