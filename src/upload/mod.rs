//! Batch upload ingestion.
//!
//! An upload batch is built from one multipart request: a base directory, a
//! list of relative-path hints paired positionally with the file parts, and
//! the file payloads themselves. The batch is validated as a whole before any
//! file is written, then written sequentially through a [`StorageBackend`].

mod multipart;

pub use multipart::read_multipart;

use bytes::Bytes;

use crate::config::UploadConfig;
use crate::storage::{stream_from_bytes, StorageBackend, ROOT};
use crate::{DriveError, Result};

/// Default maximum size of one uploaded file (100MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Default maximum number of files in one batch.
pub const DEFAULT_MAX_FILES: usize = 100;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Per-request upload ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Maximum size of one file in bytes.
    pub max_file_size: u64,
    /// Maximum number of files in one batch.
    pub max_files: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl From<&UploadConfig> for UploadLimits {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size_mb.saturating_mul(BYTES_PER_MB),
            max_files: config.max_files,
        }
    }
}

impl UploadLimits {
    /// Build the error for a payload over the per-file ceiling.
    pub(crate) fn too_large(&self, filename: &str) -> DriveError {
        DriveError::TooLarge {
            filename: filename.to_string(),
            limit_mb: self.max_file_size / BYTES_PER_MB,
        }
    }
}

/// One file payload of a batch.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied filename.
    pub filename: String,
    /// File content.
    pub data: Bytes,
}

/// Files to be written by one upload request.
#[derive(Debug, Clone)]
pub struct UploadBatch {
    base_path: String,
    relative_paths: Vec<String>,
    files: Vec<UploadFile>,
}

impl Default for UploadBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadBatch {
    /// Create an empty batch targeting the root directory.
    pub fn new() -> Self {
        Self {
            base_path: ROOT.to_string(),
            relative_paths: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Set the base directory. Blank input means the root.
    pub fn set_base_path(&mut self, raw: &str) {
        let trimmed = raw.trim();
        self.base_path = if trimmed.is_empty() {
            ROOT.to_string()
        } else {
            trimmed.to_string()
        };
    }

    /// Append newline-separated relative-path hints.
    ///
    /// Each line is trimmed and blank lines are dropped.
    pub fn add_relative_paths(&mut self, raw: &str) {
        self.relative_paths.extend(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }

    /// Append a file payload, rejecting it if it exceeds the per-file ceiling.
    pub fn add_file(
        &mut self,
        filename: impl Into<String>,
        data: impl Into<Bytes>,
        limits: &UploadLimits,
    ) -> Result<()> {
        let filename = filename.into();
        let data = data.into();
        if data.len() as u64 > limits.max_file_size {
            return Err(limits.too_large(&filename));
        }
        self.files.push(UploadFile { filename, data });
        Ok(())
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    /// Check batch-level limits.
    pub fn validate(&self, limits: &UploadLimits) -> Result<()> {
        if self.files.is_empty() {
            return Err(DriveError::NoFiles);
        }
        if self.files.len() > limits.max_files {
            return Err(DriveError::TooManyFiles(limits.max_files));
        }
        if let Some(file) = self
            .files
            .iter()
            .find(|f| f.data.len() as u64 > limits.max_file_size)
        {
            return Err(limits.too_large(&file.filename));
        }
        Ok(())
    }

    /// Destination logical path of every file, in arrival order.
    pub fn destinations(&self) -> Vec<String> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let relative = self
                    .relative_paths
                    .get(i)
                    .map(String::as_str)
                    .unwrap_or(&file.filename);
                destination_path(&self.base_path, &sanitize_relative_path(relative))
            })
            .collect()
    }

    /// Validate the batch and write every file through `backend`.
    ///
    /// Files are written one at a time; the first failure aborts the rest of
    /// the batch. Returns the number of files written.
    pub async fn ingest(
        self,
        backend: &dyn StorageBackend,
        owner: &str,
        limits: &UploadLimits,
    ) -> Result<usize> {
        self.validate(limits)?;

        let destinations = self.destinations();
        let count = self.files.len();

        for (file, destination) in self.files.into_iter().zip(destinations) {
            backend
                .put(owner, &destination, stream_from_bytes(file.data))
                .await
                .inspect_err(|e| {
                    tracing::warn!(
                        owner,
                        filename = %file.filename,
                        destination = %destination,
                        error = %e,
                        "Upload aborted"
                    );
                })?;
        }

        tracing::info!(owner, count, "Upload batch stored");
        Ok(count)
    }
}

/// Neutralize a client-supplied relative path.
///
/// Backslashes become forward slashes, every `..` substring is removed and
/// leading slashes are stripped.
pub fn sanitize_relative_path(relative: &str) -> String {
    relative
        .replace('\\', "/")
        .replace("..", "")
        .trim_start_matches('/')
        .to_string()
}

/// Join a base directory and a sanitized relative path into a logical path.
pub fn destination_path(base: &str, relative: &str) -> String {
    let base = base.trim().trim_end_matches('/').trim_start_matches('/');
    if base.is_empty() {
        format!("/{relative}")
    } else {
        format!("/{base}/{relative}")
    }
}
