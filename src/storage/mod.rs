//! Storage backends for drive.
//!
//! This module provides the backend-agnostic storage contract:
//! - Path sandboxing for owner namespaces
//! - The [`StorageBackend`] capability and its local-filesystem variant
//! - A registry that selects and caches one backend from configuration

pub mod local;
pub mod path;
pub mod registry;

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;

use crate::Result;

pub use local::LocalBackend;
pub use path::{normalize, resolve_physical, validate_owner, NormalizedPath, ROOT};
pub use registry::{BackendKind, BackendRegistry};

/// Pull-based, single-pass stream of file bytes.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Backend instance shared by all requests.
pub type SharedBackend = Arc<dyn StorageBackend>;

/// Wrap an in-memory payload in a single-chunk byte stream.
pub fn stream_from_bytes(data: impl Into<Bytes>) -> ByteStream {
    stream::once(futures::future::ready(Ok(data.into()))).boxed()
}

/// Snapshot of one child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FileEntry {
    /// Final path segment.
    pub name: String,
    /// Full logical path.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

/// Readable file returned by [`StorageBackend::get`].
pub struct FileStream {
    /// File content, read lazily.
    pub stream: ByteStream,
    /// Size of the file when it was opened.
    pub size: u64,
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Storage capability scoped to an owner namespace.
///
/// Implementations normalize every logical path themselves; callers pass raw
/// paths. Implementations hold no per-call state and are shared across
/// concurrent requests.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Backend kind, for logging.
    fn kind(&self) -> BackendKind;

    /// List the children of a directory.
    ///
    /// A missing path or a path naming a file lists as empty.
    async fn list(&self, owner: &str, path: &str) -> Result<Vec<FileEntry>>;

    /// Open a file for reading.
    async fn get(&self, owner: &str, path: &str) -> Result<FileStream>;

    /// Write a file, consuming `stream` to completion.
    async fn put(&self, owner: &str, path: &str, stream: ByteStream) -> Result<()>;

    /// Delete a file or a whole directory subtree.
    async fn delete(&self, owner: &str, path: &str) -> Result<()>;

    /// Create a directory and any missing parents.
    async fn mkdir(&self, owner: &str, path: &str) -> Result<()>;

    /// Rename a file or directory within one namespace.
    async fn rename(&self, owner: &str, old_path: &str, new_path: &str) -> Result<()>;

    /// Move a file or directory within one namespace.
    async fn move_path(&self, owner: &str, old_path: &str, new_path: &str) -> Result<()> {
        self.rename(owner, old_path, new_path).await
    }

    /// Whether anything exists at `path`. Errors count as absence.
    async fn exists(&self, owner: &str, path: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stream_from_bytes_single_chunk() {
        let mut stream = stream_from_bytes(b"hello".to_vec());

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"hello");
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn test_file_entry_serialization() {
        let entry = FileEntry {
            name: "a.txt".to_string(),
            path: "/docs/a.txt".to_string(),
            size: 3,
            modified: DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
                .unwrap()
                .with_timezone(&Utc),
            is_directory: false,
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["name"], "a.txt");
        assert_eq!(json["path"], "/docs/a.txt");
        assert_eq!(json["size"], 3);
        assert_eq!(json["is_directory"], false);
        assert_eq!(json["modified"], "2024-01-02T03:04:05Z");
    }
}
