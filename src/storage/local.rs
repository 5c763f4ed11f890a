//! Local-filesystem storage backend.
//!
//! Each owner gets one directory below the storage root:
//! ```text
//! {root}/
//! ├── user1/
//! │   ├── docs/
//! │   │   └── readme.txt
//! │   └── photo.jpg
//! └── user2/
//!     └── ...
//! ```
//!
//! Writes go to a uniquely named sibling file first and are renamed over the
//! destination once the input stream is exhausted.

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::path::{normalize, resolve_physical, validate_owner, NormalizedPath, ROOT};
use super::{BackendKind, ByteStream, FileEntry, FileStream, StorageBackend};
use crate::{DriveError, Result};

/// Prefix of in-flight upload files. Entries carrying it are never listed.
const PARTIAL_PREFIX: &str = ".drive-partial-";

/// Storage backend rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    /// Root directory holding one subdirectory per owner.
    root: PathBuf,
}

impl LocalBackend {
    /// Create a new LocalBackend with the given root.
    ///
    /// The root directory will be created if it doesn't exist.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        Ok(Self { root })
    }

    /// Get the root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sandbox `path` for `owner` and derive its physical location.
    fn locate(&self, owner: &str, path: &str) -> Result<(NormalizedPath, PathBuf)> {
        validate_owner(owner)?;
        let normalized = normalize(path)?;
        let physical = resolve_physical(&self.root, owner, &normalized);
        Ok((normalized, physical))
    }

    /// Sibling of `target` used to stage a write.
    fn partial_path(target: &Path) -> PathBuf {
        let name = format!("{PARTIAL_PREFIX}{}", Uuid::new_v4());
        match target.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    async fn write_stream(file_path: &Path, mut stream: ByteStream) -> io::Result<()> {
        let mut file = fs::File::create(file_path).await?;
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        file.sync_all().await
    }
}

/// Locale-aware name ordering: case-insensitive first, lowercase first on ties.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn sort_entries(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| {
        b.is_directory
            .cmp(&a.is_directory)
            .then_with(|| compare_names(&a.name, &b.name))
    });
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn list(&self, owner: &str, path: &str) -> Result<Vec<FileEntry>> {
        let (normalized, dir_path) = self.locate(owner, path)?;
        tracing::debug!(owner, path = %normalized, "list");

        match fs::metadata(&dir_path).await {
            Ok(m) if m.is_dir() => {}
            Ok(_) => return Ok(Vec::new()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        }

        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&dir_path).await?;

        while let Some(child) = dir.next_entry().await? {
            let name = child.file_name().to_string_lossy().into_owned();
            if name.starts_with(PARTIAL_PREFIX) {
                continue;
            }

            // Follow symlinks like a plain stat; skip entries we can't stat
            let metadata = match fs::metadata(child.path()).await {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!(owner, name = %name, error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_default();

            entries.push(FileEntry {
                path: normalized.child(&name).into_string(),
                name,
                size: metadata.len(),
                modified,
                is_directory: metadata.is_dir(),
            });
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn get(&self, owner: &str, path: &str) -> Result<FileStream> {
        let (normalized, file_path) = self.locate(owner, path)?;
        if normalized.is_root() {
            return Err(DriveError::NotAFile(normalized.into_string()));
        }
        tracing::debug!(owner, path = %normalized, "get");

        let metadata = fs::metadata(&file_path)
            .await
            .map_err(|e| DriveError::from_io(e, normalized.as_str()))?;
        if metadata.is_dir() {
            return Err(DriveError::NotAFile(normalized.into_string()));
        }

        let file = fs::File::open(&file_path)
            .await
            .map_err(|e| DriveError::from_io(e, normalized.as_str()))?;

        Ok(FileStream {
            stream: ReaderStream::new(file).boxed(),
            size: metadata.len(),
        })
    }

    async fn put(&self, owner: &str, path: &str, stream: ByteStream) -> Result<()> {
        if path.ends_with('/') || path.ends_with('\\') {
            return Err(DriveError::InvalidPath(format!(
                "{path} is not a file path"
            )));
        }
        let (normalized, file_path) = self.locate(owner, path)?;
        if normalized.is_root() {
            return Err(DriveError::InvalidPath(
                "cannot write to root".to_string(),
            ));
        }
        tracing::debug!(owner, path = %normalized, "put");

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let partial = Self::partial_path(&file_path);
        let written = match Self::write_stream(&partial, stream).await {
            Ok(()) => fs::rename(&partial, &file_path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&partial).await {
                tracing::warn!(
                    owner,
                    path = %normalized,
                    error = %cleanup,
                    "Failed to remove partial upload"
                );
            }
            return Err(e.into());
        }

        Ok(())
    }

    async fn delete(&self, owner: &str, path: &str) -> Result<()> {
        let (normalized, target) = self.locate(owner, path)?;
        if normalized.is_root() {
            return Err(DriveError::RootDeletionDenied);
        }
        tracing::debug!(owner, path = %normalized, "delete");

        let metadata = fs::symlink_metadata(&target)
            .await
            .map_err(|e| DriveError::from_io(e, normalized.as_str()))?;

        let removed = if metadata.is_dir() {
            fs::remove_dir_all(&target).await
        } else {
            fs::remove_file(&target).await
        };
        removed.map_err(|e| DriveError::from_io(e, normalized.as_str()))
    }

    async fn mkdir(&self, owner: &str, path: &str) -> Result<()> {
        let (normalized, dir_path) = self.locate(owner, path)?;
        if normalized.is_root() {
            return Ok(());
        }
        tracing::debug!(owner, path = %normalized, "mkdir");

        fs::create_dir_all(&dir_path).await?;
        Ok(())
    }

    async fn rename(&self, owner: &str, old_path: &str, new_path: &str) -> Result<()> {
        let (old_norm, old_full) = self.locate(owner, old_path)?;
        let (new_norm, new_full) = self.locate(owner, new_path)?;
        if old_norm.is_root() || new_norm.is_root() {
            return Err(DriveError::InvalidPath(
                "cannot rename root".to_string(),
            ));
        }
        tracing::debug!(owner, from = %old_norm, to = %new_norm, "rename");

        fs::symlink_metadata(&old_full)
            .await
            .map_err(|e| DriveError::from_io(e, old_norm.as_str()))?;

        // The source exists, so a missing entry here is the destination's parent
        let new_parent = match new_norm.as_str().rsplit_once('/') {
            Some((parent, _)) if !parent.is_empty() => parent,
            _ => ROOT,
        };
        fs::rename(&old_full, &new_full)
            .await
            .map_err(|e| DriveError::from_io(e, new_parent))
    }

    async fn exists(&self, owner: &str, path: &str) -> bool {
        let Ok((_, target)) = self.locate(owner, path) else {
            return false;
        };
        fs::try_exists(&target).await.unwrap_or(false)
    }
}
