//! Backend selection.
//!
//! The registry is built once at start-up from [`StorageConfig`] and shared
//! through the web application state. The backend itself is constructed on
//! first access and cached for the rest of the process lifetime.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::{LocalBackend, SharedBackend};
use crate::config::StorageConfig;
use crate::{DriveError, Result};

/// Default storage root, relative to the process working directory.
pub const DEFAULT_STORAGE_ROOT: &str = "data/drive";

/// Recognized storage backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Local filesystem.
    Local,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
        }
    }
}

impl FromStr for BackendKind {
    type Err = DriveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            _ => Err(DriveError::UnknownBackend(s.to_string())),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds at most one storage backend, created lazily from configuration.
pub struct BackendRegistry {
    config: StorageConfig,
    slot: OnceCell<SharedBackend>,
}

impl BackendRegistry {
    /// Create a registry that will build its backend from `config`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            slot: OnceCell::new(),
        }
    }

    /// Create a registry around an already constructed backend.
    pub fn with_backend(backend: SharedBackend) -> Self {
        Self {
            config: StorageConfig {
                backend: backend.kind().to_string(),
                root: None,
            },
            slot: OnceCell::new_with(Some(backend)),
        }
    }

    /// Get the shared backend, constructing it on first use.
    pub async fn backend(&self) -> Result<SharedBackend> {
        let backend = self
            .slot
            .get_or_try_init(|| Self::build(&self.config))
            .await?;
        Ok(Arc::clone(backend))
    }

    /// Whether the backend has been constructed yet.
    pub fn is_initialized(&self) -> bool {
        self.slot.initialized()
    }

    async fn build(config: &StorageConfig) -> Result<SharedBackend> {
        let kind: BackendKind = config.backend.parse()?;

        match kind {
            BackendKind::Local => {
                let root = storage_root(config)?;
                let backend = LocalBackend::new(&root).await?;
                tracing::info!("Drive storage initialized at: {}", root.display());
                Ok(Arc::new(backend))
            }
        }
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("config", &self.config)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

/// Resolve the local storage root, falling back to the working directory default.
fn storage_root(config: &StorageConfig) -> Result<PathBuf> {
    match config.root.as_deref().map(str::trim) {
        Some(root) if !root.is_empty() => Ok(PathBuf::from(root)),
        _ => Ok(std::env::current_dir()?.join(DEFAULT_STORAGE_ROOT)),
    }
}
