//! API handlers for the drive HTTP layer.

pub mod drive;

pub use drive::*;

use std::sync::Arc;

use crate::storage::{BackendRegistry, SharedBackend};
use crate::upload::UploadLimits;
use crate::web::error::ApiError;

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Storage backend registry.
    pub registry: Arc<BackendRegistry>,
    /// Upload ceilings applied to batch and single-file writes.
    pub upload_limits: UploadLimits,
}

impl AppState {
    /// Create a new application state with the default upload limits.
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            upload_limits: UploadLimits::default(),
        }
    }

    /// Set the upload limits.
    pub fn with_upload_limits(mut self, limits: UploadLimits) -> Self {
        self.upload_limits = limits;
        self
    }

    /// Get the shared storage backend.
    pub async fn backend(&self) -> Result<SharedBackend, ApiError> {
        Ok(self.registry.backend().await?)
    }
}
