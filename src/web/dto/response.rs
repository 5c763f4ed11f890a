//! Response DTOs for the drive API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::storage::FileEntry;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Directory listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    /// Children of the listed directory.
    pub entries: Vec<FileEntry>,
}

/// Acknowledgement of a completed mutation.
#[derive(Debug, Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Result of a batch upload.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    /// Number of files written.
    pub count: usize,
}

/// Existence check result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExistsResponse {
    pub exists: bool,
}
