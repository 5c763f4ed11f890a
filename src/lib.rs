//! Drive - multi-tenant file storage
//!
//! Each owner gets an isolated namespace of files and directories, reachable
//! through a pluggable storage backend and a REST API.

pub mod config;
pub mod error;
pub mod logging;
pub mod storage;
pub mod upload;
pub mod web;

pub use config::Config;
pub use error::{DriveError, Result};
pub use storage::{BackendRegistry, FileEntry, LocalBackend, StorageBackend};
pub use upload::{UploadBatch, UploadLimits};
