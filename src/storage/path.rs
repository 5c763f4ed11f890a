//! Path sandbox for owner namespaces.
//!
//! Every logical path coming from a caller goes through [`normalize`] before
//! a backend derives a physical location from it with [`resolve_physical`].
//! A normalized path:
//! - begins with `/` and uses `/` separators
//! - has no trailing slash, except for the root `/`
//! - contains no `.` segments, empty segments, or `..` segments

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{DriveError, Result};

/// The logical root of every owner namespace.
pub const ROOT: &str = "/";

/// A logical path that has passed the sandbox checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// The namespace root.
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the namespace root.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// Segments of the path, without the leading slash.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Final path segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// Logical path of a direct child named `name`.
    ///
    /// `name` comes from a directory listing and is a single segment.
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!("/{name}"))
        } else {
            Self(format!("{}/{name}", self.0))
        }
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize and validate a caller-supplied logical path.
///
/// Empty or whitespace-only input is the root. Redundant separators and `.`
/// segments are collapsed. `..` segments are never resolved against their
/// parent: any `..` left after collapsing is rejected.
pub fn normalize(path: &str) -> Result<NormalizedPath> {
    if path.trim().is_empty() {
        return Ok(NormalizedPath::root());
    }

    if path.contains('\0') {
        return Err(DriveError::InvalidPath(
            "path must not contain NUL bytes".to_string(),
        ));
    }

    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    if segments.iter().any(|s| *s == "..") {
        return Err(DriveError::InvalidPath(
            "path traversal not allowed".to_string(),
        ));
    }

    if segments.is_empty() {
        return Ok(NormalizedPath::root());
    }

    Ok(NormalizedPath(format!("/{}", segments.join("/"))))
}

/// Check that an owner identifier is usable as a single directory name.
pub fn validate_owner(owner: &str) -> Result<()> {
    let invalid = owner.is_empty()
        || owner == "."
        || owner == ".."
        || owner.contains(['/', '\\', '\0']);

    if invalid {
        return Err(DriveError::InvalidOwner(owner.to_string()));
    }
    Ok(())
}

/// Derive the physical location of a normalized path inside `root`.
///
/// The root `/` maps to `root/owner`; anything else maps below it. The owner
/// must already have passed [`validate_owner`].
pub fn resolve_physical(root: &Path, owner: &str, path: &NormalizedPath) -> PathBuf {
    path.segments()
        .fold(root.join(owner), |acc, segment| acc.join(segment))
}
