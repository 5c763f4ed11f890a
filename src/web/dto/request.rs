//! Request DTOs for the drive API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::storage::ROOT;
use crate::web::dto::validation::no_control_chars;

fn default_path() -> String {
    ROOT.to_string()
}

/// Query for operations where the path defaults to the root.
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PathQuery {
    /// Logical path (defaults to "/").
    #[serde(default = "default_path")]
    #[validate(custom(function = "no_control_chars"))]
    pub path: String,
}

/// Query for operations that require an explicit path.
#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequiredPathQuery {
    /// Logical path.
    #[validate(
        length(min = 1, message = "Path is required"),
        custom(function = "no_control_chars")
    )]
    pub path: String,
}

/// Directory creation request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MkdirRequest {
    /// Directory to create.
    #[validate(
        length(min = 1, message = "Path is required"),
        custom(function = "no_control_chars")
    )]
    pub path: String,
}

/// Rename or move request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// Current path.
    #[validate(
        length(min = 1, message = "Old path is required"),
        custom(function = "no_control_chars")
    )]
    pub old_path: String,
    /// New path.
    #[validate(
        length(min = 1, message = "New path is required"),
        custom(function = "no_control_chars")
    )]
    pub new_path: String,
}
