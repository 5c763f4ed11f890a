//! OpenAPI document for the drive API.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::storage::FileEntry;
use crate::web::dto::{
    ExistsResponse, ListResponse, MkdirRequest, RenameRequest, SuccessResponse, UploadResponse,
};
use crate::web::handlers::drive;

#[derive(OpenApi)]
#[openapi(
    info(title = "Drive API", description = "Per-owner file storage"),
    servers((url = "/api")),
    paths(
        drive::list,
        drive::download,
        drive::put_file,
        drive::upload,
        drive::mkdir,
        drive::rename,
        drive::move_path,
        drive::delete,
        drive::exists,
    ),
    components(schemas(
        FileEntry,
        ListResponse,
        SuccessResponse,
        UploadResponse,
        ExistsResponse,
        MkdirRequest,
        RenameRequest,
    )),
    modifiers(&SecurityAddon),
    tags((name = "drive", description = "File and directory operations"))
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by the handlers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
