//! OpenAPI documentation for the extraction API.
//!
//! Served as JSON at `/openapi.json` with an interactive reference at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::errors::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rollcall API",
        description = "Extracts attendance records from uploaded sheets using a generative model."
    ),
    paths(api::handlers::upload::upload_file),
    components(schemas(api::models::upload::UploadResponse, ErrorResponse)),
    tags(
        (name = "extraction", description = "Attendance sheet extraction"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_upload_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/upload/"));

        let schemas = &doc.components.as_ref().expect("components").schemas;
        assert!(schemas.contains_key("UploadResponse"));
        assert!(schemas.contains_key("ErrorResponse"));
    }
}
