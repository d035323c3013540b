use crate::AppState;
use crate::api::models::upload::UploadResponse;
use crate::errors::{Error, ErrorResponse, Result};
use crate::extraction::{FileKind, UploadedFile};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/upload/",
    tag = "extraction",
    summary = "Extract attendance records",
    description = "Upload an attendance sheet as `.jpg`, `.jpeg`, `.png`, `.pdf` or `.xlsx` in the multipart field `file`.
Images and PDFs are forwarded to the model as-is; spreadsheets are rendered to CSV and embedded in the prompt.

`result` holds the model's reply decoded as JSON, or the raw reply text if it is not valid JSON.",
    request_body(
        content_type = "multipart/form-data",
        description = "Multipart form with a single `file` field"
    ),
    responses(
        (status = 200, description = "Model reply", body = UploadResponse),
        (status = 400, description = "Missing file, missing filename or unsupported file type", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the configured size limit", body = ErrorResponse),
        (status = 500, description = "Spreadsheet decoding or generation service failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|e| Error::BadRequest { message: e.body_text() })?;
    let upload = read_upload(&mut multipart).await?;

    tracing::info!(
        filename = %upload.filename,
        bytes = upload.content.len(),
        "Received upload"
    );

    let result = state.extractor.extract(upload).await?;
    Ok(Json(UploadResponse { result }))
}

/// Pull the `file` field out of the form, rejecting bad filenames before buffering the body.
async fn read_upload(multipart: &mut Multipart) -> Result<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            tracing::debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        FileKind::from_filename(&filename)?;

        let content = field.bytes().await.map_err(multipart_error)?;
        return Ok(UploadedFile { filename, content });
    }

    Err(Error::MissingFile)
}

fn multipart_error(err: MultipartError) -> Error {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::PayloadTooLarge {
            message: format!("Upload exceeds the maximum allowed size: {}", err.body_text()),
        }
    } else {
        Error::BadRequest {
            message: format!("Failed to parse multipart data: {}", err.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::generation::{ModelRequest, gemini::GeminiClient};
    use crate::test_utils::{FailingGenerator, RecordingGenerator, create_test_config, create_test_server, roster_xlsx};
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn file_form(filename: &str, content: Vec<u8>) -> MultipartForm {
        MultipartForm::new().add_part("file", Part::bytes(content).file_name(filename))
    }

    #[test_log::test(tokio::test)]
    async fn test_spreadsheet_upload_sends_rendered_table() {
        let generator = Arc::new(RecordingGenerator::replying(r#"{"extracted_data":[]}"#));
        let server = create_test_server(create_test_config(), generator.clone());

        let response = server
            .post("/upload/")
            .multipart(file_form("roster.xlsx", roster_xlsx(&[("Alice", 20, 22), ("Bob", 18, 22)])))
            .await;

        response.assert_status(StatusCode::OK);
        response.assert_json(&json!({ "result": { "extracted_data": [] } }));

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        let ModelRequest::Text { prompt } = &requests[0] else {
            panic!("expected a text-only request");
        };
        assert!(prompt.ends_with("\n\nSpreadsheet data:\nname,present_day,total_day\nAlice,20,22\nBob,18,22\n"));
    }

    #[tokio::test]
    async fn test_image_upload_returns_decoded_structure() {
        let reply = r#"{"extracted_data":[{"name":"Alice","present_day":20,"total_day":22}]}"#;
        let generator = Arc::new(RecordingGenerator::replying(reply));
        let server = create_test_server(create_test_config(), generator.clone());
        let image = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0x4a, 0x46];

        let response = server.post("/upload/").multipart(file_form("sheet.jpg", image.clone())).await;

        response.assert_status(StatusCode::OK);
        response.assert_json(&json!({
            "result": { "extracted_data": [{ "name": "Alice", "present_day": 20, "total_day": 22 }] }
        }));

        let attachment = generator.requests()[0].attachment().cloned().expect("document request");
        assert_eq!(attachment.data.to_vec(), image);
        assert_eq!(attachment.mime_type, "image/jpeg");
    }

    #[tokio::test]
    async fn test_non_json_reply_is_returned_verbatim() {
        let server = create_test_server(create_test_config(), Arc::new(RecordingGenerator::replying("could not parse")));

        let response = server.post("/upload/").multipart(file_form("sheet.pdf", b"%PDF-1.4".to_vec())).await;

        response.assert_status(StatusCode::OK);
        response.assert_json(&json!({ "result": "could not parse" }));
    }

    #[tokio::test]
    async fn test_route_without_trailing_slash() {
        let server = create_test_server(create_test_config(), Arc::new(RecordingGenerator::replying("[]")));

        let response = server.post("/upload").multipart(file_form("sheet.png", b"png".to_vec())).await;

        response.assert_status(StatusCode::OK);
        response.assert_json(&json!({ "result": [] }));
    }

    #[tokio::test]
    async fn test_empty_filename_is_rejected_without_model_call() {
        let generator = Arc::new(RecordingGenerator::replying("{}"));
        let server = create_test_server(create_test_config(), generator.clone());

        let response = server.post("/upload/").multipart(file_form("", b"data".to_vec())).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["detail"].as_str().unwrap().contains("No filename"));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_part_without_filename_is_rejected() {
        let generator = Arc::new(RecordingGenerator::replying("{}"));
        let server = create_test_server(create_test_config(), generator.clone());

        let response = server
            .post("/upload/")
            .multipart(MultipartForm::new().add_part("file", Part::bytes(b"data".to_vec())))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "detail": "No filename provided." }));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_named() {
        let generator = Arc::new(RecordingGenerator::replying("{}"));
        let server = create_test_server(create_test_config(), generator.clone());

        let response = server.post("/upload/").multipart(file_form("photo.gif", b"GIF89a".to_vec())).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "detail": "Unsupported file type: .gif" }));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let generator = Arc::new(RecordingGenerator::replying("{}"));
        let server = create_test_server(create_test_config(), generator.clone());

        let response = server
            .post("/upload/")
            .multipart(MultipartForm::new().add_text("purpose", "attendance"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "detail": "No file provided." }));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_bad_request() {
        let server = create_test_server(create_test_config(), Arc::new(RecordingGenerator::replying("{}")));

        let response = server.post("/upload/").json(&json!({ "file": "roster.xlsx" })).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(body["detail"].is_string());
    }

    #[test_log::test(tokio::test)]
    async fn test_generation_failure_is_server_error_with_detail() {
        let server = create_test_server(
            create_test_config(),
            Arc::new(FailingGenerator::new("error sending request: connection refused")),
        );

        let response = server.post("/upload/").multipart(file_form("sheet.png", b"png".to_vec())).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert!(body["detail"].as_str().unwrap().contains("connection refused"));
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_generation_timeout_is_server_error() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "candidates": [{ "content": { "parts": [{ "text": "{}" }] } }] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&upstream)
            .await;
        let generator = GeminiClient::new(
            format!("{}/v1beta/", upstream.uri()).parse().unwrap(),
            "test-key".to_string(),
            "gemini-2.5-flash".to_string(),
            Duration::from_millis(300),
        )
        .unwrap();
        let server = create_test_server(create_test_config(), Arc::new(generator));

        let response = server.post("/upload/").multipart(file_form("sheet.png", b"png".to_vec())).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert!(body["detail"].as_str().unwrap().contains("timed out"));
        assert!(body.get("result").is_none());
    }

    #[tokio::test]
    async fn test_corrupt_spreadsheet_is_server_error() {
        let generator = Arc::new(RecordingGenerator::replying("{}"));
        let server = create_test_server(create_test_config(), generator.clone());

        let response = server.post("/upload/").multipart(file_form("roster.xlsx", b"not a workbook".to_vec())).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert!(body["detail"].as_str().unwrap().contains("failed to read spreadsheet"));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let generator = Arc::new(RecordingGenerator::replying("{}"));
        let mut config: Config = create_test_config();
        config.limits.max_upload_size = 1024;
        let server = create_test_server(config, generator.clone());

        let response = server.post("/upload/").multipart(file_form("scan.pdf", vec![b'x'; 4096])).await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_identical_uploads_give_identical_responses() {
        let reply = r#"{"extracted_data":[{"name":"Bob","present_day":18,"absent_day":4}]}"#;
        let server = create_test_server(create_test_config(), Arc::new(RecordingGenerator::replying(reply)));
        let workbook = roster_xlsx(&[("Bob", 18, 22)]);

        let first = server.post("/upload/").multipart(file_form("roster.xlsx", workbook.clone())).await;
        let second = server.post("/upload/").multipart(file_form("roster.xlsx", workbook)).await;

        assert_eq!(first.as_bytes(), second.as_bytes());
    }
}
