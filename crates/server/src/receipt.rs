//! Receipt upload endpoint.
//!
//! Unlike the other endpoints, every response here uses the
//! `{success, data | error}` envelope.

use api_types::receipt::ReceiptUploadResponse;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};

use crate::server::ServerState;

pub const MAX_RECEIPT_BYTES: usize = 10 * 1024 * 1024;
const FIELD: &str = "receipt";
const FAILED: &str = "Failed to process receipt";

type Reply = (StatusCode, Json<ReceiptUploadResponse>);

fn failure(status: StatusCode, error: &str) -> Reply {
    (
        status,
        Json(ReceiptUploadResponse {
            success: false,
            data: None,
            error: Some(error.to_string()),
        }),
    )
}

fn multipart_failure(err: MultipartError) -> Reply {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return failure(StatusCode::PAYLOAD_TOO_LARGE, "File too large");
    }
    tracing::debug!("invalid multipart body: {err}");
    failure(StatusCode::BAD_REQUEST, "Upload failed")
}

fn accepted_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.starts_with("image/") || ct == "application/pdf")
}

struct Upload {
    bytes: Vec<u8>,
    filename: String,
}

/// Reads the single `receipt` file from the form; other fields are skipped.
async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, Reply> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_failure)? {
        if field.name() != Some(FIELD) {
            continue;
        }
        if !accepted_type(field.content_type()) {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                "Only image and PDF files are allowed",
            ));
        }
        let filename = field.file_name().unwrap_or("receipt").to_string();
        let bytes = field.bytes().await.map_err(multipart_failure)?;
        if bytes.len() > MAX_RECEIPT_BYTES {
            return Err(failure(StatusCode::PAYLOAD_TOO_LARGE, "File too large"));
        }
        return Ok(Some(Upload {
            bytes: bytes.to_vec(),
            filename,
        }));
    }
    Ok(None)
}

pub async fn upload(State(state): State<ServerState>, mut multipart: Multipart) -> Reply {
    let upload = match read_upload(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return failure(StatusCode::BAD_REQUEST, "No receipt image provided"),
        Err(reply) => return reply,
    };

    let Some(extractor) = state.extractor.as_ref() else {
        tracing::warn!("receipt upload rejected: no OCR provider configured");
        return failure(StatusCode::INTERNAL_SERVER_ERROR, FAILED);
    };

    match extractor.extract(upload.bytes, &upload.filename).await {
        Ok(draft) => (
            StatusCode::OK,
            Json(ReceiptUploadResponse {
                success: true,
                data: Some(draft),
                error: None,
            }),
        ),
        Err(err) => {
            tracing::warn!(filename = %upload.filename, "receipt extraction failed: {err}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, FAILED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_images_and_pdf_are_accepted() {
        assert!(accepted_type(Some("image/jpeg")));
        assert!(accepted_type(Some("image/png")));
        assert!(accepted_type(Some("application/pdf")));
        assert!(!accepted_type(Some("text/plain")));
        assert!(!accepted_type(None));
    }
}
