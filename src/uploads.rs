//! Upload endpoints for attached media.
//!
//! The core never inspects file bytes: these handlers store the payload and
//! hand back a `{fileUrl, fileType}` pair, which the client then attaches to
//! a `postMessage`. `fileType` is the client-declared MIME type, used
//! downstream to pick image/video/audio/generic rendering.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_url: String,
    pub file_type: String,
}

/// POST /upload — multipart form with a `file` field.
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    store_field(&state, multipart, "file").await.map(Json)
}

/// POST /upload-voice — multipart form with a `voice` field (recorded audio).
pub async fn upload_voice(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, (StatusCode, String)> {
    store_field(&state, multipart, "voice").await.map(Json)
}

async fn store_field(
    state: &AppState,
    mut multipart: Multipart,
    field_name: &str,
) -> Result<UploadResponse, (StatusCode, String)> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            format!("malformed multipart body: {err}"),
        )
    })? {
        if field.name() != Some(field_name) {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let file_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field.bytes().await.map_err(|err| {
            (
                StatusCode::BAD_REQUEST,
                format!("failed to read upload: {err}"),
            )
        })?;

        let max_bytes = state.max_upload_size_mb as usize * 1024 * 1024;
        if data.len() > max_bytes {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "upload of {} bytes exceeds the {} MB limit",
                    data.len(),
                    state.max_upload_size_mb
                ),
            ));
        }

        let stored_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_filename(&original_name)
        );

        let dir = state.uploads_dir();
        tokio::fs::create_dir_all(&dir).await.map_err(|err| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to create uploads directory: {err}"),
            )
        })?;
        tokio::fs::write(dir.join(&stored_name), &data)
            .await
            .map_err(|err| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("failed to store upload: {err}"),
                )
            })?;

        tracing::info!(
            file = %stored_name,
            bytes = data.len(),
            mime = %file_type,
            "stored upload"
        );

        return Ok(UploadResponse {
            file_url: format!("/uploads/{stored_name}"),
            file_type,
        });
    }

    Err((
        StatusCode::BAD_REQUEST,
        format!("missing `{field_name}` field"),
    ))
}

/// Keep stored names shell- and URL-safe: path separators and other special
/// characters become underscores.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches(['_', '.']).is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
