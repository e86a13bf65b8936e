//! Relay server: accepts snapshots over HTTP and forwards them to a backend
//!
//! Keeps the API key on the relay host; clients only need the relay URL.

use crate::backends::DescriptionBackend;
use crate::compose::normalize_answer;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde_json::json;
use shelfsight_core::{EncodedImage, FieldSelection};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
struct RelayState {
    backend: Arc<dyn DescriptionBackend>,
}

/// Router serving `POST /process-image` and `GET /health`
pub fn relay_router(backend: Arc<dyn DescriptionBackend>) -> Router {
    Router::new()
        .route("/process-image", post(process_image))
        .route("/health", get(|| async { "ok" }))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(RelayState { backend })
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn process_image(State(state): State<RelayState>, mut multipart: Multipart) -> Response {
    let mut image: Option<(Bytes, String)> = None;
    let mut fields = FieldSelection::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed upload: {}", e);
                return error_reply(StatusCode::BAD_REQUEST, "Malformed multipart body");
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let mime = field.content_type().unwrap_or("image/jpeg").to_string();
                match field.bytes().await {
                    Ok(bytes) => image = Some((bytes, mime)),
                    Err(e) => {
                        warn!("Failed to read image part: {}", e);
                        return error_reply(StatusCode::BAD_REQUEST, "Unreadable image part");
                    }
                }
            }
            "fields" => {
                let text = field.text().await.unwrap_or_default();
                match serde_json::from_str(&text) {
                    Ok(parsed) => fields = parsed,
                    Err(e) => warn!("Ignoring invalid field selection: {}", e),
                }
            }
            _ => {}
        }
    }

    let Some((bytes, mime)) = image else {
        return error_reply(StatusCode::BAD_REQUEST, "Missing image part");
    };
    if bytes.is_empty() {
        return error_reply(StatusCode::BAD_REQUEST, "Empty image");
    }

    let mime_type: &'static str = if mime == "image/png" { "image/png" } else { "image/jpeg" };
    let encoded = EncodedImage {
        bytes,
        mime_type,
        width: 0,
        height: 0,
    };

    match state.backend.describe_raw(&encoded, &fields).await {
        Ok(raw) => {
            let description = normalize_answer(&raw);
            info!("Relayed description: {}", description);
            Json(json!({ "description": description })).into_response()
        }
        Err(e) => {
            error!("Description backend failed: {}", e);
            error_reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while processing the image",
            )
        }
    }
}
