//! Request handlers.

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use masker_common::error::{MaskerError, ValidationKind};
use masker_model::RawRect;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::read_mask_form;

pub const SERVICE_NAME: &str = "mask-service";
pub const ENDPOINTS: [&str; 3] = ["GET /", "GET /health", "POST /mask"];
const OUTPUT_CONTENT_TYPE: &str = "video/mp4";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexResponse {
    pub ok: bool,
    pub service: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub ttl_minutes: u64,
    pub max_file_mb: u64,
}

/// `GET /`
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        ok: true,
        service: SERVICE_NAME.to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ttl_minutes: state.config.ttl_minutes,
        max_file_mb: state.config.max_file_mb,
    })
}

/// `POST /mask`: store the upload, mask it, and stream back the MP4.
pub async fn mask(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // A body that is not multipart at all carries no file.
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Request is not multipart");
        MaskerError::validation(ValidationKind::NoFile)
    })?;

    let form = read_mask_form(
        multipart,
        &state.config.upload_dir,
        state.config.max_file_bytes(),
    )
    .await?;

    let asset = form
        .asset
        .ok_or(MaskerError::validation(ValidationKind::NoFile))?;
    let raws = RawRect::parse_list(form.rects.as_deref())?;

    let output = state.pipeline.process(&asset, &raws).await?;

    let file = tokio::fs::File::open(&output.path).await?;
    let len = file.metadata().await?.len();
    tracing::info!(output = %output.path.display(), size_bytes = len, "Sending masked video");

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((
        [
            (header::CONTENT_TYPE, OUTPUT_CONTENT_TYPE.to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
        ],
        body,
    )
        .into_response())
}
