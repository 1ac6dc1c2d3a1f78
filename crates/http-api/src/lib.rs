//! # masker-http-api
//!
//! HTTP surface of the masking service.
//!
//! - `GET /` - service descriptor
//! - `GET /health` - liveness plus the effective retention and size limits
//! - `POST /mask` - multipart upload (`file`, `rects`), answered with the
//!   masked MP4

pub mod error;
pub mod routes;
pub mod state;
pub mod upload;

pub use error::{ApiError, ErrorBody};
pub use routes::{HealthResponse, IndexResponse};
pub use state::AppState;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room on top of the file limit for boundaries, headers, and the
/// `rects` field.
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = usize::try_from(
        state
            .config
            .max_file_bytes()
            .saturating_add(FORM_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        .route("/mask", post(routes::mask))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
