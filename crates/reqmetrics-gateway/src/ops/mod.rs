//! Operational HTTP endpoints.
//!
//! - `/healthz`          : liveness
//! - `<metrics.path>`    : text exposition (default `/metrics`)

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use reqmetrics_core::error::Result;
use reqmetrics_core::expo::CONTENT_TYPE;

use crate::app_state::AppState;

pub const HEALTHZ_PATH: &str = "/healthz";

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    exposition_response(state.registry().render())
}

/// `200` with the rendered page, or `500` with a diagnostic body.
pub fn exposition_response(rendered: Result<String>) -> Response {
    match rendered {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, class = e.class().as_str(), "metrics render failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                format!("metrics render failed: {e}\n"),
            )
                .into_response()
        }
    }
}
