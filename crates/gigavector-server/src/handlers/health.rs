//! Health check handler.

use axum::{response::IntoResponse, Json};
use gigavector_core::simd;

use crate::types::HealthResponse;

/// Health check endpoint. Reports the process's liveness and the SIMD
/// dispatch tier the distance kernels selected at first use.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = HealthResponse)
    )
)]
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        simd_tier: simd::detected_features().tier_name().to_string(),
    })
}
