//! Namespace management handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use gigavector_core::{IndexType, NamespaceConfig};
use std::sync::Arc;

use crate::types::{CreateNamespaceRequest, ErrorResponse, NamespaceResponse};
use crate::AppState;

fn parse_index_type(s: &str) -> Option<IndexType> {
    match s.to_lowercase().as_str() {
        "flat" => Some(IndexType::Flat),
        "kdtree" | "kd-tree" | "kd_tree" => Some(IndexType::KdTree),
        "hnsw" => Some(IndexType::Hnsw),
        _ => None,
    }
}

fn index_type_name(t: IndexType) -> &'static str {
    match t {
        IndexType::Flat => "flat",
        IndexType::KdTree => "kdtree",
        IndexType::Hnsw => "hnsw",
    }
}

/// List all namespace names.
#[utoipa::path(
    get,
    path = "/namespaces",
    tag = "namespaces",
    responses(
        (status = 200, description = "List of namespaces", body = Object)
    )
)]
pub async fn list_namespaces(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "namespaces": state.namespaces.list() }))
}

/// Create a namespace.
#[utoipa::path(
    post,
    path = "/namespaces",
    tag = "namespaces",
    request_body = CreateNamespaceRequest,
    responses(
        (status = 201, description = "Namespace created", body = Object),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn create_namespace(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNamespaceRequest>,
) -> impl IntoResponse {
    let Some(index_type) = parse_index_type(&req.index_type) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid index_type: {}", req.index_type),
            }),
        )
            .into_response();
    };

    let config = NamespaceConfig {
        name: Some(req.name.clone()),
        dimension: req.dimension,
        index_type,
        max_vectors: req.max_vectors,
        max_memory_bytes: req.max_memory_bytes,
    };

    match state.namespaces.create(config) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "message": "namespace created", "name": req.name })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response(),
    }
}

/// Get a namespace's bookkeeping.
#[utoipa::path(
    get,
    path = "/namespaces/{name}",
    tag = "namespaces",
    params(("name" = String, Path, description = "Namespace name")),
    responses(
        (status = 200, description = "Namespace details", body = NamespaceResponse),
        (status = 404, description = "Namespace not found", body = ErrorResponse)
    )
)]
pub async fn get_namespace(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.namespaces.get_info(&name) {
        Some(info) => Json(NamespaceResponse {
            name: info.name,
            dimension: info.dimension,
            index_type: index_type_name(info.index_type).to_string(),
            vector_count: info.vector_count,
            max_vectors: info.max_vectors,
            max_memory_bytes: info.max_memory_bytes,
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("namespace '{name}' not found"),
            }),
        )
            .into_response(),
    }
}

/// Delete a namespace.
#[utoipa::path(
    delete,
    path = "/namespaces/{name}",
    tag = "namespaces",
    params(("name" = String, Path, description = "Namespace name")),
    responses(
        (status = 200, description = "Namespace deleted", body = Object),
        (status = 404, description = "Namespace not found", body = ErrorResponse)
    )
)]
pub async fn delete_namespace(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    if !state.namespaces.exists(&name) {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("namespace '{name}' not found"),
            }),
        )
            .into_response();
    }
    state.namespaces.delete(&name);
    Json(serde_json::json!({ "message": "namespace deleted", "name": name })).into_response()
}
