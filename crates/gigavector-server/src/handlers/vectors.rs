//! Vector insert and search handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use gigavector_core::DistanceMetric;
use std::sync::Arc;

use crate::types::{
    AddVectorRequest, AddVectorResponse, ErrorResponse, SearchHitResponse, SearchRequest, SearchResponse,
};
use crate::AppState;

fn parse_metric(s: &str) -> Option<DistanceMetric> {
    match s.to_lowercase().as_str() {
        "euclidean" | "l2" => Some(DistanceMetric::Euclidean),
        "cosine" => Some(DistanceMetric::Cosine),
        "dot" | "dotproduct" | "ip" => Some(DistanceMetric::Dot),
        _ => None,
    }
}

fn namespace_not_found(name: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("namespace '{name}' not found"),
        }),
    )
        .into_response()
}

/// Insert a vector into a namespace.
#[utoipa::path(
    post,
    path = "/namespaces/{name}/vectors",
    tag = "vectors",
    params(("name" = String, Path, description = "Namespace name")),
    request_body = AddVectorRequest,
    responses(
        (status = 200, description = "Vector inserted", body = AddVectorResponse),
        (status = 404, description = "Namespace not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn add_vector(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<AddVectorRequest>,
) -> impl IntoResponse {
    let Some(collection) = state.namespaces.get(&name) else {
        return namespace_not_found(&name);
    };

    let result = (|| -> gigavector_core::Result<u64> {
        let mut collection = collection.lock();
        let mut pairs = req.metadata.into_iter();
        let id = match pairs.next() {
            Some((key, value)) => collection.add_vector_with_metadata(req.vector, key, value)?,
            None => collection.add_vector(req.vector)?,
        };
        for (key, value) in pairs {
            collection.set_metadata(id, key, value);
        }
        Ok(id)
    })();

    match result {
        Ok(id) => Json(AddVectorResponse { id }).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() })).into_response(),
    }
}

/// k-NN search within a namespace, with an optional metadata filter.
#[utoipa::path(
    post,
    path = "/namespaces/{name}/search",
    tag = "vectors",
    params(("name" = String, Path, description = "Namespace name")),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Search results", body = SearchResponse),
        (status = 404, description = "Namespace not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let Some(collection) = state.namespaces.get(&name) else {
        return namespace_not_found(&name);
    };
    let Some(metric) = parse_metric(&req.metric) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid metric: {}", req.metric),
            }),
        )
            .into_response();
    };

    let collection = collection.lock();
    let result = match &req.filter {
        Some(filter_src) => collection.search_with_filter_expr(&req.vector, req.top_k, metric, filter_src),
        None => collection.search(&req.vector, req.top_k, metric),
    };

    match result {
        Ok(hits) => Json(SearchResponse {
            results: hits
                .into_iter()
                .map(|r| SearchHitResponse {
                    id: r.id,
                    distance: r.distance,
                    metadata: r.metadata.into_iter().collect(),
                })
                .collect(),
        })
        .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() })).into_response(),
    }
}
