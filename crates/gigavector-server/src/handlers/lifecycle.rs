//! Vacuum and migration handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use gigavector_core::migration::{Migration, MigrationStatus};
use gigavector_core::{IndexType, VacuumConfig, VacuumManager, VacuumState};
use std::sync::Arc;

use crate::types::{ErrorResponse, MigrationStatusResponse, StartMigrationRequest, VacuumResponse};
use crate::AppState;

fn namespace_not_found(name: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("namespace '{name}' not found"),
        }),
    )
        .into_response()
}

fn vacuum_state_name(state: VacuumState) -> &'static str {
    match state {
        VacuumState::Idle => "idle",
        VacuumState::Scanning => "scanning",
        VacuumState::Compacting => "compacting",
        VacuumState::Completed => "completed",
        VacuumState::Failed => "failed",
    }
}

fn migration_status_name(status: MigrationStatus) -> &'static str {
    match status {
        MigrationStatus::Pending => "pending",
        MigrationStatus::Running => "running",
        MigrationStatus::Completed => "completed",
        MigrationStatus::Cancelled => "cancelled",
        MigrationStatus::Failed => "failed",
    }
}

fn parse_index_type(s: &str) -> Option<IndexType> {
    match s.to_lowercase().as_str() {
        "flat" => Some(IndexType::Flat),
        "kdtree" | "kd-tree" | "kd_tree" => Some(IndexType::KdTree),
        "hnsw" => Some(IndexType::Hnsw),
        _ => None,
    }
}

/// Runs one vacuum pass synchronously against a namespace's collection.
#[utoipa::path(
    post,
    path = "/namespaces/{name}/vacuum",
    tag = "lifecycle",
    params(("name" = String, Path, description = "Namespace name")),
    responses(
        (status = 200, description = "Vacuum pass completed", body = VacuumResponse),
        (status = 404, description = "Namespace not found", body = ErrorResponse)
    )
)]
pub async fn run_vacuum(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let Some(collection) = state.namespaces.get(&name) else {
        return namespace_not_found(&name);
    };

    let manager = VacuumManager::new(collection, VacuumConfig::default());
    let fragmentation_before = manager.fragmentation();

    let run_result = tokio::task::spawn_blocking(move || {
        let outcome = manager.run();
        (manager.state(), manager.stats().total_runs, outcome)
    })
    .await;

    match run_result {
        Ok((vacuum_state, total_runs, Ok(()))) => Json(VacuumResponse {
            state: vacuum_state_name(vacuum_state).to_string(),
            fragmentation_before,
            total_runs,
        })
        .into_response(),
        Ok((_, _, Err(e))) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: e.to_string() }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("vacuum task panicked: {e}"),
            }),
        )
            .into_response(),
    }
}

/// Starts a background migration of a namespace's collection to a new index
/// type. Replaces any previously tracked migration for this namespace.
#[utoipa::path(
    post,
    path = "/namespaces/{name}/migrations",
    tag = "lifecycle",
    params(("name" = String, Path, description = "Namespace name")),
    request_body = StartMigrationRequest,
    responses(
        (status = 202, description = "Migration started", body = Object),
        (status = 404, description = "Namespace not found", body = ErrorResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn start_migration(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<StartMigrationRequest>,
) -> impl IntoResponse {
    let Some(collection_handle) = state.namespaces.get(&name) else {
        return namespace_not_found(&name);
    };
    let Some(new_index_type) = parse_index_type(&req.new_index_type) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("invalid new_index_type: {}", req.new_index_type),
            }),
        )
            .into_response();
    };

    let (records, dimension, metric) = {
        let collection = collection_handle.lock();
        (collection.records().to_vec(), collection.dimension(), collection.build_metric())
    };

    let migration = Arc::new(Migration::start(records, dimension, new_index_type, metric, None));
    state.migrations.insert(name.clone(), Arc::clone(&migration));

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "message": "migration started", "name": name })),
    )
        .into_response()
}

/// Reports the progress of the most recently started migration for a
/// namespace.
#[utoipa::path(
    get,
    path = "/namespaces/{name}/migrations",
    tag = "lifecycle",
    params(("name" = String, Path, description = "Namespace name")),
    responses(
        (status = 200, description = "Migration status", body = MigrationStatusResponse),
        (status = 404, description = "No migration tracked for this namespace", body = ErrorResponse)
    )
)]
pub async fn migration_status(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let Some(migration) = state.migrations.get(&name).map(|m| Arc::clone(&m)) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no migration tracked for namespace '{name}'"),
            }),
        )
            .into_response();
    };

    let info = migration.get_info();
    if info.status == MigrationStatus::Completed {
        if let Some(new_index) = migration.take_index() {
            if let Some(collection) = state.namespaces.get(&name) {
                collection.lock().replace_index(new_index);
            }
        }
    }

    Json(MigrationStatusResponse {
        status: migration_status_name(info.status).to_string(),
        vectors_migrated: info.vectors_migrated,
        total_vectors: info.total_vectors,
        progress: info.progress,
    })
    .into_response()
}
