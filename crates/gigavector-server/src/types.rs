//! Request/response types for the `GigaVector` REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A standard error body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

fn default_index_type() -> String {
    "hnsw".to_string()
}

/// Request to create a namespace.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateNamespaceRequest {
    /// Namespace name.
    #[schema(example = "documents")]
    pub name: String,
    /// Vector dimension.
    #[schema(example = 768)]
    pub dimension: usize,
    /// Index type: "flat", "kdtree", or "hnsw" (default).
    #[serde(default = "default_index_type")]
    #[schema(example = "hnsw")]
    pub index_type: String,
    /// Maximum live vectors, 0 = unlimited.
    #[serde(default)]
    pub max_vectors: usize,
    /// Maximum resident bytes, 0 = unlimited.
    #[serde(default)]
    pub max_memory_bytes: usize,
}

/// A namespace's bookkeeping, as returned to a caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct NamespaceResponse {
    /// Namespace name.
    pub name: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Active index type.
    pub index_type: String,
    /// Number of live vectors.
    pub vector_count: usize,
    /// Maximum live vectors, 0 = unlimited.
    pub max_vectors: usize,
    /// Maximum resident bytes, 0 = unlimited.
    pub max_memory_bytes: usize,
}

/// Request to add a vector with optional metadata.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddVectorRequest {
    /// The embedding.
    pub vector: Vec<f32>,
    /// Attached string metadata.
    #[serde(default)]
    pub metadata: std::collections::BTreeMap<String, String>,
}

/// Response to a successful vector insert.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddVectorResponse {
    /// The assigned internal id.
    pub id: u64,
}

fn default_metric() -> String {
    "euclidean".to_string()
}

/// Request for a k-NN search, with an optional metadata filter expression.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Query vector.
    pub vector: Vec<f32>,
    /// Number of neighbors to return.
    pub top_k: usize,
    /// Distance metric: "euclidean" (default), "cosine", or "dot".
    #[serde(default = "default_metric")]
    pub metric: String,
    /// Optional metadata filter expression, in the filter DSL.
    pub filter: Option<String>,
}

/// A single search hit.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchHitResponse {
    /// Matching record's internal id.
    pub id: u64,
    /// Distance under the query's metric; lower sorts first.
    pub distance: f32,
    /// Attached metadata.
    pub metadata: std::collections::BTreeMap<String, String>,
}

/// A search response: ordered hits, nearest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    /// Ordered hits, nearest first.
    pub results: Vec<SearchHitResponse>,
}

/// Response describing a vacuum run.
#[derive(Debug, Serialize, ToSchema)]
pub struct VacuumResponse {
    /// State after the run: idle, scanning, compacting, completed, failed.
    pub state: String,
    /// Fragmentation ratio observed before this run.
    pub fragmentation_before: f64,
    /// Cumulative vacuum run count for this namespace.
    pub total_runs: u64,
}

fn default_migration_index_type() -> String {
    "hnsw".to_string()
}

/// Request to start a background index migration.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartMigrationRequest {
    /// Target index type: "flat", "kdtree", or "hnsw" (default).
    #[serde(default = "default_migration_index_type")]
    pub new_index_type: String,
}

/// Snapshot of a migration's progress.
#[derive(Debug, Serialize, ToSchema)]
pub struct MigrationStatusResponse {
    /// pending, running, completed, cancelled, or failed.
    pub status: String,
    /// Vectors migrated so far.
    pub vectors_migrated: usize,
    /// Total vectors to migrate.
    pub total_vectors: usize,
    /// Progress in [0, 1].
    pub progress: f64,
}

/// Health report, including the active SIMD dispatch tier.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "healthy" if the process is serving requests.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Detected CPU dispatch tier: "scalar", "sse", or "avx2".
    pub simd_tier: String,
}
