#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::ref_option)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::unused_async)]
#![allow(clippy::needless_for_each)]
//! GigaVector Server - REST API library for the `GigaVector` vector store.
//!
//! This module provides the HTTP handlers and types for the `GigaVector` REST API.
//!
//! ## OpenAPI Documentation
//!
//! The API is documented using OpenAPI 3.0. Access the interactive documentation at:
//! - Swagger UI: `GET /swagger-ui`
//! - OpenAPI JSON: `GET /api-docs/openapi.json`

mod handlers;
mod tls;
mod types;

use dashmap::DashMap;
use gigavector_core::migration::Migration;
use gigavector_core::NamespaceManager;
use std::sync::Arc;
use utoipa::OpenApi;

// Re-export types for external use
pub use types::*;

// Re-export handlers for routing
pub use handlers::{
    add_vector, create_namespace, delete_namespace, get_namespace, health_check, list_namespaces,
    migration_status, run_vacuum, search, start_migration,
};

pub use tls::{peer_common_name, TlsAcceptorConfig, TlsError};

// ============================================================================
// OpenAPI Documentation
// ============================================================================

/// GigaVector API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GigaVector API",
        version = "0.1.0",
        description = "Embedded-first vector store with HNSW/k-d-tree/flat indexes, \
            a metadata filter DSL, geospatial queries, and online index migration.",
        license(name = "ELv2"),
        contact(name = "GigaVector Team")
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "namespaces", description = "Namespace management"),
        (name = "vectors", description = "Vector insert and k-NN search"),
        (name = "lifecycle", description = "Vacuum and online index migration")
    ),
    paths(
        handlers::health::health_check,
        handlers::namespaces::list_namespaces,
        handlers::namespaces::create_namespace,
        handlers::namespaces::get_namespace,
        handlers::namespaces::delete_namespace,
        handlers::vectors::add_vector,
        handlers::vectors::search,
        handlers::lifecycle::run_vacuum,
        handlers::lifecycle::start_migration,
        handlers::lifecycle::migration_status
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            CreateNamespaceRequest,
            NamespaceResponse,
            AddVectorRequest,
            AddVectorResponse,
            SearchRequest,
            SearchHitResponse,
            SearchResponse,
            VacuumResponse,
            StartMigrationRequest,
            MigrationStatusResponse
        )
    )
)]
pub struct ApiDoc;

// ============================================================================
// Application State
// ============================================================================

/// Application state shared across handlers.
pub struct AppState {
    /// The namespace registry. Each namespace owns one collection.
    pub namespaces: NamespaceManager,
    /// Migrations started but not yet collected, keyed by namespace name.
    /// Starting a new migration for a namespace replaces any previous entry.
    pub migrations: DashMap<String, Arc<Migration>>,
}

impl AppState {
    /// Builds an empty application state with no namespaces and no
    /// in-flight migrations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespaces: NamespaceManager::new(),
            migrations: DashMap::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_spec_generation() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("Failed to serialize OpenAPI spec");
        assert!(!json.is_empty(), "OpenAPI spec should not be empty");
        assert!(json.contains("GigaVector API"), "Should contain API title");
        assert!(json.contains("0.1.0"), "Should contain version");
    }

    #[test]
    fn test_openapi_has_all_endpoints() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("Failed to serialize OpenAPI spec");
        assert!(json.contains("/health"), "Should document /health");
        assert!(json.contains("/namespaces"), "Should document /namespaces");
        assert!(
            json.contains(r"/namespaces/{name}"),
            "Should document namespaces by name"
        );
        assert!(
            json.contains(r"/namespaces/{name}/vectors"),
            "Should document vector insert endpoint"
        );
        assert!(
            json.contains(r"/namespaces/{name}/search"),
            "Should document search endpoint"
        );
        assert!(
            json.contains(r"/namespaces/{name}/vacuum"),
            "Should document vacuum endpoint"
        );
        assert!(
            json.contains(r"/namespaces/{name}/migrations"),
            "Should document migrations endpoint"
        );
    }

    #[test]
    fn test_openapi_has_all_tags() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("Failed to serialize OpenAPI spec");
        assert!(json.contains("\"health\""), "Should have health tag");
        assert!(json.contains("\"namespaces\""), "Should have namespaces tag");
        assert!(json.contains("\"vectors\""), "Should have vectors tag");
        assert!(json.contains("\"lifecycle\""), "Should have lifecycle tag");
    }

    #[test]
    fn test_openapi_has_schemas() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("Failed to serialize OpenAPI spec");
        assert!(
            json.contains("CreateNamespaceRequest"),
            "Should have CreateNamespaceRequest schema"
        );
        assert!(
            json.contains("NamespaceResponse"),
            "Should have NamespaceResponse schema"
        );
        assert!(
            json.contains("SearchRequest"),
            "Should have SearchRequest schema"
        );
        assert!(
            json.contains("SearchResponse"),
            "Should have SearchResponse schema"
        );
        assert!(
            json.contains("ErrorResponse"),
            "Should have ErrorResponse schema"
        );
        assert!(
            json.contains("MigrationStatusResponse"),
            "Should have MigrationStatusResponse schema"
        );
    }

    #[test]
    fn test_openapi_has_license() {
        let openapi = ApiDoc::openapi();
        let json = openapi.to_json().expect("Failed to serialize OpenAPI spec");
        assert!(json.contains("ELv2"), "Should have ELv2 license");
    }

    #[test]
    fn test_openapi_pretty_json() {
        let openapi = ApiDoc::openapi();
        let pretty_json = openapi
            .to_pretty_json()
            .expect("Failed to serialize pretty JSON");
        assert!(
            pretty_json.contains('\n'),
            "Pretty JSON should have newlines"
        );
        assert!(
            pretty_json.len() > 500,
            "OpenAPI spec should be substantial"
        );
    }

    #[test]
    fn test_create_namespace_request_default_index_type() {
        let json = r#"{"name": "test", "dimension": 128}"#;
        let req: CreateNamespaceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.index_type, "hnsw");
    }

    #[test]
    fn test_create_namespace_request_with_kdtree() {
        let json = r#"{"name": "test", "dimension": 128, "index_type": "kdtree"}"#;
        let req: CreateNamespaceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.index_type, "kdtree");
    }

    #[test]
    fn test_search_request_default_metric() {
        let json = r#"{"vector": [0.1, 0.2, 0.3], "top_k": 5}"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(req.top_k, 5);
        assert_eq!(req.metric, "euclidean");
        assert!(req.filter.is_none());
    }

    #[test]
    fn test_search_request_with_filter() {
        let json = r#"{"vector": [0.1], "top_k": 1, "filter": "color = 'red'"}"#;
        let req: SearchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.filter.as_deref(), Some("color = 'red'"));
    }

    #[test]
    fn test_add_vector_request_deserialize() {
        let json = r#"{"vector": [0.1, 0.2], "metadata": {"color": "red"}}"#;
        let req: AddVectorRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.vector, vec![0.1, 0.2]);
        assert_eq!(req.metadata.get("color").map(String::as_str), Some("red"));
    }

    #[test]
    fn test_namespace_response_serialize() {
        let resp = NamespaceResponse {
            name: "test".to_string(),
            dimension: 128,
            index_type: "hnsw".to_string(),
            vector_count: 100,
            max_vectors: 0,
            max_memory_bytes: 0,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"name\":\"test\""));
        assert!(json.contains("\"dimension\":128"));
        assert!(json.contains("\"index_type\":\"hnsw\""));
        assert!(json.contains("\"vector_count\":100"));
    }

    #[test]
    fn test_search_response_serialize() {
        let resp = SearchResponse {
            results: vec![SearchHitResponse {
                id: 1,
                distance: 0.05,
                metadata: Default::default(),
            }],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"results\""));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse {
            error: "Test error".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"error\":\"Test error\""));
    }

    #[test]
    fn test_app_state_starts_empty() {
        let state = AppState::new();
        assert!(state.namespaces.list().is_empty());
        assert!(state.migrations.is_empty());
    }
}
