//! HTTP handlers for the GigaVector REST API.
//!
//! This module organizes handlers by domain:
//! - `health`: liveness and SIMD dispatch tier
//! - `namespaces`: namespace CRUD
//! - `vectors`: vector insert and k-NN search
//! - `lifecycle`: vacuum and online index migration

pub mod health;
pub mod lifecycle;
pub mod namespaces;
pub mod vectors;

pub use health::health_check;
pub use lifecycle::{migration_status, run_vacuum, start_migration};
pub use namespaces::{create_namespace, delete_namespace, get_namespace, list_namespaces};
pub use vectors::{add_vector, search};
