//! # `GigaVector` Core
//!
//! Embeddable vector database engine: ANN indexes (flat, KD-tree, HNSW),
//! SIMD-dispatched distance kernels, a metadata filter DSL, geo
//! pre-filtering, and online lifecycle machinery (vacuum, index migration).
//!
//! `GigaVector` is designed to be dropped into a host process as a library —
//! there is no network surface or persistence layer here, those live in
//! `gigavector-server`.
//!
//! ## Quick start
//!
//! ```rust
//! use gigavector_core::{Collection, DistanceMetric, IndexType};
//!
//! let mut collection = Collection::open(None, 3, IndexType::Flat);
//! let id = collection.add_vector(vec![0.1, 0.2, 0.3]).unwrap();
//! let hits = collection.search(&[0.1, 0.2, 0.3], 1, DistanceMetric::Euclidean).unwrap();
//! assert_eq!(hits[0].id, id);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod collection;
pub mod config;
pub mod distance;
pub mod error;
pub mod filter;
pub mod geo;
pub mod index;
pub mod migration;
pub mod namespace;
pub mod record;
pub mod simd;
pub mod vacuum;

pub use collection::{Collection, CollectionStats, SearchResult};
pub use config::GigaConfig;
pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use filter::Filter;
pub use geo::GeoIndex;
pub use index::{Index, IndexType};
pub use migration::{Migration, MigrationConfig, MigrationStatus, ReindexReason};
pub use namespace::{NamespaceConfig, NamespaceInfo, NamespaceManager};
pub use record::{Metadata, VectorRecord};
pub use vacuum::{VacuumConfig, VacuumManager, VacuumState};
