//! Namespace manager: a concurrent name→collection mapping with quotas.
//!
//! An external collaborator per the spec — the core only needs this much
//! of it to exercise the rest of the system end-to-end. Grounded on the
//! teacher's `Database` struct (`lib.rs`), generalized to a concurrent map
//! since multiple namespaces can be created/looked up from different
//! threads without the caller holding an external lock.

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::index::IndexType;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Configuration for a new namespace. Defaults match the embedded API's
/// `namespace_config_init`: no name, dimension 0 (must be set before use),
/// `HNSW` index, unlimited vectors and memory.
#[derive(Debug, Clone)]
pub struct NamespaceConfig {
    pub name: Option<String>,
    pub dimension: usize,
    pub index_type: IndexType,
    /// 0 = unlimited.
    pub max_vectors: usize,
    /// 0 = unlimited.
    pub max_memory_bytes: usize,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            name: None,
            dimension: 0,
            index_type: IndexType::Hnsw,
            max_vectors: 0,
            max_memory_bytes: 0,
        }
    }
}

/// A read-only snapshot of a namespace's bookkeeping.
#[derive(Debug, Clone)]
pub struct NamespaceInfo {
    pub name: String,
    pub dimension: usize,
    pub index_type: IndexType,
    pub vector_count: usize,
    pub max_vectors: usize,
    pub max_memory_bytes: usize,
}

struct Namespace {
    config: NamespaceConfig,
    collection: Arc<Mutex<Collection>>,
}

/// A concurrent name→collection map with per-namespace quotas.
#[derive(Default)]
pub struct NamespaceManager {
    namespaces: DashMap<String, Namespace>,
}

impl NamespaceManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            namespaces: DashMap::new(),
        }
    }

    /// Creates a namespace. Fails with [`Error::InvalidArgument`] if one
    /// with the same name already exists or `dimension == 0`.
    pub fn create(&self, config: NamespaceConfig) -> Result<()> {
        let name = config
            .name
            .clone()
            .ok_or_else(|| Error::InvalidArgument("namespace name is required".into()))?;
        if config.dimension == 0 {
            return Err(Error::InvalidArgument("dimension must be nonzero".into()));
        }
        if self.namespaces.contains_key(&name) {
            return Err(Error::InvalidArgument(format!("namespace {name} already exists")));
        }
        let collection = Collection::open(None, config.dimension, config.index_type);
        self.namespaces.insert(
            name,
            Namespace {
                config,
                collection: Arc::new(Mutex::new(collection)),
            },
        );
        Ok(())
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Returns the namespace's collection handle, if it exists.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Mutex<Collection>>> {
        self.namespaces.get(name).map(|ns| Arc::clone(&ns.collection))
    }

    /// Deletes a namespace. No-op if absent.
    pub fn delete(&self, name: &str) {
        self.namespaces.remove(name);
    }

    /// Lists all namespace names.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.namespaces.iter().map(|e| e.key().clone()).collect()
    }

    /// Inserts a vector into a namespace's collection, respecting
    /// `max_vectors` if configured.
    pub fn add_vector(&self, name: &str, data: Vec<f32>) -> Result<u64> {
        let ns = self
            .namespaces
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let mut collection = ns.collection.lock();
        if ns.config.max_vectors > 0 && collection.stats().live_count >= ns.config.max_vectors {
            return Err(Error::ResourceExhausted(format!(
                "namespace {name} at max_vectors quota"
            )));
        }
        collection.add_vector(data)
    }

    #[must_use]
    pub fn count(&self, name: &str) -> Option<usize> {
        let ns = self.namespaces.get(name)?;
        Some(ns.collection.lock().stats().live_count)
    }

    #[must_use]
    pub fn get_info(&self, name: &str) -> Option<NamespaceInfo> {
        let ns = self.namespaces.get(name)?;
        let stats = ns.collection.lock().stats();
        Some(NamespaceInfo {
            name: name.to_string(),
            dimension: stats.dimension,
            index_type: stats.index_type,
            vector_count: stats.live_count,
            max_vectors: ns.config.max_vectors,
            max_memory_bytes: ns.config.max_memory_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, dim: usize) -> NamespaceConfig {
        NamespaceConfig {
            name: Some(name.to_string()),
            dimension: dim,
            ..NamespaceConfig::default()
        }
    }

    #[test]
    fn create_get_delete_roundtrip() {
        let mgr = NamespaceManager::new();
        mgr.create(config("docs", 4)).unwrap();
        assert!(mgr.exists("docs"));
        assert!(mgr.get("docs").is_some());
        mgr.delete("docs");
        assert!(!mgr.exists("docs"));
    }

    #[test]
    fn duplicate_create_fails() {
        let mgr = NamespaceManager::new();
        mgr.create(config("docs", 4)).unwrap();
        assert!(mgr.create(config("docs", 4)).is_err());
    }

    #[test]
    fn quota_enforced() {
        let mgr = NamespaceManager::new();
        mgr.create(NamespaceConfig {
            max_vectors: 1,
            ..config("docs", 2)
        })
        .unwrap();
        mgr.add_vector("docs", vec![1.0, 2.0]).unwrap();
        assert!(mgr.add_vector("docs", vec![3.0, 4.0]).is_err());
    }

    #[test]
    fn unknown_namespace_not_found() {
        let mgr = NamespaceManager::new();
        assert!(mgr.add_vector("missing", vec![1.0]).is_err());
        assert!(mgr.get_info("missing").is_none());
    }
}
