//! The polymorphic index capability set: flat, KD-tree, and HNSW variants
//! behind a single tagged enum, per the design note to avoid dynamic
//! dispatch on the hot search path.

pub mod flat;
pub mod hnsw;
pub mod kdtree;
mod ordered_float;

use crate::distance::DistanceMetric;
use crate::record::VectorRecord;
use serde::{Deserialize, Serialize};

pub use hnsw::HnswParams;

/// Which ANN index backs a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexType {
    Flat,
    KdTree,
    Hnsw,
}

/// A collection's active index. Every variant offers insert/remove/search/
/// rebuild; they differ in build cost, query cost, and recall.
pub enum Index {
    Flat(flat::FlatIndex),
    KdTree(kdtree::KdTreeIndex),
    Hnsw(Box<hnsw::HnswIndex>),
}

impl Index {
    #[must_use]
    pub fn new(index_type: IndexType, dimension: usize, metric: DistanceMetric) -> Self {
        match index_type {
            IndexType::Flat => Self::Flat(flat::FlatIndex::new()),
            IndexType::KdTree => Self::KdTree(kdtree::KdTreeIndex::new(dimension)),
            IndexType::Hnsw => {
                Self::Hnsw(Box::new(hnsw::HnswIndex::new(metric, HnswParams::default())))
            }
        }
    }

    #[must_use]
    pub fn index_type(&self) -> IndexType {
        match self {
            Self::Flat(_) => IndexType::Flat,
            Self::KdTree(_) => IndexType::KdTree,
            Self::Hnsw(_) => IndexType::Hnsw,
        }
    }

    pub fn insert(&mut self, id: u64, vector: &[f32]) {
        match self {
            Self::Flat(idx) => idx.insert(id, vector),
            Self::KdTree(idx) => idx.insert(id, vector),
            Self::Hnsw(idx) => idx.insert(id, vector),
        }
    }

    pub fn remove(&mut self, id: u64) {
        match self {
            Self::Flat(idx) => idx.remove(id),
            Self::KdTree(idx) => idx.remove(id),
            Self::Hnsw(idx) => idx.remove(id),
        }
    }

    /// Rebuilds the index from scratch using the collection's current live
    /// records. `records` is the collection's full record vector
    /// (tombstoned entries are filtered out internally).
    pub fn rebuild(&mut self, records: &[VectorRecord], metric: DistanceMetric) {
        match self {
            Self::Flat(idx) => idx.rebuild(records),
            Self::KdTree(idx) => idx.rebuild(records),
            Self::Hnsw(idx) => idx.rebuild(metric, HnswParams::default(), records),
        }
    }

    /// Returns up to `k` candidates ordered by ascending distance under
    /// `metric`. `records` is only consulted by the flat variant, which
    /// stores no state of its own.
    #[must_use]
    pub fn search(
        &self,
        records: &[VectorRecord],
        query: &[f32],
        k: usize,
        metric: DistanceMetric,
    ) -> Vec<(u64, f32)> {
        match self {
            Self::Flat(idx) => idx.search(records, query, k, metric),
            Self::KdTree(idx) => idx.search(query, k, metric),
            Self::Hnsw(idx) => idx.search(query, k, metric),
        }
    }

    /// Fraction of tombstoned/stale entries, used by the vacuum manager's
    /// rebuild decision. The flat variant has no internal state to go
    /// stale, so it always reports zero.
    #[must_use]
    pub fn fragmentation(&self) -> f64 {
        match self {
            Self::Flat(_) => 0.0,
            Self::KdTree(idx) => idx.stale_fraction(),
            Self::Hnsw(idx) => idx.fragmentation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;

    #[test]
    fn all_variants_find_exact_match() {
        for index_type in [IndexType::Flat, IndexType::KdTree, IndexType::Hnsw] {
            let mut idx = Index::new(index_type, 2, DistanceMetric::Euclidean);
            let records: Vec<VectorRecord> = (0..40)
                .map(|i| VectorRecord::new(i, vec![i as f32, 0.0], Metadata::new()))
                .collect();
            for r in &records {
                idx.insert(r.internal_id, &r.data);
            }
            let results = idx.search(&records, &[20.0, 0.0], 1, DistanceMetric::Euclidean);
            assert_eq!(results.len(), 1, "{index_type:?}");
            assert_eq!(results[0].0, 20, "{index_type:?}");
        }
    }
}
