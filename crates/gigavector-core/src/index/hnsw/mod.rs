//! Hierarchical Navigable Small World index.
//!
//! [`graph::Graph`] is the multi-layer proximity graph itself, addressed by
//! dense graph-local node ids. `HnswIndex` adds the id↔slot indirection the
//! design notes call for: a record's `internal_id` maps to a graph node id,
//! and removal tombstones the node rather than touching the graph
//! structure, so concurrent readers never observe a half-updated graph.

mod graph;
mod layer;

pub use graph::HnswParams;

use crate::distance::DistanceMetric;
use crate::record::VectorRecord;
use graph::Graph;
use layer::NodeId;
use rustc_hash::FxHashMap;

pub struct HnswIndex {
    graph: Graph,
    id_to_node: FxHashMap<u64, NodeId>,
    node_to_id: Vec<u64>,
}

impl HnswIndex {
    #[must_use]
    pub fn new(metric: DistanceMetric, params: HnswParams) -> Self {
        Self {
            graph: Graph::new(metric, params),
            id_to_node: FxHashMap::default(),
            node_to_id: Vec::new(),
        }
    }

    pub fn insert(&mut self, id: u64, vector: &[f32]) {
        let node_id = self.graph.insert(vector.to_vec());
        self.id_to_node.insert(id, node_id);
        if self.node_to_id.len() <= node_id {
            self.node_to_id.resize(node_id + 1, 0);
        }
        self.node_to_id[node_id] = id;
    }

    pub fn remove(&mut self, id: u64) {
        if let Some(&node_id) = self.id_to_node.get(&id) {
            self.graph.tombstone(node_id);
        }
    }

    #[must_use]
    pub fn fragmentation(&self) -> f64 {
        self.graph.fragmentation()
    }

    #[must_use]
    pub fn needs_rebuild(&self) -> bool {
        self.graph.needs_rebuild()
    }

    pub fn rebuild(&mut self, metric: DistanceMetric, params: HnswParams, records: &[VectorRecord]) {
        let mut fresh = Self::new(metric, params);
        for record in records.iter().filter(|r| !r.tombstone) {
            fresh.insert(record.internal_id, &record.data);
        }
        *self = fresh;
    }

    #[must_use]
    pub fn search(&self, query: &[f32], k: usize, metric: DistanceMetric) -> Vec<(u64, f32)> {
        if self.graph.is_empty() || k == 0 {
            return Vec::new();
        }
        self.graph
            .search(query, k, metric)
            .into_iter()
            .map(|(node, dist)| (self.node_to_id[node], dist))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;

    fn rec(id: u64, data: Vec<f32>) -> VectorRecord {
        VectorRecord::new(id, data, Metadata::new())
    }

    #[test]
    fn insert_and_search_returns_external_id() {
        let mut idx = HnswIndex::new(DistanceMetric::Euclidean, HnswParams::default());
        for i in 0..50u64 {
            idx.insert(100 + i, &[i as f32, 0.0]);
        }
        let results = idx.search(&[25.0, 0.0], 1, DistanceMetric::Euclidean);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 125);
    }

    #[test]
    fn remove_then_search_excludes_id() {
        let mut idx = HnswIndex::new(DistanceMetric::Euclidean, HnswParams::default());
        for i in 0..30u64 {
            idx.insert(i, &[i as f32, 0.0]);
        }
        idx.remove(5);
        let results = idx.search(&[5.0, 0.0], 30, DistanceMetric::Euclidean);
        assert!(!results.iter().any(|(id, _)| *id == 5));
    }

    #[test]
    fn rebuild_drops_tombstoned_records() {
        let mut idx = HnswIndex::new(DistanceMetric::Euclidean, HnswParams::default());
        let mut records: Vec<VectorRecord> = (0..20).map(|i| rec(i, vec![i as f32, 0.0])).collect();
        for r in &records {
            idx.insert(r.internal_id, &r.data);
        }
        records[3].tombstone = true;
        idx.rebuild(DistanceMetric::Euclidean, HnswParams::default(), &records);
        assert_eq!(idx.fragmentation(), 0.0);
        let results = idx.search(&[3.0, 0.0], 20, DistanceMetric::Euclidean);
        assert!(!results.iter().any(|(id, _)| *id == 3));
    }
}
