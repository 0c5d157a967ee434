//! A single layer in the HNSW hierarchy: a per-node adjacency list.

use parking_lot::RwLock;

/// A dense, index-local node identifier (distinct from a record's
/// `internal_id`; see [`super::HnswIndex`] for the id↔slot mapping).
pub type NodeId = usize;

#[derive(Debug)]
pub struct Layer {
    neighbors: Vec<RwLock<Vec<NodeId>>>,
}

impl Layer {
    pub fn new(capacity: usize) -> Self {
        Self {
            neighbors: (0..capacity).map(|_| RwLock::new(Vec::new())).collect(),
        }
    }

    pub fn ensure_capacity(&mut self, node_id: NodeId) {
        while self.neighbors.len() <= node_id {
            self.neighbors.push(RwLock::new(Vec::new()));
        }
    }

    pub fn get_neighbors(&self, node_id: NodeId) -> Vec<NodeId> {
        if node_id < self.neighbors.len() {
            self.neighbors[node_id].read().clone()
        } else {
            Vec::new()
        }
    }

    pub fn set_neighbors(&self, node_id: NodeId, neighbors: Vec<NodeId>) {
        if node_id < self.neighbors.len() {
            *self.neighbors[node_id].write() = neighbors;
        }
    }
}
