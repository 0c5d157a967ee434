//! The HNSW graph proper: multi-layer small-world structure with greedy
//! descent, beam search, and VAMANA-style neighbor diversification.
//!
//! Node ids here are dense slots (`NodeId = usize`), local to the graph;
//! [`super::HnswIndex`] maps a record's `internal_id` to a slot. Deletion
//! is soft: a tombstoned node is skipped during traversal and candidate
//! collection but its edges are left in place, matching the spec's
//! soft-delete contract for HNSW.

use super::layer::{Layer, NodeId};
use crate::distance::DistanceMetric;
use crate::index::ordered_float::OrderedFloat;
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Construction/search parameters for an HNSW graph.
#[derive(Debug, Clone, Copy)]
pub struct HnswParams {
    pub m: usize,
    pub m_max0: usize,
    pub ef_construction: usize,
    pub ef_search: usize,
    pub min_fragmentation_ratio: f64,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 16,
            m_max0: 32,
            ef_construction: 200,
            ef_search: 50,
            min_fragmentation_ratio: 0.2,
        }
    }
}

pub struct Graph {
    metric: DistanceMetric,
    vectors: RwLock<Vec<Vec<f32>>>,
    tombstones: RwLock<Vec<bool>>,
    layers: RwLock<Vec<Layer>>,
    entry_point: RwLock<Option<NodeId>>,
    max_layer: AtomicUsize,
    count: AtomicUsize,
    tombstone_count: AtomicUsize,
    rng_state: AtomicU64,
    params: HnswParams,
    level_mult: f64,
}

impl Graph {
    pub fn new(metric: DistanceMetric, params: HnswParams) -> Self {
        let level_mult = 1.0 / (params.m as f64).ln();
        Self {
            metric,
            vectors: RwLock::new(Vec::new()),
            tombstones: RwLock::new(Vec::new()),
            layers: RwLock::new(vec![Layer::new(0)]),
            entry_point: RwLock::new(None),
            max_layer: AtomicUsize::new(0),
            count: AtomicUsize::new(0),
            tombstone_count: AtomicUsize::new(0),
            rng_state: AtomicU64::new(0x5DEE_CE66_D1A4_B5B5),
            params,
            level_mult,
        }
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fraction of inserted nodes currently tombstoned.
    pub fn fragmentation(&self) -> f64 {
        let total = self.len();
        if total == 0 {
            return 0.0;
        }
        self.tombstone_count.load(Ordering::Relaxed) as f64 / total as f64
    }

    pub fn needs_rebuild(&self) -> bool {
        self.fragmentation() > self.params.min_fragmentation_ratio
    }

    /// Inserts a vector, returning its graph-local node id.
    pub fn insert(&self, vector: Vec<f32>) -> NodeId {
        let node_id = {
            let mut vectors = self.vectors.write();
            let id = vectors.len();
            vectors.push(vector);
            let mut tombstones = self.tombstones.write();
            tombstones.push(false);
            id
        };

        let node_layer = self.random_layer();

        {
            let mut layers = self.layers.write();
            while layers.len() <= node_layer {
                layers.push(Layer::new(node_id + 1));
            }
            for layer in layers.iter_mut() {
                layer.ensure_capacity(node_id);
            }
        }

        let entry_point = *self.entry_point.read();

        if let Some(ep) = entry_point {
            let mut current_ep = ep;
            let max_layer = self.max_layer.load(Ordering::Relaxed);

            for layer_idx in (node_layer + 1..=max_layer).rev() {
                current_ep = self.search_layer_single(&self.get_vector(node_id), current_ep, layer_idx);
            }

            for layer_idx in (0..=node_layer.min(max_layer)).rev() {
                let neighbors = self.search_layer(
                    &self.get_vector(node_id),
                    vec![current_ep],
                    self.params.ef_construction,
                    layer_idx,
                );

                let max_conn = if layer_idx == 0 {
                    self.params.m_max0
                } else {
                    self.params.m
                };
                let selected = self.select_neighbors(&neighbors, max_conn);

                self.layers.read()[layer_idx].set_neighbors(node_id, selected.clone());

                for &neighbor in &selected {
                    self.add_bidirectional_connection(node_id, neighbor, layer_idx, max_conn);
                }

                if !neighbors.is_empty() {
                    current_ep = neighbors[0].0;
                }
            }
        } else {
            *self.entry_point.write() = Some(node_id);
        }

        if node_layer > self.max_layer.load(Ordering::Relaxed) || entry_point.is_none() {
            self.max_layer.store(node_layer, Ordering::Relaxed);
            *self.entry_point.write() = Some(node_id);
        }

        self.count.fetch_add(1, Ordering::Relaxed);
        node_id
    }

    /// Marks a node tombstoned. Skipped by future traversals; its edges are
    /// left untouched until a rebuild.
    pub fn tombstone(&self, node_id: NodeId) {
        let mut tombstones = self.tombstones.write();
        if let Some(slot) = tombstones.get_mut(node_id) {
            if !*slot {
                *slot = true;
                self.tombstone_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn is_tombstoned(&self, node_id: NodeId) -> bool {
        self.tombstones.read().get(node_id).copied().unwrap_or(true)
    }

    /// Layered beam search from the graph's entry point, returning up to
    /// `k` live nodes by distance under `metric`.
    pub fn search(&self, query: &[f32], k: usize, metric: DistanceMetric) -> Vec<(NodeId, f32)> {
        let Some(ep) = *self.entry_point.read() else {
            return Vec::new();
        };
        let max_layer = self.max_layer.load(Ordering::Relaxed);

        let mut current_ep = ep;
        for layer_idx in (1..=max_layer).rev() {
            current_ep = self.search_layer_single_with(query, current_ep, layer_idx, metric);
        }

        let candidates =
            self.search_layer_with(query, vec![current_ep], self.params.ef_search.max(k), 0, metric);
        candidates.into_iter().take(k).collect()
    }

    fn get_vector(&self, node_id: NodeId) -> Vec<f32> {
        self.vectors.read()[node_id].clone()
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn random_layer(&self) -> usize {
        let mut state = self.rng_state.load(Ordering::Relaxed);
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        self.rng_state.store(state, Ordering::Relaxed);

        let uniform = ((state as f64) / (u64::MAX as f64)).max(f64::MIN_POSITIVE);
        let level = (-uniform.ln() * self.level_mult).floor() as usize;
        level.min(15)
    }

    fn search_layer_single(&self, query: &[f32], entry: NodeId, layer: usize) -> NodeId {
        self.search_layer_single_with(query, entry, layer, self.metric)
    }

    fn search_layer_single_with(
        &self,
        query: &[f32],
        entry: NodeId,
        layer: usize,
        metric: DistanceMetric,
    ) -> NodeId {
        let mut best = entry;
        let mut best_dist = metric.distance(query, &self.get_vector(entry)).unwrap_or(f32::MAX);

        loop {
            let neighbors = self.layers.read()[layer].get_neighbors(best);
            let mut improved = false;

            for neighbor in neighbors {
                if self.is_tombstoned(neighbor) {
                    continue;
                }
                let dist = metric
                    .distance(query, &self.get_vector(neighbor))
                    .unwrap_or(f32::MAX);
                if dist < best_dist {
                    best = neighbor;
                    best_dist = dist;
                    improved = true;
                }
            }

            if !improved {
                break;
            }
        }

        best
    }

    fn search_layer(
        &self,
        query: &[f32],
        entry_points: Vec<NodeId>,
        ef: usize,
        layer: usize,
    ) -> Vec<(NodeId, f32)> {
        self.search_layer_with(query, entry_points, ef, layer, self.metric)
    }

    fn search_layer_with(
        &self,
        query: &[f32],
        entry_points: Vec<NodeId>,
        ef: usize,
        layer: usize,
        metric: DistanceMetric,
    ) -> Vec<(NodeId, f32)> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, NodeId)>> = BinaryHeap::new();
        let mut results: BinaryHeap<(OrderedFloat, NodeId)> = BinaryHeap::new();

        let vectors = self.vectors.read();

        for ep in entry_points {
            if self.is_tombstoned(ep) {
                continue;
            }
            let dist = metric.distance(query, &vectors[ep]).unwrap_or(f32::MAX);
            candidates.push(Reverse((OrderedFloat(dist), ep)));
            results.push((OrderedFloat(dist), ep));
            visited.insert(ep);
        }

        while let Some(Reverse((OrderedFloat(c_dist), c_node))) = candidates.pop() {
            let furthest_dist = results.peek().map_or(f32::MAX, |r| r.0 .0);

            if c_dist > furthest_dist && results.len() >= ef {
                break;
            }

            let neighbors = self.layers.read()[layer].get_neighbors(c_node);

            for neighbor in neighbors {
                if self.is_tombstoned(neighbor) || !visited.insert(neighbor) {
                    continue;
                }
                let dist = metric.distance(query, &vectors[neighbor]).unwrap_or(f32::MAX);
                let furthest = results.peek().map_or(f32::MAX, |r| r.0 .0);

                if dist < furthest || results.len() < ef {
                    candidates.push(Reverse((OrderedFloat(dist), neighbor)));
                    results.push((OrderedFloat(dist), neighbor));

                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut result_vec: Vec<(NodeId, f32)> =
            results.into_iter().map(|(d, n)| (n, d.0)).collect();
        result_vec.sort_by(|a, b| a.1.total_cmp(&b.1));
        result_vec
    }

    /// VAMANA-style heuristic neighbor selection: a candidate is kept if no
    /// already-selected neighbor is closer to it than it is to the query.
    fn select_neighbors(&self, candidates: &[(NodeId, f32)], max_neighbors: usize) -> Vec<NodeId> {
        if candidates.is_empty() {
            return Vec::new();
        }
        if candidates.len() <= max_neighbors {
            return candidates.iter().map(|(id, _)| *id).collect();
        }

        let mut selected: Vec<NodeId> = Vec::with_capacity(max_neighbors);
        let mut selected_vecs: Vec<Vec<f32>> = Vec::with_capacity(max_neighbors);

        for &(candidate_id, candidate_dist) in candidates {
            if selected.len() >= max_neighbors {
                break;
            }
            let candidate_vec = self.get_vector(candidate_id);
            let is_diverse = selected_vecs.iter().all(|selected_vec| {
                let dist_to_selected = self
                    .metric
                    .distance(&candidate_vec, selected_vec)
                    .unwrap_or(f32::MAX);
                candidate_dist <= dist_to_selected
            });
            if is_diverse || selected.is_empty() {
                selected.push(candidate_id);
                selected_vecs.push(candidate_vec);
            }
        }

        if selected.len() < max_neighbors {
            for &(candidate_id, _) in candidates {
                if selected.len() >= max_neighbors {
                    break;
                }
                if !selected.contains(&candidate_id) {
                    selected.push(candidate_id);
                }
            }
        }

        selected
    }

    fn add_bidirectional_connection(
        &self,
        new_node: NodeId,
        neighbor: NodeId,
        layer: usize,
        max_conn: usize,
    ) {
        let neighbor_vec = self.get_vector(neighbor);
        let current_neighbors = self.layers.read()[layer].get_neighbors(neighbor);

        if current_neighbors.len() < max_conn {
            let layers = self.layers.read();
            let mut neighbors = layers[layer].get_neighbors(neighbor);
            neighbors.push(new_node);
            layers[layer].set_neighbors(neighbor, neighbors);
        } else {
            let mut all_neighbors = current_neighbors.clone();
            all_neighbors.push(new_node);

            let neighbor_vecs: Vec<(NodeId, Vec<f32>)> = all_neighbors
                .iter()
                .map(|&n| (n, self.get_vector(n)))
                .collect();

            let mut with_dist: Vec<(NodeId, f32)> = neighbor_vecs
                .iter()
                .map(|(n, n_vec)| {
                    (
                        *n,
                        self.metric.distance(&neighbor_vec, n_vec).unwrap_or(f32::MAX),
                    )
                })
                .collect();

            with_dist.sort_by(|a, b| a.1.total_cmp(&b.1));
            let pruned: Vec<NodeId> = with_dist.into_iter().take(max_conn).map(|(n, _)| n).collect();

            self.layers.read()[layer].set_neighbors(neighbor, pruned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_search_finds_self() {
        let graph = Graph::new(DistanceMetric::Euclidean, HnswParams::default());
        let mut ids = Vec::new();
        for i in 0..64u32 {
            let v: Vec<f32> = vec![i as f32, (i * 2) as f32];
            ids.push(graph.insert(v));
        }
        let query = vec![30.0, 60.0];
        let results = graph.search(&query, 1, DistanceMetric::Euclidean);
        assert_eq!(results.len(), 1);
        assert!(results[0].1 < 1e-3);
    }

    #[test]
    fn tombstoned_nodes_are_skipped() {
        let graph = Graph::new(DistanceMetric::Euclidean, HnswParams::default());
        let mut ids = Vec::new();
        for i in 0..32u32 {
            ids.push(graph.insert(vec![i as f32, 0.0]));
        }
        let target = ids[5];
        graph.tombstone(target);
        let results = graph.search(&[5.0, 0.0], 32, DistanceMetric::Euclidean);
        assert!(!results.iter().any(|(id, _)| *id == target));
    }

    #[test]
    fn fragmentation_tracks_tombstones() {
        let graph = Graph::new(DistanceMetric::Euclidean, HnswParams::default());
        let ids: Vec<_> = (0..10u32).map(|i| graph.insert(vec![i as f32])).collect();
        assert_eq!(graph.fragmentation(), 0.0);
        graph.tombstone(ids[0]);
        graph.tombstone(ids[1]);
        assert!((graph.fragmentation() - 0.2).abs() < 1e-9);
    }
}
