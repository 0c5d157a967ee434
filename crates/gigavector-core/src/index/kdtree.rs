//! Balanced k-d tree for low/medium-dimensional ANN search.
//!
//! Built by median split on the axis of maximum variance at each node;
//! leaves hold up to a small bucket of ids. Deletions mark entries stale
//! rather than physically removing them from the tree; once the stale
//! fraction crosses a threshold the vacuum manager may request a rebuild.
//!
//! Pruning in [`search`] uses the axis-plane distance in the query's own
//! coordinate space, which is exact for `Euclidean` and a reasonable
//! approximation for `Cosine`/`Dot` — acceptable since the system is
//! approximate by construction for ANN indexes.

use super::ordered_float::OrderedFloat;
use crate::distance::DistanceMetric;
use crate::record::VectorRecord;
use rustc_hash::FxHashMap;
use std::collections::BinaryHeap;

const DEFAULT_BUCKET_SIZE: usize = 8;
const DEFAULT_REBUILD_RATIO: f64 = 0.2;

enum Node {
    Leaf {
        ids: Vec<u64>,
    },
    Split {
        axis: usize,
        value: f32,
        left: Box<Node>,
        right: Box<Node>,
    },
}

pub struct KdTreeIndex {
    dim: usize,
    bucket_size: usize,
    rebuild_ratio: f64,
    root: Option<Node>,
    vectors: FxHashMap<u64, Vec<f32>>,
    stale: FxHashMap<u64, bool>,
    stale_count: usize,
}

impl KdTreeIndex {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            bucket_size: DEFAULT_BUCKET_SIZE,
            rebuild_ratio: DEFAULT_REBUILD_RATIO,
            root: None,
            vectors: FxHashMap::default(),
            stale: FxHashMap::default(),
            stale_count: 0,
        }
    }

    pub fn insert(&mut self, id: u64, vector: &[f32]) {
        self.vectors.insert(id, vector.to_vec());
        self.stale.insert(id, false);
        match self.root.take() {
            None => self.root = Some(Node::Leaf { ids: vec![id] }),
            Some(root) => self.root = Some(self.insert_into(root, id)),
        }
    }

    pub fn remove(&mut self, id: u64) {
        if let Some(was_stale) = self.stale.insert(id, true) {
            if !was_stale {
                self.stale_count += 1;
            }
        }
    }

    /// Fraction of indexed ids marked stale (pending a rebuild).
    #[must_use]
    pub fn stale_fraction(&self) -> f64 {
        if self.vectors.is_empty() {
            0.0
        } else {
            self.stale_count as f64 / self.vectors.len() as f64
        }
    }

    #[must_use]
    pub fn needs_rebuild(&self) -> bool {
        self.stale_fraction() > self.rebuild_ratio
    }

    pub fn rebuild(&mut self, records: &[VectorRecord]) {
        self.vectors.clear();
        self.stale.clear();
        self.stale_count = 0;
        self.root = None;
        let mut entries: Vec<(u64, Vec<f32>)> = records
            .iter()
            .filter(|r| !r.tombstone)
            .map(|r| (r.internal_id, r.data.clone()))
            .collect();
        for (id, data) in &entries {
            self.vectors.insert(*id, data.clone());
            self.stale.insert(*id, false);
        }
        if entries.is_empty() {
            return;
        }
        self.root = Some(self.build(&mut entries));
    }

    pub fn search(&self, query: &[f32], k: usize, metric: DistanceMetric) -> Vec<(u64, f32)> {
        if k == 0 {
            return Vec::new();
        }
        let Some(root) = &self.root else {
            return Vec::new();
        };
        let mut heap: BinaryHeap<(OrderedFloat, u64)> = BinaryHeap::with_capacity(k + 1);
        self.search_node(root, query, k, metric, &mut heap);
        let mut results: Vec<(u64, f32)> = heap.into_iter().map(|(d, id)| (id, d.0)).collect();
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        results
    }

    fn search_node(
        &self,
        node: &Node,
        query: &[f32],
        k: usize,
        metric: DistanceMetric,
        heap: &mut BinaryHeap<(OrderedFloat, u64)>,
    ) {
        match node {
            Node::Leaf { ids } => {
                for &id in ids {
                    if self.stale.get(&id).copied().unwrap_or(false) {
                        continue;
                    }
                    let Some(vec) = self.vectors.get(&id) else {
                        continue;
                    };
                    let Ok(dist) = metric.distance(query, vec) else {
                        continue;
                    };
                    push_bounded(heap, k, dist, id);
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let q = query.get(*axis).copied().unwrap_or(0.0);
                let (near, far) = if q <= *value {
                    (left, right)
                } else {
                    (right, left)
                };
                self.search_node(near, query, k, metric, heap);
                let plane_dist = (q - value).abs();
                let worst = heap.peek().map(|(d, _)| d.0);
                if heap.len() < k || worst.is_none_or(|w| plane_dist < w) {
                    self.search_node(far, query, k, metric, heap);
                }
            }
        }
    }

    fn insert_into(&self, node: Node, id: u64) -> Node {
        match node {
            Node::Leaf { mut ids } => {
                ids.push(id);
                if ids.len() > self.bucket_size {
                    let mut entries: Vec<(u64, Vec<f32>)> = ids
                        .iter()
                        .filter_map(|&i| self.vectors.get(&i).map(|v| (i, v.clone())))
                        .collect();
                    self.build(&mut entries)
                } else {
                    Node::Leaf { ids }
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let q = self
                    .vectors
                    .get(&id)
                    .and_then(|v| v.get(axis).copied())
                    .unwrap_or(0.0);
                if q <= value {
                    Node::Split {
                        axis,
                        value,
                        left: Box::new(self.insert_into(*left, id)),
                        right,
                    }
                } else {
                    Node::Split {
                        axis,
                        value,
                        left,
                        right: Box::new(self.insert_into(*right, id)),
                    }
                }
            }
        }
    }

    fn build(&self, entries: &mut [(u64, Vec<f32>)]) -> Node {
        if entries.len() <= self.bucket_size {
            return Node::Leaf {
                ids: entries.iter().map(|(id, _)| *id).collect(),
            };
        }
        let axis = self.axis_of_max_variance(entries);
        entries.sort_by(|a, b| a.1[axis].total_cmp(&b.1[axis]));
        let mid = entries.len() / 2;
        let value = entries[mid].1[axis];
        let (left_entries, right_entries) = entries.split_at_mut(mid);
        let left = self.build(left_entries);
        let right = self.build(right_entries);
        Node::Split {
            axis,
            value,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn axis_of_max_variance(&self, entries: &[(u64, Vec<f32>)]) -> usize {
        let n = entries.len() as f32;
        let mut best_axis = 0;
        let mut best_var = -1.0f32;
        for axis in 0..self.dim {
            let mean: f32 = entries.iter().map(|(_, v)| v[axis]).sum::<f32>() / n;
            let var: f32 = entries
                .iter()
                .map(|(_, v)| (v[axis] - mean) * (v[axis] - mean))
                .sum::<f32>()
                / n;
            if var > best_var {
                best_var = var;
                best_axis = axis;
            }
        }
        best_axis
    }
}

fn push_bounded(heap: &mut BinaryHeap<(OrderedFloat, u64)>, k: usize, dist: f32, id: u64) {
    let key = (OrderedFloat(dist), id);
    if heap.len() < k {
        heap.push(key);
    } else if let Some(&worst) = heap.peek() {
        if key < worst {
            heap.pop();
            heap.push(key);
        }
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
    fn build_and_search_returns_exact_match() {
        let records: Vec<VectorRecord> = (0..50)
            .map(|i| rec(i, vec![i as f32, (i * 2) as f32]))
            .collect();
        let mut idx = KdTreeIndex::new(2);
        idx.rebuild(&records);
        let results = idx.search(&[10.0, 20.0], 1, DistanceMetric::Euclidean);
        assert_eq!(results[0].0, 10);
        assert!(results[0].1.abs() < 1e-5);
    }

    #[test]
    fn incremental_insert_matches_rebuild_membership() {
        let mut idx = KdTreeIndex::new(2);
        for i in 0..30u64 {
            idx.insert(i, &[i as f32, 0.0]);
        }
        let results = idx.search(&[15.0, 0.0], 3, DistanceMetric::Euclidean);
        assert_eq!(results.len(), 3);
        assert!(results.iter().any(|(id, _)| *id == 15));
    }

    #[test]
    fn remove_marks_stale_and_excludes_from_search() {
        let mut idx = KdTreeIndex::new(2);
        for i in 0..10u64 {
            idx.insert(i, &[i as f32, 0.0]);
        }
        idx.remove(5);
        let results = idx.search(&[5.0, 0.0], 10, DistanceMetric::Euclidean);
        assert!(!results.iter().any(|(id, _)| *id == 5));
        assert!(idx.stale_fraction() > 0.0);
    }

    #[test]
    fn rebuild_clears_stale_fraction() {
        let mut idx = KdTreeIndex::new(2);
        let records: Vec<VectorRecord> = (0..20).map(|i| rec(i, vec![i as f32, 0.0])).collect();
        idx.rebuild(&records);
        for i in 0..15u64 {
            idx.remove(i);
        }
        assert!(idx.needs_rebuild());
        idx.rebuild(&records[15..]);
        assert_eq!(idx.stale_fraction(), 0.0);
    }
}
