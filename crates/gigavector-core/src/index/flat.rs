//! Linear-scan ANN baseline.
//!
//! Stores nothing beyond what the collection already has: `insert` and
//! `remove` are no-ops, and `search` scans every live record, keeping a
//! bounded max-heap of the `k` best candidates. O(N·d) per query.

use super::ordered_float::OrderedFloat;
use crate::distance::DistanceMetric;
use crate::record::VectorRecord;
use std::collections::BinaryHeap;

#[derive(Debug, Default, Clone, Copy)]
pub struct FlatIndex;

impl FlatIndex {
    pub fn new() -> Self {
        Self
    }

    pub fn insert(&mut self, _id: u64, _vector: &[f32]) {}

    pub fn remove(&mut self, _id: u64) {}

    pub fn rebuild(&mut self, _records: &[VectorRecord]) {}

    /// Scans every live record, returning the `k` closest by distance.
    /// Ties broken by lower `internal_id`.
    pub fn search(
        &self,
        records: &[VectorRecord],
        query: &[f32],
        k: usize,
        metric: DistanceMetric,
    ) -> Vec<(u64, f32)> {
        if k == 0 {
            return Vec::new();
        }
        // Max-heap keyed by (distance desc, id desc) so the worst candidate
        // (furthest, and among ties the higher id) is what gets evicted when
        // the heap grows past k.
        let mut heap: BinaryHeap<(OrderedFloat, u64)> = BinaryHeap::with_capacity(k + 1);
        for record in records {
            if record.tombstone {
                continue;
            }
            let Ok(dist) = metric.distance(query, &record.data) else {
                continue;
            };
            let key = (OrderedFloat(dist), record.internal_id);
            if heap.len() < k {
                heap.push(key);
            } else if let Some(&worst) = heap.peek() {
                if key < worst {
                    heap.pop();
                    heap.push(key);
                }
            }
        }
        let mut results: Vec<(u64, f32)> = heap.into_iter().map(|(d, id)| (id, d.0)).collect();
        results.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        results
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
    fn returns_k_nearest_sorted() {
        let records = vec![
            rec(0, vec![0.0, 0.0]),
            rec(1, vec![1.0, 0.0]),
            rec(2, vec![5.0, 0.0]),
            rec(3, vec![0.5, 0.0]),
        ];
        let idx = FlatIndex::new();
        let results = idx.search(&records, &[0.0, 0.0], 2, DistanceMetric::Euclidean);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 3);
    }

    #[test]
    fn skips_tombstoned_records() {
        let mut records = vec![rec(0, vec![0.0, 0.0]), rec(1, vec![1.0, 0.0])];
        records[0].tombstone = true;
        let idx = FlatIndex::new();
        let results = idx.search(&records, &[0.0, 0.0], 5, DistanceMetric::Euclidean);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 1);
    }

    #[test]
    fn exact_match_has_zero_distance() {
        let records = vec![rec(0, vec![1.0, 2.0, 3.0])];
        let idx = FlatIndex::new();
        let results = idx.search(&records, &[1.0, 2.0, 3.0], 1, DistanceMetric::Euclidean);
        assert_eq!(results[0].0, 0);
        assert!(results[0].1.abs() < 1e-5);
    }
}
