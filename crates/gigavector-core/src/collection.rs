//! The collection (database): owns records, the active index, and exposes
//! add/search/delete.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::index::{Index, IndexType};
use crate::record::{Metadata, VectorRecord};
use std::path::PathBuf;

/// Default overfetch multiplier for filtered search: `search_with_filter_expr`
/// pulls `alpha * k` candidates from the index before applying the filter.
const DEFAULT_OVERFETCH_ALPHA: usize = 4;

/// One row of a search result: the matching record's id, its distance
/// under the query's metric, and a read-only view of its metadata.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: u64,
    pub distance: f32,
    pub metadata: Metadata,
}

/// A read-only snapshot of a collection's bookkeeping counters.
#[derive(Debug, Clone, Copy)]
pub struct CollectionStats {
    pub live_count: usize,
    pub deleted_count: usize,
    pub dimension: usize,
    pub index_type: IndexType,
}

/// A fixed-dimension set of vector records with one active index.
///
/// `path` is accepted by [`Collection::open`] and stored but otherwise
/// unused: persistence is out of scope for the core (see `spec.md` §6),
/// the field is reserved for a future on-disk backing store.
pub struct Collection {
    #[allow(dead_code)]
    path: Option<PathBuf>,
    dimension: usize,
    /// The metric used to build index structure (HNSW graph edges,
    /// KD-tree is metric-agnostic). `search` still accepts a metric per
    /// call; this only fixes the geometry the index was built under.
    build_metric: DistanceMetric,
    records: Vec<VectorRecord>,
    index: Index,
    next_id: u64,
    live_count: usize,
    deleted_count: usize,
}

impl Collection {
    /// Creates an empty in-memory collection. `path` is reserved for future
    /// persistence and has no effect today.
    #[must_use]
    pub fn open(path: Option<PathBuf>, dimension: usize, index_type: IndexType) -> Self {
        Self::open_with_metric(path, dimension, index_type, DistanceMetric::Euclidean)
    }

    /// As [`Self::open`], but with an explicit metric used to build the
    /// index's internal structure (only meaningful for HNSW).
    #[must_use]
    pub fn open_with_metric(
        path: Option<PathBuf>,
        dimension: usize,
        index_type: IndexType,
        build_metric: DistanceMetric,
    ) -> Self {
        tracing::info!(dimension, ?index_type, "collection opened");
        Self {
            path,
            dimension,
            build_metric,
            records: Vec::new(),
            index: Index::new(index_type, dimension, build_metric),
            next_id: 0,
            live_count: 0,
            deleted_count: 0,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[must_use]
    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            live_count: self.live_count,
            deleted_count: self.deleted_count,
            dimension: self.dimension,
            index_type: self.index.index_type(),
        }
    }

    /// Returns this collection's records, including tombstoned ones.
    ///
    /// Used in-crate by the vacuum manager, and by callers orchestrating an
    /// online [`crate::migration::Migration`] (which needs an owned
    /// snapshot of live records to rebuild against without holding the
    /// collection lock for the whole rebuild).
    #[must_use]
    pub fn records(&self) -> &[VectorRecord] {
        &self.records
    }

    /// Inserts a vector with no metadata. Fails with
    /// [`Error::DimensionMismatch`] if `data.len() != dimension`.
    pub fn add_vector(&mut self, data: Vec<f32>) -> Result<u64> {
        self.add_vector_with_metadata_map(data, Metadata::new())
    }

    /// Inserts a vector with one initial metadata pair.
    pub fn add_vector_with_metadata(
        &mut self,
        data: Vec<f32>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<u64> {
        let mut metadata = Metadata::new();
        metadata.insert(key.into(), value.into());
        self.add_vector_with_metadata_map(data, metadata)
    }

    fn add_vector_with_metadata_map(&mut self, data: Vec<f32>, metadata: Metadata) -> Result<u64> {
        if data.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: data.len(),
            });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.index.insert(id, &data);
        self.records.push(VectorRecord::new(id, data, metadata));
        self.live_count += 1;
        Ok(id)
    }

    /// Plain k-NN search against the active index.
    pub fn search(&self, query: &[f32], k: usize, metric: DistanceMetric) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let hits = self.index.search(&self.records, query, k, metric);
        Ok(self.hits_to_results(hits))
    }

    /// k-NN search with a metadata filter expression, parsed once and
    /// applied to overfetched candidates.
    ///
    /// Overfetches `alpha * k` candidates (`alpha` = 4, capped at the
    /// collection's live count), evaluates the filter and tombstone check
    /// against each, then truncates to `k`. Does not iterate expansion: if
    /// the filter rejects enough candidates that fewer than `k` remain,
    /// this returns what it has.
    pub fn search_with_filter_expr(
        &self,
        query: &[f32],
        k: usize,
        metric: DistanceMetric,
        filter_src: &str,
    ) -> Result<Vec<SearchResult>> {
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let filter = Filter::parse(filter_src)?;
        let overfetch = (DEFAULT_OVERFETCH_ALPHA * k).min(self.live_count.max(k));
        let hits = self.index.search(&self.records, query, overfetch, metric);

        let mut results = Vec::with_capacity(k.min(hits.len()));
        for (id, dist) in hits {
            if results.len() >= k {
                break;
            }
            let Some(record) = self.find_record(id) else {
                continue;
            };
            if record.tombstone {
                continue;
            }
            if filter.eval(&record.metadata) {
                results.push(SearchResult {
                    id,
                    distance: dist,
                    metadata: record.metadata.clone(),
                });
            }
        }
        Ok(results)
    }

    /// Sets the tombstone flag on `id`. Idempotent: deleting an
    /// already-deleted or unknown id returns success.
    pub fn delete_vector_by_index(&mut self, id: u64) -> Result<()> {
        let Some(record) = self.records.iter_mut().find(|r| r.internal_id == id) else {
            return Ok(());
        };
        if record.tombstone {
            return Ok(());
        }
        record.tombstone = true;
        self.index.remove(id);
        self.live_count = self.live_count.saturating_sub(1);
        self.deleted_count += 1;
        Ok(())
    }

    /// Looks up a record's metadata value for `key`.
    #[must_use]
    pub fn get_metadata(&self, id: u64, key: &str) -> Option<String> {
        self.find_record(id)?.metadata.get(key).cloned()
    }

    /// Sets a metadata key/value pair on `id`. No-op if `id` is unknown.
    pub fn set_metadata(&mut self, id: u64, key: impl Into<String>, value: impl Into<String>) {
        if let Some(record) = self.records.iter_mut().find(|r| r.internal_id == id) {
            record.metadata.insert(key.into(), value.into());
        }
    }

    /// Removes a metadata key from `id`. No-op if `id` or `key` is unknown.
    pub fn remove_metadata(&mut self, id: u64, key: &str) {
        if let Some(record) = self.records.iter_mut().find(|r| r.internal_id == id) {
            record.metadata.shift_remove(key);
        }
    }

    /// Clears all metadata from `id`.
    pub fn clear_metadata(&mut self, id: u64) {
        if let Some(record) = self.records.iter_mut().find(|r| r.internal_id == id) {
            record.metadata.clear();
        }
    }

    /// Replaces the collection's records and index in one atomic step, used
    /// by the vacuum manager after compaction and the migration manager
    /// after a completed rebuild.
    pub(crate) fn apply_compaction(&mut self, records: Vec<VectorRecord>, index: Index) {
        self.deleted_count = 0;
        self.live_count = records.len();
        self.next_id = records.len() as u64;
        self.records = records;
        self.index = index;
    }

    /// Swaps in a freshly built index, e.g. one produced by a completed
    /// [`crate::migration::Migration`]. The caller is responsible for
    /// ensuring `index` was built over this collection's current live
    /// records; this does not validate that itself.
    pub fn replace_index(&mut self, index: Index) {
        self.index = index;
    }

    /// The distance metric this collection's index was built under. A
    /// caller orchestrating an online migration needs this to rebuild an
    /// equivalent index over the same records.
    #[must_use]
    pub fn build_metric(&self) -> DistanceMetric {
        self.build_metric
    }

    fn find_record(&self, id: u64) -> Option<&VectorRecord> {
        self.records.iter().find(|r| r.internal_id == id)
    }

    fn hits_to_results(&self, hits: Vec<(u64, f32)>) -> Vec<SearchResult> {
        hits.into_iter()
            .filter_map(|(id, dist)| {
                let record = self.find_record(id)?;
                if record.tombstone {
                    return None;
                }
                Some(SearchResult {
                    id,
                    distance: dist,
                    metadata: record.metadata.clone(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_search_finds_exact_match() {
        let mut db = Collection::open(None, 2, IndexType::Flat);
        let id = db.add_vector(vec![1.0, 2.0]).unwrap();
        let results = db.search(&[1.0, 2.0], 1, DistanceMetric::Euclidean).unwrap();
        assert_eq!(results[0].id, id);
        assert!(results[0].distance.abs() < 1e-5);
    }

    #[test]
    fn dimension_mismatch_on_add() {
        let mut db = Collection::open(None, 3, IndexType::Flat);
        let err = db.add_vector(vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn metadata_roundtrip_and_clear() {
        let mut db = Collection::open(None, 2, IndexType::Flat);
        let id = db.add_vector_with_metadata(vec![1.0, 2.0], "tag", "test").unwrap();
        assert_eq!(db.get_metadata(id, "tag").as_deref(), Some("test"));
        db.remove_metadata(id, "tag");
        assert_eq!(db.get_metadata(id, "tag"), None);
        db.set_metadata(id, "a", "1");
        db.set_metadata(id, "b", "2");
        db.clear_metadata(id);
        assert_eq!(db.get_metadata(id, "a"), None);
        assert_eq!(db.get_metadata(id, "b"), None);
    }

    #[test]
    fn delete_is_idempotent_and_excludes_from_search() {
        let mut db = Collection::open(None, 2, IndexType::Flat);
        let id = db.add_vector(vec![1.0, 2.0]).unwrap();
        db.delete_vector_by_index(id).unwrap();
        db.delete_vector_by_index(id).unwrap();
        let results = db.search(&[1.0, 2.0], 5, DistanceMetric::Euclidean).unwrap();
        assert!(results.is_empty());
        assert_eq!(db.stats().deleted_count, 1);
    }

    #[test]
    fn filtered_search_respects_predicate() {
        let mut db = Collection::open(None, 2, IndexType::KdTree);
        db.add_vector_with_metadata(vec![0.0, 1.0], "color", "red").unwrap();
        db.add_vector_with_metadata(vec![0.0, 2.0], "color", "blue").unwrap();
        db.add_vector_with_metadata(vec![0.0, 3.0], "color", "red").unwrap();

        let results = db
            .search_with_filter_expr(&[0.0, 1.1], 3, DistanceMetric::Euclidean, r#"color == "red""#)
            .unwrap();
        assert!(!results.is_empty());
        for r in &results {
            assert_eq!(r.metadata.get("color").map(String::as_str), Some("red"));
        }
    }

    #[test]
    fn scenario_s2_single_vector_metadata() {
        let mut db = Collection::open(None, 2, IndexType::KdTree);
        let id = db.add_vector_with_metadata(vec![1.0, 2.0], "tag", "test").unwrap();
        let results = db.search(&[1.0, 2.0], 1, DistanceMetric::Euclidean).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);
        assert_eq!(results[0].metadata.get("tag").map(String::as_str), Some("test"));
    }
}
