//! The stored unit of data: a vector plus metadata and a soft-delete flag.

use indexmap::IndexMap;

/// Metadata attached to a vector, as an ordered string-to-string map.
///
/// Ordered (via `indexmap`) so that iteration order matches insertion order,
/// which keeps debug output and snapshot tests deterministic.
pub type Metadata = IndexMap<String, String>;

/// A single stored vector record.
///
/// `internal_id` is a dense, index-local identifier assigned at insertion
/// time and never reused for the lifetime of the collection — it is what
/// indexes use internally, as distinct from any externally-facing id a
/// caller supplies.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    /// Dense internal identifier, stable for the record's lifetime.
    pub internal_id: u64,
    /// The embedding itself.
    pub data: Vec<f32>,
    /// Attached metadata, used by the filter engine.
    pub metadata: Metadata,
    /// Soft-delete flag. Tombstoned records are excluded from search results
    /// but retain their slot until a vacuum compacts them away.
    pub tombstone: bool,
}

impl VectorRecord {
    /// Creates a new, non-tombstoned record.
    #[must_use]
    pub fn new(internal_id: u64, data: Vec<f32>, metadata: Metadata) -> Self {
        Self {
            internal_id,
            data,
            metadata,
            tombstone: false,
        }
    }

    /// The record's dimensionality.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Whether this record is live (not tombstoned).
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.tombstone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_live() {
        let r = VectorRecord::new(0, vec![1.0, 2.0], Metadata::new());
        assert!(r.is_live());
        assert_eq!(r.dimension(), 2);
    }
}
