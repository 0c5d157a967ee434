//! Vacuum manager: the background compaction state machine.
//!
//! Grounded on the teacher's `storage::compaction` module (the
//! `fragmentation_ratio()` formula and the "rewrite only active entries,
//! then atomically swap" compaction strategy) and its message-driven
//! background worker pattern (a worker thread, a command channel, and a
//! status cell the foreground reads without taking the worker's lock).

use crate::collection::Collection;
use crate::error::Result;
use crate::index::Index;
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Vacuum state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VacuumState {
    Idle = 0,
    Scanning = 1,
    Compacting = 2,
    Completed = 3,
    Failed = 4,
}

impl VacuumState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Scanning,
            2 => Self::Compacting,
            3 => Self::Completed,
            4 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Vacuum manager configuration.
#[derive(Debug, Clone, Copy)]
pub struct VacuumConfig {
    /// Minimum tombstoned records before a run does any work.
    pub min_deleted_count: usize,
    /// Records processed per compaction pass.
    pub batch_size: usize,
    /// Scheduler hint; 0 = low priority.
    pub priority: u8,
    /// Auto-run interval, in seconds.
    pub interval_sec: u64,
    /// Fragmentation ratio above which a full index rebuild accompanies
    /// compaction rather than an in-place record rewrite.
    pub min_fragmentation_ratio: f64,
}

impl Default for VacuumConfig {
    fn default() -> Self {
        Self {
            min_deleted_count: 100,
            batch_size: 1000,
            priority: 0,
            interval_sec: 600,
            min_fragmentation_ratio: 0.2,
        }
    }
}

/// Cumulative vacuum statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct VacuumStats {
    pub total_runs: u64,
    pub vectors_removed: u64,
    pub bytes_reclaimed: u64,
    pub last_elapsed_us: u64,
}

enum Command {
    Stop,
}

/// Manages compaction for a single collection, in manual or auto mode.
pub struct VacuumManager {
    collection: Arc<Mutex<Collection>>,
    config: VacuumConfig,
    state: Arc<AtomicU8>,
    stats: Arc<Mutex<VacuumStats>>,
    worker: Mutex<Option<(Sender<Command>, JoinHandle<()>)>>,
}

impl VacuumManager {
    #[must_use]
    pub fn new(collection: Arc<Mutex<Collection>>, config: VacuumConfig) -> Self {
        Self {
            collection,
            config,
            state: Arc::new(AtomicU8::new(VacuumState::Idle as u8)),
            stats: Arc::new(Mutex::new(VacuumStats::default())),
            worker: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> VacuumState {
        VacuumState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn stats(&self) -> VacuumStats {
        *self.stats.lock()
    }

    /// Current fragmentation, `deleted / (deleted + live)`, without
    /// triggering a run.
    #[must_use]
    pub fn fragmentation(&self) -> f64 {
        let stats = self.collection.lock().stats();
        fragmentation_ratio(stats.deleted_count, stats.live_count)
    }

    /// Runs one vacuum pass synchronously. Idempotent: if below the
    /// trigger thresholds, this is a cheap no-op that returns to `Idle`.
    pub fn run(&self) -> Result<()> {
        let started = Instant::now();
        self.state.store(VacuumState::Scanning as u8, Ordering::Release);

        let (deleted_count, live_count, dimension, index_type) = {
            let coll = self.collection.lock();
            let stats = coll.stats();
            (stats.deleted_count, stats.live_count, stats.dimension, stats.index_type)
        };

        if deleted_count < self.config.min_deleted_count {
            self.state.store(VacuumState::Idle as u8, Ordering::Release);
            return Ok(());
        }

        let fragmentation = fragmentation_ratio(deleted_count, live_count);
        if fragmentation < self.config.min_fragmentation_ratio {
            self.state.store(VacuumState::Idle as u8, Ordering::Release);
            return Ok(());
        }

        self.state.store(VacuumState::Compacting as u8, Ordering::Release);

        let vector_bytes = dimension * std::mem::size_of::<f32>();
        let result = (|| -> Result<u64> {
            let mut coll = self.collection.lock();
            let live: Vec<_> = coll
                .records()
                .iter()
                .filter(|r| !r.tombstone)
                .cloned()
                .collect();
            let removed = deleted_count as u64;

            let mut reassigned = Vec::with_capacity(live.len());
            for (new_id, mut record) in live.into_iter().enumerate() {
                record.internal_id = new_id as u64;
                reassigned.push(record);
            }

            let mut index = Index::new(index_type, dimension, coll.build_metric());
            for record in &reassigned {
                index.insert(record.internal_id, &record.data);
            }
            coll.apply_compaction(reassigned, index);
            Ok(removed)
        })();

        match result {
            Ok(removed) => {
                let mut stats = self.stats.lock();
                stats.total_runs += 1;
                stats.vectors_removed += removed;
                stats.bytes_reclaimed += removed * vector_bytes as u64;
                stats.last_elapsed_us = started.elapsed().as_micros() as u64;
                self.state.store(VacuumState::Completed as u8, Ordering::Release);
                self.state.store(VacuumState::Idle as u8, Ordering::Release);
                tracing::info!(removed, "vacuum completed");
                Ok(())
            }
            Err(e) => {
                self.state.store(VacuumState::Failed as u8, Ordering::Release);
                tracing::warn!(error = %e, "vacuum failed");
                Err(e)
            }
        }
    }

    /// Spawns a background thread that runs a pass every
    /// `config.interval_sec`. Idempotent: a second call while already
    /// running is a no-op.
    pub fn start_auto(self: &Arc<Self>) {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return;
        }
        let (tx, rx) = bounded::<Command>(1);
        let this = Arc::clone(self);
        let interval = Duration::from_secs(this.config.interval_sec.max(1));
        let handle = thread::spawn(move || loop {
            match rx.recv_timeout(interval) {
                Ok(Command::Stop) => break,
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    let _ = this.run();
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        });
        *worker = Some((tx, handle));
    }

    /// Signals the background task to exit at its next wakeup. Idempotent.
    pub fn stop_auto(&self) {
        if let Some((tx, handle)) = self.worker.lock().take() {
            let _ = tx.send(Command::Stop);
            let _ = handle.join();
        }
    }
}

impl Drop for VacuumManager {
    fn drop(&mut self) {
        self.stop_auto();
    }
}

fn fragmentation_ratio(deleted: usize, live: usize) -> f64 {
    let total = deleted + live;
    if total == 0 {
        return 0.0;
    }
    deleted as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMetric;
    use crate::index::IndexType;

    fn collection_with(n: u64, dim: usize) -> Arc<Mutex<Collection>> {
        let mut coll = Collection::open(None, dim, IndexType::Flat);
        for i in 0..n {
            coll.add_vector(vec![i as f32; dim]).unwrap();
        }
        Arc::new(Mutex::new(coll))
    }

    #[test]
    fn below_threshold_is_noop() {
        let coll = collection_with(10, 2);
        let mgr = VacuumManager::new(coll, VacuumConfig::default());
        mgr.run().unwrap();
        assert_eq!(mgr.state(), VacuumState::Idle);
        assert_eq!(mgr.stats().total_runs, 0);
    }

    #[test]
    fn compaction_removes_tombstones_and_keeps_search_clean() {
        let coll = collection_with(4, 2);
        {
            let mut c = coll.lock();
            c.delete_vector_by_index(1).unwrap();
            c.delete_vector_by_index(3).unwrap();
        }
        let mgr = VacuumManager::new(
            Arc::clone(&coll),
            VacuumConfig {
                min_deleted_count: 1,
                min_fragmentation_ratio: 0.0,
                ..VacuumConfig::default()
            },
        );
        mgr.run().unwrap();
        assert_eq!(mgr.state(), VacuumState::Idle);
        assert_eq!(mgr.stats().total_runs, 1);

        let c = coll.lock();
        assert_eq!(c.stats().deleted_count, 0);
        for id in [1u64, 3u64] {
            let results = c
                .search(&[id as f32, id as f32], 10, DistanceMetric::Euclidean)
                .unwrap();
            assert!(results.iter().all(|r| r.distance > 1e-6));
        }
    }

    #[test]
    fn start_stop_auto_is_idempotent() {
        let coll = collection_with(1, 2);
        let mgr = Arc::new(VacuumManager::new(
            coll,
            VacuumConfig {
                interval_sec: 1,
                ..VacuumConfig::default()
            },
        ));
        mgr.start_auto();
        mgr.start_auto();
        mgr.stop_auto();
        mgr.stop_auto();
    }
}
