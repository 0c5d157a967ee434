//! Migration manager: online rebuild of a collection into a new index type,
//! running on a dedicated background thread.
//!
//! Grounded on the teacher's `collection::auto_reindex` module: a
//! background rebuild that reports progress and a reason, with cooperative
//! cancellation rather than a hard abort.

use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::index::{Index, IndexType};
use crate::record::VectorRecord;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Why a migration was started. Metadata only — it does not change
/// migration semantics, it is recorded for observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReindexReason {
    Manual,
    Scheduled,
    ParamDivergence { detail: String },
}

/// Migration manager configuration.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Records processed per chunk; cancellation is observed at most once
    /// per chunk.
    pub chunk_size: usize,
    pub reason: Option<ReindexReason>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            reason: None,
        }
    }
}

/// Migration lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl MigrationStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Failed
        )
    }
}

/// A point-in-time snapshot of a migration's progress.
#[derive(Debug, Clone)]
pub struct MigrationInfo {
    pub status: MigrationStatus,
    pub total_vectors: usize,
    pub vectors_migrated: usize,
    pub progress: f64,
    pub elapsed_us: u64,
    pub error_kind: Option<String>,
    pub reason: Option<ReindexReason>,
}

struct Shared {
    info: Mutex<MigrationInfo>,
    cvar: Condvar,
    cancel: AtomicBool,
    result_index: Mutex<Option<Index>>,
}

/// Handle to a single migration. Dropping it requests cancellation and
/// waits for the worker to exit, so resources are always released.
pub struct Migration {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Migration {
    /// Starts a background rebuild of `records` into `new_index_type`,
    /// immediately returning a handle in the `Pending` state.
    #[must_use]
    pub fn start(
        records: Vec<VectorRecord>,
        dimension: usize,
        new_index_type: IndexType,
        metric: DistanceMetric,
        config: Option<MigrationConfig>,
    ) -> Self {
        let config = config.unwrap_or_default();
        let total_vectors = records.iter().filter(|r| !r.tombstone).count();
        let shared = Arc::new(Shared {
            info: Mutex::new(MigrationInfo {
                status: MigrationStatus::Pending,
                total_vectors,
                vectors_migrated: 0,
                progress: 0.0,
                elapsed_us: 0,
                error_kind: None,
                reason: config.reason.clone(),
            }),
            cvar: Condvar::new(),
            cancel: AtomicBool::new(false),
            result_index: Mutex::new(None),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            run_worker(
                worker_shared,
                records,
                dimension,
                new_index_type,
                metric,
                config.chunk_size.max(1),
            );
        });

        tracing::info!(?new_index_type, total_vectors, "migration started");

        Self {
            shared,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// A snapshot of the migration's current progress.
    #[must_use]
    pub fn get_info(&self) -> MigrationInfo {
        self.shared.info.lock().clone()
    }

    /// Blocks until the migration reaches a terminal state. Returns
    /// immediately if it already has.
    pub fn wait(&self) {
        let mut info = self.shared.info.lock();
        while !info.status.is_terminal() {
            self.shared.cvar.wait(&mut info);
        }
    }

    /// Requests termination at the next chunk boundary. A no-op returning
    /// success if the migration has already reached a terminal state.
    ///
    /// If the worker hasn't yet transitioned out of `Pending`, cancellation
    /// is applied directly under the same lock the worker uses for that
    /// transition, so a migration cancelled before its worker thread gets
    /// scheduled never processes a single chunk.
    pub fn cancel(&self) {
        let mut info = self.shared.info.lock();
        if info.status.is_terminal() {
            return;
        }
        self.shared.cancel.store(true, Ordering::Release);
        if info.status == MigrationStatus::Pending {
            info.status = MigrationStatus::Cancelled;
            info.error_kind = Some(Error::Cancelled.code().to_string());
            drop(info);
            self.shared.cvar.notify_all();
        }
    }

    /// Returns the newly built index exactly once, after `wait()` has
    /// observed `Completed`. Every subsequent call returns `None`.
    pub fn take_index(&self) -> Option<Index> {
        self.shared.result_index.lock().take()
    }
}

impl Drop for Migration {
    fn drop(&mut self) {
        self.cancel();
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    shared: Arc<Shared>,
    records: Vec<VectorRecord>,
    dimension: usize,
    new_index_type: IndexType,
    metric: DistanceMetric,
    chunk_size: usize,
) {
    let started = Instant::now();
    {
        let mut info = shared.info.lock();
        if info.status == MigrationStatus::Cancelled {
            info.elapsed_us = started.elapsed().as_micros() as u64;
            return;
        }
        info.status = MigrationStatus::Running;
    }

    let live: Vec<&VectorRecord> = records.iter().filter(|r| !r.tombstone).collect();
    let total = live.len();
    let mut index = Index::new(new_index_type, dimension, metric);

    let mut migrated = 0usize;
    let mut cancelled = false;

    for chunk in live.chunks(chunk_size) {
        if shared.cancel.load(Ordering::Acquire) {
            cancelled = true;
            break;
        }
        for record in chunk {
            index.insert(record.internal_id, &record.data);
        }
        migrated += chunk.len();

        let mut info = shared.info.lock();
        info.vectors_migrated = migrated;
        info.progress = if total == 0 {
            1.0
        } else {
            migrated as f64 / total as f64
        };
    }

    let mut info = shared.info.lock();
    info.elapsed_us = started.elapsed().as_micros() as u64;
    if cancelled {
        info.status = MigrationStatus::Cancelled;
        info.error_kind = Some(Error::Cancelled.code().to_string());
        tracing::info!("migration cancelled");
    } else {
        info.status = MigrationStatus::Completed;
        info.progress = 1.0;
        *shared.result_index.lock() = Some(index);
        tracing::info!(migrated, "migration completed");
    }
    drop(info);
    shared.cvar.notify_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;

    fn records(n: u64, dim: usize) -> Vec<VectorRecord> {
        (0..n)
            .map(|i| VectorRecord::new(i, vec![i as f32; dim], Metadata::new()))
            .collect()
    }

    #[test]
    fn migration_completes_and_ownership_transfers_once() {
        let migration = Migration::start(
            records(100, 4),
            4,
            IndexType::Flat,
            DistanceMetric::Euclidean,
            None,
        );
        migration.wait();
        let info = migration.get_info();
        assert_eq!(info.status, MigrationStatus::Completed);
        assert!(info.progress >= 0.99);
        assert_eq!(info.vectors_migrated, 100);

        assert!(migration.take_index().is_some());
        assert!(migration.take_index().is_none());
    }

    #[test]
    fn cancel_after_completion_is_noop() {
        let migration = Migration::start(
            records(5, 2),
            2,
            IndexType::Flat,
            DistanceMetric::Euclidean,
            None,
        );
        migration.wait();
        migration.cancel();
        assert_eq!(migration.get_info().status, MigrationStatus::Completed);
    }

    #[test]
    fn cancel_before_completion_reaches_cancelled() {
        let migration = Migration::start(
            records(50_000, 8),
            8,
            IndexType::Flat,
            DistanceMetric::Euclidean,
            Some(MigrationConfig {
                chunk_size: 1,
                reason: Some(ReindexReason::Manual),
            }),
        );
        // `cancel()` races the freshly spawned worker thread for the `info`
        // lock, not against its 50k-chunk loop: the worker can't even reach
        // its first lock attempt without first being scheduled by the OS,
        // so cancelling immediately after `start()` returns always wins.
        migration.cancel();
        migration.wait();
        let info = migration.get_info();
        assert_eq!(info.status, MigrationStatus::Cancelled);
    }
}
