use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::model::Submission;

/// Result of a single-record transform
#[derive(Debug, Clone)]
pub struct Applied {
    /// Snapshot after the transform; the previous snapshot when no record matched
    pub snapshot: Arc<Vec<Submission>>,
    /// Whether a record was actually replaced
    pub changed: bool,
}

/// In-memory source of truth for the current process.
///
/// Snapshots are immutable `Arc<Vec<_>>` values; every write swaps in a
/// fresh one. Readers keep a consistent view for as long as they hold the
/// Arc and never observe a half-applied change.
pub struct RecordStore {
    current: RwLock<Arc<Vec<Submission>>>,
}

impl RecordStore {
    /// Creates a store holding an empty snapshot
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Creates a store seeded with an initial collection
    pub fn with_records(records: Vec<Submission>) -> Self {
        Self {
            current: RwLock::new(Arc::new(records)),
        }
    }

    /// Returns the current snapshot
    pub fn snapshot(&self) -> Arc<Vec<Submission>> {
        Arc::clone(&self.read_guard())
    }

    /// Replaces the whole collection, returning the new snapshot
    pub fn replace(&self, next: Vec<Submission>) -> Arc<Vec<Submission>> {
        let snapshot = Arc::new(next);
        *self.write_guard() = Arc::clone(&snapshot);
        snapshot
    }

    /// Inserts a record at the front of the collection, ahead of records
    /// with newer `created_at` values if there are any
    pub fn prepend(&self, record: Submission) -> Arc<Vec<Submission>> {
        let mut guard = self.write_guard();
        let mut next = Vec::with_capacity(guard.len() + 1);
        next.push(record);
        next.extend_from_slice(guard.as_slice());
        let snapshot = Arc::new(next);
        *guard = Arc::clone(&snapshot);
        snapshot
    }

    /// Transforms the record with `id` and swaps in the resulting snapshot.
    ///
    /// The write lock is held across read, transform, and swap, so the
    /// transform cannot interleave with a concurrent `replace`. An unknown
    /// id returns the existing snapshot with `changed = false`.
    pub fn apply<F>(&self, id: &str, transform: F) -> Applied
    where
        F: FnOnce(&Submission) -> Submission,
    {
        let mut guard = self.write_guard();
        let position = match guard.iter().position(|s| s.id == id) {
            Some(position) => position,
            None => {
                return Applied {
                    snapshot: Arc::clone(&guard),
                    changed: false,
                }
            }
        };

        let mut next = guard.to_vec();
        next[position] = transform(&guard[position]);
        let snapshot = Arc::new(next);
        *guard = Arc::clone(&snapshot);
        Applied {
            snapshot,
            changed: true,
        }
    }

    // A poisoned lock still holds a whole snapshot (writes only swap the
    // Arc), so recover the guard instead of propagating the panic.
    fn read_guard(&self) -> RwLockReadGuard<'_, Arc<Vec<Submission>>> {
        self.current.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Arc<Vec<Submission>>> {
        self.current.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
