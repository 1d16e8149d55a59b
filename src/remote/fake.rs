use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::model::Submission;
use crate::remote::error::RemoteError;
use crate::remote::mirror::RemoteMirror;

/// `FakeMirror` is an in-memory implementation of the RemoteMirror trait
/// for testing purposes. Rows are keyed by submission id, matching the
/// remote table's primary key, and pull and push failures can be simulated
/// independently.
#[derive(Clone)]
pub struct FakeMirror {
    rows: Arc<Mutex<HashMap<String, Submission>>>,
    fail_pulls: Arc<Mutex<bool>>,
    fail_pushes: Arc<Mutex<bool>>,
    push_count: Arc<AtomicUsize>,
}

impl FakeMirror {
    /// Create a new empty FakeMirror
    pub fn new() -> Self {
        FakeMirror {
            rows: Arc::new(Mutex::new(HashMap::new())),
            fail_pulls: Arc::new(Mutex::new(false)),
            fail_pushes: Arc::new(Mutex::new(false)),
            push_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Seed the remote with rows as if another device had pushed them
    pub fn fake_seed(&self, records: Vec<Submission>) {
        let mut rows = self.rows.lock().unwrap();
        for record in records {
            rows.insert(record.id.clone(), record);
        }
    }

    /// Returns the remote rows ordered newest first, the pull order
    pub fn fake_rows(&self) -> Vec<Submission> {
        let rows = self.rows.lock().unwrap();
        let mut records: Vec<Submission> = rows.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Simulate a failure for every subsequent pull
    pub fn fake_fail_pulls(&self, fail: bool) {
        *self.fail_pulls.lock().unwrap() = fail;
    }

    /// Simulate a failure for every subsequent push
    pub fn fake_fail_pushes(&self, fail: bool) {
        *self.fail_pushes.lock().unwrap() = fail;
    }

    /// Number of push calls received, including simulated failures
    pub fn fake_push_count(&self) -> usize {
        self.push_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteMirror for FakeMirror {
    async fn pull(&self) -> Result<Vec<Submission>, RemoteError> {
        if *self.fail_pulls.lock().unwrap() {
            return Err(RemoteError::ConnectionError(
                "Simulated pull failure".to_string(),
            ));
        }

        Ok(self.fake_rows())
    }

    async fn push(&self, records: &[Submission]) -> Result<(), RemoteError> {
        self.push_count.fetch_add(1, Ordering::SeqCst);

        if *self.fail_pushes.lock().unwrap() {
            return Err(RemoteError::ConnectionError(
                "Simulated push failure".to_string(),
            ));
        }

        let mut rows = self.rows.lock().unwrap();
        for record in records {
            rows.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }
}

impl Default for FakeMirror {
    fn default() -> Self {
        Self::new()
    }
}
