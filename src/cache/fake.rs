use std::sync::{Arc, Mutex};

use crate::cache::durable_cache::{decode_payload, DurableCache};
use crate::cache::error::CacheError;
use crate::model::Submission;

/// `FakeCache` is an in-memory implementation of the DurableCache trait for
/// testing purposes. It stores the raw serialized payload exactly as a real
/// backend would, so malformed-payload handling can be exercised, and it
/// allows simulating save and load failures.
#[derive(Clone)]
pub struct FakeCache {
    raw: Arc<Mutex<Option<String>>>,
    fail_saves: Arc<Mutex<bool>>,
    fail_loads: Arc<Mutex<bool>>,
}

impl FakeCache {
    /// Create a new empty FakeCache instance
    pub fn new() -> Self {
        FakeCache {
            raw: Arc::new(Mutex::new(None)),
            fail_saves: Arc::new(Mutex::new(false)),
            fail_loads: Arc::new(Mutex::new(false)),
        }
    }

    /// Simulate a failure for every subsequent save
    pub fn fake_fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap() = fail;
    }

    /// Simulate a failure for every subsequent load
    pub fn fake_fail_loads(&self, fail: bool) {
        *self.fail_loads.lock().unwrap() = fail;
    }

    /// Injects a raw payload as if some other writer had stored it
    pub fn fake_put_raw(&self, raw: &str) {
        *self.raw.lock().unwrap() = Some(raw.to_string());
    }

    /// Returns the raw stored payload, if any
    pub fn fake_raw(&self) -> Option<String> {
        self.raw.lock().unwrap().clone()
    }
}

impl DurableCache for FakeCache {
    fn load(&self) -> Result<Option<Vec<Submission>>, CacheError> {
        if *self.fail_loads.lock().unwrap() {
            return Err(CacheError::OperationError(
                "Simulated load failure".to_string(),
            ));
        }

        let raw = self.raw.lock().unwrap();
        Ok(raw.as_deref().and_then(decode_payload))
    }

    fn save(&self, records: &[Submission]) -> Result<(), CacheError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(CacheError::OperationError(
                "Simulated save failure".to_string(),
            ));
        }

        let payload = serde_json::to_string(records)?;
        *self.raw.lock().unwrap() = Some(payload);
        Ok(())
    }
}

impl Default for FakeCache {
    fn default() -> Self {
        Self::new()
    }
}
