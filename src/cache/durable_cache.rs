use std::sync::Arc;

use tracing::debug;

use crate::cache::error::CacheError;
use crate::model::Submission;

/// Fixed key the submission collection is stored under. Shared by every
/// replica of the same installation, which is what lets one replica pick
/// up another's writes.
pub const CACHE_KEY: &str = "edubridge_submissions";

/// Durable, best-effort persistence of the full submission collection.
///
/// Implementations store one serialized snapshot per installation. A load
/// that finds nothing usable reports `Ok(None)` and the caller falls back
/// to its seed data. Saves are synchronous; callers that must not block
/// dispatch them to a blocking task.
pub trait DurableCache: Send + Sync + 'static {
    /// Loads the cached collection; `None` when absent or not readable as
    /// a submission array
    fn load(&self) -> Result<Option<Vec<Submission>>, CacheError>;

    /// Persists the full collection, replacing whatever was stored before
    fn save(&self, records: &[Submission]) -> Result<(), CacheError>;
}

impl<T: DurableCache + ?Sized> DurableCache for Arc<T> {
    fn load(&self) -> Result<Option<Vec<Submission>>, CacheError> {
        (**self).load()
    }

    fn save(&self, records: &[Submission]) -> Result<(), CacheError> {
        (**self).save(records)
    }
}

/// Decodes a raw cached payload. Anything that does not parse as a
/// submission array counts as absent, never as an error.
pub(crate) fn decode_payload(raw: &str) -> Option<Vec<Submission>> {
    match serde_json::from_str::<Vec<Submission>>(raw) {
        Ok(records) => Some(records),
        Err(e) => {
            debug!("Discarding unreadable cache payload: {e}");
            None
        }
    }
}
