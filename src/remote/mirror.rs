use async_trait::async_trait;
use std::sync::Arc;

use crate::model::Submission;
use crate::remote::error::RemoteError;

/// Remote authoritative store for the submission collection.
///
/// The remote sits across the network and may be slow, unavailable, or
/// stale. Callers treat it as advisory: a failed pull keeps the local
/// collection, and a failed push is dropped rather than retried.
#[async_trait]
pub trait RemoteMirror: Send + Sync + 'static {
    /// Fetches the full remote collection, newest first. An empty result
    /// means the remote holds nothing, not that the call failed.
    async fn pull(&self) -> Result<Vec<Submission>, RemoteError>;

    /// Upserts the full collection by id. Records the remote holds that
    /// are absent from `records` stay in place.
    async fn push(&self, records: &[Submission]) -> Result<(), RemoteError>;
}

/// Implementation of RemoteMirror for Arc<T> where T implements RemoteMirror
///
/// This allows sharing one mirror instance between the orchestrator and
/// its background effects.
#[async_trait]
impl<T: RemoteMirror + ?Sized> RemoteMirror for Arc<T> {
    async fn pull(&self) -> Result<Vec<Submission>, RemoteError> {
        (**self).pull().await
    }

    async fn push(&self, records: &[Submission]) -> Result<(), RemoteError> {
        (**self).push(records).await
    }
}
