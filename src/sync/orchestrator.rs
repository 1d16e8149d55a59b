use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::analysis::AnalysisResult;
use crate::cache::durable_cache::decode_payload;
use crate::cache::{DurableCache, SqliteCache};
use crate::config::{Config, SyncConfig};
use crate::model::{
    new_submission_id, Submission, SubmissionDraft, SubmissionPatch, SubmissionStatus,
};
use crate::remote::{PostgresMirror, RemoteError, RemoteMirror};
use crate::replica::{ReplicaChannel, ReplicaEvent};
use crate::seed::seed_submissions;
use crate::stats::{classroom_stats, ClassroomStats};
use crate::store::{Applied, RecordStore};
use crate::sync::effects::EffectRunner;
use crate::sync::merge::{MergePolicy, MergeStrategy};

/// Tunables for a sync handle. The defaults match the production setup:
/// whole-collection overwrites, and an empty remote leaving local data
/// alone.
pub struct SyncOptions {
    pub merge: MergePolicy,
    /// When true, an empty remote pull replaces local data instead of
    /// being treated as the remote having nothing to offer
    pub empty_remote_overrides: bool,
    /// Records installed when the durable cache has nothing usable
    pub seed: Vec<Submission>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            merge: MergePolicy::default(),
            empty_remote_overrides: false,
            seed: seed_submissions(),
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        SyncOptions {
            merge: config.merge,
            empty_remote_overrides: config.empty_remote_overrides,
            seed: seed_submissions(),
        }
    }
}

/// Local-first coordinator for the submission collection.
///
/// Every mutation lands in the in-memory [`RecordStore`] synchronously and
/// is visible to readers before any durability work happens. The durable
/// cache save and the remote push then run as background effects with a
/// best-effort contract: failures are logged and dropped, never returned
/// to the caller, and the next successful full-snapshot push heals
/// whatever a lost one left behind.
pub struct SubmissionSync<C: DurableCache, R: RemoteMirror> {
    store: Arc<RecordStore>,
    cache: Arc<C>,
    remote: Arc<R>,
    replica: ReplicaChannel,
    inbox: Mutex<Option<broadcast::Receiver<ReplicaEvent>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    effects: EffectRunner,
    merge: Arc<dyn MergeStrategy>,
    empty_remote_overrides: bool,
    seed: Vec<Submission>,
    ingested: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl<C: DurableCache, R: RemoteMirror> SubmissionSync<C, R> {
    /// Creates a handle around the provided backends. The replica inbox
    /// is opened here, so notifications published between construction
    /// and [`SubmissionSync::start`] are not lost.
    pub fn new(cache: C, remote: R, replica: ReplicaChannel, options: SyncOptions) -> Self {
        let inbox = replica.subscribe();
        SubmissionSync {
            store: Arc::new(RecordStore::new()),
            cache: Arc::new(cache),
            remote: Arc::new(remote),
            replica,
            inbox: Mutex::new(Some(inbox)),
            listener: Mutex::new(None),
            effects: EffectRunner::new(),
            merge: options.merge.strategy(),
            empty_remote_overrides: options.empty_remote_overrides,
            seed: options.seed,
            ingested: Arc::new(AtomicUsize::new(0)),
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Hydrates the collection and begins background synchronization.
    ///
    /// The durable cache is read first, off the async workers; when it
    /// holds nothing usable the seed dataset is installed and written
    /// back. A remote pull is then scheduled and the replica listener
    /// started, both finishing in the background.
    pub async fn start(&self) -> Result<()> {
        let cache = Arc::clone(&self.cache);
        let loaded = tokio::task::spawn_blocking(move || cache.load())
            .await
            .context("Durable cache hydration task failed")?;

        match loaded {
            Ok(Some(records)) => {
                info!("Hydrated {} submissions from the durable cache", records.len());
                self.store.replace(records);
            }
            Ok(None) => {
                info!("Durable cache is empty, installing {} seed submissions", self.seed.len());
                let snapshot = self.store.replace(self.seed.clone());
                self.save_snapshot(snapshot);
            }
            Err(e) => {
                warn!("Durable cache load failed, falling back to seed data: {e}");
                let snapshot = self.store.replace(self.seed.clone());
                self.save_snapshot(snapshot);
            }
        }

        self.schedule_pull();

        let mut listener = lock_recover(&self.listener);
        if listener.is_none() {
            match lock_recover(&self.inbox).take() {
                Some(receiver) => *listener = Some(self.spawn_listener(receiver)),
                None => debug!("Replica inbox was already consumed, leaving the listener stopped"),
            }
        }

        Ok(())
    }

    /// Approves a submission. `adjusted_score` replaces the stored score
    /// when given; otherwise the existing score is kept, or zero when the
    /// record was never scored. Unknown ids are a no-op.
    pub fn approve(&self, id: &str, adjusted_score: Option<i32>) -> bool {
        let applied = self.store.apply(id, |existing| {
            let mut next = existing.clone();
            next.status = SubmissionStatus::Approved;
            next.teacher_approved = true;
            next.ai_score = adjusted_score.or(existing.ai_score).or(Some(0));
            next.touch();
            next
        });
        self.propagate("approve", applied)
    }

    /// Rejects a submission, revoking any previous approval. Unknown ids
    /// are a no-op.
    pub fn reject(&self, id: &str) -> bool {
        let applied = self.store.apply(id, |existing| {
            let mut next = existing.clone();
            next.status = SubmissionStatus::Rejected;
            next.teacher_approved = false;
            next.touch();
            next
        });
        self.propagate("reject", applied)
    }

    /// Shallow-merges the patch into the matching record; absent patch
    /// fields leave the record's values untouched. Unknown ids are a
    /// no-op.
    pub fn update(&self, id: &str, patch: &SubmissionPatch) -> bool {
        let applied = self.store.apply(id, |existing| patch.apply(existing));
        self.propagate("update", applied)
    }

    /// Creates a submission from the draft and prepends it to the
    /// collection so it is immediately visible first, ahead of any
    /// stricter timestamp ordering. The score is a placeholder until an
    /// analysis result is applied.
    pub fn create(&self, draft: SubmissionDraft) -> Submission {
        let now = Utc::now();
        let record = Submission {
            id: new_submission_id(),
            student_id: draft.student_id,
            student_name: draft.student_name,
            file_name: draft.file_name,
            file_url: draft.file_url.unwrap_or_else(|| "#".to_string()),
            subject: draft.subject,
            status: SubmissionStatus::Analyzed,
            ai_score: Some(rand::thread_rng().gen_range(60..100)),
            teacher_approved: false,
            weak_topics: Vec::new(),
            recommended_resources: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        info!("Created submission {} for student {}", record.id, record.student_id);

        let snapshot = self.store.prepend(record.clone());
        self.fan_out(snapshot);
        record
    }

    /// Adopts an analysis result: the record moves to `analyzed` and its
    /// score, weak topics, and resources are replaced. Unknown ids are a
    /// no-op.
    pub fn apply_analysis(&self, id: &str, analysis: &AnalysisResult) -> bool {
        let patch = SubmissionPatch {
            status: Some(SubmissionStatus::Analyzed),
            ai_score: Some(analysis.ai_score),
            weak_topics: Some(analysis.weak_topics.clone()),
            recommended_resources: Some(analysis.resources.clone()),
            ..SubmissionPatch::default()
        };
        self.update(id, &patch)
    }

    /// Current collection, newest first except for optimistic prepends
    pub fn submissions(&self) -> Arc<Vec<Submission>> {
        self.store.snapshot()
    }

    /// Submissions belonging to one student, in collection order
    pub fn student_submissions(&self, student_id: &str) -> Vec<Submission> {
        self.store
            .snapshot()
            .iter()
            .filter(|s| s.student_id == student_id)
            .cloned()
            .collect()
    }

    /// Classroom aggregates over the current snapshot
    pub fn stats(&self) -> ClassroomStats {
        classroom_stats(&self.store.snapshot())
    }

    /// Pushes the current collection to the remote mirror and waits for
    /// the result, unlike the best-effort pushes mutations schedule
    pub async fn push_now(&self) -> Result<(), RemoteError> {
        let snapshot = self.store.snapshot();
        self.remote.push(&snapshot).await
    }

    /// Waits for every scheduled cache save and remote push to finish
    pub async fn settle(&self) {
        self.effects.settle().await;
    }

    /// Settles outstanding effects and stops the replica listener
    pub async fn shutdown(&self) {
        self.effects.settle().await;
        let handle = lock_recover(&self.listener).take();
        if let Some(handle) = handle {
            handle.abort();
        }
        info!("Submission sync stopped");
    }

    /// Replica notifications applied to the collection so far
    pub fn ingested_broadcasts(&self) -> usize {
        self.ingested.load(Ordering::SeqCst)
    }

    /// Replica notifications discarded as malformed
    pub fn dropped_broadcasts(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Fans a changed snapshot out to the durable cache, the remote
    /// mirror, and the other replicas. An unchanged snapshot schedules
    /// nothing.
    fn propagate(&self, operation: &'static str, applied: Applied) -> bool {
        if !applied.changed {
            debug!("Operation '{operation}' matched no submission, nothing to do");
            return false;
        }
        debug!(
            "Operation '{operation}' applied, propagating {} submissions",
            applied.snapshot.len()
        );
        self.fan_out(applied.snapshot);
        true
    }

    fn fan_out(&self, snapshot: Arc<Vec<Submission>>) {
        self.replica.publish(&snapshot);
        self.save_snapshot(Arc::clone(&snapshot));
        self.push_snapshot(snapshot);
    }

    fn save_snapshot(&self, snapshot: Arc<Vec<Submission>>) {
        let cache = Arc::clone(&self.cache);
        self.effects
            .spawn_blocking("cache save", move || cache.save(&snapshot));
    }

    fn push_snapshot(&self, snapshot: Arc<Vec<Submission>>) {
        let remote = Arc::clone(&self.remote);
        self.effects
            .spawn("remote push", async move { remote.push(&snapshot).await });
    }

    /// Schedules the startup pull. A non-empty remote collection is merged
    /// in and fanned back out; an empty or failed pull keeps whatever the
    /// collection already holds, since the remote is advisory.
    fn schedule_pull(&self) {
        let store = Arc::clone(&self.store);
        let cache = Arc::clone(&self.cache);
        let remote = Arc::clone(&self.remote);
        let replica = self.replica.clone();
        let merge = Arc::clone(&self.merge);
        let effects = self.effects.clone();
        let empty_remote_overrides = self.empty_remote_overrides;

        self.effects.spawn("startup pull", async move {
            let records = remote.pull().await?;
            if records.is_empty() && !empty_remote_overrides {
                debug!("Remote mirror holds no submissions, keeping local data");
                return Ok(());
            }

            let merged = merge.merge(&store.snapshot(), records);
            info!("Installed {} submissions from the remote mirror", merged.len());
            let snapshot = store.replace(merged);
            replica.publish(&snapshot);
            effects.spawn_blocking("cache save", move || cache.save(&snapshot));
            Ok::<(), RemoteError>(())
        });
    }

    /// Starts the loop applying notifications from sibling replicas.
    /// Self-originated events are skipped, malformed payloads dropped,
    /// and a lagged receiver resumes with whatever the bus still holds.
    fn spawn_listener(&self, mut receiver: broadcast::Receiver<ReplicaEvent>) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let merge = Arc::clone(&self.merge);
        let origin = self.replica.origin();
        let ingested = Arc::clone(&self.ingested);
        let dropped = Arc::clone(&self.dropped);

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if event.origin == origin {
                            continue;
                        }
                        match decode_payload(&event.payload) {
                            Some(records) => {
                                let merged = merge.merge(&store.snapshot(), records);
                                let count = merged.len();
                                store.replace(merged);
                                ingested.fetch_add(1, Ordering::SeqCst);
                                debug!(
                                    "Applied a notification from replica {}, now holding {count} submissions",
                                    event.origin
                                );
                            }
                            None => {
                                dropped.fetch_add(1, Ordering::SeqCst);
                                debug!("Dropped a malformed notification from replica {}", event.origin);
                            }
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Replica listener lagged, {missed} notifications were skipped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl SubmissionSync<SqliteCache, PostgresMirror> {
    /// Builds a handle on the default backends, a SQLite durable cache
    /// and a Postgres remote mirror. An unreachable remote is not an
    /// error here; the handle simply works offline until it recovers.
    pub async fn from_config(config: &Config, replica: ReplicaChannel) -> Result<Self> {
        let cache = SqliteCache::new(&config.cache.db_path)
            .context("Failed to open the durable cache")?;

        let remote = PostgresMirror::new(&config.remote.url, config.remote.max_connections)
            .context("Failed to configure the remote mirror")?;

        if let Err(e) = remote.ensure_schema().await {
            warn!("Remote schema check failed, continuing offline: {e}");
        }

        Ok(SubmissionSync::new(
            cache,
            remote,
            replica,
            SyncOptions::from(&config.sync),
        ))
    }
}

// Poisoning cannot leave these slots in a torn state (they only hold an
// Option), so recover the guard instead of propagating the panic.
fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
