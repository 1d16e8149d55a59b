use std::fmt::Display;
use std::future::Future;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Runs the best-effort side effects of a mutation (cache saves, remote
/// pushes, the startup pull) off the caller's path.
///
/// Effects never report back to the caller: a failed effect is logged at
/// warn level and dropped. `settle` lets tests and orderly shutdown wait
/// for everything in flight to finish.
#[derive(Clone)]
pub struct EffectRunner {
    handle: Handle,
    inflight: watch::Sender<usize>,
}

impl EffectRunner {
    /// Create a runner bound to the current Tokio runtime. Must be called
    /// from within a runtime.
    pub fn new() -> Self {
        let (inflight, _) = watch::channel(0);
        EffectRunner {
            handle: Handle::current(),
            inflight,
        }
    }

    /// Spawns an async effect; its error, if any, is logged and dropped
    pub fn spawn<F, E>(&self, label: &'static str, effect: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display,
    {
        let guard = self.guard();
        self.handle.spawn(async move {
            let _guard = guard;
            match effect.await {
                Ok(()) => debug!("Effect '{label}' completed"),
                Err(e) => warn!("Effect '{label}' failed: {e}"),
            }
        });
    }

    /// Spawns a synchronous effect on the blocking pool
    pub fn spawn_blocking<F, E>(&self, label: &'static str, effect: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Display,
    {
        let guard = self.guard();
        self.handle.spawn_blocking(move || {
            let _guard = guard;
            match effect() {
                Ok(()) => debug!("Effect '{label}' completed"),
                Err(e) => warn!("Effect '{label}' failed: {e}"),
            }
        });
    }

    /// Waits until no effect is in flight. Returns immediately on an idle
    /// runner; never cancels anything.
    pub async fn settle(&self) {
        let mut rx = self.inflight.subscribe();
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    fn guard(&self) -> EffectGuard {
        self.inflight.send_modify(|count| *count += 1);
        EffectGuard {
            inflight: self.inflight.clone(),
        }
    }
}

/// Decrements the in-flight count when an effect finishes, panics included
struct EffectGuard {
    inflight: watch::Sender<usize>,
}

impl Drop for EffectGuard {
    fn drop(&mut self) {
        self.inflight.send_modify(|count| *count -= 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn settle_waits_for_async_effects() {
        let runner = EffectRunner::new();
        let done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&done);
        runner.spawn("slow effect", async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<(), Infallible>(())
        });

        runner.settle().await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn settle_waits_for_blocking_effects() {
        let runner = EffectRunner::new();
        let done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&done);
        runner.spawn_blocking("slow blocking effect", move || {
            std::thread::sleep(Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
            Ok::<(), Infallible>(())
        });

        runner.settle().await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn settle_returns_immediately_when_idle() {
        let runner = EffectRunner::new();
        runner.settle().await;
    }

    #[tokio::test]
    async fn failed_effects_are_absorbed() {
        let runner = EffectRunner::new();

        runner.spawn("failing effect", async { Err(anyhow::anyhow!("boom")) });
        runner.spawn_blocking("failing blocking effect", || {
            Err(anyhow::anyhow!("boom"))
        });

        // Settling proves the failures were absorbed without wedging the
        // in-flight count
        runner.settle().await;
    }

    #[tokio::test]
    async fn effects_overlap_rather_than_queue() {
        let runner = EffectRunner::new();
        let started = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&started);
        runner.spawn("first", async move {
            flag.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<(), Infallible>(())
        });
        runner.spawn("second", async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<(), Infallible>(())
        });

        runner.settle().await;
        assert!(started.load(Ordering::SeqCst));
    }
}
