//! Lifecycle Coordinator: tracks background work spawned outside the
//! request/response cycle so shutdown can wait for it.

use std::{
    any::Any,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use futures_util::FutureExt;
use tokio::{sync::Notify, time::timeout};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    Drained,

    /// The deadline passed with `pending` tasks still running.
    TimedOut { pending: usize },
}

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    idle: Notify,
}

/// Cloneable handle to the set of in-flight background tasks.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

/// Decrements the pending count when the task finishes, unwinds or is
/// cancelled.
struct PendingGuard(Arc<Inner>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.0.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Run `task` on the runtime. A panic inside `task` is logged and
    /// absorbed.
    pub fn dispatch<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.pending.fetch_add(1, Ordering::AcqRel);

        let guard = PendingGuard(Arc::clone(&self.inner));

        tokio::spawn(async move {
            let _guard = guard;

            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(()) => debug!(task = name, "background task finished"),
                Err(panic) => error!(
                    task = name,
                    panic = panic_message(&*panic),
                    "background task panicked"
                ),
            }
        });
    }

    /// Wait until no task is pending or `limit` elapses.
    pub async fn drain(&self, limit: Duration) -> DrainOutcome {
        let idle = async {
            loop {
                let notified = self.inner.idle.notified();

                tokio::pin!(notified);

                notified.as_mut().enable();

                if self.pending() == 0 {
                    return;
                }

                notified.await;
            }
        };

        match timeout(limit, idle).await {
            Ok(()) => DrainOutcome::Drained,
            Err(_elapsed) => DrainOutcome::TimedOut {
                pending: self.pending(),
            },
        }
    }
}

/// Best-effort text of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
