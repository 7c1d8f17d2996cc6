//! Per-user FIFO queue with at-most-one-in-flight analysis and
//! last-write-wins coalescing (spec.md §5, §8 property re: ordering).
//!
//! Arbitrary-many `request` calls while a run is in flight collapse
//! into exactly one trailing re-run after the current run completes,
//! rather than one re-run per request — this is what keeps a burst of
//! corrections from queuing up an unbounded backlog of full analyses.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Shared flag a running analysis checks between pipeline stages
/// (spec.md §5 "Cancellation semantics").
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct UserState {
    in_flight: bool,
    pending: bool,
    cancellation: CancellationFlag,
}

/// Coalescing per-user scheduler for full analysis runs.
#[derive(Default)]
pub struct PerUserAnalysisQueue {
    users: Mutex<HashMap<Uuid, Arc<Mutex<UserState>>>>,
}

impl PerUserAnalysisQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state_for(&self, user_id: Uuid) -> Arc<Mutex<UserState>> {
        Arc::clone(
            self.users
                .lock()
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(UserState::default()))),
        )
    }

    /// Request an analysis run for `user_id`. If one is already in
    /// flight, this request coalesces into the single trailing re-run;
    /// `run` is called at most once concurrently per user, but possibly
    /// more than once in succession.
    ///
    /// `run` is invoked with the user's [`CancellationFlag`], live for
    /// the duration of that specific run. A new run gets a fresh flag.
    pub async fn request<F, Fut>(&self, user_id: Uuid, mut run: F)
    where
        F: FnMut(CancellationFlag) -> Fut,
        Fut: Future<Output = ()>,
    {
        let state = self.state_for(user_id);

        {
            let mut guard = state.lock();
            if guard.in_flight {
                guard.pending = true;
                debug!(%user_id, "analysis already in flight, coalescing into trailing run");
                return;
            }
            guard.in_flight = true;
            guard.pending = false;
            guard.cancellation = CancellationFlag::new();
        }

        loop {
            let cancellation = state.lock().cancellation.clone();
            run(cancellation).await;

            let mut guard = state.lock();
            if guard.pending {
                guard.pending = false;
                guard.cancellation = CancellationFlag::new();
                drop(guard);
                continue;
            }
            guard.in_flight = false;
            break;
        }
    }

    /// Cancel any in-flight analysis for `user_id`. Has no effect if
    /// none is running.
    pub fn cancel(&self, user_id: Uuid) {
        if let Some(state) = self.users.lock().get(&user_id) {
            state.lock().cancellation.cancel();
        }
    }
}
