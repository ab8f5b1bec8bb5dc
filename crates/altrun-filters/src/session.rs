//! Async driver for one filter-resolution session.
//!
//! The reconciler sits behind a single mutex shared by every producer: the
//! detection task, manual edits, and the default-filter timer. Each producer
//! takes the lock and lets the reconciler decide at that moment whether its
//! signal still applies, so the order in which producers were scheduled
//! never matters, only the order in which they arrive.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use altrun_core::{ActiveFilterSet, DetectedLocation, ManualFilters};
use chrono::NaiveDate;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::reconciler::{FilterReconciler, FilterSignal, ReconcilerState};

pub const DEFAULT_FILTER_DELAY: Duration = Duration::from_secs(5);

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long to wait for a location signal before applying defaults.
    pub default_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_delay: DEFAULT_FILTER_DELAY,
        }
    }
}

struct Shared {
    reconciler: Mutex<FilterReconciler>,
    alive: AtomicBool,
    tx: watch::Sender<Option<ActiveFilterSet>>,
    today: Clock,
}

impl Shared {
    async fn deliver(&self, signal: FilterSignal) -> bool {
        if !self.alive.load(Ordering::Acquire) {
            tracing::debug!("filter session closed, dropping signal");
            return false;
        }
        let mut reconciler = self.reconciler.lock().await;
        // The session may have closed while we waited for the lock.
        if !self.alive.load(Ordering::Acquire) {
            return false;
        }
        match reconciler.apply(signal, (self.today)()) {
            Some(set) => {
                self.tx.send_replace(Some(set));
                true
            }
            None => false,
        }
    }
}

/// One page view's worth of filter resolution.
///
/// Dropping the session (or calling [`close`](Self::close)) cancels the
/// default timer and turns every outstanding [`SessionHandle`] into a no-op.
pub struct FilterSession {
    shared: Arc<Shared>,
    timer: JoinHandle<()>,
}

impl FilterSession {
    /// Starts a session dated by the local clock. Must be called inside a
    /// Tokio runtime.
    #[must_use]
    pub fn start(config: SessionConfig) -> Self {
        Self::start_with_clock(config, Arc::new(|| chrono::Local::now().date_naive()))
    }

    /// Starts a session whose default and auto filters are dated by `today`.
    #[must_use]
    pub fn start_with_clock(config: SessionConfig, today: Clock) -> Self {
        let mut reconciler = FilterReconciler::new();
        reconciler.start();
        let (tx, _) = watch::channel(None);
        let shared = Arc::new(Shared {
            reconciler: Mutex::new(reconciler),
            alive: AtomicBool::new(true),
            tx,
            today,
        });

        let timer_shared = Arc::clone(&shared);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(config.default_delay).await;
            // Let signals that landed on the same tick go first.
            tokio::task::yield_now().await;
            timer_shared.deliver(FilterSignal::DefaultElapsed).await;
        });

        Self { shared, timer }
    }

    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Receives every newly resolved filter set.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveFilterSet>> {
        self.shared.tx.subscribe()
    }

    #[must_use]
    pub fn active(&self) -> Option<ActiveFilterSet> {
        self.shared.tx.borrow().clone()
    }

    pub async fn state(&self) -> ReconcilerState {
        self.shared.reconciler.lock().await.state()
    }

    /// Waits until some source has resolved the filters.
    pub async fn resolved(&self) -> Option<ActiveFilterSet> {
        let mut rx = self.subscribe();
        let set = rx.wait_for(Option::is_some).await.ok()?;
        set.clone()
    }

    /// Runs `detection` in the background and feeds its result in as the
    /// auto-detected signal. An absent result sends nothing.
    pub fn spawn_detection<F>(&self, detection: F) -> JoinHandle<bool>
    where
        F: Future<Output = Option<DetectedLocation>> + Send + 'static,
    {
        let handle = self.handle();
        tokio::spawn(async move {
            match detection.await {
                Some(location) => handle.deliver_auto(location).await,
                None => false,
            }
        })
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for FilterSession {
    fn drop(&mut self) {
        self.shared.alive.store(false, Ordering::Release);
        self.timer.abort();
    }
}

/// Cloneable sender for signals into a [`FilterSession`].
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    /// Offers auto-detected filters. Returns `true` if they became active.
    pub async fn deliver_auto(&self, location: DetectedLocation) -> bool {
        self.shared.deliver(FilterSignal::Auto(location)).await
    }

    /// Applies the visitor's dropdown choices. Returns `false` only when the
    /// session has closed.
    pub async fn deliver_manual(&self, filters: ManualFilters) -> bool {
        self.shared.deliver(FilterSignal::Manual(filters)).await
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
