//! # Tracking Session
//!
//! Reactive state bridge over [`SwapTracker`]. A UI (or any other observer) sets
//! the swap id it cares about and watches a [`TrackingState`] snapshot; the
//! session owns the tracker, restarts it when the id changes and stops it when
//! dropped.
//!
//! Terminal delivery is exactly-once per tracker instance: once `on_complete` or
//! `on_error` has reached the observer, later callbacks from that instance are
//! dropped, as is anything a superseded instance still emits.
//!
//! ```rust,no_run
//! use lib_swap::{HttpSwapStatusSource, TrackerOptions, TrackingSession};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(HttpSwapStatusSource::new("https://api.vendor.example", Duration::from_secs(10))?);
//! let session = TrackingSession::new(source, TrackerOptions::default());
//! let mut rx = session.subscribe();
//!
//! session.set_swap_id(Some("0x9f3c".to_string()));
//! while rx.changed().await.is_ok() {
//!     let state = rx.borrow_and_update().clone();
//!     if !state.is_loading {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::metrics::{MetricsClient, SwapMetric};
use crate::source::SwapStatusSource;
use crate::tracker::{SwapTracker, TrackerError, TrackerOptions, TrackingProgress};
use parking_lot::Mutex;
use shared::dto::swap::SwapStatus;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

/// Snapshot of what the observer sees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingState {
    pub swap_id: Option<String>,
    pub status: Option<SwapStatus>,
    pub is_loading: bool,
    pub error: Option<TrackerError>,
}

struct Active {
    tracker: SwapTracker,
    epoch: u64,
}

/// Owns at most one running tracker and publishes its state.
pub struct TrackingSession {
    source: Arc<dyn SwapStatusSource>,
    options: TrackerOptions,
    metrics: Option<MetricsClient>,
    state: Arc<watch::Sender<TrackingState>>,
    epoch: Arc<AtomicU64>,
    active: Mutex<Option<Active>>,
}

impl TrackingSession {
    /// `options` are passed through to every tracker the session builds; their
    /// callbacks are invoked after the session state has been updated.
    pub fn new(source: Arc<dyn SwapStatusSource>, options: TrackerOptions) -> Self {
        let (state, _) = watch::channel(TrackingState::default());
        Self {
            source,
            options,
            metrics: None,
            state: Arc::new(state),
            epoch: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(None),
        }
    }

    /// Record terminal outcomes through `metrics`.
    pub fn with_metrics(mut self, metrics: MetricsClient) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> TrackingState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        self.state.subscribe()
    }

    pub fn progress(&self) -> Option<TrackingProgress> {
        self.active.lock().as_ref().map(|a| a.tracker.get_progress())
    }

    /// Point the session at a swap. A different id restarts tracking, the same
    /// id is a no-op and `None` returns to idle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn set_swap_id(&self, swap_id: Option<String>) {
        let mut active = self.active.lock();
        if self.state.borrow().swap_id == swap_id {
            return;
        }

        match swap_id {
            Some(swap_id) => self.launch(&mut active, swap_id),
            None => {
                self.stop_active(&mut active);
                self.state.send_replace(TrackingState::default());
                debug!("[SESSION] Reset to idle");
            }
        }
    }

    /// Restart tracking for the current swap id. No-op when idle.
    pub fn start_tracking(&self) {
        let mut active = self.active.lock();
        let current = self.state.borrow().swap_id.clone();
        if let Some(swap_id) = current {
            self.launch(&mut active, swap_id);
        }
    }

    pub fn stop_tracking(&self) {
        let mut active = self.active.lock();
        self.stop_active(&mut active);
        self.state.send_modify(|s| s.is_loading = false);
    }

    /// Callers hold the `active` lock for the whole replacement, so a session
    /// never runs two trackers.
    fn launch(&self, active: &mut Option<Active>, swap_id: String) {
        self.stop_active(active);
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let options = bridge_options(
            &self.options,
            BridgeContext {
                swap_id: swap_id.clone(),
                epoch,
                current: Arc::clone(&self.epoch),
                state: Arc::clone(&self.state),
                metrics: self.metrics.clone(),
            },
        );

        let tracker = match SwapTracker::new(swap_id.clone(), Arc::clone(&self.source), options) {
            Ok(tracker) => tracker,
            Err(err) => {
                self.state.send_replace(TrackingState {
                    swap_id: Some(swap_id),
                    status: None,
                    is_loading: false,
                    error: Some(err),
                });
                return;
            }
        };

        self.state.send_replace(TrackingState {
            swap_id: Some(swap_id.clone()),
            status: None,
            is_loading: true,
            error: None,
        });

        info!(swap_id = %swap_id, epoch, "[SESSION] Tracking swap");
        let task_tracker = tracker.clone();
        tokio::spawn(async move {
            // Outcomes reach the state through the bridged callbacks
            let _ = task_tracker.start_tracking().await;
        });

        *active = Some(Active { tracker, epoch });
    }

    fn stop_active(&self, active: &mut Option<Active>) {
        if let Some(active) = active.take() {
            debug!(swap_id = %active.tracker.swap_id(), epoch = active.epoch, "[SESSION] Stopping tracker");
            active.tracker.stop_polling();
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.tracker.stop_polling();
        }
    }
}

impl fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingSession")
            .field("state", &*self.state.borrow())
            .field("epoch", &self.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

// region:    --- Bridge

struct BridgeContext {
    swap_id: String,
    epoch: u64,
    current: Arc<AtomicU64>,
    state: Arc<watch::Sender<TrackingState>>,
    metrics: Option<MetricsClient>,
}

impl BridgeContext {
    fn is_live(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.epoch
    }
}

/// Wrap the observer's callbacks so they update the session state first and
/// only ever fire for the live tracker instance, with a single terminal event.
fn bridge_options(observer: &TrackerOptions, ctx: BridgeContext) -> TrackerOptions {
    let ctx = Arc::new(ctx);
    let settled = Arc::new(AtomicBool::new(false));

    let on_status_update = {
        let ctx = Arc::clone(&ctx);
        let settled = Arc::clone(&settled);
        let observer = observer.on_status_update.clone();
        move |status: &SwapStatus| {
            if !ctx.is_live() || settled.load(Ordering::SeqCst) {
                return;
            }
            ctx.state.send_modify(|s| s.status = Some(status.clone()));
            if let Some(observer) = &observer {
                observer(status);
            }
        }
    };

    let on_complete = {
        let ctx = Arc::clone(&ctx);
        let settled = Arc::clone(&settled);
        let observer = observer.on_complete.clone();
        move |status: &SwapStatus| {
            if !ctx.is_live() || settled.swap(true, Ordering::SeqCst) {
                return;
            }
            ctx.state.send_modify(|s| {
                s.status = Some(status.clone());
                s.is_loading = false;
            });
            if let Some(metrics) = &ctx.metrics {
                metrics.record_swap(SwapMetric::from_outcome(&ctx.swap_id, Ok(status)));
            }
            if let Some(observer) = &observer {
                observer(status);
            }
        }
    };

    let on_error = {
        let ctx = Arc::clone(&ctx);
        let settled = Arc::clone(&settled);
        let observer = observer.on_error.clone();
        move |err: &TrackerError| {
            if !ctx.is_live() || settled.swap(true, Ordering::SeqCst) {
                return;
            }
            ctx.state.send_modify(|s| {
                s.error = Some(err.clone());
                s.is_loading = false;
            });
            if let Some(metrics) = &ctx.metrics {
                metrics.record_swap(SwapMetric::from_outcome(&ctx.swap_id, Err(err)));
            }
            if let Some(observer) = &observer {
                observer(err);
            }
        }
    };

    TrackerOptions::default()
        .poll_interval(observer.poll_interval)
        .max_retries(observer.max_retries)
        .on_status_update(on_status_update)
        .on_complete(on_complete)
        .on_error(on_error)
}

// endregion: --- Bridge
