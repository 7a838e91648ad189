//! # Swap Tracker
//!
//! Polls the status of one cross-chain swap until it reaches a terminal state or
//! the retry budget runs out, reporting every transition through callbacks.
//!
//! ## Lifecycle
//!
//! ```text
//! start_tracking()
//!     │
//!     ▼
//!  fetch ──failure──► budget left? ──yes──► sleep(poll_interval) ──► fetch
//!     │                    │no
//!     │                    └──► on_error(Timeout), Err(Timeout)
//!     ▼
//!  on_status_update(status)
//!     ├─ COMPLETED ─────────► on_complete, Ok(status)
//!     ├─ FAILED / REFUNDED ─► on_error, Err(Failed | Refunded)
//!     └─ in progress ───────► budget left? ──yes──► sleep ──► fetch
//!                                  │no
//!                                  └──► on_error(Timeout), Err(Timeout)
//! ```
//!
//! Transport failures (network, non-2xx, undecodable body) are retried because a
//! flaky API must not abort tracking early. Vendor-reported `FAILED`/`REFUNDED` is
//! final and never retried.
//!
//! With `max_retries = N` at most `N + 1` fetches are issued (the initial one plus
//! N retries). The first fetch happens immediately.
//!
//! ## Cancellation
//!
//! [`SwapTracker::stop_polling`] cancels the pending sleep *and* the in-flight
//! fetch. A stopped session resolves with [`TrackerError::Cancelled`] and fires no
//! callbacks, so a straggling response can never reach `on_status_update`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lib_swap::{HttpSwapStatusSource, SwapTracker, TrackerOptions};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = Arc::new(HttpSwapStatusSource::new("https://api.vendor.example", Duration::from_secs(10))?);
//! let options = TrackerOptions::default()
//!     .on_status_update(|status| println!("{} -> {}", status.id, status.client_status));
//!
//! let tracker = SwapTracker::new("0x9f3c", source, options)?;
//! let final_status = tracker.start_tracking().await?;
//! println!("Swap finished: {}", final_status.status);
//! # Ok(())
//! # }
//! ```

use crate::source::SwapStatusSource;
use lib_core::config::{Config, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_MS};
use lib_utils::validation::validate_not_empty;
use parking_lot::Mutex;
use serde::Serialize;
use shared::dto::swap::{SwapState, SwapStatus};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};


/// Progress description reported while polling
pub const PROGRESS_STEP: &str = "Tracking swap status";

pub type StatusCallback = Arc<dyn Fn(&SwapStatus) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&TrackerError) + Send + Sync>;

// region:    --- Error

/// Ways a tracking session can end without a completed swap.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Swap id cannot be empty")]
    InvalidSwapId,

    /// The vendor reported the swap as failed.
    #[error("Swap {swap_id} failed")]
    Failed { swap_id: String },

    /// The vendor reported the swap as refunded.
    #[error("Swap {swap_id} was refunded")]
    Refunded { swap_id: String },

    /// The retry budget ran out before a terminal state was seen.
    #[error("Swap tracking timed out for {swap_id} after {attempts} attempts")]
    Timeout { swap_id: String, attempts: u32 },

    /// Tracking was stopped by the caller or superseded by a newer session.
    #[error("Swap tracking cancelled for {swap_id}")]
    Cancelled { swap_id: String },
}

impl TrackerError {
    /// True when tracking gave up, as opposed to the vendor reporting a failure.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrackerError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TrackerError::Cancelled { .. })
    }
}

// endregion: --- Error

// region:    --- Options

/// Polling parameters and lifecycle callbacks.
#[derive(Clone)]
pub struct TrackerOptions {
    pub poll_interval: Duration,
    pub max_retries: u32,
    pub on_status_update: Option<StatusCallback>,
    pub on_complete: Option<StatusCallback>,
    pub on_error: Option<ErrorCallback>,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            on_status_update: None,
            on_complete: None,
            on_error: None,
        }
    }
}

impl TrackerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self::default()
            .poll_interval(config.poll_interval)
            .max_retries(config.max_retries)
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn on_status_update(mut self, f: impl Fn(&SwapStatus) + Send + Sync + 'static) -> Self {
        self.on_status_update = Some(Arc::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl Fn(&SwapStatus) + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&TrackerError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for TrackerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerOptions")
            .field("poll_interval", &self.poll_interval)
            .field("max_retries", &self.max_retries)
            .field("on_status_update", &self.on_status_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

// endregion: --- Options

/// Best-effort progress readout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingProgress {
    pub completed: u32,
    pub total: u32,
    pub current_step: &'static str,
}

// region:    --- Tracker

#[derive(Default)]
struct Session {
    retry_count: u32,
    is_polling: bool,
}

enum Budget {
    Retry,
    Exhausted { attempts: u32 },
    Superseded,
}

struct Inner {
    swap_id: String,
    options: TrackerOptions,
    source: Arc<dyn SwapStatusSource>,
    session: Mutex<Session>,
    /// Bumped on every start, stop and terminal outcome. A polling loop only
    /// keeps running while the value still equals the one it started with.
    generation: watch::Sender<u64>,
}

/// Polls one swap's status. Clones share the same session, so one task can
/// run [`start_tracking`](Self::start_tracking) while another calls
/// [`stop_polling`](Self::stop_polling).
#[derive(Clone)]
pub struct SwapTracker {
    inner: Arc<Inner>,
}

impl SwapTracker {
    pub fn new(
        swap_id: impl Into<String>,
        source: Arc<dyn SwapStatusSource>,
        options: TrackerOptions,
    ) -> Result<Self, TrackerError> {
        let swap_id = swap_id.into();
        validate_not_empty(&swap_id, "swap id").map_err(|_| TrackerError::InvalidSwapId)?;

        let (generation, _) = watch::channel(0);

        Ok(Self {
            inner: Arc::new(Inner {
                swap_id,
                options,
                source,
                session: Mutex::new(Session::default()),
                generation,
            }),
        })
    }

    pub fn swap_id(&self) -> &str {
        &self.inner.swap_id
    }

    pub fn is_polling(&self) -> bool {
        self.inner.session.lock().is_polling
    }

    pub fn get_progress(&self) -> TrackingProgress {
        let session = self.inner.session.lock();
        TrackingProgress {
            completed: session.retry_count,
            total: self.inner.options.max_retries,
            current_step: PROGRESS_STEP,
        }
    }

    /// Poll until the swap is terminal, the budget is spent, or tracking is stopped.
    ///
    /// Starting again while a session is running cancels the older session.
    pub async fn start_tracking(&self) -> Result<SwapStatus, TrackerError> {
        let generation = self.begin_session();
        let mut cancel_rx = self.inner.generation.subscribe();
        let swap_id = self.inner.swap_id.as_str();
        let options = &self.inner.options;

        info!(
            swap_id = %swap_id,
            poll_interval_ms = options.poll_interval.as_millis(),
            max_retries = options.max_retries,
            "[TRACKER] Tracking started"
        );

        loop {
            let fetched = tokio::select! {
                biased;
                _ = superseded(&mut cancel_rx, generation) => return Err(self.cancelled()),
                result = self.inner.source.fetch_status(swap_id) => result,
            };

            match fetched {
                Err(e) => {
                    warn!(swap_id = %swap_id, error = %e, "[TRACKER] Status fetch failed, will retry");
                }
                Ok(status) => {
                    if !self.is_current(generation) {
                        return Err(self.cancelled());
                    }

                    debug!(
                        swap_id = %swap_id,
                        status = %status.status,
                        client_status = %status.client_status,
                        "[TRACKER] Status update"
                    );
                    if let Some(on_status_update) = &options.on_status_update {
                        on_status_update(&status);
                    }

                    match status.status {
                        SwapState::Completed => return self.complete(generation, status),
                        SwapState::Failed => {
                            return self.fail(generation, TrackerError::Failed { swap_id: swap_id.to_string() });
                        }
                        SwapState::Refunded => {
                            return self.fail(generation, TrackerError::Refunded { swap_id: swap_id.to_string() });
                        }
                        SwapState::InProgress => {}
                    }
                }
            }

            match self.consume_retry(generation) {
                Budget::Retry => {}
                Budget::Exhausted { attempts } => {
                    return self.fail(
                        generation,
                        TrackerError::Timeout { swap_id: swap_id.to_string(), attempts },
                    );
                }
                Budget::Superseded => return Err(self.cancelled()),
            }

            tokio::select! {
                biased;
                _ = superseded(&mut cancel_rx, generation) => return Err(self.cancelled()),
                _ = tokio::time::sleep(options.poll_interval) => {}
            }
        }
    }

    /// Stop polling. Idempotent; safe to call when nothing is running.
    pub fn stop_polling(&self) {
        let mut session = self.inner.session.lock();
        if session.is_polling {
            debug!(swap_id = %self.inner.swap_id, "[TRACKER] Polling stopped");
        }
        session.is_polling = false;
        self.inner.generation.send_modify(|g| *g += 1);
    }

    fn begin_session(&self) -> u64 {
        let mut session = self.inner.session.lock();
        let mut generation = 0;
        self.inner.generation.send_modify(|g| {
            *g += 1;
            generation = *g;
        });
        session.retry_count = 0;
        session.is_polling = true;
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        *self.inner.generation.borrow() == generation
    }

    /// Spend one retry, or report that the budget is gone.
    ///
    /// The check happens before the increment, which is what allows
    /// `max_retries` retries after the initial attempt.
    fn consume_retry(&self, generation: u64) -> Budget {
        let mut session = self.inner.session.lock();
        if !self.is_current(generation) {
            return Budget::Superseded;
        }
        if session.retry_count >= self.inner.options.max_retries {
            return Budget::Exhausted { attempts: session.retry_count + 1 };
        }
        session.retry_count += 1;
        Budget::Retry
    }

    /// End the session if it is still the current one.
    fn finish(&self, generation: u64) -> bool {
        let mut session = self.inner.session.lock();
        if !self.is_current(generation) {
            return false;
        }
        session.is_polling = false;
        self.inner.generation.send_modify(|g| *g += 1);
        true
    }

    fn complete(&self, generation: u64, status: SwapStatus) -> Result<SwapStatus, TrackerError> {
        if !self.finish(generation) {
            return Err(self.cancelled());
        }

        info!(
            swap_id = %self.inner.swap_id,
            route = %status.route_label(),
            to_amount = %status.to_amount,
            "[TRACKER] Swap completed"
        );
        if let Some(on_complete) = &self.inner.options.on_complete {
            on_complete(&status);
        }
        Ok(status)
    }

    fn fail(&self, generation: u64, err: TrackerError) -> Result<SwapStatus, TrackerError> {
        if !self.finish(generation) {
            return Err(self.cancelled());
        }

        warn!(swap_id = %self.inner.swap_id, error = %err, "[TRACKER] Tracking ended with error");
        if let Some(on_error) = &self.inner.options.on_error {
            on_error(&err);
        }
        Err(err)
    }

    fn cancelled(&self) -> TrackerError {
        debug!(swap_id = %self.inner.swap_id, "[TRACKER] Session cancelled");
        TrackerError::Cancelled { swap_id: self.inner.swap_id.clone() }
    }
}

impl fmt::Debug for SwapTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapTracker")
            .field("swap_id", &self.inner.swap_id)
            .field("is_polling", &self.is_polling())
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Resolves once the tracker's generation moves past `generation`.
async fn superseded(rx: &mut watch::Receiver<u64>, generation: u64) {
    // The sender lives inside the tracker, so a closed channel cannot be observed here
    let _ = rx.wait_for(|current| *current != generation).await;
}

// endregion: --- Tracker
