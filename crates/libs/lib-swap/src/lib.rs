//! # Swap Library
//!
//! Cross-chain swap tracking and the chain-facing capabilities around it.
//!
//! - [`source`]: fetches one swap's status from the vendor (`GET {base}/swap/trx/{id}`)
//! - [`tracker`]: [`SwapTracker`], a bounded-retry polling loop with lifecycle callbacks
//! - [`session`]: [`TrackingSession`], a reactive state bridge over a tracker with
//!   exactly-once terminal delivery
//! - [`wallet`]: per-chain-family wallet capability adapters
//! - [`metrics`]: fire-and-forget swap outcome recording

pub mod metrics;
pub mod session;
pub mod source;
pub mod tracker;
pub mod wallet;

#[cfg(test)]
pub(crate) mod mock;

pub use metrics::{MetricsClient, SwapMetric};
pub use session::{TrackingSession, TrackingState};
pub use source::{FetchError, HttpSwapStatusSource, SwapStatusSource};
pub use tracker::{SwapTracker, TrackerError, TrackerOptions, TrackingProgress};
pub use wallet::{validate_address, ChainWallet, TransactionSigner, WalletError, WalletRegistry, WatchOnlyWallet};
