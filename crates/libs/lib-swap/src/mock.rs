//! Scripted status sources for tracker and session tests.

use crate::source::{FetchError, SwapStatusSource};
use async_trait::async_trait;
use parking_lot::Mutex;
use shared::dto::swap::{SwapState, SwapStatus};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Build a snapshot with the given vendor status.
pub fn snapshot(swap_id: &str, client_status: &str) -> SwapStatus {
    SwapStatus {
        id: swap_id.to_string(),
        status: SwapState::from_client_status(client_status),
        client_status: client_status.to_string(),
        trader: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".to_string(),
        source_chain: "ETH".to_string(),
        dest_chain: "ARBITRUM".to_string(),
        from_token_symbol: "ETH".to_string(),
        to_token_symbol: "USDC".to_string(),
        from_amount: "1".to_string(),
        to_amount: "3012.55".to_string(),
        steps: Vec::new(),
        txs: Vec::new(),
        completed_at: None,
    }
}

/// Scripted response
#[derive(Clone)]
pub enum Step {
    Status(&'static str),
    NetworkError,
}

/// Source that replays a script, repeating the last step once exhausted.
/// Counts calls per swap id.
pub struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    latency: Duration,
    calls: AtomicUsize,
    calls_by_id: Mutex<HashMap<String, usize>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Step>) -> Arc<Self> {
        Self::with_latency(script, Duration::ZERO)
    }

    pub fn with_latency(script: Vec<Step>, latency: Duration) -> Arc<Self> {
        let last = script.last().cloned().unwrap_or(Step::Status("PENDING"));
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(last),
            latency,
            calls: AtomicUsize::new(0),
            calls_by_id: Mutex::new(HashMap::new()),
        })
    }

    /// Source that never reaches a terminal state.
    pub fn pending_forever() -> Arc<Self> {
        Self::new(vec![Step::Status("PENDING")])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, swap_id: &str) -> usize {
        self.calls_by_id.lock().get(swap_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl SwapStatusSource for ScriptedSource {
    async fn fetch_status(&self, swap_id: &str) -> Result<SwapStatus, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.calls_by_id.lock().entry(swap_id.to_string()).or_insert(0) += 1;

        let step = {
            let mut script = self.script.lock();
            match script.pop_front() {
                Some(step) => {
                    *self.last.lock() = step.clone();
                    step
                }
                None => self.last.lock().clone(),
            }
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match step {
            Step::Status(client_status) => Ok(snapshot(swap_id, client_status)),
            Step::NetworkError => Err(FetchError::Network("connection reset".to_string())),
        }
    }
}
