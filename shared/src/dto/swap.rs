//! # Swap Status DTOs
//!
//! Snapshot types for a cross-chain swap as reported by the swap vendor's
//! tracking endpoint (`GET {base}/swap/trx/{swapId}`).
//!
//! The vendor reports a rich, vendor-specific `clientStatus`. Consumers only
//! care about four canonical states, so every snapshot carries both: the mapped
//! [`SwapState`] and the raw string for diagnostics.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Canonical swap state derived from the vendor's `clientStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapState {
    InProgress,
    Completed,
    Failed,
    Refunded,
}

impl SwapState {
    /// Map a vendor `clientStatus` onto the canonical state.
    ///
    /// Only the three terminal strings are recognized; every other value,
    /// including statuses the vendor adds in the future, means the swap is
    /// still in flight.
    pub fn from_client_status(client_status: &str) -> Self {
        match client_status {
            "COMPLETED" => SwapState::Completed,
            "REFUNDED" => SwapState::Refunded,
            "FAILED" => SwapState::Failed,
            _ => SwapState::InProgress,
        }
    }

    /// Terminal states never change again, so polling stops on them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SwapState::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SwapState::InProgress => "IN_PROGRESS",
            SwapState::Completed => "COMPLETED",
            SwapState::Failed => "FAILED",
            SwapState::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw payload returned by the vendor tracking endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapTrxResponse {
    pub id: String,
    pub client_status: String,
    pub trader: String,
    pub source_chain: String,
    pub dest_chain: String,
    pub from_token_symbol: String,
    pub to_token_symbol: String,
    #[serde(deserialize_with = "string_or_number")]
    pub from_amount: String,
    #[serde(deserialize_with = "string_or_number")]
    pub to_amount: String,
    #[serde(default)]
    pub steps: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub txs: Option<Vec<Value>>,
}

/// Snapshot of a swap's progress at one point in time.
///
/// A new snapshot is produced by every poll; snapshots are never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapStatus {
    pub id: String,
    pub status: SwapState,
    pub client_status: String,
    pub trader: String,
    pub source_chain: String,
    pub dest_chain: String,
    pub from_token_symbol: String,
    pub to_token_symbol: String,
    pub from_amount: String,
    pub to_amount: String,
    /// Vendor sub-steps, opaque to the tracker
    #[serde(default)]
    pub steps: Vec<Value>,
    /// On-chain transaction references, in vendor order
    #[serde(default)]
    pub txs: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl SwapStatus {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Short route label for logs, e.g. `ETH(ETH) -> ARBITRUM(USDC)`.
    pub fn route_label(&self) -> String {
        format!(
            "{}({}) -> {}({})",
            self.source_chain, self.from_token_symbol, self.dest_chain, self.to_token_symbol
        )
    }
}

impl From<SwapTrxResponse> for SwapStatus {
    fn from(raw: SwapTrxResponse) -> Self {
        Self {
            status: SwapState::from_client_status(&raw.client_status),
            id: raw.id,
            client_status: raw.client_status,
            trader: raw.trader,
            source_chain: raw.source_chain,
            dest_chain: raw.dest_chain,
            from_token_symbol: raw.from_token_symbol,
            to_token_symbol: raw.to_token_symbol,
            from_amount: raw.from_amount,
            to_amount: raw.to_amount,
            steps: raw.steps.unwrap_or_default(),
            txs: raw.txs.unwrap_or_default(),
            completed_at: raw.completed_at,
        }
    }
}

// region:    --- Amount decoding

/// The vendor is inconsistent about amounts and timestamps: some responses
/// carry JSON strings, others bare numbers. Both are kept as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

// endregion: --- Amount decoding
