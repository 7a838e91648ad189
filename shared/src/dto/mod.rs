//! # Data Transfer Objects (DTOs)
//!
//! ## Module Organization
//!
//! - [`swap`] - Swap status snapshots, canonical states, vendor payload
//! - [`chain`] - Chain families (EVM, Solana, Sui)
//! - [`common`] - Error response body
//!
//! ## Example JSON Communication
//!
//! ```text
//! GET /api/swap/status/abc
//!
//! HTTP/1.1 200 OK
//! Content-Type: application/json
//!
//! {
//!   "id": "abc",
//!   "status": "IN_PROGRESS",
//!   "clientStatus": "PENDING",
//!   "trader": "0x5aAe...",
//!   "sourceChain": "ETH",
//!   "destChain": "ARBITRUM",
//!   "fromTokenSymbol": "ETH",
//!   "toTokenSymbol": "USDC",
//!   "fromAmount": "1.5",
//!   "toAmount": "4521.33",
//!   "steps": [],
//!   "txs": []
//! }
//! ```

pub mod chain;
pub mod common;
pub mod swap;

pub use chain::*;
pub use common::*;
pub use swap::*;
