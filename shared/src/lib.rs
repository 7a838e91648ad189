//! # Shared Data Transfer Objects Library
//!
//! This library defines the wire contract between the swap vendor, the backend API
//! and any client that consumes tracking state. All DTOs use JSON serialization via `serde`.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects
//!   - **[`dto::swap`]**: Swap status snapshots and the vendor payload they come from
//!   - **[`dto::chain`]**: Chain families supported by the wallet layer
//!   - **[`dto::common`]**: Error bodies shared by every HTTP route
//! - **[`utils`]**: Shared utility functions
//!   - **[`utils::format_address`]**: Format wallet addresses for display
//!   - **[`utils::truncate_address`]**: Truncate addresses with ellipsis
//!
//! ## Wire Format
//!
//! Swap DTOs mirror the vendor's JSON and use **camelCase** field names.
//! Canonical swap states serialize as `IN_PROGRESS`, `COMPLETED`, `FAILED`, `REFUNDED`.
//!
//! ## Usage
//!
//! ```rust
//! use shared::dto::swap::{SwapState, SwapStatus, SwapTrxResponse};
//!
//! let raw = r#"{"id":"abc","clientStatus":"COMPLETED","trader":"0x1",
//!     "sourceChain":"ETH","destChain":"ARB","fromTokenSymbol":"ETH",
//!     "toTokenSymbol":"USDC","fromAmount":"1","toAmount":"3000"}"#;
//! let vendor: SwapTrxResponse = serde_json::from_str(raw).unwrap();
//! let status = SwapStatus::from(vendor);
//! assert_eq!(status.status, SwapState::Completed);
//! ```

pub mod dto;
pub mod utils;

// Re-export commonly used types for convenience
pub use dto::*;
pub use utils::*;
