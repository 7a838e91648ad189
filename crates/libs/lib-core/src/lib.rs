//! # Core Library
//!
//! Configuration, error handling, and explicit application state.

pub mod config;
pub mod error;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use store::{AppStore, Modal, Preferences, StoreError, Theme, TokenSelection};
