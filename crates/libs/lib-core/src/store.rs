//! # Application Store
//!
//! Typed application state: wallet selection, token pair, theme, modal flags and
//! the swap currently being tracked. The store is an ordinary value owned by
//! whoever drives the UI and handed to collaborators explicitly; there is no
//! global instance.
//!
//! Only [`Preferences`] outlive a session. They cross the persistence boundary
//! through [`AppStore::load`] at start-up and [`AppStore::save`] at shutdown.
//!
//! ```rust,no_run
//! use lib_core::store::{AppStore, Theme};
//!
//! let path = std::path::Path::new("data/preferences.json");
//! let mut store = AppStore::load(path)?;
//! store.set_theme(Theme::Dark);
//! store.accept_terms();
//! store.save(path)?;
//! # Ok::<(), lib_core::store::StoreError>(())
//! ```

use chrono::{DateTime, Utc};
use lib_utils::time::now_utc;
use serde::{Deserialize, Serialize};
use shared::ChainFamily;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// UI colour theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Modal dialogs that can be open on top of the main view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    WalletConnect,
    TokenPicker,
    SwapProgress,
    Terms,
}

/// One side of the token pair being swapped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSelection {
    /// Chain identifier as the swap vendor names it (e.g. "ETH", "ARBITRUM", "SOLANA")
    pub chain: String,
    pub symbol: String,
    /// Token contract / mint address; `None` for the chain's native asset
    pub address: Option<String>,
}

/// Persisted user preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub terms_accepted_at: Option<DateTime<Utc>>,
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Explicit application state container.
#[derive(Debug, Clone, Default)]
pub struct AppStore {
    preferences: Preferences,
    selected_wallet: Option<ChainFamily>,
    from_token: Option<TokenSelection>,
    to_token: Option<TokenSelection>,
    open_modal: Option<Modal>,
    active_swap_id: Option<String>,
}

impl AppStore {
    pub fn new(preferences: Preferences) -> Self {
        Self {
            preferences,
            ..Default::default()
        }
    }

    // region:    --- Persistence

    /// Load persisted preferences from `path`.
    ///
    /// A missing file is a first run and yields defaults; an unreadable or
    /// malformed file is an error so it is never silently overwritten.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!("[STORE] No preferences at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let preferences: Preferences = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        info!("[STORE] Loaded preferences from {:?}", path);
        Ok(Self::new(preferences))
    }

    /// Persist preferences to `path`, creating the parent directory if needed.
    ///
    /// The file is written to a `.tmp` sibling and renamed over `path`, so a
    /// crash mid-write leaves the previous preferences intact.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let io_err = |e: std::io::Error| StoreError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.preferences).map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let tmp = temp_sibling(path);
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        debug!("[STORE] Saved preferences to {:?}", path);
        Ok(())
    }

    // endregion: --- Persistence

    // region:    --- Preferences

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn theme(&self) -> Theme {
        self.preferences.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.preferences.theme = theme;
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.preferences.theme = self.preferences.theme.toggled();
        self.preferences.theme
    }

    /// Record terms acceptance. Re-accepting keeps the original timestamp.
    pub fn accept_terms(&mut self) {
        if self.preferences.terms_accepted_at.is_none() {
            self.preferences.terms_accepted_at = Some(now_utc());
        }
        if self.open_modal == Some(Modal::Terms) {
            self.open_modal = None;
        }
    }

    pub fn has_accepted_terms(&self) -> bool {
        self.preferences.terms_accepted_at.is_some()
    }

    // endregion: --- Preferences

    // region:    --- Session state

    pub fn selected_wallet(&self) -> Option<ChainFamily> {
        self.selected_wallet
    }

    pub fn select_wallet(&mut self, family: Option<ChainFamily>) {
        self.selected_wallet = family;
    }

    pub fn from_token(&self) -> Option<&TokenSelection> {
        self.from_token.as_ref()
    }

    pub fn to_token(&self) -> Option<&TokenSelection> {
        self.to_token.as_ref()
    }

    pub fn set_from_token(&mut self, token: Option<TokenSelection>) {
        self.from_token = token;
    }

    pub fn set_to_token(&mut self, token: Option<TokenSelection>) {
        self.to_token = token;
    }

    /// Swap the source and destination tokens.
    pub fn flip_tokens(&mut self) {
        std::mem::swap(&mut self.from_token, &mut self.to_token);
    }

    pub fn open_modal(&self) -> Option<Modal> {
        self.open_modal
    }

    /// Open a modal. Only one modal is shown at a time; the newest wins.
    pub fn show_modal(&mut self, modal: Modal) {
        self.open_modal = Some(modal);
    }

    pub fn close_modal(&mut self) {
        self.open_modal = None;
    }

    pub fn active_swap_id(&self) -> Option<&str> {
        self.active_swap_id.as_deref()
    }

    pub fn set_active_swap(&mut self, swap_id: Option<String>) {
        self.active_swap_id = swap_id;
    }

    // endregion: --- Session state
}

// region:    --- Error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store file {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Store file {path:?} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}
// endregion: --- Error
