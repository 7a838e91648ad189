//! # Wallet Adapters
//!
//! Chain-family wallet capabilities behind one interface. Concrete wallet SDKs
//! (browser extensions, hardware wallets) plug in by implementing [`ChainWallet`];
//! the swap flow only needs an address, a signer and, on EVM, network switching.
//!
//! Address formats:
//! - EVM: `0x` followed by 40 hex digits
//! - Sui: `0x` followed by 64 hex digits
//! - Solana: base58 encoding of a 32-byte public key

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::ChainFamily;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid {family} address: {address}")]
    InvalidAddress { family: ChainFamily, address: String },

    #[error("No {0} wallet connected")]
    NotConnected(ChainFamily),

    #[error("{family} wallet does not support {operation}")]
    Unsupported { family: ChainFamily, operation: &'static str },

    #[error("Signing error: {0}")]
    Signing(String),
}

/// Check that `address` is well-formed for `family`.
pub fn validate_address(family: ChainFamily, address: &str) -> Result<(), WalletError> {
    let valid = match family {
        ChainFamily::Evm => is_prefixed_hex(address, 20),
        ChainFamily::Sui => is_prefixed_hex(address, 32),
        ChainFamily::Solana => bs58::decode(address)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false),
    };

    if valid {
        Ok(())
    } else {
        Err(WalletError::InvalidAddress {
            family,
            address: address.to_string(),
        })
    }
}

fn is_prefixed_hex(address: &str, byte_len: usize) -> bool {
    match address.strip_prefix("0x") {
        Some(digits) if digits.len() == byte_len * 2 => hex::decode(digits).is_ok(),
        _ => false,
    }
}

// region:    --- Capabilities

/// Signs on behalf of one address.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn address(&self) -> &str;

    async fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, WalletError>;
}

/// A connected wallet for one chain family.
#[async_trait]
pub trait ChainWallet: Send + Sync {
    fn family(&self) -> ChainFamily;

    async fn get_address(&self) -> Result<String, WalletError>;

    async fn get_signer(&self) -> Result<Arc<dyn TransactionSigner>, WalletError>;

    /// Ask the wallet to move to `chain_id` (EVM chain id, or the family's
    /// network discriminator elsewhere).
    async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError>;
}

// endregion: --- Capabilities

/// Address-only wallet. Useful for tracking swaps initiated elsewhere.
#[derive(Debug)]
pub struct WatchOnlyWallet {
    family: ChainFamily,
    address: String,
    network: RwLock<Option<u64>>,
}

impl WatchOnlyWallet {
    pub fn new(family: ChainFamily, address: impl Into<String>) -> Result<Self, WalletError> {
        let address = address.into();
        validate_address(family, &address)?;
        Ok(Self {
            family,
            address,
            network: RwLock::new(None),
        })
    }

    /// Last network requested through [`ChainWallet::switch_network`].
    pub fn network(&self) -> Option<u64> {
        *self.network.read()
    }
}

#[async_trait]
impl ChainWallet for WatchOnlyWallet {
    fn family(&self) -> ChainFamily {
        self.family
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        Ok(self.address.clone())
    }

    async fn get_signer(&self) -> Result<Arc<dyn TransactionSigner>, WalletError> {
        Err(WalletError::Unsupported {
            family: self.family,
            operation: "signing",
        })
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError> {
        debug!(family = %self.family, chain_id, "[WALLET] Network switch");
        *self.network.write() = Some(chain_id);
        Ok(())
    }
}

/// At most one connected wallet per chain family.
#[derive(Default)]
pub struct WalletRegistry {
    wallets: RwLock<HashMap<ChainFamily, Arc<dyn ChainWallet>>>,
}

impl WalletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `wallet`, replacing any wallet of the same family. Returns the
    /// replaced wallet.
    pub async fn connect(&self, wallet: Arc<dyn ChainWallet>) -> Result<Option<Arc<dyn ChainWallet>>, WalletError> {
        let family = wallet.family();
        let address = wallet.get_address().await?;
        validate_address(family, &address)?;

        info!(family = %family, address = %shared::utils::truncate_address(&address), "[WALLET] Connected");
        Ok(self.wallets.write().insert(family, wallet))
    }

    pub fn disconnect(&self, family: ChainFamily) -> Option<Arc<dyn ChainWallet>> {
        let removed = self.wallets.write().remove(&family);
        if removed.is_some() {
            info!(family = %family, "[WALLET] Disconnected");
        }
        removed
    }

    pub fn get(&self, family: ChainFamily) -> Result<Arc<dyn ChainWallet>, WalletError> {
        self.wallets
            .read()
            .get(&family)
            .cloned()
            .ok_or(WalletError::NotConnected(family))
    }

    pub async fn address_for(&self, family: ChainFamily) -> Result<String, WalletError> {
        let wallet = self.get(family)?;
        wallet.get_address().await
    }

    /// Connected families in `ChainFamily::all()` order.
    pub fn connected_families(&self) -> Vec<ChainFamily> {
        let wallets = self.wallets.read();
        ChainFamily::all()
            .iter()
            .copied()
            .filter(|f| wallets.contains_key(f))
            .collect()
    }
}
