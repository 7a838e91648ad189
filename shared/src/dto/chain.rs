use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain family a wallet connection belongs to.
///
/// Each family has its own signer/address model, so wallet adapters are
/// registered per family rather than per chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Evm,
    Solana,
    Sui,
}

impl ChainFamily {
    pub fn all() -> &'static [ChainFamily] {
        &[ChainFamily::Evm, ChainFamily::Solana, ChainFamily::Sui]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainFamily::Evm => "evm",
            ChainFamily::Solana => "solana",
            ChainFamily::Sui => "sui",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
