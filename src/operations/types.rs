//! Operation result types, serialized verbatim as HTTP response bodies.

use serde::{Deserialize, Serialize};

/// A freshly generated receive address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAddress {
    pub address: String,
    /// Address type the node was asked for (bech32, legacy, p2sh-segwit, ...).
    pub format: String,
}

/// Wallet balance for one asset, in the node's native unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub balance: f64,
    pub confirmed_balance: f64,
    pub unconfirmed_balance: f64,
    /// Asset label or id the balance was read for.
    pub asset: String,
}

/// Outcome of a send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentTransaction {
    pub confirmation_height: Option<u64>,
    pub id: String,
    pub is_confirmed: bool,
    pub is_outgoing: bool,
    /// Amount moved, in smallest units.
    pub tokens: u64,
}

/// Asset derived from the node's label → id map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub asset_id: String,
    pub name: String,
    pub ticker: String,
    pub precision: u8,
    pub entity: String,
    pub is_reissuable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetList {
    pub assets: Vec<AssetDescriptor>,
}

/// Snapshot of the node's chain state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub best_block_hash: String,
    pub blocks: u64,
    pub chain: String,
    /// Absent on signed-block chains such as Liquid.
    pub difficulty: Option<f64>,
    pub headers: u64,
    pub initial_block_download: bool,
    pub median_time: u64,
    pub progress: f64,
    pub pruned: bool,
    pub size_on_disk: Option<u64>,
    pub verification_progress: f64,
    pub warnings: String,
}
