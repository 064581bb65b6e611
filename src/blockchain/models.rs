// src/blockchain/models.rs
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A token amount as the Cosmos SDK represents it: integer amount in a denom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: String,
}

impl Coin {
    pub fn new(amount: impl ToString, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }
}

/// Outcome of a signed transaction once the chain has accepted it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxResult {
    pub transaction_hash: String,
    pub code: u32,
    pub height: u64,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub raw_log: String,
    #[serde(default)]
    pub events: Vec<Value>,
    /// Set for instantiations, read from the `instantiate` event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestBlock {
    pub height: u64,
    pub time: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub chain_id: String,
    pub latest_block: LatestBlock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub chain_id: String,
    pub height: u64,
    pub time: String,
    pub hash: String,
    pub proposer_address: String,
    pub num_txs: usize,
    /// Raw transactions, base64 encoded as the node returns them.
    pub txs: Vec<String>,
}

/// One transaction found while scanning recent blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTransaction {
    pub block_height: u64,
    pub block_time: String,
    pub tx_index: usize,
    pub raw_size: usize,
    pub tx_hash: String,
}

/// Response for wallet generation
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalletResponse {
    /// BIP-39 phrase, 24 words
    pub mnemonic: String,
    /// Bech32 `andr1...` address of the first account
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AddressResponse {
    pub address: String,
}
