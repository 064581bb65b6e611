//! Read-only access to an Andromeda node.
//!
//! Block data comes from the Tendermint JSON-RPC endpoint; accounts,
//! balances, transactions, validators and CosmWasm metadata come from the
//! REST (LCD) API.

use base64::engine::general_purpose::STANDARD as BASE64STD;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::blockchain::error::{AdapterError, Result};
use crate::blockchain::models::{BlockInfo, ChainInfo, Coin, LatestBlock, RecentTransaction};
use crate::config::NetworkConfig;

/// How far back `recent_transactions` scans.
pub const RECENT_BLOCK_WINDOW: u64 = 20;

/// Node identity reported by the RPC `status` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStatus {
    pub network: String,
    pub latest_height: u64,
}

#[derive(Clone)]
pub struct ChainClient {
    http: Client,
    rpc_url: String,
    rest_url: String,
}

impl ChainClient {
    pub fn new(http: Client, network: &NetworkConfig) -> Self {
        Self {
            http,
            rpc_url: network.rpc_endpoint.trim_end_matches('/').to_string(),
            rest_url: network.rest_endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the client and checks that the RPC endpoint answers.
    pub async fn connect(http: Client, network: &NetworkConfig) -> Result<(Self, NodeStatus)> {
        let client = Self::new(http, network);
        let status = client.status().await?;
        if status.network != network.chain_id {
            warn!(
                "Node reports chain '{}' but '{}' is configured",
                status.network, network.chain_id
            );
        }
        Ok((client, status))
    }

    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Sends a Tendermint JSON-RPC request and returns its `result` member.
    pub async fn rpc_call(&self, method: &str, params: Value) -> Result<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        debug!("RPC {} -> {}", method, self.rpc_url);
        let resp = self.http.post(&self.rpc_url).json(&payload).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdapterError::Connectivity(format!(
                "RPC {} failed: {}",
                method, status
            )));
        }
        let body: Value = resp.json().await?;
        if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
            return Err(AdapterError::Connectivity(format!(
                "RPC {} error: {}",
                method, err
            )));
        }
        body.get("result").cloned().ok_or_else(|| {
            AdapterError::Connectivity(format!("RPC {} returned no result", method))
        })
    }

    /// GETs a REST path and returns the parsed body. 404 maps to `Ok(None)`.
    pub async fn rest_get_optional(&self, path: &str) -> Result<Option<Value>> {
        let url = format!("{}{}", self.rest_url, path);
        debug!("REST GET {}", url);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AdapterError::Connectivity(format!(
                "GET {} failed: {} {}",
                path, status, text
            )));
        }
        Ok(Some(resp.json().await?))
    }

    pub async fn rest_get(&self, path: &str) -> Result<Value> {
        self.rest_get_optional(path)
            .await?
            .ok_or_else(|| AdapterError::Connectivity(format!("GET {} failed: 404 Not Found", path)))
    }

    pub async fn status(&self) -> Result<NodeStatus> {
        let result = self.rpc_call("status", json!({})).await?;
        let network = result["node_info"]["network"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let latest_height = parse_u64(&result["sync_info"]["latest_block_height"]);
        Ok(NodeStatus {
            network,
            latest_height,
        })
    }

    /// Fetches a block; `None` means the latest one.
    pub async fn block(&self, height: Option<u64>) -> Result<BlockInfo> {
        let params = match height {
            Some(h) => json!({ "height": h.to_string() }),
            None => json!({}),
        };
        let result = self.rpc_call("block", params).await?;
        let header = &result["block"]["header"];
        let txs: Vec<String> = result["block"]["data"]["txs"]
            .as_array()
            .map(|txs| {
                txs.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(BlockInfo {
            chain_id: header["chain_id"].as_str().unwrap_or_default().to_string(),
            height: parse_u64(&header["height"]),
            time: header["time"].as_str().unwrap_or_default().to_string(),
            hash: result["block_id"]["hash"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            proposer_address: header["proposer_address"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            num_txs: txs.len(),
            txs,
        })
    }

    pub async fn chain_info(&self) -> Result<ChainInfo> {
        let block = self.block(None).await?;
        Ok(ChainInfo {
            chain_id: block.chain_id,
            latest_block: LatestBlock {
                height: block.height,
                time: block.time,
                hash: block.hash,
            },
        })
    }

    pub async fn transaction(&self, hash: &str) -> Result<Value> {
        let path = format!("/cosmos/tx/v1beta1/txs/{}", hash.trim().to_uppercase());
        match self.rest_get_optional(&path).await? {
            Some(body) => Ok(body.get("tx_response").cloned().unwrap_or(body)),
            None => Err(AdapterError::Connectivity(format!(
                "Transaction {} not found",
                hash
            ))),
        }
    }

    pub async fn account(&self, address: &str) -> Result<Value> {
        let path = format!("/cosmos/auth/v1beta1/accounts/{}", address);
        match self.rest_get_optional(&path).await? {
            Some(body) => Ok(body.get("account").cloned().unwrap_or(Value::Null)),
            // Accounts without any transaction history are unknown to the auth module.
            None => Ok(Value::Null),
        }
    }

    pub async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        let body = self
            .rest_get(&format!("/cosmos/bank/v1beta1/balances/{}", address))
            .await?;
        Ok(serde_json::from_value(
            body.get("balances").cloned().unwrap_or_else(|| json!([])),
        )?)
    }

    pub async fn validators(&self) -> Result<Value> {
        self.rest_get("/cosmos/staking/v1beta1/validators").await
    }

    pub async fn contract_info(&self, address: &str) -> Result<Value> {
        let body = self
            .rest_get(&format!("/cosmwasm/wasm/v1/contract/{}", address))
            .await?;
        let mut info = body.get("contract_info").cloned().unwrap_or(Value::Null);
        if let Value::Object(map) = &mut info {
            map.insert("address".into(), json!(address));
        }
        Ok(info)
    }

    /// Code metadata without the wasm byte code itself.
    pub async fn code_info(&self, code_id: u64) -> Result<Value> {
        let mut body = self
            .rest_get(&format!("/cosmwasm/wasm/v1/code/{}", code_id))
            .await?;
        if let Value::Object(map) = &mut body {
            map.remove("data");
        }
        let mut info = body.get("code_info").cloned().unwrap_or(body);
        if let Value::Object(map) = &mut info {
            map.insert("codeId".into(), json!(code_id));
        }
        Ok(info)
    }

    pub async fn contracts_by_code(&self, code_id: u64) -> Result<Vec<String>> {
        let body = self
            .rest_get(&format!("/cosmwasm/wasm/v1/code/{}/contracts", code_id))
            .await?;
        Ok(serde_json::from_value(
            body.get("contracts").cloned().unwrap_or_else(|| json!([])),
        )?)
    }

    /// Walks back from the newest block, collecting at most `limit`
    /// transactions from at most `RECENT_BLOCK_WINDOW` blocks.
    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<RecentTransaction>> {
        let latest = self.block(None).await?;
        let floor = latest.height.saturating_sub(RECENT_BLOCK_WINDOW).max(1);

        let mut found = Vec::new();
        let mut height = latest.height;
        let mut current = Some(latest);
        while found.len() < limit && height > floor {
            let block = match current.take() {
                Some(block) => block,
                None => match self.block(Some(height)).await {
                    Ok(block) => block,
                    Err(e) => {
                        warn!("Skipping block {}: {}", height, e);
                        height -= 1;
                        continue;
                    }
                },
            };
            for (index, raw) in block.txs.iter().enumerate() {
                found.push(describe_tx(&block, index, raw));
            }
            height -= 1;
        }
        found.truncate(limit);
        Ok(found)
    }
}

fn describe_tx(block: &BlockInfo, index: usize, raw: &str) -> RecentTransaction {
    let bytes = BASE64STD.decode(raw).unwrap_or_default();
    RecentTransaction {
        block_height: block.height,
        block_time: block.time.clone(),
        tx_index: index,
        raw_size: bytes.len(),
        tx_hash: tx_hash(&bytes),
    }
}

/// Transaction hash as Tendermint computes it: upper-case hex SHA-256.
pub fn tx_hash(tx_bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx_bytes))
}

/// Reads a u64 that the node may encode either as a JSON string or a number.
pub fn parse_u64(value: &Value) -> u64 {
    match value {
        Value::String(s) => s.parse().unwrap_or_default(),
        Value::Number(n) => n.as_u64().unwrap_or_default(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_string_and_numeric_heights() {
        assert_eq!(parse_u64(&json!("1234")), 1234);
        assert_eq!(parse_u64(&json!(99)), 99);
        assert_eq!(parse_u64(&Value::Null), 0);
    }

    #[test]
    fn tx_hash_is_uppercase_sha256() {
        // sha256("") is a well known constant
        assert_eq!(
            tx_hash(b""),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
    }
}
