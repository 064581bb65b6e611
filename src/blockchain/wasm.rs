// src/blockchain/wasm.rs

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD as BASE64STD, URL_SAFE};
use base64::Engine;
use cosmrs::proto::cosmwasm::wasm::v1::{
    QuerySmartContractStateRequest, QuerySmartContractStateResponse,
};
use prost::Message as _;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::blockchain::client::ChainClient;
use crate::blockchain::error::{AdapterError, Result};

const SMART_QUERY_PATH: &str = "/cosmwasm.wasm.v1.Query/SmartContractState";

/// Smart-queries CosmWasm contracts.
#[async_trait]
pub trait WasmQuerier: Send + Sync {
    async fn smart_query(&self, contract: &str, query: &Value) -> Result<Value>;
}

/// Queries through RPC `abci_query`, falling back to the REST smart-query route.
pub struct WasmClient {
    chain: ChainClient,
    http: Client,
}

impl WasmClient {
    pub fn new(chain: ChainClient, http: Client) -> Self {
        Self { chain, http }
    }

    async fn query_via_rpc(&self, contract: &str, query: &Value) -> Result<Value> {
        let request = QuerySmartContractStateRequest {
            address: contract.to_string(),
            query_data: serde_json::to_vec(query)?,
        };
        let result = self
            .chain
            .rpc_call(
                "abci_query",
                json!({
                    "path": SMART_QUERY_PATH,
                    "data": hex::encode(request.encode_to_vec()),
                    "prove": false,
                }),
            )
            .await?;

        let response = &result["response"];
        let code = response["code"].as_u64().unwrap_or(0);
        if code != 0 {
            return Err(AdapterError::RemoteRejection {
                code: code as u32,
                log: response["log"].as_str().unwrap_or_default().to_string(),
            });
        }
        let raw = BASE64STD
            .decode(response["value"].as_str().unwrap_or_default())
            .map_err(|e| AdapterError::Connectivity(format!("invalid abci_query value: {}", e)))?;
        let decoded = QuerySmartContractStateResponse::decode(raw.as_slice())
            .map_err(|e| AdapterError::Connectivity(format!("invalid smart query response: {}", e)))?;
        Ok(serde_json::from_slice(&decoded.data)?)
    }

    async fn query_via_rest(&self, contract: &str, query: &Value) -> Result<Value> {
        let url = smart_query_url(self.chain.rest_url(), contract, query)?;
        debug!("REST smart query {}", url);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AdapterError::Connectivity(format!(
                "Query failed: {} {}",
                status, text
            )));
        }
        let body: Value = resp.json().await?;
        Ok(match body.get("data") {
            Some(data) => data.clone(),
            None => body,
        })
    }
}

#[async_trait]
impl WasmQuerier for WasmClient {
    async fn smart_query(&self, contract: &str, query: &Value) -> Result<Value> {
        match self.query_via_rpc(contract, query).await {
            Ok(value) => Ok(value),
            Err(rpc_err) => {
                warn!("Smart query on {} via RPC failed, trying REST: {}", contract, rpc_err);
                self.query_via_rest(contract, query)
                    .await
                    .map_err(|rest_err| {
                        AdapterError::Connectivity(format!(
                            "Smart query on {} failed via RPC ({}) and REST ({})",
                            contract, rpc_err, rest_err
                        ))
                    })
            }
        }
    }
}

/// `{rest}/cosmwasm/wasm/v1/contract/{addr}/smart/{base64(query)}`.
///
/// Encoded with the URL-safe alphabet so the segment never contains `/`.
pub fn smart_query_url(rest: &str, contract: &str, query: &Value) -> Result<String> {
    let encoded = URL_SAFE.encode(serde_json::to_vec(query)?);
    Ok(format!(
        "{}/cosmwasm/wasm/v1/contract/{}/smart/{}",
        rest.trim_end_matches('/'),
        contract,
        encoded
    ))
}
