// src/blockchain/transactions.rs

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64STD;
use base64::Engine;
use cosmrs::proto::cosmos::{bank::v1beta1::MsgSend, base::v1beta1::Coin as ProtoCoin};
use cosmrs::proto::cosmwasm::wasm::v1::{
    MsgExecuteContract, MsgInstantiateContract, MsgMigrateContract,
};
use cosmrs::tx::{Body, Fee, SignDoc, SignerInfo};
use cosmrs::Any;
use prost::Message as _;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::blockchain::client::parse_u64;
use crate::blockchain::error::{AdapterError, Result};
use crate::blockchain::models::{Coin, TxResult};
use crate::blockchain::wallet::AccountSigner;
use crate::config::{Config, GasLimits};

/// Top-level execute keys that reliably need more than the default gas.
const GAS_HEAVY_KEYS: &[&str] = &["start_sale", "purchase_tokens", "send"];

/// Fee attached to one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSpec {
    pub amount: u128,
    pub denom: String,
    pub gas_limit: u64,
}

impl FeeSpec {
    pub fn new(amount: u128, denom: impl Into<String>, gas_limit: u64) -> Self {
        Self {
            amount,
            denom: denom.into(),
            gas_limit,
        }
    }
}

/// A message to be signed by the caller's account.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractMsg {
    Execute {
        contract: String,
        msg: Value,
        funds: Vec<Coin>,
    },
    Instantiate {
        code_id: u64,
        label: String,
        msg: Value,
        admin: Option<String>,
        funds: Vec<Coin>,
    },
    Migrate {
        contract: String,
        code_id: u64,
        msg: Value,
    },
    Send {
        to: String,
        amount: Vec<Coin>,
    },
}

impl ContractMsg {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ContractMsg::Execute { .. } => "execute",
            ContractMsg::Instantiate { .. } => "instantiate",
            ContractMsg::Migrate { .. } => "migrate",
            ContractMsg::Send { .. } => "send",
        }
    }

    fn to_any(&self, sender: &str) -> Result<Any> {
        let any = match self {
            ContractMsg::Execute {
                contract,
                msg,
                funds,
            } => Any {
                type_url: "/cosmwasm.wasm.v1.MsgExecuteContract".to_string(),
                value: MsgExecuteContract {
                    sender: sender.to_string(),
                    contract: contract.clone(),
                    msg: serde_json::to_vec(msg)?,
                    funds: proto_coins(funds),
                }
                .encode_to_vec(),
            },
            ContractMsg::Instantiate {
                code_id,
                label,
                msg,
                admin,
                funds,
            } => Any {
                type_url: "/cosmwasm.wasm.v1.MsgInstantiateContract".to_string(),
                value: MsgInstantiateContract {
                    sender: sender.to_string(),
                    admin: admin.clone().unwrap_or_default(),
                    code_id: *code_id,
                    label: label.clone(),
                    msg: serde_json::to_vec(msg)?,
                    funds: proto_coins(funds),
                }
                .encode_to_vec(),
            },
            ContractMsg::Migrate {
                contract,
                code_id,
                msg,
            } => Any {
                type_url: "/cosmwasm.wasm.v1.MsgMigrateContract".to_string(),
                value: MsgMigrateContract {
                    sender: sender.to_string(),
                    contract: contract.clone(),
                    code_id: *code_id,
                    msg: serde_json::to_vec(msg)?,
                }
                .encode_to_vec(),
            },
            ContractMsg::Send { to, amount } => Any {
                type_url: "/cosmos.bank.v1beta1.MsgSend".to_string(),
                value: MsgSend {
                    from_address: sender.to_string(),
                    to_address: to.clone(),
                    amount: proto_coins(amount),
                }
                .encode_to_vec(),
            },
        };
        Ok(any)
    }
}

fn proto_coins(coins: &[Coin]) -> Vec<ProtoCoin> {
    coins
        .iter()
        .map(|c| ProtoCoin {
            denom: c.denom.clone(),
            amount: c.amount.clone(),
        })
        .collect()
}

/// Everything needed to build one signed transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TxRequest {
    pub msgs: Vec<ContractMsg>,
    pub fee: FeeSpec,
    pub memo: String,
}

impl TxRequest {
    pub fn single(msg: ContractMsg, fee: FeeSpec) -> Self {
        Self {
            msgs: vec![msg],
            fee,
            memo: String::new(),
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

/// Signs and submits transactions for an account.
#[async_trait]
pub trait TxBroadcaster: Send + Sync {
    async fn submit(&self, signer: &AccountSigner, tx: TxRequest) -> Result<TxResult>;
}

/// Direct-mode signing with account data and broadcast through the REST API.
pub struct RestBroadcaster {
    http: Client,
    rest_url: String,
    chain_id: String,
    poll_interval: Duration,
    confirm_timeout: Duration,
}

impl RestBroadcaster {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            rest_url: config.network.rest_endpoint.trim_end_matches('/').to_string(),
            chain_id: config.network.chain_id.clone(),
            poll_interval: config.tx_poll_interval,
            confirm_timeout: config.tx_confirm_timeout,
        }
    }

    async fn account_numbers(&self, address: &str) -> Result<(u64, u64)> {
        let resp = self
            .http
            .get(format!("{}/cosmos/auth/v1beta1/accounts/{}", self.rest_url, address))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(AdapterError::Connectivity(format!(
                "Account {} not found on chain ({}); fund it before signing",
                address,
                resp.status()
            )));
        }
        let body: Value = resp.json().await?;
        Ok(account_numbers_of(&body["account"]))
    }

    fn sign(
        &self,
        signer: &AccountSigner,
        tx: &TxRequest,
        account_number: u64,
        sequence: u64,
    ) -> Result<Vec<u8>> {
        let msgs = tx
            .msgs
            .iter()
            .map(|m| m.to_any(signer.address()))
            .collect::<Result<Vec<_>>>()?;
        let body = Body::new(msgs, tx.memo.clone(), 0u32);

        let fee_amount = cosmrs::Coin::new(tx.fee.amount, &tx.fee.denom)
            .map_err(|e| AdapterError::Signing(format!("invalid fee coin: {}", e)))?;
        let fee = Fee::from_amount_and_gas(fee_amount, tx.fee.gas_limit);
        let auth_info = SignerInfo::single_direct(Some(signer.public_key()), sequence).auth_info(fee);

        let chain_id: cosmrs::tendermint::chain::Id = self
            .chain_id
            .parse()
            .map_err(|e| AdapterError::Signing(format!("invalid chain id: {}", e)))?;
        let sign_doc = SignDoc::new(&body, &auth_info, &chain_id, account_number)
            .map_err(|e| AdapterError::Signing(format!("signdoc error: {}", e)))?;
        let raw = sign_doc
            .sign(signer.signing_key())
            .map_err(|e| AdapterError::Signing(e.to_string()))?;
        raw.to_bytes()
            .map_err(|e| AdapterError::Signing(format!("encode tx error: {}", e)))
    }

    async fn broadcast(&self, tx_bytes: Vec<u8>) -> Result<String> {
        let payload = json!({
            "tx_bytes": BASE64STD.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC"
        });
        let resp: Value = self
            .http
            .post(format!("{}/cosmos/tx/v1beta1/txs", self.rest_url))
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        let tx_response = match resp.get("tx_response") {
            Some(tx_response) => tx_response,
            None => {
                let message = resp["message"].as_str().unwrap_or("no tx_response returned");
                return Err(AdapterError::Connectivity(format!("broadcast failed: {}", message)));
            }
        };
        let code = tx_response["code"].as_u64().unwrap_or(0);
        if code != 0 {
            return Err(AdapterError::RemoteRejection {
                code: code as u32,
                log: tx_response["raw_log"].as_str().unwrap_or_default().to_string(),
            });
        }
        tx_response["txhash"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AdapterError::Connectivity(format!("missing txhash in response: {}", resp)))
    }

    async fn wait_for_tx(&self, hash: &str) -> Result<TxResult> {
        let deadline = Instant::now() + self.confirm_timeout;
        let url = format!("{}/cosmos/tx/v1beta1/txs/{}", self.rest_url, hash);
        loop {
            sleep(self.poll_interval).await;
            match self.http.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body: Value = resp.json().await?;
                    let result = parse_tx_response(body.get("tx_response").unwrap_or(&body));
                    if result.code != 0 {
                        return Err(AdapterError::RemoteRejection {
                            code: result.code,
                            log: result.raw_log,
                        });
                    }
                    return Ok(result);
                }
                Ok(resp) => debug!("Transaction {} not yet indexed ({})", hash, resp.status()),
                Err(e) => debug!("Polling transaction {} failed: {}", hash, e),
            }
            if Instant::now() >= deadline {
                return Err(AdapterError::Timeout(format!(
                    "Transaction {} was broadcast but not confirmed within {}s",
                    hash,
                    self.confirm_timeout.as_secs()
                )));
            }
        }
    }
}

#[async_trait]
impl TxBroadcaster for RestBroadcaster {
    async fn submit(&self, signer: &AccountSigner, tx: TxRequest) -> Result<TxResult> {
        let (account_number, sequence) = self.account_numbers(signer.address()).await?;
        let kinds: Vec<&str> = tx.msgs.iter().map(ContractMsg::kind).collect();
        info!(
            "Signing {:?} from {} (gas {}, sequence {})",
            kinds,
            signer.address(),
            tx.fee.gas_limit,
            sequence
        );
        let bytes = self.sign(signer, &tx, account_number, sequence)?;
        let hash = self.broadcast(bytes).await?;
        info!("Broadcast transaction {}", hash);
        self.wait_for_tx(&hash).await
    }
}

/// Gas for a generic execute: an explicit limit wins, known heavy messages get
/// the high limit, everything else the default.
pub fn gas_limit_for(msg: &Value, explicit: Option<u64>, limits: &GasLimits) -> u64 {
    if let Some(gas) = explicit {
        return gas;
    }
    match msg.as_object() {
        Some(map) if GAS_HEAVY_KEYS.iter().any(|k| map.contains_key(*k)) => limits.high,
        _ => limits.default,
    }
}

/// `(account_number, sequence)` of an auth `account` payload.
///
/// A plain `BaseAccount` carries both fields at the top level; module accounts
/// nest them under `base_account`, vesting accounts one level deeper under
/// `base_vesting_account.base_account`.
fn account_numbers_of(account: &Value) -> (u64, u64) {
    let base = account
        .pointer("/base_vesting_account/base_account")
        .or_else(|| account.get("base_account"))
        .unwrap_or(account);
    (
        parse_u64(&base["account_number"]),
        parse_u64(&base["sequence"]),
    )
}

/// Converts a REST `tx_response` into a `TxResult`.
pub fn parse_tx_response(tx: &Value) -> TxResult {
    let mut events: Vec<Value> = tx["events"].as_array().cloned().unwrap_or_default();
    if events.is_empty() {
        // Older nodes only report events inside per-message logs.
        if let Some(logs) = tx["logs"].as_array() {
            for log in logs {
                if let Some(evts) = log["events"].as_array() {
                    events.extend(evts.iter().cloned());
                }
            }
        }
    }
    TxResult {
        transaction_hash: tx["txhash"].as_str().unwrap_or_default().to_string(),
        code: tx["code"].as_u64().unwrap_or(0) as u32,
        height: parse_u64(&tx["height"]),
        gas_wanted: parse_u64(&tx["gas_wanted"]),
        gas_used: parse_u64(&tx["gas_used"]),
        raw_log: tx["raw_log"].as_str().unwrap_or_default().to_string(),
        contract_address: find_contract_address(&events),
        events,
        confirmed: true,
    }
}

fn find_contract_address(events: &[Value]) -> Option<String> {
    events
        .iter()
        .filter(|e| e["type"] == "instantiate")
        .flat_map(|e| e["attributes"].as_array().cloned().unwrap_or_default())
        .find(|attr| attr["key"] == "_contract_address")
        .and_then(|attr| attr["value"].as_str().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_numbers_from_base_module_and_vesting_accounts() {
        let base = json!({
            "@type": "/cosmos.auth.v1beta1.BaseAccount",
            "account_number": "42", "sequence": "7"
        });
        assert_eq!(account_numbers_of(&base), (42, 7));

        let module = json!({
            "@type": "/cosmos.auth.v1beta1.ModuleAccount",
            "base_account": {"account_number": "3", "sequence": "0"},
            "name": "distribution"
        });
        assert_eq!(account_numbers_of(&module), (3, 0));

        let vesting = json!({
            "@type": "/cosmos.vesting.v1beta1.ContinuousVestingAccount",
            "base_vesting_account": {
                "base_account": {"account_number": "99", "sequence": "12"}
            }
        });
        assert_eq!(account_numbers_of(&vesting), (99, 12));
    }

    #[test]
    fn heavy_messages_get_the_high_limit() {
        let limits = GasLimits::default();
        let sale = json!({"start_sale": {"asset": {"native": "uandr"}}});
        assert_eq!(gas_limit_for(&sale, None, &limits), 300_000);
        assert_eq!(gas_limit_for(&json!({"send": {}}), None, &limits), 300_000);
        assert_eq!(gas_limit_for(&json!({"purchase_tokens": {}}), None, &limits), 300_000);
        assert_eq!(gas_limit_for(&json!({"mint": {}}), None, &limits), 200_000);
    }

    #[test]
    fn explicit_gas_wins() {
        let limits = GasLimits::default();
        let sale = json!({"start_sale": {}});
        assert_eq!(gas_limit_for(&sale, Some(123_456), &limits), 123_456);
    }

    #[test]
    fn parses_instantiate_response() {
        let tx = json!({
            "txhash": "ABC",
            "code": 0,
            "height": "42",
            "gas_wanted": "250000",
            "gas_used": "180000",
            "raw_log": "",
            "events": [
                {"type": "message", "attributes": [{"key": "action", "value": "instantiate"}]},
                {"type": "instantiate", "attributes": [
                    {"key": "_contract_address", "value": "andr1newcontract"},
                    {"key": "code_id", "value": "13"}
                ]}
            ]
        });
        let result = parse_tx_response(&tx);
        assert_eq!(result.transaction_hash, "ABC");
        assert_eq!(result.height, 42);
        assert_eq!(result.gas_used, 180_000);
        assert_eq!(result.contract_address.as_deref(), Some("andr1newcontract"));
        assert!(result.confirmed);
    }

    #[test]
    fn reads_events_from_legacy_logs() {
        let tx = json!({
            "txhash": "DEF",
            "height": 7,
            "logs": [{"events": [{"type": "instantiate", "attributes": [
                {"key": "_contract_address", "value": "andr1legacy"}
            ]}]}]
        });
        let result = parse_tx_response(&tx);
        assert_eq!(result.contract_address.as_deref(), Some("andr1legacy"));
        assert_eq!(result.events.len(), 1);
    }
}
