//! In-memory backends for adapter, flow and dispatcher tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;

use crate::ado::registry::CodeIdTable;
use crate::blockchain::error::{AdapterError, Result};
use crate::blockchain::models::TxResult;
use crate::blockchain::transactions::{ContractMsg, TxBroadcaster, TxRequest};
use crate::blockchain::wallet::AccountSigner;
use crate::blockchain::wasm::WasmQuerier;
use crate::blockchain::AndromedaAdapter;
use crate::config::Config;

pub const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
/// Address of `MNEMONIC` on `m/44'/118'/0'/0/0` with the `andr` prefix.
pub const SENDER: &str = "andr19rl4cm2hmr8afy4kldpxz3fka4jguq0ayt9lrc";
pub const KERNEL: &str = "andr14hj2tavq8fpesdwxxcu44rty3hh90vhujrvcmstl4zr3txmfvw9shptkql";
pub const ADODB: &str = "andr1adodbcontractaddressxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx";

pub fn mnemonic() -> SecretString {
    SecretString::new(MNEMONIC.to_string())
}

pub fn test_config() -> Config {
    let mut config = Config::from_lookup(|_| None).expect("default config");
    config.code_id_table_path = None;
    config
}

pub fn test_adapter(querier: StaticQuerier, broadcaster: RecordingBroadcaster) -> AndromedaAdapter {
    AndromedaAdapter::with_backends(
        Arc::new(test_config()),
        CodeIdTable::builtin("testnet").expect("builtin table"),
        Arc::new(querier),
        Arc::new(broadcaster),
    )
}

fn top_level_key(query: &Value) -> String {
    query
        .as_object()
        .and_then(|map| map.keys().next().cloned())
        .unwrap_or_default()
}

/// Answers smart queries from a fixed table keyed by contract and the
/// query's top-level key. Unknown pairs fail like an unreachable node.
#[derive(Clone, Default)]
pub struct StaticQuerier {
    responses: Arc<Mutex<HashMap<(String, String), Value>>>,
    seen: Arc<Mutex<Vec<(String, Value)>>>,
}

impl StaticQuerier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, contract: &str, key: &str, response: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((contract.to_string(), key.to_string()), response);
        self
    }

    pub fn last_query(&self, contract: &str, key: &str) -> Option<Value> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(c, q)| c == contract && top_level_key(q) == key)
            .map(|(_, q)| q.clone())
    }
}

#[async_trait]
impl WasmQuerier for StaticQuerier {
    async fn smart_query(&self, contract: &str, query: &Value) -> Result<Value> {
        self.seen
            .lock()
            .unwrap()
            .push((contract.to_string(), query.clone()));
        let key = (contract.to_string(), top_level_key(query));
        self.responses
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| AdapterError::Connectivity(format!("no route to {} for {}", contract, query)))
    }
}

/// Records every submitted transaction. Outcomes are scripted in order;
/// once the script runs out every submission succeeds.
#[derive(Clone, Default)]
pub struct RecordingBroadcaster {
    submitted: Arc<Mutex<Vec<(String, TxRequest)>>>,
    script: Arc<Mutex<VecDeque<Option<AdapterError>>>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_fail(self, err: AdapterError) -> Self {
        self.script.lock().unwrap().push_back(Some(err));
        self
    }

    pub fn then_succeed(self) -> Self {
        self.script.lock().unwrap().push_back(None);
        self
    }

    pub fn submitted(&self) -> Vec<(String, TxRequest)> {
        self.submitted.lock().unwrap().clone()
    }

    /// The single message of the nth submission.
    pub fn msg(&self, index: usize) -> ContractMsg {
        self.submitted.lock().unwrap()[index].1.msgs[0].clone()
    }
}

#[async_trait]
impl TxBroadcaster for RecordingBroadcaster {
    async fn submit(&self, signer: &AccountSigner, tx: TxRequest) -> Result<TxResult> {
        let index = {
            let mut submitted = self.submitted.lock().unwrap();
            submitted.push((signer.address().to_string(), tx.clone()));
            submitted.len()
        };
        if let Some(Some(err)) = self.script.lock().unwrap().pop_front() {
            return Err(err);
        }
        let contract_address = match tx.msgs.first() {
            Some(ContractMsg::Instantiate { .. }) => Some(format!("andr1instance{}", index)),
            _ => None,
        };
        Ok(TxResult {
            transaction_hash: format!("HASH{}", index),
            height: 1_000 + index as u64,
            gas_wanted: tx.fee.gas_limit,
            contract_address,
            confirmed: true,
            ..TxResult::default()
        })
    }
}

/// A contract rejection as the chain would report it.
pub fn rejection(log: &str) -> AdapterError {
    AdapterError::RemoteRejection {
        code: 5,
        log: log.to_string(),
    }
}
