//! The Andromeda adapter: one shared object that every tool call goes through.
//!
//! It owns the read-only connection (created by `initialize`, retried once on
//! demand), the HTTP client used for REST/GraphQL, the fallback code-ID table
//! and the transaction broadcaster. Signers are never stored here; callers
//! derive an `AccountSigner` per call and pass it in.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::ado::registry::CodeIdTable;
use crate::blockchain::client::ChainClient;
use crate::blockchain::error::{AdapterError, Result};
use crate::blockchain::models::{
    AddressResponse, BlockInfo, ChainInfo, Coin, RecentTransaction, TxResult, WalletResponse,
};
use crate::blockchain::transactions::{
    gas_limit_for, ContractMsg, FeeSpec, RestBroadcaster, TxBroadcaster, TxRequest,
};
use crate::blockchain::wallet::{self, AccountSigner};
use crate::blockchain::wasm::{WasmClient, WasmQuerier};
use crate::config::Config;

const ADO_EVENTS_QUERY: &str = r#"
query GetADOEvents($contractAddress: String!) {
  events(where: { contract_address: { _eq: $contractAddress } }, order_by: { block_height: desc }, limit: 50) {
    id
    contract_address
    event_type
    attributes
    block_height
    block_time
    transaction_hash
  }
}"#;

/// The read-only half of the adapter, shared by every call once connected.
pub struct Connection {
    pub chain: ChainClient,
    pub wasm: Arc<dyn WasmQuerier>,
}

pub struct AndromedaAdapter {
    config: Arc<Config>,
    code_ids: CodeIdTable,
    http: reqwest::Client,
    connection: RwLock<Option<Arc<Connection>>>,
    broadcaster: Arc<dyn TxBroadcaster>,
}

impl AndromedaAdapter {
    /// Builds an unconnected adapter; call `initialize` before serving queries.
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let code_ids = CodeIdTable::load(&config)?;
        info!(
            "Loaded fallback code IDs v{} for {} ({} entries)",
            code_ids.version(),
            config.network.name,
            code_ids.len()
        );
        let broadcaster = Arc::new(RestBroadcaster::new(http.clone(), &config));
        Ok(Self {
            config,
            code_ids,
            http,
            connection: RwLock::new(None),
            broadcaster,
        })
    }

    /// Builds an adapter around pre-made backends, already connected.
    #[cfg(test)]
    pub(crate) fn with_backends(
        config: Arc<Config>,
        code_ids: CodeIdTable,
        wasm: Arc<dyn WasmQuerier>,
        broadcaster: Arc<dyn TxBroadcaster>,
    ) -> Self {
        let http = reqwest::Client::new();
        let chain = ChainClient::new(http.clone(), &config.network);
        Self {
            config,
            code_ids,
            http,
            connection: RwLock::new(Some(Arc::new(Connection { chain, wasm }))),
            broadcaster,
        }
    }

    /// Opens the read-only connection against the configured RPC endpoint.
    pub async fn initialize(&self) -> Result<()> {
        let (chain, status) = ChainClient::connect(self.http.clone(), &self.config.network).await?;
        info!(
            "Connected to {} at height {} via {}",
            status.network,
            status.latest_height,
            chain.rpc_url()
        );
        let wasm: Arc<dyn WasmQuerier> = Arc::new(WasmClient::new(chain.clone(), self.http.clone()));
        *self.connection.write().await = Some(Arc::new(Connection { chain, wasm }));
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// The live connection, retrying `initialize` once if it is missing.
    pub async fn connection(&self) -> Result<Arc<Connection>> {
        if let Some(conn) = self.connection.read().await.as_ref() {
            return Ok(conn.clone());
        }
        warn!("Adapter not connected, retrying initialization");
        self.initialize()
            .await
            .map_err(|e| AdapterError::NotInitialized(e.to_string()))?;
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| AdapterError::NotInitialized("connection unavailable".to_string()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn code_ids(&self) -> &CodeIdTable {
        &self.code_ids
    }

    pub fn kernel_address(&self) -> &str {
        &self.config.network.kernel_address
    }

    pub fn default_denom(&self) -> &str {
        self.config.default_denom()
    }

    /// Derives the signer for one call.
    pub fn signer(&self, mnemonic: &SecretString) -> Result<AccountSigner> {
        Ok(AccountSigner::from_mnemonic(
            mnemonic,
            &self.config.bech32_prefix,
            &self.config.hd_path,
        )?)
    }

    /// Execute fee in the default denom with the standard amount.
    pub fn execute_fee(&self, gas_limit: u64) -> FeeSpec {
        FeeSpec::new(self.config.fees.standard, self.default_denom(), gas_limit)
    }

    // --- Wallet ---

    pub fn generate_wallet(&self) -> Result<WalletResponse> {
        Ok(wallet::generate_wallet(
            &self.config.bech32_prefix,
            &self.config.hd_path,
        )?)
    }

    pub fn wallet_address(&self, mnemonic: &SecretString) -> Result<AddressResponse> {
        let signer = self.signer(mnemonic)?;
        Ok(AddressResponse {
            address: signer.address().to_string(),
        })
    }

    // --- Chain queries ---

    pub async fn chain_info(&self) -> Result<ChainInfo> {
        self.connection().await?.chain.chain_info().await
    }

    pub async fn block_info(&self, height: Option<u64>) -> Result<BlockInfo> {
        self.connection().await?.chain.block(height).await
    }

    pub async fn transaction(&self, hash: &str) -> Result<Value> {
        self.connection().await?.chain.transaction(hash).await
    }

    pub async fn account_info(&self, address: &str) -> Result<Value> {
        self.connection().await?.chain.account(address).await
    }

    pub async fn account_balance(&self, address: &str) -> Result<Vec<Coin>> {
        self.connection().await?.chain.balances(address).await
    }

    pub async fn validators(&self) -> Result<Value> {
        self.connection().await?.chain.validators().await
    }

    pub async fn recent_transactions(&self, limit: usize) -> Result<Vec<RecentTransaction>> {
        self.connection().await?.chain.recent_transactions(limit).await
    }

    pub async fn contract_info(&self, address: &str) -> Result<Value> {
        self.connection().await?.chain.contract_info(address).await
    }

    pub async fn code_info(&self, code_id: u64) -> Result<Value> {
        self.connection().await?.chain.code_info(code_id).await
    }

    pub async fn contracts(&self, code_id: u64) -> Result<Vec<String>> {
        self.connection().await?.chain.contracts_by_code(code_id).await
    }

    // --- Contracts ---

    pub async fn query(&self, contract: &str, query: &Value) -> Result<Value> {
        self.connection().await?.wasm.smart_query(contract, query).await
    }

    /// Executes `msg` on `contract` with the default gas policy unless `gas` is given.
    pub async fn execute(
        &self,
        signer: &AccountSigner,
        contract: &str,
        msg: Value,
        funds: Vec<Coin>,
        gas: Option<u64>,
    ) -> Result<TxResult> {
        let gas_limit = gas_limit_for(&msg, gas, &self.config.gas);
        let tx = TxRequest::single(
            ContractMsg::Execute {
                contract: contract.to_string(),
                msg,
                funds,
            },
            self.execute_fee(gas_limit),
        );
        self.broadcaster.submit(signer, tx).await
    }

    /// Instantiates a contract with the sender as admin.
    pub async fn instantiate(
        &self,
        signer: &AccountSigner,
        code_id: u64,
        label: &str,
        msg: Value,
        fee: FeeSpec,
        funds: Vec<Coin>,
    ) -> Result<TxResult> {
        info!("Instantiating code {} as '{}'", code_id, label);
        let tx = TxRequest::single(
            ContractMsg::Instantiate {
                code_id,
                label: label.to_string(),
                msg,
                admin: Some(signer.address().to_string()),
                funds,
            },
            fee,
        );
        self.broadcaster.submit(signer, tx).await
    }

    pub async fn migrate(
        &self,
        signer: &AccountSigner,
        contract: &str,
        new_code_id: u64,
        msg: Value,
    ) -> Result<TxResult> {
        let tx = TxRequest::single(
            ContractMsg::Migrate {
                contract: contract.to_string(),
                code_id: new_code_id,
                msg,
            },
            self.execute_fee(self.config.gas.default),
        );
        self.broadcaster.submit(signer, tx).await
    }

    pub async fn transfer(
        &self,
        signer: &AccountSigner,
        recipient: &str,
        amount: Coin,
        memo: Option<&str>,
    ) -> Result<TxResult> {
        let fee = FeeSpec::new(self.config.fees.low, self.default_denom(), self.config.gas.low);
        let tx = TxRequest::single(
            ContractMsg::Send {
                to: recipient.to_string(),
                amount: vec![amount],
            },
            fee,
        )
        .with_memo(memo.unwrap_or_default());
        self.broadcaster.submit(signer, tx).await
    }

    // --- GraphQL ---

    pub async fn graphql(&self, query: &str, variables: Option<Value>) -> Result<Value> {
        let resp = self
            .http
            .post(&self.config.network.graphql_endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(AdapterError::Connectivity(format!(
                "GraphQL query failed: {}",
                status
            )));
        }
        let body: Value = resp.json().await?;
        if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
            return Err(AdapterError::Connectivity(format!(
                "GraphQL errors: {}",
                errors
            )));
        }
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }

    /// Most recent indexed events for a contract.
    pub async fn ado_events(&self, contract: &str) -> Result<Value> {
        self.graphql(ADO_EVENTS_QUERY, Some(json!({ "contractAddress": contract })))
            .await
    }
}
