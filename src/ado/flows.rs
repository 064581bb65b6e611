// src/ado/flows.rs
//
// Product-level operations: one method per ADO action, each composing
// execute/query/instantiate calls with fixed gas.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::ado::messages::{
    AirdropExecuteMsg, AirdropQueryMsg, AndrAddr, AppComponent, AppExecuteMsg, AppQueryMsg, Asset,
    AuctionExecuteMsg, Cw20ExecuteMsg, Cw20HookMsg, Cw721ExecuteMsg, Cw721HookMsg,
    ExchangeExecuteMsg, ExchangeQueryMsg, Expiry, MintExtension, SplitterExecuteMsg,
    SplitterRecipient, StakingExecuteMsg,
};
use crate::ado::registry::normalize_ado_type;
use crate::ado::strategies::{
    shapes_for_ado_type, Deployment, ShapeContext, AIRDROP_SHAPES, APP_SHAPES,
};
use crate::blockchain::error::{AdapterError, Result};
use crate::blockchain::models::{Coin, TxResult};
use crate::blockchain::transactions::FeeSpec;
use crate::blockchain::wallet::AccountSigner;
use crate::blockchain::AndromedaAdapter;
use crate::utils::encode_binary;

/// How a CW20 exchange purchase is paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchasePayment {
    Native { amount: String, denom: String },
    Cw20 { token: String, amount: String },
}

/// Parameters of `start_cw20_sale`.
#[derive(Debug, Clone)]
pub struct SaleTerms {
    pub exchange: String,
    pub token: String,
    pub amount: String,
    pub asset: Asset,
    pub exchange_rate: String,
    pub recipient: Option<String>,
    pub start_time: Option<u64>,
    pub duration: Option<u64>,
}

/// Parameters of `start_auction`.
#[derive(Debug, Clone)]
pub struct AuctionTerms {
    pub auction: String,
    pub token_id: String,
    pub token_address: String,
    pub duration_ms: u64,
    pub start_time: Option<u64>,
    pub coin_denom: String,
    pub min_bid: Option<String>,
    pub recipient: Option<String>,
}

/// Parameters of `deploy_merkle_airdrop`.
#[derive(Debug, Clone)]
pub struct AirdropTerms {
    pub name: String,
    pub asset: Asset,
    pub merkle_root: String,
    pub total_amount: String,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionStarted {
    pub approval_tx_hash: String,
    pub end_time: u64,
    #[serde(flatten)]
    pub tx: TxResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirdropDeployment {
    #[serde(flatten)]
    pub deployment: Deployment,
    pub merkle_root_tx_hash: String,
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

fn instantiated_address(deployment: &Deployment, flow: &str) -> Result<String> {
    deployment.tx.contract_address.clone().ok_or_else(|| AdapterError::PartialFailure {
        flow: flow.to_string(),
        completed: format!("instantiate (tx {})", deployment.tx.transaction_hash),
        failed_step: "read contract address".to_string(),
        reason: "instantiate event carried no _contract_address".to_string(),
    })
}

impl AndromedaAdapter {
    fn ado_fee(&self) -> FeeSpec {
        FeeSpec::new(
            self.config().fees.ado_standard,
            self.default_denom(),
            self.config().gas.standard,
        )
    }

    /// Resolves the code for `ado_type` and instantiates `msg` once.
    async fn deploy_single(
        &self,
        signer: &AccountSigner,
        ado_type: &str,
        label: &str,
        msg: Value,
    ) -> Result<Deployment> {
        let code_id = self.resolve_code_id(ado_type, None).await?.code_id;
        let tx = self
            .instantiate(signer, code_id, label, msg, self.ado_fee(), Vec::new())
            .await?;
        Ok(Deployment {
            code_id,
            strategy: "standard".to_string(),
            tx,
        })
    }

    async fn execute_typed<M: Serialize>(
        &self,
        signer: &AccountSigner,
        contract: &str,
        msg: &M,
        funds: Vec<Coin>,
        gas: Option<u64>,
    ) -> Result<TxResult> {
        self.execute(signer, contract, serde_json::to_value(msg)?, funds, gas)
            .await
    }

    async fn query_typed<M: Serialize>(&self, contract: &str, msg: &M) -> Result<Value> {
        self.query(contract, &serde_json::to_value(msg)?).await
    }

    // --- Lifecycle ---

    /// Deploys an ADO, resolving the code ID when none is given and walking
    /// the type's message shapes until one is accepted.
    pub async fn deploy_ado(
        &self,
        signer: &AccountSigner,
        ado_type: &str,
        name: &str,
        instantiate_msg: &Value,
        code_id: Option<u64>,
    ) -> Result<Deployment> {
        let ado_type = normalize_ado_type(ado_type);
        let code_id = match code_id {
            Some(id) => id,
            None => self.resolve_code_id(&ado_type, None).await?.code_id,
        };
        let ctx = ShapeContext {
            input: Some(instantiate_msg),
            ..ShapeContext::new(name, signer.address(), self.kernel_address())
        };
        let operation = format!("{} deployment", ado_type.to_uppercase());
        self.instantiate_with_strategies(
            signer,
            &operation,
            code_id,
            shapes_for_ado_type(&ado_type),
            &ctx,
        )
        .await
    }

    pub async fn instantiate_ado(
        &self,
        signer: &AccountSigner,
        code_id: u64,
        instantiate_msg: &Value,
        label: &str,
    ) -> Result<TxResult> {
        let mut msg: Map<String, Value> = instantiate_msg.as_object().cloned().unwrap_or_default();
        if Some(code_id) == self.code_ids().lookup("cw721") && !msg.contains_key("minter") {
            msg.insert("minter".to_string(), json!(signer.address()));
        }
        msg.entry("kernel_address")
            .or_insert_with(|| json!(self.kernel_address()));
        let fee = FeeSpec::new(
            self.config().fees.standard,
            self.default_denom(),
            self.config().gas.standard,
        );
        self.instantiate(signer, code_id, label, Value::Object(msg), fee, Vec::new())
            .await
    }

    // --- Apps ---

    pub async fn create_app(
        &self,
        signer: &AccountSigner,
        name: &str,
        components: &[AppComponent],
    ) -> Result<Deployment> {
        let code_id = self.resolve_code_id("app", None).await?.code_id;
        let ctx = ShapeContext {
            components,
            ..ShapeContext::new(name, signer.address(), self.kernel_address())
        };
        self.instantiate_with_strategies(signer, "App", code_id, APP_SHAPES, &ctx)
            .await
    }

    pub async fn app_components(&self, app: &str) -> Result<Value> {
        self.query_typed(app, &AppQueryMsg::GetComponents {}).await
    }

    pub async fn update_app_config(
        &self,
        signer: &AccountSigner,
        app: &str,
        updates: Value,
    ) -> Result<TxResult> {
        self.execute_typed(signer, app, &AppExecuteMsg::UpdateAppConfig(updates), Vec::new(), None)
            .await
    }

    // --- CW20 / CW721 ---

    pub async fn cw20_mint(
        &self,
        signer: &AccountSigner,
        contract: &str,
        recipient: &str,
        amount: &str,
    ) -> Result<TxResult> {
        let msg = Cw20ExecuteMsg::Mint {
            recipient: recipient.to_string(),
            amount: amount.to_string(),
        };
        self.execute_typed(signer, contract, &msg, Vec::new(), None).await
    }

    pub async fn cw20_burn(
        &self,
        signer: &AccountSigner,
        contract: &str,
        amount: &str,
    ) -> Result<TxResult> {
        let msg = Cw20ExecuteMsg::Burn {
            amount: amount.to_string(),
        };
        self.execute_typed(signer, contract, &msg, Vec::new(), None).await
    }

    /// Mints with `extension: {publisher: sender}`; caller extensions are not forwarded.
    pub async fn cw721_mint(
        &self,
        signer: &AccountSigner,
        contract: &str,
        token_id: &str,
        owner: &str,
        token_uri: Option<&str>,
    ) -> Result<TxResult> {
        let msg = Cw721ExecuteMsg::Mint {
            token_id: token_id.to_string(),
            owner: owner.to_string(),
            token_uri: token_uri.map(str::to_string),
            extension: MintExtension {
                publisher: signer.address().to_string(),
            },
        };
        self.execute_typed(signer, contract, &msg, Vec::new(), None).await
    }

    // --- Marketplace / splitter ---

    /// Lists an NFT by sending it to the marketplace with a `start_sale` hook.
    pub async fn marketplace_list_item(
        &self,
        signer: &AccountSigner,
        marketplace: &str,
        nft_contract: &str,
        token_id: &str,
        price: &Coin,
    ) -> Result<TxResult> {
        let hook = Cw721HookMsg::StartSale {
            price: price.amount.clone(),
            coin_denom: price.denom.clone(),
        };
        let msg = Cw721ExecuteMsg::SendNft {
            contract: marketplace.to_string(),
            token_id: token_id.to_string(),
            msg: encode_binary(&hook)?,
        };
        self.execute_typed(signer, nft_contract, &msg, Vec::new(), Some(self.config().gas.high))
            .await
    }

    pub async fn auction_place_bid(
        &self,
        signer: &AccountSigner,
        auction: &str,
        bid: Coin,
    ) -> Result<TxResult> {
        let msg = AuctionExecuteMsg::PlaceBid {
            token_id: None,
            token_address: None,
        };
        self.execute_typed(signer, auction, &msg, vec![bid], None).await
    }

    pub async fn splitter_update_recipients(
        &self,
        signer: &AccountSigner,
        splitter: &str,
        recipients: &[(String, String)],
    ) -> Result<TxResult> {
        let msg = SplitterExecuteMsg::UpdateRecipients {
            recipients: recipients
                .iter()
                .map(|(address, percent)| SplitterRecipient {
                    recipient: AndrAddr {
                        address: address.clone(),
                    },
                    percent: percent.clone(),
                })
                .collect(),
        };
        self.execute_typed(signer, splitter, &msg, Vec::new(), None).await
    }

    // --- CW20 exchange ---

    pub async fn deploy_cw20_exchange(
        &self,
        signer: &AccountSigner,
        token_address: &str,
        name: &str,
    ) -> Result<Deployment> {
        let msg = json!({
            "token_address": token_address,
            "kernel_address": self.kernel_address(),
            "owner": signer.address(),
        });
        self.deploy_single(signer, "cw20-exchange", name, msg).await
    }

    /// Sends the sale amount to the exchange with a `start_sale` hook.
    pub async fn start_cw20_sale(
        &self,
        signer: &AccountSigner,
        terms: SaleTerms,
    ) -> Result<TxResult> {
        let hook = Cw20HookMsg::StartSale {
            asset: terms.asset,
            exchange_rate: terms.exchange_rate,
            recipient: terms
                .recipient
                .unwrap_or_else(|| signer.address().to_string()),
            start_time: terms.start_time.map(Expiry::at_millis),
            duration: terms.duration.map(|d| d.to_string()),
        };
        let msg = Cw20ExecuteMsg::Send {
            contract: terms.exchange,
            amount: terms.amount,
            msg: encode_binary(&hook)?,
        };
        self.execute_typed(signer, &terms.token, &msg, Vec::new(), None)
            .await
    }

    pub async fn purchase_cw20_tokens(
        &self,
        signer: &AccountSigner,
        exchange: &str,
        payment: PurchasePayment,
        recipient: Option<&str>,
    ) -> Result<TxResult> {
        let recipient = recipient.unwrap_or(signer.address()).to_string();
        match payment {
            PurchasePayment::Native { amount, denom } => {
                let msg = ExchangeExecuteMsg::Purchase { recipient };
                self.execute_typed(signer, exchange, &msg, vec![Coin::new(amount, denom)], None)
                    .await
            }
            PurchasePayment::Cw20 { token, amount } => {
                let hook = Cw20HookMsg::Purchase { recipient };
                let msg = Cw20ExecuteMsg::Send {
                    contract: exchange.to_string(),
                    amount,
                    msg: encode_binary(&hook)?,
                };
                self.execute_typed(signer, &token, &msg, Vec::new(), None).await
            }
        }
    }

    pub async fn cancel_cw20_sale(
        &self,
        signer: &AccountSigner,
        exchange: &str,
        asset: Asset,
    ) -> Result<TxResult> {
        self.execute_typed(signer, exchange, &ExchangeExecuteMsg::CancelSale { asset }, Vec::new(), None)
            .await
    }

    pub async fn query_cw20_sale(&self, exchange: &str, asset: Asset) -> Result<Value> {
        self.query_typed(exchange, &ExchangeQueryMsg::Sale { asset }).await
    }

    // --- Auction ---

    pub async fn deploy_auction(
        &self,
        signer: &AccountSigner,
        name: &str,
        authorized_token_addresses: Option<Vec<String>>,
        authorized_cw20_address: Option<String>,
    ) -> Result<Deployment> {
        let mut msg = Map::new();
        msg.insert("kernel_address".to_string(), json!(self.kernel_address()));
        msg.insert("owner".to_string(), json!(signer.address()));
        if let Some(addresses) = authorized_token_addresses {
            msg.insert("authorized_token_addresses".to_string(), json!(addresses));
        }
        if let Some(address) = authorized_cw20_address {
            msg.insert("authorized_cw20_address".to_string(), json!(address));
        }
        self.deploy_single(signer, "auction", name, Value::Object(msg)).await
    }

    /// Approves the auction for the token, then sends the token with a
    /// `start_auction` hook. A failed send leaves the approval in place.
    pub async fn start_auction(
        &self,
        signer: &AccountSigner,
        terms: AuctionTerms,
    ) -> Result<AuctionStarted> {
        let gas = &self.config().gas;
        let approve = Cw721ExecuteMsg::Approve {
            spender: terms.auction.clone(),
            token_id: terms.token_id.clone(),
        };
        let approval = self
            .execute_typed(signer, &terms.token_address, &approve, Vec::new(), Some(gas.default))
            .await?;
        info!(
            "Approved {} for token {} (tx {})",
            terms.auction, terms.token_id, approval.transaction_hash
        );

        let end_time = now_millis() + terms.duration_ms;
        let hook = Cw721HookMsg::StartAuction {
            end_time,
            uses_cw20: false,
            coin_denom: terms.coin_denom,
            min_bid: terms.min_bid,
            recipient: terms.recipient.map(|address| AndrAddr { address }),
            start_time: terms.start_time,
        };
        let send = Cw721ExecuteMsg::SendNft {
            contract: terms.auction,
            token_id: terms.token_id,
            msg: encode_binary(&hook)?,
        };
        let tx = self
            .execute_typed(signer, &terms.token_address, &send, Vec::new(), Some(gas.nft_ops))
            .await
            .map_err(|err| AdapterError::PartialFailure {
                flow: "start_auction".to_string(),
                completed: format!("approve (tx {})", approval.transaction_hash),
                failed_step: "send_nft".to_string(),
                reason: err.to_string(),
            })?;
        Ok(AuctionStarted {
            approval_tx_hash: approval.transaction_hash,
            end_time,
            tx,
        })
    }

    pub async fn place_auction_bid(
        &self,
        signer: &AccountSigner,
        auction: &str,
        token_id: &str,
        token_address: &str,
        bid: Coin,
    ) -> Result<TxResult> {
        let msg = AuctionExecuteMsg::PlaceBid {
            token_id: Some(token_id.to_string()),
            token_address: Some(token_address.to_string()),
        };
        self.execute_typed(signer, auction, &msg, vec![bid], Some(self.config().gas.high))
            .await
    }

    pub async fn finalize_auction(
        &self,
        signer: &AccountSigner,
        auction: &str,
        token_id: &str,
        token_address: &str,
    ) -> Result<TxResult> {
        let msg = AuctionExecuteMsg::Claim {
            token_id: token_id.to_string(),
            token_address: token_address.to_string(),
        };
        self.execute_typed(signer, auction, &msg, Vec::new(), Some(self.config().gas.standard))
            .await
    }

    // --- CW20 staking ---

    /// Deploys the pool for `staking_token`. Reward tokens are registered on
    /// the pool after deployment; the instantiate message only takes the
    /// staking token.
    pub async fn deploy_cw20_staking(
        &self,
        signer: &AccountSigner,
        name: &str,
        staking_token: &str,
    ) -> Result<Deployment> {
        let msg = json!({
            "staking_token": staking_token,
            "kernel_address": self.kernel_address(),
            "owner": signer.address(),
        });
        self.deploy_single(signer, "cw20-staking", name, msg).await
    }

    pub async fn stake_cw20_tokens(
        &self,
        signer: &AccountSigner,
        staking: &str,
        token: &str,
        amount: &str,
    ) -> Result<TxResult> {
        let msg = Cw20ExecuteMsg::Send {
            contract: staking.to_string(),
            amount: amount.to_string(),
            msg: encode_binary(&Cw20HookMsg::StakeTokens {})?,
        };
        self.execute_typed(signer, token, &msg, Vec::new(), Some(self.config().gas.high))
            .await
    }

    pub async fn unstake_cw20_tokens(
        &self,
        signer: &AccountSigner,
        staking: &str,
        amount: &str,
    ) -> Result<TxResult> {
        let msg = StakingExecuteMsg::UnstakeTokens {
            amount: amount.to_string(),
        };
        self.execute_typed(signer, staking, &msg, Vec::new(), Some(self.config().gas.high))
            .await
    }

    pub async fn claim_staking_rewards(
        &self,
        signer: &AccountSigner,
        staking: &str,
    ) -> Result<TxResult> {
        self.execute_typed(
            signer,
            staking,
            &StakingExecuteMsg::ClaimRewards {},
            Vec::new(),
            Some(self.config().gas.standard),
        )
        .await
    }

    // --- Merkle airdrop ---

    /// Instantiates the airdrop, then registers its merkle root.
    pub async fn deploy_merkle_airdrop(
        &self,
        signer: &AccountSigner,
        terms: AirdropTerms,
    ) -> Result<AirdropDeployment> {
        if let (Some(start), Some(end)) = (terms.start_time, terms.end_time) {
            if end <= start {
                return Err(AdapterError::Validation(format!(
                    "endTime ({}) must be after startTime ({})",
                    end, start
                )));
            }
        }
        let code_id = self.resolve_code_id("merkle-airdrop", None).await?.code_id;
        let ctx = ShapeContext {
            asset: Some(&terms.asset),
            ..ShapeContext::new(&terms.name, signer.address(), self.kernel_address())
        };
        let deployment = self
            .instantiate_with_strategies(signer, "Merkle Airdrop", code_id, AIRDROP_SHAPES, &ctx)
            .await?;
        let airdrop = instantiated_address(&deployment, "deploy_merkle_airdrop")?;

        let register = AirdropExecuteMsg::RegisterMerkleRoot {
            merkle_root: terms.merkle_root,
            expiration: terms.end_time.map(Expiry::at_millis),
            total_amount: terms.total_amount,
        };
        let registered = self
            .execute_typed(signer, &airdrop, &register, Vec::new(), None)
            .await
            .map_err(|err| AdapterError::PartialFailure {
                flow: "deploy_merkle_airdrop".to_string(),
                completed: format!(
                    "instantiate {} (tx {})",
                    airdrop, deployment.tx.transaction_hash
                ),
                failed_step: "register_merkle_root".to_string(),
                reason: err.to_string(),
            })?;
        Ok(AirdropDeployment {
            deployment,
            merkle_root_tx_hash: registered.transaction_hash,
        })
    }

    pub async fn claim_airdrop_tokens(
        &self,
        signer: &AccountSigner,
        airdrop: &str,
        amount: &str,
        proof: Vec<String>,
    ) -> Result<TxResult> {
        let msg = AirdropExecuteMsg::Claim {
            amount: amount.to_string(),
            proof,
        };
        self.execute_typed(signer, airdrop, &msg, Vec::new(), Some(self.config().gas.high))
            .await
    }

    pub async fn query_airdrop_claim(&self, airdrop: &str, address: &str) -> Result<Value> {
        self.query_typed(
            airdrop,
            &AirdropQueryMsg::IsClaimed {
                address: address.to_string(),
            },
        )
        .await
    }
}
