//! Tool dispatch: schema pass, typed pass, then exactly one adapter call.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::ado::flows::{AirdropTerms, AuctionTerms, PurchasePayment, SaleTerms};
use crate::blockchain::error::{AdapterError, Result};
use crate::blockchain::models::Coin;
use crate::blockchain::AndromedaAdapter;
use crate::mcp::args::{self, AssetKind};
use crate::mcp::registry;
use crate::mcp::validation::validate_arguments;

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Runs one tool call and returns its structured payload.
pub async fn call_tool(adapter: &AndromedaAdapter, name: &str, arguments: &Value) -> Result<Value> {
    let tool = registry::find(name).ok_or_else(|| AdapterError::UnknownTool(name.to_string()))?;
    let validated = validate_arguments(tool, arguments)?;
    debug!("Dispatching tool {}", name);

    match name {
        // --- Chain ---
        "get_chain_info" => to_json(adapter.chain_info().await?),
        "get_block_info" => {
            let a: args::BlockArgs = args::parse(validated)?;
            to_json(adapter.block_info(a.height).await?)
        }
        "get_transaction" => {
            let a: args::TxHashArgs = args::parse(validated)?;
            adapter.transaction(&a.tx_hash).await
        }
        "get_account_info" => {
            let a: args::AddressArgs = args::parse(validated)?;
            adapter.account_info(&a.address).await
        }
        "get_account_balance" => {
            let a: args::AddressArgs = args::parse(validated)?;
            to_json(adapter.account_balance(&a.address).await?)
        }
        "get_validators" => adapter.validators().await,
        "get_recent_transactions" => {
            let a: args::RecentTransactionsArgs = args::parse(validated)?;
            to_json(adapter.recent_transactions(a.limit).await?)
        }
        "get_contract_info" => {
            let a: args::ContractArgs = args::parse(validated)?;
            adapter.contract_info(&a.contract_address).await
        }
        "get_code_info" => {
            let a: args::CodeIdArgs = args::parse(validated)?;
            adapter.code_info(a.code_id).await
        }
        "get_contracts" => {
            let a: args::CodeIdArgs = args::parse(validated)?;
            to_json(adapter.contracts(a.code_id).await?)
        }

        // --- Generic ADO ---
        "query_ado" => {
            let a: args::QueryAdoArgs = args::parse(validated)?;
            adapter.query(&a.contract_address, &a.query).await
        }
        "execute_ado" => {
            let a: args::ExecuteAdoArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            let funds = a.funds.into_iter().map(Coin::from).collect();
            to_json(
                adapter
                    .execute(&signer, &a.contract_address, a.msg, funds, a.gas)
                    .await?,
            )
        }

        // --- Bank / wallet ---
        "transfer_tokens" => {
            let a: args::TransferArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .transfer(&signer, &a.recipient, Coin::new(a.amount, a.denom), a.memo.as_deref())
                    .await?,
            )
        }
        "generate_wallet" => to_json(adapter.generate_wallet()?),
        "get_wallet_address" => {
            let a: args::MnemonicArgs = args::parse(validated)?;
            to_json(adapter.wallet_address(&a.mnemonic)?)
        }

        // --- ADO database ---
        "query_adodb" => {
            let a: args::QueryAdodbArgs = args::parse(validated)?;
            adapter
                .query_adodb(a.ado_type.as_deref(), a.start_after.as_deref())
                .await
        }
        "get_ado_code_id" => {
            let a: args::AdoCodeIdArgs = args::parse(validated)?;
            to_json(adapter.resolve_code_id(&a.ado_type, a.version.as_deref()).await?)
        }
        "list_ado_versions" => {
            let a: args::AdoTypeArgs = args::parse(validated)?;
            adapter.list_ado_versions(&a.ado_type).await
        }
        "publish_ado" => {
            let a: args::PublishAdoArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .publish_ado(&signer, a.code_id, &a.ado_type, &a.version)
                    .await?,
            )
        }

        // --- GraphQL ---
        "graphql_query" => {
            let a: args::GraphqlArgs = args::parse(validated)?;
            adapter.graphql(&a.query, a.variables).await
        }
        "subscribe_ado_events" => {
            let a: args::ContractArgs = args::parse(validated)?;
            adapter.ado_events(&a.contract_address).await
        }

        // --- Apps ---
        "create_app" => {
            let a: args::CreateAppArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(adapter.create_app(&signer, &a.name, &a.components).await?)
        }
        "get_app_info" | "list_app_components" => {
            let a: args::AppArgs = args::parse(validated)?;
            adapter.app_components(&a.app_address).await
        }
        "update_app_config" => {
            let a: args::UpdateAppConfigArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .update_app_config(&signer, &a.app_address, a.updates)
                    .await?,
            )
        }

        // --- Lifecycle ---
        "deploy_ado" => {
            let a: args::DeployAdoArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .deploy_ado(&signer, &a.ado_type, &a.name, &a.instantiate_msg, a.code_id)
                    .await?,
            )
        }
        "instantiate_ado" => {
            let a: args::InstantiateAdoArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .instantiate_ado(&signer, a.code_id, &a.instantiate_msg, &a.label)
                    .await?,
            )
        }
        "migrate_ado" => {
            let a: args::MigrateAdoArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .migrate(&signer, &a.contract_address, a.new_code_id, a.migrate_msg)
                    .await?,
            )
        }

        // --- CW20 / CW721 ---
        "cw20_mint" => {
            let a: args::Cw20MintArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .cw20_mint(&signer, &a.contract_address, &a.recipient, &a.amount)
                    .await?,
            )
        }
        "cw20_burn" => {
            let a: args::Cw20BurnArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(adapter.cw20_burn(&signer, &a.contract_address, &a.amount).await?)
        }
        "cw721_mint_nft" => {
            let a: args::Cw721MintArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .cw721_mint(
                        &signer,
                        &a.contract_address,
                        &a.token_id,
                        &a.owner,
                        a.token_uri.as_deref(),
                    )
                    .await?,
            )
        }

        // --- Marketplace / auction / splitter ---
        "marketplace_list_item" => {
            let a: args::MarketplaceListArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .marketplace_list_item(
                        &signer,
                        &a.marketplace_address,
                        &a.nft_contract,
                        &a.token_id,
                        &Coin::from(a.price),
                    )
                    .await?,
            )
        }
        "auction_place_bid" => {
            let a: args::AuctionBidArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .auction_place_bid(&signer, &a.auction_address, Coin::new(a.amount, a.denom))
                    .await?,
            )
        }
        "splitter_update_recipients" => {
            let a: args::SplitterUpdateArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            let recipients: Vec<(String, String)> = a
                .recipients
                .into_iter()
                .map(|r| (r.address, r.percent))
                .collect();
            to_json(
                adapter
                    .splitter_update_recipients(&signer, &a.splitter_address, &recipients)
                    .await?,
            )
        }

        // --- CW20 exchange ---
        "deploy_cw20_exchange" => {
            let a: args::DeployExchangeArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .deploy_cw20_exchange(&signer, &a.token_address, &a.name)
                    .await?,
            )
        }
        "start_cw20_sale" => {
            let a: args::StartSaleArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            let terms = SaleTerms {
                exchange: a.exchange_address,
                token: a.token_address,
                amount: a.amount,
                asset: a.asset.into(),
                exchange_rate: a.exchange_rate,
                recipient: a.recipient,
                start_time: a.start_time,
                duration: a.duration,
            };
            to_json(adapter.start_cw20_sale(&signer, terms).await?)
        }
        "purchase_cw20_tokens" => {
            let a: args::PurchaseArgs = args::parse(validated)?;
            let asset = a.purchase_asset;
            let payment = match asset.kind {
                AssetKind::Native => PurchasePayment::Native {
                    amount: asset.amount,
                    denom: asset
                        .denom
                        .filter(|d| !d.is_empty())
                        .unwrap_or_else(|| adapter.default_denom().to_string()),
                },
                AssetKind::Cw20 => PurchasePayment::Cw20 {
                    token: asset.address.filter(|t| !t.is_empty()).ok_or_else(|| {
                        AdapterError::Validation(
                            "field 'purchaseAsset.address' is required for cw20 purchases".to_string(),
                        )
                    })?,
                    amount: asset.amount,
                },
            };
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .purchase_cw20_tokens(&signer, &a.exchange_address, payment, a.recipient.as_deref())
                    .await?,
            )
        }
        "cancel_cw20_sale" => {
            let a: args::CancelSaleArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .cancel_cw20_sale(&signer, &a.exchange_address, a.asset.into())
                    .await?,
            )
        }
        "query_cw20_sale" => {
            let a: args::SaleAssetArgs = args::parse(validated)?;
            adapter
                .query_cw20_sale(&a.exchange_address, a.asset.into())
                .await
        }

        // --- Auction ---
        "deploy_auction" => {
            let a: args::DeployAuctionArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .deploy_auction(
                        &signer,
                        &a.name,
                        a.authorized_token_addresses,
                        a.authorized_cw20_address,
                    )
                    .await?,
            )
        }
        "start_auction" => {
            let a: args::StartAuctionArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            let terms = AuctionTerms {
                auction: a.auction_address,
                token_id: a.token_id,
                token_address: a.token_address,
                duration_ms: a.duration,
                start_time: a.start_time,
                coin_denom: a.coin_denom,
                min_bid: a.starting_bid,
                recipient: a.recipient,
            };
            to_json(adapter.start_auction(&signer, terms).await?)
        }
        "place_auction_bid" => {
            let a: args::PlaceAuctionBidArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .place_auction_bid(
                        &signer,
                        &a.auction_address,
                        &a.token_id,
                        &a.token_address,
                        Coin::new(a.bid_amount, a.denom),
                    )
                    .await?,
            )
        }
        "finalize_auction" => {
            let a: args::FinalizeAuctionArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .finalize_auction(&signer, &a.auction_address, &a.token_id, &a.token_address)
                    .await?,
            )
        }

        // --- CW20 staking ---
        "deploy_cw20_staking" => {
            let a: args::DeployStakingArgs = args::parse(validated)?;
            info!(
                "Staking pool reward token {} (allocation {}, unbonding {:?}s) must be added after deployment",
                a.reward_token, a.reward_allocation, a.unbonding_period
            );
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .deploy_cw20_staking(&signer, &a.name, &a.staking_token)
                    .await?,
            )
        }
        "stake_cw20_tokens" => {
            let a: args::StakeArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .stake_cw20_tokens(&signer, &a.staking_address, &a.token_address, &a.amount)
                    .await?,
            )
        }
        "unstake_cw20_tokens" => {
            let a: args::UnstakeArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .unstake_cw20_tokens(&signer, &a.staking_address, &a.amount)
                    .await?,
            )
        }
        "claim_staking_rewards" => {
            let a: args::ClaimRewardsArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(adapter.claim_staking_rewards(&signer, &a.staking_address).await?)
        }

        // --- Merkle airdrop ---
        "deploy_merkle_airdrop" => {
            let a: args::DeployAirdropArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            let terms = AirdropTerms {
                name: a.name,
                asset: a.asset.into(),
                merkle_root: a.merkle_root,
                total_amount: a.total_amount,
                start_time: a.start_time,
                end_time: a.end_time,
            };
            to_json(adapter.deploy_merkle_airdrop(&signer, terms).await?)
        }
        "claim_airdrop_tokens" => {
            let a: args::ClaimAirdropArgs = args::parse(validated)?;
            let signer = adapter.signer(&a.mnemonic)?;
            to_json(
                adapter
                    .claim_airdrop_tokens(&signer, &a.airdrop_address, &a.amount, a.proof)
                    .await?,
            )
        }
        "query_airdrop_claim" => {
            let a: args::AirdropClaimQueryArgs = args::parse(validated)?;
            adapter
                .query_airdrop_claim(&a.airdrop_address, &a.address)
                .await
        }

        _ => Err(AdapterError::UnknownTool(name.to_string())),
    }
}

/// `{ "content": [...] }` for a finished call; failures become `isError` results.
pub async fn call_tool_result(adapter: &AndromedaAdapter, name: &str, arguments: &Value) -> Value {
    match call_tool(adapter, name, arguments).await {
        Ok(payload) => crate::utils::text_result(&payload),
        Err(err) => {
            info!("Tool {} failed: {}", name, err);
            crate::utils::error_result(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::transactions::ContractMsg;
    use serde_json::json;
    use crate::testing::{test_adapter, RecordingBroadcaster, StaticQuerier, MNEMONIC, SENDER};

    fn adapter_with(broadcaster: RecordingBroadcaster) -> AndromedaAdapter {
        test_adapter(StaticQuerier::new(), broadcaster)
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let adapter = adapter_with(RecordingBroadcaster::new());
        let result = call_tool_result(&adapter, "launch_rocket", &json!({})).await;
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: Unknown tool: launch_rocket");
    }

    #[tokio::test]
    async fn required_fields_fail_before_any_network_call() {
        let broadcaster = RecordingBroadcaster::new();
        let adapter = adapter_with(broadcaster.clone());
        for tool in registry::TOOLS {
            if tool.required_fields().next().is_none() {
                continue;
            }
            let err = call_tool(&adapter, tool.name, &json!({})).await.unwrap_err();
            assert!(
                matches!(err, AdapterError::Validation(_)),
                "{} returned {}",
                tool.name,
                err
            );
        }
        assert!(broadcaster.submitted().is_empty());
    }

    #[tokio::test]
    async fn generated_wallet_round_trips_through_address_lookup() {
        let adapter = adapter_with(RecordingBroadcaster::new());
        let wallet = call_tool(&adapter, "generate_wallet", &json!({})).await.unwrap();
        let mnemonic = wallet["mnemonic"].as_str().unwrap();
        assert_eq!(mnemonic.split_whitespace().count(), 24);

        let derived = call_tool(&adapter, "get_wallet_address", &json!({ "mnemonic": mnemonic }))
            .await
            .unwrap();
        assert_eq!(derived["address"], wallet["address"]);
    }

    #[tokio::test]
    async fn deploy_cw721_defaults_minter_to_sender() {
        let broadcaster = RecordingBroadcaster::new();
        let adapter = adapter_with(broadcaster.clone());
        let result = call_tool(
            &adapter,
            "deploy_ado",
            &json!({
                "adoType": "cw721",
                "name": "Art",
                "instantiateMsg": {"name": "Art Collection", "symbol": "ART"},
                "mnemonic": MNEMONIC,
            }),
        )
        .await
        .unwrap();
        assert_eq!(result["codeId"], 13);
        assert_eq!(result["transactionHash"], "HASH1");

        match broadcaster.msg(0) {
            ContractMsg::Instantiate { code_id, msg, .. } => {
                assert_eq!(code_id, 13);
                assert_eq!(msg["minter"], SENDER);
            }
            other => panic!("unexpected msg: {other:?}"),
        }
    }

    #[tokio::test]
    async fn gas_heavy_execute_gets_the_high_limit() {
        let broadcaster = RecordingBroadcaster::new();
        let adapter = adapter_with(broadcaster.clone());
        call_tool(
            &adapter,
            "execute_ado",
            &json!({
                "contractAddress": "andr1exchange",
                "msg": {"start_sale": {"asset": {"native": "uandr"}}},
                "mnemonic": MNEMONIC,
            }),
        )
        .await
        .unwrap();
        call_tool(
            &adapter,
            "execute_ado",
            &json!({
                "contractAddress": "andr1counter",
                "msg": {"increment": {}},
                "mnemonic": MNEMONIC,
                "gas": "350000",
                "funds": [{"denom": "uandr", "amount": "5"}],
            }),
        )
        .await
        .unwrap();

        let submitted = broadcaster.submitted();
        assert_eq!(submitted[0].1.fee.gas_limit, 300_000);
        assert_eq!(submitted[1].1.fee.gas_limit, 350_000);
        match broadcaster.msg(1) {
            ContractMsg::Execute { funds, .. } => assert_eq!(funds, vec![Coin::new("5", "uandr")]),
            other => panic!("unexpected msg: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cw20_purchase_needs_a_token_address() {
        let broadcaster = RecordingBroadcaster::new();
        let adapter = adapter_with(broadcaster.clone());
        let err = call_tool(
            &adapter,
            "purchase_cw20_tokens",
            &json!({
                "exchangeAddress": "andr1exchange",
                "purchaseAsset": {"type": "cw20", "amount": "10"},
                "mnemonic": MNEMONIC,
            }),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("purchaseAsset.address"));
        assert!(broadcaster.submitted().is_empty());
    }

    #[tokio::test]
    async fn bad_mnemonic_is_reported_not_panicked() {
        let adapter = adapter_with(RecordingBroadcaster::new());
        let result = call_tool_result(
            &adapter,
            "get_wallet_address",
            &json!({ "mnemonic": "not a real phrase" }),
        )
        .await;
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Error: Wallet error"));
    }
}
