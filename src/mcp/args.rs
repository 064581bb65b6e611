// src/mcp/args.rs
//
// Typed argument structs, one per tool that takes arguments. They are
// deserialized from the schema-validated bag, so defaults are already in
// place; `validator` rules catch what a JSON Schema cannot express.

use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::ado::messages::{AppComponent, Asset};
use crate::blockchain::error::AdapterError;
use crate::blockchain::models::Coin;

const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// `andr1` followed by bech32 data characters.
pub fn validate_andr_address(address: &str) -> Result<(), ValidationError> {
    let data = address
        .strip_prefix("andr1")
        .ok_or_else(|| ValidationError::new("andr_address"))?;
    let well_formed = (39..=90).contains(&address.len())
        && data.chars().all(|c| BECH32_CHARSET.contains(c));
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("andr_address"))
    }
}

/// Unsigned integer amount as the chain expects it.
pub fn validate_amount(amount: &str) -> Result<(), ValidationError> {
    if !amount.is_empty() && amount.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("integer_amount"))
    }
}

fn describe(errors: &ValidationErrors) -> String {
    let mut problems: Vec<String> = errors
        .errors()
        .iter()
        .map(|(field, kind)| match kind {
            validator::ValidationErrorsKind::Field(errs) => {
                let codes: Vec<&str> = errs.iter().map(|e| e.code.as_ref()).collect();
                format!("{} ({})", field, codes.join(", "))
            }
            validator::ValidationErrorsKind::Struct(inner) => {
                format!("{}: {}", field, describe(inner))
            }
            validator::ValidationErrorsKind::List(items) => items
                .iter()
                .map(|(i, inner)| format!("{}[{}]: {}", field, i, describe(inner)))
                .collect::<Vec<_>>()
                .join("; "),
        })
        .collect();
    problems.sort();
    problems.join("; ")
}

/// Deserializes and validates the argument struct for one tool.
pub fn parse<T: DeserializeOwned + Validate>(args: Value) -> Result<T, AdapterError> {
    let parsed: T = serde_json::from_value(args)
        .map_err(|e| AdapterError::Validation(e.to_string()))?;
    parsed
        .validate()
        .map_err(|e| AdapterError::Validation(describe(&e)))?;
    Ok(parsed)
}

// --- Shared pieces ---

#[derive(Debug, Deserialize, Validate)]
pub struct CoinArg {
    #[validate(length(min = 1))]
    pub denom: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
}

impl From<CoinArg> for Coin {
    fn from(arg: CoinArg) -> Self {
        Coin::new(arg.amount, arg.denom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Native,
    Cw20,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssetArg {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[validate(length(min = 1))]
    pub value: String,
}

impl From<AssetArg> for Asset {
    fn from(arg: AssetArg) -> Self {
        match arg.kind {
            AssetKind::Native => Asset::Native(arg.value),
            AssetKind::Cw20 => Asset::Cw20(arg.value),
        }
    }
}

// --- Chain ---

#[derive(Debug, Deserialize, Validate)]
pub struct BlockArgs {
    pub height: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TxHashArgs {
    #[validate(length(min = 1))]
    pub tx_hash: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddressArgs {
    #[validate(custom = "validate_andr_address")]
    pub address: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecentTransactionsArgs {
    #[validate(range(min = 1, max = 1000))]
    pub limit: usize,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContractArgs {
    #[validate(length(min = 1))]
    pub contract_address: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CodeIdArgs {
    #[validate(range(min = 1))]
    pub code_id: u64,
}

// --- Generic ADO ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryAdoArgs {
    #[validate(length(min = 1))]
    pub contract_address: String,
    pub query: Value,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteAdoArgs {
    #[validate(length(min = 1))]
    pub contract_address: String,
    pub msg: Value,
    #[serde(default)]
    #[validate]
    pub funds: Vec<CoinArg>,
    pub mnemonic: SecretString,
    #[validate(range(min = 1))]
    pub gas: Option<u64>,
}

// --- Bank / wallet ---

#[derive(Debug, Deserialize, Validate)]
pub struct TransferArgs {
    #[validate(custom = "validate_andr_address")]
    pub recipient: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    #[validate(length(min = 1))]
    pub denom: String,
    pub mnemonic: SecretString,
    pub memo: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct MnemonicArgs {
    pub mnemonic: SecretString,
}

// --- ADO database ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryAdodbArgs {
    #[validate(length(min = 1))]
    pub ado_type: Option<String>,
    pub start_after: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdoCodeIdArgs {
    #[validate(length(min = 1))]
    pub ado_type: String,
    pub version: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdoTypeArgs {
    #[validate(length(min = 1))]
    pub ado_type: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PublishAdoArgs {
    #[validate(range(min = 1))]
    pub code_id: u64,
    #[validate(length(min = 1))]
    pub ado_type: String,
    #[validate(length(min = 1))]
    pub version: String,
    pub mnemonic: SecretString,
}

// --- GraphQL ---

#[derive(Debug, Deserialize, Validate)]
pub struct GraphqlArgs {
    #[validate(length(min = 1))]
    pub query: String,
    pub variables: Option<Value>,
}

// --- Apps ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppArgs {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub components: Vec<AppComponent>,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppArgs {
    #[validate(length(min = 1))]
    pub app_address: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppConfigArgs {
    #[validate(length(min = 1))]
    pub app_address: String,
    pub updates: Value,
    pub mnemonic: SecretString,
}

// --- Lifecycle ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployAdoArgs {
    #[validate(length(min = 1))]
    pub ado_type: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub instantiate_msg: Value,
    pub mnemonic: SecretString,
    #[validate(range(min = 1))]
    pub code_id: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateAdoArgs {
    #[validate(range(min = 1))]
    pub code_id: u64,
    pub instantiate_msg: Value,
    #[validate(length(min = 1))]
    pub label: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MigrateAdoArgs {
    #[validate(length(min = 1))]
    pub contract_address: String,
    #[validate(range(min = 1))]
    pub new_code_id: u64,
    pub migrate_msg: Value,
    pub mnemonic: SecretString,
}

// --- CW20 / CW721 ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Cw20MintArgs {
    #[validate(length(min = 1))]
    pub contract_address: String,
    #[validate(custom = "validate_andr_address")]
    pub recipient: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Cw20BurnArgs {
    #[validate(length(min = 1))]
    pub contract_address: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Cw721MintArgs {
    #[validate(length(min = 1))]
    pub contract_address: String,
    #[validate(length(min = 1))]
    pub token_id: String,
    #[validate(custom = "validate_andr_address")]
    pub owner: String,
    pub mnemonic: SecretString,
    pub token_uri: Option<String>,
}

// --- Marketplace / auction / splitter ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceListArgs {
    #[validate(length(min = 1))]
    pub marketplace_address: String,
    #[validate(length(min = 1))]
    pub nft_contract: String,
    #[validate(length(min = 1))]
    pub token_id: String,
    #[validate]
    pub price: CoinArg,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AuctionBidArgs {
    #[validate(length(min = 1))]
    pub auction_address: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    #[validate(length(min = 1))]
    pub denom: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecipientArg {
    #[validate(custom = "validate_andr_address")]
    pub address: String,
    #[validate(length(min = 1))]
    pub percent: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SplitterUpdateArgs {
    #[validate(length(min = 1))]
    pub splitter_address: String,
    #[validate]
    pub recipients: Vec<RecipientArg>,
    pub mnemonic: SecretString,
}

// --- CW20 exchange ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployExchangeArgs {
    #[validate(length(min = 1))]
    pub token_address: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartSaleArgs {
    #[validate(length(min = 1))]
    pub exchange_address: String,
    #[validate(length(min = 1))]
    pub token_address: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    #[validate]
    pub asset: AssetArg,
    #[validate(length(min = 1))]
    pub exchange_rate: String,
    pub mnemonic: SecretString,
    pub recipient: Option<String>,
    pub start_time: Option<u64>,
    #[validate(range(min = 1))]
    pub duration: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseAssetArg {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub address: Option<String>,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    pub denom: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseArgs {
    #[validate(length(min = 1))]
    pub exchange_address: String,
    #[validate]
    pub purchase_asset: PurchaseAssetArg,
    pub mnemonic: SecretString,
    pub recipient: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaleAssetArgs {
    #[validate(length(min = 1))]
    pub exchange_address: String,
    #[validate]
    pub asset: AssetArg,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CancelSaleArgs {
    #[validate(length(min = 1))]
    pub exchange_address: String,
    #[validate]
    pub asset: AssetArg,
    pub mnemonic: SecretString,
}

// --- Auction ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployAuctionArgs {
    #[validate(length(min = 1))]
    pub name: String,
    pub mnemonic: SecretString,
    pub authorized_token_addresses: Option<Vec<String>>,
    pub authorized_cw20_address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartAuctionArgs {
    #[validate(length(min = 1))]
    pub auction_address: String,
    #[validate(length(min = 1))]
    pub token_id: String,
    #[validate(length(min = 1))]
    pub token_address: String,
    #[validate(range(min = 1))]
    pub duration: u64,
    pub mnemonic: SecretString,
    pub start_time: Option<u64>,
    #[validate(length(min = 1))]
    pub coin_denom: String,
    #[validate(custom = "validate_amount")]
    pub starting_bid: Option<String>,
    pub recipient: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PlaceAuctionBidArgs {
    #[validate(length(min = 1))]
    pub auction_address: String,
    #[validate(length(min = 1))]
    pub token_id: String,
    #[validate(length(min = 1))]
    pub token_address: String,
    #[validate(custom = "validate_amount")]
    pub bid_amount: String,
    #[validate(length(min = 1))]
    pub denom: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeAuctionArgs {
    #[validate(length(min = 1))]
    pub auction_address: String,
    #[validate(length(min = 1))]
    pub token_id: String,
    #[validate(length(min = 1))]
    pub token_address: String,
    pub mnemonic: SecretString,
}

// --- CW20 staking ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployStakingArgs {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub staking_token: String,
    #[validate(length(min = 1))]
    pub reward_token: String,
    #[validate(length(min = 1))]
    pub reward_allocation: String,
    pub mnemonic: SecretString,
    pub unbonding_period: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StakeArgs {
    #[validate(length(min = 1))]
    pub staking_address: String,
    #[validate(length(min = 1))]
    pub token_address: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnstakeArgs {
    #[validate(length(min = 1))]
    pub staking_address: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRewardsArgs {
    #[validate(length(min = 1))]
    pub staking_address: String,
    pub mnemonic: SecretString,
}

// --- Merkle airdrop ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeployAirdropArgs {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate]
    pub asset: AssetArg,
    #[validate(length(min = 1))]
    pub merkle_root: String,
    #[validate(custom = "validate_amount")]
    pub total_amount: String,
    pub mnemonic: SecretString,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAirdropArgs {
    #[validate(length(min = 1))]
    pub airdrop_address: String,
    #[validate(custom = "validate_amount")]
    pub amount: String,
    #[validate(length(min = 1))]
    pub proof: Vec<String>,
    pub mnemonic: SecretString,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AirdropClaimQueryArgs {
    #[validate(length(min = 1))]
    pub airdrop_address: String,
    #[validate(custom = "validate_andr_address")]
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serde_json::json;

    const ADDRESS: &str = "andr19rl4cm2hmr8afy4kldpxz3fka4jguq0ayt9lrc";

    #[test]
    fn address_shape() {
        assert!(validate_andr_address(ADDRESS).is_ok());
        assert!(validate_andr_address("andr1short").is_err());
        assert!(validate_andr_address("cosmos19rl4cm2hmr8afy4kldpxz3fka4jguq0ayt9lrc").is_err());
        // 'b' is outside the bech32 alphabet
        assert!(validate_andr_address("andr1brl4cm2hmr8afy4kldpxz3fka4jguq0ayt9lrc").is_err());
    }

    #[test]
    fn amounts_are_unsigned_integers() {
        assert!(validate_amount("1000").is_ok());
        assert!(validate_amount("").is_err());
        assert!(validate_amount("1.5").is_err());
        assert!(validate_amount("-3").is_err());
    }

    #[test]
    fn parses_camel_case_and_keeps_the_mnemonic_secret() {
        let args: TransferArgs = parse(json!({
            "recipient": ADDRESS,
            "amount": "10",
            "denom": "uandr",
            "mnemonic": "word list",
        }))
        .unwrap();
        assert_eq!(args.mnemonic.expose_secret(), "word list");
        assert!(!format!("{:?}", args).contains("word list"));
    }

    #[test]
    fn nested_rules_are_reported_by_field() {
        let err = parse::<MarketplaceListArgs>(json!({
            "marketplaceAddress": "andr1market",
            "nftContract": "andr1nft",
            "tokenId": "1",
            "price": {"amount": "ten", "denom": "uandr"},
            "mnemonic": "m",
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid arguments: price: amount (integer_amount)");

        let err = parse::<ClaimAirdropArgs>(json!({
            "airdropAddress": "andr1drop", "amount": "1", "proof": [], "mnemonic": "m"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("proof (length)"));
    }

    #[test]
    fn asset_argument_maps_to_tagged_asset() {
        let arg: AssetArg = serde_json::from_value(json!({"type": "cw20", "value": "andr1pay"})).unwrap();
        assert_eq!(Asset::from(arg), Asset::Cw20("andr1pay".into()));
    }
}
