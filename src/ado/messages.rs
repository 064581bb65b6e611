//! Message shapes for the ADO families this server talks to.
//!
//! Each enum serializes to the externally tagged snake_case JSON the
//! contracts expect, e.g. `Cw20ExecuteMsg::Burn { amount }` becomes
//! `{"burn":{"amount":"..."}}`. Generic `query_ado`/`execute_ado` calls keep
//! using raw `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Asset reference used by exchanges and airdrops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Native(String),
    Cw20(String),
}

/// Point in time, in milliseconds since the epoch, as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiry {
    AtTime(String),
}

impl Expiry {
    pub fn at_millis(ms: u64) -> Self {
        Expiry::AtTime(ms.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AndrAddr {
    pub address: String,
}

// --- CW20 ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw20ExecuteMsg {
    Mint { recipient: String, amount: String },
    Burn { amount: String },
    /// `msg` is a base64 encoded hook for the receiving contract.
    Send { contract: String, amount: String, msg: String },
}

/// Hooks a CW20 `send` delivers to exchange and staking contracts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw20HookMsg {
    StartSale {
        asset: Asset,
        exchange_rate: String,
        recipient: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_time: Option<Expiry>,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration: Option<String>,
    },
    Purchase {
        recipient: String,
    },
    StakeTokens {},
}

// --- CW721 ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MintExtension {
    pub publisher: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw721ExecuteMsg {
    Mint {
        token_id: String,
        owner: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        token_uri: Option<String>,
        extension: MintExtension,
    },
    Approve {
        spender: String,
        token_id: String,
    },
    SendNft {
        contract: String,
        token_id: String,
        msg: String,
    },
}

/// Hooks a CW721 `send_nft` delivers to marketplace and auction contracts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw721HookMsg {
    StartSale {
        price: String,
        coin_denom: String,
    },
    StartAuction {
        end_time: u64,
        uses_cw20: bool,
        coin_denom: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        min_bid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        recipient: Option<AndrAddr>,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_time: Option<u64>,
    },
}

// --- Auction ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionExecuteMsg {
    PlaceBid {
        #[serde(skip_serializing_if = "Option::is_none")]
        token_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        token_address: Option<String>,
    },
    Claim {
        token_id: String,
        token_address: String,
    },
}

// --- CW20 exchange ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeExecuteMsg {
    Purchase { recipient: String },
    CancelSale { asset: Asset },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeQueryMsg {
    Sale { asset: Asset },
}

// --- CW20 staking ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StakingExecuteMsg {
    UnstakeTokens { amount: String },
    ClaimRewards {},
}

// --- Merkle airdrop ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AirdropExecuteMsg {
    RegisterMerkleRoot {
        merkle_root: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        expiration: Option<Expiry>,
        total_amount: String,
    },
    Claim {
        amount: String,
        proof: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AirdropQueryMsg {
    IsClaimed { address: String },
}

// --- Splitter ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitterRecipient {
    pub recipient: AndrAddr,
    pub percent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitterExecuteMsg {
    UpdateRecipients { recipients: Vec<SplitterRecipient> },
}

// --- App ---

/// One ADO inside an App, as the caller describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppComponent {
    pub name: String,
    pub ado_type: String,
    /// Usually `{"new": <instantiate msg>}`.
    pub component_type: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppQueryMsg {
    GetComponents {},
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppExecuteMsg {
    UpdateAppConfig(Value),
}

// --- Kernel and ADODB ---

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelQueryMsg {
    KeyAddress { key: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdodbQueryMsg {
    AdoVersions {
        ado_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        start_after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
    AllAdoTypes {
        #[serde(skip_serializing_if = "Option::is_none")]
        start_after: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        limit: Option<u32>,
    },
    CodeId {
        key: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdodbExecuteMsg {
    Publish {
        code_id: u64,
        ado_type: String,
        version: String,
        action_fees: Option<Value>,
        publisher: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_struct_variants_serialize_as_empty_objects() {
        assert_eq!(
            serde_json::to_value(Cw20HookMsg::StakeTokens {}).unwrap(),
            json!({"stake_tokens": {}})
        );
        assert_eq!(
            serde_json::to_value(AuctionExecuteMsg::PlaceBid {
                token_id: None,
                token_address: None
            })
            .unwrap(),
            json!({"place_bid": {}})
        );
    }

    #[test]
    fn sale_hook_carries_optional_timing() {
        let hook = Cw20HookMsg::StartSale {
            asset: Asset::Native("uandr".into()),
            exchange_rate: "10".into(),
            recipient: "andr1seller".into(),
            start_time: Some(Expiry::at_millis(1_700_000_000_000)),
            duration: None,
        };
        assert_eq!(
            serde_json::to_value(hook).unwrap(),
            json!({"start_sale": {
                "asset": {"native": "uandr"},
                "exchange_rate": "10",
                "recipient": "andr1seller",
                "start_time": {"at_time": "1700000000000"}
            }})
        );
    }

    #[test]
    fn publish_sends_explicit_nulls() {
        let msg = AdodbExecuteMsg::Publish {
            code_id: 13,
            ado_type: "cw721".into(),
            version: "2.0.0".into(),
            action_fees: None,
            publisher: None,
        };
        assert_eq!(
            serde_json::to_value(msg).unwrap(),
            json!({"publish": {
                "code_id": 13, "ado_type": "cw721", "version": "2.0.0",
                "action_fees": null, "publisher": null
            }})
        );
    }

    #[test]
    fn app_config_update_wraps_caller_payload() {
        let msg = AppExecuteMsg::UpdateAppConfig(json!({"name": "x"}));
        assert_eq!(
            serde_json::to_value(msg).unwrap(),
            json!({"update_app_config": {"name": "x"}})
        );
    }
}
