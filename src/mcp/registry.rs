//! # Tool Registry
//!
//! The static catalog of every tool this server exposes. `tools/list` renders
//! its JSON Schema from this table and the dispatcher validates arguments
//! against the same entries, so a parameter is declared exactly once.

use lazy_static::lazy_static;
use serde_json::{json, Map, Value};

/// Structural type of one parameter.
#[derive(Debug, Clone, Copy)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    /// Any JSON object, passed through untouched.
    AnyObject,
    Object(&'static [Param]),
    Array(&'static ParamKind),
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Str(s) => json!(s),
            DefaultValue::Int(n) => json!(n),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
    pub default: Option<DefaultValue>,
}

#[derive(Debug)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
}

const fn req(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        description,
        required: true,
        default: None,
    }
}

const fn opt(name: &'static str, kind: ParamKind, description: &'static str) -> Param {
    Param {
        name,
        kind,
        description,
        required: false,
        default: None,
    }
}

const fn def(
    name: &'static str,
    kind: ParamKind,
    default: DefaultValue,
    description: &'static str,
) -> Param {
    Param {
        name,
        kind,
        description,
        required: false,
        default: Some(default),
    }
}

use ParamKind::{AnyObject, Array, Boolean, Enum, Integer, Object, String as Str};

const ASSET_TYPES: &[&str] = &["native", "cw20"];

const COIN: &[Param] = &[
    req("denom", Str, "Token denomination"),
    req("amount", Str, "Integer amount"),
];

const PRICE: &[Param] = &[
    req("amount", Str, "Integer amount"),
    req("denom", Str, "Token denomination"),
];

const SALE_ASSET: &[Param] = &[
    req("type", Enum(ASSET_TYPES), "Asset kind"),
    req("value", Str, "Native denom or CW20 contract address"),
];

const PURCHASE_ASSET: &[Param] = &[
    req("type", Enum(ASSET_TYPES), "Asset kind"),
    opt("address", Str, "CW20 contract address (cw20 purchases)"),
    req("amount", Str, "Amount to pay"),
    opt("denom", Str, "Native denom (native purchases)"),
];

const APP_COMPONENT: &[Param] = &[
    req("name", Str, "Component name"),
    req("ado_type", Str, "ADO type of the component"),
    req("component_type", AnyObject, "Component definition, usually {\"new\": <instantiate msg>}"),
];

const SPLITTER_RECIPIENT: &[Param] = &[
    req("address", Str, "Recipient address"),
    req("percent", Str, "Share of each payment, as a decimal string"),
];

/// Every tool, in the order `tools/list` reports them.
pub static TOOLS: &[ToolSpec] = &[
    // --- Chain ---
    ToolSpec {
        name: "get_chain_info",
        description: "Get basic information about the Andromeda blockchain",
        params: &[],
    },
    ToolSpec {
        name: "get_block_info",
        description: "Get information about a specific block or the latest block",
        params: &[opt("height", Integer, "Block height to query (latest if not specified)")],
    },
    ToolSpec {
        name: "get_transaction",
        description: "Get details of a specific transaction by hash",
        params: &[req("txHash", Str, "Transaction hash to query")],
    },
    ToolSpec {
        name: "get_account_info",
        description: "Get account information for an Andromeda address",
        params: &[req("address", Str, "Andromeda address to query")],
    },
    ToolSpec {
        name: "get_account_balance",
        description: "Get token balances for an Andromeda address",
        params: &[req("address", Str, "Andromeda address to query")],
    },
    ToolSpec {
        name: "get_validators",
        description: "Get list of active validators on Andromeda",
        params: &[],
    },
    ToolSpec {
        name: "get_recent_transactions",
        description: "Get recent transactions on the Andromeda blockchain",
        params: &[def(
            "limit",
            Integer,
            DefaultValue::Int(50),
            "Maximum number of transactions to return",
        )],
    },
    ToolSpec {
        name: "get_contract_info",
        description: "Get information about a CosmWasm smart contract",
        params: &[req("contractAddress", Str, "Contract address to query")],
    },
    ToolSpec {
        name: "get_code_info",
        description: "Get information about a CosmWasm code",
        params: &[req("codeId", Integer, "Code ID to query")],
    },
    ToolSpec {
        name: "get_contracts",
        description: "Get all contracts for a specific code ID",
        params: &[req("codeId", Integer, "Code ID to query contracts for")],
    },
    // --- Generic ADO ---
    ToolSpec {
        name: "query_ado",
        description: "Query an Andromeda Digital Object (ADO) smart contract",
        params: &[
            req("contractAddress", Str, "ADO contract address"),
            req("query", AnyObject, "Query message to send to the ADO"),
        ],
    },
    ToolSpec {
        name: "execute_ado",
        description: "Execute a transaction on an Andromeda Digital Object (ADO)",
        params: &[
            req("contractAddress", Str, "ADO contract address"),
            req("msg", AnyObject, "Execute message to send to ADO"),
            opt("funds", Array(&Object(COIN)), "Funds to send with execution"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
            opt("gas", Integer, "Gas limit (default: auto)"),
        ],
    },
    // --- Bank / wallet ---
    ToolSpec {
        name: "transfer_tokens",
        description: "Transfer tokens between Andromeda addresses",
        params: &[
            req("recipient", Str, "Recipient address"),
            req("amount", Str, "Amount to transfer"),
            def("denom", Str, DefaultValue::Str("uandr"), "Token denomination"),
            req("mnemonic", Str, "Sender wallet mnemonic"),
            opt("memo", Str, "Transaction memo"),
        ],
    },
    ToolSpec {
        name: "generate_wallet",
        description: "Generate a new Andromeda wallet with mnemonic phrase",
        params: &[],
    },
    ToolSpec {
        name: "get_wallet_address",
        description: "Get address from mnemonic phrase",
        params: &[req("mnemonic", Str, "BIP-39 mnemonic phrase")],
    },
    // --- ADO database ---
    ToolSpec {
        name: "query_adodb",
        description: "Query the ADO Database for available ADO types",
        params: &[
            opt("adoType", Str, "ADO type to query"),
            opt("startAfter", Str, "Pagination start after"),
        ],
    },
    ToolSpec {
        name: "get_ado_code_id",
        description: "Get code ID for specific ADO type and version",
        params: &[
            req("adoType", Str, "ADO type to get code ID for"),
            opt("version", Str, "Specific version (latest if not specified)"),
        ],
    },
    ToolSpec {
        name: "list_ado_versions",
        description: "List all versions of a specific ADO type",
        params: &[req("adoType", Str, "ADO type to list versions for")],
    },
    ToolSpec {
        name: "publish_ado",
        description: "Publish ADO code to ADODB (ADO Database)",
        params: &[
            req("codeId", Integer, "Code ID to publish"),
            req("adoType", Str, "ADO type name"),
            req("version", Str, "Version number"),
            req("mnemonic", Str, "Publisher wallet mnemonic"),
        ],
    },
    // --- GraphQL ---
    ToolSpec {
        name: "graphql_query",
        description: "Execute GraphQL queries against Andromeda indexer",
        params: &[
            req("query", Str, "GraphQL query string"),
            opt("variables", AnyObject, "GraphQL variables"),
        ],
    },
    ToolSpec {
        name: "subscribe_ado_events",
        description: "Subscribe to real-time ADO events (queries recent events via GraphQL)",
        params: &[req("contractAddress", Str, "ADO contract address to monitor events for")],
    },
    // --- Apps ---
    ToolSpec {
        name: "create_app",
        description: "Create Andromeda Apps by composing multiple ADOs",
        params: &[
            req("name", Str, "Name of the App"),
            req("components", Array(&Object(APP_COMPONENT)), "ADO components to include in the App"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
        ],
    },
    ToolSpec {
        name: "get_app_info",
        description: "Query information about deployed Apps",
        params: &[req("appAddress", Str, "App contract address")],
    },
    ToolSpec {
        name: "list_app_components",
        description: "List all ADOs within an App",
        params: &[req("appAddress", Str, "App contract address")],
    },
    ToolSpec {
        name: "update_app_config",
        description: "Update App configuration and component connections",
        params: &[
            req("appAddress", Str, "App contract address"),
            req("updates", AnyObject, "Configuration updates"),
            req("mnemonic", Str, "Admin wallet mnemonic"),
        ],
    },
    // --- Lifecycle ---
    ToolSpec {
        name: "deploy_ado",
        description: "Deploy new ADO instances from code IDs",
        params: &[
            req("adoType", Str, "Type of ADO to deploy"),
            req("name", Str, "Name for the ADO instance"),
            req("instantiateMsg", AnyObject, "Instantiation message"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
            opt("codeId", Integer, "Code ID (will fetch from ADODB if not provided)"),
        ],
    },
    ToolSpec {
        name: "instantiate_ado",
        description: "Instantiate ADO contracts with custom configurations",
        params: &[
            req("codeId", Integer, "Code ID to instantiate"),
            req("instantiateMsg", AnyObject, "Instantiation message"),
            req("label", Str, "Contract label"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
        ],
    },
    ToolSpec {
        name: "migrate_ado",
        description: "Migrate ADOs to newer versions",
        params: &[
            req("contractAddress", Str, "ADO contract address to migrate"),
            req("newCodeId", Integer, "New code ID to migrate to"),
            req("migrateMsg", AnyObject, "Migration message"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
        ],
    },
    // --- CW20 / CW721 ---
    ToolSpec {
        name: "cw20_mint",
        description: "Mint CW20 tokens (for CW20 ADOs)",
        params: &[
            req("contractAddress", Str, "CW20 contract address"),
            req("recipient", Str, "Recipient address"),
            req("amount", Str, "Amount to mint"),
            req("mnemonic", Str, "Minter wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "cw20_burn",
        description: "Burn CW20 tokens",
        params: &[
            req("contractAddress", Str, "CW20 contract address"),
            req("amount", Str, "Amount to burn"),
            req("mnemonic", Str, "Token holder wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "cw721_mint_nft",
        description: "Mint NFTs (for CW721 ADOs)",
        params: &[
            req("contractAddress", Str, "CW721 contract address"),
            req("tokenId", Str, "NFT token ID"),
            req("owner", Str, "NFT owner address"),
            req("mnemonic", Str, "Minter wallet mnemonic"),
            opt("tokenUri", Str, "Token metadata URI (should point to JSON metadata)"),
            opt(
                "extension",
                AnyObject,
                "Extension metadata (IGNORED - safe extension used automatically)",
            ),
        ],
    },
    // --- Marketplace / auction / splitter ---
    ToolSpec {
        name: "marketplace_list_item",
        description: "List items on marketplace ADO",
        params: &[
            req("marketplaceAddress", Str, "Marketplace contract address"),
            req("nftContract", Str, "NFT contract address"),
            req("tokenId", Str, "NFT token ID"),
            req("price", Object(PRICE), "Listing price"),
            req("mnemonic", Str, "Seller wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "auction_place_bid",
        description: "Place bids on auction ADO",
        params: &[
            req("auctionAddress", Str, "Auction contract address"),
            req("amount", Str, "Bid amount"),
            def("denom", Str, DefaultValue::Str("uandr"), "Token denomination"),
            req("mnemonic", Str, "Bidder wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "splitter_update_recipients",
        description: "Update splitter ADO recipients",
        params: &[
            req("splitterAddress", Str, "Splitter contract address"),
            req(
                "recipients",
                Array(&Object(SPLITTER_RECIPIENT)),
                "New recipient configuration",
            ),
            req("mnemonic", Str, "Admin wallet mnemonic"),
        ],
    },
    // --- CW20 exchange ---
    ToolSpec {
        name: "deploy_cw20_exchange",
        description: "Deploy a CW20 Exchange ADO for token trading",
        params: &[
            req("tokenAddress", Str, "CW20 token contract address to create exchange for"),
            req("name", Str, "Name for the CW20 Exchange instance"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
        ],
    },
    ToolSpec {
        name: "start_cw20_sale",
        description: "Start a sale on a CW20 Exchange",
        params: &[
            req("exchangeAddress", Str, "CW20 Exchange contract address"),
            req("tokenAddress", Str, "CW20 token contract address"),
            req("amount", Str, "Amount of tokens to put up for sale"),
            req("asset", Object(SALE_ASSET), "Asset that can be used to purchase the tokens"),
            req("exchangeRate", Str, "Amount of purchasing asset required for one token"),
            req("mnemonic", Str, "Seller wallet mnemonic"),
            opt("recipient", Str, "Recipient of sale proceeds (defaults to sender)"),
            opt("startTime", Integer, "Sale start time in milliseconds"),
            opt("duration", Integer, "Sale duration in milliseconds"),
        ],
    },
    ToolSpec {
        name: "purchase_cw20_tokens",
        description: "Purchase CW20 tokens from an exchange",
        params: &[
            req("exchangeAddress", Str, "CW20 Exchange contract address"),
            req("purchaseAsset", Object(PURCHASE_ASSET), "Asset to use for purchasing tokens"),
            req("mnemonic", Str, "Buyer wallet mnemonic"),
            opt("recipient", Str, "Recipient of purchased tokens (defaults to sender)"),
        ],
    },
    ToolSpec {
        name: "cancel_cw20_sale",
        description: "Cancel an active CW20 sale on an exchange",
        params: &[
            req("exchangeAddress", Str, "CW20 Exchange contract address"),
            req("asset", Object(SALE_ASSET), "Asset of the sale to cancel"),
            req("mnemonic", Str, "Exchange owner wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "query_cw20_sale",
        description: "Query information about a CW20 sale",
        params: &[
            req("exchangeAddress", Str, "CW20 Exchange contract address"),
            req("asset", Object(SALE_ASSET), "Asset of the sale to query"),
        ],
    },
    // --- Auction ---
    ToolSpec {
        name: "deploy_auction",
        description: "Deploy an Auction ADO for NFT auctions",
        params: &[
            req("name", Str, "Name for the Auction instance"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
            opt(
                "authorizedTokenAddresses",
                Array(&Str),
                "Authorized NFT contract addresses",
            ),
            opt("authorizedCw20Address", Str, "Authorized CW20 payment token address"),
        ],
    },
    ToolSpec {
        name: "start_auction",
        description: "Start an NFT auction",
        params: &[
            req("auctionAddress", Str, "Auction contract address"),
            req("tokenId", Str, "NFT token ID to auction"),
            req("tokenAddress", Str, "NFT contract address"),
            req("duration", Integer, "Auction duration in milliseconds"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
            opt("startTime", Integer, "Auction start time (milliseconds since epoch)"),
            def("coinDenom", Str, DefaultValue::Str("uandr"), "Denomination for bids"),
            opt("startingBid", Str, "Minimum starting bid amount"),
            opt("recipient", Str, "Recipient of auction proceeds"),
        ],
    },
    ToolSpec {
        name: "place_auction_bid",
        description: "Place a bid on an NFT auction",
        params: &[
            req("auctionAddress", Str, "Auction contract address"),
            req("tokenId", Str, "NFT token ID being auctioned"),
            req("tokenAddress", Str, "NFT contract address"),
            req("bidAmount", Str, "Bid amount"),
            def("denom", Str, DefaultValue::Str("uandr"), "Token denomination"),
            req("mnemonic", Str, "Bidder wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "finalize_auction",
        description: "Finalize an auction and claim NFT/proceeds",
        params: &[
            req("auctionAddress", Str, "Auction contract address"),
            req("tokenId", Str, "NFT token ID being auctioned"),
            req("tokenAddress", Str, "NFT contract address"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
        ],
    },
    // --- CW20 staking ---
    ToolSpec {
        name: "deploy_cw20_staking",
        description: "Deploy a CW20-Staking ADO for DeFi reward pools",
        params: &[
            req("name", Str, "Name for the CW20-Staking instance"),
            req("stakingToken", Str, "CW20 token contract address for staking"),
            req("rewardToken", Str, "CW20 token contract address for rewards"),
            req("rewardAllocation", Str, "Reward allocation for the reward token"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
            opt("unbondingPeriod", Integer, "Unbonding period in seconds (optional)"),
        ],
    },
    ToolSpec {
        name: "stake_cw20_tokens",
        description: "Stake CW20 tokens in a DeFi reward pool",
        params: &[
            req("stakingAddress", Str, "CW20-Staking contract address"),
            req("tokenAddress", Str, "CW20 token contract address to stake"),
            req("amount", Str, "Amount of tokens to stake"),
            req("mnemonic", Str, "Staker wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "unstake_cw20_tokens",
        description: "Unstake CW20 tokens from a DeFi reward pool",
        params: &[
            req("stakingAddress", Str, "CW20-Staking contract address"),
            req("amount", Str, "Amount of tokens to unstake"),
            req("mnemonic", Str, "Staker wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "claim_staking_rewards",
        description: "Claim accumulated rewards from CW20 staking",
        params: &[
            req("stakingAddress", Str, "CW20-Staking contract address"),
            req("mnemonic", Str, "Staker wallet mnemonic"),
        ],
    },
    // --- Merkle airdrop ---
    ToolSpec {
        name: "deploy_merkle_airdrop",
        description: "Deploy a Merkle Airdrop ADO for community token distribution",
        params: &[
            req("name", Str, "Name for the Merkle Airdrop instance"),
            req("asset", Object(SALE_ASSET), "Asset to distribute in the airdrop"),
            req("merkleRoot", Str, "Merkle root hash for the airdrop tree"),
            req("totalAmount", Str, "Total amount to distribute"),
            req("mnemonic", Str, "Wallet mnemonic for signing transaction"),
            opt("startTime", Integer, "Airdrop start time in milliseconds"),
            opt("endTime", Integer, "Airdrop end time in milliseconds"),
        ],
    },
    ToolSpec {
        name: "claim_airdrop_tokens",
        description: "Claim tokens from a Merkle Airdrop",
        params: &[
            req("airdropAddress", Str, "Merkle Airdrop contract address"),
            req("amount", Str, "Amount to claim"),
            req("proof", Array(&Str), "Merkle proof for the claim"),
            req("mnemonic", Str, "Claimer wallet mnemonic"),
        ],
    },
    ToolSpec {
        name: "query_airdrop_claim",
        description: "Query airdrop claim status for an address",
        params: &[
            req("airdropAddress", Str, "Merkle Airdrop contract address"),
            req("address", Str, "Address to check claim status for"),
        ],
    },
];

fn kind_schema(kind: &ParamKind) -> Value {
    match kind {
        ParamKind::String => json!({ "type": "string" }),
        ParamKind::Number => json!({ "type": "number" }),
        Integer => json!({ "type": "integer" }),
        Boolean => json!({ "type": "boolean" }),
        AnyObject => json!({ "type": "object" }),
        Object(fields) => object_schema(fields),
        Array(item) => json!({ "type": "array", "items": kind_schema(item) }),
        Enum(values) => json!({ "type": "string", "enum": values }),
    }
}

fn object_schema(params: &[Param]) -> Value {
    let mut properties = Map::new();
    for param in params {
        let mut schema = kind_schema(&param.kind);
        if let Value::Object(map) = &mut schema {
            map.insert("description".into(), json!(param.description));
            if let Some(default) = param.default {
                map.insert("default".into(), default.to_value());
            }
        }
        properties.insert(param.name.to_string(), schema);
    }
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

impl ToolSpec {
    pub fn input_schema(&self) -> Value {
        object_schema(self.params)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().filter(|p| p.required).map(|p| p.name)
    }
}

lazy_static! {
    /// `tools/list` result, rendered once.
    static ref TOOL_LIST: Value = json!({
        "tools": TOOLS
            .iter()
            .map(|tool| json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema(),
            }))
            .collect::<Vec<_>>()
    });
}

pub fn tool_list() -> &'static Value {
    &TOOL_LIST
}

pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|tool| tool.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_tool_is_listed_once() {
        let names: Vec<&str> = TOOLS.iter().map(|t| t.name).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), 50);
        assert_eq!(unique.len(), names.len());

        let listed = tool_list()["tools"].as_array().unwrap();
        assert_eq!(listed.len(), TOOLS.len());
        for tool in TOOLS {
            let matches = listed.iter().filter(|t| t["name"] == tool.name).count();
            assert_eq!(matches, 1, "{} listed {} times", tool.name, matches);
        }
    }

    #[test]
    fn schema_carries_required_fields_and_defaults() {
        let schema = find("transfer_tokens").unwrap().input_schema();
        assert_eq!(
            schema["required"],
            json!(["recipient", "amount", "mnemonic"])
        );
        assert_eq!(schema["properties"]["denom"]["default"], "uandr");
        assert_eq!(schema["properties"]["memo"]["type"], "string");
    }

    #[test]
    fn nested_schemas_render_recursively() {
        let schema = find("start_cw20_sale").unwrap().input_schema();
        let asset = &schema["properties"]["asset"];
        assert_eq!(asset["type"], "object");
        assert_eq!(asset["required"], json!(["type", "value"]));
        assert_eq!(asset["properties"]["type"]["enum"], json!(["native", "cw20"]));

        let funds = &find("execute_ado").unwrap().input_schema()["properties"]["funds"];
        assert_eq!(funds["type"], "array");
        assert_eq!(funds["items"]["required"], json!(["denom", "amount"]));
    }

    #[test]
    fn unknown_names_are_not_found() {
        assert!(find("get_chain_info").is_some());
        assert!(find("get_balance").is_none());
    }
}
