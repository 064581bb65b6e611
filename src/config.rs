// src/config.rs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use url::Url;

/// Static description of one Andromeda network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: String,
    pub rpc_endpoint: String,
    pub rest_endpoint: String,
    pub graphql_endpoint: String,
    pub kernel_address: String,
    /// Skips the kernel `key_address` lookup when set.
    pub adodb_address: Option<String>,
    pub default_denom: String,
    pub gas_price: String,
}

const TESTNET_KERNEL: &str = "andr14hj2tavq8fpesdwxxcu44rty3hh90vhujrvcmstl4zr3txmfvw9shptkql";

/// Names accepted by `ANDROMEDA_NETWORK`.
pub const AVAILABLE_NETWORKS: &[&str] = &["testnet", "mainnet"];

impl NetworkConfig {
    /// Returns the built-in preset for a network name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "testnet" => Some(Self {
                name: "testnet".to_string(),
                chain_id: "galileo-4".to_string(),
                rpc_endpoint: "https://api.andromedaprotocol.io/rpc/testnet".to_string(),
                rest_endpoint: "https://api.andromedaprotocol.io/rest/testnet".to_string(),
                graphql_endpoint: "https://api.andromedaprotocol.io/graphql/testnet".to_string(),
                kernel_address: TESTNET_KERNEL.to_string(),
                adodb_address: None,
                default_denom: "uandr".to_string(),
                gas_price: "0.025uandr".to_string(),
            }),
            // Mainnet kernel has not been published separately; override with KERNEL_ADDRESS.
            "mainnet" => Some(Self {
                name: "mainnet".to_string(),
                chain_id: "andromeda-1".to_string(),
                rpc_endpoint: "https://api.andromedaprotocol.io/rpc/mainnet".to_string(),
                rest_endpoint: "https://api.andromedaprotocol.io/rest/mainnet".to_string(),
                graphql_endpoint: "https://api.andromedaprotocol.io/graphql/mainnet".to_string(),
                kernel_address: TESTNET_KERNEL.to_string(),
                adodb_address: None,
                default_denom: "uandr".to_string(),
                gas_price: "0.025uandr".to_string(),
            }),
            _ => None,
        }
    }
}

/// Gas limits used by the adapter, from cheapest to most expensive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasLimits {
    pub low: u64,
    pub default: u64,
    pub standard: u64,
    pub high: u64,
    pub nft_ops: u64,
    pub complex: u64,
    pub maximum: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            low: 150_000,
            default: 200_000,
            standard: 250_000,
            high: 300_000,
            nft_ops: 400_000,
            complex: 500_000,
            maximum: 1_000_000,
        }
    }
}

/// Fee amounts, in the network's default denom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeSchedule {
    pub low: u128,
    pub standard: u128,
    pub ado_standard: u128,
    pub app: u128,
    pub enhanced: u128,
    /// Funds attached to App instantiation when the platform asks for them.
    pub platform: u128,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            low: 3_750,
            standard: 5_000,
            ado_standard: 6_250,
            app: 12_500,
            enhanced: 25_000,
            platform: 5_000_000,
        }
    }
}

// A struct to hold all configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Network settings
    pub network: NetworkConfig,
    pub bech32_prefix: String,
    pub hd_path: String,

    // Transaction settings
    pub gas: GasLimits,
    pub fees: FeeSchedule,

    // Fallback code IDs; None means the built-in table
    pub code_id_table_path: Option<PathBuf>,

    // Timeouts
    pub request_timeout: Duration,
    pub tx_confirm_timeout: Duration,
    pub tx_poll_interval: Duration,

    // HTTP bridge
    pub port: u16,
}

impl Config {
    /// Loads configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let network_name = non_empty("ANDROMEDA_NETWORK").unwrap_or_else(|| "testnet".to_string());
        let mut network = NetworkConfig::preset(network_name.trim()).ok_or_else(|| {
            anyhow!(
                "Invalid network: {}. Available networks: {}",
                network_name,
                AVAILABLE_NETWORKS.join(", ")
            )
        })?;

        if let Some(rpc) = non_empty("ANDROMEDA_RPC_ENDPOINT") {
            network.rpc_endpoint = validate_endpoint("ANDROMEDA_RPC_ENDPOINT", &rpc)?;
        }
        if let Some(rest) = non_empty("ANDROMEDA_REST_ENDPOINT") {
            network.rest_endpoint = validate_endpoint("ANDROMEDA_REST_ENDPOINT", &rest)?;
        }
        if let Some(graphql) = non_empty("ANDROMEDA_GRAPHQL_ENDPOINT") {
            network.graphql_endpoint = validate_endpoint("ANDROMEDA_GRAPHQL_ENDPOINT", &graphql)?;
        }
        if let Some(kernel) = non_empty("KERNEL_ADDRESS") {
            network.kernel_address = kernel.trim().to_string();
        }
        network.adodb_address = non_empty("ADODB_ADDRESS").map(|a| a.trim().to_string());

        let code_id_table_path = non_empty("ANDROMEDA_CODE_ID_TABLE")
            .map(PathBuf::from)
            .or_else(|| {
                dirs::config_dir()
                    .map(|mut path| {
                        path.push("andromeda-mcp");
                        path.push("code_ids.json");
                        path
                    })
                    .filter(|path| path.exists())
            });

        let request_timeout = parse_secs(non_empty("ANDROMEDA_REQUEST_TIMEOUT_SECS"), 30)
            .context("ANDROMEDA_REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;
        let tx_confirm_timeout = parse_secs(non_empty("ANDROMEDA_TX_CONFIRM_TIMEOUT_SECS"), 60)
            .context("ANDROMEDA_TX_CONFIRM_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Config {
            network,
            bech32_prefix: "andr".to_string(),
            hd_path: "m/44'/118'/0'/0/0".to_string(),
            gas: GasLimits::default(),
            fees: FeeSchedule::default(),
            code_id_table_path,
            request_timeout,
            tx_confirm_timeout,
            tx_poll_interval: Duration::from_millis(1_500),
            port: non_empty("MCP_HTTP_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("MCP_HTTP_PORT must be a valid port number")?,
        })
    }

    pub fn default_denom(&self) -> &str {
        &self.network.default_denom
    }
}

fn validate_endpoint(key: &str, value: &str) -> Result<String> {
    let trimmed = value.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).with_context(|| format!("{} is not a valid URL", key))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("{} must use http or https, got '{}'", key, url.scheme()));
    }
    Ok(trimmed.to_string())
}

fn parse_secs(value: Option<String>, default: u64) -> Result<Duration> {
    let secs = match value {
        Some(v) => v.trim().parse::<u64>()?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_testnet() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.network.name, "testnet");
        assert_eq!(config.network.chain_id, "galileo-4");
        assert_eq!(config.default_denom(), "uandr");
        assert_eq!(config.gas.default, 200_000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn endpoint_overrides_win_over_preset() {
        let config = config_with(&[
            ("ANDROMEDA_NETWORK", "mainnet"),
            ("ANDROMEDA_RPC_ENDPOINT", "http://localhost:26657/"),
            ("KERNEL_ADDRESS", "andr1kernel"),
        ])
        .unwrap();
        assert_eq!(config.network.chain_id, "andromeda-1");
        assert_eq!(config.network.rpc_endpoint, "http://localhost:26657");
        assert_eq!(config.network.kernel_address, "andr1kernel");
        assert_eq!(
            config.network.rest_endpoint,
            "https://api.andromedaprotocol.io/rest/mainnet"
        );
    }

    #[test]
    fn unknown_network_lists_available_ones() {
        let err = config_with(&[("ANDROMEDA_NETWORK", "devnet")]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("devnet"));
        assert!(msg.contains("testnet, mainnet"));
    }

    #[test]
    fn rejects_non_http_endpoint() {
        assert!(config_with(&[("ANDROMEDA_REST_ENDPOINT", "ftp://example.com")]).is_err());
        assert!(config_with(&[("ANDROMEDA_REST_ENDPOINT", "not a url")]).is_err());
    }
}
