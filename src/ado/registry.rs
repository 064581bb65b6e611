// src/ado/registry.rs
//
// Code-ID resolution: the on-chain ADO database first, a versioned table second.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ado::messages::{AdodbExecuteMsg, AdodbQueryMsg, KernelQueryMsg};
use crate::blockchain::error::{AdapterError, Result};
use crate::blockchain::models::TxResult;
use crate::blockchain::wallet::AccountSigner;
use crate::blockchain::AndromedaAdapter;
use crate::config::Config;

const BUILTIN_TABLE: &str = include_str!("../../config/code_ids.json");

/// Page size for `query_adodb` and code-ID resolution.
const ADODB_PAGE_LIMIT: u32 = 50;
/// Page size for `list_ado_versions`.
const VERSION_LIST_LIMIT: u32 = 100;

/// Canonical ADO type name: lowercase, hyphen separated.
pub fn normalize_ado_type(ado_type: &str) -> String {
    ado_type.trim().to_lowercase().replace('_', "-")
}

#[derive(Debug, Deserialize)]
struct CodeIdDocument {
    version: String,
    networks: BTreeMap<String, BTreeMap<String, u64>>,
}

/// Fallback mapping from ADO type to code ID for one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeIdTable {
    version: String,
    network: String,
    entries: BTreeMap<String, u64>,
}

impl CodeIdTable {
    /// The table compiled into the binary.
    pub fn builtin(network: &str) -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_TABLE, network).context("built-in code ID table is malformed")
    }

    pub fn from_path(path: &Path, network: &str) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read code ID table {}", path.display()))?;
        Self::from_json(&text, network)
            .with_context(|| format!("invalid code ID table {}", path.display()))
    }

    /// Parses a `{version, networks: {name: {type: id}}}` document. A network
    /// missing from the document yields an empty table.
    pub fn from_json(text: &str, network: &str) -> anyhow::Result<Self> {
        let doc: CodeIdDocument = serde_json::from_str(text)?;
        if doc.version.trim().is_empty() {
            return Err(anyhow!("code ID table has an empty version"));
        }
        let entries = doc
            .networks
            .get(network)
            .map(|table| {
                table
                    .iter()
                    .map(|(ado_type, id)| (normalize_ado_type(ado_type), *id))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            version: doc.version,
            network: network.to_string(),
            entries,
        })
    }

    /// Uses the configured file when there is one, else the built-in table.
    pub fn load(config: &Config) -> anyhow::Result<Self> {
        match &config.code_id_table_path {
            Some(path) => Self::from_path(path, &config.network.name),
            None => Self::builtin(&config.network.name),
        }
    }

    pub fn lookup(&self, ado_type: &str) -> Option<u64> {
        self.entries.get(&normalize_ado_type(ado_type)).copied()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeIdSource {
    Adodb,
    Fallback,
}

/// Result of `get_ado_code_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeIdResolution {
    pub code_id: u64,
    pub ado_type: String,
    pub version: String,
    pub source: CodeIdSource,
}

/// Numeric `major.minor.patch` of a `type@x.y.z` entry; pre-release tags are ignored.
fn version_key(entry: &str) -> Vec<u64> {
    let version = entry.rsplit('@').next().unwrap_or(entry);
    let core = version.split(['-', '+']).next().unwrap_or(version);
    core.split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

/// Picks an entry out of an `ado_versions` listing: the exact `type@version`
/// or a substring match when a version is requested, else the highest version.
pub fn select_version(
    entries: &[String],
    ado_type: &str,
    requested: Option<&str>,
) -> Option<String> {
    match requested {
        Some(version) => {
            let exact = format!("{}@{}", ado_type, version);
            entries
                .iter()
                .find(|e| **e == exact)
                .or_else(|| entries.iter().find(|e| e.contains(version)))
                .cloned()
        }
        None => entries.iter().max_by_key(|e| version_key(e)).cloned(),
    }
}

fn parse_code_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        Value::Object(map) => map.get("code_id").and_then(parse_code_id),
        _ => None,
    }
}

impl AndromedaAdapter {
    /// Address of the ADO database, from config or the kernel's `key_address`.
    pub async fn adodb_address(&self) -> Result<String> {
        if let Some(address) = &self.config().network.adodb_address {
            return Ok(address.clone());
        }
        let query = serde_json::to_value(KernelQueryMsg::KeyAddress {
            key: "adodb".to_string(),
        })?;
        let response = self.query(self.kernel_address(), &query).await?;
        // Kernels answer with either a bare string or {address}.
        match &response {
            Value::String(address) => Ok(address.clone()),
            Value::Object(map) => map
                .get("address")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| unexpected_kernel_response(&response)),
            _ => Err(unexpected_kernel_response(&response)),
        }
    }

    async fn query_registry(&self, msg: AdodbQueryMsg) -> Result<Value> {
        let adodb = self.adodb_address().await?;
        self.query(&adodb, &serde_json::to_value(msg)?).await
    }

    /// Versions of one ADO type, or every ADO type when none is given.
    pub async fn query_adodb(
        &self,
        ado_type: Option<&str>,
        start_after: Option<&str>,
    ) -> Result<Value> {
        let msg = match ado_type {
            Some(ado_type) => AdodbQueryMsg::AdoVersions {
                ado_type: normalize_ado_type(ado_type),
                start_after: start_after.map(str::to_string),
                limit: Some(ADODB_PAGE_LIMIT),
            },
            None => AdodbQueryMsg::AllAdoTypes {
                start_after: start_after.map(str::to_string),
                limit: Some(ADODB_PAGE_LIMIT),
            },
        };
        self.query_registry(msg)
            .await
            .map_err(|e| AdapterError::Connectivity(format!("Failed to query ADODB: {}", e)))
    }

    pub async fn list_ado_versions(&self, ado_type: &str) -> Result<Value> {
        self.query_registry(AdodbQueryMsg::AdoVersions {
            ado_type: normalize_ado_type(ado_type),
            start_after: None,
            limit: Some(VERSION_LIST_LIMIT),
        })
        .await
        .map_err(|e| AdapterError::Connectivity(format!("Failed to list ADO versions: {}", e)))
    }

    async fn resolve_from_adodb(
        &self,
        ado_type: &str,
        version: Option<&str>,
    ) -> Result<CodeIdResolution> {
        let listing = self
            .query_registry(AdodbQueryMsg::AdoVersions {
                ado_type: ado_type.to_string(),
                start_after: None,
                limit: Some(ADODB_PAGE_LIMIT),
            })
            .await?;
        let entries: Vec<String> = serde_json::from_value(listing)?;
        let key = select_version(&entries, ado_type, version).ok_or_else(|| {
            AdapterError::Connectivity(format!(
                "Version {} not found for ADO type {}",
                version.unwrap_or("latest"),
                ado_type
            ))
        })?;
        let response = self
            .query_registry(AdodbQueryMsg::CodeId { key: key.clone() })
            .await?;
        let code_id = parse_code_id(&response).ok_or_else(|| {
            AdapterError::Connectivity(format!("Unexpected code_id response for {}: {}", key, response))
        })?;
        Ok(CodeIdResolution {
            code_id,
            ado_type: ado_type.to_string(),
            version: key,
            source: CodeIdSource::Adodb,
        })
    }

    /// Resolves the code ID to instantiate for an ADO type.
    ///
    /// Any failure of the ADODB path (kernel lookup, version listing, version
    /// selection, `code_id` query) falls through to the code-ID table; only when
    /// that also has no entry is `CodeIdUnavailable` returned.
    pub async fn resolve_code_id(
        &self,
        ado_type: &str,
        version: Option<&str>,
    ) -> Result<CodeIdResolution> {
        let normalized = normalize_ado_type(ado_type);
        if normalized != ado_type {
            debug!("Normalized ADO type '{}' to '{}'", ado_type, normalized);
        }
        match self.resolve_from_adodb(&normalized, version).await {
            Ok(resolution) => {
                info!(
                    "Resolved {} to code {} via ADODB ({})",
                    normalized, resolution.code_id, resolution.version
                );
                Ok(resolution)
            }
            Err(err) => {
                warn!("ADODB lookup for {} failed, using fallback table: {}", normalized, err);
                match self.code_ids().lookup(&normalized) {
                    Some(code_id) => Ok(CodeIdResolution {
                        code_id,
                        ado_type: normalized,
                        version: version.unwrap_or("fallback").to_string(),
                        source: CodeIdSource::Fallback,
                    }),
                    None => Err(AdapterError::CodeIdUnavailable {
                        ado_type: normalized,
                        reason: err.to_string(),
                    }),
                }
            }
        }
    }

    /// Publishes a code ID under `ado_type@version` in the ADO database.
    pub async fn publish_ado(
        &self,
        signer: &AccountSigner,
        code_id: u64,
        ado_type: &str,
        version: &str,
    ) -> Result<TxResult> {
        let adodb = self.adodb_address().await?;
        let msg = serde_json::to_value(AdodbExecuteMsg::Publish {
            code_id,
            ado_type: normalize_ado_type(ado_type),
            version: version.to_string(),
            action_fees: None,
            publisher: None,
        })?;
        self.execute(signer, &adodb, msg, Vec::new(), None).await
    }
}

fn unexpected_kernel_response(response: &Value) -> AdapterError {
    AdapterError::Connectivity(format!(
        "Kernel returned an unexpected ADODB address: {}",
        response
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use serde_json::json;

    use crate::testing::{test_config, test_adapter, StaticQuerier, RecordingBroadcaster, ADODB, KERNEL};

    #[test]
    fn normalizes_separators_and_case() {
        assert_eq!(normalize_ado_type("CW20_Exchange"), "cw20-exchange");
        assert_eq!(normalize_ado_type(" merkle_airdrop "), "merkle-airdrop");
        assert_eq!(normalize_ado_type("cw721"), "cw721");
    }

    #[test]
    fn builtin_table_covers_testnet_and_leaves_mainnet_empty() {
        let testnet = CodeIdTable::builtin("testnet").unwrap();
        assert_eq!(testnet.lookup("cw721"), Some(13));
        assert_eq!(testnet.lookup("cw20_exchange"), Some(29));
        assert_eq!(testnet.lookup("cw20-exchange"), Some(29));
        assert!(!testnet.is_empty());

        let mainnet = CodeIdTable::builtin("mainnet").unwrap();
        assert!(mainnet.is_empty());
        assert_eq!(mainnet.version(), testnet.version());
    }

    #[test]
    fn table_file_replaces_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"version":"local-1","networks":{{"testnet":{{"CW721":99,"address_list":7}}}}}}"#
        )
        .unwrap();

        let table = CodeIdTable::from_path(file.path(), "testnet").unwrap();
        assert_eq!(table.version(), "local-1");
        assert_eq!(table.lookup("cw721"), Some(99));
        assert_eq!(table.lookup("address-list"), Some(7));
        assert_eq!(table.lookup("splitter"), None);
    }

    #[test]
    fn rejects_malformed_table() {
        assert!(CodeIdTable::from_json("{\"networks\":{}}", "testnet").is_err());
        assert!(CodeIdTable::from_json("{\"version\":\"\",\"networks\":{}}", "testnet").is_err());
        let missing = tempfile::tempdir().unwrap().path().join("nope.json");
        assert!(CodeIdTable::from_path(&missing, "testnet").is_err());
    }

    #[test]
    fn picks_requested_or_highest_version() {
        let entries = vec![
            "cw721@1.9.0".to_string(),
            "cw721@2.0.1".to_string(),
            "cw721@1.10.0".to_string(),
        ];
        assert_eq!(
            select_version(&entries, "cw721", None).as_deref(),
            Some("cw721@2.0.1")
        );
        assert_eq!(
            select_version(&entries, "cw721", Some("1.9.0")).as_deref(),
            Some("cw721@1.9.0")
        );
        assert_eq!(
            select_version(&entries, "cw721", Some("1.10")).as_deref(),
            Some("cw721@1.10.0")
        );
        assert_eq!(select_version(&entries, "cw721", Some("3.0.0")), None);
        assert_eq!(select_version(&[], "cw721", None), None);
    }

    #[tokio::test]
    async fn resolves_through_kernel_and_adodb() {
        let querier = StaticQuerier::new()
            .with(KERNEL, "key_address", json!(ADODB))
            .with(ADODB, "ado_versions", json!(["cw20-exchange@1.0.0", "cw20-exchange@1.2.0"]))
            .with(ADODB, "code_id", json!(31));
        let adapter = test_adapter(querier.clone(), RecordingBroadcaster::new());

        let resolution = adapter.resolve_code_id("cw20_exchange", None).await.unwrap();
        assert_eq!(resolution.code_id, 31);
        assert_eq!(resolution.source, CodeIdSource::Adodb);
        assert_eq!(resolution.version, "cw20-exchange@1.2.0");

        let code_query = querier.last_query(ADODB, "code_id").unwrap();
        assert_eq!(code_query, json!({"code_id": {"key": "cw20-exchange@1.2.0"}}));
    }

    #[tokio::test]
    async fn underscore_and_hyphen_resolve_identically() {
        let adapter = test_adapter(StaticQuerier::new(), RecordingBroadcaster::new());
        let a = adapter.resolve_code_id("cw20_exchange", None).await.unwrap();
        let b = adapter.resolve_code_id("cw20-exchange", None).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.code_id, 29);
        assert_eq!(a.source, CodeIdSource::Fallback);
    }

    #[tokio::test]
    async fn unknown_type_without_fallback_is_unavailable() {
        let adapter = test_adapter(StaticQuerier::new(), RecordingBroadcaster::new());
        let err = adapter.resolve_code_id("rates", None).await.unwrap_err();
        assert!(matches!(err, AdapterError::CodeIdUnavailable { ref ado_type, .. } if ado_type == "rates"));
    }

    #[tokio::test]
    async fn configured_adodb_skips_kernel() {
        let mut config = test_config();
        config.network.adodb_address = Some("andr1configuredadodb".to_string());
        let adapter = AndromedaAdapter::with_backends(
            Arc::new(config),
            CodeIdTable::builtin("testnet").unwrap(),
            Arc::new(StaticQuerier::new()),
            Arc::new(RecordingBroadcaster::new()),
        );
        assert_eq!(adapter.adodb_address().await.unwrap(), "andr1configuredadodb");
    }

    #[tokio::test]
    async fn kernel_object_response_is_accepted() {
        let querier = StaticQuerier::new().with(KERNEL, "key_address", json!({"address": ADODB}));
        let adapter = test_adapter(querier, RecordingBroadcaster::new());
        assert_eq!(adapter.adodb_address().await.unwrap(), ADODB);
    }
}
