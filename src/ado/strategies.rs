//! Ordered instantiate-message shapes for contracts whose accepted schema
//! differs between deployed versions.
//!
//! Each operation owns a static table of `MessageShape`s. The runner tries
//! them in order, skipping shapes that do not apply to the input, and stops
//! at the first instantiation the chain accepts. Failures the next shape
//! cannot fix (bad mnemonic, signing errors, timeouts) abort the run.

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::ado::messages::{AppComponent, Asset};
use crate::ado::registry::normalize_ado_type;
use crate::blockchain::error::{AdapterError, AttemptFailure, Result};
use crate::blockchain::models::{Coin, TxResult};
use crate::blockchain::transactions::FeeSpec;
use crate::blockchain::wallet::AccountSigner;
use crate::blockchain::AndromedaAdapter;

/// Inputs every shape builder may read.
#[derive(Debug, Clone, Copy)]
pub struct ShapeContext<'a> {
    pub name: &'a str,
    pub sender: &'a str,
    pub kernel: &'a str,
    /// Caller supplied instantiate message, if any.
    pub input: Option<&'a Value>,
    pub components: &'a [AppComponent],
    pub asset: Option<&'a Asset>,
}

impl<'a> ShapeContext<'a> {
    pub fn new(name: &'a str, sender: &'a str, kernel: &'a str) -> Self {
        Self {
            name,
            sender,
            kernel,
            input: None,
            components: &[],
            asset: None,
        }
    }

    fn field(&self, key: &str) -> Option<&'a Value> {
        self.input.and_then(|v| v.get(key)).filter(|v| !v.is_null())
    }

    fn str_field(&self, key: &str) -> Option<&'a str> {
        self.field(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }
}

/// Which code ID an attempt instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRef {
    /// The code ID resolved for the operation.
    Primary,
    /// Resolved separately, when the attempt is reached.
    AdoType(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeTier {
    AdoStandard,
    App,
    Enhanced,
}

pub struct MessageShape {
    pub label: &'static str,
    pub build: fn(&ShapeContext<'_>) -> Option<Value>,
    pub code: CodeRef,
    pub fee: FeeTier,
    /// Attach the platform funding to the instantiation.
    pub platform_funds: bool,
    /// Appended to the instance name to form the contract label.
    pub label_suffix: &'static str,
}

const fn shape(label: &'static str, build: fn(&ShapeContext<'_>) -> Option<Value>) -> MessageShape {
    MessageShape {
        label,
        build,
        code: CodeRef::Primary,
        fee: FeeTier::AdoStandard,
        platform_funds: false,
        label_suffix: "",
    }
}

/// A successful instantiation and the shape that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub code_id: u64,
    pub strategy: String,
    #[serde(flatten)]
    pub tx: TxResult,
}

// --- builders ---

fn with_kernel(mut msg: Map<String, Value>, ctx: &ShapeContext<'_>) -> Value {
    msg.entry("kernel_address")
        .or_insert_with(|| Value::String(ctx.kernel.to_string()));
    Value::Object(msg)
}

fn collection_name(ctx: &ShapeContext<'_>) -> String {
    ctx.str_field("name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} Collection", ctx.name))
}

fn collection_symbol(ctx: &ShapeContext<'_>) -> String {
    ctx.str_field("symbol")
        .map(str::to_string)
        .unwrap_or_else(|| ctx.name.to_uppercase().chars().take(8).collect())
}

fn cw721_simplified(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(json!({
        "name": collection_name(ctx),
        "symbol": collection_symbol(ctx),
        "minter": ctx.str_field("minter").unwrap_or(ctx.sender),
        "kernel_address": ctx.kernel,
    }))
}

fn cw721_minimal(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(json!({
        "name": collection_name(ctx),
        "symbol": collection_symbol(ctx),
        "minter": ctx.sender,
        "kernel_address": ctx.kernel,
    }))
}

fn marketplace_owned(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(json!({
        "kernel_address": ctx.kernel,
        "owner": ctx.sender,
        "modules": ctx.field("modules").cloned().unwrap_or_else(|| json!([])),
    }))
}

fn marketplace_modules_only(_: &ShapeContext<'_>) -> Option<Value> {
    Some(json!({ "modules": [] }))
}

fn splitter_recipients<'a>(ctx: &'a ShapeContext<'a>) -> Option<&'a Vec<Value>> {
    ctx.field("recipients").and_then(Value::as_array)
}

fn recipient_address(r: &Value) -> Value {
    r.pointer("/recipient/address")
        .or_else(|| r.get("address"))
        .cloned()
        .unwrap_or(Value::Null)
}

fn nested_recipient(r: &Value) -> Value {
    match r.get("recipient").filter(|v| !v.is_null()) {
        Some(recipient) => recipient.clone(),
        None => json!({ "address": r.get("address").cloned().unwrap_or(Value::Null) }),
    }
}

fn splitter_msg(ctx: &ShapeContext<'_>, recipients: Vec<Value>) -> Value {
    json!({
        "recipients": recipients,
        "kernel_address": ctx.kernel,
        "owner": ctx.sender,
    })
}

fn splitter_nested(ctx: &ShapeContext<'_>) -> Option<Value> {
    let recipients = splitter_recipients(ctx)?
        .iter()
        .map(|r| json!({ "recipient": nested_recipient(r), "percent": r["percent"] }))
        .collect();
    Some(splitter_msg(ctx, recipients))
}

fn splitter_flat(ctx: &ShapeContext<'_>) -> Option<Value> {
    let recipients = splitter_recipients(ctx)?
        .iter()
        .map(|r| json!({ "address": recipient_address(r), "percent": r["percent"] }))
        .collect();
    Some(splitter_msg(ctx, recipients))
}

/// `"25"` becomes `"0.25"`; values already below one are kept.
fn decimal_percent(percent: &Value) -> Value {
    let parsed = match percent {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    match parsed {
        Some(p) if p >= 1.0 => Value::String((p / 100.0).to_string()),
        _ => percent.clone(),
    }
}

fn splitter_decimal(ctx: &ShapeContext<'_>) -> Option<Value> {
    let recipients = splitter_recipients(ctx)?
        .iter()
        .map(|r| {
            json!({
                "recipient": nested_recipient(r),
                "percent": decimal_percent(&r["percent"]),
            })
        })
        .collect();
    Some(splitter_msg(ctx, recipients))
}

fn passthrough(ctx: &ShapeContext<'_>) -> Option<Value> {
    let map = ctx
        .input
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Some(with_kernel(map, ctx))
}

fn splitter_passthrough(ctx: &ShapeContext<'_>) -> Option<Value> {
    match splitter_recipients(ctx) {
        Some(_) => None,
        None => passthrough(ctx),
    }
}

fn app_minimal(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(json!({
        "kernel_address": ctx.kernel,
        "owner": ctx.sender,
        "modules": [],
    }))
}

fn wrapped_components(ctx: &ShapeContext<'_>) -> Vec<Value> {
    ctx.components
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "ado_type": c.ado_type,
                "component_type": { "new": c.component_type.get("new").cloned().unwrap_or(Value::Null) },
            })
        })
        .collect()
}

fn app_msg(ctx: &ShapeContext<'_>, field: &str, components: Vec<Value>) -> Value {
    let mut msg = Map::new();
    msg.insert(field.to_string(), Value::Array(components));
    msg.insert("name".to_string(), json!(ctx.name));
    msg.insert("kernel_address".to_string(), json!(ctx.kernel));
    msg.insert("owner".to_string(), json!(ctx.sender));
    Value::Object(msg)
}

fn app_components(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(app_msg(ctx, "app_components", wrapped_components(ctx)))
}

fn app_field(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(app_msg(ctx, "app", wrapped_components(ctx)))
}

fn app_raw_components(ctx: &ShapeContext<'_>) -> Option<Value> {
    let raw = ctx
        .components
        .iter()
        .map(|c| json!({ "name": c.name, "ado_type": c.ado_type, "component_type": c.component_type }))
        .collect();
    Some(app_msg(ctx, "app_components", raw))
}

fn app_contract(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(json!({ "kernel_address": ctx.kernel, "owner": ctx.sender }))
}

fn airdrop_asset_info(ctx: &ShapeContext<'_>) -> Option<Value> {
    let asset = ctx.asset?;
    Some(json!({
        "asset_info": asset,
        "kernel_address": ctx.kernel,
        "owner": ctx.sender,
        "modules": [],
    }))
}

fn airdrop_token(ctx: &ShapeContext<'_>) -> Option<Value> {
    let asset = ctx.asset?;
    Some(json!({
        "token": asset,
        "kernel_address": ctx.kernel,
        "owner": ctx.sender,
    }))
}

fn airdrop_minimal(ctx: &ShapeContext<'_>) -> Option<Value> {
    Some(json!({
        "kernel_address": ctx.kernel,
        "owner": ctx.sender,
        "modules": [],
    }))
}

// --- tables ---

pub static CW721_SHAPES: &[MessageShape] = &[
    shape("simplified", cw721_simplified),
    shape("minimal", cw721_minimal),
];

pub static MARKETPLACE_SHAPES: &[MessageShape] = &[
    shape("owner+modules", marketplace_owned),
    shape("modules only", marketplace_modules_only),
];

pub static SPLITTER_SHAPES: &[MessageShape] = &[
    shape("nested recipient", splitter_nested),
    shape("flat address", splitter_flat),
    shape("decimal percent", splitter_decimal),
    shape("passthrough", splitter_passthrough),
];

pub static GENERIC_SHAPES: &[MessageShape] = &[shape("passthrough", passthrough)];

pub static APP_SHAPES: &[MessageShape] = &[
    MessageShape {
        label: "minimal",
        build: app_minimal,
        code: CodeRef::Primary,
        fee: FeeTier::App,
        platform_funds: false,
        label_suffix: " App - Basic",
    },
    MessageShape {
        label: "app_components + platform funds",
        build: app_components,
        code: CodeRef::Primary,
        fee: FeeTier::Enhanced,
        platform_funds: true,
        label_suffix: " App",
    },
    MessageShape {
        label: "app field",
        build: app_field,
        code: CodeRef::Primary,
        fee: FeeTier::Enhanced,
        platform_funds: false,
        label_suffix: " App",
    },
    MessageShape {
        label: "no encoding",
        build: app_raw_components,
        code: CodeRef::Primary,
        fee: FeeTier::Enhanced,
        platform_funds: false,
        label_suffix: " App",
    },
    MessageShape {
        label: "app-contract",
        build: app_contract,
        code: CodeRef::AdoType("app-contract"),
        fee: FeeTier::Enhanced,
        platform_funds: false,
        label_suffix: " AppContract",
    },
];

pub static AIRDROP_SHAPES: &[MessageShape] = &[
    shape("asset_info", airdrop_asset_info),
    shape("token", airdrop_token),
    shape("minimal", airdrop_minimal),
];

/// The shape table `deploy_ado` uses for an ADO type.
pub fn shapes_for_ado_type(ado_type: &str) -> &'static [MessageShape] {
    match normalize_ado_type(ado_type).as_str() {
        "cw721" => CW721_SHAPES,
        "marketplace" => MARKETPLACE_SHAPES,
        "splitter" => SPLITTER_SHAPES,
        _ => GENERIC_SHAPES,
    }
}

impl AndromedaAdapter {
    fn fee_for(&self, tier: FeeTier) -> FeeSpec {
        let config = self.config();
        let (amount, gas) = match tier {
            FeeTier::AdoStandard => (config.fees.ado_standard, config.gas.standard),
            FeeTier::App => (config.fees.app, config.gas.complex),
            FeeTier::Enhanced => (config.fees.enhanced, config.gas.maximum),
        };
        FeeSpec::new(amount, self.default_denom(), gas)
    }

    /// Tries each applicable shape in order until one instantiates.
    pub async fn instantiate_with_strategies(
        &self,
        signer: &AccountSigner,
        operation: &str,
        primary_code_id: u64,
        shapes: &[MessageShape],
        ctx: &ShapeContext<'_>,
    ) -> Result<Deployment> {
        let mut failures = Vec::new();
        let mut last_error = None;

        for shape in shapes {
            let Some(msg) = (shape.build)(ctx) else {
                continue;
            };
            info!("{}: trying '{}' message shape", operation, shape.label);

            let attempt = async {
                let code_id = match shape.code {
                    CodeRef::Primary => primary_code_id,
                    CodeRef::AdoType(ado_type) => self.resolve_code_id(ado_type, None).await?.code_id,
                };
                let funds = if shape.platform_funds {
                    vec![Coin::new(self.config().fees.platform, self.default_denom())]
                } else {
                    Vec::new()
                };
                let label = format!("{}{}", ctx.name, shape.label_suffix);
                let tx = self
                    .instantiate(signer, code_id, &label, msg, self.fee_for(shape.fee), funds)
                    .await?;
                Ok::<_, AdapterError>((code_id, tx))
            };

            match attempt.await {
                Ok((code_id, tx)) => {
                    info!("{}: '{}' shape accepted", operation, shape.label);
                    return Ok(Deployment {
                        code_id,
                        strategy: shape.label.to_string(),
                        tx,
                    });
                }
                Err(err) if err.is_retryable() => {
                    warn!("{}: '{}' shape failed: {}", operation, shape.label, err);
                    failures.push(AttemptFailure {
                        label: shape.label.to_string(),
                        reason: err.to_string(),
                    });
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        match (failures.len(), last_error) {
            (1, Some(err)) => Err(err),
            (0, _) => Err(AdapterError::Validation(format!(
                "no instantiate message shape applies to {}",
                operation
            ))),
            _ => Err(AdapterError::AllAttemptsFailed {
                operation: operation.to_string(),
                failures,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::transactions::ContractMsg;
    use crate::testing::{mnemonic, rejection, test_adapter, RecordingBroadcaster, StaticQuerier, SENDER};

    fn ctx_with<'a>(input: &'a Value) -> ShapeContext<'a> {
        ShapeContext {
            input: Some(input),
            ..ShapeContext::new("Gallery", SENDER, "andr1kernel")
        }
    }

    #[test]
    fn cw721_defaults_come_from_the_instance_name() {
        let input = json!({});
        let msg = cw721_simplified(&ctx_with(&input)).unwrap();
        assert_eq!(msg["name"], "Gallery Collection");
        assert_eq!(msg["symbol"], "GALLERY");
        assert_eq!(msg["minter"], SENDER);
        assert_eq!(msg["kernel_address"], "andr1kernel");
    }

    #[test]
    fn cw721_minimal_forces_sender_as_minter() {
        let input = json!({"name": "Art", "symbol": "ART", "minter": "andr1other"});
        let ctx = ctx_with(&input);
        assert_eq!(cw721_simplified(&ctx).unwrap()["minter"], "andr1other");
        assert_eq!(cw721_minimal(&ctx).unwrap()["minter"], SENDER);
    }

    #[test]
    fn splitter_shapes_rewrite_recipients() {
        let input = json!({"recipients": [{"address": "andr1a", "percent": "25"}]});
        let ctx = ctx_with(&input);
        assert_eq!(
            splitter_nested(&ctx).unwrap()["recipients"][0],
            json!({"recipient": {"address": "andr1a"}, "percent": "25"})
        );
        assert_eq!(
            splitter_flat(&ctx).unwrap()["recipients"][0],
            json!({"address": "andr1a", "percent": "25"})
        );
        assert_eq!(splitter_decimal(&ctx).unwrap()["recipients"][0]["percent"], "0.25");
        assert!(splitter_passthrough(&ctx).is_none());
    }

    #[test]
    fn splitter_without_recipients_only_passes_through() {
        let input = json!({"lock_time": 10});
        let ctx = ctx_with(&input);
        assert!(splitter_nested(&ctx).is_none());
        let msg = splitter_passthrough(&ctx).unwrap();
        assert_eq!(msg, json!({"lock_time": 10, "kernel_address": "andr1kernel"}));
    }

    #[test]
    fn passthrough_keeps_caller_kernel() {
        let input = json!({"kernel_address": "andr1custom", "x": 1});
        assert_eq!(passthrough(&ctx_with(&input)).unwrap()["kernel_address"], "andr1custom");
    }

    #[test]
    fn app_components_wrap_only_the_new_message() {
        let components = vec![AppComponent {
            name: "token".into(),
            ado_type: "cw20".into(),
            component_type: json!({"new": {"name": "T"}, "extra": true}),
        }];
        let ctx = ShapeContext {
            components: &components,
            ..ShapeContext::new("Shop", SENDER, "andr1kernel")
        };
        let wrapped = app_components(&ctx).unwrap();
        assert_eq!(wrapped["app_components"][0]["component_type"], json!({"new": {"name": "T"}}));
        let raw = app_raw_components(&ctx).unwrap();
        assert_eq!(raw["app_components"][0]["component_type"]["extra"], true);
    }

    #[test]
    fn table_selection_normalizes_type() {
        assert_eq!(shapes_for_ado_type("CW721").len(), CW721_SHAPES.len());
        assert_eq!(shapes_for_ado_type("address_list")[0].label, "passthrough");
    }

    #[tokio::test]
    async fn collects_every_failure_in_order() {
        let broadcaster = RecordingBroadcaster::new()
            .then_fail(rejection("unknown field `owner`"))
            .then_fail(rejection("unknown field `modules`"));
        let adapter = test_adapter(StaticQuerier::new(), broadcaster.clone());
        let signer = adapter.signer(&mnemonic()).unwrap();
        let input = json!({});
        let ctx = ctx_with(&input);

        let err = adapter
            .instantiate_with_strategies(&signer, "MARKETPLACE deployment", 15, MARKETPLACE_SHAPES, &ctx)
            .await
            .unwrap_err();
        match err {
            AdapterError::AllAttemptsFailed { operation, failures } => {
                assert_eq!(operation, "MARKETPLACE deployment");
                let labels: Vec<_> = failures.iter().map(|f| f.label.as_str()).collect();
                assert_eq!(labels, vec!["owner+modules", "modules only"]);
                assert!(failures[1].reason.contains("unknown field `modules`"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(broadcaster.submitted().len(), 2);
    }

    #[tokio::test]
    async fn app_falls_back_to_app_contract_with_its_own_code() {
        let broadcaster = RecordingBroadcaster::new()
            .then_fail(rejection("unauthorized"))
            .then_fail(rejection("insufficient funds"))
            .then_fail(rejection("unknown field `app`"))
            .then_fail(rejection("invalid component"));
        let adapter = test_adapter(StaticQuerier::new(), broadcaster.clone());
        let signer = adapter.signer(&mnemonic()).unwrap();
        let ctx = ShapeContext::new("Shop", SENDER, "andr1kernel");

        let deployment = adapter
            .instantiate_with_strategies(&signer, "App", 6, APP_SHAPES, &ctx)
            .await
            .unwrap();
        assert_eq!(deployment.strategy, "app-contract");
        assert_eq!(broadcaster.submitted().len(), 5);

        match broadcaster.msg(1) {
            ContractMsg::Instantiate { funds, label, .. } => {
                assert_eq!(funds, vec![Coin::new(5_000_000u64, "uandr")]);
                assert_eq!(label, "Shop App");
            }
            other => panic!("unexpected msg: {other:?}"),
        }
        let (_, last) = &broadcaster.submitted()[4];
        assert_eq!(last.fee.gas_limit, 1_000_000);
        assert_eq!(last.fee.amount, 25_000);
        match &last.msgs[0] {
            ContractMsg::Instantiate { label, msg, .. } => {
                assert_eq!(label, "Shop AppContract");
                assert_eq!(msg, &json!({"kernel_address": "andr1kernel", "owner": SENDER}));
            }
            other => panic!("unexpected msg: {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_attempt_reports_its_own_error() {
        let broadcaster = RecordingBroadcaster::new().then_fail(rejection("bad msg"));
        let adapter = test_adapter(StaticQuerier::new(), broadcaster);
        let signer = adapter.signer(&mnemonic()).unwrap();
        let input = json!({"foo": 1});
        let err = adapter
            .instantiate_with_strategies(&signer, "RATES deployment", 40, GENERIC_SHAPES, &ctx_with(&input))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::RemoteRejection { ref log, .. } if log == "bad msg"));
    }

    #[tokio::test]
    async fn timeout_stops_the_run() {
        let broadcaster = RecordingBroadcaster::new().then_fail(AdapterError::Timeout("slow".into()));
        let adapter = test_adapter(StaticQuerier::new(), broadcaster.clone());
        let signer = adapter.signer(&mnemonic()).unwrap();
        let input = json!({});
        let err = adapter
            .instantiate_with_strategies(&signer, "CW721 deployment", 13, CW721_SHAPES, &ctx_with(&input))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Timeout(_)));
        assert_eq!(broadcaster.submitted().len(), 1);
    }
}
