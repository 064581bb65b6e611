//! # MCP Handler Module
//!
//! Routes JSON-RPC methods for the Andromeda server: `initialize`, `ping`,
//! `tools/list` and `tools/call`. Every registered tool name is also accepted
//! as a method of its own and is handled as a `tools/call`.
//!
//! Tool failures are not JSON-RPC errors. They come back as a successful
//! response whose result carries `isError: true`, so the client can show the
//! message next to the call that produced it.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::mcp::dispatch::call_tool_result;
use crate::mcp::protocol::{error_codes, Request, Response, PROTOCOL_VERSION};
use crate::mcp::registry;
use crate::AppState;

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        debug!("Notification {} needs no response", req.method);
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "ping" => Response::success(req.id, json!({})),
        "tools/list" => Response::success(req.id, registry::tool_list().clone()),
        "tools/call" => handle_tool_call(req, state).await,
        method if registry::find(method).is_some() => {
            handle_tool_call(req.into_tool_call(), state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let args = params.get("arguments").unwrap_or(&Value::Null);
    let result = call_tool_result(&state.adapter, tool_name, args).await;
    Response::success(req.id.clone(), result)
}

fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "andromeda-mcp-server",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions = "Andromeda Protocol MCP server: query the chain, manage wallets, \
        and deploy and operate ADOs (CW20, CW721, marketplace, auction, exchange, \
        staking, airdrop, splitter and Apps). Write operations take the signer's \
        mnemonic per call; nothing is stored.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_adapter, test_config, RecordingBroadcaster, StaticQuerier};
    use std::sync::Arc;

    fn state() -> AppState {
        AppState {
            config: Arc::new(test_config()),
            adapter: Arc::new(test_adapter(StaticQuerier::new(), RecordingBroadcaster::new())),
        }
    }

    fn request(value: Value) -> Request {
        serde_json::from_value(value).unwrap()
    }

    async fn call(value: Value) -> Response {
        handle_mcp_request(request(value), state()).await.unwrap()
    }

    #[tokio::test]
    async fn initialize_reports_tools_capability() {
        let resp = call(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-06-18");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(result["serverInfo"]["name"], "andromeda-mcp-server");
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let req = request(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
        assert!(handle_mcp_request(req, state()).await.is_none());
    }

    #[tokio::test]
    async fn ping_and_tools_list() {
        let resp = call(json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(resp.result, Some(json!({})));

        let resp = call(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, registry::TOOLS.len());
    }

    #[tokio::test]
    async fn protocol_errors_use_json_rpc_codes() {
        let resp = call(json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"})).await;
        assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

        let resp = call(json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {}})).await;
        assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn tool_failures_are_results_not_errors() {
        let resp = call(json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "get_transaction", "arguments": {}}
        }))
        .await;
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "Error: Invalid arguments: field 'txHash' is required"
        );
    }

    #[tokio::test]
    async fn tool_name_works_as_a_method() {
        let resp = call(json!({"jsonrpc": "2.0", "id": 6, "method": "generate_wallet"})).await;
        let result = resp.result.unwrap();
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert!(payload["address"].as_str().unwrap().starts_with("andr1"));
    }
}
