//! Adapter behaviour against a mocked Andromeda node.

use std::sync::Arc;

use andromeda_mcp_server::blockchain::{AdapterError, AndromedaAdapter};
use andromeda_mcp_server::config::Config;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use mockito::{mock, Matcher};
use serde_json::json;

const CONTRACT: &str = "andr1qxyzcontract";

fn adapter_against(server: &str) -> AndromedaAdapter {
    let graphql = format!("{}/graphql", server);
    let config = Config::from_lookup(|key| match key {
        "ANDROMEDA_RPC_ENDPOINT" | "ANDROMEDA_REST_ENDPOINT" => Some(server.to_string()),
        "ANDROMEDA_GRAPHQL_ENDPOINT" => Some(graphql.clone()),
        "ANDROMEDA_REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();
    AndromedaAdapter::new(Arc::new(config)).unwrap()
}

fn status_mock() -> mockito::Mock {
    mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "status"})))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {
                    "node_info": {"network": "galileo-4"},
                    "sync_info": {"latest_block_height": "1200"}
                }
            })
            .to_string(),
        )
        .create()
}

#[tokio::test]
async fn chain_info_is_stable_between_blocks() {
    let _status = status_mock();
    let block = mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "block"})))
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {
                    "block_id": {"hash": "ABCD"},
                    "block": {
                        "header": {
                            "chain_id": "galileo-4",
                            "height": "1200",
                            "time": "2024-05-01T00:00:00Z",
                            "proposer_address": "PROPOSER"
                        },
                        "data": {"txs": []}
                    }
                }
            })
            .to_string(),
        )
        .expect(2)
        .create();

    let adapter = adapter_against(&mockito::server_url());
    let first = adapter.chain_info().await.unwrap();
    let second = adapter.chain_info().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.chain_id, "galileo-4");
    assert_eq!(first.latest_block.height, 1200);
    assert_eq!(first.latest_block.hash, "ABCD");
    block.assert();
}

#[tokio::test]
async fn smart_query_falls_back_to_rest() {
    let _status = status_mock();
    let _abci = mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({"method": "abci_query"})))
        .with_status(503)
        .create();

    let query = json!({"get_token_info": {}});
    let path = format!(
        "/cosmwasm/wasm/v1/contract/{}/smart/{}",
        CONTRACT,
        URL_SAFE.encode(serde_json::to_vec(&query).unwrap())
    );
    let rest = mock("GET", path.as_str())
        .with_header("content-type", "application/json")
        .with_body(json!({"data": {"name": "Test", "symbol": "TST", "decimals": 6}}).to_string())
        .create();

    let adapter = adapter_against(&mockito::server_url());
    let info = adapter.query(CONTRACT, &query).await.unwrap();

    assert_eq!(info["symbol"], "TST");
    rest.assert();
}

#[tokio::test]
async fn graphql_errors_are_connectivity_failures() {
    let _graphql = mock("POST", "/graphql")
        .with_header("content-type", "application/json")
        .with_body(json!({"data": null, "errors": [{"message": "unknown field"}]}).to_string())
        .create();

    let adapter = adapter_against(&mockito::server_url());
    let err = adapter.graphql("{ nope }", None).await.unwrap_err();

    match err {
        AdapterError::Connectivity(msg) => assert!(msg.contains("unknown field")),
        other => panic!("expected a connectivity error, got {other}"),
    }
}
