// src/main.rs

use andromeda_mcp_server::{
    api,
    config::Config,
    mcp::{
        handler::handle_mcp_request,
        protocol::{error_codes, Request, Response},
    },
    AppState,
};
use std::env;
use std::net::SocketAddr;
use std::process;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- HTTP Server Logic ---
async fn run_http_server(state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP bridge listening on {}", addr);
    axum::serve(listener, app.into_make_service()).await
}

// --- MCP Server Logic ---
async fn run_mcp_server(state: AppState) -> std::io::Result<()> {
    info!("Starting MCP server on stdin/stdout...");

    let mut stdin = io::BufReader::new(io::stdin());
    let mut stdout = io::stdout();

    loop {
        let mut line = String::new();

        if stdin.read_line(&mut line).await? == 0 {
            info!("EOF received, shutting down MCP server");
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!("Received: {}", line);

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => handle_mcp_request(request, state.clone()).await,
            Err(parse_error) => {
                error!("JSON parse error: {}", parse_error);
                Some(Response::error(
                    serde_json::Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", parse_error),
                ))
            }
        };

        if let Some(response) = response {
            match serde_json::to_string(&response) {
                Ok(response_json) => {
                    debug!("Sending: {}", response_json);
                    stdout
                        .write_all(format!("{}\n", response_json).as_bytes())
                        .await?;
                    stdout.flush().await?;
                }
                Err(e) => error!("Failed to serialize response: {}", e),
            }
        }
    }

    info!("MCP server shutting down");
    Ok(())
}

fn http_mode_requested() -> bool {
    env::args().any(|arg| arg == "--http")
        || env::var("MCP_MODE").map(|m| m.eq_ignore_ascii_case("http")).unwrap_or(false)
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout belongs to the MCP transport.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "andromeda_mcp_server=info,andromeda_mcp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            process::exit(1);
        }
    };
    info!(
        "Network {} ({}) via {}",
        config.network.name, config.network.chain_id, config.network.rpc_endpoint
    );

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to build the Andromeda adapter: {:#}", e);
            process::exit(1);
        }
    };

    // Tools retry the connection on first use, so a cold node is not fatal.
    if let Err(e) = state.adapter.initialize().await {
        warn!("Initial connection failed: {}", e);
    }

    let outcome = if http_mode_requested() {
        run_http_server(state).await
    } else {
        run_mcp_server(state).await
    };

    if let Err(e) = outcome {
        error!("Transport failed: {}", e);
        process::exit(1);
    }
}
