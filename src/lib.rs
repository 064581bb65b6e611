// src/lib.rs

use std::sync::Arc;

pub mod ado;
pub mod api;
pub mod blockchain;
pub mod config;
pub mod mcp;
pub mod utils;

#[cfg(test)]
mod testing;

use blockchain::AndromedaAdapter;
use config::Config;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Chain access for every tool call
    pub adapter: Arc<AndromedaAdapter>,
}

impl AppState {
    /// Wraps a fresh, not yet connected adapter around `config`.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let adapter = Arc::new(AndromedaAdapter::new(config.clone())?);
        Ok(Self { config, adapter })
    }
}
