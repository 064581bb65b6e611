// src/blockchain/mod.rs

pub mod adapter;
pub mod client;
pub mod error;
pub mod models;
pub mod transactions;
pub mod wallet;
pub mod wasm;

// Re-export commonly used types
pub use adapter::AndromedaAdapter;
pub use error::{AdapterError, Result};
