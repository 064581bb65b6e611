// src/blockchain/error.rs

use thiserror::Error;

// --- Error types for wallet operations ---

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("key derivation failed: {0}")]
    Derivation(String),
    #[error("failed to generate mnemonic: {0}")]
    Generation(String),
}

/// One failed attempt inside a message-shape strategy run.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub label: String,
    pub reason: String,
}

fn render_failures(failures: &[AttemptFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.label, f.reason))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Every failure the adapter can report back through a tool call.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Client not initialized: {0}")]
    NotInitialized(String),

    #[error("{0}")]
    Connectivity(String),

    #[error("Invalid arguments: {0}")]
    Validation(String),

    #[error("Transaction rejected with code {code}: {log}")]
    RemoteRejection { code: u32, log: String },

    #[error("{flow} failed at step '{failed_step}' after {completed} succeeded: {reason}. The earlier step is not rolled back")]
    PartialFailure {
        flow: String,
        completed: String,
        failed_step: String,
        reason: String,
    },

    #[error("All {operation} format variations failed:\n{}", render_failures(.failures))]
    AllAttemptsFailed {
        operation: String,
        failures: Vec<AttemptFailure>,
    },

    #[error("Failed to get ADO code ID and no fallback available for type: {ado_type}. Original error: {reason}")]
    CodeIdUnavailable { ado_type: String, reason: String },

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout(err.to_string())
        } else {
            AdapterError::Connectivity(err.to_string())
        }
    }
}

impl AdapterError {
    /// Whether a strategy runner may move on to the next message shape.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdapterError::RemoteRejection { .. }
                | AdapterError::Connectivity(_)
                | AdapterError::CodeIdUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combined_error_lists_every_attempt() {
        let err = AdapterError::AllAttemptsFailed {
            operation: "App".to_string(),
            failures: vec![
                AttemptFailure {
                    label: "minimal".to_string(),
                    reason: "unknown field `modules`".to_string(),
                },
                AttemptFailure {
                    label: "app-contract".to_string(),
                    reason: "out of gas".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.starts_with("All App format variations failed:"));
        assert!(text.contains("minimal: unknown field `modules`"));
        assert!(text.contains("app-contract: out of gas"));
    }

    #[test]
    fn chain_and_lookup_failures_move_on_to_the_next_shape() {
        assert!(AdapterError::RemoteRejection { code: 5, log: "x".into() }.is_retryable());
        assert!(AdapterError::Connectivity("node unreachable".into()).is_retryable());
        assert!(AdapterError::CodeIdUnavailable {
            ado_type: "cw721".into(),
            reason: "no fallback".into(),
        }
        .is_retryable());
        assert!(!AdapterError::Validation("x".into()).is_retryable());
        assert!(!AdapterError::Timeout("x".into()).is_retryable());
    }
}
