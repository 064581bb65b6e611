//! Small helpers shared by the ADO flows and the MCP handler.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};

/// Base64 of a message's JSON, the `Binary` form hook messages travel in.
pub fn encode_binary<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    Ok(STANDARD.encode(serde_json::to_vec(msg)?))
}

/// Successful tool result: the payload as pretty-printed JSON text.
pub fn text_result(payload: &Value) -> Value {
    let text = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    json!({ "content": [{ "type": "text", "text": text }] })
}

/// Failed tool result, flagged with `isError`.
pub fn error_result(message: impl std::fmt::Display) -> Value {
    json!({
        "content": [{ "type": "text", "text": format!("Error: {}", message) }],
        "isError": true
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_is_standard_base64_of_compact_json() {
        let encoded = encode_binary(&json!({"stake_tokens": {}})).unwrap();
        assert_eq!(encoded, "eyJzdGFrZV90b2tlbnMiOnt9fQ==");
    }

    #[test]
    fn error_results_are_flagged() {
        let result = error_result("Unknown tool: nope");
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Error: Unknown tool: nope");
        assert!(text_result(&json!({"a": 1})).get("isError").is_none());
    }
}
