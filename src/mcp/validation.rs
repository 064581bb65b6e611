// src/mcp/validation.rs
//
// Schema pass over a raw argument bag: defaults, required fields, light
// coercion, enum checks. Errors name the offending field path.

use serde_json::{Map, Number, Value};

use crate::blockchain::error::AdapterError;
use crate::mcp::registry::{Param, ParamKind, ToolSpec};

fn invalid(path: &str, problem: impl std::fmt::Display) -> AdapterError {
    AdapterError::Validation(format!("field '{}' {}", path, problem))
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Validates `args` against the tool's parameters and returns the normalized
/// object. `null` and a missing bag both mean "no arguments".
pub fn validate_arguments(tool: &ToolSpec, args: &Value) -> Result<Value, AdapterError> {
    match args {
        Value::Null => validate_fields(tool.params, &Map::new(), ""),
        Value::Object(map) => validate_fields(tool.params, map, ""),
        other => Err(AdapterError::Validation(format!(
            "arguments must be an object, got {}",
            type_name(other)
        ))),
    }
}

fn validate_fields(
    params: &[Param],
    input: &Map<String, Value>,
    parent: &str,
) -> Result<Value, AdapterError> {
    // Unknown keys pass through; the typed pass ignores them.
    let mut out = input.clone();
    for param in params {
        let path = join(parent, param.name);
        match input.get(param.name).filter(|v| !v.is_null()) {
            Some(value) => {
                out.insert(param.name.to_string(), coerce(&param.kind, value, &path)?);
            }
            None => {
                out.remove(param.name);
                if let Some(default) = param.default {
                    out.insert(param.name.to_string(), default.to_value());
                } else if param.required {
                    return Err(invalid(&path, "is required"));
                }
            }
        }
    }
    Ok(Value::Object(out))
}

fn coerce(kind: &ParamKind, value: &Value, path: &str) -> Result<Value, AdapterError> {
    match (kind, value) {
        (ParamKind::String, Value::String(_)) => Ok(value.clone()),
        (ParamKind::String, Value::Number(n)) => Ok(Value::String(n.to_string())),

        (ParamKind::Number, Value::Number(_)) => Ok(value.clone()),
        (ParamKind::Number, Value::String(s)) => parse_integer(s)
            .or_else(|| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            })
            .ok_or_else(|| invalid(path, format!("must be a number, got '{}'", s))),

        (ParamKind::Integer, Value::Number(n)) => integer_from_number(n)
            .ok_or_else(|| invalid(path, format!("must be a whole number, got {}", n))),
        (ParamKind::Integer, Value::String(s)) => parse_integer(s)
            .ok_or_else(|| invalid(path, format!("must be a whole number, got '{}'", s))),

        (ParamKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (ParamKind::Boolean, Value::String(s)) => match s.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid(path, format!("must be a boolean, got '{}'", s))),
        },

        (ParamKind::AnyObject, Value::Object(_)) => Ok(value.clone()),
        (ParamKind::Object(fields), Value::Object(map)) => validate_fields(fields, map, path),
        // Clients sometimes send nested objects as JSON text.
        (ParamKind::AnyObject | ParamKind::Object(_), Value::String(s)) => {
            match serde_json::from_str::<Value>(s) {
                Ok(parsed @ Value::Object(_)) => coerce(kind, &parsed, path),
                _ => Err(invalid(path, "must be an object")),
            }
        }

        (ParamKind::Array(item), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| coerce(item, v, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),

        (ParamKind::Enum(allowed), Value::String(s)) if allowed.contains(&s.as_str()) => {
            Ok(value.clone())
        }
        (ParamKind::Enum(allowed), _) => Err(invalid(
            path,
            format!("must be one of {}", allowed.join(", ")),
        )),

        (expected, got) => Err(invalid(
            path,
            format!("must be {}, got {}", kind_name(expected), type_name(got)),
        )),
    }
}

/// Exact integer parse; never routed through `f64`.
fn parse_integer(s: &str) -> Option<Value> {
    let s = s.trim();
    s.parse::<i64>()
        .map(Value::from)
        .or_else(|_| s.parse::<u64>().map(Value::from))
        .ok()
}

fn integer_from_number(n: &Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        return Some(Value::from(i));
    }
    if let Some(u) = n.as_u64() {
        return Some(Value::from(u));
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| Value::from(f as i64))
}

fn kind_name(kind: &ParamKind) -> &'static str {
    match kind {
        ParamKind::String | ParamKind::Enum(_) => "a string",
        ParamKind::Number => "a number",
        ParamKind::Integer => "a whole number",
        ParamKind::Boolean => "a boolean",
        ParamKind::AnyObject | ParamKind::Object(_) => "an object",
        ParamKind::Array(_) => "an array",
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
