//! Argument extraction helpers for tool implementations.
//!
//! ```rust
//! use mwtooling::{require_object, required_string};
//! use serde_json::json;
//!
//! let args = json!({"query": "P-12"});
//! let object = require_object(&args).expect("object arguments");
//! let query = required_string(object, "query").expect("query should be present");
//! assert_eq!(query, "P-12");
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

pub fn require_object(arguments: &Value) -> Result<&Map<String, Value>, ToolError> {
    arguments
        .as_object()
        .ok_or_else(|| ToolError::invalid_arguments("expected JSON object arguments"))
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn optional_u64(args: &Map<String, Value>, key: &str) -> Result<Option<u64>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            ToolError::invalid_arguments(format!("'{key}' must be a non-negative integer"))
        }),
    }
}
