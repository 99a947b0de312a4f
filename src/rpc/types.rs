//! Control-plane wire types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded control-plane request
#[derive(Clone, Debug, PartialEq)]
pub struct RpcRequest {
    pub id: u64,
    pub method: String,
    pub params: Map<String, Value>,
    pub token: Option<String>,
}

impl RpcRequest {
    /// `params[name]` or `Value::Null`
    pub fn param(&self, name: &str) -> &Value {
        self.params.get(name).unwrap_or(&Value::Null)
    }

    /// `params[name]` as a string; non-strings read as empty
    pub fn str_param(&self, name: &str) -> &str {
        self.param(name).as_str().unwrap_or_default()
    }
}

/// Reply to a control-plane request
///
/// `error` is always present on the wire, `null` on success.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub id: u64,
    pub result: Value,
    pub error: Option<String>,
}

impl RpcResponse {
    pub fn success(id: u64, result: Value) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    pub fn error(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            result: Value::Null,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_null_error() {
        let resp = RpcResponse::success(7, json!({"ok": 1}));
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"id": 7, "result": {"ok": 1}, "error": null})
        );
    }

    #[test]
    fn test_error_serializes_null_result() {
        let resp = RpcResponse::error(3, "unauthorized");
        assert!(resp.is_error());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"id": 3, "result": null, "error": "unauthorized"})
        );
    }
}
