//! JSON-RPC 2.0 envelope spoken to the registry authority.
//!
//! Every authority call is a single `POST` carrying one request object:
//! `{"jsonrpc": "2.0", "method": "...", "params": ..., "id": ...}`.
//!
//! # Authority Methods
//!
//! - [`FETCH_FULL_METHOD`]: returns a `RegistrySnapshot`
//! - [`FETCH_DELTA_METHOD`]: returns a `DeltaBatch`
//! - [`CANCEL_METHOD`]: deregisters `{service_name, instance_id}`, returns `null`
//!
//! # Example
//!
//! ```
//! use regcache_common::protocol::jsonrpc::{JsonRpcRequest, JsonRpcResponse, FETCH_FULL_METHOD};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::new(FETCH_FULL_METHOD, json!({}), json!(1));
//! let response = JsonRpcResponse::success(json!(1), json!({}));
//! assert_eq!(response.into_result().unwrap(), json!({}));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{RegcacheError, Result};

pub const FETCH_FULL_METHOD: &str = "registry.fetch_full";
pub const FETCH_DELTA_METHOD: &str = "registry.fetch_delta";
pub const CANCEL_METHOD: &str = "registry.cancel";

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Name of the method to invoke
    pub method: String,
    /// Parameter values
    pub params: Value,
    /// Request identifier
    pub id: Value,
}

impl JsonRpcRequest {
    pub fn new(method: &str, params: Value, id: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 response
///
/// Exactly one of `result` and `error` is present on a well-formed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code (standard codes are negative integers)
    pub code: i32,
    /// Short description of the error
    pub message: String,
    /// Additional data (optional)
    pub data: Option<Value>,
}

/// The method does not exist / is not available
pub const METHOD_NOT_FOUND: i32 = -32601;

impl JsonRpcError {
    /// Error an authority returns for a method it does not serve.
    pub fn method_not_found() -> Self {
        Self::with_code(METHOD_NOT_FOUND, "Method not found")
    }

    fn with_code(code: i32, message: &str) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// Extracts the result, turning an error object into
    /// [`RegcacheError::Authority`].
    ///
    /// A response with neither field is treated as a `null` result, which is
    /// what notifications like `registry.cancel` return.
    pub fn into_result(self) -> Result<Value> {
        if let Some(error) = self.error {
            return Err(RegcacheError::Authority {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}
