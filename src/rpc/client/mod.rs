//! JSON-RPC client for the ledger node
//!
//! `HttpLedgerClient` speaks raw JSON-RPC over reqwest; every request goes
//! through the shared `RateLimitedCaller`. The typed surface used by the rest
//! of the crate is the `LedgerRpc` trait in `methods`.

mod methods;

pub use methods::LedgerRpc;

use crate::config::RpcConfig;
use crate::errors::{ReclaimError, ReclaimResult};
use crate::logger::{self, LogTag};
use crate::rpc::rate_limiter::RateLimitedCaller;
use crate::rpc::types::RpcCallError;
use crate::rpc::utils::is_rate_limit_message;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// JSON-RPC error codes some providers use for throttling
const THROTTLE_ERROR_CODES: [i64; 2] = [429, -32005];

pub struct HttpLedgerClient {
    http: reqwest::Client,
    url: String,
    caller: Arc<RateLimitedCaller>,
    request_id: AtomicU64,
}

impl HttpLedgerClient {
    pub fn new(url: impl Into<String>, caller: Arc<RateLimitedCaller>) -> ReclaimResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ReclaimError::Configuration("rpc.url is empty".to_string()));
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ReclaimError::Configuration(format!("HTTP client: {}", e)))?;

        logger::debug(LogTag::Rpc, &format!("Ledger client using {}", mask_url(&url)));

        Ok(Self {
            http,
            url,
            caller,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &RpcConfig) -> ReclaimResult<Self> {
        Self::new(
            config.url.clone(),
            Arc::new(RateLimitedCaller::from_config(config)),
        )
    }

    /// Execute a JSON-RPC method and return its `result` member
    pub async fn execute_raw(&self, method: &str, params: Value) -> ReclaimResult<Value> {
        self.caller
            .call(method, || self.send_once(method, params.clone()))
            .await
    }

    async fn send_once(&self, method: &str, params: Value) -> Result<Value, RpcCallError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcCallError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(RpcCallError::RateLimited { retry_after });
        }
        if !status.is_success() {
            return Err(RpcCallError::Transport(format!("HTTP {}", status)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RpcCallError::Decode(e.to_string()))?;

        interpret_response(payload)
    }
}

/// Split a JSON-RPC envelope into result or classified error
fn interpret_response(mut payload: Value) -> Result<Value, RpcCallError> {
    if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        if THROTTLE_ERROR_CODES.contains(&code) || is_rate_limit_message(&message) {
            return Err(RpcCallError::RateLimited { retry_after: None });
        }
        return Err(RpcCallError::Rpc { code, message });
    }

    match payload.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(RpcCallError::Decode("missing result".to_string())),
    }
}

/// Hide API keys embedded in provider URLs
fn mask_url(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?***", base),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_is_extracted() {
        let value = interpret_response(json!({"jsonrpc": "2.0", "id": 1, "result": {"value": 5}}))
            .unwrap();
        assert_eq!(value["value"], 5);
    }

    #[test]
    fn test_throttle_error_is_classified() {
        let err = interpret_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32005, "message": "Node is behind"}
        }))
        .unwrap_err();
        assert_eq!(err, RpcCallError::RateLimited { retry_after: None });

        let err = interpret_response(json!({
            "error": {"code": -32000, "message": "Too many requests for a specific RPC call"}
        }))
        .unwrap_err();
        assert!(matches!(err, RpcCallError::RateLimited { .. }));
    }

    #[test]
    fn test_other_error_is_passed_through() {
        let err = interpret_response(json!({
            "error": {"code": -32602, "message": "Invalid param: WrongSize"}
        }))
        .unwrap_err();
        assert!(matches!(err, RpcCallError::Rpc { code: -32602, .. }));
    }

    #[test]
    fn test_empty_url_rejected() {
        let caller = Arc::new(RateLimitedCaller::from_config(&RpcConfig::default()));
        assert!(HttpLedgerClient::new("  ", caller).is_err());
    }

    #[test]
    fn test_mask_url_hides_query() {
        assert_eq!(
            mask_url("https://rpc.example.com/?api-key=secret"),
            "https://rpc.example.com/?***"
        );
    }
}
