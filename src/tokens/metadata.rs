/// Token metadata from a DAS (Digital Asset Standard) index
///
/// Methods used:
/// 1. getAssetBatch - metadata for up to `batch_size` mints
/// 2. getAsset - metadata for a single mint
///
/// Metadata is decoration only: every failure is logged and reported as
/// "no metadata", never as a scan or build failure.
use crate::config::MetadataConfig;
use crate::errors::{ReclaimError, ReclaimResult};
use crate::logger::{self, LogTag};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub mint: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub image: Option<String>,
    /// Decimals as reported by the index, not authoritative
    pub decimals: Option<u8>,
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Metadata for each mint the index knows; unknown mints are absent
    async fn get_assets(&self, mints: &[String]) -> ReclaimResult<HashMap<String, TokenMetadata>>;

    async fn get_asset(&self, mint: &str) -> ReclaimResult<Option<TokenMetadata>>;
}

/// Source used when metadata lookups are switched off
pub struct NoMetadata;

#[async_trait]
impl MetadataSource for NoMetadata {
    async fn get_assets(&self, _mints: &[String]) -> ReclaimResult<HashMap<String, TokenMetadata>> {
        Ok(HashMap::new())
    }

    async fn get_asset(&self, _mint: &str) -> ReclaimResult<Option<TokenMetadata>> {
        Ok(None)
    }
}

pub struct DasMetadataClient {
    http: reqwest::Client,
    url: String,
    batch_size: usize,
}

impl DasMetadataClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64, batch_size: usize) -> ReclaimResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ReclaimError::Configuration(format!("Metadata HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
            batch_size: batch_size.max(1),
        })
    }

    /// Build the configured source; an empty metadata url reuses the RPC url
    pub fn from_config(
        config: &MetadataConfig,
        rpc_url: &str,
    ) -> ReclaimResult<Box<dyn MetadataSource>> {
        if !config.enabled {
            return Ok(Box::new(NoMetadata));
        }
        let url = if config.url.trim().is_empty() {
            rpc_url.to_string()
        } else {
            config.url.clone()
        };
        Ok(Box::new(Self::new(url, config.timeout_secs, config.batch_size)?))
    }

    async fn request(&self, method: &str, params: Value) -> ReclaimResult<Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": "solreclaim",
            "method": method,
            "params": params,
        });

        let response = self.http.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ReclaimError::upstream(method, format!("HTTP {}", response.status())));
        }

        let mut payload: Value = response.json().await?;
        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error");
            return Err(ReclaimError::upstream(method, message));
        }

        Ok(payload.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl MetadataSource for DasMetadataClient {
    async fn get_assets(&self, mints: &[String]) -> ReclaimResult<HashMap<String, TokenMetadata>> {
        let mut found = HashMap::new();

        for chunk in mints.chunks(self.batch_size) {
            let result = self
                .request("getAssetBatch", serde_json::json!({ "ids": chunk }))
                .await?;
            let Some(assets) = result.as_array() else {
                continue;
            };
            for metadata in assets.iter().filter_map(parse_das_asset) {
                found.insert(metadata.mint.clone(), metadata);
            }
        }

        logger::debug(
            LogTag::Cache,
            &format!("Metadata index knew {}/{} mints", found.len(), mints.len()),
        );
        Ok(found)
    }

    async fn get_asset(&self, mint: &str) -> ReclaimResult<Option<TokenMetadata>> {
        let result = self
            .request("getAsset", serde_json::json!({ "id": mint }))
            .await?;
        Ok(parse_das_asset(&result))
    }
}

/// Extract the fields we display from a DAS asset object
pub fn parse_das_asset(asset: &Value) -> Option<TokenMetadata> {
    let mint = asset.get("id")?.as_str()?.to_string();
    let content = asset.get("content");
    let metadata = content.and_then(|c| c.get("metadata"));
    let token_info = asset.get("token_info");

    let text = |v: Option<&Value>| {
        v.and_then(|s| s.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let image = text(content.and_then(|c| c.get("links")).and_then(|l| l.get("image"))).or_else(
        || {
            text(
                content
                    .and_then(|c| c.get("files"))
                    .and_then(|f| f.as_array())
                    .and_then(|f| f.first())
                    .and_then(|f| f.get("uri")),
            )
        },
    );

    Some(TokenMetadata {
        mint,
        name: text(metadata.and_then(|m| m.get("name"))),
        symbol: text(metadata.and_then(|m| m.get("symbol")))
            .or_else(|| text(token_info.and_then(|t| t.get("symbol")))),
        image,
        decimals: token_info
            .and_then(|t| t.get("decimals"))
            .and_then(|d| d.as_u64())
            .and_then(|d| u8::try_from(d).ok()),
    })
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;

    /// Metadata source backed by a fixed map
    #[derive(Default)]
    pub struct FakeMetadata {
        known: HashMap<String, TokenMetadata>,
        failing: bool,
        pub batch_calls: Mutex<usize>,
    }

    impl FakeMetadata {
        pub fn with(mut self, mint: &str, name: &str, symbol: &str) -> Self {
            self.known.insert(
                mint.to_string(),
                TokenMetadata {
                    mint: mint.to_string(),
                    name: Some(name.to_string()),
                    symbol: Some(symbol.to_string()),
                    image: None,
                    decimals: None,
                },
            );
            self
        }

        /// Set the decimals hint of an already registered mint
        pub fn with_decimals(mut self, mint: &str, decimals: u8) -> Self {
            if let Some(entry) = self.known.get_mut(mint) {
                entry.decimals = Some(decimals);
            }
            self
        }

        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl MetadataSource for FakeMetadata {
        async fn get_assets(
            &self,
            mints: &[String],
        ) -> ReclaimResult<HashMap<String, TokenMetadata>> {
            *self.batch_calls.lock() += 1;
            if self.failing {
                return Err(ReclaimError::upstream("getAssetBatch", "index offline"));
            }
            Ok(mints
                .iter()
                .filter_map(|m| self.known.get(m).cloned().map(|md| (m.clone(), md)))
                .collect())
        }

        async fn get_asset(&self, mint: &str) -> ReclaimResult<Option<TokenMetadata>> {
            if self.failing {
                return Err(ReclaimError::upstream("getAsset", "index offline"));
            }
            Ok(self.known.get(mint).cloned())
        }
    }
}
