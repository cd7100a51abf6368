//! Consul KV backend.
//!
//! Reads a single key through the agent's HTTP API. The key's
//! `ModifyIndex` is the version token, so an unchanged key is always a
//! no-op reload.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{ConfigSource, RawConfig, SourceError};
use crate::config::ConsulSettings;
use crate::store::VersionToken;

const SOURCE_NAME: &str = "consul";

/// One entry of a `GET /v1/kv/<key>` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvPair {
    key: String,
    value: Option<String>,
    modify_index: u64,
}

/// Client for a Consul agent's KV store.
#[derive(Debug, Clone)]
pub struct ConsulSource {
    client: Client,
    address: String,
    token: Option<String>,
    datacenter: Option<String>,
}

impl ConsulSource {
    pub fn new(settings: &ConsulSettings) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, e))?;

        Ok(Self {
            client,
            address: settings.address.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            datacenter: settings.datacenter.clone(),
        })
    }

    /// Write `value` under `key`. Returns Consul's acknowledgement.
    pub async fn put(&self, key: &str, value: Vec<u8>) -> Result<bool, SourceError> {
        let url = self.kv_url(key)?;
        let response = self
            .request(Method::PUT, url)
            .body(value)
            .send()
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::unavailable(
                SOURCE_NAME,
                format!("unexpected status {}", status),
            ));
        }

        response
            .json::<bool>()
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, format!("invalid response: {}", e)))
    }

    fn kv_url(&self, key: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!(
            "{}/v1/kv/{}",
            self.address,
            key.trim_start_matches('/')
        ))
        .map_err(|e| SourceError::unavailable(SOURCE_NAME, format!("invalid address: {}", e)))?;

        if let Some(dc) = &self.datacenter {
            url.query_pairs_mut().append_pair("dc", dc);
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header("X-Consul-Token", token),
            None => builder,
        }
    }
}

#[async_trait]
impl ConfigSource for ConsulSource {
    async fn fetch(&self, key: &str) -> Result<RawConfig, SourceError> {
        let url = self.kv_url(key)?;
        tracing::debug!(url = %url, "Fetching configuration from Consul");

        let response = self
            .request(Method::GET, url)
            .send()
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::not_found(key));
        }
        if !status.is_success() {
            return Err(SourceError::unavailable(
                SOURCE_NAME,
                format!("unexpected status {}", status),
            ));
        }

        let pairs: Vec<KvPair> = response
            .json()
            .await
            .map_err(|e| SourceError::unavailable(SOURCE_NAME, format!("invalid response: {}", e)))?;
        let pair = pairs
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::not_found(key))?;

        let bytes = match pair.value {
            Some(encoded) => STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                SourceError::unavailable(SOURCE_NAME, format!("invalid value encoding: {}", e))
            })?,
            None => Vec::new(),
        };

        tracing::debug!(
            key = %pair.key,
            modify_index = pair.modify_index,
            bytes = bytes.len(),
            "Fetched KV pair"
        );

        Ok(RawConfig {
            bytes,
            version: VersionToken::new(pair.modify_index),
        })
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
