//! Proxy inventory from the host admin API.
//!
//! The sweeper may only delete a session key when its client is no
//! longer connected. The host knows: its admin API reports, per proxy
//! group and proxy, which client addresses are currently busy. When the
//! API cannot be reached every session is treated as busy, which makes
//! the sweep a safe no-op.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::error;

/// Inventory client construction errors.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The configured admin API address did not parse as a URL
    #[error("invalid API address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// One proxy's client lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(default)]
    pub available: Vec<String>,
    #[serde(default)]
    pub busy: Vec<String>,
    #[serde(default)]
    pub total: i64,
}

/// Inventory: proxy group → proxy name → client lists.
pub type ProxyMap = HashMap<String, HashMap<String, Proxy>>;

/// Source of the proxy inventory.
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// Fetches the current inventory. `None` means the API was
    /// unreachable; callers must then assume every client is busy.
    async fn proxies(&self) -> Option<ProxyMap>;
}

/// True when `address` appears in any proxy's busy list.
///
/// A `None` inventory reads as busy so an unreachable API can never
/// cause a live session to be swept.
pub fn is_busy(inventory: Option<&ProxyMap>, address: &str) -> bool {
    let Some(inventory) = inventory else {
        return true;
    };
    inventory
        .values()
        .flat_map(HashMap::values)
        .any(|proxy| proxy.busy.iter().any(|busy| busy == address))
}

/// Inventory client over the host's JSON admin endpoint.
pub struct HttpInventoryApi {
    url: reqwest::Url,
    client: reqwest::Client,
}

impl HttpInventoryApi {
    /// Builds a client for the admin API at `address`.
    ///
    /// Fails on an unparsable address; reachability is only known per
    /// request.
    pub fn new(address: &str) -> Result<Self, InventoryError> {
        let invalid = |reason: String| InventoryError::InvalidAddress {
            address: address.to_string(),
            reason,
        };
        let url = reqwest::Url::parse(address)
            .map_err(|e| invalid(e.to_string()))?
            .join("v1/proxies")
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self {
            url,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryApi {
    async fn proxies(&self) -> Option<ProxyMap> {
        let response = match self.client.get(self.url.clone()).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(%err, "failed to reach the proxy inventory API");
                return None;
            }
        };
        match response.error_for_status() {
            Ok(response) => match response.json::<ProxyMap>().await {
                Ok(inventory) => Some(inventory),
                Err(err) => {
                    error!(%err, "failed to decode the proxy inventory");
                    None
                }
            },
            Err(err) => {
                error!(%err, "proxy inventory API returned an error");
                None
            }
        }
    }
}
