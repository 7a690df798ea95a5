// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interface for making requests to the virtualization platform's
//! management API.
//!
//! Timeouts, retries and TLS policy belong to the underlying
//! [`reqwest::Client`]; pass a configured one to [`Client::with_client`] to
//! change them.

use reqwest::Url;
use serde::de::DeserializeOwned;
use slog::{info, o, Logger};
use thiserror::Error;

pub mod api;

/// Errors which may be returned from the client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Bad Status: {0}")]
    Status(u16),

    #[error("Endpoint {0} cannot be used as a base URL")]
    Endpoint(String),
}

/// The node-scoped operations the provider relies on.
#[async_trait::async_trait]
pub trait NodeApi: Send + Sync {
    /// Lists the network interfaces configured on `node`.
    async fn list_networks(
        &self,
        node: &str,
    ) -> Result<api::NetworkListResponse, Error>;

    /// Fetches the current configuration of VM `vm_id` on `node`.
    async fn vm_config(
        &self,
        node: &str,
        vm_id: i64,
    ) -> Result<api::VmConfigResponse, Error>;
}

/// Client-side connection to the management API.
pub struct Client {
    client: reqwest::Client,
    log: Logger,
    endpoint: Url,
}

// Sends "request", awaits "response", and returns an error on any
// non-success status code.
async fn send_and_check_ok(
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, Error> {
    let response = request.send().await.map_err(Error::from)?;

    if !response.status().is_success() {
        return Err(Error::Status(response.status().as_u16()));
    }

    Ok(response)
}

// Sends a "request", awaits "response", and parses the body
// into a deserializable type.
async fn send_and_parse_response<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, Error> {
    send_and_check_ok(request).await?.json().await.map_err(|e| e.into())
}

impl Client {
    /// Creates a client for the API rooted at `endpoint`, e.g.
    /// `https://pve.example.com:8006/api2/json`.
    pub fn new(endpoint: Url, log: Logger) -> Client {
        Self::with_client(reqwest::Client::new(), endpoint, log)
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: Url,
        log: Logger,
    ) -> Client {
        Client {
            client,
            log: log.new(o!("pve_client endpoint" => endpoint.to_string())),
            endpoint,
        }
    }

    /// Appends `segments` to the endpoint's path, percent-encoding each one
    /// so that it stays a single segment.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Endpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        info!(self.log, "GET request to {}", url);
        send_and_parse_response(self.client.get(url)).await
    }
}

#[async_trait::async_trait]
impl NodeApi for Client {
    async fn list_networks(
        &self,
        node: &str,
    ) -> Result<api::NetworkListResponse, Error> {
        self.get(&["nodes", node, "network"]).await
    }

    async fn vm_config(
        &self,
        node: &str,
        vm_id: i64,
    ) -> Result<api::VmConfigResponse, Error> {
        let vm_id = vm_id.to_string();
        self.get(&["nodes", node, "qemu", &vm_id, "config"]).await
    }
}
