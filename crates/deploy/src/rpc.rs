//! Thin JSON-RPC client over HTTP.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::DeployError;

/// Default timeout for RPC requests. Deployment transactions themselves are
/// not awaited inside a single request, so this stays short.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC 2.0 client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self, DeployError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: Url::parse(url)?,
        })
    }

    /// Makes a JSON-RPC call and deserializes the `result` field. An `error`
    /// field in the response becomes [`DeployError::Rpc`].
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, DeployError> {
        let response: Value = self
            .client
            .post(self.url.clone())
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
                .to_owned();
            return Err(DeployError::Rpc {
                method: method.to_owned(),
                message,
            });
        }

        let result = response.get("result").cloned().ok_or_else(|| DeployError::Rpc {
            method: method.to_owned(),
            message: "no result in response".to_owned(),
        })?;

        Ok(serde_json::from_value(result)?)
    }
}
