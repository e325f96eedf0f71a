//! Etherscan-style source verification.

use std::future::Future;

use alloy_core::primitives::Address;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::args::{ArgValue, encode_constructor};
use crate::backend::VerifyBackend;
use crate::error::DeployError;

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    result: String,
}

/// Submits `verifysourcecode` requests to an etherscan-compatible API.
///
/// The explorer compiles asynchronously; this reports submission acceptance
/// and leaves polling the final outcome to the explorer UI.
pub struct ExplorerVerifier {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
}

impl ExplorerVerifier {
    pub fn new(api_url: &str, api_key: impl Into<String>) -> Result<Self, DeployError> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_url: Url::parse(api_url)?,
            api_key: api_key.into(),
        })
    }
}

impl VerifyBackend for ExplorerVerifier {
    fn verify(
        &self,
        address: Address,
        contract: &str,
        args: &[ArgValue],
    ) -> impl Future<Output = Result<(), DeployError>> + Send {
        async move {
            let encoded_args = hex::encode(encode_constructor(args));
            let address_field = address.to_string();
            // Field name typo is part of the etherscan API.
            let form = [
                ("module", "contract"),
                ("action", "verifysourcecode"),
                ("contractaddress", address_field.as_str()),
                ("contractname", contract),
                ("constructorArguements", encoded_args.as_str()),
                ("apikey", self.api_key.as_str()),
            ];

            let response: ExplorerResponse = self
                .client
                .post(self.api_url.clone())
                .form(&form)
                .send()
                .await?
                .json()
                .await?;

            if response.status != "1" {
                return Err(DeployError::VerificationFailed {
                    address,
                    reason: response.result,
                });
            }
            debug!(%address, contract, guid = %response.result, "verification submitted");
            Ok(())
        }
    }
}
