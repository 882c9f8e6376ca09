//! Public key infrastructure lookup.

use serde::{Deserialize, Serialize};

use crate::client::{PaymailClient, StandardResponse};
use crate::config::PUB_KEY_LENGTH;
use crate::errors::{ResponseError, ResponseResult};
use crate::PaymailError;

/// Identity document returned by the pki capability.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkiPayload {
    /// bsvalias version.
    #[serde(rename = "bsvalias", default)]
    pub bsv_alias: String,
    /// Paymail the key belongs to.
    #[serde(default)]
    pub handle: String,
    /// Hex encoded compressed public key.
    #[serde(rename = "pubkey", default)]
    pub pub_key: String,
}

/// Response from a pki lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PkiResponse {
    /// Raw exchange.
    pub standard: StandardResponse,
    /// Decoded identity.
    pub payload: PkiPayload,
}

paymail_response!(PkiResponse, PkiPayload);

impl PaymailClient {
    /// Fetch the public key for `alias@domain`.
    ///
    /// The returned handle must equal `alias@domain` exactly and the key must
    /// be 66 hex characters.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, pki_url)))]
    pub async fn get_pki(&self, pki_url: &str, alias: &str, domain: &str) -> ResponseResult<PkiResponse> {
        let url = self.endpoint_url(pki_url, alias, domain)?;
        let handle = format!("{}@{}", alias, domain);

        let standard = self.get_request(&url).await?;
        let response: PkiResponse = Self::decode_response(standard, &handle)?;

        if response.payload.handle != handle {
            let error = PaymailError::malformed(format!(
                "pki response handle {} does not match paymail address: {}",
                response.payload.handle, handle
            ));
            return Err(ResponseError::with_response(error, response));
        }
        if response.payload.pub_key.is_empty() {
            let error = PaymailError::malformed("pki response is missing a pubkey value");
            return Err(ResponseError::with_response(error, response));
        }
        if response.payload.pub_key.len() != PUB_KEY_LENGTH {
            let error = PaymailError::malformed(format!(
                "returned pubkey is not the required length of {}, got: {}",
                PUB_KEY_LENGTH,
                response.payload.pub_key.len()
            ));
            return Err(ResponseError::with_response(error, response));
        }

        Ok(response)
    }
}
