//! Public key owner verification.

use serde::{Deserialize, Serialize};

use crate::client::{PaymailClient, StandardResponse};
use crate::errors::ResponseResult;
use crate::PaymailError;

/// Answer to "does this key belong to this paymail?".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationPayload {
    /// bsvalias version.
    #[serde(rename = "bsvalias", default)]
    pub bsv_alias: String,
    /// Paymail that was checked.
    #[serde(default)]
    pub handle: String,
    /// Key that was checked.
    #[serde(rename = "pubkey", default)]
    pub pub_key: String,
    /// Whether the key belongs to the handle.
    #[serde(rename = "match", default)]
    pub matches: bool,
}

/// Response from a pubkey verification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerificationResponse {
    /// Raw exchange.
    pub standard: StandardResponse,
    /// Decoded answer.
    pub payload: VerificationPayload,
}

paymail_response!(VerificationResponse, VerificationPayload);

impl PaymailClient {
    /// Ask the host whether `pub_key` belongs to `alias@domain`.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, verify_url)))]
    pub async fn verify_pub_key(
        &self,
        verify_url: &str,
        alias: &str,
        domain: &str,
        pub_key: &str,
    ) -> ResponseResult<VerificationResponse> {
        let url = self.endpoint_url(verify_url, alias, domain)?;
        if pub_key.is_empty() {
            return Err(PaymailError::invalid_data("pubkey", "missing pubkey").into());
        }

        let url = url.replace("{pubkey}", pub_key);
        let standard = self.get_request(&url).await?;
        Self::decode_response(standard, &format!("{}@{}", alias, domain))
    }
}
