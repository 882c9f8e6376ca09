//! Basic address resolution.

use serde::{Deserialize, Serialize};

use crate::client::{PaymailClient, StandardResponse};
use crate::errors::{ResponseError, ResponseResult};
use crate::sender_request::SenderRequest;
use crate::utilities::replace_alias_domain;
use crate::PaymailError;

/// Output returned by address resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPayload {
    /// Legacy address paid by `output`; filled in by the client.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    /// Hex output script the sender must pay.
    #[serde(default)]
    pub output: String,
    /// Receiver's signature over the output, when sender validation is on.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

/// Response from address resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionResponse {
    /// Raw exchange.
    pub standard: StandardResponse,
    /// Decoded output.
    pub payload: ResolutionPayload,
}

paymail_response!(ResolutionResponse, ResolutionPayload);

impl PaymailClient {
    /// Ask the receiver for an output script to pay.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, resolution_url, sender_request), fields(sender = %sender_request.sender_handle))
    )]
    pub async fn resolve_address(
        &self,
        resolution_url: &str,
        alias: &str,
        domain: &str,
        sender_request: &SenderRequest,
    ) -> ResponseResult<ResolutionResponse> {
        self.validate_url(resolution_url)?;
        sender_request.check_required()?;

        let url = replace_alias_domain(resolution_url, alias, domain);
        let standard = self.post_request(&url, sender_request).await?;
        let mut response: ResolutionResponse =
            Self::decode_response(standard, &format!("{}@{}", alias, domain))?;

        if response.payload.output.is_empty() {
            return Err(ResponseError::with_response(
                PaymailError::malformed("missing an output value"),
                response,
            ));
        }

        match self.script().address_from_script(&response.payload.output) {
            Ok(address) => {
                response.payload.address = address;
                Ok(response)
            }
            Err(error) => Err(ResponseError::with_response(error, response)),
        }
    }
}
