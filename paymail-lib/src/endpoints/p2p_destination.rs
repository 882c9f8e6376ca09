//! P2P payment destinations.

use serde::{Deserialize, Serialize};

use crate::client::{PaymailClient, StandardResponse};
use crate::errors::{ResponseError, ResponseResult};
use crate::PaymailError;

/// Body of a P2P payment destination request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount the sender intends to pay.
    pub satoshis: u64,
}

/// A single output the sender should pay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutput {
    /// Legacy address paid by `script`; filled in by the client.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    /// Amount for this output.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub satoshis: u64,
    /// Hex locking script.
    #[serde(default)]
    pub script: String,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Outputs and reference returned by the receiver.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDestinationPayload {
    /// Outputs to pay.
    #[serde(default)]
    pub outputs: Vec<PaymentOutput>,
    /// Receiver's reference, echoed back when the transaction is sent.
    #[serde(default)]
    pub reference: String,
}

/// Response from a P2P payment destination request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymentDestinationResponse {
    /// Raw exchange.
    pub standard: StandardResponse,
    /// Decoded destination.
    pub payload: PaymentDestinationPayload,
}

paymail_response!(PaymentDestinationResponse, PaymentDestinationPayload);

impl PaymailClient {
    /// Ask the receiver for outputs to pay `payment_request.satoshis`.
    ///
    /// Outputs with an empty script are left without an address. Any other
    /// script that does not yield an address fails the whole response.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, p2p_url)))]
    pub async fn get_p2p_payment_destination(
        &self,
        p2p_url: &str,
        alias: &str,
        domain: &str,
        payment_request: &PaymentRequest,
    ) -> ResponseResult<PaymentDestinationResponse> {
        let url = self.endpoint_url(p2p_url, alias, domain)?;
        if payment_request.satoshis == 0 {
            return Err(PaymailError::invalid_data("satoshis", "satoshis is required").into());
        }

        let standard = self.post_request(&url, payment_request).await?;
        let mut response: PaymentDestinationResponse =
            Self::decode_response(standard, &format!("{}@{}", alias, domain))?;

        if response.payload.reference.is_empty() {
            return Err(ResponseError::with_response(
                PaymailError::malformed("missing a returned reference value"),
                response,
            ));
        }
        if response.payload.outputs.is_empty() {
            return Err(ResponseError::with_response(
                PaymailError::malformed("missing a returned output"),
                response,
            ));
        }

        for index in 0..response.payload.outputs.len() {
            let script = &response.payload.outputs[index].script;
            if script.is_empty() {
                continue;
            }
            match self.script().address_from_script(script) {
                Ok(address) => response.payload.outputs[index].address = address,
                Err(error) => return Err(ResponseError::with_response(error, response)),
            }
        }

        Ok(response)
    }
}
