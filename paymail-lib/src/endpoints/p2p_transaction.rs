//! P2P transaction submission.

use serde::{Deserialize, Serialize};

use crate::client::{PaymailClient, StandardResponse};
use crate::errors::{ResponseError, ResponseResult};
use crate::PaymailError;

/// Metadata sent alongside a raw transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PMetadata {
    /// Human readable note.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    /// Key that made `signature`.
    #[serde(rename = "pubkey", default, skip_serializing_if = "String::is_empty")]
    pub pub_key: String,
    /// Sender's paymail.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender: String,
    /// Sender's signature over the txid.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

/// A raw transaction for the receiver.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PTransaction {
    /// Hex encoded raw transaction.
    pub hex: String,
    /// Sender metadata.
    #[serde(rename = "metadata", default)]
    pub metadata: P2PMetadata,
    /// Reference from the payment destination response.
    pub reference: String,
}

/// Receiver's acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2PTransactionPayload {
    /// Note from the receiver.
    #[serde(default)]
    pub note: String,
    /// Id of the accepted transaction.
    #[serde(rename = "txid", default)]
    pub tx_id: String,
}

/// Response from a P2P transaction submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct P2PTransactionResponse {
    /// Raw exchange.
    pub standard: StandardResponse,
    /// Decoded acknowledgement.
    pub payload: P2PTransactionPayload,
}

paymail_response!(P2PTransactionResponse, P2PTransactionPayload);

impl PaymailClient {
    /// Hand a signed transaction to the receiver.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, p2p_url, transaction), fields(reference = %transaction.reference))
    )]
    pub async fn send_p2p_transaction(
        &self,
        p2p_url: &str,
        alias: &str,
        domain: &str,
        transaction: &P2PTransaction,
    ) -> ResponseResult<P2PTransactionResponse> {
        let url = self.endpoint_url(p2p_url, alias, domain)?;
        if transaction.hex.is_empty() {
            return Err(PaymailError::invalid_data("hex", "hex is required").into());
        }
        if transaction.reference.is_empty() {
            return Err(PaymailError::invalid_data("reference", "reference is required").into());
        }

        let standard = self.post_request(&url, transaction).await?;
        let response: P2PTransactionResponse =
            Self::decode_response(standard, &format!("{}@{}", alias, domain))?;

        if response.payload.tx_id.is_empty() {
            return Err(ResponseError::with_response(
                PaymailError::malformed("missing a returned txid"),
                response,
            ));
        }

        Ok(response)
    }
}
