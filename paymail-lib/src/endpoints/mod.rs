//! Templated endpoint operations.
//!
//! Every operation follows the same shape: check its inputs locally, fill in
//! the URL template taken from the capability document, issue the request,
//! classify the status, decode the payload, and then check the fields the
//! protocol requires in a successful answer.

/// Implements the typed response plumbing shared by every endpoint.
macro_rules! paymail_response {
    ($response:ident, $payload:ty) => {
        impl $crate::client::PaymailResponse for $response {
            type Payload = $payload;

            fn from_parts(standard: $crate::client::StandardResponse, payload: Self::Payload) -> Self {
                Self { standard, payload }
            }
        }

        impl std::ops::Deref for $response {
            type Target = $payload;

            fn deref(&self) -> &Self::Target {
                &self.payload
            }
        }
    };
}

pub(crate) use paymail_response;

pub mod p2p_destination;
pub mod p2p_transaction;
pub mod pki;
pub mod public_profile;
pub mod resolve_address;
pub mod verify_pubkey;

pub use p2p_destination::{PaymentDestinationPayload, PaymentDestinationResponse, PaymentOutput, PaymentRequest};
pub use p2p_transaction::{P2PMetadata, P2PTransaction, P2PTransactionPayload, P2PTransactionResponse};
pub use pki::{PkiPayload, PkiResponse};
pub use public_profile::{PublicProfilePayload, PublicProfileResponse};
pub use resolve_address::{ResolutionPayload, ResolutionResponse};
pub use verify_pubkey::{VerificationPayload, VerificationResponse};

use crate::client::PaymailClient;
use crate::utilities::replace_alias_domain;
use crate::{PaymailError, Result};

impl PaymailClient {
    /// Validate the template, alias and domain, and return the request URL.
    pub(crate) fn endpoint_url(&self, template: &str, alias: &str, domain: &str) -> Result<String> {
        self.validate_url(template)?;
        if alias.is_empty() {
            return Err(PaymailError::invalid_data("alias", "missing alias"));
        }
        if domain.is_empty() {
            return Err(PaymailError::invalid_data("domain", "missing domain"));
        }
        Ok(replace_alias_domain(template, alias, domain))
    }
}
