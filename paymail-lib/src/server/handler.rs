//! Transport-agnostic request handlers.
//!
//! Each handler takes the already-extracted request parameters and returns
//! either the JSON payload for a 200 response or an [`ErrorResponse`]. Wiring
//! them to an HTTP framework is left to the caller.

use std::fmt;

use super::config::ServerConfig;
use super::provider::{RequestMetadata, ServiceProvider};
use crate::capabilities::CapabilitiesPayload;
use crate::client::ServerError;
use crate::config::PUB_KEY_LENGTH;
use crate::endpoints::{
    P2PTransaction, P2PTransactionPayload, PaymentDestinationPayload, PaymentRequest, PkiPayload,
    PublicProfilePayload, ResolutionPayload, VerificationPayload,
};
use crate::sender_request::SenderRequest;
use crate::server::provider::PaymailAddress;
use crate::utilities::{sanitize_paymail, validate_paymail, validate_timestamp};

pub const ERROR_FINDING_PAYMAIL: &str = "error-finding-paymail";
pub const ERROR_INVALID_DT: &str = "invalid-dt";
pub const ERROR_INVALID_PARAMETER: &str = "invalid-parameter";
pub const ERROR_INVALID_PUBKEY: &str = "invalid-pubkey";
pub const ERROR_INVALID_SENDER_HANDLE: &str = "invalid-sender-handle";
pub const ERROR_INVALID_SIGNATURE: &str = "invalid-signature";
pub const ERROR_MISSING_HEX: &str = "missing-hex";
pub const ERROR_MISSING_REFERENCE: &str = "missing-reference";
pub const ERROR_MISSING_SATOSHIS: &str = "missing-satoshis";
pub const ERROR_PAYMAIL_NOT_FOUND: &str = "not-found";
pub const ERROR_RECORDING_TX: &str = "error-recording-tx";
pub const ERROR_SCRIPT: &str = "script-error";
pub const ERROR_UNKNOWN_DOMAIN: &str = "unknown-domain";

const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_NOT_FOUND: u16 = 404;
const STATUS_EXPECTATION_FAILED: u16 = 417;

/// A non-200 answer: HTTP status plus the canonical error body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub status: u16,
    pub body: ServerError,
}

impl ErrorResponse {
    pub fn new(status: u16, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ServerError {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(STATUS_BAD_REQUEST, code, message)
    }

    /// Error code, e.g. "not-found".
    pub fn code(&self) -> &str {
        &self.body.code
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.body.code, self.body.message)
    }
}

impl std::error::Error for ErrorResponse {}

/// Result of a handler.
pub type HandlerResult<T> = std::result::Result<T, ErrorResponse>;

/// Serves the paymail endpoints on top of a [`ServiceProvider`].
pub struct PaymailHandler<P> {
    config: ServerConfig,
    provider: P,
}

impl<P: ServiceProvider> PaymailHandler<P> {
    pub fn new(config: ServerConfig, provider: P) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Split and check the paymail in the request path.
    fn parse_paymail(&self, incoming: &str) -> HandlerResult<(String, String, String)> {
        let (alias, domain, address) = sanitize_paymail(incoming);
        if address.is_empty() {
            return Err(ErrorResponse::bad_request(
                ERROR_INVALID_PARAMETER,
                format!("invalid paymail: {}", incoming),
            ));
        }
        if !self.config.is_allowed_domain(&domain) {
            return Err(ErrorResponse::bad_request(
                ERROR_UNKNOWN_DOMAIN,
                format!("domain unknown: {}", domain),
            ));
        }
        Ok((alias, domain, address))
    }

    async fn find_paymail(
        &self,
        alias: &str,
        domain: &str,
        metadata: &RequestMetadata,
    ) -> HandlerResult<PaymailAddress> {
        match self.provider.get_paymail_by_alias(alias, domain, metadata).await {
            Ok(Some(paymail)) => Ok(paymail),
            Ok(None) => Err(ErrorResponse::new(
                STATUS_NOT_FOUND,
                ERROR_PAYMAIL_NOT_FOUND,
                "paymail not found",
            )),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(alias = %alias, domain = %domain, error = %e, "provider lookup failed");
                Err(ErrorResponse::new(
                    STATUS_EXPECTATION_FAILED,
                    ERROR_FINDING_PAYMAIL,
                    e.to_string(),
                ))
            }
        }
    }

    /// `/.well-known/bsvalias` for the requested host.
    pub fn capabilities(&self, host: &str) -> HandlerResult<CapabilitiesPayload> {
        let domain = host.split(':').next().unwrap_or_default().to_lowercase();
        if !self.config.is_allowed_domain(&domain) {
            return Err(ErrorResponse::bad_request(
                ERROR_UNKNOWN_DOMAIN,
                format!("domain unknown: {}", domain),
            ));
        }
        Ok(self.config.enrich_capabilities(&domain))
    }

    /// Public key of a hosted paymail.
    pub async fn pki(&self, paymail: &str, metadata: &RequestMetadata) -> HandlerResult<PkiPayload> {
        let (alias, domain, address) = self.parse_paymail(paymail)?;
        let metadata = metadata.for_paymail(&alias, &domain);
        let found = self.find_paymail(&alias, &domain, &metadata).await?;

        Ok(PkiPayload {
            bsv_alias: self.config.bsv_alias_version.clone(),
            handle: address,
            pub_key: found.pub_key,
        })
    }

    /// Basic address resolution.
    pub async fn resolve_address(
        &self,
        paymail: &str,
        sender_request: SenderRequest,
        metadata: &RequestMetadata,
    ) -> HandlerResult<ResolutionPayload> {
        let (alias, domain, _) = self.parse_paymail(paymail)?;

        if sender_request.sender_handle.is_empty() {
            return Err(ErrorResponse::bad_request(
                ERROR_INVALID_SENDER_HANDLE,
                "missing senderHandle",
            ));
        }
        if validate_paymail(&sender_request.sender_handle).is_err() {
            return Err(ErrorResponse::bad_request(
                ERROR_INVALID_SENDER_HANDLE,
                format!("invalid senderHandle: {}", sender_request.sender_handle),
            ));
        }
        if sender_request.dt.is_empty() || validate_timestamp(&sender_request.dt).is_err() {
            return Err(ErrorResponse::bad_request(
                ERROR_INVALID_DT,
                format!("invalid dt: {}", sender_request.dt),
            ));
        }
        if self.config.sender_validation_enabled && sender_request.signature.is_empty() {
            return Err(ErrorResponse::bad_request(
                ERROR_INVALID_SIGNATURE,
                "missing required signature",
            ));
        }

        let mut metadata = metadata.for_paymail(&alias, &domain);
        metadata.resolve_address = Some(sender_request);
        self.find_paymail(&alias, &domain, &metadata).await?;

        self.provider
            .create_address_resolution_response(
                &alias,
                &domain,
                self.config.sender_validation_enabled,
                &metadata,
            )
            .await
            .map_err(|e| {
                ErrorResponse::new(
                    STATUS_EXPECTATION_FAILED,
                    ERROR_SCRIPT,
                    format!("error creating output script: {}", e),
                )
            })
    }

    /// Outputs for a P2P payment.
    pub async fn p2p_destination(
        &self,
        paymail: &str,
        payment_request: PaymentRequest,
        metadata: &RequestMetadata,
    ) -> HandlerResult<PaymentDestinationPayload> {
        let (alias, domain, _) = self.parse_paymail(paymail)?;
        if payment_request.satoshis == 0 {
            return Err(ErrorResponse::bad_request(
                ERROR_MISSING_SATOSHIS,
                "missing parameter: satoshis",
            ));
        }

        let mut metadata = metadata.for_paymail(&alias, &domain);
        metadata.payment_destination = Some(payment_request);
        self.find_paymail(&alias, &domain, &metadata).await?;

        self.provider
            .create_p2p_destination_response(&alias, &domain, payment_request.satoshis, &metadata)
            .await
            .map_err(|e| {
                ErrorResponse::new(
                    STATUS_EXPECTATION_FAILED,
                    ERROR_SCRIPT,
                    format!("error creating output script(s): {}", e),
                )
            })
    }

    /// Accept a P2P transaction.
    pub async fn record_transaction(
        &self,
        paymail: &str,
        transaction: &P2PTransaction,
        metadata: &RequestMetadata,
    ) -> HandlerResult<P2PTransactionPayload> {
        let (alias, domain, _) = self.parse_paymail(paymail)?;
        if transaction.hex.is_empty() {
            return Err(ErrorResponse::bad_request(ERROR_MISSING_HEX, "missing parameter: hex"));
        }
        if transaction.reference.is_empty() {
            return Err(ErrorResponse::bad_request(
                ERROR_MISSING_REFERENCE,
                "missing parameter: reference",
            ));
        }

        let metadata = metadata
            .for_paymail(&alias, &domain)
            .with_note(transaction.metadata.note.clone());
        self.find_paymail(&alias, &domain, &metadata).await?;

        self.provider
            .record_transaction(transaction, &metadata)
            .await
            .map_err(|e| {
                ErrorResponse::new(
                    STATUS_EXPECTATION_FAILED,
                    ERROR_RECORDING_TX,
                    format!("error recording transaction: {}", e),
                )
            })
    }

    /// Name and avatar of a hosted paymail.
    pub async fn public_profile(
        &self,
        paymail: &str,
        metadata: &RequestMetadata,
    ) -> HandlerResult<PublicProfilePayload> {
        let (alias, domain, _) = self.parse_paymail(paymail)?;
        let metadata = metadata.for_paymail(&alias, &domain);
        let found = self.find_paymail(&alias, &domain, &metadata).await?;

        Ok(PublicProfilePayload {
            avatar: found.avatar,
            name: found.name,
        })
    }

    /// Whether `pub_key` belongs to the paymail.
    pub async fn verify_pub_key(
        &self,
        paymail: &str,
        pub_key: &str,
        metadata: &RequestMetadata,
    ) -> HandlerResult<VerificationPayload> {
        let (alias, domain, address) = self.parse_paymail(paymail)?;
        if pub_key.len() != PUB_KEY_LENGTH {
            return Err(ErrorResponse::bad_request(
                ERROR_INVALID_PUBKEY,
                format!("invalid pubkey: {}", pub_key),
            ));
        }

        let metadata = metadata.for_paymail(&alias, &domain);
        let found = self.find_paymail(&alias, &domain, &metadata).await?;

        Ok(VerificationPayload {
            bsv_alias: self.config.bsv_alias_version.clone(),
            handle: address,
            matches: found.pub_key == pub_key,
            pub_key: found.pub_key,
        })
    }
}
