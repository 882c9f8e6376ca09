//! Data-layer seams for the provider side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::endpoints::{
    P2PMetadata, P2PTransaction, P2PTransactionPayload, PaymentDestinationPayload, PaymentOutput,
    PaymentRequest, ResolutionPayload,
};
use crate::script::{sha256d, ScriptAdapter, StandardScriptAdapter};
use crate::sender_request::SenderRequest;
use crate::PaymailError;

/// Error type for provider and repository operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("paymail not found: {0}")]
    NotFound(String),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    #[error(transparent)]
    Paymail(#[from] PaymailError),
}

impl From<ProviderError> for PaymailError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Paymail(inner) => inner,
            ProviderError::NotFound(address) => PaymailError::not_found("paymail address", address),
            ProviderError::InvalidTransaction(reason) => PaymailError::invalid_data("hex", reason),
            ProviderError::Storage(reason) => PaymailError::Internal(reason),
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A hosted paymail.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymailAddress {
    pub alias: String,
    /// Avatar URL for the public profile.
    #[serde(default)]
    pub avatar: String,
    pub id: u64,
    /// Address handed out for basic resolution.
    #[serde(default)]
    pub last_address: String,
    /// Display name for the public profile.
    #[serde(default)]
    pub name: String,
    /// Hex private key; never serialized into responses.
    #[serde(default, skip_serializing)]
    pub private_key: String,
    #[serde(rename = "pubkey", default)]
    pub pub_key: String,
}

/// What the handler knows about the incoming request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ip_address: String,
    /// Free text carried through to the provider.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_destination: Option<PaymentRequest>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub request_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_address: Option<SenderRequest>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
}

impl RequestMetadata {
    /// Metadata for a request from `ip_address` with the given user agent and URI.
    pub fn new(
        ip_address: impl Into<String>,
        user_agent: impl Into<String>,
        request_uri: impl Into<String>,
    ) -> Self {
        Self {
            ip_address: ip_address.into(),
            user_agent: user_agent.into(),
            request_uri: request_uri.into(),
            ..Self::default()
        }
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub(crate) fn for_paymail(&self, alias: &str, domain: &str) -> Self {
        Self {
            alias: alias.to_string(),
            domain: domain.to_string(),
            ..self.clone()
        }
    }
}

/// A transaction accepted from a sender.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub alias: String,
    pub domain: String,
    pub hex: String,
    pub metadata: P2PMetadata,
    pub reference: String,
    #[serde(rename = "txid")]
    pub tx_id: String,
}

/// Storage for hosted paymails and received transactions.
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait PaymailRepository: Send + Sync {
    /// Find a paymail by alias and domain.
    async fn get_paymail(&self, alias: &str, domain: &str) -> ProviderResult<Option<PaymailAddress>>;

    /// Save or replace a paymail.
    async fn save_paymail(&self, domain: &str, paymail: PaymailAddress) -> ProviderResult<()>;

    /// Persist a received transaction.
    async fn save_transaction(&self, record: TransactionRecord) -> ProviderResult<()>;
}

/// Business logic behind the paymail handlers.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Look up a hosted paymail; `Ok(None)` when it does not exist.
    async fn get_paymail_by_alias(
        &self,
        alias: &str,
        domain: &str,
        metadata: &RequestMetadata,
    ) -> ProviderResult<Option<PaymailAddress>>;

    /// Output (and optional signature) for basic address resolution.
    async fn create_address_resolution_response(
        &self,
        alias: &str,
        domain: &str,
        sender_validation: bool,
        metadata: &RequestMetadata,
    ) -> ProviderResult<ResolutionPayload>;

    /// Outputs and reference for a P2P payment of `satoshis`.
    async fn create_p2p_destination_response(
        &self,
        alias: &str,
        domain: &str,
        satoshis: u64,
        metadata: &RequestMetadata,
    ) -> ProviderResult<PaymentDestinationPayload>;

    /// Accept a transaction sent by a P2P sender.
    async fn record_transaction(
        &self,
        transaction: &P2PTransaction,
        metadata: &RequestMetadata,
    ) -> ProviderResult<P2PTransactionPayload>;
}

/// Transaction id of a raw hex transaction: reversed double SHA-256.
pub fn tx_id_from_hex(tx_hex: &str) -> ProviderResult<String> {
    let raw = hex::decode(tx_hex)
        .map_err(|e| ProviderError::InvalidTransaction(format!("invalid hex: {}", e)))?;
    if raw.is_empty() {
        return Err(ProviderError::InvalidTransaction("empty transaction".to_string()));
    }
    let mut hash = sha256d(&raw);
    hash.reverse();
    Ok(hex::encode(hash))
}

/// Service provider that pays every request to the paymail's last address.
pub struct RepositoryProvider<R> {
    repository: R,
    script: Arc<dyn ScriptAdapter>,
}

impl<R: PaymailRepository> RepositoryProvider<R> {
    /// Provider backed by `repository` using standard P2PKH scripts.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            script: Arc::new(StandardScriptAdapter),
        }
    }

    /// Replace the script collaborator.
    pub fn with_script_adapter(mut self, script: Arc<dyn ScriptAdapter>) -> Self {
        self.script = script;
        self
    }

    /// The backing repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    async fn require_paymail(&self, alias: &str, domain: &str) -> ProviderResult<PaymailAddress> {
        self.repository
            .get_paymail(alias, domain)
            .await?
            .ok_or_else(|| ProviderError::NotFound(format!("{}@{}", alias, domain)))
    }
}

#[async_trait]
impl<R: PaymailRepository> ServiceProvider for RepositoryProvider<R> {
    async fn get_paymail_by_alias(
        &self,
        alias: &str,
        domain: &str,
        _metadata: &RequestMetadata,
    ) -> ProviderResult<Option<PaymailAddress>> {
        self.repository.get_paymail(alias, domain).await
    }

    async fn create_address_resolution_response(
        &self,
        alias: &str,
        domain: &str,
        sender_validation: bool,
        _metadata: &RequestMetadata,
    ) -> ProviderResult<ResolutionPayload> {
        let paymail = self.require_paymail(alias, domain).await?;
        let output = self.script.script_from_address(&paymail.last_address)?;

        let signature = if sender_validation {
            self.script.sign_message(&paymail.private_key, &output)?
        } else {
            String::new()
        };

        Ok(ResolutionPayload {
            address: paymail.last_address,
            output,
            signature,
        })
    }

    async fn create_p2p_destination_response(
        &self,
        alias: &str,
        domain: &str,
        satoshis: u64,
        _metadata: &RequestMetadata,
    ) -> ProviderResult<PaymentDestinationPayload> {
        let paymail = self.require_paymail(alias, domain).await?;
        let script = self.script.script_from_address(&paymail.last_address)?;

        Ok(PaymentDestinationPayload {
            outputs: vec![PaymentOutput {
                address: paymail.last_address,
                satoshis,
                script,
            }],
            reference: hex::encode(rand::random::<[u8; 16]>()),
        })
    }

    async fn record_transaction(
        &self,
        transaction: &P2PTransaction,
        metadata: &RequestMetadata,
    ) -> ProviderResult<P2PTransactionPayload> {
        let tx_id = tx_id_from_hex(&transaction.hex)?;

        self.repository
            .save_transaction(TransactionRecord {
                alias: metadata.alias.clone(),
                domain: metadata.domain.clone(),
                hex: transaction.hex.clone(),
                metadata: transaction.metadata.clone(),
                reference: transaction.reference.clone(),
                tx_id: tx_id.clone(),
            })
            .await?;

        #[cfg(feature = "tracing")]
        tracing::debug!(tx_id = %tx_id, alias = %metadata.alias, "recorded p2p transaction");

        Ok(P2PTransactionPayload {
            note: transaction.metadata.note.clone(),
            tx_id,
        })
    }
}
