//! Sender requests used for address resolution and sender validation.

use serde::{Deserialize, Serialize};

use crate::script::{ScriptAdapter, StandardScriptAdapter};
use crate::{PaymailError, Result};

/// Body of an address resolution request.
///
/// When the receiver requires sender validation, `signature` must be a
/// signed message over [`signing_message`](Self::signing_message) made with
/// the sender's paymail key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderRequest {
    /// Amount in satoshis, if known.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub amount: u64,
    /// ISO-8601 timestamp of the request.
    pub dt: String,
    /// Free text purpose.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub purpose: String,
    /// Sender's paymail handle.
    pub sender_handle: String,
    /// Sender's display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender_name: String,
    /// Signature over the signing message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

impl SenderRequest {
    /// Create a request for `sender_handle` timestamped with `dt`.
    pub fn new(sender_handle: impl Into<String>, dt: impl Into<String>) -> Self {
        Self {
            sender_handle: sender_handle.into(),
            dt: dt.into(),
            ..Self::default()
        }
    }

    /// Set the amount.
    pub fn with_amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Set the purpose.
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    /// Set the sender name.
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self
    }

    /// Message covered by the signature: handle, amount, timestamp, purpose.
    pub fn signing_message(&self) -> String {
        format!(
            "{}{}{}{}",
            self.sender_handle, self.amount, self.dt, self.purpose
        )
    }

    /// Fields that must be present before signing or sending.
    pub fn check_required(&self) -> Result<()> {
        if self.dt.is_empty() {
            return Err(PaymailError::invalid_data("dt", "time is required"));
        }
        if self.sender_handle.is_empty() {
            return Err(PaymailError::invalid_data(
                "senderHandle",
                "sender handle is required",
            ));
        }
        Ok(())
    }

    /// Sign with a hex private key, returning the base64 signature.
    pub fn sign(&self, private_key_hex: &str) -> Result<String> {
        self.sign_with(&StandardScriptAdapter, private_key_hex)
    }

    /// Sign using a specific script adapter.
    pub fn sign_with(&self, adapter: &dyn ScriptAdapter, private_key_hex: &str) -> Result<String> {
        if private_key_hex.is_empty() {
            return Err(PaymailError::invalid_data("private key", "missing private key"));
        }
        self.check_required()?;
        adapter.sign_message(private_key_hex, &self.signing_message())
    }

    /// Verify `signature` against the sender's `address`.
    pub fn verify(&self, address: &str, signature: &str) -> Result<()> {
        self.verify_with(&StandardScriptAdapter, address, signature)
    }

    /// Verify using a specific script adapter.
    pub fn verify_with(
        &self,
        adapter: &dyn ScriptAdapter,
        address: &str,
        signature: &str,
    ) -> Result<()> {
        if address.is_empty() {
            return Err(PaymailError::invalid_data("address", "missing address"));
        }
        if signature.is_empty() {
            return Err(PaymailError::invalid_data("signature", "missing signature"));
        }
        adapter.verify_message(address, signature, &self.signing_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{address_from_private_key, generate_private_key};

    fn request() -> SenderRequest {
        SenderRequest::new("mrz@moneybutton.com", "2020-10-02T16:43:39Z")
            .with_sender_name("MrZ")
            .with_purpose("testing")
    }

    #[test]
    fn test_signing_message() {
        assert_eq!(
            request().signing_message(),
            "mrz@moneybutton.com02020-10-02T16:43:39Ztesting"
        );
        assert_eq!(
            request().with_amount(551).signing_message(),
            "mrz@moneybutton.com5512020-10-02T16:43:39Ztesting"
        );
    }

    #[test]
    fn test_sign_preconditions() {
        let key = generate_private_key();
        assert!(request().sign("").is_err());
        assert!(request().sign("0").is_err());

        let mut missing_dt = request();
        missing_dt.dt.clear();
        assert!(missing_dt.sign(&key).is_err());

        let mut missing_handle = request();
        missing_handle.sender_handle.clear();
        assert!(missing_handle.sign(&key).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let key = generate_private_key();
        let address = address_from_private_key(&key).unwrap();
        let request = request();

        let signature = request.sign(&key).unwrap();
        assert!(!signature.is_empty());
        request.verify(&address, &signature).unwrap();

        assert!(request.verify("", &signature).is_err());
        assert!(request.verify(&address, "").is_err());
        assert!(request.verify(&address, "0").is_err());
    }

    #[test]
    fn test_verify_known_request() {
        request()
            .verify(
                "1MRXps9AaAhHiZwpAvVqaX9J8UAjFhbgGw",
                "IDQWyhXrMrV0++c8lCzp6opWdDkbwEgNjHIOH+TRn9K6fJkOexICLiD9XzLajSlFezHJWgJTicCRv641zhk6rOY=",
            )
            .unwrap();
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(request().with_amount(551)).unwrap();
        assert_eq!(json["senderHandle"], "mrz@moneybutton.com");
        assert_eq!(json["senderName"], "MrZ");
        assert_eq!(json["amount"], 551);
        assert!(json.get("signature").is_none());
    }
}
