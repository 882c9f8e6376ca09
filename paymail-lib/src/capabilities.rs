//! Capability discovery and BRFC-keyed capability lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::client::{PaymailClient, StandardResponse};
use crate::config::DEFAULT_SERVICE_NAME;
use crate::endpoints::paymail_response;
use crate::errors::{ResponseError, ResponseResult};
use crate::PaymailError;

/// A single advertised capability value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapabilityValue {
    /// Feature flag.
    Bool(bool),
    /// URL template containing `{alias}` and `{domain.tld}`.
    String(String),
    /// Anything else a server chose to publish.
    Other(serde_json::Value),
}

/// Capabilities advertised by a paymail host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitiesPayload {
    /// bsvalias version, e.g. "1.0".
    #[serde(rename = "bsvalias", default)]
    pub bsv_alias: String,
    /// Capability key to value.
    #[serde(default)]
    pub capabilities: HashMap<String, CapabilityValue>,
}

impl CapabilitiesPayload {
    /// The value stored under `brfc_id`, or under `alternate_id` when the first is absent.
    ///
    /// The primary key wins whenever it exists, whatever its value type.
    pub fn get(&self, brfc_id: &str, alternate_id: &str) -> Option<&CapabilityValue> {
        self.capabilities
            .get(brfc_id)
            .or_else(|| self.capabilities.get(alternate_id))
    }

    /// Whether either key is present.
    pub fn has(&self, brfc_id: &str, alternate_id: &str) -> bool {
        self.get(brfc_id, alternate_id).is_some()
    }

    /// Boolean value of the capability; false when absent or not a boolean.
    pub fn get_bool(&self, brfc_id: &str, alternate_id: &str) -> bool {
        matches!(self.get(brfc_id, alternate_id), Some(CapabilityValue::Bool(true)))
    }

    /// String value of the capability; empty when absent or not a string.
    pub fn get_string(&self, brfc_id: &str, alternate_id: &str) -> String {
        match self.get(brfc_id, alternate_id) {
            Some(CapabilityValue::String(value)) => value.clone(),
            _ => String::new(),
        }
    }

    /// Number of advertised capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// True when nothing is advertised.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

/// Response from capability discovery.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CapabilitiesResponse {
    /// Raw exchange.
    pub standard: StandardResponse,
    /// Decoded capabilities.
    pub payload: CapabilitiesPayload,
}

paymail_response!(CapabilitiesResponse, CapabilitiesPayload);

impl PaymailClient {
    /// Fetch `/.well-known/bsvalias` from `target:port`.
    ///
    /// An empty bsvalias version is an error, but the decoded response is
    /// still handed back with it.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn get_capabilities(&self, target: &str, port: u16) -> ResponseResult<CapabilitiesResponse> {
        if target.is_empty() {
            return Err(PaymailError::invalid_data("target", "missing target").into());
        }
        if port == 0 {
            return Err(PaymailError::invalid_data("port", "missing port").into());
        }

        let url = format!(
            "{}://{}:{}/.well-known/{}",
            self.options().scheme(),
            target,
            port,
            DEFAULT_SERVICE_NAME
        );
        let mut standard = self.get_request(&url).await?;

        // Some hosts publish typographic quotes in place of JSON quotes.
        if let Ok(text) = std::str::from_utf8(&standard.body) {
            if text.contains(['\u{201c}', '\u{201d}']) {
                standard.body = text.replace(['\u{201c}', '\u{201d}'], "\"").into_bytes();
            }
        }

        let response: CapabilitiesResponse = Self::decode_response(standard, target)?;
        if response.payload.bsv_alias.is_empty() {
            return Err(ResponseError::with_response(
                PaymailError::malformed("missing bsvalias version"),
                response,
            ));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(pairs: &[(&str, CapabilityValue)]) -> CapabilitiesPayload {
        CapabilitiesPayload {
            bsv_alias: "1.0".into(),
            capabilities: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    fn url() -> CapabilityValue {
        CapabilityValue::String("https://domain.com/bsvalias/id/{alias}@{domain.tld}".into())
    }

    #[test]
    fn test_has() {
        let caps = payload(&[
            ("6745385c3fc0", CapabilityValue::Bool(true)),
            ("alternate_id", CapabilityValue::Bool(true)),
            ("0c4339ef99c2", url()),
        ]);
        assert!(caps.has("6745385c3fc0", "alternate_id"));
        assert!(caps.has("6745385c3fc0", ""));
        assert!(caps.has("alternate_id", "6745385c3fc0"));
        assert!(caps.has("wrong", "6745385c3fc0"));
        assert!(!caps.has("wrong", "wrong"));
    }

    #[test]
    fn test_primary_wins() {
        let caps = payload(&[
            ("a", CapabilityValue::String("x".into())),
            ("b", CapabilityValue::String("y".into())),
        ]);
        assert_eq!(caps.get_string("a", "b"), "x");
        assert_eq!(caps.get_string("c", "b"), "y");
        assert_eq!(caps.get_string("c", "d"), "");
    }

    #[test]
    fn test_get_bool() {
        let caps = payload(&[
            ("6745385c3fc0", CapabilityValue::Bool(true)),
            ("pki", url()),
        ]);
        assert!(caps.get_bool("6745385c3fc0", ""));
        assert!(caps.get_bool("wrong", "6745385c3fc0"));
        assert!(!caps.get_bool("wrong", "wrong"));
        // a string under the primary key does not fall through to the alternate
        assert!(!caps.get_bool("pki", "6745385c3fc0"));
    }

    #[test]
    fn test_get_string() {
        let caps = payload(&[
            ("6745385c3fc0", CapabilityValue::Bool(false)),
            ("pki", url()),
            ("0c4339ef99c2", url()),
        ]);
        let expected = "https://domain.com/bsvalias/id/{alias}@{domain.tld}";
        assert_eq!(caps.get_string("pki", "0c4339ef99c2"), expected);
        assert_eq!(caps.get_string("0c4339ef99c2", "pki"), expected);
        assert_eq!(caps.get_string("pki", ""), expected);
        assert_eq!(caps.get_string("wrong", "pki"), expected);
        assert_eq!(caps.get_string("wrong", "wrong"), "");
        assert_eq!(caps.get_string("6745385c3fc0", "pki"), "");
    }

    #[test]
    fn test_decode_mixed_values() {
        let caps: CapabilitiesPayload = serde_json::from_str(
            r#"{"bsvalias":"1.0","capabilities":{"6745385c3fc0":false,"pki":"https://test.com/id/{alias}@{domain.tld}","f12f968c92d6":{"nested":1}}}"#,
        )
        .unwrap();
        assert_eq!(caps.len(), 3);
        assert_eq!(caps.get("6745385c3fc0", ""), Some(&CapabilityValue::Bool(false)));
        assert!(matches!(caps.get("f12f968c92d6", ""), Some(CapabilityValue::Other(_))));
    }
}
