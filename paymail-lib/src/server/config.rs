//! Provider-side configuration and capability documents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::brfc::{
    BRFC_P2P_PAYMENT_DESTINATION, BRFC_P2P_TRANSACTIONS, BRFC_PAYMENT_DESTINATION, BRFC_PKI,
    BRFC_PUBLIC_PROFILE, BRFC_SENDER_VALIDATION, BRFC_VERIFY_PUBLIC_KEY_OWNER,
};
use crate::capabilities::{CapabilitiesPayload, CapabilityValue};
use crate::config::{DEFAULT_BSV_ALIAS_VERSION, DEFAULT_SERVICE_NAME};
use crate::utilities::validate_domain;
use crate::{PaymailError, Result};

/// API version segment of the service URL.
pub const DEFAULT_API_VERSION: &str = "v1";
/// Scheme prefix of the service URL.
pub const DEFAULT_PREFIX: &str = "https://";
/// Port the provider listens on.
pub const DEFAULT_SERVER_PORT: u16 = 3000;
/// Request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Capability document with relative endpoint paths.
pub fn generic_capabilities(bsv_alias_version: &str, sender_validation: bool) -> CapabilitiesPayload {
    let path = |p: &str| CapabilityValue::String(p.to_string());
    let capabilities = HashMap::from([
        (
            BRFC_PAYMENT_DESTINATION.to_string(),
            path("/address/{alias}@{domain.tld}"),
        ),
        (BRFC_PKI.to_string(), path("/id/{alias}@{domain.tld}")),
        (
            BRFC_PUBLIC_PROFILE.to_string(),
            path("/public-profile/{alias}@{domain.tld}"),
        ),
        (
            BRFC_SENDER_VALIDATION.to_string(),
            CapabilityValue::Bool(sender_validation),
        ),
        (
            BRFC_VERIFY_PUBLIC_KEY_OWNER.to_string(),
            path("/verify-pubkey/{alias}@{domain.tld}/{pubkey}"),
        ),
    ]);
    CapabilitiesPayload {
        bsv_alias: bsv_alias_version.to_string(),
        capabilities,
    }
}

/// Configuration for a paymail provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Domains this provider answers for.
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_bsv_alias_version")]
    pub bsv_alias_version: String,

    /// Advertised capabilities, with paths relative to the service URL.
    #[serde(default = "default_capabilities")]
    pub capabilities: CapabilitiesPayload,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Require a signature on address resolution requests.
    #[serde(default)]
    pub sender_validation_enabled: bool,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_bsv_alias_version() -> String {
    DEFAULT_BSV_ALIAS_VERSION.to_string()
}

fn default_capabilities() -> CapabilitiesPayload {
    generic_capabilities(DEFAULT_BSV_ALIAS_VERSION, false)
}

fn default_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            api_version: default_api_version(),
            bsv_alias_version: default_bsv_alias_version(),
            capabilities: default_capabilities(),
            port: default_port(),
            prefix: default_prefix(),
            sender_validation_enabled: false,
            service_name: default_service_name(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ServerConfig {
    /// Configuration for a single domain.
    pub fn new(domain: &str) -> Result<Self> {
        let mut config = Self::default();
        config.add_domain(domain)?;
        Ok(config)
    }

    /// Add a domain to the allow list. Duplicates are ignored.
    pub fn add_domain(&mut self, domain: &str) -> Result<()> {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return Err(PaymailError::invalid_data("domain", "domain is missing"));
        }
        validate_domain(&domain)?;
        if !self.allowed_domains.contains(&domain) {
            self.allowed_domains.push(domain);
        }
        Ok(())
    }

    /// Builder form of [`add_domain`](Self::add_domain).
    pub fn with_domain(mut self, domain: &str) -> Result<Self> {
        self.add_domain(domain)?;
        Ok(self)
    }

    /// Turn sender validation on or off, updating the advertised capability.
    pub fn with_sender_validation(mut self, enabled: bool) -> Self {
        self.sender_validation_enabled = enabled;
        self.capabilities.capabilities.insert(
            BRFC_SENDER_VALIDATION.to_string(),
            CapabilityValue::Bool(enabled),
        );
        self
    }

    /// Advertise the P2P payment destination and transaction endpoints.
    pub fn with_p2p_capabilities(mut self) -> Self {
        self.capabilities.capabilities.insert(
            BRFC_P2P_PAYMENT_DESTINATION.to_string(),
            CapabilityValue::String("/p2p-payment-destination/{alias}@{domain.tld}".to_string()),
        );
        self.capabilities.capabilities.insert(
            BRFC_P2P_TRANSACTIONS.to_string(),
            CapabilityValue::String("/receive-transaction/{alias}@{domain.tld}".to_string()),
        );
        self
    }

    /// Replace the advertised capabilities.
    pub fn with_capabilities(mut self, capabilities: CapabilitiesPayload) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        let service_name = service_name.into();
        if !service_name.is_empty() {
            self.service_name = service_name;
        }
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        if port > 0 {
            self.port = port;
        }
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        if secs > 0 {
            self.timeout_secs = secs;
        }
        self
    }

    /// Check that the configuration can serve requests.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_domains.is_empty() {
            return Err(PaymailError::ValidationFailed("domain is missing".to_string()));
        }
        if self.port == 0 {
            return Err(PaymailError::ValidationFailed("missing a port".to_string()));
        }
        if self.service_name.is_empty() {
            return Err(PaymailError::ValidationFailed("missing service name".to_string()));
        }
        if self.bsv_alias_version.is_empty() {
            return Err(PaymailError::ValidationFailed("missing bsv alias version".to_string()));
        }
        if self.capabilities.is_empty() {
            return Err(PaymailError::ValidationFailed("missing capabilities".to_string()));
        }
        Ok(())
    }

    /// Whether requests for `domain` are served.
    pub fn is_allowed_domain(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        !domain.is_empty() && self.allowed_domains.iter().any(|d| *d == domain)
    }

    /// Base URL of the service for `domain`, e.g. `https://test.com/v1/bsvalias`.
    pub fn service_url(&self, domain: &str) -> String {
        format!(
            "{}{}/{}/{}",
            self.prefix, domain, self.api_version, self.service_name
        )
    }

    /// Capabilities with every path turned into an absolute URL for `domain`.
    pub fn enrich_capabilities(&self, domain: &str) -> CapabilitiesPayload {
        let service_url = self.service_url(domain);
        let capabilities = self
            .capabilities
            .capabilities
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    CapabilityValue::String(path) => {
                        CapabilityValue::String(format!("{}{}", service_url, path))
                    }
                    other => other.clone(),
                };
                (key.clone(), value)
            })
            .collect();

        CapabilitiesPayload {
            bsv_alias: self.bsv_alias_version.clone(),
            capabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new("test.com").unwrap();
        assert_eq!(config.allowed_domains, vec!["test.com".to_string()]);
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.bsv_alias_version, "1.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.prefix, "https://");
        assert_eq!(config.service_name, "bsvalias");
        assert_eq!(config.timeout_secs, 15);
        assert!(!config.sender_validation_enabled);
        assert_eq!(config.capabilities.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_add_domain() {
        let mut config = ServerConfig::default();
        assert!(config.validate().is_err());
        assert!(config.add_domain("").is_err());
        assert!(config.add_domain("nodot").is_err());

        config.add_domain(" Test.com ").unwrap();
        config.add_domain("test.com").unwrap();
        config.add_domain("other.com").unwrap();
        assert_eq!(config.allowed_domains.len(), 2);
        assert!(config.is_allowed_domain("TEST.com"));
        assert!(config.is_allowed_domain("other.com"));
        assert!(!config.is_allowed_domain("unknown.com"));
        assert!(!config.is_allowed_domain(""));
    }

    #[test]
    fn test_builder_guards() {
        let config = ServerConfig::new("test.com")
            .unwrap()
            .with_port(0)
            .with_timeout(0)
            .with_service_name("");
        assert_eq!(config.port, DEFAULT_SERVER_PORT);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.service_name, "bsvalias");
    }

    #[test]
    fn test_enrich_capabilities() {
        let config = ServerConfig::new("test.com")
            .unwrap()
            .with_sender_validation(true)
            .with_p2p_capabilities();
        let caps = config.enrich_capabilities("test.com");

        assert_eq!(caps.bsv_alias, "1.0");
        assert_eq!(caps.len(), 7);
        assert_eq!(
            caps.get_string(BRFC_PKI, ""),
            "https://test.com/v1/bsvalias/id/{alias}@{domain.tld}"
        );
        assert_eq!(
            caps.get_string(BRFC_VERIFY_PUBLIC_KEY_OWNER, ""),
            "https://test.com/v1/bsvalias/verify-pubkey/{alias}@{domain.tld}/{pubkey}"
        );
        assert_eq!(
            caps.get_string(BRFC_P2P_TRANSACTIONS, ""),
            "https://test.com/v1/bsvalias/receive-transaction/{alias}@{domain.tld}"
        );
        assert!(caps.get_bool(BRFC_SENDER_VALIDATION, ""));

        // stored paths stay relative
        assert_eq!(
            config.capabilities.get_string(BRFC_PKI, ""),
            "/id/{alias}@{domain.tld}"
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"allowed_domains":["test.com"],"port":8080}"#).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.service_url("test.com"), "https://test.com/v1/bsvalias");
        assert_eq!(config.capabilities.len(), 5);
    }
}
