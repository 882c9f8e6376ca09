//! Test fixtures and data generators.

use std::sync::Arc;

use super::mock_dns::MockResolver;
use crate::client::PaymailClient;
use crate::config::ClientOptions;

/// Domain served by the mock resolver.
pub const TEST_DOMAIN: &str = "test.com";
/// Alias used across endpoint tests.
pub const TEST_ALIAS: &str = "mrz";
/// Private key behind [`TEST_PUBKEY`].
pub const TEST_PRIVATE_KEY: &str = "54035dd4c7dda99ac473905a3d82f7864322b49bab1ff441cc457183b9bd8abd";
/// Compressed public key of [`TEST_PRIVATE_KEY`].
pub const TEST_PUBKEY: &str = "031b8c93100d35bd448f4646cc4678f278351b439b52b303ea31ec9edb5475e73f";

/// Collection of commonly used test fixtures.
pub struct TestFixtures;

impl TestFixtures {
    /// Address of [`TEST_PUBKEY`].
    pub const ADDRESS: &'static str = "1DfGxKmgL3ETwUdNnXLBueEvNpjcDGcKgK";

    /// P2PKH scripts and the addresses they pay.
    pub const SCRIPTS: &'static [(&'static str, &'static str)] = &[
        (
            "76a9143e2d1d795f8acaa7957045cc59376177eb04a3c588ac",
            "16fkwYn8feXEbK7iCTg5KMx9Rx9GzZ9HuE",
        ),
        (
            "76a9147f11c8f67a2781df0400ebfb1f31b4c72a780b9d88ac",
            "1Cat862cjhp8SgLLMvin5gyk5UScasg1P9",
        ),
    ];

    /// A script that is not pay-to-pubkey-hash.
    pub const NON_STANDARD_SCRIPT: &'static str = "6a0568656c6c6f";
}

/// A capability document whose endpoints live under `base_url`.
pub fn capabilities_json(base_url: &str) -> String {
    serde_json::json!({
        "bsvalias": "1.0",
        "capabilities": {
            "6745385c3fc0": false,
            "pki": format!("{}/v1/bsvalias/id/{{alias}}@{{domain.tld}}", base_url),
            "paymentDestination": format!("{}/v1/bsvalias/address/{{alias}}@{{domain.tld}}", base_url),
            "2a40af698840": format!("{}/v1/bsvalias/p2p-payment-destination/{{alias}}@{{domain.tld}}", base_url),
            "5f1323cddf31": format!("{}/v1/bsvalias/receive-transaction/{{alias}}@{{domain.tld}}", base_url),
            "f12f968c92d6": format!("{}/v1/bsvalias/public-profile/{{alias}}@{{domain.tld}}", base_url),
            "a9f510c16bde": format!("{}/v1/bsvalias/verify-pubkey/{{alias}}@{{domain.tld}}/{{pubkey}}", base_url),
        }
    })
    .to_string()
}

/// Client wired to [`MockResolver::with_fixtures`] that accepts plain http URLs.
///
/// # Panics
/// Panics if the HTTP client cannot be built.
pub fn new_test_client() -> PaymailClient {
    let options = ClientOptions::default()
        .with_require_https(false)
        .with_retry_count(0);
    PaymailClient::new(options)
        .expect("test client")
        .with_resolver(Arc::new(MockResolver::with_fixtures()))
}
