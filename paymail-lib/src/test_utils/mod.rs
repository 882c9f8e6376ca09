//! Test utilities for Paymail.
//!
//! This module provides:
//! - Substitutable DNS collaborators with canned answers
//! - An in-memory repository and service provider
//! - Fixtures for handles, keys, scripts and capability documents
//! - Assertion helpers for the error classes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paymail_lib::test_utils::{new_test_client, TEST_DOMAIN};
//!
//! let client = new_test_client();
//! let srv = client.get_srv_record("bsvalias", "tcp", TEST_DOMAIN).await?;
//! assert_eq!(srv.target, "www.test.com");
//! ```

mod assertions;
mod fixtures;
mod mock_dns;
mod mock_provider;

pub use assertions::{assert_error_code, assert_malformed, assert_precondition};
pub use fixtures::{
    capabilities_json, new_test_client, TestFixtures, TEST_ALIAS, TEST_DOMAIN, TEST_PRIVATE_KEY,
    TEST_PUBKEY,
};
pub use mock_dns::{MockDnsExchange, MockResolver};
pub use mock_provider::{InMemoryProvider, InMemoryRepository};
