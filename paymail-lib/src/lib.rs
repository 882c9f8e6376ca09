//! Paymail library.
//!
//! A client for the bsvalias protocol family: it discovers the host serving a
//! paymail domain, verifies the domain's trust posture, reads its capability
//! document and calls the endpoints the capabilities advertise. A provider
//! side with transport-agnostic handlers is included under [`server`].
//!
//! # Features
//!
//! - **Discovery**: SRV lookup and validation, capability documents, BRFC catalog
//! - **Trust**: DNSSEC chain inspection and TLS certificate checks
//! - **Endpoints**: PKI, address resolution, P2P destinations and transactions,
//!   public profiles and public key verification
//! - **Substitution**: DNS resolver, DNS exchange, HTTP client and script
//!   handling are all swappable collaborators
//!
//! # Example
//!
//! ```ignore
//! use paymail_lib::{ClientOptions, PaymailClient, BRFC_PKI, BRFC_PKI_ALTERNATE};
//!
//! let client = PaymailClient::new(ClientOptions::default())?;
//! let srv = client.get_srv_record("bsvalias", "tcp", "moneybutton.com").await?;
//! let capabilities = client.get_capabilities(&srv.target, srv.port).await?;
//!
//! let pki_url = capabilities.get_string(BRFC_PKI, BRFC_PKI_ALTERNATE);
//! let pki = client.get_pki(&pki_url, "mrz", "moneybutton.com").await?;
//! println!("{}", pki.pub_key);
//! ```

pub mod brfc;
pub mod capabilities;
pub mod client;
pub mod config;
pub mod dns;
pub mod dnssec;
pub mod endpoints;
pub mod errors;
pub mod prelude;
pub mod script;
pub mod sender_request;
pub mod server;
pub mod srv;
pub mod ssl;
pub mod utilities;

/// Test utilities for paymail testing.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use brfc::{
    BrfcSpec, BRFC_BASIC_ADDRESS_RESOLUTION, BRFC_P2P_PAYMENT_DESTINATION, BRFC_P2P_TRANSACTIONS,
    BRFC_PAYMENT_DESTINATION, BRFC_PKI, BRFC_PKI_ALTERNATE, BRFC_PUBLIC_PROFILE,
    BRFC_RECEIVER_APPROVALS, BRFC_SENDER_VALIDATION, BRFC_VERIFY_PUBLIC_KEY_OWNER,
};
pub use capabilities::{CapabilitiesPayload, CapabilitiesResponse, CapabilityValue};
pub use client::{PaymailClient, PaymailResponse, RequestTrace, ServerError, StandardResponse};
pub use config::{ClientOptions, NameServerNetwork, Network};
pub use dnssec::{DnskeyRecord, DnssecMatching, DnssecResult, DsRecord, NsecRecord};
pub use errors::{PaymailError, PaymailErrorCode, ResponseError, ResponseResult};
pub use script::{ScriptAdapter, StandardScriptAdapter};
pub use sender_request::SenderRequest;
pub use srv::SrvRecord;

/// Common result alias for paymail operations.
pub type Result<T> = std::result::Result<T, PaymailError>;
