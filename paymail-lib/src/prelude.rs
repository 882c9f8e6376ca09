//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits for
//! quick setup. Import everything with:
//!
//! ```rust,ignore
//! use paymail_lib::prelude::*;
//! ```
//!
//! ## What's Included
//!
//! - Client: `PaymailClient`, `ClientOptions`, `SrvRecord`
//! - Error types: `PaymailError`, `PaymailErrorCode`, `ResponseError`, `Result`
//! - Capabilities and the BRFC ids used to read them
//! - Endpoint request and payload types
//! - Collaborator traits: `DnsResolver`, `DnsExchange`, `ScriptAdapter`

// Client
pub use crate::client::PaymailClient;
pub use crate::config::ClientOptions;
pub use crate::srv::SrvRecord;

// Error handling
pub use crate::errors::{PaymailError, PaymailErrorCode, ResponseError, ResponseResult};
pub use crate::Result;

// Capabilities
pub use crate::brfc::*;
pub use crate::capabilities::{CapabilitiesPayload, CapabilitiesResponse};

// Endpoints
pub use crate::endpoints::{P2PTransaction, PaymentRequest};
pub use crate::sender_request::SenderRequest;

// Trust
pub use crate::dnssec::DnssecResult;

// Collaborators
pub use crate::dns::{DnsExchange, DnsResolver};
pub use crate::script::ScriptAdapter;
