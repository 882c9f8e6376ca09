//! Provider side of the protocol.
//!
//! [`PaymailHandler`] implements the request checks and error codes every
//! paymail host must honor and delegates lookups and output creation to a
//! [`ServiceProvider`]. Routing, TLS and listening are out of scope; mount the
//! handlers on whatever HTTP stack the host already runs.

pub mod config;
pub mod handler;
pub mod provider;

pub use config::{generic_capabilities, ServerConfig};
pub use handler::{ErrorResponse, HandlerResult, PaymailHandler};
pub use provider::{
    tx_id_from_hex, PaymailAddress, PaymailRepository, ProviderError, ProviderResult,
    RepositoryProvider, RequestMetadata, ServiceProvider, TransactionRecord,
};
