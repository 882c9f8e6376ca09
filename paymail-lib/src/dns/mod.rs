//! DNS plumbing for host discovery and DNSSEC checks.
//!
//! Messages, record data and transports come from the `domain` crate. The two
//! traits here are the seams the client talks through, so tests and embedders
//! can answer lookups without a name server.

pub mod exchange;
pub mod resolver;

pub use domain::base::{Message, Name, Question, Rtype};
pub use exchange::{DnsExchange, NetworkExchange};
pub use resolver::{DnsResolver, NameServerResolver};

use bytes::Bytes;
use domain::base::wire::ParseError;

use crate::{PaymailError, Result};

/// A single question sent to a name server.
pub type Query = Question<Name<Vec<u8>>>;

/// A response as received from a name server.
pub type Response = Message<Bytes>;

/// Build the question for `name` (absolute, with or without the final dot).
pub fn query(name: &str, rtype: Rtype) -> Result<Query> {
    let qname = Name::vec_from_str(name)
        .map_err(|e| PaymailError::Dns(format!("invalid name {}: {}", name, e)))?;
    Ok(Question::new_in(qname, rtype))
}

/// `name` with a trailing dot.
pub(crate) fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

impl From<ParseError> for PaymailError {
    fn from(err: ParseError) -> Self {
        Self::Dns(format!("malformed dns message: {}", err))
    }
}
