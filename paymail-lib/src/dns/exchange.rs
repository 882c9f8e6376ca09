//! Sending DNS queries to a name server.

use async_trait::async_trait;
use domain::base::MessageBuilder;
use domain::net::client::protocol::{TcpConnect, UdpConnect};
use domain::net::client::request::{
    ComposeRequest, RequestMessage, RequestMessageMulti, SendRequest,
};
use domain::net::client::{dgram_stream, stream};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;

use super::{Query, Response};
use crate::config::NameServerNetwork;
use crate::{PaymailError, Result};

const UDP_PAYLOAD_SIZE: u16 = 4096;

/// Sends a single query to a specific name server and returns the reply.
///
/// The server is given as `host:port`. Implementations must be safe to share
/// across concurrent lookups.
#[async_trait]
pub trait DnsExchange: Send + Sync {
    /// Send `query` to `server` and wait for the matching response.
    async fn exchange(&self, query: &Query, server: &str) -> Result<Response>;
}

/// Exchange over the network using the `domain` client transports.
///
/// Queries ask for recursion and carry EDNS0 with the DO bit. Over UDP a
/// truncated response is retried over TCP.
#[derive(Clone, Debug)]
pub struct NetworkExchange {
    network: NameServerNetwork,
    timeout: Duration,
}

impl NetworkExchange {
    /// Create an exchange using the given transport and round-trip timeout.
    pub fn new(network: NameServerNetwork, timeout: Duration) -> Self {
        Self { network, timeout }
    }

    async fn resolve_server(server: &str) -> Result<SocketAddr> {
        tokio::net::lookup_host(server)
            .await
            .map_err(|e| PaymailError::ConnectionFailed {
                target: server.to_string(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| PaymailError::Dns(format!("no address for name server {}", server)))
    }

    fn request(query: &Query) -> Result<RequestMessage<Vec<u8>>> {
        let mut builder = MessageBuilder::new_vec();
        builder.header_mut().set_rd(true);
        let mut builder = builder.question();
        builder
            .push((query.qname(), query.qtype()))
            .map_err(|e| PaymailError::Internal(format!("failed to build dns query: {}", e)))?;

        let mut request = RequestMessage::new(builder.into_message())
            .map_err(|e| PaymailError::Internal(format!("failed to build dns query: {}", e)))?;
        request.set_udp_payload_size(UDP_PAYLOAD_SIZE);
        request.set_dnssec_ok(true);
        Ok(request)
    }

    async fn round_trip(&self, query: &Query, server: &str) -> Result<Response> {
        let addr = Self::resolve_server(server).await?;
        let request = Self::request(query)?;

        let response = match self.network {
            NameServerNetwork::Udp => {
                let (connection, transport) =
                    dgram_stream::Connection::new(UdpConnect::new(addr), TcpConnect::new(addr));
                tokio::spawn(transport.run());
                let mut pending = connection.send_request(request);
                pending.get_response().await
            }
            NameServerNetwork::Tcp => {
                let tcp = TcpStream::connect(addr)
                    .await
                    .map_err(|e| PaymailError::ConnectionFailed {
                        target: addr.to_string(),
                        reason: e.to_string(),
                    })?;
                let (connection, transport) = stream::Connection::<
                    RequestMessage<Vec<u8>>,
                    RequestMessageMulti<Vec<u8>>,
                >::new(tcp);
                tokio::spawn(transport.run());
                let mut pending = connection.send_request(request);
                pending.get_response().await
            }
        };

        response.map_err(|e| PaymailError::Dns(format!("query to {} failed: {}", server, e)))
    }
}

impl Default for NetworkExchange {
    fn default() -> Self {
        Self::new(NameServerNetwork::Udp, Duration::from_secs(5))
    }
}

#[async_trait]
impl DnsExchange for NetworkExchange {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, query), fields(name = %query.qname(), record_type = %query.qtype()))
    )]
    async fn exchange(&self, query: &Query, server: &str) -> Result<Response> {
        tokio::time::timeout(self.timeout, self.round_trip(query, server))
            .await
            .map_err(|_| PaymailError::ConnectionTimeout {
                operation: format!("dns query {} {}", query.qtype(), query.qname()),
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }
}
