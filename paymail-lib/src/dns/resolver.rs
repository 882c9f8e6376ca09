//! Host, address and SRV lookups.

use async_trait::async_trait;
use domain::base::iana::Rcode;
use domain::base::ParsedName;
use domain::rdata::{Aaaa, Srv, A};
use std::net::IpAddr;
use std::sync::Arc;

use super::exchange::DnsExchange;
use super::{fqdn, query, Response, Rtype};
use crate::srv::SrvRecord;
use crate::{PaymailError, Result};

/// Resolver used for host discovery.
///
/// Swap in a custom implementation with
/// [`PaymailClient::with_resolver`](crate::PaymailClient::with_resolver).
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Addresses of `host` rendered as strings.
    async fn lookup_host(&self, host: &str) -> Result<Vec<String>>;

    /// Addresses of `host`.
    async fn lookup_ip_addr(&self, host: &str) -> Result<Vec<IpAddr>>;

    /// SRV records for `_service._proto.name`, with the canonical name that answered.
    async fn lookup_srv(
        &self,
        service: &str,
        proto: &str,
        name: &str,
    ) -> Result<(String, Vec<SrvRecord>)>;
}

/// Resolver that queries a single recursive name server.
pub struct NameServerResolver {
    exchange: Arc<dyn DnsExchange>,
    server: String,
}

impl NameServerResolver {
    /// Query `server` (`host:port`) through `exchange`.
    pub fn new(exchange: Arc<dyn DnsExchange>, server: impl Into<String>) -> Self {
        Self {
            exchange,
            server: server.into(),
        }
    }

    async fn query(&self, name: &str, rtype: Rtype) -> Result<Response> {
        let message = self
            .exchange
            .exchange(&query(name, rtype)?, &self.server)
            .await?;
        let rcode = message.header().rcode();
        if rcode == Rcode::NXDOMAIN {
            return Err(PaymailError::not_found("host", name));
        }
        if rcode != Rcode::NOERROR {
            return Err(PaymailError::Dns(format!(
                "{} lookup for {} failed with {}",
                rtype, name, rcode
            )));
        }
        Ok(message)
    }

    async fn addresses(&self, host: &str, rtype: Rtype) -> Result<Vec<IpAddr>> {
        let message = self.query(host, rtype).await?;
        let answer = message.answer()?;

        let mut addrs = Vec::new();
        if rtype == Rtype::AAAA {
            for record in answer.limit_to::<Aaaa>() {
                addrs.push(IpAddr::V6(record?.data().addr()));
            }
        } else {
            for record in answer.limit_to::<A>() {
                addrs.push(IpAddr::V4(record?.data().addr()));
            }
        }
        Ok(addrs)
    }
}

#[async_trait]
impl DnsResolver for NameServerResolver {
    async fn lookup_host(&self, host: &str) -> Result<Vec<String>> {
        Ok(self
            .lookup_ip_addr(host)
            .await?
            .into_iter()
            .map(|ip| ip.to_string())
            .collect())
    }

    /// Either address family may fail on its own; the lookup only fails when
    /// neither produced an address.
    async fn lookup_ip_addr(&self, host: &str) -> Result<Vec<IpAddr>> {
        let (v4, v6) = tokio::join!(
            self.addresses(host, Rtype::A),
            self.addresses(host, Rtype::AAAA)
        );

        let mut addrs = Vec::new();
        let mut first_error = None;
        for lookup in [v4, v6] {
            match lookup {
                Ok(found) => addrs.extend(found),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(host = %host, error = %e, "address lookup failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if !addrs.is_empty() {
            return Ok(addrs);
        }
        Err(first_error.unwrap_or_else(|| PaymailError::not_found("host", host)))
    }

    async fn lookup_srv(
        &self,
        service: &str,
        proto: &str,
        name: &str,
    ) -> Result<(String, Vec<SrvRecord>)> {
        let qname = fqdn(&format!("_{}._{}.{}", service, proto, name));
        let message = self.query(&qname, Rtype::SRV).await?;

        let mut cname = qname.clone();
        let mut records = Vec::new();
        for record in message.answer()?.limit_to::<Srv<ParsedName<_>>>() {
            let record = record?;
            cname = fqdn(&record.owner().to_string());
            let srv = record.data();
            records.push(SrvRecord {
                target: srv.target().to_string().trim_end_matches('.').to_string(),
                port: srv.port(),
                priority: srv.priority(),
                weight: srv.weight(),
            });
        }

        // Lowest priority first, heavier weight first within a priority.
        records.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.weight.cmp(&a.weight)));
        Ok((cname, records))
    }
}
