//! Canned DNS collaborators.

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;

use bytes::Bytes;
use domain::base::iana::Rcode;
use domain::base::rdata::ComposeRecordData;
use domain::base::MessageBuilder;
use domain::rdata::A;

use crate::dns::{fqdn, DnsExchange, DnsResolver, Message, Name, Query, Response, Rtype};
use crate::srv::SrvRecord;
use crate::{PaymailError, Result};

/// Resolver answering from fixed tables.
///
/// SRV lookups for unknown names answer with the expected canonical name and
/// no records. Host lookups for unknown names fail with not found.
#[derive(Debug, Default)]
pub struct MockResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
    srv: HashMap<String, (String, Vec<SrvRecord>)>,
}

fn srv_key(service: &str, proto: &str, name: &str) -> String {
    format!("_{}._{}.{}", service, proto, name).to_lowercase()
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixtures used by [`new_test_client`](super::new_test_client).
    ///
    /// - `bsvalias`/`tcp`/`test.com` answers `www.test.com:443`, priority 10, weight 10
    /// - `invalid`/`tcp`/`test.com` answers under the wrong canonical name
    /// - `domain.com` and `www.test.com` resolve; nothing else does
    pub fn with_fixtures() -> Self {
        Self::new()
            .with_srv(
                "bsvalias",
                "tcp",
                "test.com",
                "_bsvalias._tcp.test.com.",
                vec![SrvRecord {
                    target: "www.test.com".to_string(),
                    port: 443,
                    priority: 10,
                    weight: 10,
                }],
            )
            .with_srv(
                "invalid",
                "tcp",
                "test.com",
                "_invalid._tcp.",
                vec![SrvRecord {
                    target: "www.test.com".to_string(),
                    port: 443,
                    priority: 10,
                    weight: 10,
                }],
            )
            .with_host("domain.com", vec![IpAddr::V4(Ipv4Addr::new(44, 225, 125, 175))])
            .with_host(
                "www.test.com",
                vec![
                    IpAddr::V4(Ipv4Addr::new(44, 225, 125, 175)),
                    IpAddr::V4(Ipv4Addr::new(35, 165, 117, 200)),
                ],
            )
    }

    /// Answer address lookups for `host`.
    pub fn with_host(mut self, host: &str, ips: Vec<IpAddr>) -> Self {
        self.hosts.insert(host.to_lowercase(), ips);
        self
    }

    /// Answer SRV lookups for `_service._proto.name` with `cname` and `records`.
    pub fn with_srv(
        mut self,
        service: &str,
        proto: &str,
        name: &str,
        cname: &str,
        records: Vec<SrvRecord>,
    ) -> Self {
        self.srv
            .insert(srv_key(service, proto, name), (cname.to_string(), records));
        self
    }
}

#[async_trait]
impl DnsResolver for MockResolver {
    async fn lookup_host(&self, host: &str) -> Result<Vec<String>> {
        Ok(self
            .lookup_ip_addr(host)
            .await?
            .into_iter()
            .map(|ip| ip.to_string())
            .collect())
    }

    async fn lookup_ip_addr(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.hosts
            .get(&host.trim_end_matches('.').to_lowercase())
            .cloned()
            .ok_or_else(|| PaymailError::not_found("host", host))
    }

    async fn lookup_srv(
        &self,
        service: &str,
        proto: &str,
        name: &str,
    ) -> Result<(String, Vec<SrvRecord>)> {
        let key = srv_key(service, proto, name);
        Ok(self
            .srv
            .get(&key)
            .cloned()
            .unwrap_or_else(|| (fqdn(&key), Vec::new())))
    }
}

type QueryKey = (String, Rtype);

/// Exchange answering from canned messages keyed by name and type.
///
/// Unknown questions get an empty NOERROR answer. Every query is recorded
/// together with the server it was sent to.
#[derive(Default)]
pub struct MockDnsExchange {
    messages: HashMap<QueryKey, Response>,
    queries: Mutex<Vec<(String, Rtype, String)>>,
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_lowercase()
}

/// A response to `name`/`rtype` with `rcode` and `answers` owned by `name`.
pub fn response<D: ComposeRecordData>(
    name: &str,
    rtype: Rtype,
    rcode: Rcode,
    answers: Vec<D>,
) -> Response {
    let owner = Name::vec_from_str(name).expect("valid owner name");
    let mut builder = MessageBuilder::new_vec();
    builder.header_mut().set_qr(true);
    builder.header_mut().set_rcode(rcode);
    let mut builder = builder.question();
    builder.push((&owner, rtype)).expect("question fits");
    let mut builder = builder.answer();
    for data in answers {
        builder.push((&owner, 300, data)).expect("answer fits");
    }
    Message::from_octets(Bytes::from(builder.finish())).expect("well formed response")
}

impl MockDnsExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `name`/`rtype` with `answers`.
    pub fn with_answers<D: ComposeRecordData>(
        mut self,
        name: &str,
        rtype: Rtype,
        answers: Vec<D>,
    ) -> Self {
        self.messages.insert(
            (normalize(name), rtype),
            response(name, rtype, Rcode::NOERROR, answers),
        );
        self
    }

    /// Answer `name`/`rtype` with an error response code.
    pub fn with_rcode(mut self, name: &str, rtype: Rtype, rcode: Rcode) -> Self {
        self.messages.insert(
            (normalize(name), rtype),
            response::<A>(name, rtype, rcode, Vec::new()),
        );
        self
    }

    /// Queries received so far as `(name, type, server)`, names without the
    /// trailing dot.
    pub fn queries(&self) -> Vec<(String, Rtype, String)> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl DnsExchange for MockDnsExchange {
    async fn exchange(&self, query: &Query, server: &str) -> Result<Response> {
        let name = normalize(&query.qname().to_string());
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((name.clone(), query.qtype(), server.to_string()));
        }

        match self.messages.get(&(name.clone(), query.qtype())) {
            Some(message) => Ok(message.clone()),
            None => Ok(response::<A>(&name, query.qtype(), Rcode::NOERROR, Vec::new())),
        }
    }
}
