//! DNSSEC chain-of-trust checks.
//!
//! A check never fails outright. Every problem is written to
//! [`DnssecResult::error_message`] and the result comes back with
//! `dnssec == false`, so a failed check can downgrade trust without aborting
//! a payment flow.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use domain::base::iana::DigestAlg;
use domain::base::ParsedName;
use domain::rdata::{Dnskey, Ds, Ns, Nsec, Nsec3, Nsec3param};
use domain::validate::DnskeyExt;
use serde::{Deserialize, Serialize};

use crate::client::PaymailClient;
use crate::dns::{query, Name, Response, Rtype};
use crate::{PaymailError, Result};

/// DS digest algorithm numbers (RFC 4034, RFC 4509, RFC 6605).
pub const DIGEST_SHA1: u8 = 1;
pub const DIGEST_SHA256: u8 = 2;
pub const DIGEST_SHA384: u8 = 4;

/// Hosting platforms whose delegations cannot be followed.
///
/// Apps on these platforms are CNAMEs into a shared zone, so no NS set is
/// published for the app's own name.
const DOMAINS_WITH_ISSUES: &[&str] = &["herokuapp.com"];

/// A delegation signer record, published or recomputed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsRecord {
    pub algorithm: u8,
    /// Uppercase hex digest.
    pub digest: String,
    pub digest_type: u8,
    pub key_tag: u16,
}

impl<Octs: AsRef<[u8]>> From<&Ds<Octs>> for DsRecord {
    fn from(ds: &Ds<Octs>) -> Self {
        Self {
            algorithm: ds.algorithm().to_int(),
            digest: hex::encode_upper(ds.digest()),
            digest_type: ds.digest_type().to_int(),
            key_tag: ds.key_tag(),
        }
    }
}

/// A zone signing or key signing key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnskeyRecord {
    pub algorithm: u8,
    pub flags: u16,
    pub protocol: u8,
    /// Base64 public key.
    pub public_key: String,
}

impl<Octs: AsRef<[u8]>> From<&Dnskey<Octs>> for DnskeyRecord {
    fn from(key: &Dnskey<Octs>) -> Self {
        Self {
            algorithm: key.algorithm().to_int(),
            flags: key.flags(),
            protocol: key.protocol(),
            public_key: BASE64.encode(key.public_key()),
        }
    }
}

/// DS and DNSKEY records that link the parent zone to the child zone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnssecMatching {
    pub ds: Vec<DsRecord>,
    pub dnskey: Vec<DnskeyRecord>,
}

/// Authenticated denial record found for the domain, in presentation format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum NsecRecord {
    Nsec(String),
    Nsec3(String),
    Nsec3Param(String),
}

impl NsecRecord {
    /// "nsec", "nsec3" or "nsec3param".
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nsec(_) => "nsec",
            Self::Nsec3(_) => "nsec3",
            Self::Nsec3Param(_) => "nsec3param",
        }
    }

    /// Record data as it would appear in a zone file.
    pub fn data(&self) -> &str {
        match self {
            Self::Nsec(data) | Self::Nsec3(data) | Self::Nsec3Param(data) => data,
        }
    }
}

/// Outcome of [`PaymailClient::check_dnssec`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnssecResult {
    /// Registrable domain that was checked.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub domain: String,
    pub check_time: DateTime<Utc>,
    /// DS records published in the parent zone.
    #[serde(default)]
    pub ds_records: Vec<DsRecord>,
    /// DNSKEY records published by the domain.
    #[serde(default)]
    pub dnskey_records: Vec<DnskeyRecord>,
    /// DS records recomputed from `dnskey_records`, index aligned with them.
    #[serde(default, rename = "calculate_ds")]
    pub calculated_ds: Vec<DsRecord>,
    #[serde(default)]
    pub matching: DnssecMatching,
    /// Diagnostic only; does not affect `dnssec`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nsec: Option<NsecRecord>,
    /// True when both DS and DNSKEY records were found.
    pub dnssec: bool,
    /// Empty unless the check stopped early.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error_message: String,
}

impl DnssecResult {
    fn new() -> Self {
        Self {
            domain: String::new(),
            check_time: Utc::now(),
            ds_records: Vec::new(),
            dnskey_records: Vec::new(),
            calculated_ds: Vec::new(),
            matching: DnssecMatching::default(),
            nsec: None,
            dnssec: false,
            error_message: String::new(),
        }
    }

    fn fail(mut self, message: String) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!(domain = %self.domain, error = %message, "dnssec check stopped");
        self.dnssec = false;
        self.error_message = message;
        self
    }
}

/// Compute the DS record for `key` owned by `owner`.
///
/// The digest covers the canonical owner name followed by the DNSKEY RDATA.
/// SHA-1, SHA-256 and SHA-384 digests are supported.
pub fn calculate_ds<Octs: AsRef<[u8]>>(
    owner: &str,
    key: &Dnskey<Octs>,
    digest_type: u8,
) -> Result<DsRecord> {
    let name = Name::vec_from_str(owner)
        .map_err(|e| PaymailError::Dns(format!("invalid owner name {}: {}", owner, e)))?;
    let digest = key
        .digest(&name, DigestAlg::from_int(digest_type))
        .map_err(|_| PaymailError::Dns(format!("unsupported ds digest type {}", digest_type)))?;

    Ok(DsRecord {
        algorithm: key.algorithm().to_int(),
        digest: hex::encode_upper(digest.as_ref()),
        digest_type,
        key_tag: key.key_tag(),
    })
}

fn ds_records(message: &Response) -> Result<Vec<DsRecord>> {
    let mut records = Vec::new();
    for record in message.answer()?.limit_to::<Ds<_>>() {
        records.push(DsRecord::from(record?.data()));
    }
    Ok(records)
}

fn dnskeys(message: &Response) -> Result<Vec<Dnskey<Bytes>>> {
    let mut keys = Vec::new();
    for record in message.answer()?.limit_to::<Dnskey<_>>() {
        keys.push(record?.into_data());
    }
    Ok(keys)
}

/// First NSEC, NSEC3 or NSEC3PARAM record of type `rtype` in the answer.
fn nsec_record(message: &Response, rtype: Rtype) -> Result<Option<NsecRecord>> {
    let answer = message.answer()?;
    let found = if rtype == Rtype::NSEC {
        answer
            .limit_to::<Nsec<_, ParsedName<_>>>()
            .next()
            .transpose()?
            .map(|r| NsecRecord::Nsec(r.data().to_string()))
    } else if rtype == Rtype::NSEC3 {
        answer
            .limit_to::<Nsec3<_>>()
            .next()
            .transpose()?
            .map(|r| NsecRecord::Nsec3(r.data().to_string()))
    } else {
        answer
            .limit_to::<Nsec3param<_>>()
            .next()
            .transpose()?
            .map(|r| NsecRecord::Nsec3Param(r.data().to_string()))
    };
    Ok(found)
}

/// Normalize to ASCII and reduce to the registrable domain.
fn registrable_domain(domain: &str) -> std::result::Result<(String, String), String> {
    let ascii = idna::domain_to_ascii(domain.trim().trim_end_matches('.'))
        .map_err(|e| format!("failed to convert {} to ascii: {}", domain, e))?;
    if ascii.is_empty() {
        return Err("domain is empty".to_string());
    }

    let registrable = psl::domain_str(&ascii)
        .ok_or_else(|| format!("{} has no registrable domain", ascii))?
        .to_string();
    let suffix = psl::suffix_str(&registrable)
        .ok_or_else(|| format!("{} has no public suffix", registrable))?
        .to_string();
    Ok((registrable, suffix))
}

impl PaymailClient {
    /// Verify the DNSSEC delegation of `domain`.
    ///
    /// DS records are read from the parent zone's name server and DNSKEY
    /// records from the domain's own name server. Each DNSKEY is hashed with
    /// the digest type of the first DS record and matched against the
    /// published digests.
    ///
    /// `dnssec` is set whenever both record sets are non-empty, even if no
    /// recomputed digest matches; inspect [`DnssecResult::matching`] for the
    /// actual link.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn check_dnssec(&self, domain: &str) -> DnssecResult {
        let mut result = DnssecResult::new();

        let (registrable, tld) = match registrable_domain(domain) {
            Ok(parts) => parts,
            Err(message) => return result.fail(message),
        };
        result.domain = registrable;

        if let Some(issue) = DOMAINS_WITH_ISSUES
            .iter()
            .find(|d| result.domain.contains(*d))
        {
            let message = format!(
                "{} cannot be validated due to a known issue with {}",
                result.domain, issue
            );
            return result.fail(message);
        }

        let registry_ns = match self.resolve_one_ns(&tld).await {
            Ok(ns) => ns,
            Err(e) => return result.fail(format!("failed to resolve name server: {}", e)),
        };
        let domain_ns = match self.resolve_one_ns(&result.domain).await {
            Ok(ns) => ns,
            Err(e) => return result.fail(format!("failed to resolve name server: {}", e)),
        };

        let ds = match self
            .dnssec_query(&result.domain, Rtype::DS, &registry_ns)
            .await
        {
            Ok(message) => message,
            Err(e) => return result.fail(format!("failed to resolve domain ds: {}", e)),
        };
        result.ds_records = match ds_records(&ds) {
            Ok(records) => records,
            Err(e) => return result.fail(format!("failed to read domain ds: {}", e)),
        };

        let dnskey = match self
            .dnssec_query(&result.domain, Rtype::DNSKEY, &domain_ns)
            .await
        {
            Ok(message) => message,
            Err(e) => return result.fail(format!("failed to resolve domain dnskey: {}", e)),
        };
        let keys = match dnskeys(&dnskey) {
            Ok(keys) => keys,
            Err(e) => return result.fail(format!("failed to read domain dnskey: {}", e)),
        };
        result.dnskey_records = keys.iter().map(DnskeyRecord::from).collect();

        if !result.ds_records.is_empty() && !keys.is_empty() {
            let digest_type = result.ds_records[0].digest_type;
            let mut calculated = Vec::with_capacity(keys.len());
            for key in &keys {
                match calculate_ds(&result.domain, key, digest_type) {
                    Ok(ds) => calculated.push(ds),
                    Err(e) => return result.fail(format!("failed to calculate ds record: {}", e)),
                }
            }
            result.calculated_ds = calculated;
        }

        result.nsec = self.resolve_nsec(&result.domain).await;

        if !result.ds_records.is_empty() && !result.dnskey_records.is_empty() {
            let mut matching = DnssecMatching::default();
            for published in &result.ds_records {
                for (i, calculated) in result.calculated_ds.iter().enumerate() {
                    if calculated.digest == published.digest {
                        matching.ds.push(calculated.clone());
                        matching.dnskey.push(result.dnskey_records[i].clone());
                    }
                }
            }
            result.matching = matching;
            result.dnssec = true;
        }

        result
    }

    async fn dnssec_query(&self, name: &str, rtype: Rtype, server: &str) -> Result<Response> {
        self.exchange().exchange(&query(name, rtype)?, server).await
    }

    /// First NS host for `zone`, as `host:port` ready for a query.
    async fn resolve_one_ns(&self, zone: &str) -> Result<String> {
        let message = self
            .dnssec_query(zone, Rtype::NS, &self.options().name_server_addr())
            .await?;
        let record = message
            .answer()?
            .limit_to::<Ns<ParsedName<_>>>()
            .next()
            .transpose()?;
        record
            .map(|r| {
                format!(
                    "{}:{}",
                    r.data().nsdname().to_string().trim_end_matches('.'),
                    self.options().dns_port
                )
            })
            .ok_or_else(|| PaymailError::not_found("name server", zone))
    }

    /// Look up NSEC, NSEC3 and NSEC3PARAM concurrently and keep the first found
    /// in that order. Lookup failures are ignored.
    async fn resolve_nsec(&self, domain: &str) -> Option<NsecRecord> {
        let server = self.options().name_server_addr();
        let (nsec, nsec3, nsec3param) = tokio::join!(
            self.dnssec_query(domain, Rtype::NSEC, &server),
            self.dnssec_query(domain, Rtype::NSEC3, &server),
            self.dnssec_query(domain, Rtype::NSEC3PARAM, &server),
        );

        let lookups = [
            (Rtype::NSEC, nsec),
            (Rtype::NSEC3, nsec3),
            (Rtype::NSEC3PARAM, nsec3param),
        ];
        for (rtype, lookup) in lookups {
            match lookup.and_then(|message| nsec_record(&message, rtype)) {
                Ok(Some(found)) => return Some(found),
                Ok(None) => {}
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(domain = %domain, record_type = %rtype, error = %_e, "nsec lookup failed");
                }
            }
        }
        None
    }
}
