//! Host discovery through SRV records.

use serde::{Deserialize, Serialize};

use crate::client::PaymailClient;
use crate::dns::fqdn;
use crate::utilities::validate_domain;
use crate::{PaymailError, Result};

/// A discovered service host.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvRecord {
    /// Host name serving the capability document.
    pub target: String,
    /// Port on the target.
    pub port: u16,
    /// Lower values are preferred.
    pub priority: u16,
    /// Relative weight among records with the same priority.
    pub weight: u16,
}

impl PaymailClient {
    /// Look up the SRV record for `_service._protocol.domain`.
    ///
    /// Returns the first record in priority order. Fails with a not-found error
    /// when the resolver answers with no records, and when the answering name
    /// is not the name that was asked for.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self), fields(service = %service, protocol = %protocol))
    )]
    pub async fn get_srv_record(
        &self,
        service: &str,
        protocol: &str,
        domain: &str,
    ) -> Result<SrvRecord> {
        if service.is_empty() {
            return Err(PaymailError::invalid_data("service", "invalid parameter: service"));
        }
        if protocol.is_empty() {
            return Err(PaymailError::invalid_data("protocol", "invalid parameter: protocol"));
        }
        if domain.is_empty() {
            return Err(PaymailError::invalid_data("domain", "invalid parameter: domain"));
        }

        let (cname, records) = self.resolver().lookup_srv(service, protocol, domain).await?;

        let expected = fqdn(&format!("_{}._{}.{}", service, protocol, domain));
        if !cname.eq_ignore_ascii_case(&expected) {
            return Err(PaymailError::ValidationFailed(format!(
                "srv cname was invalid or not found: {} expected {}",
                cname, expected
            )));
        }

        records
            .into_iter()
            .next()
            .ok_or_else(|| PaymailError::not_found("srv record", expected))
    }

    /// Check a discovered record against the expected port, priority and weight.
    ///
    /// A zero expectation skips that field. The target must be a valid domain
    /// name and must resolve to at least one address.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn validate_srv_record(
        &self,
        record: Option<&SrvRecord>,
        port: u16,
        priority: u16,
        weight: u16,
    ) -> Result<()> {
        let record = record.ok_or_else(|| PaymailError::invalid_data("srv", "missing record"))?;

        if record.target.is_empty() {
            return Err(PaymailError::invalid_data("srv target", "missing target"));
        }

        let target = record.target.trim_end_matches('.');
        validate_domain(target)?;

        if port > 0 && record.port != port {
            return Err(PaymailError::ValidationFailed(format!(
                "srv port {} does not match {}",
                record.port, port
            )));
        }
        if priority > 0 && record.priority != priority {
            return Err(PaymailError::ValidationFailed(format!(
                "srv priority {} does not match {}",
                record.priority, priority
            )));
        }
        if weight > 0 && record.weight != weight {
            return Err(PaymailError::ValidationFailed(format!(
                "srv weight {} does not match {}",
                record.weight, weight
            )));
        }

        let addrs = self.resolver().lookup_ip_addr(target).await?;
        if addrs.is_empty() {
            return Err(PaymailError::not_found("srv target address", target));
        }

        Ok(())
    }
}
