//! TLS certificate check for a paymail host.

use std::time::Duration;

use crate::client::PaymailClient;
use crate::{PaymailError, Result};

impl PaymailClient {
    /// Open an HTTPS connection to `host` and report whether its certificate
    /// chain and hostname verified.
    ///
    /// Any HTTP status counts as a successful handshake. Connection, DNS and
    /// certificate failures are returned as errors.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn check_ssl(&self, host: &str) -> Result<bool> {
        let host = host.trim();
        if host.is_empty() {
            return Err(PaymailError::invalid_data("host", "missing host"));
        }

        let options = self.options();
        let client = reqwest::Client::builder()
            .connect_timeout(options.ssl_timeout())
            .timeout(Duration::from_secs(options.ssl_deadline_secs))
            .user_agent(options.user_agent.clone())
            .https_only(true)
            .build()
            .map_err(|e| PaymailError::Internal(format!("failed to build TLS client: {}", e)))?;

        let url = format!("https://{}/", host);
        match client.head(&url).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_timeout() => Err(PaymailError::ConnectionTimeout {
                operation: format!("tls handshake with {}", host),
                timeout_ms: options.ssl_deadline_secs * 1000,
            }),
            Err(e) => Err(PaymailError::ConnectionFailed {
                target: host.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
