//! Configuration types for the Paymail client.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::brfc::{default_brfcs, BrfcSpec};

/// Service name used in SRV records and the well-known path.
pub const DEFAULT_SERVICE_NAME: &str = "bsvalias";

/// Protocol label used in SRV lookups.
pub const DEFAULT_PROTOCOL: &str = "tcp";

/// Port expected for the discovered host.
pub const DEFAULT_PORT: u16 = 443;

/// Priority expected on the SRV record.
pub const DEFAULT_PRIORITY: u16 = 10;

/// Weight expected on the SRV record.
pub const DEFAULT_WEIGHT: u16 = 10;

/// bsvalias version advertised by servers.
pub const DEFAULT_BSV_ALIAS_VERSION: &str = "1.0";

/// Length of a hex encoded compressed public key.
pub const PUB_KEY_LENGTH: usize = 66;

/// Bitcoin network selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Bitcoin main network.
    #[default]
    Mainnet,
    /// Bitcoin test network.
    Testnet,
    /// Bitcoin stress test network.
    Stn,
}

impl Network {
    /// Get the network name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Stn => "STN",
        }
    }

    /// Get the conventional URL suffix for the network.
    pub fn url_suffix(&self) -> &'static str {
        match self {
            Self::Mainnet => "",
            Self::Testnet => "-testnet",
            Self::Stn => "-stn",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport used to reach the configured name server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameServerNetwork {
    /// Plain UDP datagrams.
    #[default]
    Udp,
    /// Length-prefixed TCP stream.
    Tcp,
}

/// Options shared by every client request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientOptions {
    /// Port of the name server used for DNS checks.
    #[serde(default = "default_dns_port")]
    pub dns_port: String,

    /// DNS round-trip timeout in seconds.
    #[serde(default = "default_dns_timeout")]
    pub dns_timeout_secs: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Recursive name server used for SRV and DNSSEC queries.
    #[serde(default = "default_name_server")]
    pub name_server: String,

    /// Transport used to reach the name server.
    #[serde(default)]
    pub name_server_network: NameServerNetwork,

    /// Record timing information on each response.
    #[serde(default)]
    pub request_tracing: bool,

    /// Number of retries after a transport failure.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// TLS handshake timeout in seconds.
    #[serde(default = "default_ssl_timeout")]
    pub ssl_timeout_secs: u64,

    /// Overall deadline for the TLS check in seconds.
    #[serde(default = "default_ssl_deadline")]
    pub ssl_deadline_secs: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Reject endpoint URLs that are not https.
    #[serde(default = "default_require_https")]
    pub require_https: bool,

    /// Known BRFC specifications.
    #[serde(default = "default_brfcs")]
    pub brfc_specs: Vec<BrfcSpec>,
}

fn default_dns_port() -> String {
    "53".to_string()
}

fn default_dns_timeout() -> u64 {
    5
}

fn default_http_timeout() -> u64 {
    20
}

fn default_name_server() -> String {
    "8.8.8.8".to_string()
}

fn default_retry_count() -> u32 {
    2
}

fn default_ssl_timeout() -> u64 {
    10
}

fn default_ssl_deadline() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("paymail-rs: v{}", env!("CARGO_PKG_VERSION"))
}

fn default_require_https() -> bool {
    true
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dns_port: default_dns_port(),
            dns_timeout_secs: default_dns_timeout(),
            http_timeout_secs: default_http_timeout(),
            name_server: default_name_server(),
            name_server_network: NameServerNetwork::default(),
            request_tracing: false,
            retry_count: default_retry_count(),
            ssl_timeout_secs: default_ssl_timeout(),
            ssl_deadline_secs: default_ssl_deadline(),
            user_agent: default_user_agent(),
            require_https: default_require_https(),
            brfc_specs: default_brfcs(),
        }
    }
}

impl ClientOptions {
    /// Create options with the protocol defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the DNS port.
    pub fn with_dns_port(mut self, port: impl Into<String>) -> Self {
        self.dns_port = port.into();
        self
    }

    /// Set the DNS timeout.
    pub fn with_dns_timeout(mut self, secs: u64) -> Self {
        self.dns_timeout_secs = secs;
        self
    }

    /// Set the HTTP timeout.
    pub fn with_http_timeout(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    /// Set the name server.
    pub fn with_name_server(mut self, ip: impl Into<String>) -> Self {
        self.name_server = ip.into();
        self
    }

    /// Set the name server transport.
    pub fn with_name_server_network(mut self, network: NameServerNetwork) -> Self {
        self.name_server_network = network;
        self
    }

    /// Enable request timing.
    pub fn with_request_tracing(mut self) -> Self {
        self.request_tracing = true;
        self
    }

    /// Set the retry count.
    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.retry_count = retries;
        self
    }

    /// Set the TLS handshake timeout.
    pub fn with_ssl_timeout(mut self, secs: u64) -> Self {
        self.ssl_timeout_secs = secs;
        self
    }

    /// Set the TLS check deadline.
    pub fn with_ssl_deadline(mut self, secs: u64) -> Self {
        self.ssl_deadline_secs = secs;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Allow or reject plain http endpoint URLs.
    pub fn with_require_https(mut self, require: bool) -> Self {
        self.require_https = require;
        self
    }

    /// Replace the BRFC specifications. An empty list keeps the defaults.
    pub fn with_brfc_specs(mut self, specs: Vec<BrfcSpec>) -> Self {
        if !specs.is_empty() {
            self.brfc_specs = specs;
        }
        self
    }

    /// Name server address as `host:port`.
    pub fn name_server_addr(&self) -> String {
        if self.name_server.contains(':') && !self.name_server.starts_with('[') {
            format!("[{}]:{}", self.name_server, self.dns_port)
        } else {
            format!("{}:{}", self.name_server, self.dns_port)
        }
    }

    /// URL scheme used for capability discovery.
    pub fn scheme(&self) -> &'static str {
        if self.require_https {
            "https"
        } else {
            "http"
        }
    }

    pub(crate) fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub(crate) fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub(crate) fn ssl_timeout(&self) -> Duration {
        Duration::from_secs(self.ssl_timeout_secs.min(self.ssl_deadline_secs))
    }
}
