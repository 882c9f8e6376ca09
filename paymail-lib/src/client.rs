//! The Paymail client and the request/response contract shared by every endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::brfc::BrfcSpec;
use crate::config::ClientOptions;
use crate::dns::{DnsExchange, DnsResolver, NameServerResolver, NetworkExchange};
use crate::errors::{ResponseError, ResponseResult};
use crate::script::{ScriptAdapter, StandardScriptAdapter};
use crate::{PaymailError, Result};

/// Timing recorded for a request when request tracing is enabled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTrace {
    /// Wall time across all attempts in milliseconds.
    pub total_time_ms: u64,
    /// Number of attempts made, including the successful one.
    pub attempts: u32,
}

/// Raw outcome of an HTTP exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StandardResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Response body.
    pub body: Vec<u8>,
    /// Timing, when tracing is enabled.
    pub tracing: Option<RequestTrace>,
}

impl StandardResponse {
    /// Classify the status code.
    ///
    /// 200 and 304 succeed. 404 means the paymail does not exist. Anything else
    /// is decoded as a [`ServerError`]; if the body is not valid JSON the decode
    /// failure is returned instead.
    pub fn check_status(&self, target: &str) -> Result<()> {
        match self.status_code {
            200 | 304 => Ok(()),
            404 => Err(PaymailError::not_found("paymail address", target)),
            status => {
                let server_error: ServerError = serde_json::from_slice(&self.body)?;
                Err(PaymailError::BadResponse {
                    status,
                    message: server_error.message,
                })
            }
        }
    }

    /// Decode the body as JSON.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Canonical body of a non-success response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    /// Machine-readable error code.
    #[serde(default)]
    pub code: String,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// A typed response: the raw exchange plus the decoded payload.
pub trait PaymailResponse: Sized {
    /// Decoded body type.
    type Payload: DeserializeOwned + Default;

    /// Assemble the response.
    fn from_parts(standard: StandardResponse, payload: Self::Payload) -> Self;
}

/// Client for the Paymail protocol.
///
/// Cheap to share across tasks; all collaborators are read-only after construction.
///
/// # Example
///
/// ```rust,ignore
/// use paymail_lib::{ClientOptions, PaymailClient};
///
/// let client = PaymailClient::new(ClientOptions::default())?;
/// let srv = client.get_srv_record("bsvalias", "tcp", "moneybutton.com").await?;
/// let caps = client.get_capabilities(&srv.target, srv.port).await?;
/// ```
#[derive(Clone)]
pub struct PaymailClient {
    options: ClientOptions,
    http: reqwest::Client,
    resolver: Arc<dyn DnsResolver>,
    exchange: Arc<dyn DnsExchange>,
    script: Arc<dyn ScriptAdapter>,
    custom_resolver: bool,
}

impl std::fmt::Debug for PaymailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymailClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PaymailClient {
    /// Create a client with the given options.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(options.http_timeout())
            .user_agent(options.user_agent.clone())
            .build()
            .map_err(|e| PaymailError::Internal(format!("failed to build HTTP client: {}", e)))?;

        let exchange: Arc<dyn DnsExchange> = Arc::new(NetworkExchange::new(
            options.name_server_network,
            options.dns_timeout(),
        ));
        let resolver: Arc<dyn DnsResolver> = Arc::new(NameServerResolver::new(
            exchange.clone(),
            options.name_server_addr(),
        ));

        Ok(Self {
            options,
            http,
            resolver,
            exchange,
            script: Arc::new(StandardScriptAdapter),
            custom_resolver: false,
        })
    }

    /// Replace the resolver used for SRV and address lookups.
    pub fn with_resolver(mut self, resolver: Arc<dyn DnsResolver>) -> Self {
        self.resolver = resolver;
        self.custom_resolver = true;
        self
    }

    /// Replace the DNS transport used for DNSSEC checks.
    ///
    /// The default resolver is rebuilt on the new transport; a resolver set
    /// with [`with_resolver`](Self::with_resolver) is kept.
    pub fn with_dns_exchange(mut self, exchange: Arc<dyn DnsExchange>) -> Self {
        if !self.custom_resolver {
            self.resolver = Arc::new(NameServerResolver::new(
                exchange.clone(),
                self.options.name_server_addr(),
            ));
        }
        self.exchange = exchange;
        self
    }

    /// Replace the HTTP client.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Replace the script and signature collaborator.
    pub fn with_script_adapter(mut self, script: Arc<dyn ScriptAdapter>) -> Self {
        self.script = script;
        self
    }

    /// Client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Known BRFC specifications.
    pub fn brfcs(&self) -> &[BrfcSpec] {
        &self.options.brfc_specs
    }

    /// User agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.options.user_agent
    }

    pub(crate) fn resolver(&self) -> &dyn DnsResolver {
        self.resolver.as_ref()
    }

    pub(crate) fn exchange(&self) -> &dyn DnsExchange {
        self.exchange.as_ref()
    }

    pub(crate) fn script(&self) -> &dyn ScriptAdapter {
        self.script.as_ref()
    }

    // ========================================================================
    // Request engine
    // ========================================================================

    /// Check an endpoint URL before use.
    pub(crate) fn validate_url(&self, url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(PaymailError::invalid_data("url", "missing url"));
        }
        if self.options.require_https && !url.contains("https://") {
            return Err(PaymailError::invalid_data(
                "url",
                format!("invalid url: {}", url),
            ));
        }
        Ok(())
    }

    /// Issue a GET request.
    pub(crate) async fn get_request(&self, url: &str) -> Result<StandardResponse> {
        self.execute(self.http.get(url), url).await
    }

    /// Issue a POST request with a JSON body.
    pub(crate) async fn post_request<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<StandardResponse> {
        self.execute(self.http.post(url).json(body), url).await
    }

    async fn execute(&self, request: reqwest::RequestBuilder, url: &str) -> Result<StandardResponse> {
        let start = Instant::now();
        let mut attempts = 0u32;

        let response = loop {
            attempts += 1;
            let attempt = request
                .try_clone()
                .ok_or_else(|| PaymailError::Internal("request body is not cloneable".to_string()))?;

            match attempt.send().await {
                Ok(response) => break response,
                Err(e) => {
                    let err = self.map_reqwest_error(e, url);
                    if !err.is_retryable() || attempts > self.options.retry_count {
                        return Err(err);
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!(url = %url, attempt = attempts, error = %err, "retrying paymail request");
                }
            }
        };

        let status_code = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e, url))?
            .to_vec();

        let tracing = self.options.request_tracing.then(|| RequestTrace {
            total_time_ms: start.elapsed().as_millis() as u64,
            attempts,
        });

        Ok(StandardResponse {
            status_code,
            body,
            tracing,
        })
    }

    /// Classify and decode a response into its typed form.
    ///
    /// On a failed status or an undecodable body the error is returned together
    /// with the response, whose payload is left at its default.
    pub(crate) fn decode_response<R: PaymailResponse>(
        standard: StandardResponse,
        target: &str,
    ) -> ResponseResult<R> {
        if let Err(error) = standard.check_status(target) {
            return Err(ResponseError::with_response(
                error,
                R::from_parts(standard, R::Payload::default()),
            ));
        }
        match standard.decode::<R::Payload>() {
            Ok(payload) => Ok(R::from_parts(standard, payload)),
            Err(error) => Err(ResponseError::with_response(
                error,
                R::from_parts(standard, R::Payload::default()),
            )),
        }
    }

    fn map_reqwest_error(&self, e: reqwest::Error, url: &str) -> PaymailError {
        if e.is_timeout() {
            PaymailError::ConnectionTimeout {
                operation: format!("request to {}", url),
                timeout_ms: self.options.http_timeout_secs * 1000,
            }
        } else if e.is_connect() {
            PaymailError::ConnectionFailed {
                target: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            PaymailError::Transport(format!("paymail request failed: {}", e))
        }
    }
}
