//! Shared HTTP client for the upstream APIs
//!
//! Every upstream (card platform, ERP, chat webhook) gets its own client
//! labelled with a service name, so errors and log lines say which side
//! failed. Connection failures, timeouts and 5xx answers are retried with
//! exponential backoff up to the configured attempt count.

use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use spendledger_domain::constants::REQUEST_TIMEOUT_SECS;
use spendledger_domain::LedgerError;
use tracing::{debug, warn};

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("spendledger/", env!("CARGO_PKG_VERSION"));
const MAX_BACKOFF_SHIFT: u32 = 8;

/// Retrying HTTP client bound to one upstream service.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    service: String,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Start a request on the underlying client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Upstream name used in error values and log fields.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Execute the request and decode a 2xx JSON body.
    ///
    /// Non-2xx answers become [`LedgerError::Upstream`] carrying the status and
    /// response body.
    pub async fn send_json<T>(&self, builder: RequestBuilder) -> Result<T, LedgerError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(builder).await?;
        let response = self.ensure_success(response).await?;
        response.json::<T>().await.map_err(|err| {
            LedgerError::Network(format!("{} returned an unreadable body: {err}", self.service))
        })
    }

    /// Pass 2xx responses through; turn anything else into an upstream error.
    pub async fn ensure_success(&self, response: Response) -> Result<Response, LedgerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(service = %self.service, %status, "upstream returned an error status");
        Err(LedgerError::Upstream { service: self.service.clone(), status: status.as_u16(), body })
    }

    /// Send with retries. The final response is returned whatever its status;
    /// use [`HttpClient::ensure_success`] or [`HttpClient::send_json`] to
    /// reject non-2xx answers.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, LedgerError> {
        let mut attempt = 1;
        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| LedgerError::Internal("streaming request bodies cannot be retried".into()))?
                .build()
                .map_err(|err| self.classify(err))?;
            let (method, url) = (request.method().clone(), request.url().clone());
            let retries_left = attempt < self.max_attempts;

            match self.client.execute(request).await {
                Ok(response) if response.status().is_server_error() && retries_left => {
                    debug!(service = %self.service, attempt, %method, %url, status = %response.status(), "retrying after server error");
                }
                Ok(response) => {
                    debug!(service = %self.service, attempt, %method, %url, status = %response.status(), "HTTP response");
                    return Ok(response);
                }
                Err(err) if retries_left && is_transient(&err) => {
                    debug!(service = %self.service, attempt, %method, %url, error = %err, "retrying after transport error");
                }
                Err(err) => return Err(self.classify(err)),
            }

            self.backoff(attempt).await;
            attempt += 1;
        }
    }

    /// Convert a transport error, attributing timeouts to this service.
    fn classify(&self, err: reqwest::Error) -> LedgerError {
        match LedgerError::from(InfraError::from(err)) {
            LedgerError::Timeout { message, .. } => {
                LedgerError::Timeout { service: self.service.clone(), message }
            }
            other => other,
        }
    }

    async fn backoff(&self, attempt: usize) {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(MAX_BACKOFF_SHIFT).min(MAX_BACKOFF_SHIFT);
        let delay = self.base_backoff.saturating_mul(1 << shift);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    service: String,
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            service: "http".to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl HttpClientBuilder {
    /// Name of the upstream this client talks to (`card`, `erp`, `slack`).
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Per-request ceiling, applied to each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts including the first; at least one.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<HttpClient, LedgerError> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|err| LedgerError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            service: self.service,
            max_attempts: self.max_attempts,
            base_backoff: self.base_backoff,
        })
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
