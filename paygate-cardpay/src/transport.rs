//! HTTP transport for CardPay calls.
//!
//! Every exchange with the provider, successful or not, is handed to an
//! [`AuditSink`] with the authorization header and credentials redacted.

use crate::error::{GatewayError, GatewayResult};
use paygate_config::GatewaySettings;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

const REDACTED: &str = "[REDACTED]";

/// Form fields whose values never reach the audit trail
const SECRET_FORM_FIELDS: &[&str] = &["password", "refresh_token"];

/// Provider endpoint invoked by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderAction {
    Authenticate,
    Refresh,
    CreatePayment,
}

impl ProviderAction {
    /// Path of the endpoint relative to the payment system base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Authenticate | Self::Refresh => "/api/auth/token",
            Self::CreatePayment => "/api/payments",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::Refresh => "refresh",
            Self::CreatePayment => "create_payment",
        }
    }
}

impl fmt::Display for ProviderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request/response pair as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpExchange {
    pub action: ProviderAction,
    pub url: String,
    pub request_headers: Vec<(String, String)>,
    pub request_body: String,
    /// `None` when no response arrived
    pub status: Option<u16>,
    pub response_headers: Vec<(String, String)>,
    pub response_body: String,
    /// Transport failure, if any
    pub error: Option<String>,
    pub elapsed: Duration,
}

/// Receives every provider exchange.
pub trait AuditSink: Send + Sync {
    fn record(&self, exchange: &HttpExchange);
}

/// Audit sink that emits exchanges as `tracing` events.
#[derive(Debug, Clone)]
pub struct TracingAuditSink {
    log_bodies: bool,
}

impl TracingAuditSink {
    pub fn new() -> Self {
        Self { log_bodies: true }
    }

    /// Omit request and response bodies from events.
    pub fn without_bodies(mut self) -> Self {
        self.log_bodies = false;
        self
    }
}

impl Default for TracingAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for TracingAuditSink {
    fn record(&self, exchange: &HttpExchange) {
        tracing::debug!(
            action = %exchange.action,
            url = %exchange.url,
            status = ?exchange.status,
            elapsed_ms = exchange.elapsed.as_millis() as u64,
            error = ?exchange.error,
            request_headers = ?exchange.request_headers,
            response_headers = ?exchange.response_headers,
            "Provider exchange"
        );

        if self.log_bodies {
            tracing::debug!(
                action = %exchange.action,
                request_body = %exchange.request_body,
                response_body = %exchange.response_body,
                "Provider exchange bodies"
            );
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(paygate_config::DEFAULT_HTTP_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(5),
            user_agent: format!("paygate-cardpay/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl TransportConfig {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Status and body of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// HTTP transport shared by the auth and payment clients.
pub struct Transport {
    client: Client,
    audit: Arc<dyn AuditSink>,
}

impl Transport {
    /// Create a transport with the given configuration.
    pub fn new(config: TransportConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            audit: Arc::new(TracingAuditSink::new()),
        })
    }

    /// Create a transport from gateway settings.
    pub fn from_settings(settings: &GatewaySettings) -> GatewayResult<Self> {
        let transport = Self::new(TransportConfig::default().timeout(settings.http_timeout()))?;
        let sink = if settings.audit_bodies {
            TracingAuditSink::new()
        } else {
            TracingAuditSink::new().without_bodies()
        };
        Ok(transport.with_audit_sink(Arc::new(sink)))
    }

    /// Replace the audit sink.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    /// Resolve the endpoint for an action against a payment system base URL.
    pub fn endpoint(base_url: &str, action: ProviderAction) -> GatewayResult<Url> {
        let mut url = Url::parse(base_url)
            .map_err(|e| GatewayError::Configuration(format!("{}: {}", base_url, e)))?;
        url.set_path(action.path());
        Ok(url)
    }

    /// POST an urlencoded form.
    pub async fn post_form(
        &self,
        action: ProviderAction,
        base_url: &str,
        form: &[(&str, &str)],
    ) -> GatewayResult<RawResponse> {
        let url = Self::endpoint(base_url, action)?;
        let body = encode_form(form, false);
        let content_type = "application/x-www-form-urlencoded";

        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);

        self.execute(
            action,
            url,
            request,
            vec![(CONTENT_TYPE.to_string(), content_type.to_string())],
            encode_form(form, true),
        )
        .await
    }

    /// POST a JSON body with an `Authorization` header.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        action: ProviderAction,
        base_url: &str,
        body: &T,
        authorization: &str,
    ) -> GatewayResult<RawResponse> {
        let url = Self::endpoint(base_url, action)?;
        let body = serde_json::to_string(body)?;
        let content_type = "application/json";

        let request = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, content_type)
            .header(AUTHORIZATION, authorization)
            .body(body.clone());

        self.execute(
            action,
            url,
            request,
            vec![
                (CONTENT_TYPE.to_string(), content_type.to_string()),
                (AUTHORIZATION.to_string(), REDACTED.to_string()),
            ],
            body,
        )
        .await
    }

    async fn execute(
        &self,
        action: ProviderAction,
        url: Url,
        request: reqwest::RequestBuilder,
        request_headers: Vec<(String, String)>,
        audit_body: String,
    ) -> GatewayResult<RawResponse> {
        let started = Instant::now();
        let mut exchange = HttpExchange {
            action,
            url: url.to_string(),
            request_headers,
            request_body: audit_body,
            status: None,
            response_headers: Vec::new(),
            response_body: String::new(),
            error: None,
            elapsed: Duration::ZERO,
        };

        let result = match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                exchange.status = Some(status);
                exchange.response_headers = header_pairs(response.headers());
                response.text().await.map(|body| RawResponse { status, body })
            }
            Err(e) => Err(e),
        };

        exchange.elapsed = started.elapsed();
        match &result {
            Ok(response) => exchange.response_body = response.body.clone(),
            Err(e) => exchange.error = Some(e.to_string()),
        }
        self.audit.record(&exchange);

        result.map_err(GatewayError::from)
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport").finish_non_exhaustive()
    }
}

fn encode_form(form: &[(&str, &str)], redact: bool) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in form {
        if redact && SECRET_FORM_FIELDS.contains(key) {
            serializer.append_pair(key, REDACTED);
        } else {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}

fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if *name == AUTHORIZATION {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or_default().to_string()
            };
            (name.to_string(), value)
        })
        .collect()
}
