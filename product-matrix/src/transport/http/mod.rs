//! HTTP transport implementation using reqwest.

use std::time::Instant;

use reqwest::Client;
use tracing::{debug, instrument};

use super::config::{HttpConfig, HttpVersion};
use crate::{
    error::{ConnectorError, Result},
    transport::{Method, Transport, UpstreamRequest, UpstreamResponse},
};

/// Maximum number of body characters kept in an upstream failure message.
const BODY_EXCERPT_CHARS: usize = 512;

/// Builds the message of an upstream status failure from its reason phrase and body.
fn failure_message(reason: &str, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return reason.to_owned();
    }

    let mut excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
    if body.chars().nth(BODY_EXCERPT_CHARS).is_some() {
        excerpt.push_str("...");
    }

    if reason.is_empty() { excerpt } else { format!("{reason}: {excerpt}") }
}

/// HTTP/1.1 and HTTP/2 transport using reqwest.
///
/// Supports connection pooling, keep-alive and gzip responses. Every request
/// carries the tenant's access token as a bearer token and asks for JSON.
///
/// # Examples
///
/// ```
/// use product_matrix::transport::{HttpConfig, HttpTransport, HttpVersion};
///
/// let config = HttpConfig { timeout_secs: 30, http_version: HttpVersion::Http1, ..Default::default() };
/// let transport = HttpTransport::with_config(&config).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    http_version: HttpVersion,
}

impl HttpTransport {
    /// Creates a transport with the default [`HttpConfig`].
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpConfig::default())
    }

    /// Creates a transport with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SettingsError`] for out-of-range values and
    /// [`ConnectorError::HttpError`] if the client cannot be created.
    pub fn with_config(config: &HttpConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .gzip(true);

        builder = match config.http_version {
            HttpVersion::Http1 => builder.http1_only(),
            HttpVersion::Http2 => builder.http2_prior_knowledge(),
            HttpVersion::Auto => builder,
        };

        let client = builder.build()?;

        Ok(Self { client, http_version: config.http_version })
    }

    #[instrument(
        skip(self, request, access_token),
        fields(method = %request.method, path = %request.path)
    )]
    async fn execute_request(
        &self,
        request: &UpstreamRequest,
        access_token: &str,
    ) -> Result<UpstreamResponse> {
        let url = request.url()?;

        let mut builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
        };
        builder = builder.bearer_auth(access_token).header("Accept", "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(url = %url, has_body = request.body.is_some(), "sending upstream request");
        let started = Instant::now();

        let response = builder.send().await?;
        let status = response.status();
        let status_message = status.canonical_reason().unwrap_or_default().to_owned();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "upstream returned failure status");
            return Err(ConnectorError::UpstreamStatus {
                status: status.as_u16(),
                message: failure_message(&status_message, &body),
            });
        }

        let body = response.bytes().await?.to_vec();
        let elapsed = started.elapsed();

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = elapsed.as_millis(),
            "received upstream response"
        );

        Ok(UpstreamResponse { status: status.as_u16(), status_message, body, elapsed })
    }
}

impl Transport for HttpTransport {
    async fn send<'a>(
        &'a self,
        request: &'a UpstreamRequest,
        access_token: &'a str,
    ) -> Result<UpstreamResponse> {
        self.execute_request(request, access_token).await
    }

    fn protocol_name(&self) -> &'static str {
        match self.http_version {
            HttpVersion::Http1 => "http/1.1",
            HttpVersion::Http2 => "http/2",
            HttpVersion::Auto => "http",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_transport_new() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.protocol_name(), "http");
    }

    #[test]
    fn test_http_transport_protocol_name() {
        let config_http1 = HttpConfig { http_version: HttpVersion::Http1, ..Default::default() };
        assert_eq!(HttpTransport::with_config(&config_http1).unwrap().protocol_name(), "http/1.1");

        let config_http2 = HttpConfig { http_version: HttpVersion::Http2, ..Default::default() };
        assert_eq!(HttpTransport::with_config(&config_http2).unwrap().protocol_name(), "http/2");
    }

    #[test]
    fn test_http_transport_rejects_invalid_config() {
        let config = HttpConfig { timeout_secs: 0, ..Default::default() };
        let err = HttpTransport::with_config(&config).unwrap_err();
        assert!(matches!(err, ConnectorError::SettingsError(_)));
    }

    #[tokio::test]
    async fn test_http_transport_invalid_url() {
        let transport = HttpTransport::new().unwrap();
        let request = UpstreamRequest::get("not-a-url", "/test");

        let err = transport.send(&request, "token").await.unwrap_err();
        assert!(matches!(err, ConnectorError::TransportError(_)));
    }

    #[test]
    fn test_failure_message_uses_reason_without_body() {
        assert_eq!(failure_message("Service Unavailable", "  "), "Service Unavailable");
    }

    #[test]
    fn test_failure_message_includes_body() {
        assert_eq!(
            failure_message("Not Found", r#"{"Message":"No company"}"#),
            r#"Not Found: {"Message":"No company"}"#
        );
        assert_eq!(failure_message("", "oops"), "oops");
    }

    #[test]
    fn test_failure_message_truncates_long_body() {
        let body = "x".repeat(BODY_EXCERPT_CHARS + 10);
        let message = failure_message("Bad Request", &body);
        assert_eq!(message.len(), "Bad Request: ".len() + BODY_EXCERPT_CHARS + 3);
        assert!(message.ends_with("..."));
    }
}
