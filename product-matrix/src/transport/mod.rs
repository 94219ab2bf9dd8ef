//! Upstream transport abstraction.
//!
//! The catalog client describes each upstream call as an [`UpstreamRequest`]
//! and hands it to a [`Transport`] together with the tenant's bearer token.
//! [`HttpTransport`] is the production implementation; tests substitute a
//! scripted transport to drive the pipeline without a network.
//!
//! # Examples
//!
//! ```rust,no_run
//! use product_matrix::transport::{HttpTransport, Transport, UpstreamRequest};
//!
//! # async fn example() -> product_matrix::error::Result<()> {
//! let transport = HttpTransport::new()?;
//!
//! let request = UpstreamRequest::get("https://catalogsdemo.iqmetrix.net", "/v1/Companies(1)/Catalog/GroupedSearch")
//!     .with_query("Page", "1")
//!     .with_query("PageSize", "20");
//!
//! let response = transport.send(&request, "access-token").await?;
//! println!("Status: {}", response.status);
//! # Ok(())
//! # }
//! ```

#[allow(
    redundant_imports,
    reason = "Future needed for RPITIT despite being in Edition 2024 prelude"
)]
use std::future::Future;
use std::{fmt, time::Duration};

use serde_json::Value;
use url::Url;

use crate::error::{ConnectorError, Result};

pub mod config;
pub mod http;

pub use config::{HttpConfig, HttpVersion};
pub use http::HttpTransport;

/// HTTP method of an upstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST` with a JSON body.
    Post,
}

impl Method {
    /// Method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    /// HTTP method.
    pub method: Method,
    /// Service base URL, e.g. `https://catalogsdemo.iqmetrix.net`.
    pub base_url: String,
    /// Request path, beginning with `/`.
    pub path: String,
    /// Query parameters in insertion order.
    pub query: Vec<(String, String)>,
    /// JSON body for `POST`.
    pub body: Option<Value>,
}

impl UpstreamRequest {
    /// Creates a `GET` request.
    #[must_use]
    pub fn get(base_url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            base_url: base_url.into(),
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Creates a `POST` request with a JSON body.
    #[must_use]
    pub fn post(base_url: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            base_url: base_url.into(),
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Looks up the first query parameter named `key`.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Builds the full request URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::TransportError`] if the base URL and path do
    /// not form a valid URL.
    pub fn url(&self) -> Result<Url> {
        let raw = format!("{}{}", self.base_url.trim_end_matches('/'), self.path);
        let mut url = Url::parse(&raw)
            .map_err(|e| ConnectorError::TransportError(format!("invalid URL '{raw}': {e}")))?;

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(url)
    }
}

/// A successful upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase accompanying the status, e.g. `OK`.
    pub status_message: String,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Time from send to body received.
    pub elapsed: Duration,
}

impl UpstreamResponse {
    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MalformedUpstreamResponse`] if the body is not JSON.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ConnectorError::MalformedUpstreamResponse(format!("body is not valid JSON: {e}."))
        })
    }
}

/// Sends upstream requests.
///
/// Implementations resolve non-success statuses into
/// [`ConnectorError::UpstreamStatus`], so a returned [`UpstreamResponse`]
/// always carries a 2xx status.
pub trait Transport: Send + Sync {
    /// Sends `request` authenticated with `access_token` as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::UpstreamStatus`] for non-success statuses,
    /// [`ConnectorError::HttpError`] when the request fails in flight, and
    /// [`ConnectorError::TransportError`] when it cannot be built.
    fn send<'a>(
        &'a self,
        request: &'a UpstreamRequest,
        access_token: &'a str,
    ) -> impl Future<Output = Result<UpstreamResponse>> + Send + 'a;

    /// Protocol name for logging.
    fn protocol_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_url_with_query() {
        let request = UpstreamRequest::get(
            "https://catalogsdemo.iqmetrix.net/",
            "/v1/Companies(14146)/Catalog/GroupedSearch",
        )
        .with_query("VendorIds", "11,22")
        .with_query("Page", "2");

        let url = request.url().unwrap();
        assert_eq!(url.host_str(), Some("catalogsdemo.iqmetrix.net"));
        assert_eq!(url.path(), "/v1/Companies(14146)/Catalog/GroupedSearch");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![("VendorIds".to_owned(), "11,22".to_owned()), ("Page".to_owned(), "2".to_owned())]
        );
        assert_eq!(request.query_param("Page"), Some("2"));
        assert_eq!(request.query_param("PageSize"), None);
    }

    #[test]
    fn test_url_without_query() {
        let request = UpstreamRequest::post(
            "https://catalogs.iqmetrix.net",
            "/v1/Companies(1)/Catalog/Items/ProductDetails/Bulk",
            json!({ "CatalogItemIds": ["a"] }),
        );
        let url = request.url().unwrap();
        assert!(url.query().is_none());
        assert_eq!(request.method, Method::Post);
    }

    #[test]
    fn test_url_invalid_base() {
        let request = UpstreamRequest::get("not a url", "/x");
        assert!(matches!(request.url(), Err(ConnectorError::TransportError(_))));
    }

    #[test]
    fn test_response_json() {
        let response = UpstreamResponse {
            status: 200,
            status_message: "OK".to_owned(),
            body: br#"{"Items":[]}"#.to_vec(),
            elapsed: Duration::from_millis(5),
        };
        assert_eq!(response.json().unwrap(), json!({ "Items": [] }));

        let response = UpstreamResponse {
            status: 200,
            status_message: "OK".to_owned(),
            body: Vec::new(),
            elapsed: Duration::ZERO,
        };
        assert!(matches!(response.json(), Err(ConnectorError::MalformedUpstreamResponse(_))));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
    }
}
