//! Error types for the product matrix connector.
//!
//! Every failure raised inside the pipeline is a [`ConnectorError`]. Failures are
//! never propagated to the host as faults: the connector catches them once and
//! converts them into a well-formed [`Envelope`](crate::response::Envelope) via
//! [`error_envelope`](crate::response::error_envelope).
//!
//! # Error Categories
//!
//! - **Request errors** ([`ConnectorError::InvalidRequest`],
//!   [`ConnectorError::InvalidQueryType`], [`ConnectorError::NotImplemented`]):
//!   carry an explicit output status of 400
//! - **Upstream errors** ([`ConnectorError::UpstreamStatus`],
//!   [`ConnectorError::MalformedUpstreamResponse`], [`ConnectorError::HttpError`]):
//!   classified by [`normalize_upstream_status`](crate::response::normalize_upstream_status)
//!   or defaulted to 500
//! - **Local errors** ([`ConnectorError::SettingsError`],
//!   [`ConnectorError::TransportError`], [`ConnectorError::SerializationError`],
//!   [`ConnectorError::ReferenceError`], [`ConnectorError::CallbackFailed`])
//!
//! # Examples
//!
//! ```
//! use product_matrix::error::ConnectorError;
//!
//! let err = ConnectorError::InvalidQueryType("searchFields".to_owned());
//! assert_eq!(err.explicit_status(), Some(400));
//! assert_eq!(err.to_string(), "Invalid request, unknown query type: 'searchFields'");
//! ```

use thiserror::Error;

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Errors that can occur while serving a matrix product query.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The channel profile or query payload failed validation.
    ///
    /// Holds every rejection message produced by
    /// [`validate_request`](crate::request::validate_request).
    #[error("Invalid request [{}]", .0.join(" "))]
    InvalidRequest(Vec<String>),

    /// The resolved query type has no search strategy.
    #[error("Invalid request, unknown query type: '{0}'")]
    InvalidQueryType(String),

    /// The query type is recognized but deliberately unsupported.
    #[error("{0}")]
    NotImplemented(String),

    /// An upstream response was missing fields the pipeline depends on.
    ///
    /// # Recovery
    ///
    /// Usually an upstream contract change. The message names the fields that
    /// were expected.
    #[error("Response is not in expected format, {0}")]
    MalformedUpstreamResponse(String),

    /// The upstream answered with a non-success HTTP status.
    #[error("{status} - {message}")]
    UpstreamStatus {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Status text or a bounded excerpt of the response body.
        message: String,
    },

    /// The HTTP request failed before a status was received.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, refused connections, DNS and TLS failures.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Connector settings could not be parsed or are out of range.
    #[error("Invalid connector settings: {0}")]
    SettingsError(String),

    /// An upstream request could not be constructed.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// JSON serialization or deserialization failed outside an upstream response.
    #[error("Serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A business-reference expression could not be evaluated.
    #[error("Business reference extraction failed: {0}")]
    ReferenceError(String),

    /// The host callback rejected the final envelope.
    #[error("The callback function threw an exception: {0}")]
    CallbackFailed(String),
}

impl ConnectorError {
    /// Returns the output status this error sets explicitly, if any.
    ///
    /// Errors without an explicit status fall back to 500 during classification.
    #[must_use]
    pub const fn explicit_status(&self) -> Option<u16> {
        match self {
            Self::InvalidRequest(_) | Self::InvalidQueryType(_) | Self::NotImplemented(_) => {
                Some(400)
            }
            _ => None,
        }
    }

    /// Returns the upstream HTTP status for upstream status failures.
    #[must_use]
    pub const fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stable error name rendered into the output payload.
    ///
    /// Hosts key on these names, so they follow the connector platform's
    /// conventions rather than the Rust variant names.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UpstreamStatus { .. } => "StatusCodeError",
            Self::HttpError(_) => "RequestError",
            Self::MalformedUpstreamResponse(_) | Self::ReferenceError(_) => "TypeError",
            _ => "Error",
        }
    }
}
