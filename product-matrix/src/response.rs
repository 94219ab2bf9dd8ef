//! Output envelope, pagination status and error classification.
//!
//! Every request, successful or not, ends in an [`Envelope`]:
//!
//! ```json
//! {
//!   "ncStatusCode": 206,
//!   "response": { "endpointStatusCode": 200, "endpointStatusMessage": "OK" },
//!   "payload": [{ "doc": { ... }, "productRemoteID": "...", "productBusinessReference": "..." }]
//! }
//! ```
//!
//! On failure the payload is `{ "error": { "name", "message", "statusCode"? } }`;
//! on an empty result it is `{}`.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{
    error::{ConnectorError, Result},
    models::{CatalogEntity, MatrixItem},
    reference::ReferenceExtractor,
};

/// Status of the most recent upstream call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    /// Upstream HTTP status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_status_code: Option<u16>,
    /// Upstream status message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_status_message: Option<String>,
}

impl EndpointStatus {
    /// Creates a populated status.
    #[must_use]
    pub fn new(status: u16, message: &str) -> Self {
        Self { endpoint_status_code: Some(status), endpoint_status_message: Some(message.to_owned()) }
    }
}

/// One emitted matrix product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// The enriched matrix item.
    pub doc: MatrixItem,
    /// The item's catalog item id.
    #[serde(rename = "productRemoteID")]
    pub product_remote_id: Option<String>,
    /// Tenant-defined business reference.
    #[serde(rename = "productBusinessReference")]
    pub product_business_reference: String,
}

/// Serialized form of a [`ConnectorError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable error name.
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// Upstream status for upstream status failures.
    #[serde(rename = "statusCode", default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl From<&ConnectorError> for ErrorPayload {
    fn from(error: &ConnectorError) -> Self {
        Self {
            name: error.name().to_owned(),
            message: error.to_string(),
            status_code: error.upstream_status(),
        }
    }
}

/// Envelope payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Matrix products found.
    Records(Vec<OutputRecord>),
    /// The request failed.
    Error {
        /// The failure.
        error: ErrorPayload,
    },
    /// Nothing found.
    Empty {},
}

/// The result handed back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Normalized status of the whole request.
    #[serde(rename = "ncStatusCode")]
    pub nc_status_code: u16,
    /// Diagnostics of the last upstream call.
    pub response: EndpointStatus,
    /// Records, error or nothing.
    pub payload: Payload,
}

/// `206` while more pages remain (`page * page_size <= total_results`), else `200`.
///
/// # Examples
///
/// ```
/// use product_matrix::response::completeness_status;
///
/// assert_eq!(completeness_status(2, 50, 120.0), 206);
/// assert_eq!(completeness_status(3, 50, 120.0), 200);
/// ```
#[must_use]
pub fn completeness_status(page: u32, page_size: u32, total_results: f64) -> u16 {
    if f64::from(page) * f64::from(page_size) <= total_results { 206 } else { 200 }
}

/// Maps an upstream HTTP status onto the output status.
#[must_use]
pub const fn normalize_upstream_status(status: u16) -> u16 {
    match status {
        500.. => 500,
        401 | 429 => status,
        _ => 400,
    }
}

/// Builds the success envelope for the surviving items.
///
/// # Errors
///
/// Returns error if a business reference cannot be extracted.
pub fn paginate<E: ReferenceExtractor + ?Sized>(
    items: Vec<MatrixItem>,
    total_results: f64,
    page: u32,
    page_size: u32,
    business_references: &[String],
    extractor: &E,
    endpoint: EndpointStatus,
) -> Result<Envelope> {
    if items.is_empty() {
        info!("No products found.");
        return Ok(Envelope { nc_status_code: 204, response: endpoint, payload: Payload::Empty {} });
    }

    info!("Submitting {} matrix products...", items.len());
    let records = items
        .into_iter()
        .map(|item| -> Result<OutputRecord> {
            let doc = serde_json::to_value(&item)?;
            Ok(OutputRecord {
                product_remote_id: item.catalog_item_id().map(str::to_owned),
                product_business_reference: extractor.extract(business_references, &doc)?,
                doc: item,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Envelope {
        nc_status_code: completeness_status(page, page_size, total_results),
        response: endpoint,
        payload: Payload::Records(records),
    })
}

/// Converts a failure into an envelope.
///
/// Upstream status failures overwrite the endpoint diagnostics with the
/// failing status and message.
#[must_use]
pub fn error_envelope(failure: &ConnectorError, endpoint: EndpointStatus) -> Envelope {
    error!("{failure}");

    let mut nc_status_code = failure.explicit_status();
    let mut response = endpoint;

    if let Some(status) = failure.upstream_status() {
        response = EndpointStatus::new(status, &failure.to_string());
        nc_status_code = Some(normalize_upstream_status(status));
    }

    let payload = Payload::Error { error: ErrorPayload::from(failure) };

    Envelope { nc_status_code: nc_status_code.unwrap_or(500), response, payload }
}
