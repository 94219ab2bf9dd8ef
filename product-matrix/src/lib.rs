//! Product Matrix: matrix product queries over an upstream retail catalog
//!
//! A connector function that, given a tenant's catalog-search criteria,
//! retrieves matrix products (parent items with several sellable variants)
//! from the upstream catalog service, keeps only the variants the tenant may
//! sell through its subscription lists, enriches the survivors with canonical
//! catalog or product-library detail, and emits a normalized result envelope.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   Host (channel)     │  channel profile + query payload
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼─────────────────────────────────────────────┐
//! │        ProductMatrixConnector (this crate)             │
//! │  validate ─► dispatch ─► search ─► assemble ─► enrich  │
//! │                                        │               │
//! │                          paginate / classify errors    │
//! └──────────┬─────────────────────────────────────────────┘
//!            │ HTTPS + bearer token, paced
//! ┌──────────▼───────────┐
//! │  Catalogs / Product  │  GroupedSearch, ByVendorSku,
//! │  Library services    │  ProductDetails/Bulk, GetBulk
//! └──────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use product_matrix::{ConnectorSettings, HttpTransport, ProductMatrixConnector};
//! use serde_json::json;
//!
//! # async fn example() -> product_matrix::error::Result<()> {
//! let settings = ConnectorSettings::default();
//! let connector = ProductMatrixConnector::new(HttpTransport::with_config(&settings.http)?, settings);
//!
//! let profile = json!({
//!     "channelSettingsValues": {
//!         "protocol": "https",
//!         "environment": "demo",
//!         "subscriptionLists": [{ "listId": "6a3d5b8e", "supplierId": 14 }]
//!     },
//!     "channelAuthValues": { "company_id": "14146", "location_id": "1", "access_token": "..." },
//!     "productBusinessReferences": ["CatalogItemId"]
//! });
//! let payload = json!({
//!     "doc": {
//!         "page": 1,
//!         "pageSize": 25,
//!         "createdDateRange": {
//!             "startDateGMT": "2024-01-01T00:00:00Z",
//!             "endDateGMT": "2024-02-01T00:00:00Z"
//!         }
//!     }
//! });
//!
//! connector
//!     .invoke(&profile, &json!({}), &payload, |envelope| {
//!         println!("{}", serde_json::to_string(&envelope)?);
//!         Ok::<_, serde_json::Error>(())
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Status codes
//!
//! | `ncStatusCode` | Meaning |
//! |----------------|---------|
//! | 200 | Last page delivered |
//! | 204 | No matrix products found |
//! | 206 | More pages remain |
//! | 400 | Invalid request, unsupported query type, or upstream 4xx |
//! | 401 / 429 | Upstream status passed through |
//! | 500 | Upstream 5xx or any unclassified failure |

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and proptest"
)]

pub mod catalog;
pub mod connector;
pub mod error;
pub mod matrix;
pub mod models;
pub mod pacing;
pub mod reference;
pub mod request;
pub mod response;
pub mod settings;
pub mod transport;

pub use connector::ProductMatrixConnector;
pub use error::{ConnectorError, Result};
pub use response::Envelope;
pub use settings::ConnectorSettings;
pub use transport::{HttpTransport, Transport};
