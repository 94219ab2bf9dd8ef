//! Upstream catalog client.
//!
//! One [`CatalogClient`] is built per request. It binds the transport to the
//! tenant's company and token, derives the service base URLs, owns the
//! request's [`Pacer`], and records the last observed upstream status for the
//! response diagnostics.
//!
//! # Endpoints
//!
//! | Operation | Method | Path |
//! |-----------|--------|------|
//! | [`grouped_search`](CatalogClient::grouped_search) | GET | `/v1/Companies({id})/Catalog/GroupedSearch` |
//! | [`items_by_vendor_sku`](CatalogClient::items_by_vendor_sku) | GET | `/v1/Companies({id})/Catalog/Items/ByVendorSku` |
//! | [`bulk_catalog_item_details`](CatalogClient::bulk_catalog_item_details) | POST | `/v1/Companies({id})/Catalog/Items/ProductDetails/Bulk` |
//! | [`bulk_slug_details`](CatalogClient::bulk_slug_details) | GET | `/v1/Products/GetBulk` |

mod details;
mod search;
mod vendor_sku;

use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use serde_json::{Map, Value};
use tracing::info;

pub use search::SearchPage;

use crate::{
    error::{ConnectorError, Result},
    pacing::Pacer,
    request::ValidatedRequest,
    response::EndpointStatus,
    settings::{ConnectorSettings, Service},
    transport::{Transport, UpstreamRequest},
};

/// Last-writer-wins record of the upstream status, shared by concurrent calls.
#[derive(Debug, Default)]
pub struct Diagnostics {
    last: Mutex<EndpointStatus>,
}

impl Diagnostics {
    /// Records an observed upstream status.
    pub fn record(&self, status: u16, message: &str) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        *last = EndpointStatus::new(status, message);
    }

    /// The most recently recorded status.
    #[must_use]
    pub fn snapshot(&self) -> EndpointStatus {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Per-request upstream catalog client.
pub struct CatalogClient<'a, T> {
    transport: &'a T,
    company_id: &'a str,
    access_token: &'a str,
    catalogs_url: String,
    product_library_url: String,
    pacer: Pacer,
    diagnostics: Diagnostics,
}

impl<T> fmt::Debug for CatalogClient<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogClient")
            .field("company_id", &self.company_id)
            .field("access_token", &"[REDACTED]")
            .field("catalogs_url", &self.catalogs_url)
            .field("product_library_url", &self.product_library_url)
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}

impl<'a, T: Transport> CatalogClient<'a, T> {
    /// Creates a client for one validated request.
    #[must_use]
    pub fn new(transport: &'a T, settings: &ConnectorSettings, request: &'a ValidatedRequest) -> Self {
        let channel = &request.settings;
        Self {
            transport,
            company_id: &request.auth.company_id,
            access_token: &request.auth.access_token,
            catalogs_url: settings.service_base_url(
                &channel.protocol,
                Service::Catalogs,
                &channel.environment,
            ),
            product_library_url: settings.service_base_url(
                &channel.protocol,
                Service::ProductLibrary,
                &channel.environment,
            ),
            pacer: Pacer::new(settings.pacing),
            diagnostics: Diagnostics::default(),
        }
    }

    /// The request's pacer.
    #[must_use]
    pub const fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// The request's upstream status record.
    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    fn company_path(&self, suffix: &str) -> String {
        format!("/v1/Companies({}){suffix}", self.company_id)
    }

    /// Sends a request, records its status and parses the JSON body.
    async fn execute(&self, request: UpstreamRequest, label: &str) -> Result<Value> {
        let url = request.url()?;
        info!(protocol = self.transport.protocol_name(), "Calling: {} {url}", request.method);

        match self.transport.send(&request, self.access_token).await {
            Ok(response) => {
                self.diagnostics.record(response.status, &response.status_message);
                info!("{label} request completed in {} milliseconds.", response.elapsed.as_millis());
                response.json()
            }
            Err(error) => {
                if let ConnectorError::UpstreamStatus { status, message } = &error {
                    self.diagnostics.record(*status, message);
                }
                Err(error)
            }
        }
    }
}

/// Takes a required object-valued property out of a response body.
fn required_map(body: &mut Value, key: &str) -> Result<Map<String, Value>> {
    match body.get_mut(key).map(Value::take) {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(ConnectorError::MalformedUpstreamResponse(format!("expected {key} property."))),
    }
}

/// Takes a required array-valued property out of a response body.
fn required_array(body: &mut Value, key: &str) -> Option<Vec<Value>> {
    match body.get_mut(key).map(Value::take) {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::{
        collections::VecDeque,
        sync::Mutex,
        time::Duration,
    };

    use serde_json::{Value, json};

    use crate::{
        error::{ConnectorError, Result},
        request::{
            ChannelAuth, ChannelSettings, DateRange, QueryDoc, QueryType, SubscriptionList,
            ValidatedRequest,
        },
        transport::{Transport, UpstreamRequest, UpstreamResponse},
    };

    /// Replies with queued results in order and records every request.
    #[derive(Debug, Default)]
    pub(crate) struct QueuedTransport {
        replies: Mutex<VecDeque<Result<Value>>>,
        pub(crate) requests: Mutex<Vec<UpstreamRequest>>,
    }

    impl QueuedTransport {
        pub(crate) fn with_replies(replies: Vec<Result<Value>>) -> Self {
            Self { replies: Mutex::new(replies.into()), requests: Mutex::default() }
        }

        pub(crate) fn requests(&self) -> Vec<UpstreamRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for QueuedTransport {
        async fn send<'a>(
            &'a self,
            request: &'a UpstreamRequest,
            _access_token: &'a str,
        ) -> Result<UpstreamResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ConnectorError::TransportError("no reply queued".into())))?;
            Ok(UpstreamResponse {
                status: 200,
                status_message: "OK".to_owned(),
                body: serde_json::to_vec(&reply)?,
                elapsed: Duration::from_millis(3),
            })
        }

        fn protocol_name(&self) -> &'static str {
            "queued"
        }
    }

    pub(crate) fn request() -> ValidatedRequest {
        ValidatedRequest {
            settings: ChannelSettings {
                protocol: "https".to_owned(),
                environment: "demo".to_owned(),
                subscription_lists: vec![
                    SubscriptionList { list_id: "list-a".to_owned(), supplier_id: 11 },
                    SubscriptionList { list_id: "list-b".to_owned(), supplier_id: 22 },
                ],
                single_variant_is_simple: true,
            },
            auth: ChannelAuth {
                company_id: "14146".to_owned(),
                location_id: "1".to_owned(),
                access_token: "token".to_owned(),
            },
            business_references: vec!["CatalogItemId".to_owned()],
            query_type: QueryType::CreatedDateRange,
            query: QueryDoc {
                page: 1,
                page_size: 20,
                created_date_range: Some(DateRange {
                    start_date_gmt: "2024-01-01T00:00:00Z".to_owned(),
                    end_date_gmt: "2024-02-01T00:00:00Z".to_owned(),
                }),
                modified_date_range: None,
                remote_ids: None,
                search_fields: None,
            },
        }
    }

    pub(crate) fn empty_search() -> Value {
        json!({ "Items": [], "MetaData": { "TotalResults": 0 } })
    }
}
