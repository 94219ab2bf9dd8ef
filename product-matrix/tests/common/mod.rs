//! Shared fixtures for pipeline integration tests.

#![allow(dead_code, reason = "not every test binary uses every fixture")]

use std::{sync::Mutex, time::Duration};

use product_matrix::{
    ConnectorSettings, ProductMatrixConnector,
    error::{ConnectorError, Result},
    pacing::PacingConfig,
    transport::{Method, Transport, UpstreamRequest, UpstreamResponse},
};
use serde_json::{Value, json};
use tokio::time::Instant;

pub const GROUPED_SEARCH: &str = "/Catalog/GroupedSearch";
pub const BY_VENDOR_SKU: &str = "/Catalog/Items/ByVendorSku";
pub const CATALOG_DETAILS: &str = "/Catalog/Items/ProductDetails/Bulk";
pub const SLUG_DETAILS: &str = "/v1/Products/GetBulk";

type Handler = Box<dyn Fn(&UpstreamRequest) -> Result<Value> + Send + Sync>;

/// Answers upstream calls by method and path suffix and records every call.
///
/// Unrouted calls fail with a transport error. Vendor-SKU lookups and bulk
/// detail calls default to empty answers so tests only script what they check.
pub struct ScriptedTransport {
    routes: Vec<(Method, &'static str, Handler)>,
    calls: Mutex<Vec<(Instant, UpstreamRequest)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self { routes: Vec::new(), calls: Mutex::default() }
            .route(Method::Get, BY_VENDOR_SKU, |_| Ok(json!({ "Items": [] })))
            .route(Method::Post, CATALOG_DETAILS, |_| Ok(json!({ "CatalogItems": {} })))
            .route(Method::Get, SLUG_DETAILS, |_| Ok(json!({ "Products": {} })))
    }

    /// Routes a call; later routes take precedence over earlier ones.
    pub fn route(
        mut self,
        method: Method,
        suffix: &'static str,
        handler: impl Fn(&UpstreamRequest) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.routes.insert(0, (method, suffix, Box::new(handler)));
        self
    }

    /// Answers the grouped search with a fixed page.
    pub fn search(self, items: Value, total_results: u64) -> Self {
        let body = json!({ "Items": items, "MetaData": { "TotalResults": total_results } });
        self.route(Method::Get, GROUPED_SEARCH, move |_| Ok(body.clone()))
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().unwrap().iter().map(|(_, request)| request.clone()).collect()
    }

    pub fn calls_to(&self, suffix: &str) -> Vec<UpstreamRequest> {
        self.calls().into_iter().filter(|request| request.path.ends_with(suffix)).collect()
    }

    pub fn call_times(&self, suffix: &str) -> Vec<Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, request)| request.path.ends_with(suffix))
            .map(|(at, _)| *at)
            .collect()
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ScriptedTransport {
    async fn send<'a>(
        &'a self,
        request: &'a UpstreamRequest,
        access_token: &'a str,
    ) -> Result<UpstreamResponse> {
        assert_eq!(access_token, "secret-token");
        self.calls.lock().unwrap().push((Instant::now(), request.clone()));

        let (_, _, handler) = self
            .routes
            .iter()
            .find(|(method, suffix, _)| *method == request.method && request.path.ends_with(suffix))
            .ok_or_else(|| {
                ConnectorError::TransportError(format!("no route for {} {}", request.method, request.path))
            })?;

        let body = handler(request)?;
        Ok(UpstreamResponse {
            status: 200,
            status_message: "OK".to_owned(),
            body: serde_json::to_vec(&body)?,
            elapsed: Duration::from_millis(2),
        })
    }

    fn protocol_name(&self) -> &'static str {
        "scripted"
    }
}

/// Settings with pacing disabled.
pub fn unpaced() -> ConnectorSettings {
    ConnectorSettings { pacing: PacingConfig { interval_ms: 0 }, ..Default::default() }
}

pub fn connector(transport: ScriptedTransport) -> ProductMatrixConnector<ScriptedTransport> {
    ProductMatrixConnector::new(transport, unpaced())
}

/// Channel profile subscribed to `list-a` (supplier 11) and `list-b` (supplier 22).
pub fn profile() -> Value {
    profile_with(json!([
        { "listId": "list-a", "supplierId": 11 },
        { "listId": "list-b", "supplierId": 22 }
    ]))
}

pub fn profile_with(subscription_lists: Value) -> Value {
    json!({
        "channelSettingsValues": {
            "protocol": "https",
            "environment": "demo",
            "subscriptionLists": subscription_lists
        },
        "channelAuthValues": {
            "company_id": "14146",
            "location_id": "1",
            "access_token": "secret-token"
        },
        "productBusinessReferences": ["CatalogItemId"]
    })
}

pub fn created_payload(page: u32, page_size: u32) -> Value {
    json!({
        "doc": {
            "page": page,
            "pageSize": page_size,
            "createdDateRange": {
                "startDateGMT": "2024-01-01T00:00:00Z",
                "endDateGMT": "2024-02-01T00:00:00Z"
            }
        }
    })
}

/// A variant supplied by `supplier` carrying that supplier's vendor SKU.
pub fn variant(catalog_item_id: &str, slug: &str, supplier: i64, sku: &str) -> Value {
    json!({
        "CatalogItemId": catalog_item_id,
        "Slug": slug,
        "Vendors": [{ "Id": supplier }],
        "Identifiers": [{ "SkuType": "VendorSKU", "Sku": sku, "Entity": { "Id": supplier } }]
    })
}

pub fn matrix_item(catalog_item_id: &str, slug: &str, variants: Vec<Value>) -> Value {
    json!({ "CatalogItemId": catalog_item_id, "Slug": slug, "Products": variants })
}
