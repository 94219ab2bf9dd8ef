use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use super::{CatalogClient, required_map};
use crate::{
    error::Result,
    transport::{Transport, UpstreamRequest},
};

impl<T: Transport> CatalogClient<'_, T> {
    /// Fetches detail for one batch of catalog item ids, keyed by id.
    ///
    /// Paced. Callers keep batches within the configured batch size.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConnectorError::MalformedUpstreamResponse`]
    /// unless the body carries a `CatalogItems` map, plus any transport error.
    #[instrument(skip(self, catalog_item_ids), fields(batch = catalog_item_ids.len()))]
    pub async fn bulk_catalog_item_details(
        &self,
        catalog_item_ids: &[String],
    ) -> Result<Map<String, Value>> {
        self.pacer.pace().await;
        info!("Requesting {} catalog item details.", catalog_item_ids.len());

        let request = UpstreamRequest::post(
            self.catalogs_url.as_str(),
            self.company_path("/Catalog/Items/ProductDetails/Bulk"),
            json!({ "CatalogItemIds": catalog_item_ids }),
        );

        let mut body = self.execute(request, "Bulk catalog item details").await?;
        required_map(&mut body, "CatalogItems")
    }

    /// Fetches product-library detail for one batch of slugs, keyed by slug.
    ///
    /// Paced. Callers keep batches within the configured batch size.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConnectorError::MalformedUpstreamResponse`]
    /// unless the body carries a `Products` map, plus any transport error.
    #[instrument(skip(self, slugs), fields(batch = slugs.len()))]
    pub async fn bulk_slug_details(&self, slugs: &[String]) -> Result<Map<String, Value>> {
        self.pacer.pace().await;
        info!("Requesting {} slug details.", slugs.len());

        let request = UpstreamRequest::get(self.product_library_url.as_str(), "/v1/Products/GetBulk")
            .with_query("Slugs", slugs.join(","));

        let mut body = self.execute(request, "Bulk slug details").await?;
        required_map(&mut body, "Products")
    }
}
