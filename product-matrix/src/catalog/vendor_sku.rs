use serde_json::Value;
use tracing::{info, instrument};

use super::{CatalogClient, required_array};
use crate::{
    error::{ConnectorError, Result},
    transport::{Transport, UpstreamRequest},
};

impl<T: Transport> CatalogClient<'_, T> {
    /// Looks up catalog entries carrying `vendor_sku` for `vendor_id`.
    ///
    /// Paced. Returns the raw `Items` entries in upstream order.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MalformedUpstreamResponse`] unless the body
    /// carries an `Items` array, plus any transport error.
    #[instrument(skip(self))]
    pub async fn items_by_vendor_sku(&self, vendor_id: i64, vendor_sku: &str) -> Result<Vec<Value>> {
        info!("Getting catalog item details by vendor '{vendor_id}' and sku '{vendor_sku}'");
        self.pacer.pace().await;

        let request = UpstreamRequest::get(
            self.catalogs_url.as_str(),
            self.company_path("/Catalog/Items/ByVendorSku"),
        )
        .with_query("vendorId", vendor_id.to_string())
        .with_query("vendorSku", vendor_sku);

        let mut body = self.execute(request, "Details by VendorSku").await?;
        required_array(&mut body, "Items").ok_or_else(|| {
            ConnectorError::MalformedUpstreamResponse("expected Items[] property.".to_owned())
        })
    }
}
