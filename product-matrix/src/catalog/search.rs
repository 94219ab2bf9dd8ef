use serde_json::Value;
use tracing::instrument;

use super::{CatalogClient, required_array};
use crate::{
    error::{ConnectorError, Result},
    models::MatrixItem,
    request::DateRange,
    transport::{Transport, UpstreamRequest},
};

/// One page of grouped search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Matrix items in upstream order.
    pub items: Vec<MatrixItem>,
    /// Upstream total across all pages.
    pub total_results: f64,
}

fn malformed() -> ConnectorError {
    ConnectorError::MalformedUpstreamResponse(
        "expected Items[] and MetaData.TotalResults properties.".to_owned(),
    )
}

fn parse_search_page(mut body: Value) -> Result<SearchPage> {
    let total_results = body
        .pointer("/MetaData/TotalResults")
        .and_then(Value::as_f64)
        .ok_or_else(malformed)?;
    let items = required_array(&mut body, "Items").ok_or_else(malformed)?;

    let items = items.into_iter().map(MatrixItem::from).collect();

    Ok(SearchPage { items, total_results })
}

impl<T: Transport> CatalogClient<'_, T> {
    /// Runs the grouped search for items with child products created in `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::MalformedUpstreamResponse`] unless the body
    /// carries an `Items` array and a numeric `MetaData.TotalResults`, plus
    /// any transport error.
    #[instrument(skip(self, range, vendor_ids))]
    pub async fn grouped_search(
        &self,
        range: &DateRange,
        page: u32,
        page_size: u32,
        vendor_ids: &[i64],
    ) -> Result<SearchPage> {
        let vendor_ids = vendor_ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");

        let request = UpstreamRequest::get(
            self.catalogs_url.as_str(),
            self.company_path("/Catalog/GroupedSearch"),
        )
        .with_query("VendorIds", vendor_ids)
        .with_query("CreatedFromUtc", range.start_date_gmt.as_str())
        .with_query("CreatedToUtc", range.end_date_gmt.as_str())
        .with_query("HasChildProducts", "true")
        .with_query("Page", page.to_string())
        .with_query("PageSize", page_size.to_string())
        .with_query("OrderBy", "dateAdded");

        let body = self.execute(request, "GroupedSearch").await?;
        parse_search_page(body)
    }
}
