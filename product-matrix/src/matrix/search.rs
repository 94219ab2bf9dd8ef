use tracing::{info, instrument};

use super::MatrixPolicy;
use crate::{
    catalog::{CatalogClient, SearchPage},
    error::Result,
    models::MatrixItem,
    request::{ChannelSettings, DateRange, QueryDoc},
    transport::Transport,
};

/// Drops variants no subscribed vendor supplies, then items that no longer qualify.
///
/// A variant survives when it is list sourced and at least one of its vendors
/// is in `vendor_ids`.
#[must_use]
pub fn coarse_filter(items: Vec<MatrixItem>, vendor_ids: &[i64], policy: MatrixPolicy) -> Vec<MatrixItem> {
    items
        .into_iter()
        .filter_map(|mut item| {
            item.products
                .retain(|variant| variant.is_list_sourced() && variant.is_supplied_by_any(vendor_ids));
            policy.qualifies(item.products.len()).then_some(item)
        })
        .collect()
}

/// Searches for matrix items created in `range` across every subscribed vendor.
///
/// # Errors
///
/// Propagates search failures.
#[instrument(skip_all, fields(page = query.page, page_size = query.page_size))]
pub async fn search_matrix_items<T: Transport>(
    client: &CatalogClient<'_, T>,
    range: &DateRange,
    query: &QueryDoc,
    settings: &ChannelSettings,
) -> Result<SearchPage> {
    info!(
        "Searching for matrix products created between {} and {}",
        range.start_date_gmt, range.end_date_gmt
    );

    let vendor_ids = settings.vendor_ids();
    let mut page = client.grouped_search(range, query.page, query.page_size, &vendor_ids).await?;

    let found = page.items.len();
    page.items = coarse_filter(page.items, &vendor_ids, MatrixPolicy::from(settings));
    info!(found, kept = page.items.len(), total_results = page.total_results, "grouped search filtered");

    Ok(page)
}
