use futures::{StreamExt, TryStreamExt, stream};
use tracing::{info, instrument};

use super::{MatrixPolicy, filter::filter_variants, overrides::apply_override};
use crate::{
    catalog::CatalogClient,
    error::Result,
    models::{CatalogEntity, MatrixItem},
    request::SubscriptionList,
    transport::Transport,
};

async fn assemble_item<T: Transport>(
    client: &CatalogClient<'_, T>,
    mut item: MatrixItem,
    list: &SubscriptionList,
    policy: MatrixPolicy,
    fan_out_limit: usize,
) -> Result<Option<MatrixItem>> {
    let sku = item.tag_for_list(list);

    let variants = std::mem::take(&mut item.products);
    item.products = filter_variants(client, variants, list, fan_out_limit).await?;

    if !policy.qualifies(item.products.len()) {
        return Ok(None);
    }

    if let Some(sku) = sku {
        apply_override(client, &mut item, list, &sku).await?;
    }
    Ok(Some(item))
}

/// Assembles the matrix items that qualify for one subscription list.
///
/// Works on independent copies of `items`, so nothing done for one list is
/// visible to another. Items are processed concurrently, at most
/// `fan_out_limit` at a time; the result keeps input order.
///
/// # Errors
///
/// Returns the first lookup failure.
#[instrument(skip_all, fields(list_id = %list.list_id, supplier_id = list.supplier_id))]
pub async fn assemble_list<T: Transport>(
    client: &CatalogClient<'_, T>,
    items: &[MatrixItem],
    list: &SubscriptionList,
    policy: MatrixPolicy,
    fan_out_limit: usize,
) -> Result<Vec<MatrixItem>> {
    let assembled: Vec<Option<MatrixItem>> = stream::iter(items.iter().cloned())
        .map(|item| assemble_item(client, item, list, policy, fan_out_limit))
        .buffered(fan_out_limit.max(1))
        .try_collect()
        .await?;

    let qualifying: Vec<MatrixItem> = assembled.into_iter().flatten().collect();
    info!("{} matrix products qualify for subscription list '{}'.", qualifying.len(), list.list_id);
    Ok(qualifying)
}

/// Assembles every subscription list in order and concatenates the results.
///
/// An item qualifying for several lists appears once per list.
///
/// # Errors
///
/// Returns the first lookup failure.
#[instrument(skip_all, fields(lists = lists.len()))]
pub async fn assemble<T: Transport>(
    client: &CatalogClient<'_, T>,
    items: &[MatrixItem],
    lists: &[SubscriptionList],
    policy: MatrixPolicy,
    fan_out_limit: usize,
) -> Result<Vec<MatrixItem>> {
    stream::iter(lists)
        .then(|list| assemble_list(client, items, list, policy, fan_out_limit))
        .try_concat()
        .await
}
