use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, instrument};

use super::overrides::apply_override;
use crate::{
    catalog::CatalogClient,
    error::Result,
    models::{CatalogEntity, Variant},
    request::SubscriptionList,
    transport::Transport,
};

async fn resolve_variant<T: Transport>(
    client: &CatalogClient<'_, T>,
    mut variant: Variant,
    list: &SubscriptionList,
) -> Result<Option<Variant>> {
    let Some(sku) = variant.tag_for_list(list) else {
        debug!(slug = ?variant.slug(), list_id = %list.list_id, "variant has no vendor sku for list");
        return Ok(None);
    };

    apply_override(client, &mut variant, list, &sku).await?;
    Ok(Some(variant))
}

/// Filters `variants` down to those sellable through `list`.
///
/// Each variant is tagged with the list and its vendor SKU identifier for the
/// list's supplier. A variant survives when that identifier carries a
/// non-empty SKU; survivors get their vendor-SKU override merged. Lookups run
/// concurrently, at most `fan_out_limit` at a time.
///
/// # Errors
///
/// Returns the first lookup failure; the remaining lookups are dropped.
#[instrument(skip_all, fields(list_id = %list.list_id, variants = variants.len()))]
pub async fn filter_variants<T: Transport>(
    client: &CatalogClient<'_, T>,
    variants: Vec<Variant>,
    list: &SubscriptionList,
    fan_out_limit: usize,
) -> Result<Vec<Variant>> {
    let resolved: Vec<Option<Variant>> = stream::iter(variants)
        .map(|variant| resolve_variant(client, variant, list))
        .buffered(fan_out_limit.max(1))
        .try_collect()
        .await?;

    Ok(resolved.into_iter().flatten().collect())
}
