use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::{
    catalog::CatalogClient,
    error::Result,
    models::{CatalogEntity, DetailKey, MatrixItem},
    settings::BatchingConfig,
    transport::Transport,
};

/// Distinct catalog item ids and slugs needing detail, in first-seen order.
///
/// Each item and each variant contributes its [`DetailKey`]; entities with
/// neither a usable id nor a slug contribute nothing.
#[must_use]
pub fn collect_detail_keys(items: &[MatrixItem]) -> (Vec<String>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut catalog_item_ids = Vec::new();
    let mut slugs = Vec::new();

    let keys = items.iter().flat_map(|item| {
        std::iter::once(item.detail_key())
            .chain(item.products.iter().map(CatalogEntity::detail_key))
    });

    for key in keys.flatten() {
        if !seen.insert(key.clone()) {
            continue;
        }
        match key {
            DetailKey::CatalogItem(id) => catalog_item_ids.push(id),
            DetailKey::Slug(slug) => slugs.push(slug),
        }
    }

    (catalog_item_ids, slugs)
}

async fn catalog_item_details<T: Transport>(
    client: &CatalogClient<'_, T>,
    catalog_item_ids: &[String],
    batch_size: usize,
) -> Result<Map<String, Value>> {
    let mut details = Map::new();
    if catalog_item_ids.is_empty() {
        info!("No products to get catalog item details for.");
        return Ok(details);
    }

    info!(
        "Getting bulk catalog item details by CatalogItemIds for {} total items.",
        catalog_item_ids.len()
    );
    for batch in catalog_item_ids.chunks(batch_size.max(1)) {
        details.extend(client.bulk_catalog_item_details(batch).await?);
    }
    Ok(details)
}

async fn slug_details<T: Transport>(
    client: &CatalogClient<'_, T>,
    slugs: &[String],
    batch_size: usize,
) -> Result<Map<String, Value>> {
    let mut details = Map::new();
    if slugs.is_empty() {
        info!("No products to get slug details for.");
        return Ok(details);
    }

    info!("Getting bulk product details by Slug for {} total items.", slugs.len());
    for batch in slugs.chunks(batch_size.max(1)) {
        details.extend(client.bulk_slug_details(batch).await?);
    }
    Ok(details)
}

fn apply_detail<E: CatalogEntity>(
    entity: &mut E,
    catalog_items: &Map<String, Value>,
    products: &Map<String, Value>,
) {
    let detail = match entity.detail_key() {
        Some(DetailKey::CatalogItem(id)) => catalog_items.get(&id),
        Some(DetailKey::Slug(slug)) => products.get(&slug),
        None => None,
    };

    if let Some(Value::Object(patch)) = detail {
        entity.overlay(patch);
    }
}

/// Merges bulk catalog item and slug detail onto every item and variant.
///
/// Batches are sent one after another, never concurrently; each waits the
/// pacing interval first. Entities without matching detail are left as-is.
///
/// # Errors
///
/// Returns the first batch failure.
#[instrument(skip_all, fields(items = items.len()))]
pub async fn enrich<T: Transport>(
    client: &CatalogClient<'_, T>,
    items: &mut [MatrixItem],
    batching: &BatchingConfig,
) -> Result<()> {
    let (catalog_item_ids, slugs) = collect_detail_keys(items);

    let catalog_items =
        catalog_item_details(client, &catalog_item_ids, batching.catalog_item_batch_size).await?;
    let products = slug_details(client, &slugs, batching.slug_batch_size).await?;

    for item in items.iter_mut() {
        apply_detail(item, &catalog_items, &products);
        for variant in &mut item.products {
            apply_detail(variant, &catalog_items, &products);
        }
    }
    Ok(())
}
