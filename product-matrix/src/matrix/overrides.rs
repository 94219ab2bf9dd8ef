use serde_json::{Map, Value};

use crate::{
    catalog::CatalogClient,
    error::Result,
    models::{CatalogEntity, usable_catalog_item_id},
    request::SubscriptionList,
    transport::Transport,
};

/// Picks the vendor-SKU override for an entity from lookup candidates.
///
/// A candidate matches when its `SourceIds` contain the list id and either its
/// `CatalogItemId` equals the entity's usable catalog item id or its `Slug`
/// equals the entity's non-empty slug. The first match in candidate order wins.
#[must_use]
pub fn select_override(
    candidates: Vec<Value>,
    list: &SubscriptionList,
    catalog_item_id: Option<&str>,
    slug: Option<&str>,
) -> Option<Map<String, Value>> {
    let catalog_item_id = usable_catalog_item_id(catalog_item_id);
    let slug = slug.filter(|slug| !slug.is_empty());

    candidates.into_iter().find_map(|candidate| {
        let Value::Object(fields) = candidate else {
            return None;
        };

        let in_list = fields
            .get("SourceIds")
            .and_then(Value::as_array)
            .is_some_and(|ids| ids.iter().any(|id| id.as_str() == Some(list.list_id.as_str())));
        if !in_list {
            return None;
        }

        let field = |key: &str| fields.get(key).and_then(Value::as_str);
        let id_matches = catalog_item_id.is_some_and(|id| field("CatalogItemId") == Some(id));
        let slug_matches = slug.is_some_and(|slug| field("Slug") == Some(slug));

        (id_matches || slug_matches).then_some(fields)
    })
}

/// Looks up `sku` for the list's supplier and merges the matching override into `entity`.
pub(super) async fn apply_override<T: Transport, E: CatalogEntity>(
    client: &CatalogClient<'_, T>,
    entity: &mut E,
    list: &SubscriptionList,
    sku: &str,
) -> Result<()> {
    let candidates = client.items_by_vendor_sku(list.supplier_id, sku).await?;
    if let Some(patch) = select_override(candidates, list, entity.catalog_item_id(), entity.slug()) {
        entity.overlay(&patch);
    }
    Ok(())
}
