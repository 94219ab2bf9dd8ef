//! Catalog data models.
//!
//! Matrix items and their variants are owned by the pipeline for the length of
//! one request and mutated in place: tagged with a subscription list, filtered,
//! then overlaid with vendor-SKU and bulk detail. Each model holds the upstream
//! JSON object as received and reads the handful of fields the pipeline
//! interprets through accessors, so an unexpected shape in any field never
//! fails a request and the emitted document keeps the full upstream shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::request::SubscriptionList;

/// Identifier type marking a supplier-scoped SKU.
pub const VENDOR_SKU_TYPE: &str = "VendorSKU";

/// The all-zero catalog item id the upstream uses for "no catalog item".
pub const SENTINEL_CATALOG_ITEM_ID: &str = "00000000-0000-0000-0000-000000000000";

const PRODUCTS: &str = "Products";
const SUBSCRIPTION_LIST: &str = "ncSubscriptionList";
const VENDOR_SKU: &str = "ncVendorSku";

/// Returns true for the all-zero UUID in any textual form the upstream emits.
#[must_use]
pub fn is_sentinel(catalog_item_id: &str) -> bool {
    Uuid::parse_str(catalog_item_id.trim()).is_ok_and(|id| id.is_nil())
}

/// Returns the catalog item id when it is non-empty and not the sentinel.
#[must_use]
pub fn usable_catalog_item_id(catalog_item_id: Option<&str>) -> Option<&str> {
    catalog_item_id.filter(|id| !id.trim().is_empty() && !is_sentinel(id))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Loose id comparison: `14` and `"14"` both refer to supplier 14.
fn refers_to(id: Option<&Value>, supplier_id: i64) -> bool {
    match id {
        Some(Value::Number(n)) => n.as_i64() == Some(supplier_id),
        Some(Value::String(s)) => s.trim().parse::<i64>() == Ok(supplier_id),
        _ => false,
    }
}

/// Turns any value into an object, discarding a non-object.
fn object_mut(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(fields) => fields,
        _ => unreachable!("value was just replaced with an object"),
    }
}

/// Key under which bulk detail is fetched and merged for an item or variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DetailKey {
    /// Keyed by a usable catalog item id.
    CatalogItem(String),
    /// Keyed by slug, for entities without a usable catalog item id.
    Slug(String),
}

impl DetailKey {
    /// Picks the catalog item id when usable, else the slug, else nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_matrix::models::{DetailKey, SENTINEL_CATALOG_ITEM_ID};
    ///
    /// let key = DetailKey::resolve(Some(SENTINEL_CATALOG_ITEM_ID), Some("red-shirt"));
    /// assert_eq!(key, Some(DetailKey::Slug("red-shirt".to_owned())));
    /// ```
    #[must_use]
    pub fn resolve(catalog_item_id: Option<&str>, slug: Option<&str>) -> Option<Self> {
        if let Some(id) = usable_catalog_item_id(catalog_item_id) {
            return Some(Self::CatalogItem(id.to_owned()));
        }
        non_empty(slug).map(|slug| Self::Slug(slug.to_owned()))
    }
}

/// Read-only view of one entry of an `Identifiers` array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Identifier<'a>(&'a Value);

impl<'a> Identifier<'a> {
    /// Wraps an identifier entry.
    #[must_use]
    pub const fn new(value: &'a Value) -> Self {
        Self(value)
    }

    /// The entry as received.
    #[must_use]
    pub const fn as_value(self) -> &'a Value {
        self.0
    }

    /// SKU type, e.g. `VendorSKU`.
    #[must_use]
    pub fn sku_type(self) -> Option<&'a str> {
        self.0.get("SkuType").and_then(Value::as_str)
    }

    /// True when this is the vendor SKU of the given supplier.
    #[must_use]
    pub fn is_vendor_sku_for(self, supplier_id: i64) -> bool {
        self.sku_type() == Some(VENDOR_SKU_TYPE) && refers_to(self.0.pointer("/Entity/Id"), supplier_id)
    }

    /// The SKU as text, when it is a non-empty string or a number.
    #[must_use]
    pub fn usable_sku(self) -> Option<String> {
        match self.0.get("Sku") {
            Some(Value::String(sku)) if !sku.is_empty() => Some(sku.clone()),
            Some(Value::Number(sku)) => Some(sku.to_string()),
            _ => None,
        }
    }
}

/// Behavior shared by matrix items and variants.
///
/// Everything is read from and written to the entity's upstream object.
pub trait CatalogEntity {
    /// The upstream object as received and patched so far.
    fn fields(&self) -> &Value;

    /// Mutable access to the upstream object.
    fn fields_mut(&mut self) -> &mut Map<String, Value>;

    /// Shallow overlay: every top-level field of `patch` replaces the same field here.
    fn overlay(&mut self, patch: &Map<String, Value>) {
        self.fields_mut().extend(patch.iter().map(|(key, value)| (key.clone(), value.clone())));
    }

    /// A top-level field.
    fn field(&self, key: &str) -> Option<&Value> {
        self.fields().get(key)
    }

    /// Catalog item id, when it is a string.
    fn catalog_item_id(&self) -> Option<&str> {
        self.field("CatalogItemId").and_then(Value::as_str)
    }

    /// Slug, when it is a string.
    fn slug(&self) -> Option<&str> {
        self.field("Slug").and_then(Value::as_str)
    }

    /// Entries of the `Identifiers` array; empty when it is not an array.
    fn identifiers(&self) -> &[Value] {
        self.field("Identifiers").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
    }

    /// Key for bulk detail lookup.
    fn detail_key(&self) -> Option<DetailKey> {
        DetailKey::resolve(self.catalog_item_id(), self.slug())
    }

    /// First vendor SKU identifier belonging to `supplier_id`.
    fn vendor_sku_for(&self, supplier_id: i64) -> Option<Identifier<'_>> {
        self.identifiers()
            .iter()
            .map(Identifier::new)
            .find(|identifier| identifier.is_vendor_sku_for(supplier_id))
    }

    /// Vendor SKU identifier tagged for the active subscription list.
    fn vendor_sku(&self) -> Option<Identifier<'_>> {
        self.field(VENDOR_SKU).map(Identifier::new)
    }

    /// Id of the subscription list this copy was processed for.
    fn subscription_list_id(&self) -> Option<&str> {
        self.field(SUBSCRIPTION_LIST).and_then(|list| list.get("listId")).and_then(Value::as_str)
    }

    /// Tags the entity with `list` and the vendor SKU identifier of its supplier.
    ///
    /// Returns the SKU when the tagged identifier carries a usable one.
    fn tag_for_list(&mut self, list: &SubscriptionList) -> Option<String> {
        let identifier = self.vendor_sku_for(list.supplier_id).map(|id| id.as_value().clone());
        let sku = identifier.as_ref().and_then(|id| Identifier::new(id).usable_sku());

        let fields = self.fields_mut();
        fields.insert(
            SUBSCRIPTION_LIST.to_owned(),
            json!({ "listId": list.list_id, "supplierId": list.supplier_id }),
        );
        match identifier {
            Some(identifier) => fields.insert(VENDOR_SKU.to_owned(), identifier),
            None => fields.remove(VENDOR_SKU),
        };
        sku
    }
}

/// One sellable child SKU of a matrix item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variant {
    fields: Value,
}

impl Variant {
    /// Whether the variant is sourced from a subscription list; only an
    /// explicit `false` says no.
    #[must_use]
    pub fn is_list_sourced(&self) -> bool {
        self.field("IsListSourced") != Some(&Value::Bool(false))
    }

    /// Integer ids of the variant's `Vendors`.
    pub fn vendor_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.field("Vendors")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|vendor| vendor.get("Id").and_then(Value::as_i64))
    }

    /// True when any vendor of this variant is in `vendor_ids`.
    #[must_use]
    pub fn is_supplied_by_any(&self, vendor_ids: &[i64]) -> bool {
        self.vendor_ids().any(|id| vendor_ids.contains(&id))
    }
}

impl From<Value> for Variant {
    fn from(fields: Value) -> Self {
        Self { fields }
    }
}

impl From<Variant> for Value {
    fn from(variant: Variant) -> Self {
        variant.fields
    }
}

impl CatalogEntity for Variant {
    fn fields(&self) -> &Value {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Map<String, Value> {
        object_mut(&mut self.fields)
    }
}

/// A parent catalog entity with sellable variants.
///
/// A `Products` array is lifted into [`products`](Self::products) and written
/// back on serialization; any other `Products` value stays in the object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct MatrixItem {
    fields: Value,
    /// Variants.
    pub products: Vec<Variant>,
    products_listed: bool,
}

impl MatrixItem {
    fn lift_products(&mut self) {
        self.products.clear();
        self.products_listed = false;

        if let Value::Object(fields) = &mut self.fields
            && matches!(fields.get(PRODUCTS), Some(Value::Array(_)))
            && let Some(Value::Array(products)) = fields.remove(PRODUCTS)
        {
            self.products = products.into_iter().map(Variant::from).collect();
            self.products_listed = true;
        }
    }
}

impl From<Value> for MatrixItem {
    fn from(fields: Value) -> Self {
        let mut item = Self { fields, products: Vec::new(), products_listed: false };
        item.lift_products();
        item
    }
}

impl From<MatrixItem> for Value {
    fn from(item: MatrixItem) -> Self {
        if !item.products_listed && item.products.is_empty() {
            return item.fields;
        }

        let mut fields = item.fields;
        object_mut(&mut fields).insert(
            PRODUCTS.to_owned(),
            Self::Array(item.products.into_iter().map(Self::from).collect()),
        );
        fields
    }
}

impl CatalogEntity for MatrixItem {
    fn fields(&self) -> &Value {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Map<String, Value> {
        object_mut(&mut self.fields)
    }

    fn overlay(&mut self, patch: &Map<String, Value>) {
        self.fields_mut().extend(patch.iter().map(|(key, value)| (key.clone(), value.clone())));
        if patch.contains_key(PRODUCTS) {
            self.lift_products();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_json() -> Value {
        json!({
            "CatalogItemId": "2bd4c1e6-0a3c-4a4b-9b8e-1f0c1c1d2e3f",
            "Slug": "phone-case",
            "Name": "Phone Case",
            "Identifiers": [
                { "SkuType": "VendorSKU", "Sku": "VC-1", "Entity": { "Id": 14, "Name": "Acme" } },
                { "SkuType": "ManufacturerSKU", "Sku": "M-1" }
            ],
            "Products": [
                {
                    "CatalogItemId": "00000000-0000-0000-0000-000000000000",
                    "Slug": "phone-case-red",
                    "Vendors": [{ "Id": 14 }],
                    "Color": "Red"
                }
            ]
        })
    }

    fn item() -> MatrixItem {
        serde_json::from_value(item_json()).unwrap()
    }

    #[test]
    fn test_matrix_item_round_trips_unchanged() {
        let item = item();

        assert_eq!(item.field("Name"), Some(&json!("Phone Case")));
        assert_eq!(item.products.len(), 1);
        assert_eq!(item.products[0].field("Color"), Some(&json!("Red")));
        assert_eq!(serde_json::to_value(&item).unwrap(), item_json());
    }

    #[test]
    fn test_round_trip_keeps_empty_and_null_fields() {
        let upstream = json!({
            "CatalogItemId": null,
            "Slug": "",
            "Identifiers": [],
            "Products": [{ "Identifiers": [], "Vendors": null, "IsListSourced": null }]
        });
        let item: MatrixItem = serde_json::from_value(upstream.clone()).unwrap();
        assert_eq!(serde_json::to_value(&item).unwrap(), upstream);

        let upstream = json!({ "Slug": "no-variants", "Products": null });
        let item: MatrixItem = serde_json::from_value(upstream.clone()).unwrap();
        assert!(item.products.is_empty());
        assert_eq!(serde_json::to_value(&item).unwrap(), upstream);

        let upstream = json!({ "Slug": "no-products-key" });
        let item: MatrixItem = serde_json::from_value(upstream.clone()).unwrap();
        assert_eq!(serde_json::to_value(&item).unwrap(), upstream);
    }

    #[test]
    fn test_odd_shapes_are_read_leniently() {
        let item: MatrixItem = serde_json::from_value(json!({
            "CatalogItemId": 42,
            "Slug": ["x"],
            "Identifiers": "none",
            "Products": [
                "not an object",
                { "Vendors": [{ "Id": "14" }, 7, { "Id": 14 }], "IsListSourced": "yes" }
            ]
        }))
        .unwrap();

        assert_eq!(item.catalog_item_id(), None);
        assert_eq!(item.slug(), None);
        assert!(item.identifiers().is_empty());
        assert_eq!(item.detail_key(), None);
        assert_eq!(item.products[0].vendor_ids().count(), 0);
        assert_eq!(item.products[1].vendor_ids().collect::<Vec<_>>(), vec![14]);
        assert!(item.products[1].is_list_sourced());

        let non_object: MatrixItem = serde_json::from_value(json!("odd")).unwrap();
        assert!(non_object.products.is_empty());
        assert_eq!(serde_json::to_value(&non_object).unwrap(), json!("odd"));
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(is_sentinel(SENTINEL_CATALOG_ITEM_ID));
        assert!(is_sentinel("{00000000-0000-0000-0000-000000000000}"));
        assert!(!is_sentinel("2bd4c1e6-0a3c-4a4b-9b8e-1f0c1c1d2e3f"));
        assert!(!is_sentinel("not-a-uuid"));
    }

    #[test]
    fn test_detail_key_prefers_catalog_item_id() {
        let item = item();
        assert_eq!(
            item.detail_key(),
            Some(DetailKey::CatalogItem("2bd4c1e6-0a3c-4a4b-9b8e-1f0c1c1d2e3f".to_owned()))
        );
        assert_eq!(item.products[0].detail_key(), Some(DetailKey::Slug("phone-case-red".to_owned())));
    }

    #[test]
    fn test_detail_key_absent_without_id_or_slug() {
        assert_eq!(DetailKey::resolve(Some(SENTINEL_CATALOG_ITEM_ID), Some("  ")), None);
        assert_eq!(DetailKey::resolve(None, None), None);
    }

    #[test]
    fn test_vendor_sku_lookup() {
        let item = item();
        assert_eq!(item.vendor_sku_for(14).and_then(Identifier::usable_sku).as_deref(), Some("VC-1"));
        assert!(item.vendor_sku_for(15).is_none());
    }

    #[test]
    fn test_identifier_sku_forms() {
        let numeric = json!({ "SkuType": "VendorSKU", "Sku": 12345, "Entity": { "Id": "14" } });
        assert!(Identifier::new(&numeric).is_vendor_sku_for(14));
        assert!(!Identifier::new(&numeric).is_vendor_sku_for(41));
        assert_eq!(Identifier::new(&numeric).usable_sku().as_deref(), Some("12345"));

        let empty = json!({ "SkuType": "VendorSKU", "Sku": "" });
        assert_eq!(Identifier::new(&empty).usable_sku(), None);
        assert!(!Identifier::new(&empty).is_vendor_sku_for(14));
        assert_eq!(Identifier::new(&json!("UPC")).sku_type(), None);
    }

    #[test]
    fn test_tag_for_list() {
        let mut item = item();
        let list = SubscriptionList { list_id: "list-a".to_owned(), supplier_id: 14 };

        assert_eq!(item.tag_for_list(&list).as_deref(), Some("VC-1"));
        assert_eq!(item.subscription_list_id(), Some("list-a"));

        let serialized = serde_json::to_value(&item).unwrap();
        assert_eq!(serialized["ncSubscriptionList"], json!({ "listId": "list-a", "supplierId": 14 }));
        assert_eq!(serialized["ncVendorSku"]["Sku"], "VC-1");

        let other = SubscriptionList { list_id: "list-b".to_owned(), supplier_id: 99 };
        assert_eq!(item.tag_for_list(&other), None);
        assert!(item.vendor_sku().is_none());
        assert_eq!(item.subscription_list_id(), Some("list-b"));
    }

    #[test]
    fn test_tag_for_list_ignores_empty_sku() {
        let mut variant = Variant::from(json!({
            "Identifiers": [{ "SkuType": "VendorSKU", "Sku": "", "Entity": { "Id": 14 } }]
        }));
        let list = SubscriptionList { list_id: "list-a".to_owned(), supplier_id: 14 };

        assert_eq!(variant.tag_for_list(&list), None);
        assert!(variant.vendor_sku().is_some());
    }

    #[test]
    fn test_variant_list_sourced_defaults_true() {
        let variant = Variant::from(json!({ "Vendors": [{ "Id": 3 }] }));
        assert!(variant.is_list_sourced());
        assert!(variant.is_supplied_by_any(&[1, 3]));
        assert!(!variant.is_supplied_by_any(&[1, 2]));

        let variant = Variant::from(json!({ "IsListSourced": false }));
        assert!(!variant.is_list_sourced());
    }

    #[test]
    fn test_overlay_replaces_and_adds_fields() {
        let mut item = item();
        let patch = json!({ "Name": "Rugged Phone Case", "Slug": "rugged-case", "Price": 19.99 });

        item.overlay(patch.as_object().unwrap());

        assert_eq!(item.slug(), Some("rugged-case"));
        assert_eq!(item.field("Name"), Some(&json!("Rugged Phone Case")));
        assert_eq!(item.field("Price"), Some(&json!(19.99)));
        assert_eq!(item.products.len(), 1);
    }

    #[test]
    fn test_overlay_accepts_any_shape() {
        let mut variant = Variant::default();
        let patch = json!({
            "Vendors": "not-a-list",
            "Identifiers": [{ "Sku": 12345, "SkuType": "UPC" }]
        });

        variant.overlay(patch.as_object().unwrap());

        assert_eq!(variant.vendor_ids().count(), 0);
        assert_eq!(serde_json::to_value(&variant).unwrap(), patch);
    }

    #[test]
    fn test_overlay_replacing_products() {
        let mut item = item();

        item.overlay(json!({ "Products": [{ "Slug": "a" }, { "Slug": "b" }] }).as_object().unwrap());
        assert_eq!(item.products.len(), 2);
        assert_eq!(item.products[1].slug(), Some("b"));

        item.overlay(json!({ "Products": null }).as_object().unwrap());
        assert!(item.products.is_empty());
        assert_eq!(serde_json::to_value(&item).unwrap()["Products"], Value::Null);
    }
}
