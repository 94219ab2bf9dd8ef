//! Typed request configuration.
//!
//! The host hands the connector an untyped channel profile and query payload.
//! [`validate_request`] turns them into a [`ValidatedRequest`] or the full list
//! of rejection messages; the pipeline only ever sees the typed form.

mod query;
mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use query::{DateRange, QueryDoc, QueryType, SearchField};
pub use validate::{BUSINESS_REFERENCES_KEY, parse_gmt, validate_request};

/// A tenant's pairing of a list id with the supplier whose inventory it may sell.
///
/// `supplier_id` doubles as the vendor id used for upstream filtering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionList {
    /// Subscription list identifier.
    pub list_id: String,
    /// Supplier (vendor) identifier.
    pub supplier_id: i64,
}

/// Validated `channelSettingsValues`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    /// URL scheme for upstream services, e.g. `https`.
    pub protocol: String,
    /// Environment suffix appended to upstream service names; may be empty.
    pub environment: String,
    /// Ordered subscription lists; never empty.
    pub subscription_lists: Vec<SubscriptionList>,
    /// When set, an item needs more than one surviving variant to count as a matrix item.
    pub single_variant_is_simple: bool,
}

impl ChannelSettings {
    /// Vendor ids of every subscription list, in list order.
    #[must_use]
    pub fn vendor_ids(&self) -> Vec<i64> {
        self.subscription_lists.iter().map(|list| list.supplier_id).collect()
    }
}

/// Validated `channelAuthValues`.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelAuth {
    /// Upstream company id; part of every catalog path.
    pub company_id: String,
    /// Tenant location id.
    pub location_id: String,
    /// Bearer token for upstream calls.
    pub access_token: String,
}

impl fmt::Debug for ChannelAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelAuth")
            .field("company_id", &self.company_id)
            .field("location_id", &self.location_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Everything the pipeline needs for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    /// Channel settings.
    pub settings: ChannelSettings,
    /// Channel credentials.
    pub auth: ChannelAuth,
    /// Business-reference path expressions, in configured order.
    pub business_references: Vec<String>,
    /// Which selector the query document uses.
    pub query_type: QueryType,
    /// The query document.
    pub query: QueryDoc,
}
