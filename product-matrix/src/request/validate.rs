//! Request validation.
//!
//! Validation never stops at the first problem: every rule runs and every
//! rejection message is collected, so a host sees the whole picture at once.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use super::{ChannelAuth, ChannelSettings, QueryDoc, QueryType, SubscriptionList, ValidatedRequest};
use crate::reference::PathExpression;

/// Channel profile key holding the business-reference expressions.
pub const BUSINESS_REFERENCES_KEY: &str = "productBusinessReferences";

const SELECTORS: [QueryType; 4] = [
    QueryType::RemoteIds,
    QueryType::SearchFields,
    QueryType::ModifiedDateRange,
    QueryType::CreatedDateRange,
];

/// Validates a channel profile and query payload.
///
/// # Errors
///
/// Returns every rejection message when any rule fails. The list is never empty.
///
/// # Examples
///
/// ```
/// use product_matrix::request::{QueryType, validate_request};
/// use serde_json::json;
///
/// let profile = json!({
///     "channelSettingsValues": {
///         "protocol": "https",
///         "environment": "demo",
///         "subscriptionLists": [{ "listId": "list-1", "supplierId": 14 }]
///     },
///     "channelAuthValues": {
///         "company_id": "14146",
///         "location_id": "1",
///         "access_token": "token"
///     },
///     "productBusinessReferences": ["CatalogItemId"]
/// });
/// let payload = json!({
///     "doc": {
///         "page": 1,
///         "pageSize": 25,
///         "createdDateRange": {
///             "startDateGMT": "2024-01-01T00:00:00Z",
///             "endDateGMT": "2024-01-31T00:00:00Z"
///         }
///     }
/// });
///
/// let request = validate_request(&profile, &payload).unwrap();
/// assert_eq!(request.query_type, QueryType::CreatedDateRange);
/// assert!(request.settings.single_variant_is_simple);
/// ```
pub fn validate_request(profile: &Value, payload: &Value) -> Result<ValidatedRequest, Vec<String>> {
    let mut messages = Vec::new();

    debug!("validating channel profile");
    let channel = validate_profile(profile, &mut messages);

    debug!("validating payload");
    let query = validate_payload(payload, &mut messages);

    match (channel, query) {
        (Some((settings, auth, business_references)), Some((query_type, query)))
            if messages.is_empty() =>
        {
            Ok(ValidatedRequest { settings, auth, business_references, query_type, query })
        }
        _ => Err(messages),
    }
}

/// Parses a GMT date in the formats hosts send.
///
/// Accepts RFC 3339 timestamps, offset-less ISO 8601 timestamps (read as UTC)
/// and plain `YYYY-MM-DD` dates.
#[must_use]
pub fn parse_gmt(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn state(value: Option<&Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "missing",
        Some(_) => "invalid",
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn non_empty_array(value: Option<&Value>) -> Option<&Vec<Value>> {
    value.and_then(Value::as_array).filter(|a| !a.is_empty())
}

#[allow(clippy::cast_possible_truncation, reason = "guarded by the fract and range checks")]
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() <= 9_007_199_254_740_991.0)
            .map(|f| f as i64)
    })
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn validate_profile(
    profile: &Value,
    messages: &mut Vec<String>,
) -> Option<(ChannelSettings, ChannelAuth, Vec<String>)> {
    let Some(profile) = profile.as_object() else {
        messages.push(format!("The channelProfile object is {}.", state(Some(profile))));
        return None;
    };

    let settings = validate_channel_settings(profile.get("channelSettingsValues"), messages);
    let auth = validate_channel_auth(profile.get("channelAuthValues"), messages);
    let references = validate_business_references(profile.get(BUSINESS_REFERENCES_KEY), messages);

    Some((settings?, auth?, references?))
}

fn validate_channel_settings(
    value: Option<&Value>,
    messages: &mut Vec<String>,
) -> Option<ChannelSettings> {
    let Some(values) = value.and_then(Value::as_object) else {
        messages.push(format!(
            "The channelProfile.channelSettingsValues object is {}.",
            state(value)
        ));
        return None;
    };

    let protocol = non_empty_str(values.get("protocol"));
    if protocol.is_none() {
        messages.push(format!(
            "The channelProfile.channelSettingsValues.protocol string is {}.",
            state(values.get("protocol"))
        ));
    }

    let environment = values.get("environment").and_then(Value::as_str);
    if environment.is_none() {
        messages.push(format!(
            "The channelProfile.channelSettingsValues.environment string is {}.",
            state(values.get("environment"))
        ));
    }

    let subscription_lists = validate_subscription_lists(values.get("subscriptionLists"), messages);

    // Non-boolean values are ignored rather than rejected.
    let single_variant_is_simple =
        values.get("singleVariantIsSimple").and_then(Value::as_bool).unwrap_or(true);

    Some(ChannelSettings {
        protocol: protocol?.to_owned(),
        environment: environment?.to_owned(),
        subscription_lists: subscription_lists?,
        single_variant_is_simple,
    })
}

fn validate_subscription_lists(
    value: Option<&Value>,
    messages: &mut Vec<String>,
) -> Option<Vec<SubscriptionList>> {
    let Some(entries) = non_empty_array(value) else {
        messages.push(format!(
            "The channelProfile.channelSettingsValues.subscriptionLists array is {}.",
            state(value)
        ));
        return None;
    };

    let lists: Option<Vec<SubscriptionList>> = entries
        .iter()
        .map(|entry| {
            let list_id = non_empty_str(entry.get("listId"))?;
            let supplier_id = entry.get("supplierId").and_then(as_integer)?;
            Some(SubscriptionList { list_id: list_id.to_owned(), supplier_id })
        })
        .collect();

    if lists.is_none() {
        messages.push(
            "Every object in the subscriptionLists array must have both a listId and a supplierId."
                .to_owned(),
        );
    }
    lists
}

fn validate_channel_auth(value: Option<&Value>, messages: &mut Vec<String>) -> Option<ChannelAuth> {
    let Some(values) = value.and_then(Value::as_object) else {
        messages.push(format!("The channelProfile.channelAuthValues object is {}.", state(value)));
        return None;
    };

    let mut field = |name: &str| {
        let found = non_empty_str(values.get(name));
        if found.is_none() {
            messages.push(format!(
                "The channelProfile.channelAuthValues.{name} string is {}.",
                state(values.get(name))
            ));
        }
        found.map(str::to_owned)
    };

    let company_id = field("company_id");
    let location_id = field("location_id");
    let access_token = field("access_token");

    Some(ChannelAuth { company_id: company_id?, location_id: location_id?, access_token: access_token? })
}

fn validate_business_references(
    value: Option<&Value>,
    messages: &mut Vec<String>,
) -> Option<Vec<String>> {
    let Some(entries) = non_empty_array(value) else {
        messages.push(format!(
            "The channelProfile.{BUSINESS_REFERENCES_KEY} array is {}.",
            state(value)
        ));
        return None;
    };

    let mut references = Vec::with_capacity(entries.len());
    let mut valid = true;
    for entry in entries {
        match entry.as_str() {
            Some(expression) => match PathExpression::parse(expression) {
                Ok(_) => references.push(expression.to_owned()),
                Err(e) => {
                    messages.push(format!("Invalid business reference '{expression}': {e}"));
                    valid = false;
                }
            },
            None => {
                messages.push(format!(
                    "Every value in the channelProfile.{BUSINESS_REFERENCES_KEY} array must be a string."
                ));
                valid = false;
            }
        }
    }

    valid.then_some(references)
}

fn validate_payload(payload: &Value, messages: &mut Vec<String>) -> Option<(QueryType, QueryDoc)> {
    let Some(payload) = payload.as_object() else {
        messages.push(format!("The payload object is {}.", state(Some(payload))));
        return None;
    };

    let doc = payload.get("doc");
    let Some(doc) = doc.and_then(Value::as_object) else {
        messages.push(format!("The payload.doc object is {}.", state(doc)));
        return None;
    };

    let before = messages.len();
    let query_type = validate_query_doc(doc, messages);
    validate_paging(doc, messages);

    let query_type = query_type.filter(|_| messages.len() == before)?;

    // Unselected selectors are falsy but may carry any type.
    let mut selected = doc.clone();
    selected.retain(|key, _| {
        key == query_type.as_str() || !SELECTORS.iter().any(|selector| selector.as_str() == key)
    });

    match serde_json::from_value::<QueryDoc>(Value::Object(selected)) {
        Ok(query) => Some((query_type, query)),
        Err(e) => {
            messages.push(format!("The payload.doc object could not be read: {e}."));
            None
        }
    }
}

fn validate_query_doc(doc: &Map<String, Value>, messages: &mut Vec<String>) -> Option<QueryType> {
    let present: Vec<QueryType> =
        SELECTORS.into_iter().filter(|selector| is_truthy(doc.get(selector.as_str()))).collect();

    let [query_type] = present.as_slice() else {
        messages.push(
            "Query doc must contain one (and only one) of remoteIDs, searchFields, modifiedDateRange, or createdDateRange."
                .to_owned(),
        );
        return None;
    };

    let selector = doc.get(query_type.as_str());
    match query_type {
        QueryType::RemoteIds => {
            if non_empty_array(selector).is_none() {
                messages.push("The remoteIDs property must be an array with at least 1 value.".to_owned());
            }
        }
        QueryType::SearchFields => match non_empty_array(selector) {
            None => messages.push(
                "The searchFields property must be an array with at least 1 key value pair object."
                    .to_owned(),
            ),
            Some(fields) => {
                let well_formed = fields.iter().all(|field| {
                    non_empty_str(field.get("searchField")).is_some()
                        && non_empty_array(field.get("searchValues")).is_some()
                });
                if !well_formed {
                    messages.push(
                        "searchFields array elements must be in the form: { searchField: 'key', searchValues: ['value_1'] }."
                            .to_owned(),
                    );
                }
            }
        },
        QueryType::ModifiedDateRange | QueryType::CreatedDateRange => {
            validate_date_range(*query_type, selector, messages);
        }
    }

    Some(*query_type)
}

fn validate_date_range(query_type: QueryType, range: Option<&Value>, messages: &mut Vec<String>) {
    let bound = |name: &str| {
        range
            .and_then(|r| r.get(name))
            .and_then(Value::as_str)
            .and_then(parse_gmt)
    };

    match (bound("startDateGMT"), bound("endDateGMT")) {
        (Some(start), Some(end)) => {
            if start >= end {
                messages.push("startDateGMT must come before endDateGMT.".to_owned());
            }
        }
        _ => messages.push(format!(
            "{query_type} query requires valid startDateGMT and endDateGMT properties."
        )),
    }
}

fn validate_paging(doc: &Map<String, Value>, messages: &mut Vec<String>) {
    for name in ["page", "pageSize"] {
        let valid = doc
            .get(name)
            .and_then(as_integer)
            .is_some_and(|n| n >= 1 && n <= i64::from(u32::MAX));
        if !valid {
            messages.push(format!("The {name} property must be a positive integer."));
        }
    }
}
