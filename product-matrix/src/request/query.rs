//! Query document and query type.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConnectorError;

/// The query selector resolved from a query document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// Lookup by upstream remote ids.
    RemoteIds,
    /// Lookup by free-text search fields.
    SearchFields,
    /// Lookup by modification date window.
    ModifiedDateRange,
    /// Lookup by creation date window.
    CreatedDateRange,
}

impl QueryType {
    /// Wire name of the selector, as it appears in the query document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RemoteIds => "remoteIDs",
            Self::SearchFields => "searchFields",
            Self::ModifiedDateRange => "modifiedDateRange",
            Self::CreatedDateRange => "createdDateRange",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remoteIDs" => Ok(Self::RemoteIds),
            "searchFields" => Ok(Self::SearchFields),
            "modifiedDateRange" => Ok(Self::ModifiedDateRange),
            "createdDateRange" => Ok(Self::CreatedDateRange),
            other => Err(ConnectorError::InvalidQueryType(other.to_owned())),
        }
    }
}

/// Inclusive GMT date window, passed to the upstream verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Window start.
    #[serde(rename = "startDateGMT")]
    pub start_date_gmt: String,
    /// Window end.
    #[serde(rename = "endDateGMT")]
    pub end_date_gmt: String,
}

/// One free-text search criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    /// Field name.
    pub search_field: String,
    /// Accepted values.
    pub search_values: Vec<Value>,
}

/// A validated query document.
///
/// Exactly one selector is populated; [`QueryType`] records which one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDoc {
    /// 1-based page number.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
    /// Creation window selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_range: Option<DateRange>,
    /// Modification window selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date_range: Option<DateRange>,
    /// Remote id selector.
    #[serde(default, rename = "remoteIDs", skip_serializing_if = "Option::is_none")]
    pub remote_ids: Option<Vec<Value>>,
    /// Search field selector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<Vec<SearchField>>,
}
