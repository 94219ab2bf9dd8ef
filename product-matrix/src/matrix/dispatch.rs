use tracing::{instrument, warn};

use super::{MatrixPolicy, assemble, enrich, search_matrix_items};
use crate::{
    catalog::CatalogClient,
    error::{ConnectorError, Result},
    models::MatrixItem,
    request::{QueryType, ValidatedRequest},
    settings::BatchingConfig,
    transport::Transport,
};

/// What the pipeline produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Qualifying, enriched matrix items; one copy per qualifying list.
    pub items: Vec<MatrixItem>,
    /// Upstream total from the grouped search.
    pub total_results: f64,
}

/// Runs the search strategy selected by the request's query type.
///
/// `modifiedDateRange` is served as a `createdDateRange` search over the same
/// bounds. `remoteIDs` and `searchFields` are rejected.
///
/// # Errors
///
/// Returns [`ConnectorError::NotImplemented`] for `remoteIDs`,
/// [`ConnectorError::InvalidQueryType`] for `searchFields`, and any failure
/// of the search, assemble or enrich stages.
#[instrument(skip_all, fields(query_type = %request.query_type))]
pub async fn dispatch<T: Transport>(
    client: &CatalogClient<'_, T>,
    request: &ValidatedRequest,
    batching: &BatchingConfig,
) -> Result<PipelineOutcome> {
    let mut query = request.query.clone();

    match request.query_type {
        QueryType::RemoteIds => {
            return Err(ConnectorError::NotImplemented(
                "Searching by remote id has not been implemented.".to_owned(),
            ));
        }
        QueryType::SearchFields => {
            return Err(ConnectorError::InvalidQueryType(request.query_type.to_string()));
        }
        QueryType::ModifiedDateRange => {
            warn!(
                "Searching by modifiedDateRange is not supported, will search on createdDateRange instead."
            );
            query.created_date_range = query.modified_date_range.clone();
        }
        QueryType::CreatedDateRange => {}
    }

    let range = query.created_date_range.as_ref().ok_or_else(|| {
        ConnectorError::InvalidRequest(vec!["The createdDateRange object is missing.".to_owned()])
    })?;

    let page = search_matrix_items(client, range, &query, &request.settings).await?;

    let mut items = assemble(
        client,
        &page.items,
        &request.settings.subscription_lists,
        MatrixPolicy::from(&request.settings),
        batching.fan_out_limit,
    )
    .await?;

    enrich(client, &mut items, batching).await?;

    Ok(PipelineOutcome { items, total_results: page.total_results })
}
