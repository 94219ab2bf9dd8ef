//! Host boundary adapter.
//!
//! [`ProductMatrixConnector`] is the only entry point a host needs: it accepts
//! the untyped channel profile, flow context and query payload, and always
//! produces an [`Envelope`]. Failures never escape as errors; they are
//! classified into the envelope. The one exception is [`invoke`], whose
//! host callback may itself fail.
//!
//! [`invoke`]: ProductMatrixConnector::invoke
//!
//! # Examples
//!
//! ```rust,no_run
//! use product_matrix::{ConnectorSettings, HttpTransport, ProductMatrixConnector};
//! use serde_json::json;
//!
//! # async fn example() -> product_matrix::error::Result<()> {
//! let settings = ConnectorSettings::default();
//! let transport = HttpTransport::with_config(&settings.http)?;
//! let connector = ProductMatrixConnector::new(transport, settings);
//!
//! let profile = json!({ /* channelSettingsValues, channelAuthValues, productBusinessReferences */ });
//! let payload = json!({ "doc": { "page": 1, "pageSize": 25, "createdDateRange": {
//!     "startDateGMT": "2024-01-01T00:00:00Z", "endDateGMT": "2024-02-01T00:00:00Z" } } });
//!
//! let envelope = connector.get_product_matrix_from_query(&profile, &json!({}), &payload).await;
//! println!("{}", envelope.nc_status_code);
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;

use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::{
    catalog::CatalogClient,
    error::{ConnectorError, Result},
    matrix::dispatch,
    reference::{PathExtractor, ReferenceExtractor},
    request::{ValidatedRequest, validate_request},
    response::{EndpointStatus, Envelope, error_envelope, paginate},
    settings::ConnectorSettings,
    transport::Transport,
};

/// Serves matrix product queries against the upstream catalog.
#[derive(Debug)]
pub struct ProductMatrixConnector<T, E = PathExtractor> {
    transport: T,
    settings: ConnectorSettings,
    extractor: E,
}

impl<T: Transport> ProductMatrixConnector<T> {
    /// Creates a connector using the built-in business-reference evaluator.
    #[must_use]
    pub const fn new(transport: T, settings: ConnectorSettings) -> Self {
        Self { transport, settings, extractor: PathExtractor }
    }
}

impl<T: Transport, E: ReferenceExtractor> ProductMatrixConnector<T, E> {
    /// Creates a connector with a custom business-reference extractor.
    #[must_use]
    pub const fn with_extractor(transport: T, settings: ConnectorSettings, extractor: E) -> Self {
        Self { transport, settings, extractor }
    }

    /// The connector's settings.
    #[must_use]
    pub const fn settings(&self) -> &ConnectorSettings {
        &self.settings
    }

    /// The upstream transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Validates the request, runs the pipeline and builds the envelope.
    ///
    /// Validation failures produce a 400 envelope listing every rejection
    /// message; every other failure is classified by
    /// [`error_envelope`](crate::response::error_envelope).
    #[instrument(skip_all)]
    pub async fn get_product_matrix_from_query(
        &self,
        channel_profile: &Value,
        flow_context: &Value,
        payload: &Value,
    ) -> Envelope {
        info!("Beginning GetProductMatrixFromQuery...");
        debug!(%flow_context, "flow context");

        let request = match validate_request(channel_profile, payload) {
            Ok(request) => request,
            Err(messages) => {
                for message in &messages {
                    error!("{message}");
                }
                return error_envelope(
                    &ConnectorError::InvalidRequest(messages),
                    EndpointStatus::default(),
                );
            }
        };

        info!("Stub function is valid.");
        self.run(&request).await
    }

    /// Runs the pipeline for an already validated request.
    #[instrument(skip_all, fields(company_id = %request.auth.company_id, query_type = %request.query_type))]
    pub async fn run(&self, request: &ValidatedRequest) -> Envelope {
        let client = CatalogClient::new(&self.transport, &self.settings, request);

        let result = async {
            let outcome = dispatch(&client, request, &self.settings.batching).await?;
            paginate(
                outcome.items,
                outcome.total_results,
                request.query.page,
                request.query.page_size,
                &request.business_references,
                &self.extractor,
                client.diagnostics().snapshot(),
            )
        }
        .await;

        result.unwrap_or_else(|failure| error_envelope(&failure, client.diagnostics().snapshot()))
    }

    /// Runs the query and hands the envelope to `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::CallbackFailed`] if the callback fails; the
    /// failure is logged first.
    pub async fn invoke<F, CE>(
        &self,
        channel_profile: &Value,
        flow_context: &Value,
        payload: &Value,
        callback: F,
    ) -> Result<()>
    where
        F: FnOnce(Envelope) -> std::result::Result<(), CE>,
        CE: Display,
    {
        let envelope = self.get_product_matrix_from_query(channel_profile, flow_context, payload).await;

        callback(envelope).map_err(|e| {
            let failure = ConnectorError::CallbackFailed(e.to_string());
            error!("{failure}");
            failure
        })
    }
}
