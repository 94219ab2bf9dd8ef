//! Connector settings.
//!
//! Deployment-level tuning loaded from TOML. Every field has a default, so an
//! empty document (or no file at all) yields a working configuration.
//!
//! ```toml
//! host_domain = "iqmetrix.net"
//!
//! [http]
//! timeout_secs = 60
//!
//! [pacing]
//! interval_ms = 1000
//!
//! [batching]
//! catalog_item_batch_size = 500
//! slug_batch_size = 100
//! fan_out_limit = 10
//! ```

use std::{fmt, path::Path};

use serde::Deserialize;

use crate::{
    error::{ConnectorError, Result},
    pacing::PacingConfig,
    transport::HttpConfig,
};

/// Upstream services the connector calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Catalog search, vendor-SKU lookup and bulk catalog item detail.
    Catalogs,
    /// Bulk slug detail.
    ProductLibrary,
}

impl Service {
    /// Host name prefix of the service.
    #[must_use]
    pub const fn host_prefix(self) -> &'static str {
        match self {
            Self::Catalogs => "catalogs",
            Self::ProductLibrary => "productlibrary",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_prefix())
    }
}

/// Batch and concurrency limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchingConfig {
    /// Catalog item ids per bulk detail request.
    #[serde(default = "default_catalog_item_batch_size")]
    pub catalog_item_batch_size: usize,

    /// Slugs per bulk detail request.
    #[serde(default = "default_slug_batch_size")]
    pub slug_batch_size: usize,

    /// Concurrent vendor-SKU lookups within one fan-out.
    #[serde(default = "default_fan_out_limit")]
    pub fan_out_limit: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            catalog_item_batch_size: default_catalog_item_batch_size(),
            slug_batch_size: default_slug_batch_size(),
            fan_out_limit: default_fan_out_limit(),
        }
    }
}

impl BatchingConfig {
    /// Validates every limit is at least 1.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SettingsError`] naming the first zero limit.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("catalog_item_batch_size", self.catalog_item_batch_size),
            ("slug_batch_size", self.slug_batch_size),
            ("fan_out_limit", self.fan_out_limit),
        ] {
            if value == 0 {
                return Err(ConnectorError::SettingsError(format!(
                    "batching.{name} must be at least 1"
                )));
            }
        }
        Ok(())
    }
}

const fn default_catalog_item_batch_size() -> usize {
    500
}

const fn default_slug_batch_size() -> usize {
    100
}

const fn default_fan_out_limit() -> usize {
    10
}

fn default_host_domain() -> String {
    "iqmetrix.net".to_owned()
}

/// Root connector settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectorSettings {
    /// Domain the upstream service hosts live under.
    #[serde(default = "default_host_domain")]
    pub host_domain: String,

    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Pacing of vendor-SKU lookups and bulk detail batches.
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Batch sizes and fan-out concurrency.
    #[serde(default)]
    pub batching: BatchingConfig,
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self {
            host_domain: default_host_domain(),
            http: HttpConfig::default(),
            pacing: PacingConfig::default(),
            batching: BatchingConfig::default(),
        }
    }
}

impl ConnectorSettings {
    /// Parses and validates settings from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SettingsError`] if the TOML is invalid or a
    /// value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use product_matrix::settings::ConnectorSettings;
    ///
    /// let settings = ConnectorSettings::from_toml("[pacing]\ninterval_ms = 0").unwrap();
    /// assert_eq!(settings.pacing.interval_ms, 0);
    /// assert_eq!(settings.batching.catalog_item_batch_size, 500);
    /// ```
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let settings: Self = toml::from_str(toml_str)
            .map_err(|e| ConnectorError::SettingsError(format!("invalid TOML settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SettingsError`] if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConnectorError::SettingsError(format!(
                "cannot read settings file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::SettingsError`] for the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.host_domain.trim().is_empty() {
            return Err(ConnectorError::SettingsError("host_domain must not be empty".to_owned()));
        }
        self.http.validate()?;
        self.batching.validate()
    }

    /// Base URL of an upstream service: `{protocol}://{service}{environment}.{host_domain}`.
    #[must_use]
    pub fn service_base_url(&self, protocol: &str, service: Service, environment: &str) -> String {
        format!("{protocol}://{}{environment}.{}", service.host_prefix(), self.host_domain)
    }
}
