//! Product matrix runner.
//!
//! Runs one `GetProductMatrixFromQuery` call against the live catalog and
//! prints the resulting envelope to stdout.
//!
//! ```text
//! product-matrix --profile channel.json --payload query.json [--settings connector.toml]
//! ```

#![allow(
    clippy::multiple_crate_versions,
    reason = "transitive dependencies from reqwest and clap"
)]

mod observability;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use product_matrix::{ConnectorSettings, HttpTransport, ProductMatrixConnector};
use serde_json::Value;
use tracing::error;

use crate::observability::{LogFormat, init_observability};

/// Query the upstream catalog for matrix products.
#[derive(Debug, Parser)]
#[command(name = "product-matrix", version, about)]
struct Cli {
    /// Channel profile JSON (channelSettingsValues, channelAuthValues, productBusinessReferences).
    #[arg(long)]
    profile: PathBuf,

    /// Query payload JSON (`{"doc": {...}}`).
    #[arg(long)]
    payload: PathBuf,

    /// Flow context JSON passed through to the connector.
    #[arg(long)]
    flow_context: Option<PathBuf>,

    /// Connector settings TOML; built-in defaults when omitted.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log format; falls back to `LOG_FORMAT`.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Pretty-print the envelope.
    #[arg(long)]
    pretty: bool,
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let profile = read_json(&cli.profile)?;
    let payload = read_json(&cli.payload)?;
    let flow_context = match &cli.flow_context {
        Some(path) => read_json(path)?,
        None => Value::Object(serde_json::Map::new()),
    };

    let settings = match &cli.settings {
        Some(path) => ConnectorSettings::from_file(path)
            .with_context(|| format!("cannot load settings from {}", path.display()))?,
        None => ConnectorSettings::default(),
    };
    let transport = HttpTransport::with_config(&settings.http).context("cannot build HTTP transport")?;
    let connector = ProductMatrixConnector::new(transport, settings);

    let pretty = cli.pretty;
    connector
        .invoke(&profile, &flow_context, &payload, |envelope| {
            let rendered = if pretty {
                serde_json::to_string_pretty(&envelope)
            } else {
                serde_json::to_string(&envelope)
            }?;
            println!("{rendered}");
            Ok::<_, serde_json::Error>(())
        })
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_observability(cli.log_format.unwrap_or_else(LogFormat::from_env));

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_read_json_missing_file_names_path() {
        let path = std::env::temp_dir().join("product-matrix-cli-missing.json");

        let err = read_json(&path).unwrap_err();

        assert_eq!(err.to_string(), format!("cannot read {}", path.display()));
        assert!(err.chain().count() > 1);
    }

    #[test]
    fn test_read_json_invalid_json_names_path() {
        let path = std::env::temp_dir().join(format!("product-matrix-cli-{}.json", std::process::id()));
        fs::File::create(&path).unwrap().write_all(b"{ not json").unwrap();

        let err = read_json(&path).unwrap_err();
        fs::remove_file(&path).unwrap();

        assert_eq!(err.to_string(), format!("{} is not valid JSON", path.display()));
        assert!(err.root_cause().is::<serde_json::Error>());
    }

    #[test]
    fn test_cli_parses_required_paths() {
        let cli = Cli::try_parse_from([
            "product-matrix",
            "--profile",
            "channel.json",
            "--payload",
            "query.json",
            "--log-format",
            "json",
            "--pretty",
        ])
        .unwrap();

        assert_eq!(cli.profile, PathBuf::from("channel.json"));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(cli.pretty);
        assert!(Cli::try_parse_from(["product-matrix", "--profile", "channel.json"]).is_err());
    }
}
