// Copyright 2025 Wealthz Project
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wealthz::config::build_settings;
use wealthz::error::NodeError;
use wealthz::model::EtlPipeline;
use wealthz::DuckLakeNode;

#[derive(Parser)]
#[command(name = "wealthz", about = "DuckLake ETL node", version)]
struct Cli {
    /// Directory holding pipeline YAML documents.
    #[arg(long, env = "CONFIG_DIR")]
    config_dir: PathBuf,

    /// Directory holding credential files.
    #[arg(long, env = "SECRETS_DIR")]
    secrets_dir: Option<PathBuf>,

    /// Optional settings file (JSON, YAML or TOML). Environment variables
    /// with the DUCKLAKE prefix override it.
    #[arg(long)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a pipeline by name.
    Run {
        /// Pipeline name, resolved to <config-dir>/<name>.yaml.
        name: String,
    },
    /// Parse and validate a pipeline without running it.
    Validate {
        /// Pipeline name, resolved to <config-dir>/<name>.yaml.
        name: String,
    },
}

fn load_pipeline(cli: &Cli, name: &str) -> Result<EtlPipeline, NodeError> {
    let path = cli.config_dir.join(format!("{}.yaml", name));
    let pipeline = EtlPipeline::from_yaml(path)?;
    pipeline.validate()?;
    Ok(pipeline)
}

async fn execute(cli: &Cli) -> Result<(), NodeError> {
    match &cli.command {
        Command::Validate { name } => {
            let pipeline = load_pipeline(cli, name)?;
            tracing::info!(pipeline = %pipeline.name, "Pipeline is valid");
            Ok(())
        }
        Command::Run { name } => {
            let pipeline = load_pipeline(cli, name)?;
            let settings =
                build_settings(true, cli.settings.as_deref().unwrap_or_default())?;
            let secrets_dir = cli.secrets_dir.clone().ok_or_else(|| {
                NodeError::InvalidParameter("--secrets-dir is required to run".to_owned())
            })?;

            let node = DuckLakeNode::new(settings, secrets_dir);
            let report = node.run(&pipeline).await?;
            tracing::info!(
                pipeline = %report.pipeline,
                fetched_rows = report.fetched_rows,
                loaded_rows = report.loaded_rows,
                "Run complete"
            );
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(error) = execute(&cli).await {
        tracing::error!("{}", error);
        std::process::exit(1);
    }
}
