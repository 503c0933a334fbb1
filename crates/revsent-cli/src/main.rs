mod analyze;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use revsent_core::ClassifierBackend;
use tracing_subscriber::EnvFilter;

use crate::analyze::{run_analyze, run_check, AnalyzeArgs};

/// Smallest and largest review sample `analyze` accepts.
const LIMIT_RANGE: std::ops::RangeInclusive<i64> = 10..=3000;

#[derive(Debug, Parser)]
#[command(name = "revsent")]
#[command(about = "Classify the sentiment of recent app-store reviews")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, classify and summarize reviews for one app
    Analyze {
        /// Play Store package name, e.g. `com.whatsapp`
        app_id: String,

        /// Number of recent reviews to analyze
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(i64).range(LIMIT_RANGE))]
        limit: i64,

        /// CSV export path (overrides `REVSENT_EXPORT_PATH`)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the summary chart as an HTML `<img>` tag to this file
        #[arg(long)]
        chart: Option<PathBuf>,

        /// Classifier backend (overrides `REVSENT_CLASSIFIER`)
        #[arg(long)]
        classifier: Option<ClassifierBackend>,
    },
    /// Load the configured classifier and print its label set
    Check {
        /// Classifier backend (overrides `REVSENT_CLASSIFIER`)
        #[arg(long)]
        classifier: Option<ClassifierBackend>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut overrides: Vec<(&str, String)> = Vec::new();
    match &cli.command {
        Commands::Analyze {
            output, classifier, ..
        } => {
            if let Some(path) = output {
                overrides.push(("REVSENT_EXPORT_PATH", path.display().to_string()));
            }
            if let Some(backend) = classifier {
                overrides.push(("REVSENT_CLASSIFIER", backend.to_string()));
            }
        }
        Commands::Check { classifier } => {
            if let Some(backend) = classifier {
                overrides.push(("REVSENT_CLASSIFIER", backend.to_string()));
            }
        }
    }

    let config = revsent_core::load_app_config_with_overrides(&overrides)?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            app_id,
            limit,
            chart,
            ..
        } => {
            let limit = usize::try_from(limit)?;
            run_analyze(
                &config,
                AnalyzeArgs {
                    app_id,
                    limit,
                    chart,
                },
            )
            .await
        }
        Commands::Check { .. } => run_check(&config).await,
    }
}
