//! `analyze` and `check` command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use revsent_core::AppConfig;
use revsent_sentiment::report::{self, chart, PREVIEW_ROWS};
use revsent_sentiment::{
    GooglePlayClient, PipelineResult, RunDiagnostic, SentimentClassifier, SentimentPipeline,
};

/// Arguments for [`run_analyze`] after config overrides have been applied.
#[derive(Debug)]
pub(crate) struct AnalyzeArgs {
    pub(crate) app_id: String,
    pub(crate) limit: usize,
    pub(crate) chart: Option<PathBuf>,
}

/// Run the review pipeline for one app and write its report artifacts.
///
/// The CSV export is written on every run, including empty ones, so the
/// export path always reflects the latest analysis.
///
/// # Errors
///
/// Returns an error if the classifier cannot be loaded, classification
/// fails, or an output file cannot be written. Fetch failures are reported
/// and do not fail the command.
pub(crate) async fn run_analyze(config: &AppConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let source =
        GooglePlayClient::from_config(config).context("failed to build Play Store client")?;
    let classifier = SentimentClassifier::from_config(config);
    let pipeline = SentimentPipeline::new(Arc::new(source), classifier)
        .await
        .context("failed to load sentiment classifier")?;

    let result = pipeline.run(&args.app_id, args.limit).await?;

    report::write_csv(&config.export_path, &result.records).with_context(|| {
        format!("failed to write export to {}", config.export_path.display())
    })?;

    print_result(&args.app_id, &result);
    println!("\nexport written to {}", config.export_path.display());

    if let Some(path) = &args.chart {
        let tag = chart::pie_chart_img_tag(&result.summary);
        std::fs::write(path, tag)
            .with_context(|| format!("failed to write chart to {}", path.display()))?;
        println!("chart written to {}", path.display());
    }

    Ok(())
}

fn print_result(app_id: &str, result: &PipelineResult) {
    if let Some(diagnostic) = &result.diagnostic {
        match diagnostic {
            RunDiagnostic::FetchFailed(failure) => {
                println!("could not fetch reviews for '{app_id}': {}", failure.reason);
            }
            RunDiagnostic::NoReviews => println!("no reviews found for '{app_id}'"),
            RunDiagnostic::AllFilteredOut { dropped } => println!(
                "all {dropped} fetched reviews for '{app_id}' were empty after removing emoji"
            ),
        }
        return;
    }

    println!("{}", report::preview(&result.records, PREVIEW_ROWS));
    println!("\n{} reviews analyzed", result.records.len());
    for line in report::summary_lines(&result.summary) {
        println!("  {line}");
    }
}

/// Load the configured classifier and print its label set.
///
/// # Errors
///
/// Returns an error if the classifier cannot be loaded.
pub(crate) async fn run_check(config: &AppConfig) -> anyhow::Result<()> {
    let classifier = SentimentClassifier::from_config(config);
    let labels = classifier
        .label_set()
        .await
        .context("failed to load sentiment classifier")?;

    let names: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
    println!(
        "classifier {} ready ({} labels: {})",
        config.classifier,
        names.len(),
        names.join(", ")
    );
    Ok(())
}
