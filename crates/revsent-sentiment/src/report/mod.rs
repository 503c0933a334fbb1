//! Report artifacts built from pipeline output: the CSV export, a text
//! preview and a summary chart.

pub mod chart;

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::SentimentError;
use crate::types::{ReviewRecord, SentimentSummary};

/// Rows shown by the default preview.
pub const PREVIEW_ROWS: usize = 5;

/// Column headers of the export, in order.
pub const EXPORT_HEADERS: [&str; 2] = ["Reviews", "Sentiment"];

/// Widest cell the preview prints before cutting it with `...`.
const PREVIEW_CELL_WIDTH: usize = 50;

/// Write `records` to `path` as CSV, replacing any existing file.
///
/// # Errors
///
/// Returns [`SentimentError::Io`] if the file cannot be created or
/// [`SentimentError::Csv`] if a row cannot be written.
pub fn write_csv(path: &Path, records: &[ReviewRecord]) -> Result<(), SentimentError> {
    let file = File::create(path)?;
    write_csv_to(file, records)?;
    tracing::info!(path = %path.display(), rows = records.len(), "wrote review export");
    Ok(())
}

/// Write `records` as CSV to any writer.
///
/// The header row is always written, even for an empty export.
///
/// # Errors
///
/// Returns [`SentimentError::Csv`] on a write failure.
pub fn write_csv_to<W: Write>(writer: W, records: &[ReviewRecord]) -> Result<(), SentimentError> {
    let terminator = if cfg!(windows) {
        csv::Terminator::CRLF
    } else {
        csv::Terminator::Any(b'\n')
    };
    let mut csv = csv::WriterBuilder::new()
        .terminator(terminator)
        .from_writer(writer);

    csv.write_record(EXPORT_HEADERS)?;
    for record in records {
        csv.write_record([record.review.as_str(), record.sentiment.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// The first `rows` records as an aligned text table.
///
/// The index column shows each record's fetch position, so gaps mark
/// reviews that were dropped during cleaning.
#[must_use]
pub fn preview(records: &[ReviewRecord], rows: usize) -> String {
    if records.is_empty() {
        return "No reviews to preview.".to_string();
    }

    let shown: Vec<(String, String, String)> = records
        .iter()
        .take(rows)
        .map(|record| {
            (
                record.position.to_string(),
                clip(&record.review, PREVIEW_CELL_WIDTH),
                record.sentiment.to_string(),
            )
        })
        .collect();

    let index_width = shown.iter().map(|r| r.0.len()).max().unwrap_or(1);
    let review_width = shown
        .iter()
        .map(|r| r.1.chars().count())
        .chain(std::iter::once(EXPORT_HEADERS[0].len()))
        .max()
        .unwrap_or(0);
    let label_width = shown
        .iter()
        .map(|r| r.2.chars().count())
        .chain(std::iter::once(EXPORT_HEADERS[1].len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>index_width$}  {:<review_width$}  {:<label_width$}",
        "", EXPORT_HEADERS[0], EXPORT_HEADERS[1]
    );
    for (idx, review, label) in &shown {
        let _ = writeln!(
            out,
            "{idx:>index_width$}  {review:<review_width$}  {label:<label_width$}"
        );
    }
    out.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per label, most frequent first: `label: count (pct%)`.
#[must_use]
pub fn summary_lines(summary: &SentimentSummary) -> Vec<String> {
    summary
        .ranked()
        .into_iter()
        .map(|(label, count)| {
            format!(
                "{label}: {count} ({:.1}%)",
                summary.proportion(label) * 100.0
            )
        })
        .collect()
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}
