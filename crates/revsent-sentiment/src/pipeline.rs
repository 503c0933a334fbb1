//! Fetch → normalize → classify → summarize.

use std::sync::Arc;

use crate::classifier::SentimentClassifier;
use crate::error::SentimentError;
use crate::normalize::normalize;
use crate::sources::{fetch, ReviewSource};
use crate::types::{PipelineResult, ReviewRecord, RunDiagnostic, SentimentSummary};

/// One review source paired with one classifier.
///
/// Construction initializes the classifier so that a missing or broken
/// model is reported before any network traffic to the review source.
pub struct SentimentPipeline {
    source: Arc<dyn ReviewSource>,
    classifier: SentimentClassifier,
}

impl std::fmt::Debug for SentimentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentPipeline")
            .field("source", &self.source.name())
            .field("classifier", &self.classifier)
            .finish()
    }
}

impl SentimentPipeline {
    /// Build a pipeline, loading the classifier's model if it is not loaded.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::ClassifierInit`] (or whatever the model
    /// factory returns) if the model cannot be loaded.
    pub async fn new(
        source: Arc<dyn ReviewSource>,
        classifier: SentimentClassifier,
    ) -> Result<Self, SentimentError> {
        classifier.initialize().await?;
        Ok(Self { source, classifier })
    }

    #[must_use]
    pub fn classifier(&self) -> &SentimentClassifier {
        &self.classifier
    }

    /// Analyze up to `limit` recent reviews of `source_id`.
    ///
    /// Fetch problems never fail the run: the result is empty and
    /// [`PipelineResult::diagnostic`] says why. Reviews that normalize to an
    /// empty string are dropped before classification. The classifier is
    /// called once, and not at all when nothing survives.
    ///
    /// # Errors
    ///
    /// Returns a [`SentimentError`] only if classification itself fails.
    pub async fn run(
        &self,
        source_id: &str,
        limit: usize,
    ) -> Result<PipelineResult, SentimentError> {
        let outcome = fetch(self.source.as_ref(), source_id, limit).await;

        if let Some(failure) = outcome.failure {
            return Ok(PipelineResult::empty(RunDiagnostic::FetchFailed(failure)));
        }
        if outcome.items.is_empty() {
            tracing::info!(source_id, "source returned no reviews");
            return Ok(PipelineResult::empty(RunDiagnostic::NoReviews));
        }

        let fetched = outcome.items.len();
        let (positions, reviews): (Vec<usize>, Vec<String>) = outcome
            .items
            .iter()
            .map(|item| normalize(&item.text))
            .enumerate()
            .filter(|(_, text)| !text.is_empty())
            .unzip();
        let dropped = fetched - reviews.len();

        if reviews.is_empty() {
            tracing::info!(source_id, dropped, "every review was empty after cleaning");
            return Ok(PipelineResult::empty(RunDiagnostic::AllFilteredOut { dropped }));
        }

        let labels = self.classifier.classify(&reviews).await?;

        let records: Vec<ReviewRecord> = positions
            .into_iter()
            .zip(reviews)
            .zip(labels)
            .map(|((position, review), sentiment)| ReviewRecord {
                position,
                review,
                sentiment,
            })
            .collect();
        let summary = SentimentSummary::from_records(&records);

        tracing::info!(
            source_id,
            fetched,
            dropped,
            classified = records.len(),
            labels = summary.len(),
            "sentiment run complete"
        );

        Ok(PipelineResult {
            records,
            summary,
            diagnostic: None,
        })
    }
}
