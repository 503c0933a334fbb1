//! Review sources and the fail-soft fetch used by the pipeline.

mod google_play;
mod google_play_parse;

use async_trait::async_trait;

pub use google_play::GooglePlayClient;

use crate::error::SentimentError;
use crate::types::{FetchFailure, FetchOutcome, RawItem};

/// Anything that can list recent reviews for an opaque source identifier.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch up to `limit` reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns a [`SentimentError`] on any failure. Implementations do not
    /// return partial results.
    async fn fetch_reviews(
        &self,
        source_id: &str,
        limit: usize,
    ) -> Result<Vec<RawItem>, SentimentError>;
}

/// Fetch reviews without ever failing.
///
/// Errors from `source` are logged and reported in
/// [`FetchOutcome::failure`] with an empty item list, so a broken fetch and
/// a source with no reviews share the same shape but stay distinguishable.
pub async fn fetch(source: &dyn ReviewSource, source_id: &str, limit: usize) -> FetchOutcome {
    match source.fetch_reviews(source_id, limit).await {
        Ok(items) => {
            tracing::info!(
                source = source.name(),
                source_id,
                count = items.len(),
                "fetched reviews"
            );
            FetchOutcome {
                items,
                failure: None,
            }
        }
        Err(e) => {
            tracing::warn!(
                source = source.name(),
                source_id,
                error = %e,
                "review fetch failed"
            );
            FetchOutcome {
                items: Vec::new(),
                failure: Some(FetchFailure {
                    source_id: source_id.to_string(),
                    reason: e.to_string(),
                }),
            }
        }
    }
}
