use std::collections::BTreeMap;
use std::fmt;

/// A single review body exactly as the source returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub text: String,
}

impl RawItem {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A sentiment category as named by the classification model.
///
/// The pipeline never invents or renames labels; whatever string the model
/// reports is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SentimentLabel(String);

impl SentimentLabel {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One normalized review paired with the label it was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRecord {
    /// Index of the review in the fetched list, counting reviews that were
    /// dropped during cleaning.
    pub position: usize,
    /// Normalized review text. Never empty.
    pub review: String,
    pub sentiment: SentimentLabel,
}

/// Per-label review counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentimentSummary {
    counts: BTreeMap<SentimentLabel, usize>,
}

impl SentimentSummary {
    /// Tally the labels of `records`.
    #[must_use]
    pub fn from_records(records: &[ReviewRecord]) -> Self {
        let mut counts = BTreeMap::new();
        for record in records {
            *counts.entry(record.sentiment.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Count for `label`, `0` when the label never occurred.
    #[must_use]
    pub fn count(&self, label: &SentimentLabel) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct labels observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Labels in lexical order with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&SentimentLabel, usize)> {
        self.counts.iter().map(|(label, count)| (label, *count))
    }

    /// Labels ordered by descending count, ties broken by label.
    #[must_use]
    pub fn ranked(&self) -> Vec<(&SentimentLabel, usize)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    /// Share of the total held by `label`, in `[0.0, 1.0]`.
    #[must_use]
    pub fn proportion(&self, label: &SentimentLabel) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let share = self.count(label) as f64 / total as f64;
        share
    }
}

/// Why a review fetch produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub source_id: String,
    pub reason: String,
}

/// Result of a fail-soft fetch: the items plus the failure, if any.
///
/// `failure` is `Some` only when the source errored; in that case `items`
/// is always empty.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub items: Vec<RawItem>,
    pub failure: Option<FetchFailure>,
}

/// Explains an empty pipeline result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunDiagnostic {
    /// The source could not be read. No classification was attempted.
    FetchFailed(FetchFailure),
    /// The source answered but had no reviews.
    NoReviews,
    /// Every fetched review was empty after normalization.
    AllFilteredOut { dropped: usize },
}

/// Output of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResult {
    /// Records in fetch order.
    pub records: Vec<ReviewRecord>,
    pub summary: SentimentSummary,
    /// Set only when `records` is empty, to say why.
    pub diagnostic: Option<RunDiagnostic>,
}

impl PipelineResult {
    #[must_use]
    pub fn empty(diagnostic: RunDiagnostic) -> Self {
        Self {
            records: Vec::new(),
            summary: SentimentSummary::default(),
            diagnostic: Some(diagnostic),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
