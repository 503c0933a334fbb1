//! Review sentiment pipeline.
//!
//! Pulls recent app-store reviews for one application, strips emoji and
//! pictographs, classifies each review with a pretrained sentiment model
//! (served by TEI, or an offline lexicon) and tallies the labels. The
//! `report` module turns the result into a CSV export, a text preview and a
//! pie chart.

pub mod classifier;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod sources;
pub mod types;

mod retry;

pub use classifier::{LexiconModel, SentimentClassifier, SentimentModel, TeiModel, TeiOptions};
pub use error::SentimentError;
pub use normalize::normalize;
pub use pipeline::SentimentPipeline;
pub use sources::{fetch, GooglePlayClient, ReviewSource};
pub use types::{
    FetchFailure, FetchOutcome, PipelineResult, RawItem, ReviewRecord, RunDiagnostic,
    SentimentLabel, SentimentSummary,
};
