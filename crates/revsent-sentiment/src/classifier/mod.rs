//! Sentiment classification over pretrained models.
//!
//! [`SentimentModel`] is one backend request: a batch of texts in, one label
//! per text out. [`SentimentClassifier`] is the handle callers hold. It
//! initializes the backend once, serializes access to it, splits input into
//! chunks and checks that the backend kept its side of the contract.

mod lexicon;
mod tei;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use revsent_core::{AppConfig, ClassifierBackend};
use tokio::sync::{Mutex, OnceCell};

pub use lexicon::{lexicon_score, LexiconModel};
pub use tei::{TeiModel, TeiOptions};

use crate::error::SentimentError;
use crate::types::SentimentLabel;

/// Default number of texts per backend request.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Default truncation bound, in model tokens.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 512;

/// A loaded sentiment model.
///
/// Implementations must classify each text independently of the others in
/// the batch, and must truncate over-long input rather than fail on it.
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// The closed set of labels this model can emit.
    fn label_set(&self) -> &[SentimentLabel];

    /// Largest batch the backend accepts, if it has a limit.
    fn max_batch_size(&self) -> Option<usize> {
        None
    }

    /// Classify `batch`, returning one label per text in the same order.
    ///
    /// # Errors
    ///
    /// Returns a [`SentimentError`] if the backend cannot be reached or
    /// answers with something unusable.
    async fn predict(&self, batch: &[&str]) -> Result<Vec<SentimentLabel>, SentimentError>;
}

type ModelFuture =
    Pin<Box<dyn Future<Output = Result<Arc<dyn SentimentModel>, SentimentError>> + Send>>;
type ModelFactory = Box<dyn Fn() -> ModelFuture + Send + Sync>;

struct Shared {
    model: OnceCell<Arc<dyn SentimentModel>>,
    factory: Option<ModelFactory>,
    in_flight: Mutex<()>,
    batch_size: usize,
}

/// Process-wide handle to a sentiment model.
///
/// Cloning is cheap and every clone shares the same model, which is built
/// at most once (on [`initialize`](Self::initialize) or first use). At most
/// one classification runs against the model at a time; concurrent callers
/// wait their turn.
#[derive(Clone)]
pub struct SentimentClassifier {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for SentimentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentClassifier")
            .field("initialized", &self.shared.model.initialized())
            .field("batch_size", &self.shared.batch_size)
            .finish_non_exhaustive()
    }
}

impl SentimentClassifier {
    /// A classifier whose model is built by `factory` on first use.
    ///
    /// A failed build leaves the classifier uninitialized; the next call
    /// tries again.
    pub fn lazy<F, Fut, M>(batch_size: usize, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, SentimentError>> + Send + 'static,
        M: SentimentModel + 'static,
    {
        let factory: ModelFactory = Box::new(move || -> ModelFuture {
            let fut = factory();
            Box::pin(async move {
                let model = fut.await?;
                Ok(Arc::new(model) as Arc<dyn SentimentModel>)
            })
        });
        Self::build(OnceCell::new(), Some(factory), batch_size)
    }

    /// A classifier around an already-loaded model.
    pub fn from_model<M: SentimentModel + 'static>(model: M, batch_size: usize) -> Self {
        let model: Arc<dyn SentimentModel> = Arc::new(model);
        Self::build(OnceCell::new_with(Some(model)), None, batch_size)
    }

    /// A lazily-built classifier for the backend named in `config`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let batch_size = config.batch_size;
        match config.classifier {
            ClassifierBackend::Tei => {
                let base_url = config.tei_url.clone();
                let options = TeiOptions {
                    expected_model_id: Some(config.model_id.clone()),
                    max_input_tokens: config.max_input_tokens,
                    timeout_secs: config.request_timeout_secs,
                    user_agent: config.user_agent.clone(),
                };
                Self::lazy(batch_size, move || {
                    let base_url = base_url.clone();
                    let options = options.clone();
                    async move {
                        let base_url = base_url.ok_or_else(|| {
                            SentimentError::ClassifierInit(
                                "REVSENT_TEI_URL is not configured".to_string(),
                            )
                        })?;
                        TeiModel::connect(&base_url, &options).await
                    }
                })
            }
            ClassifierBackend::Lexicon => {
                let max_input_tokens = config.max_input_tokens;
                Self::lazy(batch_size, move || async move {
                    Ok(LexiconModel::new(max_input_tokens))
                })
            }
        }
    }

    fn build(
        model: OnceCell<Arc<dyn SentimentModel>>,
        factory: Option<ModelFactory>,
        batch_size: usize,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                model,
                factory,
                in_flight: Mutex::new(()),
                batch_size: batch_size.max(1),
            }),
        }
    }

    async fn model(&self) -> Result<&Arc<dyn SentimentModel>, SentimentError> {
        self.shared
            .model
            .get_or_try_init(|| async {
                let factory = self.shared.factory.as_ref().ok_or_else(|| {
                    SentimentError::ClassifierInit("no model factory configured".to_string())
                })?;
                let model = factory().await?;
                tracing::info!(
                    labels = ?model.label_set(),
                    "sentiment model initialized"
                );
                Ok(model)
            })
            .await
    }

    /// Build the model now if it has not been built yet. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the factory's error, typically
    /// [`SentimentError::ClassifierInit`].
    pub async fn initialize(&self) -> Result<(), SentimentError> {
        self.model().await.map(|_| ())
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.model.initialized()
    }

    /// Configured chunk size.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.shared.batch_size
    }

    /// The model's label set, initializing it if needed.
    ///
    /// # Errors
    ///
    /// Returns the initialization error if the model cannot be built.
    pub async fn label_set(&self) -> Result<Vec<SentimentLabel>, SentimentError> {
        Ok(self.model().await?.label_set().to_vec())
    }

    /// Classify `texts`, returning one label per text in input order.
    ///
    /// Input is sent to the model in chunks of [`batch_size`](Self::batch_size)
    /// (or the model's own cap, if smaller). Chunking never changes results.
    /// An empty input returns immediately without touching the model.
    ///
    /// # Errors
    ///
    /// Returns the initialization error if the model cannot be built, any
    /// backend error, or [`SentimentError::ClassifierContract`] if the model
    /// returns the wrong number of labels or a label outside its label set.
    pub async fn classify<S>(&self, texts: &[S]) -> Result<Vec<SentimentLabel>, SentimentError>
    where
        S: AsRef<str> + Sync,
    {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model().await?;
        let _guard = self.shared.in_flight.lock().await;

        let chunk_size = chunk_size(self.shared.batch_size, model.max_batch_size());
        let label_set = model.label_set();
        let mut labels = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(chunk_size) {
            let batch: Vec<&str> = chunk.iter().map(AsRef::as_ref).collect();
            let predicted = model.predict(&batch).await?;

            if predicted.len() != batch.len() {
                return Err(SentimentError::ClassifierContract(format!(
                    "model returned {} labels for {} inputs",
                    predicted.len(),
                    batch.len()
                )));
            }
            if let Some(unknown) = predicted.iter().find(|label| !label_set.contains(label)) {
                return Err(SentimentError::ClassifierContract(format!(
                    "model returned label \"{unknown}\" outside its label set"
                )));
            }

            labels.extend(predicted);
        }

        tracing::debug!(
            texts = texts.len(),
            chunk_size,
            "classified review batch"
        );

        Ok(labels)
    }
}

fn chunk_size(batch_size: usize, model_cap: Option<usize>) -> usize {
    model_cap
        .map_or(batch_size, |cap| cap.min(batch_size))
        .max(1)
}

/// Keep at most the first `max_tokens` whitespace-separated words of `text`.
///
/// Deterministic: drops words from the end only, and returns `text`
/// unchanged when it is already short enough.
#[must_use]
pub fn truncate_words(text: &str, max_tokens: usize) -> &str {
    let mut words = 0usize;
    let mut in_word = false;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
            if words > max_tokens {
                return text[..idx].trim_end();
            }
        }
    }
    text
}

#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;
