use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;

/// Labels each text by its length parity, recording every batch it sees.
struct ParityModel {
    labels: Vec<SentimentLabel>,
    calls: Arc<AtomicUsize>,
    batch_sizes: Arc<std::sync::Mutex<Vec<usize>>>,
    cap: Option<usize>,
}

impl ParityModel {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            labels: vec![SentimentLabel::new("even"), SentimentLabel::new("odd")],
            calls,
            batch_sizes: Arc::new(std::sync::Mutex::new(Vec::new())),
            cap: None,
        }
    }
}

#[async_trait]
impl SentimentModel for ParityModel {
    fn label_set(&self) -> &[SentimentLabel] {
        &self.labels
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.cap
    }

    async fn predict(&self, batch: &[&str]) -> Result<Vec<SentimentLabel>, SentimentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batch_sizes.lock().unwrap().push(batch.len());
        Ok(batch
            .iter()
            .map(|t| self.labels[t.chars().count() % 2].clone())
            .collect())
    }
}

/// Misbehaving model for contract checks.
enum Broken {
    DropsOne,
    UnknownLabel,
}

#[async_trait]
impl SentimentModel for Broken {
    fn label_set(&self) -> &[SentimentLabel] {
        static LABELS: std::sync::LazyLock<Vec<SentimentLabel>> =
            std::sync::LazyLock::new(|| vec![SentimentLabel::new("positive")]);
        &LABELS
    }

    async fn predict(&self, batch: &[&str]) -> Result<Vec<SentimentLabel>, SentimentError> {
        match self {
            Broken::DropsOne => Ok(vec![SentimentLabel::new("positive"); batch.len() - 1]),
            Broken::UnknownLabel => Ok(vec![SentimentLabel::new("angry"); batch.len()]),
        }
    }
}

fn texts() -> Vec<String> {
    ["a", "bb", "ccc", "dddd", "eeeee", "ffffff", "g", "hh", "iii", "jjjj", "k"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[tokio::test]
async fn classify_returns_one_label_per_text_in_order() {
    let calls = Arc::new(AtomicUsize::new(0));
    let classifier = SentimentClassifier::from_model(ParityModel::new(calls), 4);
    let labels = classifier.classify(&texts()).await.unwrap();

    assert_eq!(labels.len(), 11);
    assert_eq!(labels[0].as_str(), "odd");
    assert_eq!(labels[1].as_str(), "even");
    assert_eq!(labels[10].as_str(), "odd");
}

#[tokio::test]
async fn results_do_not_depend_on_batch_size() {
    let mut results = Vec::new();
    for batch_size in [1, 3, 8, 64] {
        let classifier = SentimentClassifier::from_model(
            ParityModel::new(Arc::new(AtomicUsize::new(0))),
            batch_size,
        );
        results.push(classifier.classify(&texts()).await.unwrap());
    }
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn input_is_split_into_chunks_of_batch_size() {
    let calls = Arc::new(AtomicUsize::new(0));
    let model = ParityModel::new(Arc::clone(&calls));
    let sizes = Arc::clone(&model.batch_sizes);
    let classifier = SentimentClassifier::from_model(model, 4);

    classifier.classify(&texts()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(*sizes.lock().unwrap(), vec![4, 4, 3]);
}

#[tokio::test]
async fn model_cap_shrinks_chunks() {
    let mut model = ParityModel::new(Arc::new(AtomicUsize::new(0)));
    model.cap = Some(2);
    let sizes = Arc::clone(&model.batch_sizes);
    let classifier = SentimentClassifier::from_model(model, 8);

    classifier.classify(&["a", "b", "c"]).await.unwrap();

    assert_eq!(*sizes.lock().unwrap(), vec![2, 1]);
}

#[tokio::test]
async fn empty_input_never_touches_the_model() {
    let built = Arc::new(AtomicUsize::new(0));
    let b = Arc::clone(&built);
    let classifier = SentimentClassifier::lazy(8, move || {
        b.fetch_add(1, Ordering::SeqCst);
        let calls = Arc::new(AtomicUsize::new(0));
        async move { Ok(ParityModel::new(calls)) }
    });

    let labels = classifier.classify::<&str>(&[]).await.unwrap();

    assert!(labels.is_empty());
    assert_eq!(built.load(Ordering::SeqCst), 0);
    assert!(!classifier.is_initialized());
}

#[tokio::test]
async fn lazy_model_is_built_once_across_clones() {
    let built = Arc::new(AtomicUsize::new(0));
    let b = Arc::clone(&built);
    let classifier = SentimentClassifier::lazy(8, move || {
        b.fetch_add(1, Ordering::SeqCst);
        let calls = Arc::new(AtomicUsize::new(0));
        async move { Ok(ParityModel::new(calls)) }
    });
    let other = classifier.clone();

    classifier.initialize().await.unwrap();
    other.classify(&["x"]).await.unwrap();
    classifier.classify(&["yy"]).await.unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert!(other.is_initialized());
}

#[tokio::test]
async fn failed_initialization_is_reported_and_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let a = Arc::clone(&attempts);
    let classifier = SentimentClassifier::lazy(8, move || {
        a.fetch_add(1, Ordering::SeqCst);
        async move {
            Err::<ParityModel, _>(SentimentError::ClassifierInit("weights missing".to_string()))
        }
    });

    let err = classifier.initialize().await.unwrap_err();
    assert!(matches!(err, SentimentError::ClassifierInit(_)));
    assert!(!classifier.is_initialized());

    let err = classifier.classify(&["text"]).await.unwrap_err();
    assert!(matches!(err, SentimentError::ClassifierInit(_)));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn short_label_list_is_a_contract_error() {
    let classifier = SentimentClassifier::from_model(Broken::DropsOne, 8);
    let err = classifier.classify(&["a", "b"]).await.unwrap_err();
    assert!(matches!(err, SentimentError::ClassifierContract(_)));
}

#[tokio::test]
async fn label_outside_label_set_is_a_contract_error() {
    let classifier = SentimentClassifier::from_model(Broken::UnknownLabel, 8);
    let err = classifier.classify(&["a"]).await.unwrap_err();
    assert!(matches!(err, SentimentError::ClassifierContract(ref m) if m.contains("angry")));
}

#[tokio::test]
async fn concurrent_callers_get_their_own_results() {
    let calls = Arc::new(AtomicUsize::new(0));
    let classifier = SentimentClassifier::from_model(ParityModel::new(Arc::clone(&calls)), 2);
    let left = classifier.clone();
    let right = classifier.clone();

    let (a, b) = tokio::join!(
        async move { left.classify(&["a", "bb", "ccc"]).await },
        async move { right.classify(&["dd", "e"]).await },
    );

    let a: Vec<String> = a.unwrap().iter().map(ToString::to_string).collect();
    let b: Vec<String> = b.unwrap().iter().map(ToString::to_string).collect();
    assert_eq!(a, vec!["odd", "even", "odd"]);
    assert_eq!(b, vec!["even", "odd"]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

/// Suspends inside `predict` and records the peak number of overlapping calls.
struct SlowModel {
    labels: Vec<SentimentLabel>,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl SentimentModel for SlowModel {
    fn label_set(&self) -> &[SentimentLabel] {
        &self.labels
    }

    async fn predict(&self, batch: &[&str]) -> Result<Vec<SentimentLabel>, SentimentError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        tokio::task::yield_now().await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(vec![self.labels[0].clone(); batch.len()])
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn model_never_runs_two_classifications_at_once() {
    let peak = Arc::new(AtomicUsize::new(0));
    let model = SlowModel {
        labels: vec![SentimentLabel::new("neutral")],
        active: Arc::new(AtomicUsize::new(0)),
        peak: Arc::clone(&peak),
    };
    let classifier = SentimentClassifier::from_model(model, 1);

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let classifier = classifier.clone();
            tokio::spawn(async move { classifier.classify(&["a", "b", "c"]).await })
        })
        .collect();
    for task in tasks {
        let labels = task.await.unwrap().unwrap();
        assert_eq!(labels.len(), 3);
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn label_set_comes_from_the_model() {
    let classifier =
        SentimentClassifier::from_model(ParityModel::new(Arc::new(AtomicUsize::new(0))), 8);
    let labels = classifier.label_set().await.unwrap();
    assert_eq!(
        labels,
        vec![SentimentLabel::new("even"), SentimentLabel::new("odd")]
    );
}

#[test]
fn zero_batch_size_is_raised_to_one() {
    let classifier =
        SentimentClassifier::from_model(ParityModel::new(Arc::new(AtomicUsize::new(0))), 0);
    assert_eq!(classifier.batch_size(), 1);
}

#[test]
fn chunk_size_respects_model_cap() {
    assert_eq!(chunk_size(8, None), 8);
    assert_eq!(chunk_size(8, Some(32)), 8);
    assert_eq!(chunk_size(8, Some(3)), 3);
    assert_eq!(chunk_size(8, Some(0)), 1);
}

#[test]
fn truncate_words_keeps_leading_words() {
    assert_eq!(truncate_words("one two three four", 2), "one two");
    assert_eq!(truncate_words("one two", 5), "one two");
    assert_eq!(truncate_words("  lead   space  here", 2), "  lead   space");
    assert_eq!(truncate_words("", 3), "");
}

#[test]
fn truncate_words_handles_multibyte_text() {
    assert_eq!(truncate_words("très bien mais lent", 2), "très bien");
    assert_eq!(truncate_words("日本 語 テキスト", 1), "日本");
}

#[tokio::test]
async fn lexicon_model_classifies_offline() {
    let model = LexiconModel::new(DEFAULT_MAX_INPUT_TOKENS);
    let classifier = SentimentClassifier::from_model(model, DEFAULT_BATCH_SIZE);
    let labels = classifier
        .classify(&["Great app!!", "Terrible, crashes constantly"])
        .await
        .unwrap();
    assert_eq!(labels[0].as_str(), "positive");
    assert_eq!(labels[1].as_str(), "negative");
}
