//! TEI (Text Embeddings Inference) client for sequence classification.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{SentimentModel, DEFAULT_MAX_INPUT_TOKENS};
use crate::error::SentimentError;
use crate::types::SentimentLabel;

/// Connection settings for [`TeiModel::connect`].
#[derive(Debug, Clone)]
pub struct TeiOptions {
    /// Model the server should be hosting. A mismatch is logged, not fatal.
    pub expected_model_id: Option<String>,
    pub max_input_tokens: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for TeiOptions {
    fn default() -> Self {
        Self {
            expected_model_id: None,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
            timeout_secs: 30,
            user_agent: "revsent/0.1 (review-sentiment)".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    model_id: String,
    model_type: ModelType,
    max_input_length: Option<usize>,
    max_client_batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ModelType {
    classifier: Option<ClassifierInfo>,
}

#[derive(Debug, Deserialize)]
struct ClassifierInfo {
    id2label: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    /// One single-sequence list per text. A bare two-string list would be
    /// read as a sentence pair.
    inputs: Vec<[&'a str; 1]>,
    raw_scores: bool,
    truncate: bool,
    truncation_direction: &'static str,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    label: String,
    score: f32,
}

/// A sequence-classification model served by TEI.
pub struct TeiModel {
    client: reqwest::Client,
    predict_url: String,
    model_id: String,
    labels: Vec<SentimentLabel>,
    max_client_batch_size: Option<usize>,
}

impl TeiModel {
    /// Connect to the TEI server at `base_url` and read the model's label set.
    ///
    /// Calls `/info` once. The server must be hosting a classifier; its
    /// `id2label` map, ordered by id, becomes the label set.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::ClassifierInit`] if the server is
    /// unreachable, answers with a non-success status, is not hosting a
    /// classifier, or reports no labels.
    pub async fn connect(base_url: &str, options: &TeiOptions) -> Result<Self, SentimentError> {
        let base_url = base_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|e| SentimentError::ClassifierInit(format!("failed to build HTTP client: {e}")))?;

        let response = client
            .get(format!("{base_url}/info"))
            .send()
            .await
            .map_err(|e| SentimentError::ClassifierInit(format!("TEI info request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SentimentError::ClassifierInit(format!(
                "TEI info returned status {}",
                response.status()
            )));
        }

        let info: InfoResponse = response
            .json()
            .await
            .map_err(|e| SentimentError::ClassifierInit(format!("TEI info parse error: {e}")))?;

        let classifier = info.model_type.classifier.ok_or_else(|| {
            SentimentError::ClassifierInit(format!(
                "TEI model {} is not a sequence classifier",
                info.model_id
            ))
        })?;

        let labels = ordered_labels(classifier.id2label);
        if labels.is_empty() {
            return Err(SentimentError::ClassifierInit(format!(
                "TEI model {} reports no labels",
                info.model_id
            )));
        }

        if let Some(expected) = &options.expected_model_id {
            if expected != &info.model_id {
                tracing::warn!(
                    expected = %expected,
                    actual = %info.model_id,
                    "TEI is serving a different model than configured"
                );
            }
        }
        if let Some(server_max) = info.max_input_length {
            if server_max != options.max_input_tokens {
                tracing::warn!(
                    configured = options.max_input_tokens,
                    server = server_max,
                    "TEI truncates at its own max_input_length"
                );
            }
        }

        tracing::info!(
            model = %info.model_id,
            labels = labels.len(),
            "connected to TEI classifier"
        );

        Ok(Self {
            client,
            predict_url: format!("{base_url}/predict"),
            model_id: info.model_id,
            labels,
            max_client_batch_size: info.max_client_batch_size.filter(|&n| n > 0),
        })
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl SentimentModel for TeiModel {
    fn label_set(&self) -> &[SentimentLabel] {
        &self.labels
    }

    fn max_batch_size(&self) -> Option<usize> {
        self.max_client_batch_size
    }

    /// One `/predict` call for the whole batch, truncating from the right.
    async fn predict(&self, batch: &[&str]) -> Result<Vec<SentimentLabel>, SentimentError> {
        let request = PredictRequest {
            inputs: batch.iter().map(|text| [*text]).collect(),
            raw_scores: false,
            truncate: true,
            truncation_direction: "Right",
        };

        let response = self
            .client
            .post(&self.predict_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SentimentError::Tei(format!("TEI request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(SentimentError::Tei(format!(
                "TEI returned status {}",
                response.status()
            )));
        }

        let predictions: Vec<Vec<Prediction>> = response
            .json()
            .await
            .map_err(|e| SentimentError::Tei(format!("TEI response parse error: {e}")))?;

        if predictions.len() != batch.len() {
            return Err(SentimentError::Tei(format!(
                "TEI returned {} predictions for {} inputs",
                predictions.len(),
                batch.len()
            )));
        }

        predictions
            .into_iter()
            .map(|scores| {
                top_label(scores)
                    .map(SentimentLabel::new)
                    .ok_or_else(|| SentimentError::Tei("TEI returned an empty prediction".to_string()))
            })
            .collect()
    }
}

/// Labels ordered by numeric class id.
fn ordered_labels(id2label: BTreeMap<String, String>) -> Vec<SentimentLabel> {
    let mut pairs: Vec<(u32, String)> = id2label
        .into_iter()
        .filter_map(|(id, label)| id.parse::<u32>().ok().map(|id| (id, label)))
        .collect();
    pairs.sort_by_key(|(id, _)| *id);
    pairs
        .into_iter()
        .map(|(_, label)| SentimentLabel::new(label))
        .collect()
}

/// Highest-scoring label. Ties go to the earlier entry.
fn top_label(scores: Vec<Prediction>) -> Option<String> {
    scores
        .into_iter()
        .fold(None::<Prediction>, |best, candidate| match best {
            Some(b) if b.score >= candidate.score => Some(b),
            _ => Some(candidate),
        })
        .map(|p| p.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(label: &str, score: f32) -> Prediction {
        Prediction {
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn ordered_labels_sorts_numerically() {
        let mut map = BTreeMap::new();
        map.insert("10".to_string(), "ten".to_string());
        map.insert("2".to_string(), "two".to_string());
        map.insert("0".to_string(), "zero".to_string());
        let labels: Vec<String> = ordered_labels(map)
            .into_iter()
            .map(|l| l.to_string())
            .collect();
        assert_eq!(labels, vec!["zero", "two", "ten"]);
    }

    #[test]
    fn top_label_picks_highest_score_regardless_of_order() {
        let scores = vec![
            pred("neutral", 0.2),
            pred("positive", 0.7),
            pred("negative", 0.1),
        ];
        assert_eq!(top_label(scores).as_deref(), Some("positive"));
    }

    #[test]
    fn top_label_tie_keeps_first() {
        let scores = vec![pred("negative", 0.5), pred("positive", 0.5)];
        assert_eq!(top_label(scores).as_deref(), Some("negative"));
    }

    #[test]
    fn top_label_of_nothing_is_none() {
        assert_eq!(top_label(Vec::new()), None);
    }

    #[test]
    fn predict_request_wraps_each_text_as_single_sequence() {
        let request = PredictRequest {
            inputs: vec![["a"], ["b"]],
            raw_scores: false,
            truncate: true,
            truncation_direction: "Right",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"], serde_json::json!([["a"], ["b"]]));
        assert_eq!(json["truncate"], true);
        assert_eq!(json["truncation_direction"], "Right");
    }
}
