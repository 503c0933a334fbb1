//! Offline lexicon model for app-review sentiment.

use async_trait::async_trait;

use super::{truncate_words, SentimentModel};
use crate::error::SentimentError;
use crate::types::SentimentLabel;

/// App-review word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The final score is clamped to `[-1.0, 1.0]`.
pub(crate) const LEXICON: &[(&str, f32)] = &[
    // Positive signals
    ("great", 0.4),
    ("good", 0.3),
    ("excellent", 0.5),
    ("awesome", 0.5),
    ("amazing", 0.5),
    ("fantastic", 0.5),
    ("love", 0.5),
    ("loved", 0.5),
    ("best", 0.5),
    ("nice", 0.3),
    ("perfect", 0.5),
    ("recommend", 0.4),
    ("helpful", 0.4),
    ("useful", 0.4),
    ("easy", 0.3),
    ("smooth", 0.3),
    ("fast", 0.3),
    ("reliable", 0.4),
    ("intuitive", 0.4),
    ("thanks", 0.3),
    // Negative signals
    ("bad", -0.4),
    ("terrible", -0.6),
    ("awful", -0.6),
    ("horrible", -0.6),
    ("worst", -0.6),
    ("poor", -0.4),
    ("hate", -0.5),
    ("useless", -0.6),
    ("crash", -0.5),
    ("crashes", -0.5),
    ("crashing", -0.5),
    ("crashed", -0.5),
    ("bug", -0.3),
    ("bugs", -0.3),
    ("buggy", -0.5),
    ("broken", -0.5),
    ("slow", -0.3),
    ("laggy", -0.4),
    ("freezes", -0.5),
    ("annoying", -0.4),
    ("waste", -0.5),
    ("scam", -0.7),
    ("uninstall", -0.5),
    ("uninstalled", -0.5),
    ("disappointing", -0.5),
    ("fails", -0.4),
    ("failed", -0.4),
];

/// Score above which a review is `positive`, and below whose negation it is
/// `negative`.
const NEUTRAL_BAND: f32 = 0.05;

/// Score a text string using the review lexicon.
///
/// Splits text into lowercase words, sums matching weights, and clamps
/// the result to `[-1.0, 1.0]`. Returns `0.0` for empty or unknown text.
#[must_use]
pub fn lexicon_score(text: &str) -> f32 {
    let mut score = 0.0_f32;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();
        for &(lex_word, weight) in LEXICON {
            if w == lex_word {
                score += weight;
                break;
            }
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Deterministic three-way classifier over [`lexicon_score`].
///
/// Labels are `negative`, `neutral` and `positive`. Input is cut to the
/// first `max_input_tokens` words before scoring.
pub struct LexiconModel {
    labels: [SentimentLabel; 3],
    max_input_tokens: usize,
}

impl LexiconModel {
    #[must_use]
    pub fn new(max_input_tokens: usize) -> Self {
        Self {
            labels: [
                SentimentLabel::new("negative"),
                SentimentLabel::new("neutral"),
                SentimentLabel::new("positive"),
            ],
            max_input_tokens,
        }
    }

    fn label_for(&self, text: &str) -> SentimentLabel {
        let score = lexicon_score(truncate_words(text, self.max_input_tokens));
        let idx = if score > NEUTRAL_BAND {
            2
        } else if score < -NEUTRAL_BAND {
            0
        } else {
            1
        };
        self.labels[idx].clone()
    }
}

#[async_trait]
impl SentimentModel for LexiconModel {
    fn label_set(&self) -> &[SentimentLabel] {
        &self.labels
    }

    async fn predict(&self, batch: &[&str]) -> Result<Vec<SentimentLabel>, SentimentError> {
        Ok(batch.iter().map(|text| self.label_for(text)).collect())
    }
}
