use std::path::PathBuf;
use std::str::FromStr;

/// Which sentiment model backend the pipeline classifies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierBackend {
    /// A Text Embeddings Inference server hosting a sequence-classification model.
    Tei,
    /// The built-in review lexicon. Needs no network.
    Lexicon,
}

impl FromStr for ClassifierBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tei" => Ok(Self::Tei),
            "lexicon" => Ok(Self::Lexicon),
            other => Err(format!("unknown classifier backend '{other}' (expected tei or lexicon)")),
        }
    }
}

impl std::fmt::Display for ClassifierBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierBackend::Tei => write!(f, "tei"),
            ClassifierBackend::Lexicon => write!(f, "lexicon"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub classifier: ClassifierBackend,
    /// Required when `classifier` is [`ClassifierBackend::Tei`]. May embed
    /// basic-auth credentials, so `Debug` redacts it.
    pub tei_url: Option<String>,
    pub model_id: String,
    pub batch_size: usize,
    pub max_input_tokens: usize,
    pub play_base_url: String,
    pub fetch_lang: String,
    pub fetch_country: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub inter_request_delay_ms: u64,
    pub export_path: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("classifier", &self.classifier)
            .field("tei_url", &self.tei_url.as_ref().map(|_| "[redacted]"))
            .field("model_id", &self.model_id)
            .field("batch_size", &self.batch_size)
            .field("max_input_tokens", &self.max_input_tokens)
            .field("play_base_url", &self.play_base_url)
            .field("fetch_lang", &self.fetch_lang)
            .field("fetch_country", &self.fetch_country)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("export_path", &self.export_path)
            .finish()
    }
}
