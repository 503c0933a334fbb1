use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("rate limited by review source")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("malformed response for {context}: {reason}")]
    MalformedResponse { context: String, reason: String },

    #[error("invalid source identifier \"{0}\"")]
    InvalidSourceId(String),

    #[error("no reviews payload returned for \"{source_id}\" (unknown app or no public reviews)")]
    SourceNotFound { source_id: String },

    #[error("classifier initialization failed: {0}")]
    ClassifierInit(String),

    #[error("TEI error: {0}")]
    Tei(String),

    #[error("classifier contract violation: {0}")]
    ClassifierContract(String),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
