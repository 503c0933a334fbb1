//! Google Play Store review client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use revsent_core::AppConfig;

use crate::error::SentimentError;
use crate::retry::retry_with_backoff;
use crate::types::RawItem;

use super::google_play_parse::{
    build_request_body, is_valid_app_id, parse_review_page, ReviewPage, RPC_ID,
};
use super::ReviewSource;

/// Largest page the reviews RPC serves in one request.
const MAX_PAGE_SIZE: usize = 199;

/// Guard against continuation tokens that never run out.
const MAX_PAGES: usize = 100;

const DEFAULT_BASE_URL: &str = "https://play.google.com";

/// Client for public Play Store reviews, newest first, in one locale.
///
/// Use [`GooglePlayClient::from_config`] for production or
/// [`GooglePlayClient::new`] with a mock server URL in tests.
pub struct GooglePlayClient {
    client: Client,
    base_url: String,
    lang: String,
    country: String,
    max_retries: u32,
    backoff_base_ms: u64,
    inter_request_delay_ms: u64,
}

impl GooglePlayClient {
    /// Creates a client for `base_url` with locale `en`/`us`, no retries and
    /// no delay between pages.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, SentimentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            lang: "en".to_string(),
            country: "us".to_string(),
            max_retries: 0,
            backoff_base_ms: 0,
            inter_request_delay_ms: 0,
        })
    }

    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, SentimentError> {
        let base_url = if config.play_base_url.is_empty() {
            DEFAULT_BASE_URL
        } else {
            config.play_base_url.as_str()
        };
        Ok(
            Self::new(base_url, config.request_timeout_secs, &config.user_agent)?
                .with_locale(&config.fetch_lang, &config.fetch_country)
                .with_retry(config.max_retries, config.retry_backoff_base_ms)
                .with_inter_request_delay(config.inter_request_delay_ms),
        )
    }

    #[must_use]
    pub fn with_locale(mut self, lang: &str, country: &str) -> Self {
        self.lang = lang.to_string();
        self.country = country.to_string();
        self
    }

    /// `max_retries` additional attempts per page on transient errors.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn with_inter_request_delay(mut self, delay_ms: u64) -> Self {
        self.inter_request_delay_ms = delay_ms;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/_/PlayStoreUi/data/batchexecute", self.base_url)
    }

    /// Fetches one page, retrying transient failures.
    async fn fetch_page(
        &self,
        app_id: &str,
        count: usize,
        token: Option<&str>,
    ) -> Result<Option<ReviewPage>, SentimentError> {
        let url = self.endpoint();
        let form_body = build_request_body(app_id, count, token);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            let form_body = form_body.clone();
            async move {
                let response = self
                    .client
                    .post(&url)
                    .query(&[
                        ("rpcids", RPC_ID),
                        ("hl", self.lang.as_str()),
                        ("gl", self.country.as_str()),
                    ])
                    .form(&[("f.req", form_body.as_str())])
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok());
                    return Err(SentimentError::RateLimited { retry_after_secs });
                }

                if !status.is_success() {
                    return Err(SentimentError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                parse_review_page(&body)
            }
        })
        .await
    }
}

#[async_trait]
impl ReviewSource for GooglePlayClient {
    fn name(&self) -> &'static str {
        "google_play"
    }

    /// Pages through reviews until `limit` is reached or the store runs out.
    ///
    /// **All-or-nothing semantics**: a failure on any page discards reviews
    /// from earlier pages and returns the error.
    async fn fetch_reviews(
        &self,
        source_id: &str,
        limit: usize,
    ) -> Result<Vec<RawItem>, SentimentError> {
        if !is_valid_app_id(source_id) {
            return Err(SentimentError::InvalidSourceId(source_id.to_string()));
        }

        let mut items: Vec<RawItem> = Vec::new();
        let mut token: Option<String> = None;

        for page_index in 0..MAX_PAGES {
            let remaining = limit.saturating_sub(items.len());
            if remaining == 0 {
                break;
            }

            if page_index > 0 && self.inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.inter_request_delay_ms)).await;
            }

            let count = remaining.min(MAX_PAGE_SIZE);
            let Some(page) = self.fetch_page(source_id, count, token.as_deref()).await? else {
                if page_index == 0 {
                    return Err(SentimentError::SourceNotFound {
                        source_id: source_id.to_string(),
                    });
                }
                break;
            };

            tracing::debug!(
                source_id,
                page = page_index,
                entries = page.entries,
                texts = page.texts.len(),
                "fetched review page"
            );

            items.extend(page.texts.into_iter().map(RawItem::new));

            if page.entries == 0 {
                break;
            }
            token = page.next_token;
            if token.is_none() {
                break;
            }
        }

        items.truncate(limit);
        Ok(items)
    }
}
