//! JSON GET client with bounded retries

use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::provider::error::FetchError;

/// Header carrying the CurseForge API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP client for one provider.
///
/// Every transport failure, non-2xx status or unparseable body consumes one
/// attempt. After `max_attempts` the request fails with
/// [`FetchError::RetriesExhausted`].
#[derive(Clone)]
pub struct FetchClient {
    client: reqwest::Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl FetchClient {
    /// Client without credentials
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        Self::build(config, HeaderMap::new())
    }

    /// Client that sends `api_key` in the `x-api-key` header on every request
    pub fn with_api_key(config: &HttpConfig, api_key: &str) -> Result<Self, FetchError> {
        let mut value = HeaderValue::from_str(api_key).map_err(|_| FetchError::InvalidApiKey)?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        Self::build(config, headers)
    }

    fn build(config: &HttpConfig, mut headers: HeaderMap) -> Result<Self, FetchError> {
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .user_agent(format!("modcompat/{}", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
        })
    }

    /// GET `url` with `params` appended as the query string and parse the body as JSON
    pub async fn fetch(&self, url: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
        let request_url = build_url(url, params)?;
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            match self.try_fetch(&request_url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(
                        "Request to {} failed: {}. Retrying ({}/{})...",
                        request_url, e, attempt, self.max_attempts
                    );
                    last_error = e;
                }
            }

            if attempt < self.max_attempts && !self.retry_delay.is_zero() {
                sleep(self.retry_delay * attempt).await;
            }
        }

        Err(FetchError::RetriesExhausted {
            url: request_url.to_string(),
            attempts: self.max_attempts,
            last_error,
        })
    }

    async fn try_fetch(&self, url: &Url) -> Result<Value, String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Unexpected status: {}", status));
        }

        let body = response.text().await.map_err(|e| e.to_string())?;
        serde_json::from_str(&body).map_err(|e| format!("Invalid JSON body: {}", e))
    }
}

fn build_url(url: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
    let pairs = params.iter().map(|(k, v)| (*k, v.as_str()));
    let parsed = if params.is_empty() {
        Url::parse(url)
    } else {
        Url::parse_with_params(url, pairs)
    };

    parsed.map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
