use crate::config::ScraperConfig;
use crate::error::FetchError;
use crate::scraper::PageSource;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

pub struct HttpClient {
    inner: reqwest::Client,
    request_delay_ms: u64,
    jitter_ms: u64,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(config: &ScraperConfig) -> Result<Self, FetchError> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .map_err(|source| FetchError::Request {
                url: String::new(),
                source,
            })?;

        Ok(Self {
            inner,
            request_delay_ms: config.request_delay_ms,
            jitter_ms: config.jitter_ms,
            max_retries: config.max_retries,
        })
    }

    /// Sleep for the configured delay + random jitter.
    async fn polite_delay(&self) {
        let jitter = rand::rng().random_range(0..=self.jitter_ms);
        sleep(Duration::from_millis(self.request_delay_ms.saturating_add(jitter))).await;
    }

    /// Doubles per attempt and saturates instead of overflowing.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.request_delay_ms.max(100).saturating_mul(factor))
    }
}

#[async_trait]
impl PageSource for HttpClient {
    /// Fetch a URL as text with rate-limiting and retry.
    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        self.polite_delay().await;

        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            debug!("GET {} (attempt {})", url, attempt);
            let retries_left = attempt <= self.max_retries;

            match self.inner.get(url.as_str()).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.text().await.map_err(|source| FetchError::Request {
                            url: url.to_string(),
                            source,
                        });
                    }

                    let err = FetchError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    };
                    // Only 429 and 503 are worth another try
                    let throttled = status.as_u16() == 429 || status.as_u16() == 503;
                    if !throttled || !retries_left {
                        return Err(err);
                    }
                    let backoff = self.backoff(attempt);
                    warn!("Rate limited ({}) on attempt {}, sleeping {:?}", status, attempt, backoff);
                    sleep(backoff).await;
                }
                Err(source) => {
                    if !retries_left {
                        return Err(FetchError::Request {
                            url: url.to_string(),
                            source,
                        });
                    }
                    let backoff = self.backoff(attempt);
                    warn!("Request failed on attempt {}: {}", attempt, source);
                    sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let client = HttpClient::new(&ScraperConfig {
            request_delay_ms: 500,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.backoff(1), Duration::from_millis(1000));
        assert_eq!(client.backoff(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_saturates_on_large_attempts() {
        let client = HttpClient::new(&ScraperConfig {
            request_delay_ms: u64::MAX / 2,
            ..Default::default()
        })
        .unwrap();
        let ceiling = Duration::from_millis(u64::MAX);
        assert_eq!(client.backoff(64), ceiling);
        assert_eq!(client.backoff(u32::MAX), ceiling);
        assert_eq!(client.backoff(2), ceiling);
        assert!(client.backoff(1) < ceiling);
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        let client = HttpClient::new(&ScraperConfig {
            request_delay_ms: 0,
            jitter_ms: 0,
            max_retries: 0,
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        let url = Url::parse("http://127.0.0.1:9/member.php").unwrap();
        let err = client.get_text(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
