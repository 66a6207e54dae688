use crate::errors::AppError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Raw response body exactly as the server sent it.
pub type RawDocument = String;

/// HTTP client with bounded retry and connect/read timeouts
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, max_retries: u32) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries,
            timeout,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and return the body, retrying transient failures with
    /// exponential backoff. Only HTTP 200 counts as success.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_text(&self, url: &str) -> Result<RawDocument, AppError> {
        let mut attempt = 0;

        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    info!(attempt = attempt + 1, bytes = body.len(), "Request successful");
                    return Ok(body);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = Duration::from_millis(2_u64.pow(attempt) * 100);
                    warn!(
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Request failed, retrying with exponential backoff"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(attempts = attempt + 1, error = %e, "Request failed");
                    return Err(e);
                }
            }
        }
    }

    // The response is consumed or dropped on every return path, which hands
    // the connection back to the pool.
    async fn fetch_once(&self, url: &str) -> Result<RawDocument, AppError> {
        // Upper bound for connect plus waiting on response headers.
        let response = tokio::time::timeout(self.timeout * 2, self.client.get(url).send())
            .await
            .map_err(|_| AppError::timeout(format!("Request to {} timed out", url)))?
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout(format!("Request to {} timed out", url))
                } else {
                    AppError::NetworkError(e)
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::http(
                status.as_u16(),
                format!("HTTP error: {}", status),
            ));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::timeout(format!("Reading response from {} timed out", url))
            } else {
                AppError::NetworkError(e)
            }
        })
    }
}
