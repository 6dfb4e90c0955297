use crate::domain::AuditTarget;
use crate::error::{AuditError, ServiceError};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Pages larger than this are not audited.
pub const DEFAULT_MAX_PAGE_BYTES: usize = 5 * 1024 * 1024;

/// A downloaded page.
#[derive(Debug)]
pub struct FetchedPage {
    /// URL after redirects
    pub url: Url,
    pub body: String,
}

/// HTTP client for audit targets. Bare hosts are tried over https first and
/// retried over plain http when the https attempt fails to connect.
pub struct PageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_page_bytes: usize,
}

impl PageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout,
            max_page_bytes: DEFAULT_MAX_PAGE_BYTES,
        })
    }

    #[must_use]
    pub fn with_max_page_bytes(mut self, max_page_bytes: usize) -> Self {
        self.max_page_bytes = max_page_bytes;
        self
    }

    pub async fn fetch(&self, target: &AuditTarget) -> Result<FetchedPage, AuditError> {
        let mut candidates = target.candidates().peekable();

        while let Some(url) = candidates.next() {
            let mut response = match self.client.get(url.clone()).send().await {
                Ok(response) => response,
                Err(e) if e.is_timeout() => {
                    return Err(AuditError::Timeout {
                        target: url.to_string(),
                        seconds: self.timeout.as_secs(),
                    });
                }
                Err(e) => {
                    if candidates.peek().is_some() {
                        warn!(url = %url, error = %e, "Fetch failed, trying fallback");
                        continue;
                    }
                    return Err(AuditError::Fetch {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            };

            let status = response.status();
            let final_url = response.url().clone();
            if !status.is_success() {
                return Err(AuditError::Fetch {
                    url: final_url.to_string(),
                    reason: format!("HTTP {status}"),
                });
            }

            let too_large = || AuditError::Fetch {
                url: final_url.to_string(),
                reason: format!("page exceeds {} bytes", self.max_page_bytes),
            };
            if response
                .content_length()
                .is_some_and(|len| len > self.max_page_bytes as u64)
            {
                return Err(too_large());
            }

            let mut buf = Vec::new();
            while let Some(chunk) = response.chunk().await.map_err(|e| AuditError::Fetch {
                url: final_url.to_string(),
                reason: e.to_string(),
            })? {
                if buf.len() + chunk.len() > self.max_page_bytes {
                    return Err(too_large());
                }
                buf.extend_from_slice(&chunk);
            }
            let body = String::from_utf8_lossy(&buf).into_owned();
            debug!(url = %final_url, bytes = body.len(), "Fetched page");

            return Ok(FetchedPage {
                url: final_url,
                body,
            });
        }

        Err(AuditError::Fetch {
            url: target.to_string(),
            reason: "no candidate URL".to_string(),
        })
    }
}
