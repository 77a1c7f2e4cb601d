//! Blocking HTTP fetcher for EIA pages and the series API.

use std::time::Duration;

use tracing::debug;

use crate::api::redact;
use crate::{Fetch, IngestError};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("seds/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, IngestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| IngestError::FetchFailure {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn get_text(&self, url: &str) -> Result<String, IngestError> {
        let shown = redact(url);
        debug!(url = %shown, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| request_error(&shown, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::Server {
                status: status.as_u16(),
                url: shown,
            });
        }
        resp.text().map_err(|e| request_error(&shown, e))
    }
}

fn request_error(url: &str, err: reqwest::Error) -> IngestError {
    if err.is_timeout() {
        IngestError::FetchTimeout {
            url: url.to_string(),
        }
    } else {
        // reqwest embeds the request URL in its message; strip it with the key.
        IngestError::FetchFailure {
            url: url.to_string(),
            message: redact(&err.without_url().to_string()),
        }
    }
}
