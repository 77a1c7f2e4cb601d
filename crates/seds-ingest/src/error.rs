use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// An element the page layout guarantees is missing. Fatal for that page only.
    #[error("malformed source {page}: {what} not found")]
    MalformedSource { page: String, what: &'static str },

    #[error("request timed out: {url}")]
    FetchTimeout { url: String },

    #[error("request failed: {url}: {message}")]
    FetchFailure { url: String, message: String },

    #[error("server returned {status} for {url}")]
    Server { status: u16, url: String },

    #[error("no EIA API key configured")]
    MissingApiKey,

    #[error("invalid CSS selector {0:?}")]
    Selector(&'static str),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub(crate) fn malformed(page: impl Into<String>, what: &'static str) -> Self {
        IngestError::MalformedSource {
            page: page.into(),
            what,
        }
    }

    /// Whether the error only affects one source, so a batch run can move on.
    pub fn is_source_local(&self) -> bool {
        matches!(
            self,
            IngestError::MalformedSource { .. }
                | IngestError::FetchTimeout { .. }
                | IngestError::FetchFailure { .. }
                | IngestError::Server { .. }
                | IngestError::Json(_)
        )
    }
}
