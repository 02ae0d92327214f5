use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Task join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Why a single probe attempt did not produce a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("cancelled before dispatch")]
    Cancelled,
}

impl ProbeFailure {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProbeFailure::Cancelled)
    }
}

impl From<reqwest::Error> for ProbeFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProbeFailure::Timeout
        } else {
            ProbeFailure::Transport(e.to_string())
        }
    }
}
