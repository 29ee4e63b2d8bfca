#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid API base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
