use fsnodes_core::ProviderError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid adapter configuration: {0}")]
    InvalidConfig(String),
    #[error("unexpected http status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("data api rejected the command: {0}")]
    DataApi(String),
    #[error("vector store operation failed: {0}")]
    VectorStore(String),
    #[error("{0}")]
    Provider(#[from] ProviderError),
    #[error("API returned an empty response")]
    EmptyResponse,
}

impl AdapterError {
    pub fn is_timeout(&self) -> bool {
        match self {
            AdapterError::Http(err) => err.is_timeout(),
            AdapterError::Provider(err) => err
                .downcast_ref::<AdapterError>()
                .map(AdapterError::is_timeout)
                .unwrap_or(false),
            _ => false,
        }
    }
}

pub(crate) fn ensure_success(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, AdapterError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        Err(AdapterError::HttpStatus { status, body })
    }
}
