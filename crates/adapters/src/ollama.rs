use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use fsnodes_core::OllamaConfig;

use crate::error::{ensure_success, AdapterError};

pub const DEFAULT_GENERATE_ENDPOINT: &str = "http://localhost:11434/api/generate";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateOptions {
    pub seed: i64,
    pub top_k: i64,
    pub top_p: f64,
    pub temperature: f64,
    pub repeat_penalty: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<&'static str>,
    pub options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Non-streaming client for Ollama's `/api/generate`.
pub struct OllamaClient {
    client: Client,
    endpoint: String,
}

impl OllamaClient {
    pub fn new(config: &OllamaConfig, endpoint: &str) -> Result<Self, AdapterError> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "Ollama api_endpoint must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Returns the trimmed `response` field, which may be empty.
    pub fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, AdapterError> {
        info!(
            "Calling Ollama API at {} with model {}",
            self.endpoint, request.model
        );
        let response = ensure_success(self.client.post(&self.endpoint).json(request).send()?)?;
        let body = response.text()?;
        debug!("Ollama raw body: {}", body);

        let raw: serde_json::Value = serde_json::from_str(&body)?;
        info!("Ollama response received: {}", raw);
        let parsed: GenerateResponse = serde_json::from_value(raw)?;
        Ok(parsed.response.trim().to_string())
    }
}
