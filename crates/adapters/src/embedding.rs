use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderValue};
use serde::Deserialize;

use fsnodes_core::{EmbeddingModel, OpenAiConfig, ProviderError};

use crate::base_url::ensure_openai_base_url_has_v1;
use crate::error::{ensure_success, AdapterError};
use crate::llm::optional_string;

pub struct OpenAiEmbeddingClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model_name: String,
}

impl OpenAiEmbeddingClient {
    pub fn new(profile: &OpenAiConfig, model_name: &str) -> Result<Self, AdapterError> {
        if model_name.trim().is_empty() {
            return Err(AdapterError::InvalidConfig(
                "embedding model_name must not be empty".to_string(),
            ));
        }

        let base_url = ensure_openai_base_url_has_v1(&profile.base_url);
        if base_url.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "base_url must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(profile.timeout.max(1)))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/embeddings", base_url),
            api_key: optional_string(&profile.api_key),
            model_name: model_name.trim().to_string(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f64>>, AdapterError> {
        let mut request = self.client.post(&self.url).header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let payload = serde_json::json!({
            "model": self.model_name,
            "input": inputs,
        });

        debug!(
            "POST {} model={} inputs={}",
            self.url,
            self.model_name,
            inputs.len()
        );
        let response = ensure_success(request.json(&payload).send()?)?;
        let raw: serde_json::Value = response.json()?;
        info!("embedding response: {}", raw);

        let mut parsed: OpenAiEmbeddingResponse = serde_json::from_value(raw)?;
        parsed.data.sort_by_key(|item| item.index);
        let vectors: Vec<Vec<f64>> = parsed.data.into_iter().map(|item| item.embedding).collect();
        if vectors.is_empty() {
            return Err(AdapterError::EmptyResponse);
        }
        Ok(vectors)
    }
}

impl EmbeddingModel for OpenAiEmbeddingClient {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ProviderError> {
        let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.embed(&inputs).map_err(ProviderError::new)
    }

    fn embed_query(&self, text: &str) -> Result<Vec<f64>, ProviderError> {
        let vectors = self.embed(&[text]).map_err(ProviderError::new)?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::new(AdapterError::EmptyResponse))
    }
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    #[serde(default)]
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f64>,
}
