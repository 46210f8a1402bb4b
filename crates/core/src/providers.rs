use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

pub trait EmbeddingModel: Send + Sync {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ProviderError>;

    fn embed_query(&self, text: &str) -> Result<Vec<f64>, ProviderError>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

impl ResponseFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "json_object" => Some(Self::JsonObject),
            _ => None,
        }
    }
}

/// One system + user exchange with its sampling parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system_prompt: String,
    pub prompt: String,
    pub response_format: ResponseFormat,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub max_completion_tokens: u32,
    pub presence_penalty: Option<f64>,
    pub frequency_penalty: Option<f64>,
}

impl ChatRequest {
    pub fn new(
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            prompt: prompt.into(),
            response_format: ResponseFormat::Text,
            temperature: 1.0,
            top_p: None,
            max_completion_tokens: 100,
            presence_penalty: None,
            frequency_penalty: None,
        }
    }
}

pub trait ChatModel: Send + Sync {
    /// Returns the first choice's content, untrimmed.
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}
