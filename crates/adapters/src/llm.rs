use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderValue};
use serde::{Deserialize, Serialize};

use fsnodes_core::{ChatModel, ChatRequest, OpenAiConfig, ProviderError, ResponseFormat};

use crate::base_url::ensure_openai_base_url_has_v1;
use crate::error::{ensure_success, AdapterError};

pub(crate) fn optional_string(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}

/// Chat-completions client for OpenAI and compatible servers.
pub struct OpenAiChatClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl OpenAiChatClient {
    pub fn new(profile: &OpenAiConfig) -> Result<Self, AdapterError> {
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
            url: format!("{}/chat/completions", base_url),
            api_key: optional_string(&profile.api_key),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn send(&self, request: &ChatRequest) -> Result<String, AdapterError> {
        let body = ChatCompletionRequest::from_request(request);

        let mut builder = self.client.post(&self.url).header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        debug!("POST {} model={}", self.url, request.model);
        let response = ensure_success(builder.json(&body).send()?)?;
        let raw: serde_json::Value = response.json()?;
        info!("chat completion response: {}", raw);

        let parsed: ChatCompletionResponse = serde_json::from_value(raw)?;
        first_choice_content(parsed).ok_or(AdapterError::EmptyResponse)
    }
}

impl ChatModel for OpenAiChatClient {
    fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        self.send(request).map_err(ProviderError::new)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessageRequest<'a>>,
    response_format: ResponseFormatRequest,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_request(request: &'a ChatRequest) -> Self {
        Self {
            model: &request.model,
            messages: vec![
                ChatMessageRequest {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessageRequest {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            response_format: ResponseFormatRequest {
                kind: request.response_format,
            },
            temperature: request.temperature,
            top_p: request.top_p,
            // 0 means "let the server decide".
            max_completion_tokens: Some(request.max_completion_tokens).filter(|n| *n > 0),
            presence_penalty: request.presence_penalty,
            frequency_penalty: request.frequency_penalty,
        }
    }
}

#[derive(Serialize)]
struct ChatMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormatRequest {
    #[serde(rename = "type")]
    kind: ResponseFormat,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice_content(response: ChatCompletionResponse) -> Option<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
}
