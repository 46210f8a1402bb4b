use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use fsnodes_core::WebhookConfig;

use crate::error::{ensure_success, AdapterError};

/// `{property_name: property_value}`, plus `identifier` when one is given.
pub fn webhook_payload(
    property_name: &str,
    property_value: &str,
    identifier: Option<&str>,
) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert(
        property_name.to_string(),
        Value::String(property_value.to_string()),
    );
    if let Some(identifier) = identifier.filter(|id| !id.is_empty()) {
        payload.insert(
            "identifier".to_string(),
            Value::String(identifier.to_string()),
        );
    }
    payload
}

pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(config: &WebhookConfig) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;
        Ok(Self { client })
    }

    /// Non-2xx responses come back as [`AdapterError::HttpStatus`].
    pub fn post(&self, url: &str, payload: &Map<String, Value>) -> Result<StatusCode, AdapterError> {
        info!("Sending to webhook {}", url);
        let response = ensure_success(self.client.post(url).json(payload).send()?)?;
        let status = response.status();
        debug!("webhook {} answered {}", url, status);
        Ok(status)
    }
}
