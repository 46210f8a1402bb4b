#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use fsnodes_core::{Config, InputValue, LogLevel, NodeContext, VecLogSink};

pub const TEST_KEY: &str = "sk-test";

/// Config whose OpenAI traffic goes to `base_url` with the test key.
pub fn openai_config(base_url: &str) -> Config {
    let mut config = Config::new();
    config.openai.api_key = TEST_KEY.to_string();
    config.openai.base_url = base_url.to_string();
    config.openai.timeout = 5;
    config.astra.timeout = 5;
    config.webhook.timeout = 5;
    config.ollama.timeout = 5;
    config
}

/// Config with every credential blank.
pub fn keyless_config(base_url: &str) -> Config {
    let mut config = openai_config(base_url);
    config.openai.api_key.clear();
    config
}

pub fn context(config: Config) -> (NodeContext, Arc<VecLogSink>) {
    let sink = Arc::new(VecLogSink::new());
    (NodeContext::new(config, sink.clone()), sink)
}

pub fn inputs(pairs: &[(&str, InputValue)]) -> BTreeMap<String, InputValue> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

pub fn error_messages(sink: &VecLogSink) -> Vec<String> {
    sink.records()
        .into_iter()
        .filter(|record| record.level == LogLevel::Error)
        .map(|record| record.message)
        .collect()
}
