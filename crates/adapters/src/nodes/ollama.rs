use fsnodes_core::{
    InputSchema, InputSpec, Node, NodeContext, NodeError, NodeInputs, NodeMetadata, NodeOutput,
    OutputKind, OutputSpec, EXIT_SENTINEL,
};

use crate::error::AdapterError;
use crate::ollama::{GenerateOptions, GenerateRequest, OllamaClient, DEFAULT_GENERATE_ENDPOINT};

const OLLAMA_MODELS: &[&str] = &["llama3.1:8b-instruct-q8_0", "mistral:7b", "deepseek-r1:8b"];
const RESPONSE_FORMATS: &[&str] = &["text", "json"];

/// Local generation through an Ollama server.
#[derive(Clone, Copy, Debug, Default)]
pub struct OllamaNode;

impl Node for OllamaNode {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: "ollama",
            display_name: "[FS] Ollama",
            category: "llm",
            output: OutputSpec {
                name: "response",
                kind: OutputKind::String,
            },
        }
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(InputSpec::string("api_endpoint").with_default(DEFAULT_GENERATE_ENDPOINT))
            .required(InputSpec::choice("model", OLLAMA_MODELS))
            .required(InputSpec::choice("response_format", RESPONSE_FORMATS))
            .required(InputSpec::float("temperature", 0.8, 0.0, 2.0, 0.01))
            .optional(InputSpec::string("prompt").multiline())
            .optional(InputSpec::string("system_prompt").multiline().with_default(""))
            .optional(InputSpec::int("seed", 42, 0, 999_999))
            .optional(InputSpec::int("top_k", 20, 0, 100))
            .optional(InputSpec::float("top_p", 0.9, 0.0, 1.0, 0.01))
            .optional(InputSpec::float("repeat_penalty", 1.1, 0.0, 2.0, 0.01))
    }

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError> {
        let prompt = inputs.opt_text("prompt").unwrap_or_default();
        if prompt.trim().is_empty() || prompt == EXIT_SENTINEL {
            return Ok(NodeOutput::Empty);
        }

        let system = inputs
            .opt_text("system_prompt")
            .filter(|system| !system.trim().is_empty());
        let format = match inputs.text("response_format")? {
            "json" => Some("json"),
            _ => None,
        };

        let request = GenerateRequest {
            model: inputs.text("model")?,
            prompt,
            stream: false,
            system,
            format,
            options: GenerateOptions {
                seed: inputs.int("seed")?,
                top_k: inputs.int("top_k")?,
                top_p: inputs.float("top_p")?,
                temperature: inputs.float("temperature")?,
                repeat_penalty: inputs.float("repeat_penalty")?,
            },
        };

        let result = OllamaClient::new(&ctx.config().ollama, inputs.text("api_endpoint")?)
            .and_then(|client| client.generate(&request));

        let message = match result {
            Ok(response) if !response.is_empty() => {
                ctx.info(format!("Ollama response: {}", response));
                return Ok(NodeOutput::Text(response));
            }
            Ok(_) => "No response received from Ollama API".to_string(),
            Err(err) => failure_message(&err),
        };
        ctx.error(message.clone());
        Ok(NodeOutput::Text(message))
    }
}

fn failure_message(err: &AdapterError) -> String {
    if err.is_timeout() {
        return "Request to Ollama API timed out".to_string();
    }
    match err {
        AdapterError::Json(_) => format!("Unexpected error: {}", err),
        _ => format!("Error during Ollama API call: {}", err),
    }
}
