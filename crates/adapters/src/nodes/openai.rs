use fsnodes_core::{
    is_skippable_prompt, ChatRequest, InputSchema, InputSpec, Node, NodeContext, NodeError,
    NodeInputs, NodeMetadata, NodeOutput, OutputKind, OutputSpec, ResponseFormat,
};

use super::run_chat;

pub const OPENAI_CHAT_MODELS: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-0125",
    "gpt-4",
    "gpt-4-turbo",
    "gpt-4o-mini",
    "gpt-4o",
    "o1",
    "o1-mini",
    "o1-preview",
];

const RESPONSE_FORMATS: &[&str] = &["text", "json_object"];
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// General chat completion against `/chat/completions`.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenAiChatNode;

impl Node for OpenAiChatNode {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: "openai",
            display_name: "[FS] OpenAI",
            category: "llm",
            output: OutputSpec {
                name: "response",
                kind: OutputKind::String,
            },
        }
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(InputSpec::choice("model", OPENAI_CHAT_MODELS))
            .required(
                InputSpec::string("system_prompt")
                    .multiline()
                    .with_default(DEFAULT_SYSTEM_PROMPT),
            )
            .required(InputSpec::choice("response_format", RESPONSE_FORMATS))
            .required(InputSpec::float("temperature", 1.0, 0.0, 2.0, 0.01))
            .required(InputSpec::float("top_p", 1.0, 0.0, 1.0, 0.01))
            .required(InputSpec::int("max_completion_tokens", 100, 0, 4000))
            .required(InputSpec::float("presence_penalty", 0.0, -2.0, 2.0, 0.01))
            .required(InputSpec::float("frequency_penalty", 0.0, -2.0, 2.0, 0.01))
            .optional(InputSpec::string("prompt").multiline())
    }

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError> {
        let prompt = inputs.opt_text("prompt").unwrap_or_default();
        if is_skippable_prompt(prompt) {
            return Ok(NodeOutput::Empty);
        }

        let format = inputs.text("response_format")?;
        let response_format = ResponseFormat::parse(format).ok_or_else(|| {
            NodeError::InvalidChoice {
                name: "response_format".to_string(),
                value: format.to_string(),
            }
        })?;

        let request = ChatRequest {
            response_format,
            temperature: inputs.float("temperature")?,
            top_p: Some(inputs.float("top_p")?),
            max_completion_tokens: token_budget(inputs)?,
            presence_penalty: Some(inputs.float("presence_penalty")?),
            frequency_penalty: Some(inputs.float("frequency_penalty")?),
            ..ChatRequest::new(
                inputs.text("model")?,
                inputs.text("system_prompt")?,
                prompt,
            )
        };

        Ok(run_chat(ctx, &request))
    }
}

/// Reads `max_completion_tokens` as the wire type.
pub(crate) fn token_budget(inputs: &NodeInputs) -> Result<u32, NodeError> {
    let value = inputs.int("max_completion_tokens")?;
    u32::try_from(value).map_err(|_| NodeError::OutOfRange {
        name: "max_completion_tokens".to_string(),
        value: value as f64,
        min: 0.0,
        max: u32::MAX as f64,
    })
}
