use fsnodes_core::{
    is_skippable_prompt, EmbeddingModel, InputSchema, InputSpec, Node, NodeContext, NodeError,
    NodeInputs, NodeMetadata, NodeOutput, OutputKind, OutputSpec,
};

use crate::embedding::OpenAiEmbeddingClient;

use super::OPENAI_KEY_MISSING;

const EMBEDDING_MODELS: &[&str] = &[
    "text-embedding-3-small",
    "text-embedding-3-large",
    "text-embedding-ada-002",
];

#[derive(Clone, Copy, Debug, Default)]
pub struct OpenAiEmbeddingNode;

impl Node for OpenAiEmbeddingNode {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: "openai_embedding",
            display_name: "[FS] OpenAI Embedding",
            category: "embedding",
            output: OutputSpec {
                name: "embedding",
                kind: OutputKind::Vector,
            },
        }
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(InputSpec::choice("model", EMBEDDING_MODELS))
            .required(InputSpec::string("input_text").multiline())
    }

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError> {
        let text = inputs.text("input_text")?;
        if is_skippable_prompt(text) {
            return Ok(NodeOutput::Empty);
        }

        let profile = &ctx.config().openai;
        if !profile.has_api_key() {
            ctx.info(OPENAI_KEY_MISSING);
            return Ok(NodeOutput::text(OPENAI_KEY_MISSING));
        }

        let result = OpenAiEmbeddingClient::new(profile, inputs.text("model")?)
            .map_err(|err| err.to_string())
            .and_then(|client| client.embed_query(text).map_err(|err| err.to_string()));

        match result {
            Ok(vector) => {
                ctx.info(format!("embedding with {} dimensions", vector.len()));
                Ok(NodeOutput::Vector(vector))
            }
            Err(message) => {
                let message = format!("Error during API call: {}", message);
                ctx.error(message.clone());
                Ok(NodeOutput::Text(message))
            }
        }
    }
}
