//! Concrete nodes, one per external call.

mod astra_search;
mod astra_store;
mod brand_voice;
mod embedding;
mod ollama;
mod openai;
mod webhook;

pub use astra_search::{AstraSearchNode, SearchMode};
pub use astra_store::AstraStoreNode;
pub use brand_voice::{BrandVoiceNode, BRAND_VOICES};
pub use embedding::OpenAiEmbeddingNode;
pub use ollama::OllamaNode;
pub use openai::OpenAiChatNode;
pub use webhook::WebhookNode;

use fsnodes_core::{ChatModel, ChatRequest, Node, NodeContext, NodeOutput, NodeRegistry};

use crate::llm::OpenAiChatClient;

pub const OPENAI_KEY_MISSING: &str = "OpenAI API key not set";

/// Registry holding every node this crate ships.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.register(boxed::<OpenAiChatNode>);
    registry.register(boxed::<BrandVoiceNode>);
    registry.register(boxed::<OllamaNode>);
    registry.register(boxed::<OpenAiEmbeddingNode>);
    registry.register(boxed::<AstraStoreNode>);
    registry.register(boxed::<AstraSearchNode>);
    registry.register(boxed::<WebhookNode>);
    registry
}

fn boxed<N: Node + Default + 'static>() -> Box<dyn Node> {
    Box::new(N::default())
}

/// Shared body of the two OpenAI chat nodes once the prompt has passed the
/// no-op guard.
pub(crate) fn run_chat(ctx: &NodeContext, request: &ChatRequest) -> NodeOutput {
    let profile = &ctx.config().openai;
    if !profile.has_api_key() {
        ctx.info(OPENAI_KEY_MISSING);
        return NodeOutput::text(OPENAI_KEY_MISSING);
    }

    let result = OpenAiChatClient::new(profile)
        .map_err(|err| err.to_string())
        .and_then(|client| client.complete(request).map_err(|err| err.to_string()));

    match result {
        Ok(content) => {
            let content = content.trim().to_string();
            ctx.info(content.clone());
            NodeOutput::Text(content)
        }
        Err(message) => {
            let message = format!("Error during API call: {}", message);
            ctx.error(message.clone());
            NodeOutput::Text(message)
        }
    }
}
