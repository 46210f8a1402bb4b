mod base_url;
mod embedding;
mod error;
mod llm;
mod nodes;
mod ollama;
mod vectorstore;
mod webhook;

pub use base_url::ensure_openai_base_url_has_v1;
pub use embedding::OpenAiEmbeddingClient;
pub use error::AdapterError;
pub use llm::OpenAiChatClient;
pub use nodes::{
    builtin_registry, AstraSearchNode, AstraStoreNode, BrandVoiceNode, OllamaNode,
    OpenAiChatNode, OpenAiEmbeddingNode, SearchMode, WebhookNode, BRAND_VOICES,
    OPENAI_KEY_MISSING,
};
pub use ollama::{GenerateOptions, GenerateRequest, OllamaClient, DEFAULT_GENERATE_ENDPOINT};
pub use vectorstore::{
    endpoint_environment, parse_api_endpoint, AstraClient, AstraEnvironment, AstraVectorStore,
    ParsedApiEndpoint,
};
pub use webhook::{webhook_payload, WebhookClient};

pub use fsnodes_core::{Config, Node, NodeContext, NodeOutput, NodeRegistry};
