pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod providers;
pub mod registry;
pub mod vectorstore;

pub use config::{
    AstraConfig, Config, ConfigError, OllamaConfig, OpenAiConfig, WebhookConfig,
    OPENAI_API_KEY_ENV, OPENAI_BASE_URL_ENV,
};
pub use error::{NodeError, ProviderError};
pub use logging::{
    LogCrateSink, LogLevel, LogRecord, LogSink, NullLogSink, SharedLogSink, VecLogSink,
};
pub use node::{
    is_skippable_prompt, InputKind, InputSchema, InputSpec, InputValue, Node, NodeContext,
    NodeInputs, NodeMetadata, NodeOutput, OutputKind, OutputSpec, EXIT_SENTINEL,
};
pub use providers::{ChatModel, ChatRequest, EmbeddingModel, ResponseFormat};
pub use registry::{NodeFactory, NodeRegistry};
pub use vectorstore::{
    collect_hits, parse_metadata, Document, HitFilter, MetadataError, SearchHit,
    MIN_CONTENT_CHARS,
};
