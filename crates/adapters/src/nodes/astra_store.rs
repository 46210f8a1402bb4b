use std::sync::Arc;

use fsnodes_core::{
    parse_metadata, Document, InputSchema, InputSpec, Node, NodeContext, NodeError, NodeInputs,
    NodeMetadata, NodeOutput, OutputKind, OutputSpec,
};

use crate::embedding::OpenAiEmbeddingClient;
use crate::vectorstore::{endpoint_environment, AstraClient, AstraVectorStore};

const STORE_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Each way a store attempt can stop early, rendered per `silent_errors`.
#[derive(Debug)]
enum StoreFailure {
    NoText,
    NoApiKey,
    Metadata(String),
    Embeddings(String),
    VectorStore(String),
    Store(String),
}

impl StoreFailure {
    fn silent_message(&self) -> String {
        match self {
            StoreFailure::NoText => "No text provided.".to_string(),
            StoreFailure::NoApiKey => {
                "OpenAI API key not set, and silent_errors=True. Skipping embedding...".to_string()
            }
            StoreFailure::Metadata(err) => format!("Invalid metadata JSON. Error: {}", err),
            other => other.hard_message(),
        }
    }

    fn hard_message(&self) -> String {
        match self {
            StoreFailure::NoText => "No text data provided for embeddings.".to_string(),
            StoreFailure::NoApiKey => {
                "OpenAI API key is not set. Provide one or set OPENAI_API_KEY in env.".to_string()
            }
            StoreFailure::Metadata(err) => format!("Failed to parse metadata JSON: {}", err),
            StoreFailure::Embeddings(err) => {
                format!("Failed to initialize OpenAI embeddings: {}", err)
            }
            StoreFailure::VectorStore(err) => {
                format!("Failed to initialize AstraDBVectorStore: {}", err)
            }
            StoreFailure::Store(err) => format!("Failed to store document: {}", err),
        }
    }
}

/// Embeds one text and writes it, with metadata, to an Astra collection.
#[derive(Clone, Copy, Debug, Default)]
pub struct AstraStoreNode;

impl AstraStoreNode {
    fn store(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<usize, StoreFailure> {
        let text = inputs.text("text_data").map_err(|_| StoreFailure::NoText)?;
        if text.trim().is_empty() {
            return Err(StoreFailure::NoText);
        }

        let profile = ctx
            .config()
            .openai
            .with_key_override(inputs.opt_text("openai_api_key"));
        if !profile.has_api_key() {
            return Err(StoreFailure::NoApiKey);
        }

        let metadata = parse_metadata(inputs.opt_text("metadata_json").unwrap_or_default())
            .map_err(|err| StoreFailure::Metadata(err.to_string()))?;

        let embedding = OpenAiEmbeddingClient::new(&profile, STORE_EMBEDDING_MODEL)
            .map_err(|err| StoreFailure::Embeddings(err.to_string()))?;

        let endpoint = inputs.opt_text("astra_api_endpoint").unwrap_or_default();
        ctx.info(format!(
            "Astra endpoint environment: {}",
            endpoint_environment(endpoint)
        ));

        let store = AstraClient::new(
            &ctx.config().astra,
            inputs.opt_text("astra_token").unwrap_or_default(),
            endpoint,
            inputs.opt_text("keyspace"),
        )
        .and_then(|client| {
            AstraVectorStore::new(
                client,
                inputs.opt_text("collection_name").unwrap_or_default(),
                Arc::new(embedding),
            )
        })
        .map_err(|err| StoreFailure::VectorStore(err.to_string()))?;

        let ids = store
            .add_documents(&[Document::new(text, metadata)])
            .map_err(|err| StoreFailure::Store(err.to_string()))?;
        Ok(ids.len())
    }
}

impl Node for AstraStoreNode {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: "astradb_store_embeddings",
            display_name: "[FS] AstraDB Store Embeddings",
            category: "VectorDB",
            output: OutputSpec {
                name: "status",
                kind: OutputKind::String,
            },
        }
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(InputSpec::string("text_data").multiline())
            .required(InputSpec::string("astra_token"))
            .required(InputSpec::string("astra_api_endpoint"))
            .required(InputSpec::string("collection_name"))
            .optional(InputSpec::string("openai_api_key").with_default(""))
            .optional(InputSpec::string("keyspace").with_default(""))
            .optional(InputSpec::string("metadata_json").multiline().with_default("{}"))
            .optional(InputSpec::boolean("silent_errors", true))
    }

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError> {
        let silent = inputs.boolean("silent_errors")?;

        match self.store(ctx, inputs) {
            Ok(count) => {
                let message = format!("Successfully stored {} document(s).", count);
                ctx.info(message.clone());
                Ok(NodeOutput::Text(message))
            }
            Err(failure) if silent => {
                let message = failure.silent_message();
                ctx.warn(message.clone());
                Ok(NodeOutput::Text(message))
            }
            Err(failure) => {
                let message = failure.hard_message();
                ctx.error(message.clone());
                Err(NodeError::Failed(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_messages_do_not_depend_on_mode() {
        let failure = StoreFailure::Store("boom".to_string());
        assert_eq!(failure.silent_message(), "Failed to store document: boom");
        assert_eq!(failure.silent_message(), failure.hard_message());
    }

    #[test]
    fn early_exits_differ_by_mode() {
        assert_eq!(StoreFailure::NoText.silent_message(), "No text provided.");
        assert_eq!(
            StoreFailure::NoText.hard_message(),
            "No text data provided for embeddings."
        );
        let metadata = StoreFailure::Metadata("bad".to_string());
        assert_eq!(metadata.silent_message(), "Invalid metadata JSON. Error: bad");
        assert_eq!(metadata.hard_message(), "Failed to parse metadata JSON: bad");
    }
}
