use serde_json::{json, Value};

use fsnodes_core::{
    collect_hits, EmbeddingModel, HitFilter, InputSchema, InputSpec, Node, NodeContext,
    NodeError, NodeInputs, NodeMetadata, NodeOutput, OutputKind, OutputSpec,
};

use crate::embedding::OpenAiEmbeddingClient;
use crate::error::AdapterError;
use crate::vectorstore::AstraClient;

use super::OPENAI_KEY_MISSING;

const QUERY_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// How the collection is ordered before hits are collected.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SearchMode {
    /// Every record of the conversation, newest first. No embedding call.
    #[default]
    MetadataFilter,
    /// Records of the conversation ordered by similarity to the query.
    Semantic,
}

enum SearchFailure {
    MissingOpenAiKey,
    Provider(AdapterError),
}

impl From<AdapterError> for SearchFailure {
    fn from(err: AdapterError) -> Self {
        SearchFailure::Provider(err)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AstraSearchNode {
    mode: SearchMode,
}

impl AstraSearchNode {
    pub fn with_mode(mode: SearchMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    fn sort_clause(&self, ctx: &NodeContext, query: &str) -> Result<Value, SearchFailure> {
        match self.mode {
            SearchMode::MetadataFilter => Ok(json!({ "timestamp": -1 })),
            SearchMode::Semantic => {
                let profile = &ctx.config().openai;
                if !profile.has_api_key() {
                    return Err(SearchFailure::MissingOpenAiKey);
                }
                let client = OpenAiEmbeddingClient::new(profile, QUERY_EMBEDDING_MODEL)?;
                let vector = client
                    .embed_query(&query.replace('\n', " "))
                    .map_err(AdapterError::from)?;
                Ok(json!({ "$vector": vector }))
            }
        }
    }

    fn search(
        &self,
        ctx: &NodeContext,
        inputs: &SearchInputs<'_>,
        filter: HitFilter,
    ) -> Result<String, SearchFailure> {
        let sort = self.sort_clause(ctx, inputs.query)?;
        let client = AstraClient::new(&ctx.config().astra, inputs.token, inputs.endpoint, None)?;
        let records = client.find(
            inputs.collection,
            &json!({ "conversation_id": inputs.conversation_id }),
            &sort,
        )?;
        let hits = collect_hits(&records, filter);
        Ok(serde_json::to_string(&hits).map_err(AdapterError::from)?)
    }
}

struct SearchInputs<'a> {
    query: &'a str,
    token: &'a str,
    endpoint: &'a str,
    collection: &'a str,
    conversation_id: &'a str,
}

impl Node for AstraSearchNode {
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: "astradb_search",
            display_name: "[FS] AstraDB Search",
            category: "Astra / Search",
            output: OutputSpec {
                name: "results",
                kind: OutputKind::String,
            },
        }
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::new()
            .required(InputSpec::string("search_query").with_default(""))
            .required(InputSpec::string("astradb_token").with_default(""))
            .required(InputSpec::string("astradb_endpoint").with_default(""))
            .required(InputSpec::string("collection_name").with_default(""))
            .required(InputSpec::string("conversation_id").with_default(""))
            .optional(InputSpec::boolean("filter_short_content", false))
    }

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError> {
        let conversation_id = inputs.text("conversation_id")?;
        if conversation_id.is_empty() {
            return Ok(NodeOutput::text("[]"));
        }

        let token = inputs.text("astradb_token")?;
        let endpoint = inputs.text("astradb_endpoint")?;
        if token.trim().is_empty() || endpoint.trim().is_empty() {
            let message = "Error: AstraDB token and endpoint are required";
            ctx.error(message);
            return Ok(NodeOutput::text(message));
        }

        let filter = HitFilter {
            drop_short_content: inputs.boolean("filter_short_content")?,
        };
        let search = SearchInputs {
            query: inputs.text("search_query")?,
            token,
            endpoint,
            collection: inputs.text("collection_name")?,
            conversation_id,
        };

        match self.search(ctx, &search, filter) {
            Ok(json) => {
                ctx.info(json.clone());
                Ok(NodeOutput::Text(json))
            }
            Err(SearchFailure::MissingOpenAiKey) => {
                ctx.info(OPENAI_KEY_MISSING);
                Ok(NodeOutput::text(OPENAI_KEY_MISSING))
            }
            Err(SearchFailure::Provider(err)) => {
                let message = format!("Error during AstraDB search: {}", err);
                ctx.error(message.clone());
                Ok(NodeOutput::Text(message))
            }
        }
    }
}
