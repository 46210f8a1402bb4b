use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{self, HeaderValue};
use serde_json::{json, Value};
use uuid::Uuid;

use fsnodes_core::{AstraConfig, Document, EmbeddingModel};

use crate::error::{ensure_success, AdapterError};

const DATA_API_PATH: &str = "api/json/v1";

static ASTRA_ENDPOINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https://([0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12})-([a-z0-9-]+)\.apps\.astra(-dev|-test)?\.datastax\.com/?$",
    )
    .unwrap()
});

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AstraEnvironment {
    Prod,
    Dev,
    Test,
    /// Self-hosted Data API deployments and anything not on an Astra domain.
    Other,
}

impl AstraEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AstraEnvironment::Prod => "prod",
            AstraEnvironment::Dev => "dev",
            AstraEnvironment::Test => "test",
            AstraEnvironment::Other => "other",
        }
    }
}

impl fmt::Display for AstraEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedApiEndpoint {
    pub database_id: String,
    pub region: String,
    pub environment: AstraEnvironment,
}

/// Splits an Astra endpoint into database id, region and environment.
/// Returns `None` for endpoints outside the Astra domains.
pub fn parse_api_endpoint(endpoint: &str) -> Option<ParsedApiEndpoint> {
    let captures = ASTRA_ENDPOINT_RE.captures(endpoint.trim())?;
    let environment = match captures.get(3).map(|m| m.as_str()) {
        Some("-dev") => AstraEnvironment::Dev,
        Some("-test") => AstraEnvironment::Test,
        _ => AstraEnvironment::Prod,
    };
    Some(ParsedApiEndpoint {
        database_id: captures[1].to_lowercase(),
        region: captures[2].to_string(),
        environment,
    })
}

pub fn endpoint_environment(endpoint: &str) -> AstraEnvironment {
    parse_api_endpoint(endpoint)
        .map(|parsed| parsed.environment)
        .unwrap_or(AstraEnvironment::Other)
}

/// Thin client for the Data API command endpoints of one keyspace.
pub struct AstraClient {
    client: Client,
    keyspace_url: String,
    keyspace: String,
    token: String,
    environment: AstraEnvironment,
}

impl AstraClient {
    pub fn new(
        config: &AstraConfig,
        token: &str,
        api_endpoint: &str,
        keyspace: Option<&str>,
    ) -> Result<Self, AdapterError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "astra token must not be empty".to_string(),
            ));
        }

        let endpoint = api_endpoint.trim().trim_end_matches('/');
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(AdapterError::InvalidConfig(format!(
                "astra api endpoint must be an http(s) URL, got `{}`",
                api_endpoint
            )));
        }

        let keyspace = keyspace
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(config.default_keyspace.as_str())
            .to_string();
        if keyspace.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "astra keyspace must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;

        Ok(Self {
            client,
            keyspace_url: format!("{}/{}/{}", endpoint, DATA_API_PATH, keyspace),
            keyspace,
            token: token.to_string(),
            environment: endpoint_environment(endpoint),
        })
    }

    pub fn environment(&self) -> AstraEnvironment {
        self.environment
    }

    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Idempotent for an existing collection with the same vector options.
    pub fn create_vector_collection(&self, name: &str, dimension: usize) -> Result<(), AdapterError> {
        self.command(
            None,
            &json!({
                "createCollection": {
                    "name": name,
                    "options": {
                        "vector": {
                            "dimension": dimension,
                            "metric": "cosine"
                        }
                    }
                }
            }),
        )?;
        Ok(())
    }

    pub fn insert_many(
        &self,
        collection: &str,
        documents: &[Value],
    ) -> Result<Vec<String>, AdapterError> {
        let value = self.command(
            Some(collection),
            &json!({ "insertMany": { "documents": documents } }),
        )?;
        let ids = value
            .get("status")
            .and_then(|status| status.get("insertedIds"))
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .map(|id| id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    /// Runs `find` and follows `nextPageState` until the cursor is exhausted.
    pub fn find(
        &self,
        collection: &str,
        filter: &Value,
        sort: &Value,
    ) -> Result<Vec<Value>, AdapterError> {
        let mut documents = Vec::new();
        let mut page_state: Option<String> = None;

        loop {
            let mut find = json!({ "filter": filter, "sort": sort });
            if let Some(state) = &page_state {
                find["options"] = json!({ "pageState": state });
            }

            let value = self.command(Some(collection), &json!({ "find": find }))?;
            let data = value.get("data");
            if let Some(page) = data
                .and_then(|d| d.get("documents"))
                .and_then(Value::as_array)
            {
                for document in page {
                    info!("Found document: {}", document);
                }
                documents.extend(page.iter().cloned());
            }

            let next = data
                .and_then(|d| d.get("nextPageState"))
                .and_then(Value::as_str)
                .map(str::to_string);
            if next.is_none() || next == page_state {
                break;
            }
            page_state = next;
        }

        Ok(documents)
    }

    fn command(&self, collection: Option<&str>, body: &Value) -> Result<Value, AdapterError> {
        let url = match collection {
            Some(name) => format!("{}/{}", self.keyspace_url, name),
            None => self.keyspace_url.clone(),
        };

        debug!("POST {} {}", url, body);
        let token = HeaderValue::from_str(&self.token).map_err(|err| {
            AdapterError::InvalidConfig(format!("invalid astra token header: {}", err))
        })?;
        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header("Token", token)
            .json(body)
            .send()?;
        let value: Value = ensure_success(response)?.json()?;
        debug!("Data API response: {}", value);

        if let Some(errors) = value.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let messages: Vec<String> = errors
                    .iter()
                    .map(|err| {
                        err.get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| err.to_string())
                    })
                    .collect();
                return Err(AdapterError::DataApi(messages.join("; ")));
            }
        }

        Ok(value)
    }
}

/// A vector-backed collection whose documents are embedded on insert.
pub struct AstraVectorStore {
    client: AstraClient,
    collection: String,
    embedding: Arc<dyn EmbeddingModel>,
}

impl AstraVectorStore {
    pub fn new(
        client: AstraClient,
        collection_name: &str,
        embedding: Arc<dyn EmbeddingModel>,
    ) -> Result<Self, AdapterError> {
        let collection = collection_name.trim();
        if collection.is_empty() {
            return Err(AdapterError::InvalidConfig(
                "collection_name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            client,
            collection: collection.to_string(),
            embedding,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn client(&self) -> &AstraClient {
        &self.client
    }

    /// Embeds and inserts `documents`; returns the ids the store reports.
    pub fn add_documents(&self, documents: &[Document]) -> Result<Vec<String>, AdapterError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents.iter().map(|doc| doc.content.clone()).collect();
        let vectors = self.embedding.embed_documents(&texts)?;
        if vectors.len() != documents.len() {
            return Err(AdapterError::VectorStore(format!(
                "embedding model returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(AdapterError::VectorStore(
                "embedding model returned zero-dimension vectors".to_string(),
            ));
        }

        self.client
            .create_vector_collection(&self.collection, dimension)?;

        let records: Vec<Value> = documents
            .iter()
            .zip(vectors)
            .map(|(document, vector)| {
                json!({
                    "_id": Uuid::new_v4().to_string(),
                    "content": document.content,
                    "metadata": document.metadata,
                    "$vector": vector,
                })
            })
            .collect();

        let ids = self.client.insert_many(&self.collection, &records)?;
        info!(
            "stored {} document(s) in {}.{}",
            ids.len(),
            self.client.keyspace(),
            self.collection
        );
        Ok(ids)
    }
}
