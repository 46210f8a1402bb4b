mod common;

use std::sync::{Arc, Mutex};

use fsnodes_adapters::{
    AstraClient, AstraSearchNode, AstraStoreNode, AstraVectorStore, SearchMode,
    OPENAI_KEY_MISSING,
};
use fsnodes_core::{
    AstraConfig, Document, EmbeddingModel, InputValue, Node, NodeError, ProviderError,
};
use mockito::{Matcher, Server};
use serde_json::{json, Map, Value};

use common::{context, inputs, keyless_config, openai_config};

const KEYSPACE_PATH: &str = "/api/json/v1/default_keyspace";
const COLLECTION_PATH: &str = "/api/json/v1/default_keyspace/chat_history";

fn store_inputs(endpoint: &str, text: &str, metadata: &str, silent: bool) -> Vec<(&'static str, InputValue)> {
    vec![
        ("text_data", text.into()),
        ("astra_token", "AstraCS:test".into()),
        ("astra_api_endpoint", endpoint.into()),
        ("collection_name", "chat_history".into()),
        ("metadata_json", metadata.into()),
        ("silent_errors", silent.into()),
    ]
}

fn embedding_response(vector: &[f64]) -> String {
    json!({
        "object": "list",
        "data": [{"object": "embedding", "index": 0, "embedding": vector}],
        "model": "text-embedding-ada-002"
    })
    .to_string()
}

#[test]
fn store_embeds_creates_collection_and_inserts() {
    let mut server = Server::new();
    let embed = server
        .mock("POST", "/v1/embeddings")
        .match_body(Matcher::PartialJson(json!({
            "model": "text-embedding-ada-002",
            "input": ["The user prefers tea."]
        })))
        .with_status(200)
        .with_body(embedding_response(&[0.5, 0.25, 0.125]))
        .expect(1)
        .create();
    let create = server
        .mock("POST", KEYSPACE_PATH)
        .match_header("token", "AstraCS:test")
        .match_body(Matcher::PartialJson(json!({
            "createCollection": {
                "name": "chat_history",
                "options": {"vector": {"dimension": 3, "metric": "cosine"}}
            }
        })))
        .with_status(200)
        .with_body(r#"{"status": {"ok": 1}}"#)
        .expect(1)
        .create();
    let insert = server
        .mock("POST", COLLECTION_PATH)
        .match_header("token", "AstraCS:test")
        .match_body(Matcher::PartialJson(json!({
            "insertMany": {
                "documents": [{
                    "content": "The user prefers tea.",
                    "metadata": {"conversation_id": "c-1", "timestamp": 7},
                    "$vector": [0.5, 0.25, 0.125]
                }]
            }
        })))
        .with_status(200)
        .with_body(r#"{"status": {"insertedIds": ["doc-1"]}}"#)
        .expect(1)
        .create();

    let (ctx, _sink) = context(openai_config(&server.url()));
    let output = AstraStoreNode
        .run(
            &ctx,
            &inputs(&store_inputs(
                &server.url(),
                "The user prefers tea.",
                r#"{"conversation_id": "c-1", "timestamp": 7}"#,
                true,
            )),
        )
        .unwrap();

    assert_eq!(output.as_text(), Some("Successfully stored 1 document(s)."));
    embed.assert();
    create.assert();
    insert.assert();
}

#[test]
fn store_bad_metadata_silent_returns_message_without_calls() {
    let mut server = Server::new();
    let mock = server.mock("POST", Matcher::Any).expect(0).create();

    let (ctx, _sink) = context(openai_config(&server.url()));
    let output = AstraStoreNode
        .run(
            &ctx,
            &inputs(&store_inputs(&server.url(), "hello", "{not json", true)),
        )
        .unwrap();

    let text = output.as_text().unwrap();
    assert!(text.starts_with("Invalid metadata JSON. Error: "), "{text}");
    mock.assert();
}

#[test]
fn store_bad_metadata_hard_fails_without_calls() {
    let mut server = Server::new();
    let mock = server.mock("POST", Matcher::Any).expect(0).create();

    let (ctx, _sink) = context(openai_config(&server.url()));
    let err = AstraStoreNode
        .run(
            &ctx,
            &inputs(&store_inputs(&server.url(), "hello", "[1, 2]", false)),
        )
        .unwrap_err();

    match err {
        NodeError::Failed(message) => {
            assert!(message.starts_with("Failed to parse metadata JSON: "), "{message}")
        }
        other => panic!("expected a hard failure, got {other:?}"),
    }
    mock.assert();
}

#[test]
fn store_early_exits_follow_silent_flag() {
    let mut server = Server::new();
    let mock = server.mock("POST", Matcher::Any).expect(0).create();

    let (ctx, _sink) = context(openai_config(&server.url()));
    let output = AstraStoreNode
        .run(&ctx, &inputs(&store_inputs(&server.url(), "   ", "{}", true)))
        .unwrap();
    assert_eq!(output.as_text(), Some("No text provided."));

    let err = AstraStoreNode
        .run(&ctx, &inputs(&store_inputs(&server.url(), "", "{}", false)))
        .unwrap_err();
    assert_eq!(err.to_string(), "No text data provided for embeddings.");

    let (ctx, _sink) = context(keyless_config(&server.url()));
    let output = AstraStoreNode
        .run(&ctx, &inputs(&store_inputs(&server.url(), "hello", "{}", true)))
        .unwrap();
    assert_eq!(
        output.as_text(),
        Some("OpenAI API key not set, and silent_errors=True. Skipping embedding...")
    );

    let err = AstraStoreNode
        .run(&ctx, &inputs(&store_inputs(&server.url(), "hello", "{}", false)))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "OpenAI API key is not set. Provide one or set OPENAI_API_KEY in env."
    );
    mock.assert();
}

#[test]
fn store_key_override_is_used_for_embedding() {
    let mut server = Server::new();
    let embed = server
        .mock("POST", "/v1/embeddings")
        .match_header("authorization", "Bearer sk-override")
        .with_status(500)
        .with_body("quota exceeded")
        .expect(1)
        .create();

    let (ctx, _sink) = context(keyless_config(&server.url()));
    let mut values = store_inputs(&server.url(), "hello", "{}", true);
    values.push(("openai_api_key", "sk-override".into()));
    let output = AstraStoreNode.run(&ctx, &inputs(&values)).unwrap();

    let text = output.as_text().unwrap();
    assert!(text.starts_with("Failed to store document: "), "{text}");
    assert!(text.contains("quota exceeded"));
    assert!(ctx.config().openai.api_key.is_empty());
    embed.assert();
}

#[test]
fn store_invalid_endpoint_is_an_init_failure() {
    let (ctx, _sink) = context(openai_config("http://127.0.0.1:1"));
    let output = AstraStoreNode
        .run(&ctx, &inputs(&store_inputs("ftp://astra", "hello", "{}", true)))
        .unwrap();
    let text = output.as_text().unwrap();
    assert!(text.starts_with("Failed to initialize AstraDBVectorStore: "), "{text}");
}

struct FixedEmbedding {
    calls: Mutex<Vec<Vec<String>>>,
}

impl EmbeddingModel for FixedEmbedding {
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f64>>, ProviderError> {
        self.calls
            .lock()
            .expect("mock mutex poisoned")
            .push(texts.to_vec());
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }

    fn embed_query(&self, _text: &str) -> Result<Vec<f64>, ProviderError> {
        Ok(vec![1.0, 0.0])
    }
}

#[test]
fn vector_store_reports_data_api_errors() {
    let mut server = Server::new();
    let _create = server
        .mock("POST", KEYSPACE_PATH)
        .with_status(200)
        .with_body(r#"{"status": {"ok": 1}}"#)
        .create();
    let _insert = server
        .mock("POST", COLLECTION_PATH)
        .with_status(200)
        .with_body(r#"{"errors": [{"message": "Document already exists", "errorCode": "DOCUMENT_ALREADY_EXISTS"}]}"#)
        .create();

    let embedding = Arc::new(FixedEmbedding {
        calls: Mutex::new(Vec::new()),
    });
    let client = AstraClient::new(&AstraConfig::default(), "tok", &server.url(), None).unwrap();
    let store = AstraVectorStore::new(client, "chat_history", embedding.clone()).unwrap();

    let err = store
        .add_documents(&[Document::new("hello", Map::new())])
        .unwrap_err();
    assert!(err.to_string().contains("Document already exists"));
    assert_eq!(
        embedding.calls.lock().unwrap().as_slice(),
        &[vec!["hello".to_string()]]
    );
}

fn search_inputs(endpoint: &str, conversation_id: &str) -> Vec<(&'static str, InputValue)> {
    vec![
        ("search_query", "what does the user drink?".into()),
        ("astradb_token", "AstraCS:test".into()),
        ("astradb_endpoint", endpoint.into()),
        ("collection_name", "chat_history".into()),
        ("conversation_id", conversation_id.into()),
    ]
}

fn found(documents: Value) -> String {
    json!({ "data": { "documents": documents, "nextPageState": null } }).to_string()
}

#[test]
fn search_orders_hits_newest_first() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", COLLECTION_PATH)
        .match_header("token", "AstraCS:test")
        .match_body(Matcher::PartialJson(json!({
            "find": {"filter": {"conversation_id": "c-1"}, "sort": {"timestamp": -1}}
        })))
        .with_status(200)
        .with_body(found(json!([
            {"_id": "a", "content": "five is the middle one", "timestamp": 5, "conversation_id": "c-1"},
            {"_id": "b", "content": "ten is the newest one", "timestamp": 10, "conversation_id": "c-1"},
            {"_id": "c", "content": "one is the oldest one", "timestamp": 1, "conversation_id": "c-1"}
        ])))
        .expect(1)
        .create();

    let (ctx, _sink) = context(keyless_config(&server.url()));
    let output = AstraSearchNode::default()
        .run(&ctx, &inputs(&search_inputs(&server.url(), "c-1")))
        .unwrap();

    let hits: Value = serde_json::from_str(output.as_text().unwrap()).unwrap();
    let timestamps: Vec<i64> = hits
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["timestamp"].as_i64().unwrap())
        .collect();
    assert_eq!(timestamps, vec![10, 5, 1]);
    assert_eq!(hits[0]["content"], "ten is the newest one");
    assert!(hits[0].get("_id").is_none());
    mock.assert();
}

#[test]
fn search_drops_short_content_only_when_asked() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", COLLECTION_PATH)
        .with_status(200)
        .with_body(found(json!([
            {"content": "ok", "timestamp": 3},
            {"content": "exactly10!", "timestamp": 2},
            {"content": "long enough content", "timestamp": 1}
        ])))
        .expect(2)
        .create();

    let (ctx, _sink) = context(keyless_config(&server.url()));

    let output = AstraSearchNode::default()
        .run(&ctx, &inputs(&search_inputs(&server.url(), "c-1")))
        .unwrap();
    let all: Vec<Value> = serde_json::from_str(output.as_text().unwrap()).unwrap();
    assert_eq!(all.len(), 3);

    let mut values = search_inputs(&server.url(), "c-1");
    values.push(("filter_short_content", true.into()));
    let output = AstraSearchNode::default().run(&ctx, &inputs(&values)).unwrap();
    let kept: Vec<Value> = serde_json::from_str(output.as_text().unwrap()).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0]["content"], "long enough content");
}

#[test]
fn search_follows_page_state() {
    let mut server = Server::new();
    let first = server
        .mock("POST", COLLECTION_PATH)
        .match_body(Matcher::Regex(r#"^\{"find":\{"filter":\{"conversation_id":"c-1"\},"sort":\{"timestamp":-1\}\}\}$"#.to_string()))
        .with_status(200)
        .with_body(
            json!({
                "data": {
                    "documents": [{"content": "page one document", "timestamp": 2}],
                    "nextPageState": "cursor-2"
                }
            })
            .to_string(),
        )
        .expect(1)
        .create();
    let second = server
        .mock("POST", COLLECTION_PATH)
        .match_body(Matcher::PartialJson(json!({"find": {"options": {"pageState": "cursor-2"}}})))
        .with_status(200)
        .with_body(found(json!([{"content": "page two document", "timestamp": 4}])))
        .expect(1)
        .create();

    let (ctx, _sink) = context(keyless_config(&server.url()));
    let output = AstraSearchNode::default()
        .run(&ctx, &inputs(&search_inputs(&server.url(), "c-1")))
        .unwrap();

    let hits: Vec<Value> = serde_json::from_str(output.as_text().unwrap()).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["content"], "page two document");
    first.assert();
    second.assert();
}

#[test]
fn search_guards() {
    let mut server = Server::new();
    let mock = server.mock("POST", Matcher::Any).expect(0).create();
    let (ctx, _sink) = context(keyless_config(&server.url()));

    let output = AstraSearchNode::default()
        .run(&ctx, &inputs(&search_inputs(&server.url(), "")))
        .unwrap();
    assert_eq!(output.as_text(), Some("[]"));

    let output = AstraSearchNode::default()
        .run(&ctx, &inputs(&search_inputs("", "c-1")))
        .unwrap();
    assert_eq!(
        output.as_text(),
        Some("Error: AstraDB token and endpoint are required")
    );

    let output = AstraSearchNode::with_mode(SearchMode::Semantic)
        .run(&ctx, &inputs(&search_inputs(&server.url(), "c-1")))
        .unwrap();
    assert_eq!(output.as_text(), Some(OPENAI_KEY_MISSING));
    mock.assert();
}

#[test]
fn search_provider_failure_is_prefixed() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", COLLECTION_PATH)
        .with_status(200)
        .with_body(r#"{"errors": [{"message": "Collection does not exist"}]}"#)
        .create();

    let (ctx, _sink) = context(keyless_config(&server.url()));
    let output = AstraSearchNode::default()
        .run(&ctx, &inputs(&search_inputs(&server.url(), "c-1")))
        .unwrap();

    let text = output.as_text().unwrap();
    assert!(text.starts_with("Error during AstraDB search: "), "{text}");
    assert!(text.contains("Collection does not exist"));
}

#[test]
fn semantic_search_sorts_by_query_vector() {
    let mut server = Server::new();
    let embed = server
        .mock("POST", "/v1/embeddings")
        .match_body(Matcher::PartialJson(json!({
            "model": "text-embedding-3-small",
            "input": ["line one line two"]
        })))
        .with_status(200)
        .with_body(embedding_response(&[0.5, 0.5]))
        .expect(1)
        .create();
    let find = server
        .mock("POST", COLLECTION_PATH)
        .match_body(Matcher::PartialJson(json!({
            "find": {"filter": {"conversation_id": "c-1"}, "sort": {"$vector": [0.5, 0.5]}}
        })))
        .with_status(200)
        .with_body(found(json!([{"content": "similar document", "timestamp": 1}])))
        .expect(1)
        .create();

    let (ctx, _sink) = context(openai_config(&server.url()));
    let mut values = search_inputs(&server.url(), "c-1");
    values.retain(|(name, _)| *name != "search_query");
    values.push(("search_query", "line one\nline two".into()));
    let output = AstraSearchNode::with_mode(SearchMode::Semantic)
        .run(&ctx, &inputs(&values))
        .unwrap();

    let hits: Vec<Value> = serde_json::from_str(output.as_text().unwrap()).unwrap();
    assert_eq!(hits.len(), 1);
    embed.assert();
    find.assert();
}
