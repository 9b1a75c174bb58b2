use cosmos_rag::domain::entities::cache_entry::CacheEntry;
use cosmos_rag::domain::entities::completion::{Completion, TokenUsage};
use cosmos_rag::domain::entities::item::Item;
use cosmos_rag::domain::ports::chat_history::ChatHistory;
use cosmos_rag::domain::ports::semantic_cache::SemanticCache;
use cosmos_rag::domain::ports::vector_store::VectorStore;
use cosmos_rag::domain::values::vector_index::{SimilarityMetric, VectorIndexKind};
use cosmos_rag::infrastructure::nosql::cache_repo::NoSqlCache;
use cosmos_rag::infrastructure::nosql::history_repo::NoSqlHistory;
use cosmos_rag::infrastructure::nosql::vector_store::NoSqlVectorStore;
use cosmos_rag::infrastructure::nosql::CosmosNoSqlClient;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// base64 of "test-key"
const KEY: &str = "dGVzdC1rZXk=";
const CACHE_DOCS: &str = "/dbs/rag/colls/cache/docs";

fn store(server: &MockServer) -> NoSqlVectorStore {
    let client = Arc::new(CosmosNoSqlClient::new(&server.uri(), KEY).unwrap());
    NoSqlVectorStore::new(
        client,
        "rag",
        "items",
        "contentVector",
        VectorIndexKind::DiskAnn,
        SimilarityMetric::Cosine,
        3,
    )
    .unwrap()
}

#[tokio::test]
async fn test_ensure_index_accepts_existing_resources() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dbs"))
        .and(header_exists("authorization"))
        .and(header("x-ms-version", "2018-12-31"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dbs/rag/colls"))
        .and(body_partial_json(json!({
            "id": "items",
            "vectorEmbeddingPolicy": {"vectorEmbeddings": [{"path": "/contentVector", "distanceFunction": "cosine", "dimensions": 3}]},
            "indexingPolicy": {"vectorIndexes": [{"path": "/contentVector", "type": "diskANN"}]}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "items"})))
        .expect(1)
        .mount(&server)
        .await;

    store(&server).ensure_index().await.unwrap();
}

#[tokio::test]
async fn test_upsert_sends_partition_key_and_upsert_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dbs/rag/colls/items/docs"))
        .and(header("x-ms-documentdb-is-upsert", "True"))
        .and(header("x-ms-documentdb-partitionkey", "[\"items\"]"))
        .and(body_partial_json(json!({"id": "1", "partitionKey": "items", "contentVector": [1.0, 0.0, 0.0]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut item = Item::from_json(json!({"id": "1", "title": "Azure Cosmos DB"}), "id").unwrap();
    item.vector = vec![1.0, 0.0, 0.0];
    store(&server).upsert(&[item]).await.unwrap();
}

#[tokio::test]
async fn test_vector_search_parses_scored_documents() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dbs/rag/colls/items/docs"))
        .and(header("x-ms-documentdb-isquery", "True"))
        .and(header("content-type", "application/query+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_rid": "abc",
            "Documents": [
                {"document": {"id": "1", "title": "Azure Cosmos DB", "contentVector": [1.0, 0.0, 0.0], "partitionKey": "items", "_rid": "x", "_ts": 1}, "similarityScore": 0.91},
                {"document": {"id": "2", "title": "Azure Functions", "contentVector": [0.0, 1.0, 0.0], "partitionKey": "items"}, "similarityScore": 0.12}
            ],
            "_count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = store(&server).vector_search(&[1.0, 0.0, 0.0], 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].item.id, "1");
    assert!((hits[0].score - 0.91).abs() < 1e-9);
    assert_eq!(hits[0].item.vector, vec![1.0, 0.0, 0.0]);
    assert!(hits[0].item.document.get("partitionKey").is_none());
    assert!(hits[0].item.document.get("_rid").is_none());
}

#[tokio::test]
async fn test_count_sums_partial_aggregates_across_pages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dbs/rag/colls/items/docs"))
        .and(header("x-ms-continuation", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Documents": [2]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/dbs/rag/colls/items/docs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ms-continuation", "page-2")
                .set_body_json(json!({"Documents": [3]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let count = store(&server).count().await.unwrap();
    assert_eq!(count, 5);
}

#[tokio::test]
async fn test_history_turns_come_back_oldest_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dbs/rag/colls/chat_history/docs"))
        .and(header("x-ms-documentdb-partitionkey", "[\"s1\"]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [
                {"id": "s1:1", "session_id": "s1", "turn": 1, "user": "q2", "assistant": "a2", "created_at": "2026-10-16T08:01:00Z"},
                {"id": "s1:0", "session_id": "s1", "turn": 0, "user": "q1", "assistant": "a1", "created_at": "2026-10-16T08:00:00Z"}
            ]
        })))
        .mount(&server)
        .await;

    let client = Arc::new(CosmosNoSqlClient::new(&server.uri(), KEY).unwrap());
    let history = NoSqlHistory::new(client, "rag", "chat_history");
    let turns = history.turns("s1", 10).await.unwrap();
    assert_eq!(turns.iter().map(|t| t.turn).collect::<Vec<_>>(), vec![0, 1]);
    assert_eq!(history.next_turn("s1").await.unwrap(), 2);
}

fn cache(server: &MockServer, similarity: SimilarityMetric) -> NoSqlCache {
    let client = Arc::new(CosmosNoSqlClient::new(&server.uri(), KEY).unwrap());
    NoSqlCache::new(client, "rag", "cache", VectorIndexKind::Ivf, similarity, 3)
}

fn cached(id: &str, prompt: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "prompt": prompt,
        "completion": format!("answer to: {prompt}"),
        "prompt_tokens": 10,
        "completion_tokens": 5,
        "total_tokens": 15,
        "model": "gpt-4o",
        "vector": [1.0, 0.0, 0.0],
        "created_at": created_at,
        "partitionKey": "cache",
        "_ts": 1
    })
}

async fn mount_closest(server: &MockServer, score: f64) {
    Mock::given(method("POST"))
        .and(path(CACHE_DOCS))
        .and(header("x-ms-documentdb-partitionkey", "[\"cache\"]"))
        .and(body_partial_json(json!({"parameters": [{"name": "@k", "value": 1}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [{"document": cached("c1", "What is Cosmos DB?", "2026-10-16T08:00:00Z"), "similarityScore": score}]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cache_lookup_respects_cosine_threshold() {
    let server = MockServer::start().await;
    mount_closest(&server, 0.995).await;
    let hit = cache(&server, SimilarityMetric::Cosine)
        .lookup(&[1.0, 0.0, 0.0], 0.99)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.id, "c1");
    assert_eq!(hit.completion, "answer to: What is Cosmos DB?");

    let server = MockServer::start().await;
    mount_closest(&server, 0.80).await;
    let miss = cache(&server, SimilarityMetric::Cosine).lookup(&[1.0, 0.0, 0.0], 0.99).await.unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_cache_lookup_treats_l2_score_as_distance() {
    let server = MockServer::start().await;
    mount_closest(&server, 0.005).await;
    let hit = cache(&server, SimilarityMetric::Euclidean).lookup(&[1.0, 0.0, 0.0], 0.99).await.unwrap();
    assert!(hit.is_some());

    let server = MockServer::start().await;
    mount_closest(&server, 0.995).await;
    let miss = cache(&server, SimilarityMetric::Euclidean).lookup(&[1.0, 0.0, 0.0], 0.99).await.unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_cache_lookup_on_empty_container_misses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CACHE_DOCS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Documents": []})))
        .mount(&server)
        .await;
    let miss = cache(&server, SimilarityMetric::Cosine).lookup(&[1.0, 0.0, 0.0], 0.5).await.unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn test_cache_insert_stamps_partition_and_order_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CACHE_DOCS))
        .and(header("x-ms-documentdb-is-upsert", "True"))
        .and(header("x-ms-documentdb-partitionkey", "[\"cache\"]"))
        .and(body_partial_json(json!({"prompt": "What is Cosmos DB?", "partitionKey": "cache", "vector": [1.0, 0.0, 0.0]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let completion = Completion {
        content: "A database.".into(),
        model: "gpt-4o".into(),
        usage: TokenUsage { prompt_tokens: 10, completion_tokens: 3, total_tokens: 13 },
    };
    let entry = CacheEntry::new("What is Cosmos DB?".into(), &completion, vec![1.0, 0.0, 0.0]);
    cache(&server, SimilarityMetric::Cosine).insert(&entry).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["createdMs"], json!(entry.created_at.timestamp_millis()));
    assert_eq!(body["id"], json!(entry.id));
}

#[tokio::test]
async fn test_cache_recent_returns_oldest_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CACHE_DOCS))
        .and(body_partial_json(json!({
            "query": "SELECT TOP @n * FROM c ORDER BY c.createdMs DESC",
            "parameters": [{"name": "@n", "value": 2}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [
                cached("c2", "second", "2026-10-16T08:00:00.123Z"),
                cached("c1", "first", "2026-10-16T08:00:00.123456Z")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = cache(&server, SimilarityMetric::Cosine).recent(2).await.unwrap();
    let prompts: Vec<_> = entries.iter().map(|e| e.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["first", "second"]);
}

#[tokio::test]
async fn test_cache_clear_deletes_each_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CACHE_DOCS))
        .and(body_partial_json(json!({"query": "SELECT VALUE c.id FROM c"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Documents": ["c1", "c2"]})))
        .expect(1)
        .mount(&server)
        .await;
    for id in ["c1", "c2"] {
        Mock::given(method("DELETE"))
            .and(path(format!("{CACHE_DOCS}/{id}")))
            .and(header("x-ms-documentdb-partitionkey", "[\"cache\"]"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }

    let removed = cache(&server, SimilarityMetric::Cosine).clear().await.unwrap();
    assert_eq!(removed, 2);
}

#[test]
fn test_invalid_key_is_config_error() {
    assert!(CosmosNoSqlClient::new("https://acct.documents.azure.com", "not base64!").is_err());
}

#[test]
fn test_invalid_vector_field_is_rejected() {
    let client = Arc::new(CosmosNoSqlClient::new("https://acct.documents.azure.com", KEY).unwrap());
    let result = NoSqlVectorStore::new(
        client,
        "rag",
        "items",
        "bad field",
        VectorIndexKind::Ivf,
        SimilarityMetric::Cosine,
        3,
    );
    assert!(result.is_err());
}
