mod common;

use common::{azure_services, setup};
use cosmos_rag::application::ask::AskOptions;
use cosmos_rag::application::ingest::IngestOptions;
use cosmos_rag::domain::error::DomainError;
use cosmos_rag::domain::values::chat_role::ChatRole;
use cosmos_rag::{Backend, CosmosRag};
use std::sync::Arc;

async fn loaded() -> common::Harness {
    let h = setup();
    let options = IngestOptions { fields: vec!["title".into(), "content".into()], id_field: "id".into() };
    h.rag.load_values(azure_services(), &options).await.unwrap();
    h
}

#[tokio::test]
async fn test_ask_grounds_answer_on_retrieved_items() {
    let h = loaded().await;
    let answer = h
        .rag
        .ask("Which service is a vector database?", &AskOptions::default())
        .await
        .unwrap();

    assert!(!answer.cached);
    assert_eq!(answer.sources.len(), 3);
    assert_eq!(answer.sources[0], "1");
    assert_eq!(answer.usage.total_tokens, 15);
    assert_eq!(answer.turn, 0);
    assert_eq!(answer.content, "answer to: Which service is a vector database?");

    let requests = h.completer.requests.lock().unwrap();
    let system = &requests[0][0];
    assert_eq!(system.role, ChatRole::System);
    assert!(system.content.contains("Azure Cosmos DB"));
    assert!(!system.content.contains("contentVector"));
}

#[tokio::test]
async fn test_repeated_question_hits_semantic_cache() {
    let h = loaded().await;
    let options = AskOptions::default();
    let first = h.rag.ask("What is Azure Functions?", &options).await.unwrap();
    let second = h.rag.ask("what is azure functions", &options).await.unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(second.content, first.content);
    assert!(second.sources.is_empty());
    assert_eq!(h.completer.calls(), 1);
}

#[tokio::test]
async fn test_no_cache_always_calls_model() {
    let h = loaded().await;
    let options = AskOptions { use_cache: false, ..AskOptions::default() };
    h.rag.ask("What is Azure Functions?", &options).await.unwrap();
    let again = h.rag.ask("What is Azure Functions?", &options).await.unwrap();
    assert!(!again.cached);
    assert_eq!(h.completer.calls(), 2);
}

#[tokio::test]
async fn test_recent_answers_become_conversation_context() {
    let h = loaded().await;
    let options = AskOptions::default();
    h.rag.ask("Tell me about blob storage", &options).await.unwrap();
    h.rag.ask("Is it serverless?", &options).await.unwrap();

    let requests = h.completer.requests.lock().unwrap();
    let second = &requests[1];
    assert_eq!(second.len(), 4);
    assert_eq!(second[1].role, ChatRole::User);
    assert_eq!(second[1].content, "Tell me about blob storage");
    assert_eq!(second[2].role, ChatRole::Assistant);
    assert_eq!(second[2].content, "answer to: Tell me about blob storage");
    assert_eq!(second[3].content, "Is it serverless?");
}

#[tokio::test]
async fn test_history_is_turn_indexed_per_session() {
    let h = loaded().await;
    let alice = AskOptions { session_id: "alice".into(), ..AskOptions::default() };
    let bob = AskOptions { session_id: "bob".into(), ..AskOptions::default() };

    h.rag.ask("What is Cosmos DB?", &alice).await.unwrap();
    h.rag.ask("What is Blob Storage?", &bob).await.unwrap();
    let cached = h.rag.ask("What is Cosmos DB?", &alice).await.unwrap();
    assert!(cached.cached);
    assert_eq!(cached.turn, 1);

    let turns = h.rag.history("alice", 10).await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].turn, 0);
    assert_eq!(turns[1].turn, 1);
    assert_eq!(turns[1].user, "What is Cosmos DB?");

    let last = h.rag.history("alice", 1).await.unwrap();
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].turn, 1);

    assert_eq!(h.rag.history("bob", 10).await.unwrap().len(), 1);
    assert!(h.rag.history("carol", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_cache_forces_fresh_completion() {
    let h = loaded().await;
    let options = AskOptions::default();
    h.rag.ask("What is Azure Functions?", &options).await.unwrap();
    assert_eq!(h.rag.clear_cache().await.unwrap(), 1);

    let answer = h.rag.ask("What is Azure Functions?", &options).await.unwrap();
    assert!(!answer.cached);
    assert_eq!(h.completer.calls(), 2);
}

#[tokio::test]
async fn test_empty_question_is_rejected_before_any_call() {
    let h = loaded().await;
    let calls_before = *h.embedder.calls.lock().unwrap();
    let err = h.rag.ask("  ", &AskOptions::default()).await.unwrap_err();
    assert!(matches!(err, DomainError::InvalidInput(_)));
    assert_eq!(*h.embedder.calls.lock().unwrap(), calls_before);
    assert_eq!(h.completer.calls(), 0);
}

#[tokio::test]
async fn test_session_ids_unusable_as_document_ids_are_rejected() {
    let h = setup();
    for session in ["team/alpha", "a#b", "why?", "back\\slash"] {
        let options = AskOptions { session_id: session.into(), ..AskOptions::default() };
        let err = h.rag.ask("Hello?", &options).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)), "{session}");
    }
    assert_eq!(*h.embedder.calls.lock().unwrap(), 0);

    let options = AskOptions { session_id: "user-42.chat_1".into(), ..AskOptions::default() };
    assert!(h.rag.ask("Hello?", &options).await.is_ok());
}

#[tokio::test]
async fn test_configured_system_prompt_replaces_default() {
    let mut config = common::memory_config();
    config.rag.system_prompt = Some("Answer like a pirate.".into());
    let embedder = Arc::new(common::WordEmbedder::default());
    let completer = Arc::new(common::EchoCompleter::default());
    let rag = CosmosRag::with_providers(
        &config.rag,
        embedder,
        completer.clone(),
        Backend::memory(&config.database),
    );

    rag.ask("Any treasure?", &AskOptions::default()).await.unwrap();
    let requests = completer.requests.lock().unwrap();
    assert_eq!(requests[0][0].role, ChatRole::System);
    assert!(requests[0][0].content.starts_with("Answer like a pirate."));
}

#[tokio::test]
async fn test_ask_on_empty_store_still_answers() {
    let h = setup();
    let answer = h.rag.ask("Anything there?", &AskOptions::default()).await.unwrap();
    assert!(answer.sources.is_empty());
    assert_eq!(h.completer.calls(), 1);
}

#[tokio::test]
async fn test_create_indexes_is_idempotent_in_memory() {
    let h = setup();
    h.rag.create_indexes().await.unwrap();
    h.rag.create_indexes().await.unwrap();
}
