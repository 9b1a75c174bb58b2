//! Shared test helpers.
#![allow(dead_code)]

use cosmos_rag::config::AppConfig;
use cosmos_rag::domain::entities::completion::{Completion, TokenUsage};
use cosmos_rag::domain::error::DomainError;
use cosmos_rag::domain::ports::completion_port::CompletionProvider;
use cosmos_rag::domain::ports::embedding_port::EmbeddingProvider;
use cosmos_rag::domain::values::chat_role::{ChatMessage, ChatRole};
use cosmos_rag::{Backend, CosmosRag};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const DIM: usize = 256;

/// Bag-of-words embedder: every distinct lowercase word gets its own axis.
#[derive(Default)]
pub struct WordEmbedder {
    vocab: Mutex<HashMap<String, usize>>,
    pub calls: Mutex<usize>,
}

impl WordEmbedder {
    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vocab = self.vocab.lock().unwrap();
        let mut v = vec![0.0; DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocab.len();
            let idx = *vocab.entry(word.to_lowercase()).or_insert(next);
            v[idx % DIM] += 1.0;
        }
        v
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for WordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        *self.calls.lock().unwrap() += 1;
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

/// Completer that answers with the last user message and records every request.
#[derive(Default)]
pub struct EchoCompleter {
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl EchoCompleter {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for EchoCompleter {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, DomainError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let question = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        Ok(Completion {
            content: format!("answer to: {question}"),
            model: "gpt-4o".into(),
            usage: TokenUsage { prompt_tokens: 10, completion_tokens: 5, total_tokens: 15 },
        })
    }

    fn model(&self) -> &str {
        "gpt-4o"
    }
}

pub fn memory_config() -> AppConfig {
    AppConfig::from_lookup(|k| match k {
        "RAG_BACKEND" => Some("memory".to_string()),
        _ => None,
    })
    .unwrap()
}

pub struct Harness {
    pub rag: CosmosRag,
    pub embedder: Arc<WordEmbedder>,
    pub completer: Arc<EchoCompleter>,
}

pub fn setup() -> Harness {
    let config = memory_config();
    let embedder = Arc::new(WordEmbedder::default());
    let completer = Arc::new(EchoCompleter::default());
    let rag = CosmosRag::with_providers(
        &config.rag,
        embedder.clone(),
        completer.clone(),
        Backend::memory(&config.database),
    );
    Harness { rag, embedder, completer }
}

pub fn azure_services() -> serde_json::Value {
    serde_json::json!([
        {"id": "1", "title": "Azure Cosmos DB", "content": "globally distributed vector database", "category": "Databases"},
        {"id": "2", "title": "Azure Functions", "content": "serverless compute that is event driven", "category": "Compute"},
        {"id": "3", "title": "Azure Blob Storage", "content": "object storage for unstructured files", "category": "Storage"}
    ])
}
