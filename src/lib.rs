pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::ask::{Answer, AskOptions, AskUseCase};
use crate::application::history::HistoryUseCase;
use crate::application::index::IndexUseCase;
use crate::application::ingest::{IngestOptions, IngestReport, IngestUseCase};
use crate::application::search::SearchUseCase;
use crate::config::{AppConfig, BackendKind, DatabaseConfig, RagConfig};
use crate::domain::entities::chat_turn::ChatTurn;
use crate::domain::entities::item::ScoredItem;
use crate::domain::error::DomainError;
use crate::domain::ports::chat_history::ChatHistory;
use crate::domain::ports::completion_port::CompletionProvider;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::semantic_cache::SemanticCache;
use crate::domain::ports::vector_store::VectorStore;
use crate::infrastructure::completions::azure_openai::AzureOpenAiChat;
use crate::infrastructure::embeddings::azure_openai::AzureOpenAiEmbedder;
use crate::infrastructure::embeddings::retry::{RetryPolicy, RetryingEmbedder};
use crate::infrastructure::memory::cache_repo::MemoryCache;
use crate::infrastructure::memory::history_repo::MemoryHistory;
use crate::infrastructure::memory::vector_store::MemoryVectorStore;
use crate::infrastructure::mongo::cache_repo::MongoCache;
use crate::infrastructure::mongo::history_repo::MongoHistory;
use crate::infrastructure::mongo::vector_store::MongoVectorStore;
use crate::infrastructure::mongo::VectorIndexSpec;
use crate::infrastructure::nosql::cache_repo::NoSqlCache;
use crate::infrastructure::nosql::history_repo::NoSqlHistory;
use crate::infrastructure::nosql::vector_store::NoSqlVectorStore;
use crate::infrastructure::nosql::CosmosNoSqlClient;
use std::path::Path;
use std::sync::Arc;

/// The three collections a backend provides.
pub struct Backend {
    pub vector_store: Arc<dyn VectorStore>,
    pub cache: Arc<dyn SemanticCache>,
    pub history: Arc<dyn ChatHistory>,
}

impl Backend {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        match config.backend {
            BackendKind::Mongo => {
                let uri = config.mongo_connection_string.as_deref().ok_or_else(|| {
                    DomainError::Config("MONGO_CONNECTION_STRING is required".into())
                })?;
                let db = infrastructure::mongo::connect(uri, &config.database).await?;
                let spec = VectorIndexSpec {
                    kind: config.index_kind,
                    similarity: config.similarity,
                    dimensions: config.dimensions,
                };
                Ok(Self {
                    vector_store: Arc::new(MongoVectorStore::new(
                        db.clone(),
                        &config.collection,
                        &config.vector_field,
                        spec.clone(),
                    )),
                    cache: Arc::new(MongoCache::new(db.clone(), &config.cache_collection, spec)),
                    history: Arc::new(MongoHistory::new(&db, &config.history_collection)),
                })
            }
            BackendKind::NoSql => {
                let (endpoint, key) = match (&config.nosql_endpoint, &config.nosql_key) {
                    (Some(endpoint), Some(key)) => (endpoint, key),
                    _ => {
                        return Err(DomainError::Config(
                            "COSMOS_NOSQL_ENDPOINT and COSMOS_NOSQL_KEY are required".into(),
                        ))
                    }
                };
                let client = Arc::new(CosmosNoSqlClient::new(endpoint, key)?);
                Ok(Self {
                    vector_store: Arc::new(NoSqlVectorStore::new(
                        client.clone(),
                        &config.database,
                        &config.collection,
                        &config.vector_field,
                        config.index_kind,
                        config.similarity,
                        config.dimensions,
                    )?),
                    cache: Arc::new(NoSqlCache::new(
                        client.clone(),
                        &config.database,
                        &config.cache_collection,
                        config.index_kind,
                        config.similarity,
                        config.dimensions,
                    )),
                    history: Arc::new(NoSqlHistory::new(
                        client,
                        &config.database,
                        &config.history_collection,
                    )),
                })
            }
            BackendKind::Memory => Ok(Self::memory(config)),
        }
    }

    pub fn memory(config: &DatabaseConfig) -> Self {
        Self {
            vector_store: Arc::new(MemoryVectorStore::new(config.similarity)),
            cache: Arc::new(MemoryCache::new(config.similarity)),
            history: Arc::new(MemoryHistory::new()),
        }
    }
}

pub struct CosmosRag {
    index_uc: IndexUseCase,
    ingest_uc: IngestUseCase,
    search_uc: Arc<SearchUseCase>,
    ask_uc: AskUseCase,
    history_uc: HistoryUseCase,
}

impl CosmosRag {
    /// Build Azure OpenAI clients and the configured database backend.
    pub async fn connect(config: &AppConfig) -> Result<Self, DomainError> {
        let (endpoint, key) = config.openai_credentials()?;
        let openai = &config.openai;

        let embedder = AzureOpenAiEmbedder::new(
            endpoint,
            key,
            &openai.embeddings_deployment,
            &openai.api_version,
            openai.dimensions,
        )?;
        let policy = RetryPolicy { max_attempts: openai.max_attempts.max(1), ..RetryPolicy::default() };
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(RetryingEmbedder::new(Arc::new(embedder), policy));
        let completer: Arc<dyn CompletionProvider> = Arc::new(AzureOpenAiChat::new(
            endpoint,
            key,
            &openai.completions_deployment,
            &openai.api_version,
        )?
        .with_sampling(openai.temperature, openai.max_tokens));

        let backend = Backend::connect(&config.database).await?;
        tracing::info!(backend = %config.database.backend, "backend ready");

        Ok(Self::with_providers(&config.rag, embedder, completer, backend))
    }

    pub fn with_providers(
        rag: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        backend: Backend,
    ) -> Self {
        let search_uc = Arc::new(SearchUseCase::new(embedder.clone(), backend.vector_store.clone()));
        let mut ask_uc = AskUseCase::new(
            search_uc.clone(),
            completer,
            backend.cache.clone(),
            backend.history.clone(),
            rag.cache_threshold,
            rag.history_context_turns,
        );
        if let Some(prompt) = &rag.system_prompt {
            ask_uc = ask_uc.with_system_prompt(prompt.clone());
        }
        Self {
            index_uc: IndexUseCase::new(
                backend.vector_store.clone(),
                backend.cache.clone(),
                backend.history.clone(),
            ),
            ingest_uc: IngestUseCase::new(embedder, backend.vector_store),
            ask_uc,
            search_uc,
            history_uc: HistoryUseCase::new(backend.history),
        }
    }

    pub async fn create_indexes(&self) -> Result<(), DomainError> {
        self.index_uc.execute().await
    }

    pub async fn load_file(&self, path: &Path, options: &IngestOptions) -> Result<IngestReport, DomainError> {
        self.ingest_uc.load_file(path, options).await
    }

    pub async fn load_values(
        &self,
        value: serde_json::Value,
        options: &IngestOptions,
    ) -> Result<IngestReport, DomainError> {
        self.ingest_uc.load_values(value, options).await
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredItem>, DomainError> {
        self.search_uc.search(query, limit).await
    }

    pub async fn count(&self) -> Result<u64, DomainError> {
        self.search_uc.count().await
    }

    pub async fn ask(&self, question: &str, options: &AskOptions) -> Result<Answer, DomainError> {
        self.ask_uc.execute(question, options).await
    }

    pub async fn history(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, DomainError> {
        self.history_uc.turns(session_id, limit).await
    }

    pub async fn clear_cache(&self) -> Result<u64, DomainError> {
        self.ask_uc.clear_cache().await
    }
}
