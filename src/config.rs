//! Process configuration, read once at startup.
//!
//! Values come from the environment; `main` seeds the environment from a
//! `.env` file first via `dotenvy`, so a local `.env` works the same as
//! exported variables.

use crate::domain::error::DomainError;
use crate::domain::values::vector_index::{SimilarityMetric, VectorIndexKind};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Azure Cosmos DB for MongoDB vCore.
    Mongo,
    /// Azure Cosmos DB NoSQL REST API.
    NoSql,
    /// In-process store, nothing persisted.
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Mongo => write!(f, "mongo"),
            BackendKind::NoSql => write!(f, "nosql"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" | "vcore" => Ok(BackendKind::Mongo),
            "nosql" | "sql" => Ok(BackendKind::NoSql),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(format!("Unknown backend: {s}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub backend: BackendKind,
    pub mongo_connection_string: Option<String>,
    pub nosql_endpoint: Option<String>,
    pub nosql_key: Option<String>,
    pub database: String,
    pub collection: String,
    pub cache_collection: String,
    pub history_collection: String,
    pub vector_field: String,
    pub index_kind: VectorIndexKind,
    pub similarity: SimilarityMetric,
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub endpoint: Option<String>,
    pub key: Option<String>,
    pub api_version: String,
    pub embeddings_deployment: String,
    pub completions_deployment: String,
    pub dimensions: usize,
    pub max_attempts: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub cache_threshold: f64,
    pub history_context_turns: usize,
    /// Replaces the built-in system prompt when set.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub openai: OpenAiConfig,
    pub rag: RagConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let backend: BackendKind = parse_value("RAG_BACKEND", &or("RAG_BACKEND", "mongo"))?;
        let dimensions: usize = parse_value(
            "AOAI_EMBEDDINGS_DIMENSIONS",
            &or("AOAI_EMBEDDINGS_DIMENSIONS", "1536"),
        )?;
        if dimensions == 0 {
            return Err(DomainError::Config("AOAI_EMBEDDINGS_DIMENSIONS must be positive".into()));
        }

        let database = DatabaseConfig {
            backend,
            mongo_connection_string: get("MONGO_CONNECTION_STRING"),
            nosql_endpoint: get("COSMOS_NOSQL_ENDPOINT"),
            nosql_key: get("COSMOS_NOSQL_KEY"),
            database: or("COSMOS_DATABASE", "rag"),
            collection: or("COSMOS_COLLECTION", "items"),
            cache_collection: or("COSMOS_CACHE_COLLECTION", "cache"),
            history_collection: or("COSMOS_HISTORY_COLLECTION", "chat_history"),
            vector_field: or("VECTOR_FIELD", "contentVector"),
            index_kind: parse_value("VECTOR_INDEX_KIND", &or("VECTOR_INDEX_KIND", "ivf"))?,
            similarity: parse_value("VECTOR_SIMILARITY", &or("VECTOR_SIMILARITY", "COS"))?,
            dimensions,
        };

        match backend {
            BackendKind::Mongo if database.mongo_connection_string.is_none() => {
                return Err(DomainError::Config(
                    "MONGO_CONNECTION_STRING is required for the mongo backend".into(),
                ));
            }
            BackendKind::NoSql
                if database.nosql_endpoint.is_none() || database.nosql_key.is_none() =>
            {
                return Err(DomainError::Config(
                    "COSMOS_NOSQL_ENDPOINT and COSMOS_NOSQL_KEY are required for the nosql backend"
                        .into(),
                ));
            }
            _ => {}
        }

        let openai = OpenAiConfig {
            endpoint: get("AOAI_ENDPOINT").map(|e| e.trim_end_matches('/').to_string()),
            key: get("AOAI_KEY"),
            api_version: or("AOAI_API_VERSION", "2024-06-01"),
            embeddings_deployment: or("AOAI_EMBEDDINGS_DEPLOYMENT", "text-embedding-3-small"),
            completions_deployment: or("AOAI_COMPLETIONS_DEPLOYMENT", "gpt-4o"),
            dimensions,
            max_attempts: parse_value("EMBEDDING_MAX_ATTEMPTS", &or("EMBEDDING_MAX_ATTEMPTS", "6"))?,
            temperature: parse_value("AOAI_TEMPERATURE", &or("AOAI_TEMPERATURE", "0.1"))?,
            max_tokens: parse_value("AOAI_MAX_TOKENS", &or("AOAI_MAX_TOKENS", "800"))?,
        };
        if !(0.0..=2.0).contains(&openai.temperature) {
            return Err(DomainError::Config("AOAI_TEMPERATURE must be between 0 and 2".into()));
        }

        let cache_threshold: f64 = parse_value(
            "CACHE_SIMILARITY_THRESHOLD",
            &or("CACHE_SIMILARITY_THRESHOLD", "0.99"),
        )?;
        if !(0.0..=1.0).contains(&cache_threshold) {
            return Err(DomainError::Config(
                "CACHE_SIMILARITY_THRESHOLD must be between 0 and 1".into(),
            ));
        }

        let rag = RagConfig {
            cache_threshold,
            history_context_turns: parse_value(
                "HISTORY_CONTEXT_TURNS",
                &or("HISTORY_CONTEXT_TURNS", "3"),
            )?,
            system_prompt: get("RAG_SYSTEM_PROMPT"),
        };

        Ok(Self { database, openai, rag })
    }

    /// Azure OpenAI endpoint and key, required whenever real providers are built.
    pub fn openai_credentials(&self) -> Result<(&str, &str), DomainError> {
        match (&self.openai.endpoint, &self.openai.key) {
            (Some(endpoint), Some(key)) => Ok((endpoint, key)),
            _ => Err(DomainError::Config("AOAI_ENDPOINT and AOAI_KEY are required".into())),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, DomainError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| DomainError::Config(format!("{key}={raw}: {e}")))
}
