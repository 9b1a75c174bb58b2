use crate::domain::entities::item::ScoredItem;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::vector_store::VectorStore;
use std::sync::Arc;

pub struct SearchUseCase {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl SearchUseCase {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, vector_store }
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::InvalidInput("query is empty".into()));
        }
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        match vectors.pop() {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(DomainError::Embedding("no embedding returned for query".into())),
        }
    }

    pub async fn search_vector(&self, vector: &[f32], limit: usize) -> Result<Vec<ScoredItem>, DomainError> {
        self.vector_store.vector_search(vector, limit).await
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredItem>, DomainError> {
        let vector = self.embed_query(query).await?;
        self.search_vector(&vector, limit).await
    }

    pub async fn count(&self) -> Result<u64, DomainError> {
        self.vector_store.count().await
    }
}
