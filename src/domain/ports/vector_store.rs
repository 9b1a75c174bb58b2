use crate::domain::entities::item::{Item, ScoredItem};
use crate::domain::error::DomainError;

/// Item collection backed by the database's vector index.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the vector index (or container) if it does not exist yet.
    async fn ensure_index(&self) -> Result<(), DomainError>;
    /// Insert or replace items by id.
    async fn upsert(&self, items: &[Item]) -> Result<(), DomainError>;
    /// Nearest `k` items to `vector`, best first.
    async fn vector_search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredItem>, DomainError>;
    async fn count(&self) -> Result<u64, DomainError>;
}
