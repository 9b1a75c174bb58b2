use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::error::DomainError;

/// Insert-only log of answered prompts with a vector lookup.
#[async_trait::async_trait]
pub trait SemanticCache: Send + Sync {
    async fn ensure_index(&self) -> Result<(), DomainError>;
    async fn insert(&self, entry: &CacheEntry) -> Result<(), DomainError>;
    /// Closest cached entry, if it clears `threshold` similarity.
    async fn lookup(&self, vector: &[f32], threshold: f64) -> Result<Option<CacheEntry>, DomainError>;
    /// The `n` most recent entries, oldest first.
    async fn recent(&self, n: usize) -> Result<Vec<CacheEntry>, DomainError>;
    /// Remove every entry, returning how many were removed.
    async fn clear(&self) -> Result<u64, DomainError>;
}
