use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::semantic_cache::SemanticCache;
use crate::domain::values::vector_index::SimilarityMetric;
use crate::infrastructure::memory::vector_store::rank;
use std::sync::Mutex;

pub struct MemoryCache {
    entries: Mutex<Vec<CacheEntry>>,
    metric: SimilarityMetric,
}

impl MemoryCache {
    pub fn new(metric: SimilarityMetric) -> Self {
        Self { entries: Mutex::new(Vec::new()), metric }
    }
}

#[async_trait::async_trait]
impl SemanticCache for MemoryCache {
    async fn ensure_index(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn insert(&self, entry: &CacheEntry) -> Result<(), DomainError> {
        let mut entries = self.entries.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        entries.push(entry.clone());
        Ok(())
    }

    async fn lookup(&self, vector: &[f32], threshold: f64) -> Result<Option<CacheEntry>, DomainError> {
        let entries = self.entries.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let best = rank(
            self.metric,
            vector,
            entries.iter().map(|e| (e, e.vector.clone())),
            1,
        );
        Ok(best
            .into_iter()
            .find(|(_, score)| self.metric.passes(*score, threshold))
            .map(|(e, _)| e.clone()))
    }

    async fn recent(&self, n: usize) -> Result<Vec<CacheEntry>, DomainError> {
        let entries = self.entries.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries[skip..].to_vec())
    }

    async fn clear(&self) -> Result<u64, DomainError> {
        let mut entries = self.entries.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let n = entries.len() as u64;
        entries.clear();
        Ok(n)
    }
}
