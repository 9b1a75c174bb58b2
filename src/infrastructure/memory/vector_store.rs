use crate::domain::entities::item::{Item, ScoredItem};
use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::vector_index::SimilarityMetric;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Brute-force store for local runs and tests.
pub struct MemoryVectorStore {
    items: Mutex<BTreeMap<String, Item>>,
    metric: SimilarityMetric,
}

impl MemoryVectorStore {
    pub fn new(metric: SimilarityMetric) -> Self {
        Self { items: Mutex::new(BTreeMap::new()), metric }
    }
}

/// Score every candidate against `vector` and keep the best `k`.
pub(crate) fn rank<T>(
    metric: SimilarityMetric,
    vector: &[f32],
    candidates: impl Iterator<Item = (T, Vec<f32>)>,
    k: usize,
) -> Vec<(T, f64)> {
    let mut scored: Vec<(T, f64)> = candidates
        .map(|(c, v)| {
            let s = metric.score(vector, &v);
            (c, s)
        })
        .collect();
    scored.sort_by(|a, b| {
        let ord = a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal);
        if metric.higher_is_closer() { ord.reverse() } else { ord }
    });
    scored.truncate(k);
    scored
}

#[async_trait::async_trait]
impl VectorStore for MemoryVectorStore {
    async fn ensure_index(&self) -> Result<(), DomainError> {
        Ok(())
    }

    async fn upsert(&self, items: &[Item]) -> Result<(), DomainError> {
        let mut map = self.items.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        for item in items {
            map.insert(item.id.clone(), item.clone());
        }
        Ok(())
    }

    async fn vector_search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredItem>, DomainError> {
        if vector.is_empty() {
            return Err(DomainError::InvalidInput("query vector is empty".into()));
        }
        let map = self.items.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let ranked = rank(
            self.metric,
            vector,
            map.values().map(|i| (i, i.vector.clone())),
            k,
        );
        Ok(ranked
            .into_iter()
            .map(|(item, score)| ScoredItem { item: item.clone(), score })
            .collect())
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let map = self.items.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(map.len() as u64)
    }
}
