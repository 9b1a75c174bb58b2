use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::semantic_cache::SemanticCache;
use crate::domain::values::vector_index::{SimilarityMetric, VectorIndexKind};
use crate::infrastructure::nosql::{container_definition, vector_query, CosmosNoSqlClient, PARTITION_KEY};
use serde_json::{json, Value};
use std::sync::Arc;

const VECTOR_PATH: &str = "vector";
/// Epoch milliseconds; RFC3339 strings with varying fraction widths don't sort as text.
const ORDER_FIELD: &str = "createdMs";

pub struct NoSqlCache {
    client: Arc<CosmosNoSqlClient>,
    database: String,
    container: String,
    index_kind: VectorIndexKind,
    similarity: SimilarityMetric,
    dimensions: usize,
}

impl NoSqlCache {
    pub fn new(
        client: Arc<CosmosNoSqlClient>,
        database: &str,
        container: &str,
        index_kind: VectorIndexKind,
        similarity: SimilarityMetric,
        dimensions: usize,
    ) -> Self {
        Self {
            client,
            database: database.to_string(),
            container: container.to_string(),
            index_kind,
            similarity,
            dimensions,
        }
    }

    async fn query(&self, query: Value) -> Result<Vec<Value>, DomainError> {
        self.client
            .query(&self.database, &self.container, &self.container, query)
            .await
    }
}

fn decode(value: Value) -> Result<CacheEntry, DomainError> {
    serde_json::from_value(value).map_err(|e| DomainError::Parse(format!("cache entry: {e}")))
}

#[async_trait::async_trait]
impl SemanticCache for NoSqlCache {
    async fn ensure_index(&self) -> Result<(), DomainError> {
        self.client.create_database_if_missing(&self.database).await?;
        let definition = container_definition(
            &self.container,
            Some((
                VECTOR_PATH,
                self.index_kind.nosql_type(),
                self.similarity.nosql_name(),
                self.dimensions,
            )),
        );
        self.client.create_container_if_missing(&self.database, definition).await
    }

    async fn insert(&self, entry: &CacheEntry) -> Result<(), DomainError> {
        let mut document = serde_json::to_value(entry)?;
        document[PARTITION_KEY] = Value::String(self.container.clone());
        document[ORDER_FIELD] = json!(entry.created_at.timestamp_millis());
        self.client
            .upsert_document(&self.database, &self.container, &self.container, document)
            .await
    }

    async fn lookup(&self, vector: &[f32], threshold: f64) -> Result<Option<CacheEntry>, DomainError> {
        let rows = self.query(vector_query(VECTOR_PATH, vector, 1)).await?;
        let Some(mut row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let score = row["similarityScore"].as_f64().unwrap_or_default();
        if !self.similarity.passes(score, threshold) {
            tracing::debug!(score, threshold, "closest cache entry below threshold");
            return Ok(None);
        }
        decode(row["document"].take()).map(Some)
    }

    async fn recent(&self, n: usize) -> Result<Vec<CacheEntry>, DomainError> {
        if n == 0 {
            return Ok(vec![]);
        }
        let rows = self
            .query(json!({
                "query": format!("SELECT TOP @n * FROM c ORDER BY c.{ORDER_FIELD} DESC"),
                "parameters": [{ "name": "@n", "value": n }],
            }))
            .await?;
        let mut entries = rows.into_iter().map(decode).collect::<Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }

    async fn clear(&self) -> Result<u64, DomainError> {
        let ids = self
            .query(json!({ "query": "SELECT VALUE c.id FROM c", "parameters": [] }))
            .await?;
        let mut removed = 0;
        for id in ids.iter().filter_map(Value::as_str) {
            self.client
                .delete_document(&self.database, &self.container, &self.container, id)
                .await?;
            removed += 1;
        }
        Ok(removed)
    }
}
