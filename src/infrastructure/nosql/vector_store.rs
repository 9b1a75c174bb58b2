use crate::domain::entities::item::{Item, ScoredItem};
use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::VectorStore;
use crate::domain::values::vector_index::{SimilarityMetric, VectorIndexKind};
use crate::infrastructure::nosql::{
    container_definition, strip_system_fields, validate_field, vector_query, CosmosNoSqlClient,
    PARTITION_KEY,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct NoSqlVectorStore {
    client: Arc<CosmosNoSqlClient>,
    database: String,
    container: String,
    vector_field: String,
    index_kind: VectorIndexKind,
    similarity: SimilarityMetric,
    dimensions: usize,
}

impl NoSqlVectorStore {
    pub fn new(
        client: Arc<CosmosNoSqlClient>,
        database: &str,
        container: &str,
        vector_field: &str,
        index_kind: VectorIndexKind,
        similarity: SimilarityMetric,
        dimensions: usize,
    ) -> Result<Self, DomainError> {
        validate_field(vector_field)?;
        Ok(Self {
            client,
            database: database.to_string(),
            container: container.to_string(),
            vector_field: vector_field.to_string(),
            index_kind,
            similarity,
            dimensions,
        })
    }
}

#[async_trait::async_trait]
impl VectorStore for NoSqlVectorStore {
    async fn ensure_index(&self) -> Result<(), DomainError> {
        self.client.create_database_if_missing(&self.database).await?;
        let definition = container_definition(
            &self.container,
            Some((
                &self.vector_field,
                self.index_kind.nosql_type(),
                self.similarity.nosql_name(),
                self.dimensions,
            )),
        );
        self.client.create_container_if_missing(&self.database, definition).await
    }

    async fn upsert(&self, items: &[Item]) -> Result<(), DomainError> {
        for item in items {
            let mut document = item.to_stored(&self.vector_field);
            document[PARTITION_KEY] = Value::String(self.container.clone());
            self.client
                .upsert_document(&self.database, &self.container, &self.container, document)
                .await?;
        }
        Ok(())
    }

    async fn vector_search(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredItem>, DomainError> {
        if vector.is_empty() {
            return Err(DomainError::InvalidInput("query vector is empty".into()));
        }
        if k == 0 {
            return Ok(vec![]);
        }
        let rows = self
            .client
            .query(
                &self.database,
                &self.container,
                &self.container,
                vector_query(&self.vector_field, vector, k),
            )
            .await?;

        rows.into_iter()
            .map(|mut row| {
                let score = row["similarityScore"].as_f64().unwrap_or_default();
                let mut document = row["document"].take();
                strip_system_fields(&mut document);
                let item = Item::from_stored(document, &self.vector_field)?;
                Ok(ScoredItem { item, score })
            })
            .collect()
    }

    async fn count(&self) -> Result<u64, DomainError> {
        let rows = self
            .client
            .query(
                &self.database,
                &self.container,
                &self.container,
                json!({ "query": "SELECT VALUE COUNT(1) FROM c", "parameters": [] }),
            )
            .await?;
        // Aggregates can come back as one partial count per page.
        Ok(rows.iter().filter_map(Value::as_u64).sum())
    }
}
