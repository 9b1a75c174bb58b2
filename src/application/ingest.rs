use crate::domain::entities::item::Item;
use crate::domain::error::DomainError;
use crate::domain::ports::embedding_port::EmbeddingProvider;
use crate::domain::ports::vector_store::VectorStore;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

const BATCH_SIZE: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Fields embedded into the vector; empty means every string field.
    pub fields: Vec<String>,
    pub id_field: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub loaded: usize,
    pub skipped: usize,
}

pub struct IngestUseCase {
    embedder: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
}

impl IngestUseCase {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, vector_store }
    }

    pub async fn load_file(&self, path: &Path, options: &IngestOptions) -> Result<IngestReport, DomainError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DomainError::InvalidInput(format!("{}: {e}", path.display())))?;
        let value: Value = serde_json::from_str(&raw)?;
        self.load_values(value, options).await
    }

    /// Accepts a JSON array of objects or `{ "items": [...] }`.
    pub async fn load_values(&self, value: Value, options: &IngestOptions) -> Result<IngestReport, DomainError> {
        let records = match value {
            Value::Array(records) => records,
            Value::Object(mut map) => match map.remove("items") {
                Some(Value::Array(records)) => records,
                _ => return Err(DomainError::InvalidInput("expected an array or an `items` array".into())),
            },
            _ => return Err(DomainError::InvalidInput("expected an array or an `items` array".into())),
        };
        let id_field = if options.id_field.is_empty() { "id" } else { options.id_field.as_str() };

        let mut report = IngestReport::default();
        let mut pending: Vec<(Item, String)> = Vec::new();
        for record in records {
            let item = Item::from_json(record, id_field)?;
            let text = item.embedding_text(&options.fields);
            if text.trim().is_empty() {
                tracing::warn!(id = %item.id, "item has no text to embed, skipping");
                report.skipped += 1;
                continue;
            }
            pending.push((item, text));
        }

        for batch in pending.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|(_, t)| t.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(DomainError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            let expected = self.embedder.dimension();
            let mut items = Vec::with_capacity(batch.len());
            for ((item, _), vector) in batch.iter().zip(vectors) {
                if expected > 0 && vector.len() != expected {
                    return Err(DomainError::InvalidInput(format!(
                        "embedding for {} has {} dimensions, expected {expected}",
                        item.id,
                        vector.len()
                    )));
                }
                let mut item = item.clone();
                item.vector = vector;
                items.push(item);
            }
            self.vector_store.upsert(&items).await?;
            report.loaded += items.len();
            tracing::info!(loaded = report.loaded, "ingested batch");
        }

        Ok(report)
    }
}
