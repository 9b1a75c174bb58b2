use crate::domain::entities::item::{Item, ScoredItem};
use crate::domain::error::DomainError;
use crate::domain::ports::vector_store::VectorStore;
use crate::infrastructure::mongo::{run_index_command, search_pipeline, to_json, VectorIndexSpec};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};

pub struct MongoVectorStore {
    db: Database,
    collection: Collection<Document>,
    name: String,
    vector_field: String,
    spec: VectorIndexSpec,
}

impl MongoVectorStore {
    pub fn new(db: Database, collection: &str, vector_field: &str, spec: VectorIndexSpec) -> Self {
        Self {
            collection: db.collection(collection),
            db,
            name: collection.to_string(),
            vector_field: vector_field.to_string(),
            spec,
        }
    }
}

#[async_trait::async_trait]
impl VectorStore for MongoVectorStore {
    async fn ensure_index(&self) -> Result<(), DomainError> {
        let command = self.spec.create_command(&self.name, "VectorSearchIndex", &self.vector_field);
        run_index_command(&self.db, command).await
    }

    async fn upsert(&self, items: &[Item]) -> Result<(), DomainError> {
        for item in items {
            let document = mongodb::bson::to_document(&item.to_stored(&self.vector_field))
                .map_err(|e| DomainError::Parse(format!("item {}: {e}", item.id)))?;
            self.collection
                .replace_one(doc! { "id": item.id.as_str() }, document)
                .upsert(true)
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
        let cursor = self
            .collection
            .aggregate(search_pipeline(vector, &self.vector_field, k))
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let score = row.get_f64("similarityScore").unwrap_or_default();
            let document = row
                .get_document("document")
                .map_err(|e| DomainError::Parse(format!("search result: {e}")))?
                .clone();
            let item = Item::from_stored(to_json(document), &self.vector_field)?;
            hits.push(ScoredItem { item, score });
        }
        Ok(hits)
    }

    async fn count(&self) -> Result<u64, DomainError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}
