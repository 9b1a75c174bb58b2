use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::semantic_cache::SemanticCache;
use crate::infrastructure::mongo::{run_index_command, search_pipeline, VectorIndexSpec};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Collection, Database};

const VECTOR_PATH: &str = "vector";

pub struct MongoCache {
    db: Database,
    collection: Collection<Document>,
    name: String,
    spec: VectorIndexSpec,
}

impl MongoCache {
    pub fn new(db: Database, collection: &str, spec: VectorIndexSpec) -> Self {
        Self {
            collection: db.collection(collection),
            db,
            name: collection.to_string(),
            spec,
        }
    }
}

fn decode(doc: Document) -> Result<CacheEntry, DomainError> {
    mongodb::bson::from_document(doc).map_err(|e| DomainError::Parse(format!("cache entry: {e}")))
}

#[async_trait::async_trait]
impl SemanticCache for MongoCache {
    async fn ensure_index(&self) -> Result<(), DomainError> {
        let command = self.spec.create_command(&self.name, "CacheVectorIndex", VECTOR_PATH);
        run_index_command(&self.db, command).await
    }

    async fn insert(&self, entry: &CacheEntry) -> Result<(), DomainError> {
        let document = mongodb::bson::to_document(entry)
            .map_err(|e| DomainError::Parse(format!("cache entry: {e}")))?;
        self.collection.insert_one(document).await?;
        Ok(())
    }

    async fn lookup(&self, vector: &[f32], threshold: f64) -> Result<Option<CacheEntry>, DomainError> {
        let cursor = self
            .collection
            .aggregate(search_pipeline(vector, VECTOR_PATH, 1))
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let score = row.get_f64("similarityScore").unwrap_or_default();
        if !self.spec.similarity.passes(score, threshold) {
            tracing::debug!(score, threshold, "closest cache entry below threshold");
            return Ok(None);
        }
        let document = row
            .get_document("document")
            .map_err(|e| DomainError::Parse(format!("cache result: {e}")))?
            .clone();
        decode(document).map(Some)
    }

    async fn recent(&self, n: usize) -> Result<Vec<CacheEntry>, DomainError> {
        if n == 0 {
            return Ok(vec![]);
        }
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "_id": -1 })
            .limit(n as i64)
            .await?;
        let rows: Vec<Document> = cursor.try_collect().await?;
        let mut entries = rows.into_iter().map(decode).collect::<Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }

    async fn clear(&self) -> Result<u64, DomainError> {
        Ok(self.collection.delete_many(doc! {}).await?.deleted_count)
    }
}
