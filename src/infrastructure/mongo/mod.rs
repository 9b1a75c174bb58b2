//! Azure Cosmos DB for MongoDB vCore.
//!
//! Vector indexes are created with the `createIndexes` command and a
//! `cosmosSearch` key; queries go through the `$search` aggregation stage.

pub mod cache_repo;
pub mod history_repo;
pub mod vector_store;

use crate::domain::error::DomainError;
use crate::domain::values::vector_index::{SimilarityMetric, VectorIndexKind};
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::{Client, Database};

pub async fn connect(uri: &str, database: &str) -> Result<Database, DomainError> {
    let client = Client::with_uri_str(uri).await?;
    tracing::info!(database, "connected to MongoDB vCore");
    Ok(client.database(database))
}

/// Index settings shared by the item and cache collections.
#[derive(Debug, Clone)]
pub struct VectorIndexSpec {
    pub kind: VectorIndexKind,
    pub similarity: SimilarityMetric,
    pub dimensions: usize,
}

impl VectorIndexSpec {
    pub fn create_command(&self, collection: &str, index_name: &str, path: &str) -> Document {
        let dimensions = self.dimensions as i32;
        let mut options = doc! {
            "kind": self.kind.mongo_kind(),
            "similarity": self.similarity.mongo_name(),
            "dimensions": dimensions,
        };
        match self.kind {
            VectorIndexKind::Ivf => {
                options.insert("numLists", 1);
            }
            VectorIndexKind::Hnsw => {
                options.insert("m", 16);
                options.insert("efConstruction", 64);
            }
            VectorIndexKind::DiskAnn => {
                options.insert("maxDegree", 32);
                options.insert("lBuild", 50);
            }
        }
        doc! {
            "createIndexes": collection,
            "indexes": [{
                "name": index_name,
                "key": { path: "cosmosSearch" },
                "cosmosSearchOptions": options,
            }],
        }
    }
}

/// `$search` + `$project` pipeline returning `{ similarityScore, document }`.
pub fn search_pipeline(vector: &[f32], path: &str, k: usize) -> Vec<Document> {
    let vector: Vec<Bson> = vector.iter().map(|f| Bson::Double(*f as f64)).collect();
    let k = k as i32;
    vec![
        doc! {
            "$search": {
                "cosmosSearch": {
                    "vector": vector,
                    "path": path,
                    "k": k,
                },
                "returnStoredSource": true,
            }
        },
        doc! {
            "$project": {
                "similarityScore": { "$meta": "searchScore" },
                "document": "$$ROOT",
            }
        },
    ]
}

pub(crate) async fn run_index_command(db: &Database, command: Document) -> Result<(), DomainError> {
    match db.run_command(command).await {
        Ok(reply) => {
            tracing::info!(?reply, "vector index ready");
            Ok(())
        }
        Err(e) => {
            let code = match *e.kind {
                ErrorKind::Command(ref c) => Some(c.code),
                _ => None,
            };
            // IndexOptionsConflict / IndexKeySpecsConflict: an index is already there.
            if matches!(code, Some(85) | Some(86)) {
                tracing::warn!(error = %e, "vector index already exists with different options");
                Ok(())
            } else {
                Err(e.into())
            }
        }
    }
}

pub(crate) fn to_json(doc: Document) -> serde_json::Value {
    Bson::Document(doc).into_relaxed_extjson()
}
