use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A user-supplied document plus its embedding.
///
/// The database stores items flattened: the document's own fields, `id`,
/// and the embedding under the configured vector field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub document: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub vector: Vec<f32>,
}

/// A search hit with the score reported by the vector index.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredItem {
    pub item: Item,
    pub score: f64,
}

impl Item {
    /// Build an item from a raw JSON object, taking its id from `id_field`.
    /// Numeric ids are stringified; a missing id gets a fresh UUID.
    pub fn from_json(value: Value, id_field: &str) -> Result<Self, DomainError> {
        let Value::Object(mut document) = value else {
            return Err(DomainError::InvalidInput("item must be a JSON object".into()));
        };
        let id = match document.get(id_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };
        document.remove("_id");
        document.remove("id");
        Ok(Self { id, document, vector: vec![] })
    }

    /// Text handed to the embedding model: the named fields joined by
    /// newlines, or every top-level string field when `fields` is empty.
    pub fn embedding_text(&self, fields: &[String]) -> String {
        let parts: Vec<String> = if fields.is_empty() {
            self.document
                .values()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        } else {
            fields
                .iter()
                .filter_map(|f| match self.document.get(f) {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                })
                .collect()
        };
        parts
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Flattened database representation.
    pub fn to_stored(&self, vector_field: &str) -> Value {
        let mut doc = self.document.clone();
        doc.insert("id".into(), Value::String(self.id.clone()));
        doc.insert(
            vector_field.into(),
            Value::Array(self.vector.iter().map(|f| Value::from(*f as f64)).collect()),
        );
        Value::Object(doc)
    }

    /// Inverse of [`Item::to_stored`]. Backend bookkeeping fields (`_id`,
    /// `_rid`, `_ts`, ...) are dropped.
    pub fn from_stored(value: Value, vector_field: &str) -> Result<Self, DomainError> {
        let Value::Object(mut doc) = value else {
            return Err(DomainError::Parse("stored item is not an object".into()));
        };
        let id = match doc.remove("id") {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(DomainError::Parse("stored item has no id".into())),
        };
        let vector = match doc.remove(vector_field) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect(),
            _ => vec![],
        };
        doc.retain(|k, _| !k.starts_with('_'));
        Ok(Self { id, document: doc, vector })
    }

    /// The document as shown to the model: id plus fields, no vector.
    pub fn display_json(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("id".into(), Value::String(self.id.clone()));
        for (k, v) in &self.document {
            if k != "id" {
                doc.insert(k.clone(), v.clone());
            }
        }
        Value::Object(doc)
    }
}
