use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::completion::Completion;

/// One answered prompt, kept for semantic-cache hits and as conversation
/// context. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: String,
    pub prompt: String,
    pub completion: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    pub model: String,
    pub vector: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(prompt: String, completion: &Completion, vector: Vec<f32>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            prompt,
            completion: completion.content.clone(),
            prompt_tokens: completion.usage.prompt_tokens,
            completion_tokens: completion.usage.completion_tokens,
            total_tokens: completion.usage.total_tokens,
            model: completion.model.clone(),
            vector,
            created_at: Utc::now(),
        }
    }
}
