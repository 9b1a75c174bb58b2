use crate::domain::entities::chat_turn::ChatTurn;
use crate::domain::error::DomainError;
use crate::domain::ports::chat_history::ChatHistory;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database, IndexModel};

pub struct MongoHistory {
    collection: Collection<ChatTurn>,
}

impl MongoHistory {
    pub fn new(db: &Database, collection: &str) -> Self {
        Self { collection: db.collection(collection) }
    }
}

#[async_trait::async_trait]
impl ChatHistory for MongoHistory {
    async fn ensure_ready(&self) -> Result<(), DomainError> {
        let index = IndexModel::builder()
            .keys(doc! { "session_id": 1, "turn": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    async fn append(&self, turn: &ChatTurn) -> Result<(), DomainError> {
        self.collection.insert_one(turn).await?;
        Ok(())
    }

    async fn turns(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, DomainError> {
        if limit == 0 {
            return Ok(vec![]);
        }
        let cursor = self
            .collection
            .find(doc! { "session_id": session_id })
            .sort(doc! { "turn": -1 })
            .limit(limit as i64)
            .await?;
        let mut turns: Vec<ChatTurn> = cursor.try_collect().await?;
        turns.reverse();
        Ok(turns)
    }

    async fn next_turn(&self, session_id: &str) -> Result<u32, DomainError> {
        let last = self
            .collection
            .find_one(doc! { "session_id": session_id })
            .sort(doc! { "turn": -1 })
            .await?;
        Ok(last.map(|t| t.turn + 1).unwrap_or(0))
    }
}
