use crate::domain::entities::chat_turn::ChatTurn;
use crate::domain::error::DomainError;
use crate::domain::ports::chat_history::ChatHistory;
use crate::infrastructure::nosql::{container_definition, CosmosNoSqlClient, PARTITION_KEY};
use serde_json::{json, Value};
use std::sync::Arc;

/// Chat turns partitioned by session id.
pub struct NoSqlHistory {
    client: Arc<CosmosNoSqlClient>,
    database: String,
    container: String,
}

impl NoSqlHistory {
    pub fn new(client: Arc<CosmosNoSqlClient>, database: &str, container: &str) -> Self {
        Self {
            client,
            database: database.to_string(),
            container: container.to_string(),
        }
    }

    async fn last_turns(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, DomainError> {
        let rows = self
            .client
            .query(
                &self.database,
                &self.container,
                session_id,
                json!({
                    "query": "SELECT TOP @n * FROM c WHERE c.session_id = @session ORDER BY c.turn DESC",
                    "parameters": [
                        { "name": "@n", "value": limit },
                        { "name": "@session", "value": session_id },
                    ],
                }),
            )
            .await?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| DomainError::Parse(format!("chat turn: {e}")))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl ChatHistory for NoSqlHistory {
    async fn ensure_ready(&self) -> Result<(), DomainError> {
        self.client.create_database_if_missing(&self.database).await?;
        self.client
            .create_container_if_missing(&self.database, container_definition(&self.container, None))
            .await
    }

    async fn append(&self, turn: &ChatTurn) -> Result<(), DomainError> {
        let mut document = serde_json::to_value(turn)?;
        document[PARTITION_KEY] = Value::String(turn.session_id.clone());
        self.client
            .upsert_document(&self.database, &self.container, &turn.session_id, document)
            .await
    }

    async fn turns(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, DomainError> {
        if limit == 0 {
            return Ok(vec![]);
        }
        let mut turns = self.last_turns(session_id, limit).await?;
        turns.reverse();
        Ok(turns)
    }

    async fn next_turn(&self, session_id: &str) -> Result<u32, DomainError> {
        let last = self.last_turns(session_id, 1).await?;
        Ok(last.first().map(|t| t.turn + 1).unwrap_or(0))
    }
}
