use crate::domain::entities::chat_turn::ChatTurn;
use crate::domain::error::DomainError;

#[async_trait::async_trait]
pub trait ChatHistory: Send + Sync {
    /// Create backing storage and indexes. Idempotent.
    async fn ensure_ready(&self) -> Result<(), DomainError> {
        Ok(())
    }
    async fn append(&self, turn: &ChatTurn) -> Result<(), DomainError>;
    /// The last `limit` turns of a session, oldest first.
    async fn turns(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, DomainError>;
    /// Index the next appended turn should carry.
    async fn next_turn(&self, session_id: &str) -> Result<u32, DomainError>;
}
