use crate::domain::entities::chat_turn::ChatTurn;
use crate::domain::error::DomainError;
use crate::domain::ports::chat_history::ChatHistory;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryHistory {
    turns: Mutex<Vec<ChatTurn>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ChatHistory for MemoryHistory {
    async fn append(&self, turn: &ChatTurn) -> Result<(), DomainError> {
        let mut turns = self.turns.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        turns.push(turn.clone());
        Ok(())
    }

    async fn turns(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, DomainError> {
        let turns = self.turns.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        let mut session: Vec<ChatTurn> = turns
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect();
        session.sort_by_key(|t| t.turn);
        let skip = session.len().saturating_sub(limit);
        Ok(session.split_off(skip))
    }

    async fn next_turn(&self, session_id: &str) -> Result<u32, DomainError> {
        let turns = self.turns.lock().map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(turns
            .iter()
            .filter(|t| t.session_id == session_id)
            .map(|t| t.turn + 1)
            .max()
            .unwrap_or(0))
    }
}
