use crate::domain::entities::chat_turn::ChatTurn;
use crate::domain::error::DomainError;
use crate::domain::ports::chat_history::ChatHistory;
use std::sync::Arc;

pub struct HistoryUseCase {
    history: Arc<dyn ChatHistory>,
}

impl HistoryUseCase {
    pub fn new(history: Arc<dyn ChatHistory>) -> Self {
        Self { history }
    }

    pub async fn turns(&self, session_id: &str, limit: usize) -> Result<Vec<ChatTurn>, DomainError> {
        self.history.turns(session_id, limit).await
    }
}
