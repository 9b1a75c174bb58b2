use crate::domain::entities::completion::Completion;
use crate::domain::error::DomainError;
use crate::domain::values::chat_role::ChatMessage;

#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, DomainError>;
    fn model(&self) -> &str;
}
