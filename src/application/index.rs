use crate::domain::error::DomainError;
use crate::domain::ports::chat_history::ChatHistory;
use crate::domain::ports::semantic_cache::SemanticCache;
use crate::domain::ports::vector_store::VectorStore;
use std::sync::Arc;

pub struct IndexUseCase {
    vector_store: Arc<dyn VectorStore>,
    cache: Arc<dyn SemanticCache>,
    history: Arc<dyn ChatHistory>,
}

impl IndexUseCase {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        cache: Arc<dyn SemanticCache>,
        history: Arc<dyn ChatHistory>,
    ) -> Self {
        Self { vector_store, cache, history }
    }

    pub async fn execute(&self) -> Result<(), DomainError> {
        self.vector_store.ensure_index().await?;
        self.cache.ensure_index().await?;
        self.history.ensure_ready().await?;
        tracing::info!("vector indexes ready");
        Ok(())
    }
}
