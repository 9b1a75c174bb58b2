use crate::application::prompt::{build_messages, DEFAULT_SYSTEM_PROMPT};
use crate::application::search::SearchUseCase;
use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::entities::chat_turn::ChatTurn;
use crate::domain::entities::completion::TokenUsage;
use crate::domain::error::DomainError;
use crate::domain::ports::chat_history::ChatHistory;
use crate::domain::ports::completion_port::CompletionProvider;
use crate::domain::ports::semantic_cache::SemanticCache;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AskOptions {
    pub session_id: String,
    /// Number of items retrieved into the prompt.
    pub limit: usize,
    pub use_cache: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self { session_id: "default".into(), limit: 3, use_cache: true }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub content: String,
    pub cached: bool,
    /// Ids of the retrieved items the answer was grounded on.
    pub sources: Vec<String>,
    pub usage: TokenUsage,
    pub turn: u32,
}

/// Session ids become part of stored document ids, which Cosmos NoSQL
/// refuses when they contain `/`, `\`, `?` or `#`.
fn validate_session_id(session_id: &str) -> Result<(), DomainError> {
    if session_id.trim().is_empty() {
        return Err(DomainError::InvalidInput("session id is empty".into()));
    }
    if let Some(c) = session_id.chars().find(|c| matches!(c, '/' | '\\' | '?' | '#')) {
        return Err(DomainError::InvalidInput(format!(
            "session id may not contain '{c}': {session_id}"
        )));
    }
    Ok(())
}

pub struct AskUseCase {
    search: Arc<SearchUseCase>,
    completer: Arc<dyn CompletionProvider>,
    cache: Arc<dyn SemanticCache>,
    history: Arc<dyn ChatHistory>,
    system_prompt: String,
    cache_threshold: f64,
    context_turns: usize,
}

impl AskUseCase {
    pub fn new(
        search: Arc<SearchUseCase>,
        completer: Arc<dyn CompletionProvider>,
        cache: Arc<dyn SemanticCache>,
        history: Arc<dyn ChatHistory>,
        cache_threshold: f64,
        context_turns: usize,
    ) -> Self {
        Self {
            search,
            completer,
            cache,
            history,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            cache_threshold,
            context_turns,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub async fn execute(&self, question: &str, options: &AskOptions) -> Result<Answer, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::InvalidInput("question is empty".into()));
        }
        validate_session_id(&options.session_id)?;

        let vector = self.search.embed_query(question).await?;

        if options.use_cache {
            if let Some(hit) = self.cache.lookup(&vector, self.cache_threshold).await? {
                tracing::info!(cache_id = %hit.id, "semantic cache hit");
                let turn = self.record_turn(&options.session_id, question, &hit.completion).await?;
                return Ok(Answer {
                    content: hit.completion,
                    cached: true,
                    sources: vec![],
                    usage: TokenUsage::default(),
                    turn,
                });
            }
        }

        let hits = self.search.search_vector(&vector, options.limit).await?;
        let context = self.cache.recent(self.context_turns).await?;
        let messages = build_messages(&self.system_prompt, &hits, &context, question);
        tracing::debug!(hits = hits.len(), context = context.len(), "prompt assembled");

        let completion = self.completer.complete(&messages).await?;
        tracing::info!(
            model = %completion.model,
            total_tokens = completion.usage.total_tokens,
            "completion received"
        );

        self.cache
            .insert(&CacheEntry::new(question.to_string(), &completion, vector))
            .await?;
        let turn = self.record_turn(&options.session_id, question, &completion.content).await?;

        Ok(Answer {
            content: completion.content,
            cached: false,
            sources: hits.into_iter().map(|h| h.item.id).collect(),
            usage: completion.usage,
            turn,
        })
    }

    async fn record_turn(&self, session_id: &str, question: &str, answer: &str) -> Result<u32, DomainError> {
        let turn = self.history.next_turn(session_id).await?;
        self.history
            .append(&ChatTurn::new(session_id, turn, question.to_string(), answer.to_string()))
            .await?;
        Ok(turn)
    }

    pub async fn clear_cache(&self) -> Result<u64, DomainError> {
        let removed = self.cache.clear().await?;
        tracing::info!(removed, "semantic cache cleared");
        Ok(removed)
    }
}
