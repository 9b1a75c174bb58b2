use crate::domain::entities::cache_entry::CacheEntry;
use crate::domain::entities::item::ScoredItem;
use crate::domain::values::chat_role::ChatMessage;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an intelligent assistant. \
Answer the user's question using only the documents listed below. \
If the documents do not contain the answer, say you don't know. \
Do not include links or images.";

/// System prompt with retrieved documents, prior exchanges, then the question.
pub fn build_messages(
    system_prompt: &str,
    hits: &[ScoredItem],
    context: &[CacheEntry],
    question: &str,
) -> Vec<ChatMessage> {
    let mut system = String::from(system_prompt);
    system.push_str("\n\nList of documents:\n");
    for hit in hits {
        system.push_str(&hit.item.display_json().to_string());
        system.push('\n');
    }

    let mut messages = Vec::with_capacity(2 + context.len() * 2);
    messages.push(ChatMessage::system(system));
    for entry in context {
        messages.push(ChatMessage::user(entry.prompt.clone()));
        messages.push(ChatMessage::assistant(entry.completion.clone()));
    }
    messages.push(ChatMessage::user(question));
    messages
}
