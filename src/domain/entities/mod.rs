pub mod cache_entry;
pub mod chat_turn;
pub mod completion;
pub mod item;
