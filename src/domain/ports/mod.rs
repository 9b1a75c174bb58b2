pub mod chat_history;
pub mod completion_port;
pub mod embedding_port;
pub mod semantic_cache;
pub mod vector_store;
