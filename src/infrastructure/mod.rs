pub mod completions;
pub mod embeddings;
pub(crate) mod http;
pub mod memory;
pub mod mongo;
pub mod nosql;
