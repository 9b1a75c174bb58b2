pub mod cache_repo;
pub mod history_repo;
pub mod vector_store;
