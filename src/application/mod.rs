pub mod ask;
pub mod history;
pub mod index;
pub mod ingest;
pub mod prompt;
pub mod search;
