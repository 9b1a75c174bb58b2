use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Completion error: {0}")]
    Completion(String),

    /// Upstream refused or failed the request in a way worth retrying (429, 5xx, network).
    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::Transient(_))
    }
}

impl From<mongodb::error::Error> for DomainError {
    fn from(e: mongodb::error::Error) -> Self {
        DomainError::Database(format!("MongoDB: {e}"))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Parse(e.to_string())
    }
}
