use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user/assistant exchange within a session. `turn` counts from 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub id: String,
    pub session_id: String,
    pub turn: u32,
    pub user: String,
    pub assistant: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(session_id: &str, turn: u32, user: String, assistant: String) -> Self {
        Self {
            id: format!("{session_id}:{turn}"),
            session_id: session_id.to_string(),
            turn,
            user,
            assistant,
            created_at: Utc::now(),
        }
    }
}
