//! Conversation transcript model and prior-attempt counting.
//!
//! The iteration budget is not persisted anywhere by this crate. Every run
//! recounts the fix requests already present in the conversation.

use crate::models::{IterationState, FIX_TASK};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Message {
    /// A `user` message with a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                kind: "text".to_string(),
                text: Some(text.into()),
            }],
        }
    }

    fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter(|p| p.kind == "text")
            .filter_map(|p| p.text.as_deref())
    }
}

/// Exact substring a compact fix request payload contains.
pub fn fix_marker() -> String {
    format!("\"task\":\"{}\"", FIX_TASK)
}

/// True when `message` is a fix request previously issued by this engine.
pub fn is_fix_request(message: &Message, marker: &str) -> bool {
    message.role == "user" && message.texts().any(|t| t.contains(marker))
}

/// Number of fix requests already present in `messages`.
pub fn count_prior_attempts(messages: &[Message]) -> u32 {
    let marker = fix_marker();
    let n = messages.iter().filter(|m| is_fix_request(m, &marker)).count();
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Rebuild the iteration budget for this run from the transcript.
pub fn derive_state(messages: &[Message], max_iterations: u32) -> IterationState {
    IterationState::new(count_prior_attempts(messages), max_iterations)
}
