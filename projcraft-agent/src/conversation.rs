//! Conversation log.
//!
//! One append-only store with two read views: the full event list for status
//! reporting, and a bounded recent window used when building prompts.

use crate::config::MAX_CONVERSATION_WINDOW;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::info;

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Planner,
    Architect,
    Developer,
    Reviewer,
    Tester,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Architect => "architect",
            Self::Developer => "developer",
            Self::Reviewer => "reviewer",
            Self::Tester => "tester",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: AgentRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<ConversationMessage>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: AgentRole, content: impl Into<String>, metadata: Map<String, Value>) {
        let content = content.into();
        info!(role = role.as_str(), "{}", preview(&content, PREVIEW_CHARS));
        self.messages.push(ConversationMessage {
            role,
            content,
            timestamp: Utc::now(),
            metadata,
        });
    }

    /// Every message, oldest first
    pub fn events(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// The last `n` messages, never more than the window cap
    pub fn recent(&self, n: usize) -> &[ConversationMessage] {
        let n = n.min(MAX_CONVERSATION_WINDOW).min(self.messages.len());
        &self.messages[self.messages.len() - n..]
    }

    /// Recent window as prompt text, one `[role]: content` line per message
    pub fn render_recent(&self, n: usize) -> String {
        self.recent(n)
            .iter()
            .map(|m| format!("[{}]: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Distinct roles in order of first appearance
    pub fn roles(&self) -> Vec<AgentRole> {
        let mut roles = Vec::new();
        for message in &self.messages {
            if !roles.contains(&message.role) {
                roles.push(message.role);
            }
        }
        roles
    }
}

/// At most `max` characters of `text`, with `...` when cut
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
