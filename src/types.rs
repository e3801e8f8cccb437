use serde::{Deserialize, Serialize};

/// One row of the recommendation corpus: a mood/category label and a
/// coping tip for it. Corpus order is meaningful (tie-break key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub label: String,
    pub tip: String,
}

impl CorpusEntry {
    pub fn new(label: impl Into<String>, tip: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tip: tip.into(),
        }
    }

    /// The text the vectorizer sees: label plus tip, matching how the
    /// corpus rows are fit and queried.
    pub fn document(&self) -> String {
        format!("{} {}", self.label, self.tip)
    }
}

/// A ranked recommendation with its similarity score in [-1, 1].
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub label: String,
    pub tip: String,
    pub score: f64,
}

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A decrypted chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

/// Chat listing row.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSummary {
    pub id: String,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: usize,
}

/// Aggregated usage counters over a date window.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageStats {
    pub total_chats: usize,
    pub total_messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
    pub recommendations_served: usize,
    pub avg_messages_per_chat: f64,
    /// (day, message count) pairs, oldest first.
    pub daily_activity: Vec<(String, usize)>,
}

/// A crisis/self-help resource shown alongside recommendations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}
