use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Questions stop being eligible once they have been asked this many times.
pub const MAX_TIMES_ASKED: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    /// Reference answers in table order. Similarity is measured against the first one.
    pub answers: Vec<String>,
    /// Helpfulness rating, moved by +1/-1 user feedback.
    pub rating: i64,
    pub times_asked: u32,
}

impl Question {
    pub fn new(prompt: &str, answers: &[&str]) -> Self {
        Self {
            prompt: prompt.to_string(),
            answers: answers.iter().map(|a| a.to_string()).collect(),
            rating: 0,
            times_asked: 0,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.times_asked < MAX_TIMES_ASKED
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    pub sender: String,
    pub text: String,
    pub is_user: bool,
}

impl Message {
    pub fn interviewer(text: impl Into<String>) -> Self {
        Self {
            sender: "AI".to_string(),
            text: text.into(),
            is_user: false,
        }
    }

    pub fn candidate(text: impl Into<String>) -> Self {
        Self {
            sender: "You".to_string(),
            text: text.into(),
            is_user: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Conversation {
    pub id: u64,
    pub title: String,
    /// Local time, `%Y-%m-%d %H:%M`.
    pub timestamp: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerLogEntry {
    pub question: String,
    pub answer: String,
    /// The question's helpfulness rating when the answer was submitted.
    pub rating: i64,
    /// RFC 3339 local time.
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuestionStat {
    pub question: String,
    pub rating: i64,
    pub times_asked: u32,
    pub eligible: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConversationSummary {
    pub id: u64,
    pub title: String,
    pub timestamp: String,
    pub message_count: usize,
}

impl From<&Conversation> for ConversationSummary {
    fn from(c: &Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            timestamp: c.timestamp.clone(),
            message_count: c.messages.len(),
        }
    }
}
