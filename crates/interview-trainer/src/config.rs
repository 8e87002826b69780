use std::path::{Path, PathBuf};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Interactive interview on the terminal.
    Cli,
    /// MCP tool server on stdio.
    Mcp,
}

impl Mode {
    fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "cli" => Ok(Self::Cli),
            "mcp" => Ok(Self::Mcp),
            other => Err(AppError::Config(format!(
                "INTERVIEW_TRAINER_MODE must be 'cli' or 'mcp', got '{other}'"
            ))),
        }
    }
}

/// Application configuration loaded from environment variables.
///
/// Redis URL is optional; without it reference embeddings are recomputed on every
/// answer.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    /// Directory holding the conversation file and the answer log.
    pub data_dir: String,
    pub conversations_file: String,
    pub answer_log_file: String,
    /// Model ID sent to the OpenAI-compatible host for sentiment classification.
    pub sentiment_model: String,
    pub redis_url: Option<String>,
}

impl Config {
    /// All optional:
    /// - `INTERVIEW_TRAINER_MODE`: `cli` (default) or `mcp`
    /// - `INTERVIEW_TRAINER_DATA_DIR` (default: ".")
    /// - `INTERVIEW_TRAINER_CONVERSATIONS_FILE` (default: "conversations.json")
    /// - `INTERVIEW_TRAINER_ANSWER_LOG` (default: "answer_log.json")
    /// - `INTERVIEW_TRAINER_SENTIMENT_MODEL` (default: "sentiment")
    /// - `REDIS_URL`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let mode = Mode::parse(&get("INTERVIEW_TRAINER_MODE").unwrap_or_default())?;

        let non_empty = |key: &str, default: &str| {
            get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let data_dir = non_empty("INTERVIEW_TRAINER_DATA_DIR", ".");
        if Path::new(&data_dir).is_file() {
            return Err(AppError::Config(format!(
                "INTERVIEW_TRAINER_DATA_DIR points at a file: {data_dir}"
            )));
        }

        Ok(Self {
            mode,
            data_dir,
            conversations_file: non_empty("INTERVIEW_TRAINER_CONVERSATIONS_FILE", "conversations.json"),
            answer_log_file: non_empty("INTERVIEW_TRAINER_ANSWER_LOG", "answer_log.json"),
            sentiment_model: non_empty("INTERVIEW_TRAINER_SENTIMENT_MODEL", "sentiment"),
            redis_url: get("REDIS_URL").filter(|u| !u.trim().is_empty()),
        })
    }

    pub fn conversations_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.conversations_file)
    }

    pub fn answer_log_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.answer_log_file)
    }
}
