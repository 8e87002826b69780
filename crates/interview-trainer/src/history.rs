/// Flat-file persistence for conversations and the answer log.
///
/// Both files are JSON arrays rewritten in full on every change. Writes are best-effort:
/// failures are logged and swallowed so a full disk never ends an interview. Reads treat a
/// missing or malformed file as empty.
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::model::{AnswerLogEntry, Conversation};

pub struct ConversationStore {
    path: PathBuf,
}

impl ConversationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<Conversation> {
        load_json_array(&self.path)
    }

    /// Returns `false` if the write failed.
    pub fn save(&self, conversations: &[Conversation]) -> bool {
        save_json_array(&self.path, conversations)
            .inspect_err(|e| warn!(error = %e, path = %self.path.display(), "failed to save conversations"))
            .is_ok()
    }
}

pub struct AnswerLog {
    path: PathBuf,
}

impl AnswerLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<AnswerLogEntry> {
        load_json_array(&self.path)
    }

    /// Re-reads the log, appends `entry` and rewrites the file. Returns `false` if the write
    /// failed.
    pub fn append(&self, entry: AnswerLogEntry) -> bool {
        let mut entries = self.load();
        entries.push(entry);
        save_json_array(&self.path, &entries)
            .inspect_err(|e| warn!(error = %e, path = %self.path.display(), "failed to append answer log"))
            .is_ok()
    }
}

fn load_json_array<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to read history file, starting empty");
            return Vec::new();
        }
    };
    serde_json::from_str(&raw)
        .inspect_err(|e| warn!(error = %e, path = %path.display(), "malformed history file, starting empty"))
        .unwrap_or_default()
}

fn save_json_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(items)?;
    fs::write(path, json)?;
    debug!(path = %path.display(), count = items.len(), "history file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Message;

    fn conversation(id: u64, texts: &[(&str, bool)]) -> Conversation {
        Conversation {
            id,
            title: format!("Interview {}", id + 1),
            timestamp: "2026-10-18 09:30".to_string(),
            messages: texts
                .iter()
                .map(|&(t, is_user)| {
                    if is_user {
                        Message::candidate(t)
                    } else {
                        Message::interviewer(t)
                    }
                })
                .collect(),
        }
    }

    #[test]
    fn conversations_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path().join("conversations.json"));
        let saved = vec![
            conversation(0, &[("What are your strengths?", false), ("I'm diligent.", true)]),
            conversation(1, &[("Why do you want this job?", false), ("Ünïcödé ✓", true)]),
        ];

        assert!(store.save(&saved));
        assert_eq!(store.load(), saved);

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\n  {"), "file should be indented");
        assert!(raw.contains("\"is_user\": true"));
    }

    #[test]
    fn missing_or_malformed_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_empty());

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(ConversationStore::new(&path).load().is_empty());
        assert!(AnswerLog::new(&path).load().is_empty());
    }

    #[test]
    fn answer_log_appends_and_recovers_from_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answer_log.json");
        fs::write(&path, "[{\"garbage\"").unwrap();
        let log = AnswerLog::new(&path);

        for (i, answer) in ["first", "second"].into_iter().enumerate() {
            assert!(log.append(AnswerLogEntry {
                question: "What are your weaknesses?".to_string(),
                answer: answer.to_string(),
                rating: i as i64 - 1,
                timestamp: "2026-10-18T09:30:00+00:00".to_string(),
            }));
        }

        let entries = log.load();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].answer, "first");
        assert_eq!(entries[0].rating, -1);
        assert_eq!(entries[1].answer, "second");
    }

    #[test]
    fn write_failures_are_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the write fail.
        let store = ConversationStore::new(dir.path());
        assert!(!store.save(&[conversation(0, &[])]));
    }
}
