/// Interview session controller.
///
/// `Trainer` owns the question bank, the conversation history and the stores. Front ends
/// hold it behind an `Arc` and never touch that state directly.
///
/// Locking: `state` is always taken before `bank`, and `bank` before `rng`. Slow NLP work
/// runs with no lock held. Overlapping submissions are refused by `submission_gate` instead
/// of queueing, so two answers can never race on the same question.
use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::bank::QuestionBank;
use crate::error::AppError;
use crate::feedback;
use crate::history::{AnswerLog, ConversationStore};
use crate::model::{AnswerLogEntry, Conversation, ConversationSummary, Message, QuestionStat};
use crate::scorer::{Evaluation, Scorer};
use crate::selector::{select_next, Selection};

pub const COMPLETION_MESSAGE: &str = "Congratulations! You've completed all questions!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Question { prompt: String },
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct Submission {
    pub question: String,
    pub evaluation: Evaluation,
    pub feedback: String,
}

struct SessionState {
    conversations: Vec<Conversation>,
    /// Index into `conversations`.
    current: Option<usize>,
    /// Prompt waiting for an answer.
    pending_question: Option<String>,
    /// Bumped every time a question is asked.
    turn: u64,
}

pub struct Trainer {
    state: Mutex<SessionState>,
    bank: Mutex<QuestionBank>,
    rng: Mutex<StdRng>,
    submission_gate: Mutex<()>,
    scorer: Scorer,
    conversations: ConversationStore,
    answer_log: AnswerLog,
}

impl Trainer {
    pub fn new(
        bank: QuestionBank,
        scorer: Scorer,
        conversations: ConversationStore,
        answer_log: AnswerLog,
    ) -> Self {
        Self::with_rng(bank, scorer, conversations, answer_log, StdRng::from_entropy())
    }

    pub fn with_rng(
        bank: QuestionBank,
        scorer: Scorer,
        conversations: ConversationStore,
        answer_log: AnswerLog,
        rng: StdRng,
    ) -> Self {
        let loaded = conversations.load();
        info!(
            conversations = loaded.len(),
            path = %conversations.path().display(),
            answer_log = %answer_log.path().display(),
            "conversation history loaded"
        );
        Self {
            state: Mutex::new(SessionState {
                conversations: loaded,
                current: None,
                pending_question: None,
                turn: 0,
            }),
            bank: Mutex::new(bank),
            rng: Mutex::new(rng),
            submission_gate: Mutex::new(()),
            scorer,
            conversations,
            answer_log,
        }
    }

    /// Start a new conversation, make it current and ask its first question.
    pub async fn new_conversation(&self) -> (ConversationSummary, Turn) {
        let mut state = self.state.lock().await;
        let id = state.conversations.len() as u64;
        let conversation = Conversation {
            id,
            title: format!("Interview {}", id + 1),
            timestamp: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            messages: Vec::new(),
        };
        let summary = ConversationSummary::from(&conversation);
        state.conversations.push(conversation);
        let idx = state.conversations.len() - 1;
        state.current = Some(idx);
        self.conversations.save(&state.conversations);
        info!(id, "conversation started");

        let turn = self.advance_locked(&mut state).await;
        (summary, turn)
    }

    /// Select the next question and post it to the current conversation.
    pub async fn next_question(&self) -> Turn {
        let mut state = self.state.lock().await;
        self.advance_locked(&mut state).await
    }

    async fn advance_locked(&self, state: &mut SessionState) -> Turn {
        let selection = {
            let mut bank = self.bank.lock().await;
            let mut rng = self.rng.lock().await;
            select_next(&mut bank, &mut *rng)
        };
        match selection {
            Selection::Question(q) => {
                debug!(question = %q.prompt, times_asked = q.times_asked, "question selected");
                state.pending_question = Some(q.prompt.clone());
                state.turn += 1;
                self.post_locked(state, Message::interviewer(q.prompt.clone()));
                Turn::Question { prompt: q.prompt }
            }
            Selection::Exhausted => {
                info!("question pool exhausted");
                state.pending_question = None;
                self.post_locked(state, Message::interviewer(COMPLETION_MESSAGE));
                Turn::Exhausted
            }
        }
    }

    /// Append to the current conversation, if any, and persist the whole history.
    fn post_locked(&self, state: &mut SessionState, message: Message) {
        let current = state.current;
        self.post_to_locked(state, current, message);
    }

    fn post_to_locked(&self, state: &mut SessionState, idx: Option<usize>, message: Message) {
        let Some(idx) = idx else {
            return;
        };
        if let Some(conversation) = state.conversations.get_mut(idx) {
            conversation.messages.push(message);
            self.conversations.save(&state.conversations);
        }
    }

    /// Score an answer to the pending question.
    ///
    /// Blank answers are ignored (`Ok(None)`) and leave the question pending. On success the
    /// question is no longer pending; call `next_question` to move on. The feedback always
    /// lands in the conversation that received the answer, even if another conversation was
    /// started or opened while it was being scored.
    pub async fn submit_answer(&self, answer: &str) -> Result<Option<Submission>, AppError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(None);
        }
        let _gate = self
            .submission_gate
            .try_lock()
            .map_err(|_| AppError::SubmissionInProgress)?;

        let (question, conversation, turn) = {
            let mut state = self.state.lock().await;
            let prompt = state
                .pending_question
                .clone()
                .ok_or(AppError::NoActiveQuestion)?;
            let question = {
                let bank = self.bank.lock().await;
                bank.get(&prompt)
                    .cloned()
                    .ok_or_else(|| AppError::UnknownQuestion(prompt.clone()))?
            };
            self.post_locked(&mut state, Message::candidate(answer));
            (question, state.current, state.turn)
        };

        self.answer_log.append(AnswerLogEntry {
            question: question.prompt.clone(),
            answer: answer.to_string(),
            rating: question.rating,
            timestamp: Local::now().to_rfc3339(),
        });

        let evaluation = self.scorer.evaluate(&question, answer).await;
        let feedback = {
            let mut rng = self.rng.lock().await;
            feedback::compose(&question, &evaluation, &mut *rng)
        };

        let mut state = self.state.lock().await;
        if state.turn == turn {
            state.pending_question = None;
        }
        self.post_to_locked(&mut state, conversation, Message::interviewer(feedback.clone()));
        info!(question = %question.prompt, total = evaluation.total(), "answer scored");

        Ok(Some(Submission {
            question: question.prompt,
            evaluation,
            feedback,
        }))
    }

    /// Apply helpfulness feedback (+1 or -1) and return the new rating.
    pub async fn rate_question(&self, prompt: &str, helpful: bool) -> Result<i64, AppError> {
        let mut bank = self.bank.lock().await;
        let question = bank
            .get_mut(prompt)
            .ok_or_else(|| AppError::UnknownQuestion(prompt.to_string()))?;
        question.rating += if helpful { 1 } else { -1 };
        debug!(question = %prompt, rating = question.rating, "question rated");
        Ok(question.rating)
    }

    #[cfg(test)]
    pub async fn pending_question(&self) -> Option<String> {
        self.state.lock().await.pending_question.clone()
    }

    pub async fn list_conversations(&self) -> Vec<ConversationSummary> {
        let state = self.state.lock().await;
        state
            .conversations
            .iter()
            .map(ConversationSummary::from)
            .collect()
    }

    /// Make a stored conversation current and return its transcript.
    pub async fn open_conversation(&self, id: u64) -> Result<Conversation, AppError> {
        let mut state = self.state.lock().await;
        let idx = state
            .conversations
            .iter()
            .position(|c| c.id == id)
            .ok_or(AppError::UnknownConversation(id))?;
        state.current = Some(idx);
        Ok(state.conversations[idx].clone())
    }

    pub async fn question_stats(&self) -> Vec<QuestionStat> {
        self.bank.lock().await.stats()
    }
}
