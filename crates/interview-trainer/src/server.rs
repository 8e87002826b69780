/// MCP server front end for the interview trainer.
///
/// Exposes six tools:
/// - `new_conversation`: start an interview and get the first question
/// - `submit_answer`: score an answer, optionally rate the question, and get the next one
/// - `rate_question`: +1/-1 helpfulness feedback for a question
/// - `list_conversations` / `get_conversation`: browse stored transcripts
/// - `question_stats`: ratings and ask counts for every question
use std::sync::Arc;

use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{Conversation, ConversationSummary, QuestionStat};
use crate::session::{Trainer, Turn};

#[derive(Clone)]
pub struct InterviewTrainerServer {
    trainer: Arc<Trainer>,
    tool_router: ToolRouter<InterviewTrainerServer>,
}

impl InterviewTrainerServer {
    pub fn new(trainer: Arc<Trainer>) -> Self {
        Self {
            trainer,
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SubmitAnswerParams {
    /// The candidate's free-text answer to the pending question.
    answer: String,
    /// Whether the question was helpful. Applied before the next question is chosen.
    helpful: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RateQuestionParams {
    /// Exact question text.
    question: String,
    helpful: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetConversationParams {
    conversation_id: u64,
}

#[derive(Debug, Serialize, JsonSchema)]
struct NextTurn {
    /// The next question, absent once every question has been asked the maximum number of times.
    question: Option<String>,
    exhausted: bool,
}

impl From<Turn> for NextTurn {
    fn from(turn: Turn) -> Self {
        match turn {
            Turn::Question { prompt } => Self {
                question: Some(prompt),
                exhausted: false,
            },
            Turn::Exhausted => Self {
                question: None,
                exhausted: true,
            },
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
struct NewConversationResponse {
    conversation: ConversationSummary,
    next: NextTurn,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ScoreComponents {
    similarity: u32,
    sentiment: u32,
    keywords: u32,
    length: u32,
}

#[derive(Debug, Serialize, JsonSchema)]
struct SubmitAnswerResponse {
    /// True when the answer was blank and nothing happened.
    ignored: bool,
    /// Within 20..=100. Every component has a positive floor, so the lowest reachable total is 25.
    total_score: Option<u32>,
    components: Option<ScoreComponents>,
    matched_keywords: Vec<String>,
    feedback: Option<String>,
    rating: Option<i64>,
    next: Option<NextTurn>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct RateQuestionResponse {
    question: String,
    rating: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ConversationListResponse {
    conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct QuestionStatsResponse {
    questions: Vec<QuestionStat>,
}

#[tool_router]
impl InterviewTrainerServer {
    #[tool(description = "Start a new mock interview conversation and return its first question.")]
    async fn new_conversation(&self) -> Result<Json<NewConversationResponse>, String> {
        let (conversation, turn) = self.trainer.new_conversation().await;
        Ok(Json(NewConversationResponse {
            conversation,
            next: turn.into(),
        }))
    }

    #[tool(description = "Submit an answer to the pending interview question. Returns a 20-100 score, coaching feedback and the next question. Blank answers are ignored.")]
    async fn submit_answer(
        &self,
        Parameters(params): Parameters<SubmitAnswerParams>,
    ) -> Result<Json<SubmitAnswerResponse>, String> {
        let Some(submission) = self
            .trainer
            .submit_answer(&params.answer)
            .await
            .map_err(|e| format!("submit failed: {e}"))?
        else {
            return Ok(Json(SubmitAnswerResponse {
                ignored: true,
                total_score: None,
                components: None,
                matched_keywords: Vec::new(),
                feedback: None,
                rating: None,
                next: None,
            }));
        };

        let rating = match params.helpful {
            Some(helpful) => Some(
                self.trainer
                    .rate_question(&submission.question, helpful)
                    .await
                    .map_err(|e| format!("rating failed: {e}"))?,
            ),
            None => None,
        };
        let next = self.trainer.next_question().await;

        let breakdown = submission.evaluation.breakdown;
        Ok(Json(SubmitAnswerResponse {
            ignored: false,
            total_score: Some(breakdown.total()),
            components: Some(ScoreComponents {
                similarity: breakdown.similarity,
                sentiment: breakdown.sentiment,
                keywords: breakdown.keywords,
                length: breakdown.length,
            }),
            matched_keywords: submission.evaluation.matched_keywords,
            feedback: Some(submission.feedback),
            rating,
            next: Some(next.into()),
        }))
    }

    #[tool(description = "Mark an interview question as helpful (+1) or not (-1). Higher-rated questions are asked more often.")]
    async fn rate_question(
        &self,
        Parameters(params): Parameters<RateQuestionParams>,
    ) -> Result<Json<RateQuestionResponse>, String> {
        let question = params.question.trim().to_string();
        if question.is_empty() {
            return Err("question must not be empty".to_string());
        }
        let rating = self
            .trainer
            .rate_question(&question, params.helpful)
            .await
            .map_err(|e| e.to_string())?;
        Ok(Json(RateQuestionResponse { question, rating }))
    }

    #[tool(description = "List stored interview conversations (id, title, timestamp, message count).")]
    async fn list_conversations(&self) -> Result<Json<ConversationListResponse>, String> {
        Ok(Json(ConversationListResponse {
            conversations: self.trainer.list_conversations().await,
        }))
    }

    #[tool(description = "Get the full transcript of a stored conversation and make it the current one.")]
    async fn get_conversation(
        &self,
        Parameters(params): Parameters<GetConversationParams>,
    ) -> Result<Json<Conversation>, String> {
        info!(conversation_id = params.conversation_id, "get_conversation tool invoked");
        self.trainer
            .open_conversation(params.conversation_id)
            .await
            .map(Json)
            .map_err(|e| e.to_string())
    }

    #[tool(description = "Show every question's helpfulness rating, times asked, and whether it can still be asked.")]
    async fn question_stats(&self) -> Result<Json<QuestionStatsResponse>, String> {
        Ok(Json(QuestionStatsResponse {
            questions: self.trainer.question_stats().await,
        }))
    }
}

#[tool_handler]
impl ServerHandler for InterviewTrainerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "interview-trainer".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Mock interview trainer. Call new_conversation to get a question, then \
                 submit_answer with the candidate's answer to receive a score (20-100), \
                 feedback and the next question. Use rate_question or the helpful flag on \
                 submit_answer to steer question selection. Transcripts are available via \
                 list_conversations and get_conversation."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rmcp::handler::server::wrapper::Parameters;

    use super::{InterviewTrainerServer, SubmitAnswerParams};
    use crate::bank::QuestionBank;
    use crate::history::{AnswerLog, ConversationStore};
    use crate::model::Question;
    use crate::scorer::testing::{positive, scorer};
    use crate::session::Trainer;

    const PROMPTS: [&str; 4] = [
        "What are your strengths?",
        "What are your weaknesses?",
        "Why do you want this job?",
        "What are your career goals?",
    ];

    fn server(dir: &tempfile::TempDir) -> InterviewTrainerServer {
        let bank = QuestionBank::new(
            PROMPTS
                .iter()
                .map(|p| Question::new(p, &["A solid reference answer."]))
                .collect(),
        );
        InterviewTrainerServer::new(Arc::new(Trainer::with_rng(
            bank,
            scorer(Some(vec![0.9]), Some(positive(0.95))),
            ConversationStore::new(dir.path().join("conversations.json")),
            AnswerLog::new(dir.path().join("answer_log.json")),
            StdRng::seed_from_u64(11),
        )))
    }

    fn submit(answer: &str, helpful: Option<bool>) -> Parameters<SubmitAnswerParams> {
        Parameters(SubmitAnswerParams {
            answer: answer.to_string(),
            helpful,
        })
    }

    #[tokio::test]
    async fn submit_answer_ignores_blank_input() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir);
        server.new_conversation().await.unwrap();

        let response = server.submit_answer(submit("  \n", Some(true))).await.unwrap().0;

        assert!(response.ignored);
        assert!(response.total_score.is_none());
        assert!(response.rating.is_none());
        assert!(response.next.is_none());
        let stats = server.question_stats().await.unwrap().0.questions;
        assert!(stats.iter().all(|s| s.rating == 0));
        assert!(AnswerLog::new(dir.path().join("answer_log.json")).load().is_empty());
    }

    #[tokio::test]
    async fn submit_answer_applies_rating_before_next_pick() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(&dir);
        let asked = server
            .new_conversation()
            .await
            .unwrap()
            .0
            .next
            .question
            .unwrap();

        let response = server
            .submit_answer(submit("I am organized and calm.", Some(true)))
            .await
            .unwrap()
            .0;

        assert!(!response.ignored);
        assert_eq!(response.rating, Some(1));
        assert!((20..=100).contains(&response.total_score.unwrap()));

        // With the vote counted, the shortlist is the upvoted question plus the first two
        // others in table order. Without it, the upvoted question could not be picked.
        let mut shortlist = vec![asked.as_str()];
        shortlist.extend(PROMPTS.iter().copied().filter(|p| *p != asked).take(2));
        let next = response.next.unwrap();
        assert!(!next.exhausted);
        let next_prompt = next.question.unwrap();
        assert!(
            shortlist.contains(&next_prompt.as_str()),
            "{next_prompt} is outside the rated shortlist"
        );

        let stats = server.question_stats().await.unwrap().0.questions;
        let rated = stats.iter().find(|s| s.question == asked).unwrap();
        assert_eq!(rated.rating, 1);
        assert_eq!(AnswerLog::new(dir.path().join("answer_log.json")).load()[0].rating, 0);
    }

    #[test]
    fn tools_publish_output_schemas() {
        let tools = InterviewTrainerServer::tool_router().list_all();
        for name in [
            "new_conversation",
            "submit_answer",
            "rate_question",
            "list_conversations",
            "get_conversation",
            "question_stats",
        ] {
            let tool = tools
                .iter()
                .find(|t| t.name == name)
                .unwrap_or_else(|| panic!("missing tool: {name}"));
            assert!(
                tool.output_schema.is_some(),
                "tool {name} should publish output_schema"
            );
        }
    }
}
