use trainer_common::error::CommonError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no question is waiting for an answer")]
    NoActiveQuestion,

    #[error("an answer is already being scored")]
    SubmissionInProgress,

    #[error("unknown question: {0}")]
    UnknownQuestion(String),

    #[error("unknown conversation: {0}")]
    UnknownConversation(u64),
}
