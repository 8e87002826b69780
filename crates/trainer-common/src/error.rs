/// Error types shared by the trainer crates.
///
/// These cover the infrastructure the trainer leans on (the embedding model and the
/// OpenAI-compatible sentiment backend). Redis is not listed: the cache degrades to no-ops
/// instead of failing. Application errors live in the binary crate and
/// wrap `CommonError` via `#[from]`.

#[derive(Debug, thiserror::Error)]
pub enum CommonError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("llm request failed: {0}")]
    Llm(#[from] crate::openai::OpenAiClientError),

    #[error("sentiment error: {0}")]
    Sentiment(String),
}
