mod bank;
mod cache;
mod cli;
mod config;
mod error;
mod feedback;
mod history;
mod model;
mod nlp;
mod scorer;
mod selector;
mod server;
mod session;

use std::sync::Arc;

use rmcp::{ServiceExt, transport::stdio};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trainer_common::embedding::Embedder;
use trainer_common::error::CommonError;
use trainer_common::openai::{OpenAiClient, OpenAiClientConfig};
use trainer_common::redis::RedisCache;
use trainer_common::sentiment::SentimentClassifier;

use bank::QuestionBank;
use cache::EmbeddingCache;
use config::{Config, Mode};
use error::AppError;
use history::{AnswerLog, ConversationStore};
use nlp::{EmbeddingKeywordExtractor, EmbeddingSimilarity};
use scorer::Scorer;
use server::InterviewTrainerServer;
use session::Trainer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = Config::from_env()?;
    info!(mode = ?config.mode, data_dir = %config.data_dir, "starting interview trainer");

    let trainer = Arc::new(build_trainer(&config).await?);

    match config.mode {
        Mode::Cli => cli::run(trainer).await?,
        Mode::Mcp => {
            info!("MCP server ready, serving on stdio");
            let service = InterviewTrainerServer::new(trainer)
                .serve(stdio())
                .await
                .inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
            service.waiting().await?;
            info!("MCP server shut down");
        }
    }
    Ok(())
}

async fn build_trainer(config: &Config) -> Result<Trainer, AppError> {
    let redis_cache = RedisCache::new(config.redis_url.as_deref());
    if redis_cache.is_available().await {
        info!("redis connected, reference embeddings will be cached");
    } else {
        info!("redis unavailable, running without embedding cache");
    }

    info!("loading embedding model");
    let embedder = Arc::new(Embedder::new().await?);
    info!(dimensions = embedder.dimensions(), "embedding model ready");

    let openai_config = OpenAiClientConfig::from_env();
    info!(
        base_url = %openai_config.base_url,
        model = %config.sentiment_model,
        timeout_ms = openai_config.default_timeout.as_millis(),
        max_retries = openai_config.max_retries,
        "sentiment client configured"
    );
    let openai = Arc::new(OpenAiClient::new(openai_config).map_err(CommonError::from)?);

    let scorer = Scorer::new(
        Arc::new(EmbeddingSimilarity::new(
            embedder.clone(),
            Arc::new(EmbeddingCache::new(redis_cache)),
        )),
        Arc::new(SentimentClassifier::new(openai, config.sentiment_model.clone())),
        Arc::new(EmbeddingKeywordExtractor::new(embedder)),
    );

    Ok(Trainer::new(
        QuestionBank::default(),
        scorer,
        ConversationStore::new(config.conversations_path()),
        AnswerLog::new(config.answer_log_path()),
    ))
}
