/// Redis caching layer for embeddings.
///
/// Reference answers never change between runs, so their embeddings are cached by content
/// hash. All operations degrade gracefully: a miss or a Redis failure just means the text
/// is embedded again.
///
/// Key schema:
/// - `itr:v1:embedding:{sha256(text)}`: JSON Vec<f32> (TTL 7 days)
use sha2::{Digest, Sha256};
use tracing::warn;

use trainer_common::redis::RedisCache;

const KEY_PREFIX: &str = "itr:v1:";
const EMBEDDING_TTL_SECS: u64 = 7 * 24 * 3600;

pub struct EmbeddingCache {
    redis: RedisCache,
}

impl EmbeddingCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn get(&self, text: &str) -> Option<Vec<f32>> {
        let key = embedding_key(text);
        let json = self.redis.get(&key).await?;
        serde_json::from_str(&json)
            .inspect_err(|e| warn!(error = %e, key, "cache deserialization failed"))
            .ok()
    }

    pub async fn set(&self, text: &str, embedding: &[f32]) {
        let key = embedding_key(text);
        if let Ok(json) = serde_json::to_string(embedding) {
            self.redis.set_with_ttl(&key, &json, EMBEDDING_TTL_SECS).await;
        }
    }
}

fn embedding_key(text: &str) -> String {
    let hash = Sha256::digest(text.as_bytes());
    format!("{KEY_PREFIX}embedding:{hash:x}")
}
