/// NLP capabilities the scorer depends on.
///
/// Each capability is a trait so the selection and scoring policy can be exercised with
/// deterministic stand-ins. The production implementations run a local fastembed sentence
/// model (similarity, key phrases) and an OpenAI-compatible chat model (sentiment).
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use futures::future::BoxFuture;
use regex::Regex;
use tracing::debug;

use crate::cache::EmbeddingCache;
use trainer_common::embedding::{cosine_similarity, Embedder};
use trainer_common::error::CommonError;
use trainer_common::sentiment::{Sentiment, SentimentClassifier};

pub trait SimilarityService: Send + Sync {
    /// Cosine similarity in [-1, 1] between `answer` and each reference, in reference order.
    fn similarities<'a>(
        &'a self,
        answer: &'a str,
        references: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<f32>, CommonError>>;
}

pub trait SentimentService: Send + Sync {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Sentiment, CommonError>>;
}

/// Display-only key phrase extraction.
pub trait KeywordExtractor: Send + Sync {
    fn extract<'a>(
        &'a self,
        text: &'a str,
        top_n: usize,
    ) -> BoxFuture<'a, Result<Vec<String>, CommonError>>;
}

// --- Similarity ---

pub struct EmbeddingSimilarity {
    embedder: Arc<Embedder>,
    cache: Arc<EmbeddingCache>,
}

impl EmbeddingSimilarity {
    pub fn new(embedder: Arc<Embedder>, cache: Arc<EmbeddingCache>) -> Self {
        Self { embedder, cache }
    }

    async fn reference_embeddings(&self, references: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        let mut out: Vec<Option<Vec<f32>>> = Vec::with_capacity(references.len());
        let mut missing = Vec::new();
        for (i, text) in references.iter().enumerate() {
            let cached = self.cache.get(text).await;
            if cached.is_none() {
                missing.push(i);
            }
            out.push(cached);
        }

        if !missing.is_empty() {
            debug!(count = missing.len(), "embedding uncached reference answers");
            let texts = missing.iter().map(|&i| references[i].clone()).collect();
            let fresh = self.embedder.embed(texts).await?;
            for (&i, embedding) in missing.iter().zip(fresh) {
                self.cache.set(&references[i], &embedding).await;
                out[i] = Some(embedding);
            }
        }

        out.into_iter()
            .map(|e| e.ok_or_else(|| CommonError::Embedding("missing reference embedding".to_string())))
            .collect()
    }
}

impl SimilarityService for EmbeddingSimilarity {
    fn similarities<'a>(
        &'a self,
        answer: &'a str,
        references: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<f32>, CommonError>> {
        Box::pin(async move {
            if references.is_empty() {
                return Ok(Vec::new());
            }
            let refs = self.reference_embeddings(references).await?;
            let answer_embedding = self.embedder.embed_one(answer).await?;
            Ok(refs
                .iter()
                .map(|r| cosine_similarity(r, &answer_embedding))
                .collect())
        })
    }
}

// --- Sentiment ---

impl SentimentService for SentimentClassifier {
    fn classify<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Sentiment, CommonError>> {
        Box::pin(SentimentClassifier::classify(self, text))
    }
}

// --- Key phrases ---

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'-]*[A-Za-z]|[A-Za-z]").expect("valid regex"));

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "being", "but", "by", "can", "could", "did", "do", "does", "doing",
    "for", "from", "had", "has", "have", "having", "he", "her", "here", "him", "his", "how", "i",
    "i'm", "if", "in", "into", "is", "it", "it's", "its", "just", "me", "more", "most", "my",
    "myself", "no", "not", "of", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "really", "she", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "up", "very",
    "was", "we", "were", "what", "when", "where", "which", "while", "who", "why", "will", "with",
    "would", "you", "your",
];

/// Unique lowercased non-stop-word tokens in first-occurrence order.
pub fn candidate_phrases(text: &str) -> Vec<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut seen = HashSet::new();
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.len() > 1 && !stop.contains(w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Ranks candidate words by embedding similarity to the whole text.
pub struct EmbeddingKeywordExtractor {
    embedder: Arc<Embedder>,
}

impl EmbeddingKeywordExtractor {
    pub fn new(embedder: Arc<Embedder>) -> Self {
        Self { embedder }
    }
}

impl KeywordExtractor for EmbeddingKeywordExtractor {
    fn extract<'a>(
        &'a self,
        text: &'a str,
        top_n: usize,
    ) -> BoxFuture<'a, Result<Vec<String>, CommonError>> {
        Box::pin(async move {
            let candidates = candidate_phrases(text);
            if candidates.is_empty() || top_n == 0 {
                return Ok(Vec::new());
            }
            let mut inputs = Vec::with_capacity(candidates.len() + 1);
            inputs.push(text.to_string());
            inputs.extend(candidates.iter().cloned());

            let embeddings = self.embedder.embed(inputs).await?;
            let Some((doc, words)) = embeddings.split_first() else {
                return Ok(Vec::new());
            };
            Ok(rank_by_similarity(doc, &candidates, words, top_n))
        })
    }
}

fn rank_by_similarity(
    doc: &[f32],
    candidates: &[String],
    embeddings: &[Vec<f32>],
    top_n: usize,
) -> Vec<String> {
    let mut scored: Vec<(f32, &String)> = candidates
        .iter()
        .zip(embeddings)
        .map(|(c, e)| (cosine_similarity(doc, e), c))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored
        .into_iter()
        .take(top_n)
        .map(|(_, c)| c.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_drop_stop_words_and_duplicates() {
        let c = candidate_phrases("I am a Team player, and the team trusts me. I'm self-driven!");
        assert_eq!(c, vec!["team", "player", "trusts", "self-driven"]);
    }

    #[test]
    fn candidates_of_stop_words_only_are_empty() {
        assert!(candidate_phrases("I am the one who is").contains(&"one".to_string()));
        assert!(candidate_phrases("and the of to").is_empty());
        assert!(candidate_phrases("   ").is_empty());
    }

    #[test]
    fn ranking_orders_by_similarity_and_truncates() {
        let doc = vec![1.0, 0.0];
        let candidates = vec!["far".to_string(), "near".to_string(), "mid".to_string()];
        let embeddings = vec![vec![0.0, 1.0], vec![1.0, 0.05], vec![1.0, 1.0]];
        assert_eq!(
            rank_by_similarity(&doc, &candidates, &embeddings, 2),
            vec!["near", "mid"]
        );
    }
}
