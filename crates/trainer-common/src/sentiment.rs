/// Sentiment classification through an OpenAI-compatible chat model.
///
/// The model is instructed to answer with a single JSON object
/// `{"label": "POSITIVE" | "NEGATIVE", "score": <confidence 0..1>}`. Replies are parsed
/// leniently: code fences and surrounding prose are ignored, the label is matched
/// case-insensitively and the score is clamped into [0, 1].
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CommonError;
use crate::openai::OpenAiClient;

const SYSTEM_PROMPT: &str = "You are a binary sentiment classifier. Classify the sentiment of \
the user's text as POSITIVE or NEGATIVE and estimate your confidence between 0 and 1. Reply \
with exactly one JSON object of the form {\"label\": \"POSITIVE\", \"score\": 0.93} and nothing else.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::Negative => "NEGATIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Classifier confidence in [0, 1].
    pub score: f32,
}

#[derive(Clone)]
pub struct SentimentClassifier {
    client: Arc<OpenAiClient>,
    model: String,
}

impl SentimentClassifier {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub async fn classify(&self, text: &str) -> Result<Sentiment, CommonError> {
        let reply = self.client.complete(&self.model, SYSTEM_PROMPT, text).await?;
        debug!(model = %self.model, reply = %reply, "sentiment reply");
        parse_sentiment_reply(&reply)
    }
}

#[derive(Deserialize)]
struct RawSentiment {
    label: String,
    #[serde(alias = "confidence")]
    score: f32,
}

/// Extract a `Sentiment` from a model reply.
pub fn parse_sentiment_reply(reply: &str) -> Result<Sentiment, CommonError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => {
            return Err(CommonError::Sentiment(format!(
                "no JSON object in reply: {reply:?}"
            )))
        }
    };

    let raw: RawSentiment = serde_json::from_str(json)
        .map_err(|e| CommonError::Sentiment(format!("malformed reply {json:?}: {e}")))?;

    let label = match raw.label.trim().to_ascii_uppercase().as_str() {
        "POSITIVE" | "POS" => SentimentLabel::Positive,
        "NEGATIVE" | "NEG" | "NEUTRAL" => SentimentLabel::Negative,
        other => {
            return Err(CommonError::Sentiment(format!("unknown label: {other}")));
        }
    };
    let score = if raw.score.is_finite() {
        raw.score.clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(Sentiment { label, score })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let s = parse_sentiment_reply(r#"{"label": "POSITIVE", "score": 0.93}"#).unwrap();
        assert_eq!(s.label, SentimentLabel::Positive);
        assert!((s.score - 0.93).abs() < 1e-6);
    }

    #[test]
    fn parses_fenced_reply_with_alias_and_lowercase_label() {
        let reply = "```json\n{\"label\": \"negative\", \"confidence\": 0.81}\n```";
        let s = parse_sentiment_reply(reply).unwrap();
        assert_eq!(s.label, SentimentLabel::Negative);
        assert!((s.score - 0.81).abs() < 1e-6);
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let s = parse_sentiment_reply(r#"{"label":"POSITIVE","score":1.7}"#).unwrap();
        assert_eq!(s.score, 1.0);
        let s = parse_sentiment_reply(r#"{"label":"POSITIVE","score":-3}"#).unwrap();
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn rejects_replies_without_a_usable_object() {
        assert!(parse_sentiment_reply("I think it is positive").is_err());
        assert!(parse_sentiment_reply(r#"{"label":"MIXED","score":0.5}"#).is_err());
        assert!(parse_sentiment_reply(r#"{"label":"POSITIVE"}"#).is_err());
    }
}
