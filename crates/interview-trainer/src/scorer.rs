/// Answer scoring.
///
/// The total is the sum of four independently banded contributions:
///
/// | component  | bands                                                   | range  |
/// |------------|---------------------------------------------------------|--------|
/// | similarity | ≥80 → 40, ≥60 → 30, ≥40 → 20, else 10                    | 10..40 |
/// | sentiment  | positive: ≥0.9 → 20, ≥0.7 → 15, else 10; otherwise 5     | 5..20  |
/// | keywords   | ≥3 → 20, 2 → 15, 1 → 10, 0 → 5                           | 5..20  |
/// | length     | ≥50 words → 20, ≥30 → 15, ≥10 → 10, else 5               | 5..20  |
///
/// Every band has a positive floor, so totals always fall within 20..=100. The lowest reachable
/// total is 25 (10 + 5 + 5 + 5).
///
/// Similarity is taken against the first reference answer only, not the best match.
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::bank;
use crate::model::Question;
use crate::nlp::{KeywordExtractor, SentimentService, SimilarityService};
use trainer_common::sentiment::{Sentiment, SentimentLabel};

/// Number of display-only key phrases extracted from each answer.
const KEY_PHRASES: usize = 5;

pub fn similarity_points(similarity_pct: f32) -> u32 {
    if similarity_pct >= 80.0 {
        40
    } else if similarity_pct >= 60.0 {
        30
    } else if similarity_pct >= 40.0 {
        20
    } else {
        10
    }
}

pub fn sentiment_points(sentiment: &Sentiment) -> u32 {
    match sentiment.label {
        SentimentLabel::Positive if sentiment.score >= 0.9 => 20,
        SentimentLabel::Positive if sentiment.score >= 0.7 => 15,
        SentimentLabel::Positive => 10,
        SentimentLabel::Negative => 5,
    }
}

pub fn keyword_points(matched: usize) -> u32 {
    match matched {
        0 => 5,
        1 => 10,
        2 => 15,
        _ => 20,
    }
}

pub fn length_points(word_count: usize) -> u32 {
    if word_count >= 50 {
        20
    } else if word_count >= 30 {
        15
    } else if word_count >= 10 {
        10
    } else {
        5
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub similarity: u32,
    pub sentiment: u32,
    pub keywords: u32,
    pub length: u32,
}

impl ScoreBreakdown {
    pub fn from_signals(
        similarity_pct: f32,
        sentiment: &Sentiment,
        matched_keywords: usize,
        word_count: usize,
    ) -> Self {
        Self {
            similarity: similarity_points(similarity_pct),
            sentiment: sentiment_points(sentiment),
            keywords: keyword_points(matched_keywords),
            length: length_points(word_count),
        }
    }

    /// Always within 20..=100; the lowest reachable total is 25.
    pub fn total(&self) -> u32 {
        self.similarity + self.sentiment + self.keywords + self.length
    }
}

/// Everything measured about one answer.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Cosine similarity to the first reference answer, times 100.
    pub similarity_pct: f32,
    pub sentiment: Sentiment,
    pub matched_keywords: Vec<String>,
    /// True when the answer uses a keyword from any topic. Gates keyword suggestions only.
    pub mentions_any_keyword: bool,
    pub word_count: usize,
    /// Display-only; never feeds the score.
    pub key_phrases: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

impl Evaluation {
    pub fn total(&self) -> u32 {
        self.breakdown.total()
    }
}

/// Used when the sentiment backend fails; lands in the lowest sentiment band.
fn fallback_sentiment() -> Sentiment {
    Sentiment {
        label: SentimentLabel::Negative,
        score: 0.0,
    }
}

pub struct Scorer {
    similarity: Arc<dyn SimilarityService>,
    sentiment: Arc<dyn SentimentService>,
    keywords: Arc<dyn KeywordExtractor>,
}

impl Scorer {
    pub fn new(
        similarity: Arc<dyn SimilarityService>,
        sentiment: Arc<dyn SentimentService>,
        keywords: Arc<dyn KeywordExtractor>,
    ) -> Self {
        Self {
            similarity,
            sentiment,
            keywords,
        }
    }

    /// Score `answer` against `question`.
    ///
    /// Service failures are logged and fall back to the lowest band of the affected
    /// component; they never fail the evaluation.
    pub async fn evaluate(&self, question: &Question, answer: &str) -> Evaluation {
        let (similarities, sentiment, key_phrases) = futures::join!(
            self.similarity.similarities(answer, &question.answers),
            self.sentiment.classify(answer),
            self.keywords.extract(answer, KEY_PHRASES),
        );

        let similarity_pct = match similarities {
            Ok(values) => values.first().map(|s| s * 100.0).unwrap_or(0.0),
            Err(e) => {
                warn!(error = %e, question = %question.prompt, "similarity unavailable, using lowest band");
                0.0
            }
        };
        let sentiment = sentiment
            .inspect_err(|e| warn!(error = %e, "sentiment unavailable, using lowest band"))
            .unwrap_or_else(|_| fallback_sentiment());
        let key_phrases = key_phrases
            .inspect_err(|e| warn!(error = %e, "key phrase extraction failed"))
            .unwrap_or_default();

        let matched_keywords = bank::matched_keywords(&question.prompt, answer);
        let mentions_any_keyword = bank::mentions_any_keyword(answer);
        let word_count = word_count(answer);
        let breakdown = ScoreBreakdown::from_signals(
            similarity_pct,
            &sentiment,
            matched_keywords.len(),
            word_count,
        );
        debug!(
            similarity_pct,
            sentiment = sentiment.label.as_str(),
            matched = matched_keywords.len(),
            word_count,
            total = breakdown.total(),
            "answer scored"
        );

        Evaluation {
            similarity_pct,
            sentiment,
            matched_keywords,
            mentions_any_keyword,
            word_count,
            key_phrases,
            breakdown,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::bank::QuestionBank;

    #[test]
    fn best_case_scores_one_hundred() {
        let b = ScoreBreakdown::from_signals(85.0, &positive(0.95), 4, 60);
        assert_eq!(
            b,
            ScoreBreakdown {
                similarity: 40,
                sentiment: 20,
                keywords: 20,
                length: 20
            }
        );
        assert_eq!(b.total(), 100);
    }

    #[test]
    fn weak_answer_scores_twenty_five() {
        let b = ScoreBreakdown::from_signals(10.0, &negative(0.99), 0, 3);
        assert_eq!(b.total(), 10 + 5 + 5 + 5);
    }

    #[test]
    fn floor_is_twenty_five_not_zero() {
        let b = ScoreBreakdown::from_signals(-100.0, &negative(0.0), 0, 0);
        assert_eq!(b.total(), 25);
    }

    #[test]
    fn band_edges_are_inclusive() {
        assert_eq!(similarity_points(80.0), 40);
        assert_eq!(similarity_points(79.99), 30);
        assert_eq!(similarity_points(60.0), 30);
        assert_eq!(similarity_points(40.0), 20);
        assert_eq!(similarity_points(39.9), 10);

        assert_eq!(sentiment_points(&positive(0.9)), 20);
        assert_eq!(sentiment_points(&positive(0.7)), 15);
        assert_eq!(sentiment_points(&positive(0.69)), 10);
        assert_eq!(sentiment_points(&negative(1.0)), 5);

        assert_eq!(length_points(50), 20);
        assert_eq!(length_points(49), 15);
        assert_eq!(length_points(30), 15);
        assert_eq!(length_points(10), 10);
        assert_eq!(length_points(9), 5);
    }

    #[test]
    fn components_stay_in_range_and_are_monotonic() {
        let mut prev = 0;
        for pct in -100..=100 {
            let p = similarity_points(pct as f32);
            assert!((10..=40).contains(&p));
            assert!(p >= prev);
            prev = p;
        }

        let mut prev = 0;
        for n in 0..10 {
            let p = keyword_points(n);
            assert!((5..=20).contains(&p));
            assert!(p >= prev);
            prev = p;
        }

        let mut prev = 0;
        for n in 0..120 {
            let p = length_points(n);
            assert!((5..=20).contains(&p));
            assert!(p >= prev);
            prev = p;
        }

        let mut prev = 0;
        for step in 0..=100 {
            let p = sentiment_points(&positive(step as f32 / 100.0));
            assert!((10..=20).contains(&p));
            assert!(p >= prev);
            prev = p;
        }
    }

    #[test]
    fn totals_stay_within_twenty_and_one_hundred() {
        for pct in [-50.0, 0.0, 45.0, 65.0, 95.0] {
            for sentiment in [negative(0.9), positive(0.1), positive(0.75), positive(0.99)] {
                for kw in [0, 1, 2, 3, 7] {
                    for words in [0, 12, 35, 80] {
                        let total = ScoreBreakdown::from_signals(pct, &sentiment, kw, words).total();
                        assert!((20..=100).contains(&total), "total {total} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        assert_eq!(word_count("  one\ttwo\nthree   four "), 4);
        assert_eq!(word_count(""), 0);
    }

    #[tokio::test]
    async fn uses_first_reference_not_best() {
        let bank = QuestionBank::default();
        let question = bank.get("What are your strengths?").unwrap().clone();
        let scorer = scorer(Some(vec![0.35, 0.99, 0.99]), Some(positive(0.95)));

        let eval = scorer
            .evaluate(&question, "I am creative, hardworking and a team player.")
            .await;

        assert!((eval.similarity_pct - 35.0).abs() < 1e-4);
        assert_eq!(eval.breakdown.similarity, 10);
        assert_eq!(
            eval.matched_keywords,
            vec!["team player", "creative", "hardworking"]
        );
        assert_eq!(eval.breakdown.keywords, 20);
        assert_eq!(eval.word_count, 8);
        assert_eq!(eval.total(), 10 + 20 + 20 + 5);
    }

    #[tokio::test]
    async fn keywords_from_other_topics_are_noted_but_not_scored() {
        let bank = QuestionBank::default();
        let question = bank.get("What are your strengths?").unwrap().clone();
        let eval = scorer(Some(vec![0.5]), Some(positive(0.8)))
            .evaluate(&question, "I stay calm.")
            .await;
        assert!(eval.matched_keywords.is_empty());
        assert_eq!(eval.breakdown.keywords, 5);
        assert!(eval.mentions_any_keyword);
    }

    #[tokio::test]
    async fn service_failures_fall_back_to_lowest_bands() {
        let bank = QuestionBank::default();
        let question = bank.get("What are your weaknesses?").unwrap().clone();
        let scorer = scorer(None, None);

        let eval = scorer.evaluate(&question, "I can be a perfectionist.").await;

        assert_eq!(eval.similarity_pct, 0.0);
        assert_eq!(eval.sentiment.label, SentimentLabel::Negative);
        assert_eq!(eval.breakdown.similarity, 10);
        assert_eq!(eval.breakdown.sentiment, 5);
        assert_eq!(eval.breakdown.keywords, 10);
        assert!(eval.key_phrases.is_empty());
        assert_eq!(eval.total(), 10 + 5 + 10 + 5);
    }

    #[tokio::test]
    async fn question_without_references_scores_lowest_similarity() {
        let question = Question::new("What are your goals?", &[]);
        let scorer = scorer(Some(Vec::new()), Some(positive(0.8)));
        let eval = scorer.evaluate(&question, "growth").await;
        assert_eq!(eval.breakdown.similarity, 10);
        assert_eq!(eval.breakdown.sentiment, 15);
        assert_eq!(eval.matched_keywords, vec!["growth"]);
    }
}
