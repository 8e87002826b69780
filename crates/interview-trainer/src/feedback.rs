use rand::seq::SliceRandom;
use rand::Rng;

use crate::bank;
use crate::model::Question;
use crate::scorer::Evaluation;
use trainer_common::sentiment::SentimentLabel;

const EXAMPLE_KEYWORDS: usize = 5;
const EXAMPLE_ANSWER_CHARS: usize = 100;

/// Render the rating line and coaching text for one evaluated answer.
///
/// Randomness only picks which keywords and which reference answer are shown as examples.
pub fn compose<R: Rng + ?Sized>(question: &Question, eval: &Evaluation, rng: &mut R) -> String {
    let total = eval.total();
    let mut lines = vec![
        format!(
            "Overall Rating: {total}/100 ({:.1}/10)",
            f64::from(total) / 10.0
        ),
        String::new(),
        "AI Feedback:".to_string(),
        similarity_line(eval.similarity_pct).to_string(),
        String::new(),
        "Sentiment Analysis:".to_string(),
        sentiment_line(eval.sentiment.label, eval.sentiment.score).to_string(),
        String::new(),
        "Suggestions:".to_string(),
        length_line(eval.word_count).to_string(),
    ];

    let relevant = bank::relevant_keywords(&question.prompt);
    if !eval.mentions_any_keyword && !relevant.is_empty() {
        lines.push("Try to incorporate these powerful keywords in your answer:".to_string());
        let count = EXAMPLE_KEYWORDS.min(relevant.len());
        for kw in relevant.choose_multiple(rng, count) {
            lines.push(format!("  - {kw}"));
        }
    }

    if eval.sentiment.label != SentimentLabel::Positive || eval.sentiment.score < 0.7 {
        lines.push("Add more positivity and confidence to your response!".to_string());
    }

    if eval.similarity_pct < 60.0 {
        if let Some(example) = question.answers.choose(rng) {
            lines.push("Here's an example of how to structure your answer:".to_string());
            lines.push(format!("  \"{}...\"", truncate_chars(example, EXAMPLE_ANSWER_CHARS)));
        }
    }

    if !eval.key_phrases.is_empty() {
        lines.push(format!("Key phrases detected: {}", eval.key_phrases.join(", ")));
    }

    lines.join("\n")
}

fn similarity_line(pct: f32) -> &'static str {
    if pct >= 80.0 {
        "Outstanding! Your answer is perfectly aligned with what interviewers look for!"
    } else if pct >= 60.0 {
        "Great job! You're definitely on the right track!"
    } else if pct >= 40.0 {
        "Good effort! Let's add a bit more detail to make it even better!"
    } else {
        "Keep going! Here are some tips to improve your answer:"
    }
}

fn sentiment_line(label: SentimentLabel, score: f32) -> &'static str {
    match label {
        SentimentLabel::Positive if score > 0.9 => {
            "Amazing enthusiasm! Your positivity really shines through!"
        }
        SentimentLabel::Positive if score > 0.7 => {
            "Great confidence! Your positive attitude is clear!"
        }
        SentimentLabel::Positive => "Good tone! A bit more enthusiasm would make it even better!",
        SentimentLabel::Negative if score > 0.7 => "Let's add more positivity to your response!",
        SentimentLabel::Negative => "Try to be more optimistic in your answer!",
    }
}

fn length_line(words: usize) -> &'static str {
    if words < 10 {
        "Your answer is quite brief. Let's add more details to make it shine!"
    } else if words < 30 {
        "Perfect length! You've provided a concise yet informative answer!"
    } else if words < 50 {
        "Excellent detail! Your answer is comprehensive and well-structured!"
    } else {
        "Your answer is quite detailed. Make sure all points are relevant!"
    }
}

/// First `max` chars of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
