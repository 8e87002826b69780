use rand::Rng;

use crate::bank::QuestionBank;
use crate::model::Question;

/// How many of the best-ranked eligible questions the random pick draws from.
const SHORTLIST_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A snapshot of the chosen question, taken after its counter was bumped.
    Question(Question),
    Exhausted,
}

/// Pick the next question and bump its times-asked counter.
///
/// Eligible questions are ranked by rating (highest first), then by times asked (lowest
/// first); the pick is uniform over the top three. The ranking sort is stable, so full ties
/// keep table order.
pub fn select_next<R: Rng + ?Sized>(bank: &mut QuestionBank, rng: &mut R) -> Selection {
    let mut ranked: Vec<usize> = bank
        .questions()
        .iter()
        .enumerate()
        .filter(|(_, q)| q.is_eligible())
        .map(|(i, _)| i)
        .collect();
    if ranked.is_empty() {
        return Selection::Exhausted;
    }

    let questions = bank.questions();
    ranked.sort_by(|&a, &b| {
        let (qa, qb) = (&questions[a], &questions[b]);
        qb.rating
            .cmp(&qa.rating)
            .then(qa.times_asked.cmp(&qb.times_asked))
    });
    ranked.truncate(SHORTLIST_LEN);

    let idx = ranked[rng.gen_range(0..ranked.len())];
    let chosen = &mut bank.questions_mut()[idx];
    chosen.times_asked += 1;
    Selection::Question(chosen.clone())
}
