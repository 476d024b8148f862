//! Pure round-scoring functions applied by the session driver at round close.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{AnswerEntity, PlayerScoreEntity};

/// Number of option slots per question.
pub const OPTION_SLOTS: usize = 4;

/// One player's answer for the round being closed, with defensive defaults
/// already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundAnswer {
    /// Player who submitted the answer.
    pub player_id: Uuid,
    /// Chosen option index.
    pub answer: u8,
    /// Store-stamped submission time in milliseconds since the epoch.
    pub time_ms: u64,
}

/// Convert raw answer records into scoring inputs. A record missing its
/// `answer` counts as option 0 and a missing `time` as 0, so a partially
/// written record still tallies instead of crashing the round close.
pub fn normalize_answers(records: Vec<(Uuid, AnswerEntity)>) -> Vec<RoundAnswer> {
    records
        .into_iter()
        .map(|(player_id, record)| RoundAnswer {
            player_id,
            answer: record.answer.unwrap_or(0),
            time_ms: record.time.unwrap_or(0),
        })
        .collect()
}

/// Tally how many players picked each option. Returns the four per-slot
/// counters and their sum. Out-of-range answers land in slot 0.
pub fn tally_guesses(answers: &[RoundAnswer]) -> ([u32; OPTION_SLOTS], u32) {
    let mut guesses = [0u32; OPTION_SLOTS];
    for answer in answers {
        let slot = usize::from(answer.answer);
        let slot = if slot < OPTION_SLOTS { slot } else { 0 };
        guesses[slot] += 1;
    }
    let total = guesses.iter().sum();
    (guesses, total)
}

/// Merge one closed round into the cumulative score map.
///
/// Every answering player gets an entry (created at `{score: 0, time: 0}` on
/// first contribution). Correct answers add one point and the elapsed
/// milliseconds since the round opened; wrong answers leave the entry as-is.
/// Players without an answer record this round are untouched.
pub fn apply_round_scores(
    scores: &mut IndexMap<Uuid, PlayerScoreEntity>,
    answers: &[RoundAnswer],
    correct_index: u8,
    round_started_ms: u64,
) {
    for answer in answers {
        let entry = scores.entry(answer.player_id).or_default();
        if answer.answer == correct_index {
            entry.score += 1;
            entry.time += answer.time_ms.saturating_sub(round_started_ms);
        }
    }
}

/// Average response time in seconds for display, rounded to one decimal.
/// A player with no correct answers shows 0.
pub fn average_answer_seconds(score: u32, time_ms: u64) -> f64 {
    if score == 0 {
        return 0.0;
    }
    (10.0 * (time_ms as f64 / score as f64 / 1000.0)).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(player_id: Uuid, answer: u8, time_ms: u64) -> RoundAnswer {
        RoundAnswer {
            player_id,
            answer,
            time_ms,
        }
    }

    #[test]
    fn normalize_defaults_missing_fields() {
        let player = Uuid::new_v4();
        let records = vec![(
            player,
            AnswerEntity {
                answer: None,
                time: None,
            },
        )];
        assert_eq!(normalize_answers(records), vec![answer(player, 0, 0)]);
    }

    #[test]
    fn tally_counts_each_slot_and_total() {
        let answers = vec![
            answer(Uuid::new_v4(), 0, 0),
            answer(Uuid::new_v4(), 2, 0),
            answer(Uuid::new_v4(), 2, 0),
            answer(Uuid::new_v4(), 3, 0),
        ];
        let (guesses, total) = tally_guesses(&answers);
        assert_eq!(guesses, [1, 0, 2, 1]);
        assert_eq!(total, 4);
    }

    #[test]
    fn score_increments_only_for_correct_answers() {
        let correct = Uuid::new_v4();
        let wrong = Uuid::new_v4();
        let absent = Uuid::new_v4();

        let mut scores = IndexMap::new();
        scores.insert(absent, PlayerScoreEntity { score: 2, time: 800 });

        let answers = vec![answer(correct, 1, 5_000), answer(wrong, 3, 6_000)];
        apply_round_scores(&mut scores, &answers, 1, 4_000);

        assert_eq!(
            scores[&correct],
            PlayerScoreEntity {
                score: 1,
                time: 1_000
            }
        );
        // Wrong answers still register the player with a neutral entry.
        assert_eq!(scores[&wrong], PlayerScoreEntity { score: 0, time: 0 });
        // Players who did not answer this round are unchanged.
        assert_eq!(scores[&absent], PlayerScoreEntity { score: 2, time: 800 });
    }

    #[test]
    fn time_accumulates_across_rounds() {
        let player = Uuid::new_v4();
        let mut scores = IndexMap::new();

        apply_round_scores(&mut scores, &[answer(player, 0, 11_500)], 0, 10_000);
        apply_round_scores(&mut scores, &[answer(player, 2, 22_000)], 2, 20_000);
        apply_round_scores(&mut scores, &[answer(player, 1, 31_000)], 1, 30_000);

        assert_eq!(
            scores[&player],
            PlayerScoreEntity {
                score: 3,
                time: 4_500
            }
        );
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(average_answer_seconds(3, 4_500), 1.5);
        assert_eq!(average_answer_seconds(2, 4_500), 2.3);
        assert_eq!(average_answer_seconds(0, 4_500), 0.0);
    }

    #[test]
    fn answer_time_before_round_start_clamps_to_zero() {
        let player = Uuid::new_v4();
        let mut scores = IndexMap::new();
        apply_round_scores(&mut scores, &[answer(player, 0, 500)], 0, 10_000);
        assert_eq!(scores[&player], PlayerScoreEntity { score: 1, time: 0 });
    }
}
