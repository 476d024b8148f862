//! Pure leaderboard ranking, recomputed from the cumulative score map every
//! time scores change.

use std::collections::HashMap;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::{LeaderboardEntryEntity, PlayerEntity, PlayerScoreEntity};

/// Rank the cumulative scores into the published leaderboard.
///
/// Scored players are joined with their profile; entries whose profile is
/// missing are dropped silently. The list is sorted by score descending, ties
/// broken by time ascending, with a stable sort so equal entries keep their
/// insertion order. `place` resets to `index + 1` only when the entry's score
/// drops below, or its time exceeds, the previous entry's; adjacent entries
/// tied on both fields share a place. Entries ranked past `leaderboard_max`
/// are truncated.
pub fn rank_players(
    scores: &IndexMap<Uuid, PlayerScoreEntity>,
    directory: &HashMap<Uuid, PlayerEntity>,
    leaderboard_max: u32,
) -> Vec<LeaderboardEntryEntity> {
    let mut joined: Vec<(Uuid, PlayerScoreEntity)> = scores
        .iter()
        .filter(|(player_id, _)| directory.contains_key(player_id))
        .map(|(player_id, score)| (*player_id, *score))
        .collect();

    joined.sort_by(|(_, a), (_, b)| b.score.cmp(&a.score).then(a.time.cmp(&b.time)));

    let mut ranked = Vec::with_capacity(joined.len());
    let mut place = 0u32;
    let mut previous: Option<PlayerScoreEntity> = None;

    for (index, (player_id, score)) in joined.into_iter().enumerate() {
        let tied = previous
            .map(|prev| score.score == prev.score && score.time == prev.time)
            .unwrap_or(false);
        if !tied {
            place = index as u32 + 1;
        }
        previous = Some(score);

        if place > leaderboard_max {
            break;
        }

        let Some(player) = directory.get(&player_id) else {
            continue;
        };
        ranked.push(LeaderboardEntryEntity {
            score: score.score,
            time: score.time,
            place,
            player: player.clone().into(),
        });
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(first_name: &str) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: "Tester".into(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            image: String::new(),
            session_id: None,
        }
    }

    fn fixture(
        entries: &[(&PlayerEntity, u32, u64)],
    ) -> (
        IndexMap<Uuid, PlayerScoreEntity>,
        HashMap<Uuid, PlayerEntity>,
    ) {
        let mut scores = IndexMap::new();
        let mut directory = HashMap::new();
        for (player, score, time) in entries {
            scores.insert(
                player.id,
                PlayerScoreEntity {
                    score: *score,
                    time: *time,
                },
            );
            directory.insert(player.id, (*player).clone());
        }
        (scores, directory)
    }

    #[test]
    fn empty_scores_rank_to_empty_list() {
        let (scores, directory) = fixture(&[]);
        assert!(rank_players(&scores, &directory, 1000).is_empty());
    }

    #[test]
    fn sorted_by_score_then_time() {
        let (alice, bob, carol) = (player("Alice"), player("Bob"), player("Carol"));
        let (scores, directory) =
            fixture(&[(&alice, 2, 9_000), (&bob, 3, 5_000), (&carol, 3, 4_000)]);

        let ranked = rank_players(&scores, &directory, 1000);
        let order: Vec<Uuid> = ranked.iter().map(|entry| entry.player.id).collect();
        assert_eq!(order, vec![carol.id, bob.id, alice.id]);
        assert_eq!(
            ranked.iter().map(|entry| entry.place).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn full_ties_share_a_place() {
        let (alice, bob, carol) = (player("Alice"), player("Bob"), player("Carol"));
        let (scores, directory) =
            fixture(&[(&alice, 3, 4_000), (&bob, 3, 4_000), (&carol, 1, 2_000)]);

        let ranked = rank_players(&scores, &directory, 1000);
        assert_eq!(
            ranked.iter().map(|entry| entry.place).collect::<Vec<_>>(),
            vec![1, 1, 3]
        );
    }

    #[test]
    fn score_tie_with_different_time_does_not_share() {
        let (alice, bob) = (player("Alice"), player("Bob"));
        let (scores, directory) = fixture(&[(&alice, 3, 5_000), (&bob, 3, 4_000)]);

        let ranked = rank_players(&scores, &directory, 1000);
        assert_eq!(ranked[0].player.id, bob.id);
        assert_eq!(
            ranked.iter().map(|entry| entry.place).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn truncates_by_place_not_by_count() {
        let (alice, bob, carol) = (player("Alice"), player("Bob"), player("Carol"));
        let (scores, directory) =
            fixture(&[(&alice, 3, 4_000), (&bob, 3, 4_000), (&carol, 1, 2_000)]);

        // Both tied entries hold place 1 and survive a cap of 1; carol at
        // place 3 is dropped.
        let ranked = rank_players(&scores, &directory, 1);
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|entry| entry.place == 1));
    }

    #[test]
    fn missing_profiles_are_dropped() {
        let (alice, ghost) = (player("Alice"), player("Ghost"));
        let (mut scores, directory) = fixture(&[(&alice, 1, 1_000)]);
        scores.insert(ghost.id, PlayerScoreEntity { score: 5, time: 0 });

        let ranked = rank_players(&scores, &directory, 1000);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].player.id, alice.id);
        assert_eq!(ranked[0].place, 1);
    }
}
