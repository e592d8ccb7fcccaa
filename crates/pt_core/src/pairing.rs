//! Swiss pairing: seeded round-1 shuffle, then point-group pairing with
//! greedy rematch avoidance.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::models::{Team, TeamId};

/// Pick the bye recipient from a ranked pool (best first): the lowest-ranked
/// team that has not had a bye yet, or the lowest-ranked team outright when
/// every team has already had one. Returns the pool index.
pub(crate) fn select_bye(pool: &[&Team]) -> Option<usize> {
    pool.iter()
        .rposition(|t| !t.received_bye)
        .or_else(|| pool.len().checked_sub(1))
}

/// Pair an even-sized, Swiss-ranked pool (best first) for the given 1-based
/// round.
///
/// Round 1 is a uniform shuffle paired consecutively. Later rounds walk the
/// point groups from the top: each group pairs greedily, taking for every
/// team the first groupmate it has not met; a team with no fresh opponent
/// sinks into the next group down. Whatever is left after the lowest group
/// pairs consecutively even if that repeats an opponent.
pub(crate) fn pair_round(pool: &[&Team], round: u32, rng: &mut ChaCha8Rng) -> Vec<(TeamId, TeamId)> {
    debug_assert!(pool.len() % 2 == 0, "bye assignment must leave an even pool");

    if round <= 1 {
        let mut ids: Vec<TeamId> = pool.iter().map(|t| t.id).collect();
        ids.shuffle(rng);
        return ids.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
    }

    // The pool is ranked, so teams on equal points sit in consecutive runs.
    let mut groups: Vec<Vec<&Team>> = Vec::new();
    for team in pool {
        match groups.last_mut() {
            Some(group) if group[0].points == team.points => group.push(team),
            _ => groups.push(vec![team]),
        }
    }

    let mut pairs = Vec::new();
    let mut unpaired: Vec<&Team> = Vec::new();
    for group in groups {
        let mut current: VecDeque<&Team> =
            group.into_iter().chain(unpaired.drain(..)).collect();
        while current.len() >= 2 {
            let Some(team1) = current.pop_front() else {
                break;
            };
            let fresh = current.iter().position(|t| !team1.past_opponents.contains(&t.id));
            match fresh.and_then(|idx| current.remove(idx)) {
                Some(team2) => pairs.push((team1.id, team2.id)),
                None => unpaired.push(team1),
            }
        }
        unpaired.extend(current);
    }

    // Lowest-group fallback: everyone left has only past opponents available.
    for pair in unpaired.chunks_exact(2) {
        pairs.push((pair[0].id, pair[1].id));
    }

    pairs
}
