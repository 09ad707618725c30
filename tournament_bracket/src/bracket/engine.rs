//! Single-elimination bracket engine.
//!
//! All functions here are pure: they take plain [`Match`] records, mutate them
//! in place where documented, and never touch storage. Matches are addressed by
//! `(round, position)` inside a flat slice; the winner of `(r, p)` moves on to
//! `(r + 1, p / 2)`, filling `player1` for even `p` and `player2` for odd `p`.

use super::errors::{BracketError, BracketResult};
use super::models::{AdvanceOutcome, Match, MatchId, MatchStatus, ScoreOutcome, Slot};
use crate::players::PlayerId;
use crate::tournament::TournamentId;
use chrono::Utc;

/// Minimum roster size for a bracket
pub const MIN_PLAYERS: usize = 2;

/// Number of rounds needed for `players` entrants, `ceil(log2(players))`.
///
/// Returns 0 for fewer than two players.
pub fn round_count(players: usize) -> u32 {
    if players < MIN_PLAYERS {
        return 0;
    }
    usize::BITS - (players - 1).leading_zeros()
}

/// Round, position and slot that the winner of `(round, position)` moves into
pub fn next_slot(round: u32, position: u32) -> (u32, u32, Slot) {
    let slot = if position % 2 == 0 {
        Slot::Player1
    } else {
        Slot::Player2
    };
    (round + 1, position / 2, slot)
}

/// Generate every match of a single-elimination bracket.
///
/// Round 1 pairs the players two at a time in the given order; an odd player
/// out gets a bye. Each later round holds `ceil(previous / 2)` empty pending
/// matches, down to the single final. Matches are returned in
/// round-then-position order and are not persisted.
///
/// # Errors
///
/// * `BracketError::InvalidArgument` - fewer than two players
pub fn generate(tournament_id: TournamentId, player_ids: &[PlayerId]) -> BracketResult<Vec<Match>> {
    if player_ids.len() < MIN_PLAYERS {
        return Err(BracketError::InvalidArgument(
            "at least 2 players required".to_string(),
        ));
    }

    let rounds = round_count(player_ids.len());
    let created_at = Utc::now();
    let mut matches = Vec::with_capacity(player_ids.len() + rounds as usize);

    for (position, pair) in player_ids.chunks(2).enumerate() {
        let mut m = Match::new(tournament_id, 1, position as u32, created_at);
        m.player1_id = Some(pair[0]);
        match pair.get(1) {
            Some(&opponent) => m.player2_id = Some(opponent),
            None => {
                m.status = MatchStatus::Bye;
                m.winner_id = Some(pair[0]);
            }
        }
        matches.push(m);
    }

    let mut previous = matches.len();
    for round in 2..=rounds {
        let count = previous.div_ceil(2);
        matches.extend(
            (0..count).map(|position| Match::new(tournament_id, round, position as u32, created_at)),
        );
        previous = count;
    }

    log::debug!(
        "Generated bracket for tournament {} with {} players: {} rounds, {} matches",
        tournament_id,
        player_ids.len(),
        rounds,
        matches.len()
    );

    Ok(matches)
}

/// Move the winner of a completed match into its next-round match.
///
/// The next-round match becomes `Pending` once both slots are filled, or a
/// `Bye` won by the lone occupant while only one is. A missing next-round
/// match means `completed` was the final.
///
/// # Errors
///
/// * `BracketError::InvalidOperation` - `completed` is not `Completed` with a
///   winner; nothing is mutated
pub fn advance(completed: &Match, matches: &mut [Match]) -> BracketResult<AdvanceOutcome> {
    let winner = match (completed.status, completed.winner_id) {
        (MatchStatus::Completed, Some(winner)) => winner,
        _ => {
            return Err(BracketError::InvalidOperation(
                "match must be completed with a winner to advance".to_string(),
            ));
        }
    };

    Ok(place_winner(completed, winner, matches))
}

/// Propagate every settled bye into the following round.
///
/// A bye is settled when its player can never receive an opponent: any
/// round-1 bye, and any later bye fed by a single existing match. Transient
/// byes, still waiting on a second feeder, stay put. Winners already in place
/// are skipped, so the call is idempotent. Returns the IDs of the matches that
/// received a player.
pub fn cascade_byes(matches: &mut [Match]) -> Vec<MatchId> {
    let mut mutated = Vec::new();
    let last_round = matches.iter().map(|m| m.round).max().unwrap_or(0);

    for round in 1..last_round {
        let all: &[Match] = matches;
        let settled: Vec<Match> = all
            .iter()
            .filter(|m| m.round == round && is_settled_bye(m, all))
            .cloned()
            .collect();

        for bye in settled {
            let Some(winner) = bye.winner_id else {
                continue;
            };

            let (next_round, next_position, slot) = next_slot(bye.round, bye.position);
            match find(matches, bye.tournament_id, next_round, next_position) {
                Some(next) if next.player(slot) == Some(winner) => continue,
                Some(next) if next.status == MatchStatus::Completed => {
                    log::warn!(
                        "Not moving bye winner {} into completed match {}",
                        winner,
                        next.id
                    );
                    continue;
                }
                _ => {}
            }

            if let AdvanceOutcome::MutatedNextRound(id) = place_winner(&bye, winner, matches) {
                log::debug!("Bye winner {} advanced into match {}", winner, id);
                if !mutated.contains(&id) {
                    mutated.push(id);
                }
            }
        }
    }

    mutated
}

/// Record a result on a match.
///
/// The higher score wins and the match becomes `Completed`.
///
/// # Errors
///
/// * `BracketError::InvalidInput` - equal or negative scores
/// * `BracketError::InvalidOperation` - a player slot is still empty
pub fn apply_score(m: &mut Match, score1: i32, score2: i32) -> BracketResult<()> {
    if score1 == score2 {
        return Err(BracketError::InvalidInput(
            "scores cannot be equal - a winner must be determined".to_string(),
        ));
    }
    if score1 < 0 || score2 < 0 {
        return Err(BracketError::InvalidInput(
            "scores must be greater than or equal to 0".to_string(),
        ));
    }
    let (Some(player1), Some(player2)) = (m.player1_id, m.player2_id) else {
        return Err(BracketError::InvalidOperation(
            "match needs two players before a score can be recorded".to_string(),
        ));
    };

    m.score1 = score1;
    m.score2 = score2;
    m.winner_id = Some(if score1 > score2 { player1 } else { player2 });
    m.status = MatchStatus::Completed;
    Ok(())
}

/// Score a match inside its bracket and propagate the result.
///
/// Applies the score, advances the winner, then cascades any bye settled by
/// the advance. `matches` must hold the whole bracket of the match's
/// tournament. On error nothing is mutated.
///
/// # Errors
///
/// * `BracketError::NotFound` - `match_id` is not in `matches`
/// * `BracketError::InvalidOperation` - a later match fed by this one already
///   has a result, or a player slot is empty
/// * `BracketError::InvalidInput` - equal or negative scores
pub fn score_match(
    matches: &mut [Match],
    match_id: MatchId,
    score1: i32,
    score2: i32,
) -> BracketResult<ScoreOutcome> {
    let index = matches
        .iter()
        .position(|m| m.id == match_id)
        .ok_or_else(|| BracketError::match_not_found(match_id))?;

    if let Some(locked) = completed_successor(&matches[index], matches) {
        return Err(BracketError::InvalidOperation(format!(
            "result already recorded downstream in match {locked}"
        )));
    }

    apply_score(&mut matches[index], score1, score2)?;
    let scored = matches[index].clone();
    let advance = advance(&scored, matches)?;

    let mut changed = vec![scored.id];
    if let AdvanceOutcome::MutatedNextRound(id) = advance {
        changed.push(id);
    }
    for id in cascade_byes(matches) {
        if !changed.contains(&id) {
            changed.push(id);
        }
    }

    log::debug!(
        "Scored match {} ({}:{}), {} match(es) changed",
        scored.id,
        score1,
        score2,
        changed.len()
    );

    Ok(ScoreOutcome {
        scored,
        advance,
        changed,
    })
}

/// Fill the next-round slot with `winner` and resolve that match's status.
fn place_winner(from: &Match, winner: PlayerId, matches: &mut [Match]) -> AdvanceOutcome {
    let (round, position, slot) = next_slot(from.round, from.position);
    let Some(next) = find_mut(matches, from.tournament_id, round, position) else {
        return AdvanceOutcome::NoFurtherRound;
    };

    match slot {
        Slot::Player1 => next.player1_id = Some(winner),
        Slot::Player2 => next.player2_id = Some(winner),
    }

    match (next.player1_id, next.player2_id) {
        (Some(_), Some(_)) => {
            next.status = MatchStatus::Pending;
            next.winner_id = None;
        }
        (Some(lone), None) | (None, Some(lone)) => {
            next.status = MatchStatus::Bye;
            next.winner_id = Some(lone);
        }
        (None, None) => {}
    }

    AdvanceOutcome::MutatedNextRound(next.id)
}

/// Number of round `r - 1` matches feeding `m`
fn feeder_count(m: &Match, matches: &[Match]) -> usize {
    if m.round <= 1 {
        return 0;
    }
    let first = m.position * 2;
    matches
        .iter()
        .filter(|f| {
            f.tournament_id == m.tournament_id
                && f.round == m.round - 1
                && (f.position == first || f.position == first + 1)
        })
        .count()
}

fn is_settled_bye(m: &Match, matches: &[Match]) -> bool {
    m.status == MatchStatus::Bye && (m.round == 1 || feeder_count(m, matches) == 1)
}

/// First completed match downstream of `m`, following single-feeder matches
/// that a bye cascade would rewrite.
fn completed_successor(m: &Match, matches: &[Match]) -> Option<MatchId> {
    let mut current = m;
    loop {
        let (round, position, _) = next_slot(current.round, current.position);
        let next = find(matches, current.tournament_id, round, position)?;
        if next.status == MatchStatus::Completed {
            return Some(next.id);
        }
        if feeder_count(next, matches) != 1 {
            return None;
        }
        current = next;
    }
}

fn find(matches: &[Match], tournament_id: TournamentId, round: u32, position: u32) -> Option<&Match> {
    matches
        .iter()
        .find(|m| m.tournament_id == tournament_id && m.round == round && m.position == position)
}

fn find_mut(
    matches: &mut [Match],
    tournament_id: TournamentId,
    round: u32,
    position: u32,
) -> Option<&mut Match> {
    matches
        .iter_mut()
        .find(|m| m.tournament_id == tournament_id && m.round == round && m.position == position)
}
