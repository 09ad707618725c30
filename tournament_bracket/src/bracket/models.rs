//! Bracket data models.

use super::errors::BracketError;
use crate::players::PlayerId;
use crate::tournament::TournamentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Match status
///
/// Persisted as text, see the `Display` and `FromStr` impls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Waiting for players or for a result
    Pending,
    /// Reserved, never assigned by the engine
    InProgress,
    /// Result recorded, winner set
    Completed,
    /// Single player, auto-won
    Bye,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Bye => write!(f, "bye"),
        }
    }
}

impl FromStr for MatchStatus {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchStatus::Pending),
            "in_progress" => Ok(MatchStatus::InProgress),
            "completed" => Ok(MatchStatus::Completed),
            "bye" => Ok(MatchStatus::Bye),
            other => Err(BracketError::UnknownStatus(other.to_string())),
        }
    }
}

/// Player slot of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Player1,
    Player2,
}

/// A single match in a bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// Round number (1-indexed)
    pub round: u32,
    /// Position within the round (0-indexed)
    pub position: u32,
    pub player1_id: Option<PlayerId>,
    pub player2_id: Option<PlayerId>,
    pub score1: i32,
    pub score2: i32,
    pub winner_id: Option<PlayerId>,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Create an empty pending match with a fresh ID
    pub fn new(
        tournament_id: TournamentId,
        round: u32,
        position: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round,
            position,
            player1_id: None,
            player2_id: None,
            score1: 0,
            score2: 0,
            winner_id: None,
            status: MatchStatus::Pending,
            created_at,
        }
    }

    /// Get the player in a slot
    pub fn player(&self, slot: Slot) -> Option<PlayerId> {
        match slot {
            Slot::Player1 => self.player1_id,
            Slot::Player2 => self.player2_id,
        }
    }

    /// Both slots are filled
    pub fn is_ready(&self) -> bool {
        self.player1_id.is_some() && self.player2_id.is_some()
    }

    /// Whether the given player occupies either slot
    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.player1_id == Some(player_id) || self.player2_id == Some(player_id)
    }
}

/// Result of advancing a winner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdvanceOutcome {
    /// The next-round match with this ID received the winner
    MutatedNextRound(MatchId),
    /// The match was the final
    NoFurtherRound,
}

/// Result of recording a score against a bracket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// The scored match after the update
    pub scored: Match,
    /// What advancing its winner did
    pub advance: AdvanceOutcome,
    /// Every match rewritten, scored match first
    pub changed: Vec<MatchId>,
}

impl ScoreOutcome {
    /// The scored match was the final and now has a winner
    pub fn completes_tournament(&self) -> bool {
        self.advance == AdvanceOutcome::NoFurtherRound
            && self.scored.status == MatchStatus::Completed
    }
}

/// Matches of one tournament grouped by round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bracket {
    pub tournament_id: TournamentId,
    pub rounds: BTreeMap<u32, Vec<Match>>,
}

impl Bracket {
    /// Group a flat match list, ordering each round by position
    pub fn from_matches(tournament_id: TournamentId, matches: Vec<Match>) -> Self {
        let mut rounds: BTreeMap<u32, Vec<Match>> = BTreeMap::new();
        for m in matches {
            rounds.entry(m.round).or_default().push(m);
        }
        for round in rounds.values_mut() {
            round.sort_by_key(|m| m.position);
        }

        Self {
            tournament_id,
            rounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Number of rounds
    pub fn round_count(&self) -> u32 {
        self.rounds.keys().next_back().copied().unwrap_or(0)
    }

    /// Matches of a round, ordered by position
    pub fn round(&self, round: u32) -> &[Match] {
        self.rounds.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All matches in round-then-position order
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.rounds.values().flatten()
    }

    /// Get a match by round and position
    pub fn get(&self, round: u32, position: u32) -> Option<&Match> {
        self.round(round).iter().find(|m| m.position == position)
    }

    /// The single match of the last round
    pub fn final_match(&self) -> Option<&Match> {
        self.get(self.round_count(), 0)
    }

    /// Winner of the completed final
    pub fn champion(&self) -> Option<PlayerId> {
        self.final_match()
            .filter(|m| m.status == MatchStatus::Completed)
            .and_then(|m| m.winner_id)
    }
}
