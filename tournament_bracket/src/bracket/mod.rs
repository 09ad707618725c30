//! Bracket module implementing the single-elimination engine.
//!
//! This module provides:
//! - Bracket generation from an ordered roster, with byes for odd counts
//! - Winner advancement into the next round by `(round, position)`
//! - Score application and bye propagation
//! - A round-grouped [`Bracket`] view for presentation
//!
//! Everything here is pure and storage-agnostic; persistence and locking
//! live in [`crate::db`] and [`crate::tournament`].
//!
//! ## Example
//!
//! ```
//! use tournament_bracket::bracket::{self, AdvanceOutcome, MatchStatus};
//! use uuid::Uuid;
//!
//! let tournament_id = Uuid::new_v4();
//! let players: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
//!
//! let mut matches = bracket::generate(tournament_id, &players).unwrap();
//! assert_eq!(matches.len(), 3);
//!
//! let first = matches[0].id;
//! let outcome = bracket::score_match(&mut matches, first, 3, 1).unwrap();
//! assert!(matches!(outcome.advance, AdvanceOutcome::MutatedNextRound(_)));
//! assert_eq!(outcome.scored.status, MatchStatus::Completed);
//! ```

pub mod engine;
pub mod errors;
pub mod models;

pub use engine::{
    MIN_PLAYERS, advance, apply_score, cascade_byes, generate, next_slot, round_count,
    score_match,
};
pub use errors::{BracketError, BracketResult};
pub use models::{
    AdvanceOutcome, Bracket, Match, MatchId, MatchStatus, ScoreOutcome, Slot,
};
