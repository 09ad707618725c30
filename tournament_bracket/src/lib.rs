//! # Tournament Bracket
//!
//! A single-elimination tournament engine with pluggable storage.
//!
//! The core is a pure bracket engine over plain [`Match`] records: it turns an
//! ordered roster into a complete round-structured elimination tree and moves
//! each winner into the next round. Around it sit the player and tournament
//! models, repository traits with PostgreSQL and in-memory implementations,
//! and a [`TournamentManager`] that ties them together.
//!
//! ## Core Modules
//!
//! - [`bracket`]: Generation, advancement, scoring and bye propagation
//! - [`tournament`]: Tournament lifecycle and orchestration
//! - [`players`]: Player registry models
//! - [`db`]: Connection pool, migrations and repositories
//!
//! ## Example
//!
//! ```
//! use tournament_bracket::{MatchStatus, generate};
//! use uuid::Uuid;
//!
//! let players: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
//! let matches = generate(Uuid::new_v4(), &players).unwrap();
//!
//! // Three rounds: 3 + 2 + 1 matches, the odd player out gets a bye
//! assert_eq!(matches.len(), 6);
//! assert_eq!(matches[2].status, MatchStatus::Bye);
//! ```

/// Pure single-elimination bracket engine.
pub mod bracket;
pub use bracket::{
    AdvanceOutcome, Bracket, BracketError, BracketResult, Match, MatchId, MatchStatus,
    ScoreOutcome, advance, generate,
};

/// Database access and storage backends.
pub mod db;

/// Player registry.
pub mod players;
pub use players::{Player, PlayerId};

/// Tournament lifecycle and orchestration.
pub mod tournament;
pub use tournament::{ScoreReport, Tournament, TournamentId, TournamentManager, TournamentStatus};
