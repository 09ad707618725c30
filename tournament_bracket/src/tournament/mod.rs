//! Tournament module for single-elimination events.
//!
//! This module provides tournament management functionality including:
//! - Tournament creation and listing
//! - Player enrollment while the tournament is a draft
//! - Bracket generation and score submission
//! - Completion once the final has a result
//!
//! ## Example
//!
//! ```
//! use tournament_bracket::tournament::TournamentManager;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::in_memory();
//!
//!     let tournament = manager.create_tournament("Friday Finals").await?;
//!     for name in ["Ada", "Grace", "Linus"] {
//!         let player = manager.create_player(name).await?;
//!         manager.add_player(tournament.id, player.id).await?;
//!     }
//!
//!     let bracket = manager.generate_bracket(tournament.id).await?;
//!     assert_eq!(bracket.round_count(), 2);
//!
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::{ScoreReport, TournamentManager};
pub use models::{Tournament, TournamentId, TournamentStatus};
