//! Player registry models.
//!
//! Players are created once and referenced by ID from tournaments and
//! matches. Storage lives behind [`crate::db::PlayerRepository`].

pub mod models;

pub use models::{MAX_NAME_LENGTH, Player, PlayerId};
