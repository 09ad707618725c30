//! Player data models.

use crate::bracket::{BracketError, BracketResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Player ID type
pub type PlayerId = Uuid;

/// Longest accepted display name, in characters
pub const MAX_NAME_LENGTH: usize = 100;

/// A registered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Display name
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Player {
    /// Create a player with a fresh ID
    ///
    /// The name is trimmed before it is stored.
    ///
    /// # Errors
    ///
    /// * `BracketError::InvalidInput` - name is blank or longer than
    ///   [`MAX_NAME_LENGTH`]
    pub fn new(name: &str) -> BracketResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: validate_name(name, "player")?,
            created_at: Utc::now(),
        })
    }
}

/// Trim and check a player or tournament name
pub(crate) fn validate_name(name: &str, kind: &str) -> BracketResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BracketError::InvalidInput(format!("{kind} name is required")));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(BracketError::InvalidInput(format!(
            "{kind} name must not exceed {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_is_trimmed() {
        let player = Player::new("  Ada  ").unwrap();
        assert_eq!(player.name, "Ada");
    }

    #[test]
    fn test_player_name_validation() {
        assert!(matches!(
            Player::new("   "),
            Err(BracketError::InvalidInput(_))
        ));
        assert!(Player::new(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(Player::new(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
