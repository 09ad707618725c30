//! Tournament data models.

use crate::bracket::{BracketError, BracketResult};
use crate::players::{PlayerId, models::validate_name};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting enrollments, no bracket yet
    Draft,
    /// Bracket generated, matches being played
    InProgress,
    /// Final completed
    Completed,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Draft => write!(f, "draft"),
            TournamentStatus::InProgress => write!(f, "in_progress"),
            TournamentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TournamentStatus {
    type Err = BracketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(TournamentStatus::Draft),
            "in_progress" => Ok(TournamentStatus::InProgress),
            "completed" => Ok(TournamentStatus::Completed),
            other => Err(BracketError::UnknownStatus(other.to_string())),
        }
    }
}

/// A tournament and its enrolled players
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
    /// Enrolled players in enrollment order, which is the round-1 pairing order
    pub player_ids: Vec<PlayerId>,
}

impl Tournament {
    /// Create an empty draft tournament with a fresh ID
    ///
    /// # Errors
    ///
    /// * `BracketError::InvalidInput` - blank or overlong name
    pub fn new(name: &str) -> BracketResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: validate_name(name, "tournament")?,
            status: TournamentStatus::Draft,
            created_at: Utc::now(),
            player_ids: Vec::new(),
        })
    }

    /// Whether enrollment changes are still allowed
    pub fn is_draft(&self) -> bool {
        self.status == TournamentStatus::Draft
    }

    pub fn player_count(&self) -> usize {
        self.player_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_roundtrip() {
        for status in [
            TournamentStatus::Draft,
            TournamentStatus::InProgress,
            TournamentStatus::Completed,
        ] {
            assert_eq!(
                status.to_string().parse::<TournamentStatus>().unwrap(),
                status
            );
        }
        assert!("running".parse::<TournamentStatus>().is_err());
    }

    #[test]
    fn test_new_tournament_is_empty_draft() {
        let tournament = Tournament::new("Spring Cup").unwrap();
        assert!(tournament.is_draft());
        assert_eq!(tournament.player_count(), 0);
        assert!(Tournament::new("").is_err());
    }
}
