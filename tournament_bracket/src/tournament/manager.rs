//! Tournament manager orchestrating players, enrollment and brackets.

use super::models::{Tournament, TournamentId};
use crate::bracket::{self, AdvanceOutcome, Bracket, BracketError, BracketResult, Match, MatchId};
use crate::db::{InMemoryStore, MatchRepository, PgStore, PlayerRepository, TournamentRepository};
use crate::players::{Player, PlayerId};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

/// Result of a score submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreReport {
    /// The scored match after the update
    #[serde(rename = "match")]
    pub scored: Match,
    /// Where the winner went
    pub advance: AdvanceOutcome,
    /// Every match rewritten by the submission, scored match first
    pub changed: Vec<MatchId>,
    /// The submission decided the tournament
    pub tournament_completed: bool,
}

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    players: Arc<dyn PlayerRepository>,
    tournaments: Arc<dyn TournamentRepository>,
    matches: Arc<dyn MatchRepository>,
}

impl TournamentManager {
    /// Create a manager over explicit repositories
    pub fn new(
        players: Arc<dyn PlayerRepository>,
        tournaments: Arc<dyn TournamentRepository>,
        matches: Arc<dyn MatchRepository>,
    ) -> Self {
        Self {
            players,
            tournaments,
            matches,
        }
    }

    /// Create a manager backed by PostgreSQL
    pub fn with_postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self::new(store.clone(), store.clone(), store)
    }

    /// Create a manager backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(store.clone(), store.clone(), store)
    }

    /// Register a new player
    ///
    /// # Errors
    ///
    /// * `BracketError::InvalidInput` - blank or overlong name
    pub async fn create_player(&self, name: &str) -> BracketResult<Player> {
        let player = Player::new(name)?;
        self.players.create_player(&player).await?;

        log::info!("Created player {} '{}'", player.id, player.name);
        Ok(player)
    }

    /// Get a player by ID
    pub async fn get_player(&self, player_id: PlayerId) -> BracketResult<Player> {
        self.players
            .find_player(player_id)
            .await?
            .ok_or_else(|| BracketError::player_not_found(player_id))
    }

    /// All players ordered by name
    pub async fn list_players(&self) -> BracketResult<Vec<Player>> {
        self.players.list_players().await
    }

    /// Create a draft tournament
    ///
    /// # Errors
    ///
    /// * `BracketError::InvalidInput` - blank or overlong name
    pub async fn create_tournament(&self, name: &str) -> BracketResult<Tournament> {
        let tournament = Tournament::new(name)?;
        self.tournaments.create_tournament(&tournament).await?;

        log::info!("Created tournament {} '{}'", tournament.id, tournament.name);
        Ok(tournament)
    }

    /// Get a tournament with its enrolled players
    pub async fn get_tournament(&self, tournament_id: TournamentId) -> BracketResult<Tournament> {
        self.tournaments
            .find_tournament(tournament_id)
            .await?
            .ok_or_else(|| BracketError::tournament_not_found(tournament_id))
    }

    /// All tournaments, newest first
    pub async fn list_tournaments(&self) -> BracketResult<Vec<Tournament>> {
        self.tournaments.list_tournaments().await
    }

    /// Enroll a player in a draft tournament
    ///
    /// Enrolling an already enrolled player is a no-op. The store re-checks
    /// the draft status atomically with the insert, so a concurrent bracket
    /// generation either sees the player or rejects the enrollment.
    ///
    /// # Errors
    ///
    /// * `BracketError::NotFound` - tournament or player missing
    /// * `BracketError::InvalidOperation` - tournament is past the draft stage
    pub async fn add_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<()> {
        let tournament = self.draft_tournament(tournament_id, "add players to").await?;
        self.get_player(player_id).await?;

        if self.tournaments.add_player(tournament.id, player_id).await? {
            log::info!("Enrolled player {} in tournament {}", player_id, tournament_id);
        } else {
            log::debug!(
                "Player {} already enrolled in tournament {}",
                player_id,
                tournament_id
            );
        }

        Ok(())
    }

    /// Withdraw a player from a draft tournament
    ///
    /// # Errors
    ///
    /// * `BracketError::NotFound` - tournament or player missing, or the player
    ///   is not enrolled
    /// * `BracketError::InvalidOperation` - tournament is past the draft stage
    pub async fn remove_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<()> {
        let tournament = self
            .draft_tournament(tournament_id, "remove players from")
            .await?;
        self.get_player(player_id).await?;

        if !tournament.player_ids.contains(&player_id)
            || !self.tournaments.remove_player(tournament_id, player_id).await?
        {
            return Err(BracketError::NotFound {
                entity: "Enrollment",
                id: player_id,
            });
        }

        log::info!("Withdrew player {} from tournament {}", player_id, tournament_id);
        Ok(())
    }

    /// Generate and persist the bracket of a draft tournament
    ///
    /// Round 1 follows enrollment order. Round-1 byes are propagated before
    /// the matches are stored. Storing the matches and moving the tournament
    /// to `InProgress` is one store step, which fails if the enrollment
    /// changed after the roster was read.
    ///
    /// # Errors
    ///
    /// * `BracketError::NotFound` - tournament missing
    /// * `BracketError::InvalidOperation` - not a draft, or a bracket exists
    /// * `BracketError::InvalidArgument` - fewer than two players enrolled
    pub async fn generate_bracket(&self, tournament_id: TournamentId) -> BracketResult<Bracket> {
        let tournament = self
            .draft_tournament(tournament_id, "generate a bracket for")
            .await?;

        if !self
            .matches
            .matches_for_tournament(tournament_id)
            .await?
            .is_empty()
        {
            return Err(BracketError::InvalidOperation(format!(
                "tournament {tournament_id} already has a bracket"
            )));
        }

        let mut matches = bracket::generate(tournament_id, &tournament.player_ids)?;
        bracket::cascade_byes(&mut matches);

        self.matches
            .create_many(tournament_id, &tournament.player_ids, &matches)
            .await?;

        log::info!(
            "Generated bracket for tournament {}: {} players, {} rounds, {} matches",
            tournament_id,
            tournament.player_count(),
            bracket::round_count(tournament.player_count()),
            matches.len()
        );

        Ok(Bracket::from_matches(tournament_id, matches))
    }

    /// Record a match result and advance its winner
    ///
    /// Completing the final marks the tournament `Completed` within the same
    /// store step.
    ///
    /// # Errors
    ///
    /// * `BracketError::NotFound` - match missing
    /// * `BracketError::InvalidInput` - equal or negative scores
    /// * `BracketError::InvalidOperation` - the match lacks a player, or a
    ///   match it feeds already has a result
    pub async fn submit_score(
        &self,
        match_id: MatchId,
        score1: i32,
        score2: i32,
    ) -> BracketResult<ScoreReport> {
        let outcome = self.matches.record_score(match_id, score1, score2).await?;
        let tournament_completed = outcome.completes_tournament();
        let scored = outcome.scored;

        if tournament_completed {
            log::info!(
                "Tournament {} completed, champion {:?}",
                scored.tournament_id,
                scored.winner_id
            );
        } else {
            log::info!(
                "Recorded {}:{} for match {} (round {}, position {})",
                score1,
                score2,
                scored.id,
                scored.round,
                scored.position
            );
        }

        Ok(ScoreReport {
            scored,
            advance: outcome.advance,
            changed: outcome.changed,
            tournament_completed,
        })
    }

    /// Get the bracket of a tournament grouped by round
    ///
    /// A draft tournament has an empty bracket.
    pub async fn get_bracket(&self, tournament_id: TournamentId) -> BracketResult<Bracket> {
        self.get_tournament(tournament_id).await?;
        let matches = self.matches.matches_for_tournament(tournament_id).await?;
        Ok(Bracket::from_matches(tournament_id, matches))
    }

    async fn draft_tournament(
        &self,
        tournament_id: TournamentId,
        action: &str,
    ) -> BracketResult<Tournament> {
        let tournament = self.get_tournament(tournament_id).await?;
        if !tournament.is_draft() {
            return Err(BracketError::not_draft(tournament_id, tournament.status, action));
        }
        Ok(tournament)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::TournamentStatus;

    #[tokio::test]
    async fn test_enrollment_only_while_draft() {
        let manager = TournamentManager::in_memory();
        let tournament = manager.create_tournament("Cup").await.unwrap();
        let a = manager.create_player("A").await.unwrap();
        let b = manager.create_player("B").await.unwrap();
        let c = manager.create_player("C").await.unwrap();

        manager.add_player(tournament.id, a.id).await.unwrap();
        manager.add_player(tournament.id, b.id).await.unwrap();
        manager.generate_bracket(tournament.id).await.unwrap();

        let err = manager.add_player(tournament.id, c.id).await.unwrap_err();
        assert!(matches!(err, BracketError::InvalidOperation(_)));
        let err = manager.remove_player(tournament.id, a.id).await.unwrap_err();
        assert!(matches!(err, BracketError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_remove_requires_enrollment() {
        let manager = TournamentManager::in_memory();
        let tournament = manager.create_tournament("Cup").await.unwrap();
        let a = manager.create_player("A").await.unwrap();

        let err = manager.remove_player(tournament.id, a.id).await.unwrap_err();
        assert!(err.is_not_found());

        let err = manager
            .add_player(tournament.id, PlayerId::new_v4())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_generate_needs_two_players() {
        let manager = TournamentManager::in_memory();
        let tournament = manager.create_tournament("Cup").await.unwrap();
        let a = manager.create_player("A").await.unwrap();
        manager.add_player(tournament.id, a.id).await.unwrap();

        let err = manager.generate_bracket(tournament.id).await.unwrap_err();
        assert!(matches!(err, BracketError::InvalidArgument(_)));
        assert_eq!(
            manager.get_tournament(tournament.id).await.unwrap().status,
            TournamentStatus::Draft
        );
        assert!(manager.get_bracket(tournament.id).await.unwrap().is_empty());
    }
}
