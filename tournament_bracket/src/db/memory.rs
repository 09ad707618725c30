//! In-memory store implementing every repository trait.
//!
//! Backs the unit and integration tests and the CLI's `--memory` mode. A
//! single `RwLock` guards all state. Every check-then-write step (draft-only
//! enrollment, bracket creation, score with advance and cascade) runs under
//! one write lock.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::repository::{
    MatchRepository, PlayerRepository, TournamentRepository, check_new_bracket,
};
use crate::bracket::{self, BracketError, BracketResult, Match, MatchId, ScoreOutcome};
use crate::players::{Player, PlayerId};
use crate::tournament::{Tournament, TournamentId, TournamentStatus};

#[derive(Debug, Default)]
struct State {
    players: HashMap<PlayerId, Player>,
    /// Tournaments without their rosters, see `rosters`
    tournaments: HashMap<TournamentId, Tournament>,
    rosters: HashMap<TournamentId, Vec<PlayerId>>,
    /// Each bracket kept in round-then-position order
    brackets: HashMap<TournamentId, Vec<Match>>,
    match_index: HashMap<MatchId, TournamentId>,
}

impl State {
    fn require_draft(&self, tournament_id: TournamentId, action: &str) -> BracketResult<()> {
        let tournament = self
            .tournaments
            .get(&tournament_id)
            .ok_or_else(|| BracketError::tournament_not_found(tournament_id))?;
        if tournament.status != TournamentStatus::Draft {
            return Err(BracketError::not_draft(tournament_id, tournament.status, action));
        }
        Ok(())
    }

    fn tournament(&self, tournament_id: TournamentId) -> Option<Tournament> {
        self.tournaments.get(&tournament_id).map(|t| Tournament {
            player_ids: self.rosters.get(&tournament_id).cloned().unwrap_or_default(),
            ..t.clone()
        })
    }
}

/// Shared in-memory store; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlayerRepository for InMemoryStore {
    async fn create_player(&self, player: &Player) -> BracketResult<()> {
        let mut state = self.state.write().await;
        if state.players.contains_key(&player.id) {
            return Err(BracketError::InvalidOperation(format!(
                "player {} already exists",
                player.id
            )));
        }
        state.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn find_player(&self, player_id: PlayerId) -> BracketResult<Option<Player>> {
        Ok(self.state.read().await.players.get(&player_id).cloned())
    }

    async fn list_players(&self) -> BracketResult<Vec<Player>> {
        let state = self.state.read().await;
        let mut players: Vec<Player> = state.players.values().cloned().collect();
        players.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(players)
    }
}

#[async_trait]
impl TournamentRepository for InMemoryStore {
    async fn create_tournament(&self, tournament: &Tournament) -> BracketResult<()> {
        let mut state = self.state.write().await;
        if state.tournaments.contains_key(&tournament.id) {
            return Err(BracketError::InvalidOperation(format!(
                "tournament {} already exists",
                tournament.id
            )));
        }
        state.tournaments.insert(
            tournament.id,
            Tournament {
                player_ids: Vec::new(),
                ..tournament.clone()
            },
        );
        state.rosters.insert(tournament.id, Vec::new());
        Ok(())
    }

    async fn find_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Option<Tournament>> {
        Ok(self.state.read().await.tournament(tournament_id))
    }

    async fn list_tournaments(&self) -> BracketResult<Vec<Tournament>> {
        let state = self.state.read().await;
        let mut tournaments: Vec<Tournament> = state
            .tournaments
            .keys()
            .filter_map(|id| state.tournament(*id))
            .collect();
        tournaments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tournaments)
    }

    async fn add_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<bool> {
        let mut state = self.state.write().await;
        state.require_draft(tournament_id, "add players to")?;

        let roster = state.rosters.entry(tournament_id).or_default();
        if roster.contains(&player_id) {
            return Ok(false);
        }
        roster.push(player_id);
        Ok(true)
    }

    async fn remove_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<bool> {
        let mut state = self.state.write().await;
        state.require_draft(tournament_id, "remove players from")?;

        let Some(roster) = state.rosters.get_mut(&tournament_id) else {
            return Ok(false);
        };
        let before = roster.len();
        roster.retain(|id| *id != player_id);
        Ok(roster.len() != before)
    }

    async fn player_ids(&self, tournament_id: TournamentId) -> BracketResult<Vec<PlayerId>> {
        Ok(self
            .state
            .read()
            .await
            .rosters
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> BracketResult<()> {
        let mut state = self.state.write().await;
        let tournament = state
            .tournaments
            .get_mut(&tournament_id)
            .ok_or_else(|| BracketError::tournament_not_found(tournament_id))?;
        tournament.status = status;
        Ok(())
    }
}

#[async_trait]
impl MatchRepository for InMemoryStore {
    async fn create_many(
        &self,
        tournament_id: TournamentId,
        roster: &[PlayerId],
        matches: &[Match],
    ) -> BracketResult<()> {
        let mut state = self.state.write().await;
        state.require_draft(tournament_id, "generate a bracket for")?;

        let has_bracket = state
            .brackets
            .get(&tournament_id)
            .is_some_and(|b| !b.is_empty());
        let enrolled = state.rosters.get(&tournament_id).cloned().unwrap_or_default();
        check_new_bracket(tournament_id, roster, &enrolled, has_bracket, matches)?;

        let mut slots = HashSet::new();
        for m in matches {
            if state.match_index.contains_key(&m.id) || !slots.insert((m.round, m.position)) {
                return Err(BracketError::InvalidOperation(format!(
                    "match ({}, {}) already exists in tournament {}",
                    m.round, m.position, tournament_id
                )));
            }
        }

        let mut stored = matches.to_vec();
        stored.sort_by_key(|m| (m.round, m.position));
        for m in &stored {
            state.match_index.insert(m.id, tournament_id);
        }
        state.brackets.insert(tournament_id, stored);

        if let Some(tournament) = state.tournaments.get_mut(&tournament_id) {
            tournament.status = TournamentStatus::InProgress;
        }

        Ok(())
    }

    async fn matches_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Match>> {
        Ok(self
            .state
            .read()
            .await
            .brackets
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_match(&self, match_id: MatchId) -> BracketResult<Option<Match>> {
        let state = self.state.read().await;
        Ok(state
            .match_index
            .get(&match_id)
            .and_then(|tournament_id| state.brackets.get(tournament_id))
            .and_then(|bracket| bracket.iter().find(|m| m.id == match_id))
            .cloned())
    }

    async fn update_match(&self, m: &Match) -> BracketResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .brackets
            .get_mut(&m.tournament_id)
            .and_then(|bracket| bracket.iter_mut().find(|e| e.id == m.id))
            .ok_or_else(|| BracketError::match_not_found(m.id))?;
        *stored = m.clone();
        Ok(())
    }

    async fn record_score(
        &self,
        match_id: MatchId,
        score1: i32,
        score2: i32,
    ) -> BracketResult<ScoreOutcome> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let tournament_id = *state
            .match_index
            .get(&match_id)
            .ok_or_else(|| BracketError::match_not_found(match_id))?;
        let matches = state
            .brackets
            .get_mut(&tournament_id)
            .ok_or_else(|| BracketError::match_not_found(match_id))?;

        // score_match leaves the slice untouched on error
        let outcome = bracket::score_match(matches, match_id, score1, score2)?;

        if outcome.completes_tournament() {
            if let Some(tournament) = state.tournaments.get_mut(&tournament_id) {
                tournament.status = TournamentStatus::Completed;
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{AdvanceOutcome, MatchStatus};

    async fn seeded(store: &InMemoryStore, n: usize) -> (TournamentId, Vec<PlayerId>) {
        let tournament = Tournament::new("Test Cup").unwrap();
        store.create_tournament(&tournament).await.unwrap();

        let mut ids = Vec::new();
        for i in 0..n {
            let player = Player::new(&format!("Player {i}")).unwrap();
            store.create_player(&player).await.unwrap();
            store.add_player(tournament.id, player.id).await.unwrap();
            ids.push(player.id);
        }
        (tournament.id, ids)
    }

    #[tokio::test]
    async fn test_enrollment_preserves_order_and_is_idempotent() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 3).await;

        assert!(!store.add_player(tournament_id, ids[0]).await.unwrap());
        assert_eq!(store.player_ids(tournament_id).await.unwrap(), ids);

        assert!(store.remove_player(tournament_id, ids[1]).await.unwrap());
        assert!(!store.remove_player(tournament_id, ids[1]).await.unwrap());
        assert_eq!(
            store.player_ids(tournament_id).await.unwrap(),
            vec![ids[0], ids[2]]
        );
    }

    #[tokio::test]
    async fn test_players_listed_by_name() {
        let store = InMemoryStore::new();
        for name in ["Carol", "alice", "Bob"] {
            store.create_player(&Player::new(name).unwrap()).await.unwrap();
        }

        let names: Vec<String> = store
            .list_players()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Bob", "Carol", "alice"]);
    }

    #[tokio::test]
    async fn test_create_many_starts_tournament_once() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 4).await;

        let matches = bracket::generate(tournament_id, &ids).unwrap();
        store.create_many(tournament_id, &ids, &matches).await.unwrap();
        let tournament = store.find_tournament(tournament_id).await.unwrap().unwrap();
        assert_eq!(tournament.status, TournamentStatus::InProgress);

        let again = bracket::generate(tournament_id, &ids).unwrap();
        let err = store.create_many(tournament_id, &ids, &again).await.unwrap_err();
        assert!(matches!(err, BracketError::InvalidOperation(_)));
        assert_eq!(
            store.matches_for_tournament(tournament_id).await.unwrap(),
            matches
        );
    }

    #[tokio::test]
    async fn test_create_many_rejects_stale_roster() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 3).await;
        let matches = bracket::generate(tournament_id, &ids[..2]).unwrap();

        let err = store
            .create_many(tournament_id, &ids[..2], &matches)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("enrollment"));

        let tournament = store.find_tournament(tournament_id).await.unwrap().unwrap();
        assert_eq!(tournament.status, TournamentStatus::Draft);
        assert!(store.matches_for_tournament(tournament_id).await.unwrap().is_empty());
        assert!(store.find_match(matches[0].id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_enrollment_closed_after_draft() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 2).await;
        let late = Player::new("Late").unwrap();
        store.create_player(&late).await.unwrap();

        store
            .update_status(tournament_id, TournamentStatus::InProgress)
            .await
            .unwrap();

        let err = store.add_player(tournament_id, late.id).await.unwrap_err();
        assert!(matches!(err, BracketError::InvalidOperation(_)));
        let err = store.remove_player(tournament_id, ids[0]).await.unwrap_err();
        assert!(matches!(err, BracketError::InvalidOperation(_)));
        assert_eq!(store.player_ids(tournament_id).await.unwrap(), ids);

        let err = store
            .add_player(TournamentId::new_v4(), late.id)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_status_requires_tournament() {
        let store = InMemoryStore::new();
        let err = store
            .update_status(TournamentId::new_v4(), TournamentStatus::Completed)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_match_rewrites_stored_match() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 4).await;
        let matches = bracket::generate(tournament_id, &ids).unwrap();
        store.create_many(tournament_id, &ids, &matches).await.unwrap();

        let mut first = matches[0].clone();
        first.score1 = 7;
        first.score2 = 3;
        first.winner_id = first.player1_id;
        first.status = MatchStatus::Completed;
        store.update_match(&first).await.unwrap();

        assert_eq!(store.find_match(first.id).await.unwrap(), Some(first));
        assert_eq!(
            store.find_match(matches[1].id).await.unwrap().as_ref(),
            Some(&matches[1])
        );

        let mut missing = matches[0].clone();
        missing.id = MatchId::new_v4();
        let err = store.update_match(&missing).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(store.find_match(missing.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_score_on_final_completes_tournament() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 2).await;
        let matches = bracket::generate(tournament_id, &ids).unwrap();
        store.create_many(tournament_id, &ids, &matches).await.unwrap();

        let outcome = store.record_score(matches[0].id, 1, 4).await.unwrap();
        assert!(outcome.completes_tournament());

        let tournament = store.find_tournament(tournament_id).await.unwrap().unwrap();
        assert_eq!(tournament.status, TournamentStatus::Completed);
    }

    #[tokio::test]
    async fn test_record_score_persists_advance() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 4).await;
        let matches = bracket::generate(tournament_id, &ids).unwrap();
        store.create_many(tournament_id, &ids, &matches).await.unwrap();

        let outcome = store.record_score(matches[0].id, 5, 3).await.unwrap();
        let AdvanceOutcome::MutatedNextRound(next_id) = outcome.advance else {
            panic!("expected advance into the final");
        };

        let stored = store.find_match(matches[0].id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Completed);
        assert_eq!(stored.winner_id, Some(ids[0]));

        let next = store.find_match(next_id).await.unwrap().unwrap();
        assert_eq!(next.player1_id, Some(ids[0]));
    }

    #[tokio::test]
    async fn test_record_score_failure_leaves_state() {
        let store = InMemoryStore::new();
        let (tournament_id, ids) = seeded(&store, 4).await;
        let matches = bracket::generate(tournament_id, &ids).unwrap();
        store.create_many(tournament_id, &ids, &matches).await.unwrap();

        assert!(store.record_score(matches[0].id, 2, 2).await.is_err());
        assert_eq!(
            store.matches_for_tournament(tournament_id).await.unwrap(),
            matches
        );

        let err = store.record_score(MatchId::new_v4(), 1, 0).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
