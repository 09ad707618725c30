//! Repository trait definitions for testability and dependency injection.
//!
//! The traits abstract over player, tournament and match storage so the
//! orchestration layer runs unchanged against PostgreSQL ([`PgStore`]) or
//! the in-memory store used by tests and the demo command.
#![allow(clippy::needless_raw_string_hashes)]

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;

use crate::bracket::{self, BracketError, BracketResult, Match, MatchId, ScoreOutcome};
use crate::players::{Player, PlayerId};
use crate::tournament::{Tournament, TournamentId, TournamentStatus};

/// Trait for player registry operations
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Insert a new player
    async fn create_player(&self, player: &Player) -> BracketResult<()>;

    /// Find player by ID
    async fn find_player(&self, player_id: PlayerId) -> BracketResult<Option<Player>>;

    /// All players ordered by name
    async fn list_players(&self) -> BracketResult<Vec<Player>>;
}

/// Trait for tournament and enrollment operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Insert a new tournament (enrolled players are ignored)
    async fn create_tournament(&self, tournament: &Tournament) -> BracketResult<()>;

    /// Find tournament by ID, with its enrolled players
    async fn find_tournament(&self, tournament_id: TournamentId)
    -> BracketResult<Option<Tournament>>;

    /// All tournaments, newest first
    async fn list_tournaments(&self) -> BracketResult<Vec<Tournament>>;

    /// Enroll a player; returns `false` if already enrolled
    ///
    /// The draft check and the insert are one atomic step: fails with
    /// `InvalidOperation` once the tournament has left `Draft`.
    async fn add_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<bool>;

    /// Withdraw a player; returns `false` if not enrolled
    ///
    /// Same draft rule as [`TournamentRepository::add_player`].
    async fn remove_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<bool>;

    /// Enrolled player IDs in enrollment order
    async fn player_ids(&self, tournament_id: TournamentId) -> BracketResult<Vec<PlayerId>>;

    /// Set the lifecycle status
    async fn update_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> BracketResult<()>;
}

/// Trait for match storage
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Insert every match of a freshly generated bracket and move the
    /// tournament to `InProgress`
    ///
    /// Atomic with the checks it depends on: the tournament must still be a
    /// draft without matches, and its enrollment must still equal `roster`,
    /// the players the bracket was generated from.
    async fn create_many(
        &self,
        tournament_id: TournamentId,
        roster: &[PlayerId],
        matches: &[Match],
    ) -> BracketResult<()>;

    /// All matches of a tournament ordered by round, then position
    async fn matches_for_tournament(&self, tournament_id: TournamentId)
    -> BracketResult<Vec<Match>>;

    /// Find match by ID
    async fn find_match(&self, match_id: MatchId) -> BracketResult<Option<Match>>;

    /// Rewrite every mutable column of a match
    async fn update_match(&self, m: &Match) -> BracketResult<()>;

    /// Score a match, advance its winner and cascade byes as one atomic unit
    ///
    /// Implementations serialize concurrent calls for the same tournament so
    /// that sibling matches completed at the same time both land in their
    /// shared next-round match. Completing the final marks the tournament
    /// `Completed` in the same step.
    async fn record_score(
        &self,
        match_id: MatchId,
        score1: i32,
        score2: i32,
    ) -> BracketResult<ScoreOutcome>;
}

/// PostgreSQL implementation of every repository trait
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn matches_for_update(
        tx: &mut Transaction<'_, Postgres>,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Match>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tournament_id, round, position, player1_id, player2_id,
                   score1, score2, winner_id, status, created_at
            FROM matches
            WHERE tournament_id = $1
            ORDER BY round, position
            FOR UPDATE
            "#,
        )
        .bind(tournament_id)
        .fetch_all(&mut **tx)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    /// Lock the tournament row and require it to be a draft
    async fn lock_draft(
        tx: &mut Transaction<'_, Postgres>,
        tournament_id: TournamentId,
        action: &str,
    ) -> BracketResult<()> {
        let row = sqlx::query("SELECT status FROM tournaments WHERE id = $1 FOR UPDATE")
            .bind(tournament_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| BracketError::tournament_not_found(tournament_id))?;

        let status: TournamentStatus = row.get::<String, _>("status").parse()?;
        if status != TournamentStatus::Draft {
            return Err(BracketError::not_draft(tournament_id, status, action));
        }

        Ok(())
    }
}

#[async_trait]
impl PlayerRepository for PgStore {
    async fn create_player(&self, player: &Player) -> BracketResult<()> {
        sqlx::query("INSERT INTO players (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(player.id)
            .bind(&player.name)
            .bind(player.created_at.naive_utc())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_player(&self, player_id: PlayerId) -> BracketResult<Option<Player>> {
        let row = sqlx::query("SELECT id, name, created_at FROM players WHERE id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| player_from_row(&r)))
    }

    async fn list_players(&self) -> BracketResult<Vec<Player>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM players ORDER BY name, created_at")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(player_from_row).collect())
    }
}

#[async_trait]
impl TournamentRepository for PgStore {
    async fn create_tournament(&self, tournament: &Tournament) -> BracketResult<()> {
        sqlx::query(
            "INSERT INTO tournaments (id, name, status, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(tournament.id)
        .bind(&tournament.name)
        .bind(tournament.status.to_string())
        .bind(tournament.created_at.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Option<Tournament>> {
        let row = sqlx::query("SELECT id, name, status, created_at FROM tournaments WHERE id = $1")
            .bind(tournament_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let player_ids = self.player_ids(tournament_id).await?;
        tournament_from_row(&row, player_ids).map(Some)
    }

    async fn list_tournaments(&self) -> BracketResult<Vec<Tournament>> {
        let rows = sqlx::query(
            "SELECT id, name, status, created_at FROM tournaments ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let enrollments = sqlx::query(
            "SELECT tournament_id, player_id FROM tournament_players ORDER BY enrolled_at, seq",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut rosters: HashMap<TournamentId, Vec<PlayerId>> = HashMap::new();
        for r in &enrollments {
            rosters
                .entry(r.get("tournament_id"))
                .or_default()
                .push(r.get("player_id"));
        }

        rows.iter()
            .map(|r| {
                let id: TournamentId = r.get("id");
                tournament_from_row(r, rosters.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn add_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<bool> {
        let mut tx = self.pool.begin().await?;
        Self::lock_draft(&mut tx, tournament_id, "add players to").await?;

        let result = sqlx::query(
            r#"
            INSERT INTO tournament_players (tournament_id, player_id)
            VALUES ($1, $2)
            ON CONFLICT (tournament_id, player_id) DO NOTHING
            "#,
        )
        .bind(tournament_id)
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_player(
        &self,
        tournament_id: TournamentId,
        player_id: PlayerId,
    ) -> BracketResult<bool> {
        let mut tx = self.pool.begin().await?;
        Self::lock_draft(&mut tx, tournament_id, "remove players from").await?;

        let result = sqlx::query(
            "DELETE FROM tournament_players WHERE tournament_id = $1 AND player_id = $2",
        )
        .bind(tournament_id)
        .bind(player_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn player_ids(&self, tournament_id: TournamentId) -> BracketResult<Vec<PlayerId>> {
        fetch_roster(&self.pool, tournament_id).await
    }

    async fn update_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> BracketResult<()> {
        write_status(&self.pool, tournament_id, status).await
    }
}

#[async_trait]
impl MatchRepository for PgStore {
    async fn create_many(
        &self,
        tournament_id: TournamentId,
        roster: &[PlayerId],
        matches: &[Match],
    ) -> BracketResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::lock_draft(&mut tx, tournament_id, "generate a bracket for").await?;

        let existing = sqlx::query("SELECT 1 FROM matches WHERE tournament_id = $1 LIMIT 1")
            .bind(tournament_id)
            .fetch_optional(&mut *tx)
            .await?;
        let enrolled = fetch_roster(&mut *tx, tournament_id).await?;
        check_new_bracket(tournament_id, roster, &enrolled, existing.is_some(), matches)?;

        for m in matches {
            sqlx::query(
                r#"
                INSERT INTO matches (id, tournament_id, round, position, player1_id, player2_id,
                                     score1, score2, winner_id, status, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(m.id)
            .bind(m.tournament_id)
            .bind(m.round as i32)
            .bind(m.position as i32)
            .bind(m.player1_id)
            .bind(m.player2_id)
            .bind(m.score1)
            .bind(m.score2)
            .bind(m.winner_id)
            .bind(m.status.to_string())
            .bind(m.created_at.naive_utc())
            .execute(&mut *tx)
            .await?;
        }

        write_status(&mut *tx, tournament_id, TournamentStatus::InProgress).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn matches_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Match>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tournament_id, round, position, player1_id, player2_id,
                   score1, score2, winner_id, status, created_at
            FROM matches
            WHERE tournament_id = $1
            ORDER BY round, position
            "#,
        )
        .bind(tournament_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(match_from_row).collect()
    }

    async fn find_match(&self, match_id: MatchId) -> BracketResult<Option<Match>> {
        let row = sqlx::query(
            r#"
            SELECT id, tournament_id, round, position, player1_id, player2_id,
                   score1, score2, winner_id, status, created_at
            FROM matches
            WHERE id = $1
            "#,
        )
        .bind(match_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(match_from_row).transpose()
    }

    async fn update_match(&self, m: &Match) -> BracketResult<()> {
        write_match(&self.pool, m).await
    }

    async fn record_score(
        &self,
        match_id: MatchId,
        score1: i32,
        score2: i32,
    ) -> BracketResult<ScoreOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT tournament_id FROM matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BracketError::match_not_found(match_id))?;
        let tournament_id: TournamentId = row.get("tournament_id");

        // Lock the whole bracket so sibling results serialize on the shared
        // next-round row
        let mut matches = Self::matches_for_update(&mut tx, tournament_id).await?;

        let outcome = bracket::score_match(&mut matches, match_id, score1, score2)?;

        for id in &outcome.changed {
            if let Some(m) = matches.iter().find(|m| m.id == *id) {
                write_match(&mut *tx, m).await?;
            }
        }

        if outcome.completes_tournament() {
            write_status(&mut *tx, tournament_id, TournamentStatus::Completed).await?;
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

/// Full rewrite of a match row's mutable columns
async fn write_match<'e, E>(executor: E, m: &Match) -> BracketResult<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE matches
        SET player1_id = $1, player2_id = $2, score1 = $3, score2 = $4,
            winner_id = $5, status = $6
        WHERE id = $7
        "#,
    )
    .bind(m.player1_id)
    .bind(m.player2_id)
    .bind(m.score1)
    .bind(m.score2)
    .bind(m.winner_id)
    .bind(m.status.to_string())
    .bind(m.id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(BracketError::match_not_found(m.id));
    }

    Ok(())
}

/// Checks shared by both stores before a generated bracket is stored
pub(crate) fn check_new_bracket(
    tournament_id: TournamentId,
    roster: &[PlayerId],
    enrolled: &[PlayerId],
    has_bracket: bool,
    matches: &[Match],
) -> BracketResult<()> {
    if has_bracket {
        return Err(BracketError::InvalidOperation(format!(
            "tournament {tournament_id} already has a bracket"
        )));
    }

    if enrolled != roster {
        return Err(BracketError::InvalidOperation(format!(
            "enrollment of tournament {tournament_id} changed while its bracket was generated"
        )));
    }

    if let Some(m) = matches.iter().find(|m| m.tournament_id != tournament_id) {
        return Err(BracketError::InvalidArgument(format!(
            "match {} belongs to tournament {}, not {}",
            m.id, m.tournament_id, tournament_id
        )));
    }

    Ok(())
}

async fn fetch_roster<'e, E>(executor: E, tournament_id: TournamentId) -> BracketResult<Vec<PlayerId>>
where
    E: PgExecutor<'e>,
{
    let rows = sqlx::query(
        r#"
        SELECT player_id FROM tournament_players
        WHERE tournament_id = $1
        ORDER BY enrolled_at, seq
        "#,
    )
    .bind(tournament_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.iter().map(|r| r.get("player_id")).collect())
}

async fn write_status<'e, E>(
    executor: E,
    tournament_id: TournamentId,
    status: TournamentStatus,
) -> BracketResult<()>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
        .bind(status.to_string())
        .bind(tournament_id)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(BracketError::tournament_not_found(tournament_id));
    }

    Ok(())
}

fn player_from_row(r: &PgRow) -> Player {
    Player {
        id: r.get("id"),
        name: r.get("name"),
        created_at: r.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

fn tournament_from_row(r: &PgRow, player_ids: Vec<PlayerId>) -> BracketResult<Tournament> {
    Ok(Tournament {
        id: r.get("id"),
        name: r.get("name"),
        status: r.get::<String, _>("status").parse()?,
        created_at: r.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        player_ids,
    })
}

fn match_from_row(r: &PgRow) -> BracketResult<Match> {
    Ok(Match {
        id: r.get("id"),
        tournament_id: r.get("tournament_id"),
        round: r.get::<i32, _>("round") as u32,
        position: r.get::<i32, _>("position") as u32,
        player1_id: r.get("player1_id"),
        player2_id: r.get("player2_id"),
        score1: r.get("score1"),
        score2: r.get("score2"),
        winner_id: r.get("winner_id"),
        status: r.get::<String, _>("status").parse()?,
        created_at: r.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    })
}
