//! Subcommand parsing and execution.

use anyhow::{Context, Error, bail};
use pico_args::Arguments;
use std::collections::HashMap;
use std::time::Instant;
use tournament_bracket::bracket::{Bracket, MatchStatus};
use tournament_bracket::db::Database;
use tournament_bracket::{PlayerId, TournamentId, TournamentManager};
use uuid::Uuid;

use crate::logging::log_bracket_operation;
use crate::render;

/// A parsed subcommand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Migrate,
    PlayerAdd { name: String },
    PlayerList,
    TournamentCreate { name: String },
    TournamentList,
    TournamentShow { tournament_id: TournamentId },
    Enroll { tournament_id: TournamentId, player_id: PlayerId },
    Withdraw { tournament_id: TournamentId, player_id: PlayerId },
    Generate { tournament_id: TournamentId },
    Score { match_id: Uuid, score1: i32, score2: i32 },
    Bracket { tournament_id: TournamentId },
    Demo { players: usize },
}

impl Command {
    /// Parse the subcommand and its positional arguments
    pub fn parse(pargs: &mut Arguments) -> Result<Self, Error> {
        let Some(name) = pargs.subcommand()? else {
            bail!("missing subcommand, see --help");
        };

        let command = match name.as_str() {
            "migrate" => Command::Migrate,
            "player" => match nested(pargs, "player")?.as_str() {
                "add" => Command::PlayerAdd {
                    name: pargs.free_from_str().context("player add <NAME>")?,
                },
                "list" => Command::PlayerList,
                other => bail!("unknown player command '{other}'"),
            },
            "tournament" => match nested(pargs, "tournament")?.as_str() {
                "create" => Command::TournamentCreate {
                    name: pargs.free_from_str().context("tournament create <NAME>")?,
                },
                "list" => Command::TournamentList,
                "show" => Command::TournamentShow {
                    tournament_id: pargs.free_from_str().context("tournament show <ID>")?,
                },
                other => bail!("unknown tournament command '{other}'"),
            },
            "enroll" => Command::Enroll {
                tournament_id: pargs.free_from_str().context("enroll <TOURNAMENT> <PLAYER>")?,
                player_id: pargs.free_from_str().context("enroll <TOURNAMENT> <PLAYER>")?,
            },
            "withdraw" => Command::Withdraw {
                tournament_id: pargs
                    .free_from_str()
                    .context("withdraw <TOURNAMENT> <PLAYER>")?,
                player_id: pargs
                    .free_from_str()
                    .context("withdraw <TOURNAMENT> <PLAYER>")?,
            },
            "generate" => Command::Generate {
                tournament_id: pargs.free_from_str().context("generate <TOURNAMENT>")?,
            },
            "score" => Command::Score {
                match_id: pargs.free_from_str().context("score <MATCH> <S1> <S2>")?,
                score1: pargs.free_from_str().context("score <MATCH> <S1> <S2>")?,
                score2: pargs.free_from_str().context("score <MATCH> <S1> <S2>")?,
            },
            "bracket" => Command::Bracket {
                tournament_id: pargs.free_from_str().context("bracket <TOURNAMENT>")?,
            },
            "demo" => Command::Demo {
                players: pargs.opt_free_from_str()?.unwrap_or(8),
            },
            other => bail!("unknown command '{other}'"),
        };

        Ok(command)
    }

    /// Whether the command needs a store at all
    pub fn uses_store(&self) -> bool {
        !matches!(self, Command::Migrate | Command::Demo { .. })
    }
}

fn nested(pargs: &mut Arguments, parent: &str) -> Result<String, Error> {
    pargs
        .subcommand()?
        .with_context(|| format!("missing {parent} command"))
}

/// Apply schema migrations
pub async fn migrate(db: &Database) -> Result<(), Error> {
    db.migrate().await?;
    println!("Migrations applied");
    Ok(())
}

/// Execute a store-backed command
pub async fn run(manager: &TournamentManager, command: Command, json: bool) -> Result<(), Error> {
    let started = Instant::now();

    match command {
        Command::PlayerAdd { name } => {
            let player = manager.create_player(&name).await?;
            render::print(json, &player, || render::player_line(&player))?;
        }
        Command::PlayerList => {
            let players = manager.list_players().await?;
            render::print(json, &players, || {
                players.iter().map(render::player_line).collect::<Vec<_>>().join("\n")
            })?;
        }
        Command::TournamentCreate { name } => {
            let tournament = manager.create_tournament(&name).await?;
            render::print(json, &tournament, || render::tournament_line(&tournament))?;
        }
        Command::TournamentList => {
            let tournaments = manager.list_tournaments().await?;
            render::print(json, &tournaments, || {
                tournaments
                    .iter()
                    .map(render::tournament_line)
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::TournamentShow { tournament_id } => {
            let tournament = manager.get_tournament(tournament_id).await?;
            let names = player_names(manager).await?;
            render::print(json, &tournament, || {
                render::tournament_detail(&tournament, &names)
            })?;
        }
        Command::Enroll {
            tournament_id,
            player_id,
        } => {
            manager.add_player(tournament_id, player_id).await?;
            println!("Enrolled {player_id} in {tournament_id}");
        }
        Command::Withdraw {
            tournament_id,
            player_id,
        } => {
            manager.remove_player(tournament_id, player_id).await?;
            println!("Withdrew {player_id} from {tournament_id}");
        }
        Command::Generate { tournament_id } => {
            let bracket = manager.generate_bracket(tournament_id).await?;
            let names = player_names(manager).await?;
            render::print(json, &bracket, || render::bracket(&bracket, &names))?;
            log_bracket_operation(
                "generate",
                Some(&tournament_id.to_string()),
                started.elapsed().as_millis() as u64,
            );
        }
        Command::Score {
            match_id,
            score1,
            score2,
        } => {
            let report = manager.submit_score(match_id, score1, score2).await?;
            let names = player_names(manager).await?;
            render::print(json, &report, || render::score_report(&report, &names))?;
            log_bracket_operation(
                "score",
                Some(&report.scored.tournament_id.to_string()),
                started.elapsed().as_millis() as u64,
            );
        }
        Command::Bracket { tournament_id } => {
            let bracket = manager.get_bracket(tournament_id).await?;
            let names = player_names(manager).await?;
            render::print(json, &bracket, || render::bracket(&bracket, &names))?;
        }
        Command::Migrate | Command::Demo { .. } => {
            bail!("command does not run against a store")
        }
    }

    Ok(())
}

/// Play a whole bracket in memory and print it
///
/// Scores are deterministic: player 1 wins matches at even positions,
/// player 2 at odd ones.
pub async fn demo(players: usize, json: bool) -> Result<(), Error> {
    let started = Instant::now();
    let manager = TournamentManager::in_memory();

    let tournament = manager.create_tournament("Demo Cup").await?;
    for i in 1..=players {
        let player = manager.create_player(&format!("Player {i:03}")).await?;
        manager.add_player(tournament.id, player.id).await?;
    }

    let mut bracket = manager.generate_bracket(tournament.id).await?;
    for round in 1..=bracket.round_count() {
        let ready: Vec<(Uuid, u32)> = bracket
            .round(round)
            .iter()
            .filter(|m| m.is_ready() && m.status == MatchStatus::Pending)
            .map(|m| (m.id, m.position))
            .collect();

        for (match_id, position) in ready {
            let (score1, score2) = if position % 2 == 0 { (3, 1) } else { (2, 4) };
            manager.submit_score(match_id, score1, score2).await?;
        }
        bracket = manager.get_bracket(tournament.id).await?;
    }

    let names = player_names(&manager).await?;
    render::print(json, &bracket, || render::bracket(&bracket, &names))?;
    if !json {
        println!("{}", champion_line(&bracket, &names));
    }

    log_bracket_operation(
        "demo",
        Some(&tournament.id.to_string()),
        started.elapsed().as_millis() as u64,
    );
    Ok(())
}

fn champion_line(bracket: &Bracket, names: &HashMap<PlayerId, String>) -> String {
    match bracket.champion() {
        Some(id) => format!("Champion: {}", render::name(names, Some(id))),
        None => "No champion yet".to_string(),
    }
}

async fn player_names(manager: &TournamentManager) -> Result<HashMap<PlayerId, String>, Error> {
    Ok(manager
        .list_players()
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn parse(args: &[&str]) -> Result<Command, Error> {
        let mut pargs = Arguments::from_vec(args.iter().map(OsString::from).collect());
        Command::parse(&mut pargs)
    }

    #[test]
    fn test_parse_nested_commands() {
        assert_eq!(
            parse(&["player", "add", "Ada"]).unwrap(),
            Command::PlayerAdd {
                name: "Ada".to_string()
            }
        );
        assert_eq!(parse(&["tournament", "list"]).unwrap(), Command::TournamentList);
        assert!(parse(&["player", "remove"]).is_err());
        assert!(parse(&["player"]).is_err());
    }

    #[test]
    fn test_parse_score() {
        let id = Uuid::new_v4();
        let command = parse(&["score", &id.to_string(), "21", "19"]).unwrap();
        assert_eq!(
            command,
            Command::Score {
                match_id: id,
                score1: 21,
                score2: 19
            }
        );
        assert!(parse(&["score", "not-a-uuid", "1", "0"]).is_err());
    }

    #[test]
    fn test_parse_demo_default() {
        assert_eq!(parse(&["demo"]).unwrap(), Command::Demo { players: 8 });
        assert_eq!(parse(&["demo", "5"]).unwrap(), Command::Demo { players: 5 });
        assert!(!Command::Demo { players: 5 }.uses_store());
    }

    #[tokio::test]
    async fn test_run_against_memory_store() {
        let manager = TournamentManager::in_memory();
        run(
            &manager,
            Command::TournamentCreate {
                name: "Cup".to_string(),
            },
            false,
        )
        .await
        .unwrap();

        let tournaments = manager.list_tournaments().await.unwrap();
        assert_eq!(tournaments.len(), 1);

        let err = run(
            &manager,
            Command::Generate {
                tournament_id: tournaments[0].id,
            },
            false,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("at least 2 players"));
    }

    #[tokio::test]
    async fn test_demo_runs_to_completion() {
        demo(7, true).await.unwrap();
    }
}
