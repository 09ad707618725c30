//! Command-line administration for single-elimination tournaments.
//!
//! Drives the tournament manager against PostgreSQL or an in-memory store:
//! player registry, enrollment, bracket generation and score entry.

mod commands;
mod config;
mod logging;
mod render;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use tournament_bracket::{BracketError, TournamentManager};
use tournament_bracket::db::Database;

use commands::Command;
use config::{CliConfig, StoreKind};

const HELP: &str = "\
Manage single-elimination tournaments

USAGE:
  tb_cli [OPTIONS] <COMMAND>

COMMANDS:
  migrate                          Apply database migrations
  player add <NAME>                Register a player
  player list                      List players by name
  tournament create <NAME>         Create a draft tournament
  tournament list                  List tournaments, newest first
  tournament show <TOURNAMENT>     Show a tournament and its roster
  enroll <TOURNAMENT> <PLAYER>     Enroll a player in a draft tournament
  withdraw <TOURNAMENT> <PLAYER>   Withdraw a player from a draft tournament
  generate <TOURNAMENT>            Generate the bracket
  score <MATCH> <S1> <S2>          Record a match result
  bracket <TOURNAMENT>             Show the bracket
  demo [N]                         Play an N-player bracket in memory [default: 8]

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --memory                 Use a throwaway in-memory store
  --json                   Print JSON instead of text

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  TB_STORE                 Storage backend: postgres | memory
  DB_MAX_CONNECTIONS       Pool size and timeouts, see DB_* variables
  RUST_LOG                 Log filter [default: info,sqlx=warn]
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let memory = pargs.contains("--memory");
    let json = pargs.contains("--json");

    let command = Command::parse(&mut pargs)?;
    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("unexpected arguments: {:?}", remaining);
    }

    let config = CliConfig::from_env(database_url, memory)?;
    config.validate()?;

    logging::init();

    if let Command::Demo { players } = command {
        return commands::demo(players, json).await;
    }

    dispatch(&config, command, json).await.map_err(sanitize)
}

async fn dispatch(config: &CliConfig, command: Command, json: bool) -> Result<(), Error> {
    match config.store {
        StoreKind::Memory => {
            if command == Command::Migrate {
                anyhow::bail!("migrate needs a PostgreSQL store");
            }
            info!("Using in-memory store");
            commands::run(&TournamentManager::in_memory(), command, json).await
        }
        StoreKind::Postgres => {
            let db = Database::new(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            info!("Database connected successfully");

            let result = if command.uses_store() {
                commands::run(&TournamentManager::with_postgres(db.pool().clone()), command, json)
                    .await
            } else {
                commands::migrate(&db).await
            };

            db.close().await;
            result
        }
    }
}

/// Log the full error and keep database details off stdout
fn sanitize(err: Error) -> Error {
    match err.downcast_ref::<BracketError>() {
        Some(e @ (BracketError::Database(_) | BracketError::Migration(_))) => {
            tracing::error!(error = %e, "Command failed");
            anyhow::anyhow!(e.client_message())
        }
        _ => err,
    }
}
