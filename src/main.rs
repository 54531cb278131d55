use std::sync::Arc;

use tictactoe_agent::bus::{ConsoleReporter, EventBus};
use tictactoe_agent::config::{print_help, CliCommand, CliOverrides, PlayerConfig};
use tictactoe_agent::run_game;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("tictactoe-agent failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(format!("failed to load .env: {e}"));
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tictactoe_agent=debug,info".parse().expect("valid env filter")),
        )
        .init();

    let overrides = match CliOverrides::parse(std::env::args().skip(1)).map_err(|e| e.to_string())? {
        CliCommand::Help => {
            print_help();
            return Ok(());
        }
        CliCommand::Run(overrides) => overrides,
    };
    let config = PlayerConfig::from_env(&overrides).map_err(|e| e.to_string())?;

    let bus = Arc::new(EventBus::new());
    let reporter = ConsoleReporter::start(bus.subscribe());

    let result = run_game(config, bus.clone()).await;
    drop(bus);
    if let Err(e) = reporter.await {
        tracing::warn!("console reporter stopped abnormally: {e}");
    }

    let outcome = result.map_err(|e| e.to_string())?;
    tracing::info!(
        ended = outcome.state.ended,
        result = ?outcome.state.result,
        winner = ?outcome.state.winner,
        agent_invocations = outcome.agent_invocations,
        tool_rounds = outcome.tool_rounds,
        history_len = outcome.history_len,
        "game finished"
    );
    Ok(())
}
