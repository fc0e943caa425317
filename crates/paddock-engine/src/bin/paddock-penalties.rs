//! Operator batch job: report round penalties over a recorded ledger.
//!
//! ```text
//! paddock-penalties [ledger-path]
//! ```
//!
//! Without an argument the ledger is read from `$PADDOCK_DATA_DIR`
//! (default `data`). Round boundaries come from the config file next to it,
//! or the built-in season table if there is none.

use std::path::PathBuf;
use std::process::ExitCode;

use paddock_matchcore::ledger_digest_hex;
use paddock_settlement::{JsonFileStore, evaluate_round_penalties};
use paddock_types::{MarketConfig, Result, RoundSchedule, constants};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "penalty evaluation failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let data_dir = std::env::var_os("PADDOCK_DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from);
    let ledger_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| data_dir.join(constants::LEDGER_FILE_NAME), PathBuf::from);
    let config_path = ledger_path
        .parent()
        .map_or_else(|| data_dir.join(constants::CONFIG_FILE_NAME), |p| p.join(constants::CONFIG_FILE_NAME));

    let schedule = load_schedule(&config_path)?;
    let transactions = JsonFileStore::read_ledger(&ledger_path)?;
    tracing::info!(
        ledger = %ledger_path.display(),
        transactions = transactions.len(),
        rounds = schedule.len(),
        "evaluating round penalties"
    );

    let penalties = evaluate_round_penalties(&transactions, &schedule);
    if penalties.is_empty() {
        println!("No penalties.");
    }
    for penalty in &penalties {
        println!("{penalty}");
    }
    println!("ledger digest: {}", ledger_digest_hex(&transactions));
    Ok(())
}

/// Round table from the config file, if it exists and sets one.
fn load_schedule(config_path: &std::path::Path) -> Result<RoundSchedule> {
    if !config_path.exists() {
        return RoundSchedule::season();
    }
    let raw = std::fs::read(config_path)?;
    let config: MarketConfig = serde_json::from_slice(&raw)?;
    config.schedule()
}
