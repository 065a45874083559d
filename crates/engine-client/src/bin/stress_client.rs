//! Thin CLI entry point over `engine-client`.
//!
//! This intentionally does not implement the interactive REPL or the
//! full CLI dispatch table (§1, §6.4 external scope) -- it parses the
//! handful of arguments needed to pick a transport, a protocol, a
//! scenario id, and a target, then calls straight into the library.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use engine_client::config::{EngineClientConfig, ProtocolKind, TransportKind};
use engine_client::scenario::{run_batched, run_scenario};
use engine_client::EngineClient;

/// Drive a matching-engine server through a stress scenario.
#[derive(Debug, Parser)]
#[command(name = "stress_client")]
struct Cli {
    host: String,
    port: u16,
    /// Scenario id; see §6.4 for the stable id table.
    scenario: u32,

    #[arg(long, conflicts_with = "udp")]
    tcp: bool,
    #[arg(long, conflicts_with = "tcp")]
    udp: bool,

    #[arg(long, conflicts_with = "csv")]
    binary: bool,
    #[arg(long, conflicts_with = "binary")]
    csv: bool,

    /// Use the batch-size-gated pacing strategy instead of the default
    /// deficit-adaptive one for a matching-stress scenario id (20-25);
    /// ignored for every other scenario id (§4.7, §9: alternatives, not
    /// layers).
    #[arg(long)]
    batched: bool,

    /// Suppress info-level progress logging.
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "stress_client failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let transport = if cli.tcp {
        TransportKind::Tcp
    } else if cli.udp {
        TransportKind::Udp
    } else {
        TransportKind::Auto
    };

    let protocol = if cli.binary {
        ProtocolKind::Binary
    } else if cli.csv {
        ProtocolKind::Csv
    } else {
        ProtocolKind::Auto
    };

    // Env supplies defaults first; the explicit host/port positional
    // args always win, per the config module's documented layering.
    let mut config = EngineClientConfig::new(cli.host.clone(), cli.port)
        .with_transport(transport)
        .with_protocol(protocol)
        .apply_env_overrides();
    config.host = cli.host.clone();
    config.port = cli.port;

    let mut client = EngineClient::connect(&config)?;
    tracing::info!(protocol = ?client.protocol(), "connected");

    let outcome = if cli.batched && (20..=25).contains(&cli.scenario) {
        run_batched(&mut client, cli.scenario)?
    } else {
        run_scenario(cli.scenario, &mut client, &cli.host, cli.port)?
    };

    let passed = outcome.validation.map(|v| v.passed).unwrap_or(true);
    tracing::info!(
        scenario = outcome.name,
        units_sent = outcome.units_sent,
        acks = outcome.stats.acks,
        trades = outcome.stats.trades,
        top_of_book = outcome.stats.top_of_book,
        parse_errors = outcome.stats.parse_errors,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        validation_passed = passed,
        "scenario summary"
    );

    Ok(passed)
}
