//! malla CLI — command-line front end for the live-coded grid instrument.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "malla")]
#[command(author, version, about = "Live-coded grid instrument", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the instrument: realtime audio plus a stdin editing session
    Run(commands::run::RunArgs),

    /// List or inspect audio output devices
    Devices(commands::devices::DevicesArgs),

    /// Display a persisted program file's statistics
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    tracing::debug!(command = ?std::mem::discriminant(&cli.command), "dispatching command");

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Info(args) => commands::info::run(args),
    }
}
