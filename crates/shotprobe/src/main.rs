//! shotprobe CLI - probe a screenshot host for random captures.
//!
//! Generates random capture identifiers, fetches whatever lives behind them,
//! keeps the genuine images (optionally only those whose OCR text contains
//! one of the given words) and stops once enough have been saved.
//!
//! # Usage
//!
//! ```bash
//! # Save 10 random captures
//! shotprobe run
//!
//! # Save 5 captures mentioning "invoice" or "receipt", 16 at a time
//! shotprobe run -n 5 -f invoice,receipt -w 16
//!
//! # Search an earlier run for text
//! shotprobe scan ~/shotprobe/captures/2024-01-01_12-00-00 password
//!
//! # View configuration
//! shotprobe config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// shotprobe - probe a screenshot host for random captures.
#[derive(Parser, Debug)]
#[command(name = "shotprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe random identifiers until enough captures are saved
    Run(cli::run::RunArgs),

    /// OCR-search a folder of saved captures
    Scan(cli::scan::ScanArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match shotprobe_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `shotprobe config path`."
            );
            shotprobe_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("shotprobe v{}", shotprobe_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Scan(args) => cli::scan::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from(["shotprobe", "run", "-f", "invoice,receipt", "-w", "16"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert!(args.count.is_none());
        assert_eq!(args.workers, Some(16));
        assert_eq!(args.filter.as_deref(), Some("invoice,receipt"));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["shotprobe", "run", "-n", "3", "--verbose", "--json-logs"]);
        assert!(cli.verbose);
        assert!(cli.json_logs);
        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.count, Some(3));
    }
}
