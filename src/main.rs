//! CLI entry point.

use clap::Parser;

use prefix_cache::cli::{run_analyze, run_demo, Cli, Command};
use prefix_cache::telemetry::{init_logging, LogConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(&LogConfig { format: cli.log_format, level: cli.log_level.clone() })?;

    match cli.command {
        Command::Analyze { prompts, min_prefix } => {
            println!("{}", run_analyze(&prompts, min_prefix));
        }
        Command::Demo { prompts, max_entries, min_prefix } => {
            println!("{}", run_demo(&prompts, max_entries, min_prefix));
        }
    }

    Ok(())
}
