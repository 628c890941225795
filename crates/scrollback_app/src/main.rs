mod cli;
mod commands;
mod config;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    engine_logging::initialize(cli.log_destination(), cli.log_level());
    commands::run(cli)
}
