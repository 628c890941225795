use std::path::PathBuf;

use clap::{Parser, Subcommand};
use engine_logging::{LogDestination, DEFAULT_LOG_FILE};
use log::LevelFilter;

/// Reconstruct a virtualized conversation and crop it by original index.
#[derive(Debug, Parser)]
#[command(name = "scrollback", version)]
pub struct Cli {
    /// Also write the log to ./scrollback.log.
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Log debug detail, including every harvest pass.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Harvest a directory of saved HTML windows into a numbered transcript.
    Harvest {
        /// Directory of `*.html` snapshots in scroll order.
        snapshots: PathBuf,
        /// Output transcript (JSON). Defaults to a name derived from the title.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Title recorded in the transcript.
        #[arg(long)]
        title: Option<String>,
        /// RON settings file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Keep only the records whose original index is in RANGES (e.g. "1-3,7").
    Crop {
        transcript: PathBuf,
        ranges: String,
        /// Output path. Defaults to `<input>-cropped.json` (or `.md`).
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Write a markdown document instead of JSON.
        #[arg(long)]
        markdown: bool,
    },
}

impl Cli {
    pub fn log_destination(&self) -> LogDestination {
        if self.log_file {
            LogDestination::Both(PathBuf::from(DEFAULT_LOG_FILE))
        } else {
            LogDestination::Terminal
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }
}
