use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Evaluate recurring calendar components and time zone observances
#[derive(Parser, Debug)]
#[command(name = "cadence", author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve a time zone identifier
    Zone(ZoneCommand),
    /// List occurrences of the components in a calendar file
    Occurrences(OccurrencesCommand),
    /// Print the observance timeline of a time zone defined in a calendar file
    Transitions(TransitionsCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct ZoneCommand {
    /// IANA, host-native or normalized identifier (e.g. 'Europe/Paris', 'Tokyo Standard Time')
    pub id: String,
    /// Instant to report the offset at, in RFC 3339 form (defaults to now)
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct OccurrencesCommand {
    /// Path to a TOML calendar file
    pub file: PathBuf,
    /// First day of the window (inclusive, YYYY-MM-DD)
    #[arg(long)]
    pub from: String,
    /// Last day of the window (exclusive, YYYY-MM-DD)
    #[arg(long)]
    pub to: String,
    /// Zone the window is interpreted and results are shown in (defaults to the configured zone)
    #[arg(long)]
    pub tz: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct TransitionsCommand {
    /// Path to a TOML calendar file
    pub file: PathBuf,
    /// TZID of the time zone to evaluate
    #[arg(long)]
    pub tzid: String,
    /// First day of the window (inclusive, YYYY-MM-DD, UTC)
    #[arg(long)]
    pub from: String,
    /// Last day of the window (exclusive, YYYY-MM-DD, UTC)
    #[arg(long)]
    pub to: String,
}
