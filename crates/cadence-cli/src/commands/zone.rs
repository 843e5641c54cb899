use anyhow::{Context, Result};
use cadence_core::timezone::resolve_zone;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::cli::ZoneCommand;

pub fn show_zone(command: ZoneCommand) -> Result<()> {
    let zone = resolve_zone(&command.id)?;
    let at = match &command.at {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .with_context(|| format!("Invalid instant '{s}', expected RFC 3339 (e.g. 2024-07-01T12:00:00Z)"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    println!("{} {}", "Zone:".bold(), zone.name().green());
    println!("{} {}", "Offset:".bold(), zone.offset_at(&at));
    println!("{} {}", "Abbreviation:".bold(), zone.abbreviation_at(&at));
    println!("{} {}", "Local time:".bold(), zone.local(&at).format("%Y-%m-%d %H:%M:%S"));

    Ok(())
}
