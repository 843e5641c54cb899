use anyhow::{bail, Result};
use cadence_core::datetime::ZonedInstant;
use cadence_core::timezone::resolve_zone;

use crate::calendar::{parse_date, CalendarFile};
use crate::cli::OccurrencesCommand;
use crate::config::Config;
use crate::views::table::{display_occurrences, ViewOccurrence};

pub fn list_occurrences(command: OccurrencesCommand, config: &Config) -> Result<()> {
    let zone = match &command.tz {
        Some(id) => resolve_zone(id)?,
        None => config.default_zone(),
    };
    let from = ZonedInstant::date(zone, parse_date(&command.from)?)?;
    let to = ZonedInstant::date(zone, parse_date(&command.to)?)?;
    if to <= from {
        bail!("--to must be after --from");
    }

    let calendar = CalendarFile::load(&command.file)?;
    let mut components = calendar.components(config.default_zone(), &config.evaluation)?;
    tracing::info!(components = components.len(), %from, %to, "evaluating calendar");

    let mut view_occurrences = Vec::new();
    for component in &mut components {
        let (uid, kind) = (component.uid().to_string(), component.kind());
        for occurrence in component.get_occurrences(&from, &to)? {
            view_occurrences.push(ViewOccurrence {
                uid: uid.clone(),
                kind,
                start: occurrence.start().with_zone(zone),
                end: occurrence.period.end().map(|end| end.with_zone(zone)),
            });
        }
    }
    view_occurrences.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.uid.cmp(&b.uid)));

    display_occurrences(&view_occurrences);

    Ok(())
}
