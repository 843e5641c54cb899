use anyhow::{bail, Result};
use cadence_core::datetime::{Source, ZonedInstant};
use cadence_core::timezone::Zone;

use crate::calendar::{parse_date, CalendarFile};
use crate::cli::TransitionsCommand;
use crate::config::Config;
use crate::views::table::{display_transitions, ViewTransition};

pub fn list_transitions(command: TransitionsCommand, config: &Config) -> Result<()> {
    let from = ZonedInstant::date(Zone::Utc, parse_date(&command.from)?)?;
    let to = ZonedInstant::date(Zone::Utc, parse_date(&command.to)?)?;
    if to <= from {
        bail!("--to must be after --from");
    }

    let calendar = CalendarFile::load(&command.file)?;
    let mut tz = calendar.timezone(&command.tzid, &config.evaluation)?;
    let occurrences = tz.get_occurrences(&from, &to)?;

    let mut transitions = Vec::with_capacity(occurrences.len());
    for occurrence in occurrences {
        let Source::Observance { index, .. } = &occurrence.source else {
            continue;
        };
        let Some(observance) = tz.observances().get(*index) else {
            continue;
        };
        transitions.push(ViewTransition {
            onset: occurrence.start().with_zone(Zone::Utc),
            until: occurrence.period.end().map(|end| end.with_zone(Zone::Utc)),
            kind: observance.kind(),
            offset_from: observance.offset_from(),
            offset_to: observance.offset_to(),
            name: observance.names().first().cloned(),
        });
    }

    display_transitions(&transitions);

    Ok(())
}
