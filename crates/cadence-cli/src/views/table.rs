use cadence_core::datetime::ZonedInstant;
use cadence_core::recurring::ComponentKind;
use cadence_core::vtimezone::{ObservanceKind, UtcOffset};
use comfy_table::{Attribute, Cell, Color, Row, Table};

#[derive(Debug, Clone)]
pub struct ViewOccurrence {
    pub uid: String,
    pub kind: ComponentKind,
    pub start: ZonedInstant,
    pub end: Option<ZonedInstant>,
}

#[derive(Debug, Clone)]
pub struct ViewTransition {
    pub onset: ZonedInstant,
    pub until: Option<ZonedInstant>,
    pub kind: ObservanceKind,
    pub offset_from: UtcOffset,
    pub offset_to: UtcOffset,
    pub name: Option<String>,
}

fn format_instant(instant: &ZonedInstant) -> String {
    if instant.has_time() {
        instant.local().format("%Y-%m-%d %H:%M").to_string()
    } else {
        instant.date_naive().format("%Y-%m-%d").to_string()
    }
}

pub fn display_occurrences(occurrences: &[ViewOccurrence]) {
    if occurrences.is_empty() {
        println!("No occurrences found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Start", "End", "Component", "Kind"]);

    for occurrence in occurrences {
        let mut row = Row::new();

        let mut start_cell = Cell::new(format_instant(&occurrence.start));
        if !occurrence.start.has_time() {
            start_cell = start_cell.add_attribute(Attribute::Italic);
        }
        row.add_cell(start_cell);

        row.add_cell(match &occurrence.end {
            Some(end) => Cell::new(format_instant(end)),
            None => Cell::new("-").fg(Color::DarkGrey),
        });
        row.add_cell(Cell::new(&occurrence.uid).add_attribute(Attribute::Bold));
        row.add_cell(Cell::new(occurrence.kind.as_str()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_transitions(transitions: &[ViewTransition]) {
    if transitions.is_empty() {
        println!("No transitions found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Onset (UTC)", "In effect until (UTC)", "Observance", "From", "To", "Name"]);

    for transition in transitions {
        let mut row = Row::new();
        row.add_cell(Cell::new(format_instant(&transition.onset)));
        row.add_cell(match &transition.until {
            Some(until) => Cell::new(format_instant(until)),
            None => Cell::new("-").fg(Color::DarkGrey),
        });

        let kind_cell = Cell::new(transition.kind.as_str());
        row.add_cell(match transition.kind {
            ObservanceKind::Daylight => kind_cell.fg(Color::Yellow),
            ObservanceKind::Standard => kind_cell.fg(Color::Blue),
        });
        row.add_cell(Cell::new(transition.offset_from.to_string()));
        row.add_cell(Cell::new(transition.offset_to.to_string()).add_attribute(Attribute::Bold));
        row.add_cell(Cell::new(transition.name.as_deref().unwrap_or("None")));
        table.add_row(row);
    }

    println!("{table}");
}
