//! Calendar-defined time zones: observances, their UTC offsets, and the
//! stitched observance timeline.
//!
//! A [`TimeZone`] evaluates every [`Observance`] over the requested window
//! plus a look-ahead, then assigns each observance occurrence an end just
//! before the next one begins, so the timeline is contiguous and never
//! overlaps.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::EvaluationConfig;
use crate::datetime::{Occurrence, Owner, Period, PeriodSet, Reference, Source, ZonedInstant, SMALLEST_UNIT};
use crate::error::CoreError;
use crate::evaluator::{EvaluationBounds, WindowedEvaluator};
use crate::pattern::RecurrencePattern;
use crate::recurring::{Recurrable, Recurrence, RecurrenceRule, RecurringEvaluator};
use crate::timezone::Zone;

/// UTC offset in seconds.
///
/// Positive values are east of UTC, negative values are west.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UtcOffset {
    /// Total seconds from UTC (positive = east, negative = west).
    pub seconds: i32,
}

impl UtcOffset {
    /// Creates a new UTC offset from hours, minutes, and seconds.
    #[must_use]
    pub const fn new(hours: i32, minutes: i32, seconds: i32) -> Self {
        Self {
            seconds: hours * 3600 + minutes * 60 + seconds,
        }
    }

    #[must_use]
    pub const fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    /// Parses `(+/-)HHMM` or `(+/-)HHMMSS`, e.g. "+0500", "-0800", "+053000".
    ///
    /// ## Errors
    /// Returns [`CoreError::InvalidInput`] if the offset string is malformed.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        let invalid = || CoreError::InvalidInput(format!("invalid UTC offset '{s}'"));
        if s.len() != 5 && s.len() != 7 {
            return Err(invalid());
        }

        let (sign, rest) = match s.as_bytes()[0] {
            b'+' => (1, &s[1..]),
            b'-' => (-1, &s[1..]),
            _ => return Err(invalid()),
        };
        let field = |range: std::ops::Range<usize>| -> Result<i32, CoreError> {
            rest.get(range)
                .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|digits| digits.parse().ok())
                .ok_or_else(invalid)
        };

        let hours = field(0..2)?;
        let minutes = field(2..4)?;
        let seconds = if rest.len() == 6 { field(4..6)? } else { 0 };
        if minutes > 59 || seconds > 59 {
            return Err(invalid());
        }
        Ok(Self::new(sign * hours, sign * minutes, sign * seconds))
    }

    /// The offset as a chrono offset.
    pub fn to_fixed(self) -> Result<FixedOffset, CoreError> {
        FixedOffset::east_opt(self.seconds)
            .ok_or_else(|| CoreError::InvalidInput(format!("UTC offset {self} is out of range")))
    }
}

impl FromStr for UtcOffset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds >= 0 { '+' } else { '-' };
        let total = self.seconds.abs();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        if seconds == 0 {
            write!(f, "{sign}{hours:02}{minutes:02}")
        } else {
            write!(f, "{sign}{hours:02}{minutes:02}{seconds:02}")
        }
    }
}

/// Type of time zone observance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservanceKind {
    /// Standard time.
    Standard,
    /// Daylight saving time.
    Daylight,
}

impl ObservanceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ObservanceKind::Standard => "STANDARD",
            ObservanceKind::Daylight => "DAYLIGHT",
        }
    }
}

impl fmt::Display for ObservanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A STANDARD or DAYLIGHT sub-rule of a time zone.
///
/// The onset and any RDATE values are wall-clock times in the offset that
/// was in effect before the observance began (`offset_from`).
#[derive(Debug, Clone)]
pub struct Observance {
    kind: ObservanceKind,
    offset_from: UtcOffset,
    offset_to: UtcOffset,
    names: Vec<String>,
    recurrence: Recurrence,
    evaluator: RecurringEvaluator,
}

impl Observance {
    pub fn new(kind: ObservanceKind, onset: NaiveDateTime, offset_from: UtcOffset, offset_to: UtcOffset) -> Result<Self, CoreError> {
        let zone = Zone::fixed(offset_from.to_fixed()?);
        Ok(Self {
            kind,
            offset_from,
            offset_to,
            names: Vec::new(),
            recurrence: Recurrence::new(ZonedInstant::from_local(zone, onset)?),
            evaluator: RecurringEvaluator::new(),
        })
    }

    /// Adds a TZNAME.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn with_rrule(mut self, pattern: RecurrencePattern) -> Self {
        self.add_rule(RecurrenceRule::RRule(pattern));
        self
    }

    /// Adds onset dates given as wall-clock times in `offset_from`.
    pub fn with_rdates(mut self, onsets: impl IntoIterator<Item = NaiveDateTime>) -> Result<Self, CoreError> {
        let zone = self.recurrence.start().zone();
        let periods = onsets
            .into_iter()
            .map(|onset| ZonedInstant::from_local(zone, onset).map(Period::new))
            .collect::<Result<Vec<_>, _>>()?;
        self.add_rule(RecurrenceRule::RDate(periods));
        Ok(self)
    }

    pub fn add_rule(&mut self, rule: RecurrenceRule) {
        self.recurrence.push(rule);
        self.evaluator.clear();
    }

    #[inline]
    pub fn kind(&self) -> ObservanceKind {
        self.kind
    }

    #[inline]
    pub fn offset_from(&self) -> UtcOffset {
        self.offset_from
    }

    #[inline]
    pub fn offset_to(&self) -> UtcOffset {
        self.offset_to
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Onsets of this observance in `[start, end)`, the first onset included.
    pub fn evaluate(&mut self, start: &ZonedInstant, end: &ZonedInstant, config: &EvaluationConfig) -> Result<&PeriodSet, CoreError> {
        self.evaluator.evaluate(&self.recurrence, start, end, true, config)
    }

    fn clear(&mut self) {
        self.evaluator.clear();
    }
}

impl Recurrable for Observance {
    fn recurrence(&self) -> &Recurrence {
        &self.recurrence
    }
}

/// Evaluates the observances of one time zone into a stitched timeline.
#[derive(Debug, Clone, Default)]
pub struct TimeZoneEvaluator {
    window: WindowedEvaluator,
    occurrences: BTreeMap<(DateTime<Utc>, usize), Occurrence>,
    stitched_at: usize,
}

impl TimeZoneEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bounds(&self) -> &EvaluationBounds {
        self.window.bounds()
    }

    /// Every known observance occurrence, ordered by start.
    pub fn occurrences(&self) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.values()
    }

    /// Evaluates `observances` over `[start, end)`.
    ///
    /// # Behavior
    /// - Attaches the time zone to `reference` if it has no owner
    /// - A window reaching past the cache is extended by the configured
    ///   look-ahead so later narrow queries are already covered
    /// - Missing sub-ranges are filled through the window cache
    /// - Whenever new ranges were computed, every occurrence's end is
    ///   reassigned: one smallest unit before the next distinct start, or
    ///   the evaluated end for the last one
    pub fn evaluate(
        &mut self,
        tzid: &str,
        observances: &mut [Observance],
        reference: &mut Reference,
        start: &ZonedInstant,
        end: &ZonedInstant,
        config: &EvaluationConfig,
    ) -> Result<&PeriodSet, CoreError> {
        reference.attach_if_unowned(Owner::TimeZone(tzid.to_string()));

        let covered_end = self.window.bounds().end().is_some_and(|cached| cached >= end);
        let target_end = if covered_end { *end } else { end.add_years(config.lookahead_years())? };

        let Self { window, occurrences, .. } = self;
        let mut compute = |from: &ZonedInstant, to: &ZonedInstant| -> Result<Vec<Period>, CoreError> {
            let mut found = Vec::new();
            for (index, observance) in observances.iter_mut().enumerate() {
                let kind = observance.kind();
                let periods = observance.evaluate(from, to, config)?;
                for period in periods.range(from, to) {
                    let source = Source::Observance {
                        tzid: tzid.to_string(),
                        index,
                        kind,
                    };
                    occurrences
                        .entry((period.start().instant(), index))
                        .or_insert_with(|| Occurrence::new(source, period.clone()));
                    found.push(period.clone());
                }
            }
            tracing::debug!(tzid, %from, %to, found = found.len(), "evaluated observances");
            Ok(found)
        };
        window.evaluate(start, &target_end, &mut compute)?;

        if self.window.computations() != self.stitched_at {
            self.process_occurrences()?;
            self.stitched_at = self.window.computations();
        }
        Ok(self.window.periods())
    }

    /// Ends every occurrence where the next one starts.
    fn process_occurrences(&mut self) -> Result<(), CoreError> {
        let Some(bound) = self.window.bounds().end().copied() else {
            return Ok(());
        };

        let mut starts: Vec<DateTime<Utc>> = self.occurrences.keys().map(|(start, _)| *start).collect();
        starts.dedup();

        let periods = self.window.periods_mut();
        for ((start, _), occurrence) in self.occurrences.iter_mut() {
            let next = starts.partition_point(|candidate| candidate <= start);
            let end = match starts.get(next) {
                Some(next) => ZonedInstant::new(*next - SMALLEST_UNIT, occurrence.start().zone()),
                None => bound.with_zone(occurrence.start().zone()),
            };
            occurrence.period.set_end(end)?;
            if let Some(period) = periods.get_mut(occurrence.start()) {
                period.set_end(end)?;
            }
        }
        tracing::debug!(occurrences = self.occurrences.len(), until = %bound, "stitched observance timeline");
        Ok(())
    }

    pub fn clear(&mut self) {
        self.window.clear();
        self.occurrences.clear();
        self.stitched_at = 0;
    }
}

/// A time zone defined by its observances (a VTIMEZONE).
#[derive(Debug, Clone)]
pub struct TimeZone {
    tzid: String,
    observances: Vec<Observance>,
    evaluator: TimeZoneEvaluator,
    config: EvaluationConfig,
}

impl TimeZone {
    pub fn new(tzid: impl Into<String>) -> Self {
        Self {
            tzid: tzid.into(),
            observances: Vec::new(),
            evaluator: TimeZoneEvaluator::new(),
            config: EvaluationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self.clear_evaluation();
        self
    }

    pub fn with_observance(mut self, observance: Observance) -> Self {
        self.add_observance(observance);
        self
    }

    pub fn tzid(&self) -> &str {
        &self.tzid
    }

    pub fn observances(&self) -> &[Observance] {
        &self.observances
    }

    pub fn evaluated_bounds(&self) -> &EvaluationBounds {
        self.evaluator.bounds()
    }

    pub fn add_observance(&mut self, observance: Observance) {
        self.observances.push(observance);
        self.clear_evaluation();
    }

    pub fn remove_observance(&mut self, index: usize) -> Option<Observance> {
        if index >= self.observances.len() {
            return None;
        }
        let removed = self.observances.remove(index);
        self.clear_evaluation();
        Some(removed)
    }

    /// Drops every cached result, the observances' included.
    pub fn clear_evaluation(&mut self) {
        self.evaluator.clear();
        self.observances.iter_mut().for_each(Observance::clear);
    }

    /// Evaluates the observance timeline over `[start, end)`.
    pub fn evaluate(&mut self, reference: &mut Reference, start: &ZonedInstant, end: &ZonedInstant) -> Result<&PeriodSet, CoreError> {
        self.evaluator
            .evaluate(&self.tzid, &mut self.observances, reference, start, end, &self.config)
    }

    /// Observance occurrences starting in `[start, end)`, with stitched ends.
    pub fn get_occurrences(&mut self, start: &ZonedInstant, end: &ZonedInstant) -> Result<Vec<Occurrence>, CoreError> {
        let mut reference = Reference::new(*start);
        self.evaluate(&mut reference, start, end)?;
        Ok(self
            .evaluator
            .occurrences()
            .filter(|occurrence| start <= occurrence.start() && occurrence.start() < end)
            .cloned()
            .collect())
    }

    /// The observance occurrence in effect at `instant`, or `None` before
    /// the earliest onset.
    ///
    /// Evaluation starts at the earliest onset so the answer does not depend
    /// on what was queried before.
    pub fn observance_at(&mut self, instant: &ZonedInstant) -> Result<Option<Occurrence>, CoreError> {
        let Some(earliest) = self.observances.iter().map(|observance| *observance.start()).min() else {
            return Ok(None);
        };
        if *instant < earliest {
            return Ok(None);
        }

        let mut reference = Reference::new(*instant);
        self.evaluate(&mut reference, &earliest, &(*instant + SMALLEST_UNIT))?;
        Ok(self
            .evaluator
            .occurrences()
            .take_while(|occurrence| occurrence.start() <= instant)
            .last()
            .cloned())
    }

    /// UTC offset in effect at `instant`.
    pub fn offset_at(&mut self, instant: &ZonedInstant) -> Result<Option<UtcOffset>, CoreError> {
        let Some(occurrence) = self.observance_at(instant)? else {
            return Ok(None);
        };
        let Source::Observance { index, .. } = occurrence.source else {
            return Ok(None);
        };
        Ok(self.observances.get(index).map(Observance::offset_to))
    }
}
