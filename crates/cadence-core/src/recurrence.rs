//! Recurrence stepping: expands one RRULE or EXRULE into the instants it
//! produces inside a window.
//!
//! Without BYxxx parts the rule emits its raw stepped instants. With them,
//! each frequency period is expanded and limited by the filter stage of
//! RFC 5545 section 3.3.10, evaluated on the anchor's wall clock.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday};

use crate::config::EvaluationConfig;
use crate::datetime::ZonedInstant;
use crate::error::CoreError;
use crate::evaluator::step_instant;
use crate::pattern::{Frequency, NWeekday, RecurrencePattern};
use crate::timezone::Zone;

/// Expands `pattern`, anchored at `anchor`, into the instants it produces in
/// `[start, end)`.
///
/// # Arguments
/// * `anchor` - The rule's DTSTART; nothing before it is produced
/// * `pattern` - Frequency, interval, filter parts and termination
/// * `start` - Inclusive window start
/// * `end` - Exclusive window end
/// * `config` - Evaluation limits
///
/// # Returns
/// * `Result<Vec<ZonedInstant>, CoreError>` - Instants in ascending order
///
/// # Behavior
/// - Steps from the anchor one frequency period at a time
/// - Instants before `start` are skipped but still count toward COUNT
/// - Generation stops at the first instant past UNTIL, after COUNT instants,
///   or once an instant reaches `end`
/// - Date-only anchors step whole calendar days and yield local midnights
/// - Without COUNT the stepping fast-forwards close to `start`
pub fn expand(
    anchor: &ZonedInstant,
    pattern: &RecurrencePattern,
    start: &ZonedInstant,
    end: &ZonedInstant,
    config: &EvaluationConfig,
) -> Result<Vec<ZonedInstant>, CoreError> {
    if pattern.interval <= 0 {
        return Err(CoreError::NonPositiveInterval(pattern.interval));
    }
    if pattern.frequency == Frequency::Undefined {
        return Err(CoreError::UndefinedFrequency);
    }

    let mut found = Vec::new();
    if start >= end {
        return Ok(found);
    }

    let stage = pattern.has_filter().then(|| FilterStage::new(anchor, pattern, config));
    let whole_days = !anchor.has_time() && pattern.frequency.is_day_or_coarser();
    let origin = if stage.is_some() || whole_days {
        floating(anchor)
    } else {
        *anchor
    };
    let mut cursor = Cursor::new(origin, pattern);
    if pattern.count.is_none() {
        cursor.fast_forward(start)?;
    }

    let mut emitted: u32 = 0;
    loop {
        let candidates = match &stage {
            Some(stage) => {
                if stage.floor(cursor.current())? >= *end {
                    break;
                }
                stage.expand(cursor.current())?
            }
            None => {
                let candidate = if whole_days {
                    ZonedInstant::date(anchor.zone(), cursor.current().date_naive())?
                } else {
                    *cursor.current()
                };
                if candidate >= *end {
                    break;
                }
                vec![candidate]
            }
        };

        for candidate in candidates {
            if candidate < *anchor {
                continue;
            }
            if pattern.until.as_ref().is_some_and(|until| candidate > *until) {
                tracing::trace!(%candidate, "passed UNTIL");
                return Ok(found);
            }
            if pattern.count.is_some_and(|count| emitted >= count) {
                tracing::trace!(emitted, "reached COUNT");
                return Ok(found);
            }
            emitted += 1;
            if candidate >= *end {
                return Ok(found);
            }
            if candidate >= *start {
                found.push(candidate);
            }
        }

        cursor.advance()?;
    }

    Ok(found)
}

/// The anchor's wall clock expressed as a UTC instant, so fixed-duration
/// steps move whole calendar days regardless of DST.
fn floating(anchor: &ZonedInstant) -> ZonedInstant {
    let mut value = ZonedInstant::utc(Utc.from_utc_datetime(&anchor.local()));
    if !anchor.has_time() {
        value = ZonedInstant::date(Zone::Utc, anchor.date_naive()).unwrap_or(value);
    }
    value
}

/// Walks the base instants of successive frequency periods.
struct Cursor<'a> {
    origin: ZonedInstant,
    pattern: &'a RecurrencePattern,
    index: i32,
    current: ZonedInstant,
}

impl<'a> Cursor<'a> {
    fn new(origin: ZonedInstant, pattern: &'a RecurrencePattern) -> Self {
        Self {
            origin,
            pattern,
            index: 0,
            current: origin,
        }
    }

    fn current(&self) -> &ZonedInstant {
        &self.current
    }

    /// Month and year steps are taken from the origin so clamped days do not
    /// drift; shorter steps accumulate.
    fn advance(&mut self) -> Result<(), CoreError> {
        match self.pattern.frequency {
            Frequency::Monthly | Frequency::Yearly => {
                self.index += 1;
                let steps = self.steps(self.index)?;
                self.current = step_instant(&self.origin, self.pattern, steps)?;
            }
            _ => self.current = step_instant(&self.current, self.pattern, self.pattern.interval)?,
        }
        Ok(())
    }

    fn steps(&self, index: i32) -> Result<i32, CoreError> {
        self.pattern
            .interval
            .checked_mul(index)
            .ok_or_else(|| CoreError::InvalidInput(format!("step {index} of {} is out of range", self.pattern)))
    }

    /// Skips whole periods that end well before `start`.
    fn fast_forward(&mut self, start: &ZonedInstant) -> Result<(), CoreError> {
        let unit_seconds: i64 = match self.pattern.frequency {
            Frequency::Secondly => 1,
            Frequency::Minutely => 60,
            Frequency::Hourly => 3_600,
            Frequency::Daily => 86_400,
            Frequency::Weekly => 604_800,
            Frequency::Monthly | Frequency::Yearly => return self.fast_forward_months(start),
            Frequency::Undefined => return Err(CoreError::UndefinedFrequency),
        };

        let step = unit_seconds * i64::from(self.pattern.interval);
        let margin = step + Duration::days(8).num_seconds();
        let elapsed = start.duration_since(&self.origin).num_seconds();
        let skip = (elapsed - margin) / step;
        if skip > 0 {
            self.current = self.origin.checked_add(Duration::seconds(skip * step))?;
            tracing::trace!(skip, current = %self.current, "fast-forwarded");
        }
        Ok(())
    }

    fn fast_forward_months(&mut self, start: &ZonedInstant) -> Result<(), CoreError> {
        let start = start.with_zone(self.origin.zone());
        let months = (start.year() - self.origin.year()) * 12 + start.month() as i32 - self.origin.month() as i32 - 13;
        let per_step = match self.pattern.frequency {
            Frequency::Yearly => self.pattern.interval.saturating_mul(12),
            _ => self.pattern.interval,
        };
        let skip = months / per_step;
        if skip > 0 {
            self.index = skip;
            self.current = step_instant(&self.origin, self.pattern, self.steps(skip)?)?;
            tracing::trace!(skip, current = %self.current, "fast-forwarded");
        }
        Ok(())
    }
}

/// Where an ordinal BYDAY entry counts its weekdays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrdinalScope {
    Month,
    Year,
}

/// The BYxxx expansion and limiting rules of one pattern, with the defaults
/// taken from the anchor already applied.
#[derive(Debug)]
struct FilterStage {
    frequency: Frequency,
    zone: Zone,
    has_time: bool,
    by_second: Vec<u32>,
    by_minute: Vec<u32>,
    by_hour: Vec<u32>,
    by_day: Vec<NWeekday>,
    by_month_day: Vec<i32>,
    by_year_day: Vec<i32>,
    by_week_no: Vec<i32>,
    by_month: Vec<u32>,
    by_set_pos: Vec<i32>,
    week_start: Weekday,
    ordinal_scope: Option<OrdinalScope>,
    limit: usize,
}

impl FilterStage {
    fn new(anchor: &ZonedInstant, pattern: &RecurrencePattern, config: &EvaluationConfig) -> Self {
        let mut stage = Self {
            frequency: pattern.frequency,
            zone: anchor.zone(),
            has_time: anchor.has_time(),
            by_second: pattern.by_second.clone(),
            by_minute: pattern.by_minute.clone(),
            by_hour: pattern.by_hour.clone(),
            by_day: pattern.by_day.clone(),
            by_month_day: pattern.by_month_day.clone(),
            by_year_day: pattern.by_year_day.clone(),
            by_week_no: pattern.by_week_no.clone(),
            by_month: pattern.by_month.clone(),
            by_set_pos: pattern.by_set_pos.clone(),
            week_start: pattern.week_start,
            ordinal_scope: None,
            limit: config.max_instances_per_period.max(1),
        };

        let local = anchor.local();
        let day_parts_unset = stage.by_week_no.is_empty()
            && stage.by_year_day.is_empty()
            && stage.by_month_day.is_empty()
            && stage.by_day.is_empty();
        if day_parts_unset {
            match stage.frequency {
                Frequency::Yearly => {
                    if stage.by_month.is_empty() {
                        stage.by_month = vec![local.month()];
                    }
                    stage.by_month_day = vec![local.day() as i32];
                }
                Frequency::Monthly => stage.by_month_day = vec![local.day() as i32],
                Frequency::Weekly => stage.by_day = vec![NWeekday::every(local.weekday())],
                _ => {}
            }
        }

        stage.ordinal_scope = match stage.frequency {
            Frequency::Monthly => Some(OrdinalScope::Month),
            Frequency::Yearly if !stage.by_month.is_empty() => Some(OrdinalScope::Month),
            Frequency::Yearly => Some(OrdinalScope::Year),
            _ => None,
        };

        if stage.by_hour.is_empty() && stage.expands(Field::Hour) {
            stage.by_hour = vec![local.hour()];
        }
        if stage.by_minute.is_empty() && stage.expands(Field::Minute) {
            stage.by_minute = vec![local.minute()];
        }
        if stage.by_second.is_empty() && stage.expands(Field::Second) {
            stage.by_second = vec![local.second()];
        }
        stage
    }

    /// Whether a time field is expanded (frequency coarser than the field)
    /// rather than limited.
    fn expands(&self, field: Field) -> bool {
        rank(self.frequency) > field as u8
    }

    /// Earliest instant the period based at `base` can produce.
    fn floor(&self, base: &ZonedInstant) -> Result<ZonedInstant, CoreError> {
        let local = base.local();
        let date = local.date();
        let floor = match self.frequency {
            Frequency::Yearly => first_of_year(date.year())?.and_time(NaiveTime::MIN),
            Frequency::Monthly => date.with_day(1).unwrap_or(date).and_time(NaiveTime::MIN),
            Frequency::Weekly => self.week_containing(date).and_time(NaiveTime::MIN),
            Frequency::Daily => date.and_time(NaiveTime::MIN),
            Frequency::Hourly => truncate(local, 3_600),
            Frequency::Minutely => truncate(local, 60),
            _ => local,
        };
        ZonedInstant::from_local(self.zone, floor)
    }

    /// Every instant the period based at `base` produces, ascending.
    fn expand(&self, base: &ZonedInstant) -> Result<Vec<ZonedInstant>, CoreError> {
        let local = base.local();
        let days: Vec<NaiveDate> = self.period_days(local.date())?.into_iter().filter(|day| self.matches_day(*day)).collect();
        if days.is_empty() {
            return Ok(Vec::new());
        }

        let hours = self.field_values(Field::Hour, &self.by_hour, local.hour());
        let minutes = self.field_values(Field::Minute, &self.by_minute, local.minute());
        let seconds = self.field_values(Field::Second, &self.by_second, local.second());

        let mut locals = Vec::new();
        'days: for day in &days {
            for hour in &hours {
                for minute in &minutes {
                    for second in &seconds {
                        if let Some(time) = NaiveTime::from_hms_opt(*hour, *minute, *second) {
                            if locals.len() >= self.limit {
                                tracing::warn!(limit = self.limit, period = %base, "period expansion truncated");
                                break 'days;
                            }
                            locals.push(day.and_time(time));
                        }
                    }
                }
            }
        }
        locals.sort_unstable();
        locals.dedup();

        if !self.by_set_pos.is_empty() {
            locals = self.select_positions(&locals);
        }

        let mut instants = locals
            .into_iter()
            .map(|local| {
                if self.has_time {
                    ZonedInstant::from_local(self.zone, local)
                } else {
                    ZonedInstant::date(self.zone, local.date())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        instants.sort();
        instants.dedup();
        Ok(instants)
    }

    fn field_values(&self, field: Field, listed: &[u32], base: u32) -> Vec<u32> {
        if self.expands(field) {
            listed.to_vec()
        } else if listed.is_empty() || listed.contains(&base) {
            vec![base]
        } else {
            Vec::new()
        }
    }

    fn select_positions(&self, sorted: &[NaiveDateTime]) -> Vec<NaiveDateTime> {
        let len = sorted.len() as i64;
        let mut selected: Vec<NaiveDateTime> = self
            .by_set_pos
            .iter()
            .filter_map(|&position| {
                let index = match i64::from(position) {
                    p if p > 0 => p - 1,
                    p => len + p,
                };
                usize::try_from(index).ok().and_then(|index| sorted.get(index)).copied()
            })
            .collect();
        selected.sort_unstable();
        selected.dedup();
        selected
    }

    /// Calendar days of the period containing `date`.
    fn period_days(&self, date: NaiveDate) -> Result<Vec<NaiveDate>, CoreError> {
        let (first, count) = match self.frequency {
            Frequency::Yearly => (first_of_year(date.year())?, days_in_year(date.year())),
            Frequency::Monthly => (date.with_day(1).unwrap_or(date), days_in_month(date.year(), date.month())),
            Frequency::Weekly => (self.week_containing(date), 7),
            _ => (date, 1),
        };
        Ok(first.iter_days().take(count as usize).collect())
    }

    fn week_containing(&self, date: NaiveDate) -> NaiveDate {
        date - Duration::days(i64::from(days_after(date.weekday(), self.week_start)))
    }

    fn matches_day(&self, date: NaiveDate) -> bool {
        if !self.by_month.is_empty() && !self.by_month.contains(&date.month()) {
            return false;
        }
        if !self.by_week_no.is_empty() && !self.matches_week_no(date) {
            return false;
        }
        if !self.by_year_day.is_empty() {
            let day = date.ordinal() as i32;
            let len = days_in_year(date.year()) as i32;
            if !self.by_year_day.iter().any(|&n| n == day || n == day - len - 1) {
                return false;
            }
        }
        if !self.by_month_day.is_empty() {
            let day = date.day() as i32;
            let len = days_in_month(date.year(), date.month()) as i32;
            if !self.by_month_day.iter().any(|&n| n == day || n == day - len - 1) {
                return false;
            }
        }
        if !self.by_day.is_empty() && !self.by_day.iter().any(|entry| self.matches_weekday(date, entry)) {
            return false;
        }
        true
    }

    fn matches_weekday(&self, date: NaiveDate, entry: &NWeekday) -> bool {
        if date.weekday() != entry.weekday {
            return false;
        }
        let (Some(ordinal), Some(scope)) = (entry.ordinal, self.ordinal_scope) else {
            return true;
        };

        let (position, len) = match scope {
            OrdinalScope::Month => (date.day(), days_in_month(date.year(), date.month())),
            OrdinalScope::Year => (date.ordinal(), days_in_year(date.year())),
        };
        if ordinal > 0 {
            ((position - 1) / 7 + 1) as i32 == ordinal
        } else {
            ((len - position) / 7 + 1) as i32 == -ordinal
        }
    }

    fn matches_week_no(&self, date: NaiveDate) -> bool {
        let year = date.year();
        let (Some(this), Some(next)) = (week_one_start(year, self.week_start), week_one_start(year + 1, self.week_start)) else {
            return false;
        };
        let bounds = if date < this {
            week_one_start(year - 1, self.week_start).map(|previous| (previous, this))
        } else if date >= next {
            week_one_start(year + 2, self.week_start).map(|after| (next, after))
        } else {
            Some((this, next))
        };
        let Some((first, following)) = bounds else {
            return false;
        };

        let week = (date.signed_duration_since(first).num_days() / 7 + 1) as i32;
        let weeks = (following.signed_duration_since(first).num_days() / 7) as i32;
        self.by_week_no.iter().any(|&n| n == week || n == week - weeks - 1)
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Second = 0,
    Minute = 1,
    Hour = 2,
}

fn rank(frequency: Frequency) -> u8 {
    match frequency {
        Frequency::Secondly => 0,
        Frequency::Minutely => 1,
        Frequency::Hourly => 2,
        Frequency::Daily => 3,
        Frequency::Weekly => 4,
        Frequency::Monthly => 5,
        Frequency::Yearly | Frequency::Undefined => 6,
    }
}

fn truncate(local: NaiveDateTime, unit_seconds: u32) -> NaiveDateTime {
    let seconds = local.time().num_seconds_from_midnight();
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds - seconds % unit_seconds, 0).unwrap_or(NaiveTime::MIN);
    local.date().and_time(time)
}

fn first_of_year(year: i32) -> Result<NaiveDate, CoreError> {
    NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(|| CoreError::InvalidInput(format!("year {year} is out of range")))
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Days from `week_start` forward to `day`, 0 through 6.
fn days_after(day: Weekday, week_start: Weekday) -> u32 {
    (day.num_days_from_monday() + 7 - week_start.num_days_from_monday()) % 7
}

/// First day of week 1: the first week, starting on `week_start`, with at
/// least four days in `year`.
fn week_one_start(year: i32, week_start: Weekday) -> Option<NaiveDate> {
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = days_after(jan1.weekday(), week_start);
    let start = jan1 - Duration::days(i64::from(offset));
    Some(if offset <= 3 { start } else { start + Duration::days(7) })
}
