//! Zone-aware instants, periods and occurrences.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use std::cmp::Ordering;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};

use crate::error::CoreError;
use crate::timezone::Zone;
use crate::vtimezone::ObservanceKind;

/// The smallest representable step between two instants.
pub const SMALLEST_UNIT: Duration = Duration::nanoseconds(1);

/// An absolute instant paired with the zone it is expressed in and the UTC
/// offset in effect at that instant.
///
/// Equality, ordering and hashing consider the absolute instant only: the
/// same moment expressed in two zones compares equal.
#[derive(Debug, Clone, Copy)]
pub struct ZonedInstant {
    instant: DateTime<Utc>,
    zone: Zone,
    offset: FixedOffset,
    has_time: bool,
}

impl ZonedInstant {
    pub fn new(instant: DateTime<Utc>, zone: Zone) -> Self {
        Self {
            instant,
            zone,
            offset: zone.offset_at(&instant),
            has_time: true,
        }
    }

    pub fn utc(instant: DateTime<Utc>) -> Self {
        Self::new(instant, Zone::Utc)
    }

    /// Places a wall-clock value in `zone`, see [`Zone::resolve_local`].
    pub fn from_local(zone: Zone, local: NaiveDateTime) -> Result<Self, CoreError> {
        Ok(Self::new(zone.resolve_local(&local)?, zone))
    }

    /// A date-only value: local midnight of `date`, flagged as carrying no
    /// time of day.
    pub fn date(zone: Zone, date: NaiveDate) -> Result<Self, CoreError> {
        let mut value = Self::from_local(zone, date.and_time(NaiveTime::MIN))?;
        value.has_time = false;
        Ok(value)
    }

    #[inline]
    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    #[inline]
    pub fn zone(&self) -> Zone {
        self.zone
    }

    #[inline]
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Whether the value was given with a time of day.
    #[inline]
    pub fn has_time(&self) -> bool {
        self.has_time
    }

    #[inline]
    pub fn is_utc(&self) -> bool {
        self.zone.is_utc()
    }

    /// Wall-clock value in the value's own zone.
    pub fn local(&self) -> NaiveDateTime {
        self.instant.with_timezone(&self.offset).naive_local()
    }

    pub fn date_naive(&self) -> NaiveDate {
        self.local().date()
    }

    pub fn time(&self) -> NaiveTime {
        self.local().time()
    }

    pub fn year(&self) -> i32 {
        self.local().year()
    }

    pub fn month(&self) -> u32 {
        self.local().month()
    }

    pub fn day(&self) -> u32 {
        self.local().day()
    }

    pub fn hour(&self) -> u32 {
        self.local().hour()
    }

    pub fn minute(&self) -> u32 {
        self.local().minute()
    }

    pub fn second(&self) -> u32 {
        self.local().second()
    }

    pub fn weekday(&self) -> Weekday {
        self.local().weekday()
    }

    /// ISO-8601 day of week: Monday = 1 through Sunday = 7.
    pub fn iso_weekday(&self) -> u32 {
        self.weekday().number_from_monday()
    }

    /// The same instant expressed in another zone.
    pub fn with_zone(&self, zone: Zone) -> Self {
        Self {
            has_time: self.has_time,
            ..Self::new(self.instant, zone)
        }
    }

    /// Local midnight of this value's calendar date, in the same zone.
    pub fn start_of_day(&self) -> Result<Self, CoreError> {
        Self::from_local(self.zone, self.date_naive().and_time(NaiveTime::MIN))
    }

    /// Adds whole calendar months, keeping the wall-clock time and clamping
    /// the day to the length of the target month. The UTC offset is resolved
    /// anew for the resulting local date.
    pub fn add_months(&self, months: i32) -> Result<Self, CoreError> {
        let date = self.date_naive();
        let shifted = if months >= 0 {
            date.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            date.checked_sub_months(Months::new(months.unsigned_abs()))
        }
        .ok_or_else(|| CoreError::InvalidLocalTime(format!("{self} plus {months} months is out of range")))?;

        let mut value = Self::from_local(self.zone, shifted.and_time(self.time()))?;
        value.has_time = self.has_time;
        Ok(value)
    }

    /// Adds an exact duration, failing instead of overflowing the
    /// representable range.
    pub fn checked_add(&self, rhs: Duration) -> Result<Self, CoreError> {
        let instant = self
            .instant
            .checked_add_signed(rhs)
            .ok_or_else(|| CoreError::InvalidLocalTime(format!("{self} plus {rhs} is out of range")))?;
        Ok(ZonedInstant { has_time: self.has_time, ..ZonedInstant::new(instant, self.zone) })
    }

    pub fn add_years(&self, years: i32) -> Result<Self, CoreError> {
        let months = years
            .checked_mul(12)
            .ok_or_else(|| CoreError::InvalidLocalTime(format!("{self} plus {years} years is out of range")))?;
        self.add_months(months)
    }

    /// Compares against an operand that may be absent.
    ///
    /// # Errors
    /// [`CoreError::IncomparableInstants`] when `other` is `None`.
    pub fn try_cmp(&self, other: Option<&ZonedInstant>) -> Result<Ordering, CoreError> {
        other.map(|other| self.cmp(other)).ok_or(CoreError::IncomparableInstants)
    }

    pub fn duration_since(&self, earlier: &ZonedInstant) -> Duration {
        self.instant - earlier.instant
    }
}

impl PartialEq for ZonedInstant {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for ZonedInstant {}

impl Hash for ZonedInstant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl PartialOrd for ZonedInstant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ZonedInstant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl Add<Duration> for ZonedInstant {
    type Output = ZonedInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        ZonedInstant {
            has_time: self.has_time,
            ..ZonedInstant::new(self.instant + rhs, self.zone)
        }
    }
}

impl Sub<Duration> for ZonedInstant {
    type Output = ZonedInstant;

    fn sub(self, rhs: Duration) -> Self::Output {
        self + (-rhs)
    }
}

impl fmt::Display for ZonedInstant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_time {
            write!(f, "{} {}", self.local().format("%Y-%m-%d %H:%M:%S"), self.zone)
        } else {
            write!(f, "{} {}", self.date_naive(), self.zone)
        }
    }
}

/// A span of time starting at `start`. A period without an end is a point
/// in time.
#[derive(Debug, Clone)]
pub struct Period {
    start: ZonedInstant,
    end: Option<ZonedInstant>,
    matches_date_only: bool,
}

impl Period {
    pub fn new(start: ZonedInstant) -> Self {
        Self {
            start,
            end: None,
            matches_date_only: false,
        }
    }

    pub fn with_end(start: ZonedInstant, end: ZonedInstant) -> Result<Self, CoreError> {
        let mut period = Self::new(start);
        period.set_end(end)?;
        Ok(period)
    }

    pub fn with_duration(start: ZonedInstant, duration: Duration) -> Result<Self, CoreError> {
        Self::with_end(start, start.checked_add(duration)?)
    }

    #[inline]
    pub fn start(&self) -> &ZonedInstant {
        &self.start
    }

    #[inline]
    pub fn end(&self) -> Option<&ZonedInstant> {
        self.end.as_ref()
    }

    /// # Errors
    /// [`CoreError::InvalidPeriod`] if `end` lies before the start.
    pub fn set_end(&mut self, end: ZonedInstant) -> Result<(), CoreError> {
        if end < self.start {
            return Err(CoreError::InvalidPeriod(format!("end {end} precedes start {}", self.start)));
        }
        self.end = Some(end);
        Ok(())
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end.duration_since(&self.start))
    }

    #[inline]
    pub fn matches_date_only(&self) -> bool {
        self.matches_date_only
    }

    /// Makes this period match every period starting on the same calendar
    /// date, whatever its time of day.
    pub fn set_matches_date_only(&mut self, value: bool) {
        self.matches_date_only = value;
    }

    /// Period equality: equal starts, or equal calendar dates when either
    /// side matches by date only. Dates are compared in the zone of the
    /// date-only side.
    pub fn matches(&self, other: &Period) -> bool {
        let date_side = if self.matches_date_only {
            Some(self)
        } else if other.matches_date_only {
            Some(other)
        } else {
            None
        };

        match date_side {
            Some(side) => {
                let zone = side.start.zone();
                self.start.with_zone(zone).date_naive() == other.start.with_zone(zone).date_naive()
            }
            None => self.start == other.start,
        }
    }

    /// Whether `instant` lies within the period, both ends inclusive.
    pub fn contains(&self, instant: &ZonedInstant) -> bool {
        match &self.end {
            Some(end) => self.start <= *instant && *instant <= *end,
            None => self.start == *instant,
        }
    }
}

impl PartialEq for Period {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.end {
            Some(end) => write!(f, "{} / {}", self.start, end),
            None => write!(f, "{}", self.start),
        }
    }
}

/// A set of periods without duplicates, ordered by start.
///
/// Periods are keyed by their absolute start instant; inserting a period
/// whose start is already present keeps the existing one.
#[derive(Debug, Clone, Default)]
pub struct PeriodSet {
    periods: BTreeMap<DateTime<Utc>, Period>,
}

impl PeriodSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if an equal period was already present.
    pub fn insert(&mut self, period: Period) -> bool {
        match self.periods.entry(period.start.instant()) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(period);
                true
            }
        }
    }

    /// Removes every period matching `excluded` and returns how many went.
    pub fn remove_matching(&mut self, excluded: &Period) -> usize {
        let before = self.periods.len();
        if excluded.matches_date_only {
            self.periods.retain(|_, period| !period.matches(excluded));
        } else {
            self.periods.remove(&excluded.start.instant());
        }
        before - self.periods.len()
    }

    /// Set difference by period equality.
    pub fn subtract(&mut self, excluded: &PeriodSet) -> usize {
        excluded.iter().map(|period| self.remove_matching(period)).sum()
    }

    pub fn contains(&self, period: &Period) -> bool {
        if period.matches_date_only {
            self.periods.values().any(|p| p.matches(period))
        } else {
            self.periods.contains_key(&period.start.instant())
        }
    }

    /// Periods starting in `[start, end)`.
    pub fn range<'a>(&'a self, start: &ZonedInstant, end: &ZonedInstant) -> impl Iterator<Item = &'a Period> + 'a {
        let (start, end) = (start.instant(), end.instant());
        let bounds = if start < end { Some(start..end) } else { None };
        bounds.into_iter().flat_map(move |bounds| self.periods.range(bounds).map(|(_, p)| p))
    }

    pub fn get_mut(&mut self, start: &ZonedInstant) -> Option<&mut Period> {
        self.periods.get_mut(&start.instant())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Period> {
        self.periods.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Period> {
        self.periods.values_mut()
    }

    pub fn first(&self) -> Option<&Period> {
        self.periods.values().next()
    }

    pub fn last(&self) -> Option<&Period> {
        self.periods.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn clear(&mut self) {
        self.periods.clear();
    }

    /// Start instants in ascending order.
    pub fn starts(&self) -> Vec<ZonedInstant> {
        self.periods.values().map(|p| p.start).collect()
    }
}

impl Extend<Period> for PeriodSet {
    fn extend<T: IntoIterator<Item = Period>>(&mut self, iter: T) {
        for period in iter {
            self.insert(period);
        }
    }
}

impl FromIterator<Period> for PeriodSet {
    fn from_iter<T: IntoIterator<Item = Period>>(iter: T) -> Self {
        let mut set = PeriodSet::new();
        set.extend(iter);
        set
    }
}

impl<'a> IntoIterator for &'a PeriodSet {
    type Item = &'a Period;
    type IntoIter = btree_map::Values<'a, DateTime<Utc>, Period>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.values()
    }
}

/// The entity an occurrence was produced by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// A recurring calendar component, by UID.
    Component { uid: String },
    /// An observance of a time zone, by TZID and position in the zone.
    Observance { tzid: String, index: usize, kind: ObservanceKind },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Component { uid } => f.write_str(uid),
            Source::Observance { tzid, index, kind } => write!(f, "{tzid}#{index} ({kind})"),
        }
    }
}

/// A concrete period produced by a rule-bearing source.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub source: Source,
    pub period: Period,
}

impl Occurrence {
    pub fn new(source: Source, period: Period) -> Self {
        Self { source, period }
    }

    #[inline]
    pub fn start(&self) -> &ZonedInstant {
        self.period.start()
    }
}

/// Owner a reference date is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Owner {
    Component(String),
    TimeZone(String),
}

/// The reference date an evaluation is made against, optionally attached to
/// the entity that owns it.
#[derive(Debug, Clone)]
pub struct Reference {
    instant: ZonedInstant,
    owner: Option<Owner>,
}

impl Reference {
    pub fn new(instant: ZonedInstant) -> Self {
        Self { instant, owner: None }
    }

    #[inline]
    pub fn instant(&self) -> &ZonedInstant {
        &self.instant
    }

    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    /// Attaches `owner` unless the reference already has one.
    pub fn attach_if_unowned(&mut self, owner: Owner) -> bool {
        if self.owner.is_some() {
            return false;
        }
        self.owner = Some(owner);
        true
    }
}

impl From<ZonedInstant> for Reference {
    fn from(instant: ZonedInstant) -> Self {
        Self::new(instant)
    }
}
