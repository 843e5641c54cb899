//! Recurrence patterns: frequency, interval, BYxxx filter parts and
//! COUNT/UNTIL termination, as defined by RFC 5545 section 3.3.10.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::datetime::ZonedInstant;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    #[default]
    Undefined,
}

impl Frequency {
    /// Whether one step spans at least a whole day.
    pub fn is_day_or_coarser(self) -> bool {
        matches!(self, Frequency::Daily | Frequency::Weekly | Frequency::Monthly | Frequency::Yearly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Secondly => "SECONDLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Hourly => "HOURLY",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
            Frequency::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Ok(Frequency::Secondly),
            "MINUTELY" => Ok(Frequency::Minutely),
            "HOURLY" => Ok(Frequency::Hourly),
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            _ => Err(CoreError::InvalidInput(format!("unknown frequency '{s}'"))),
        }
    }
}

/// A BYDAY entry: a weekday, optionally restricted to its n-th occurrence
/// within the month or year (negative counts from the end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NWeekday {
    pub ordinal: Option<i32>,
    pub weekday: Weekday,
}

impl NWeekday {
    pub fn every(weekday: Weekday) -> Self {
        Self { ordinal: None, weekday }
    }

    pub fn nth(ordinal: i32, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }
}

fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Parses a two-letter RFC 5545 weekday code.
pub fn parse_weekday(code: &str) -> Result<Weekday, CoreError> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        _ => Err(CoreError::InvalidInput(format!("unknown weekday '{code}'"))),
    }
}

impl fmt::Display for NWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ordinal) = self.ordinal {
            write!(f, "{ordinal}")?;
        }
        f.write_str(weekday_code(self.weekday))
    }
}

impl FromStr for NWeekday {
    type Err = CoreError;

    /// Accepts `MO`, `2SU`, `+3TU` and `-1FR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() < 2 || !s.is_char_boundary(s.len() - 2) {
            return Err(CoreError::InvalidInput(format!("invalid weekday '{s}'")));
        }
        let (ordinal, code) = s.split_at(s.len() - 2);
        let weekday = parse_weekday(code)?;
        if ordinal.is_empty() {
            return Ok(NWeekday::every(weekday));
        }

        let ordinal: i32 = ordinal
            .parse()
            .map_err(|_| CoreError::InvalidInput(format!("invalid weekday ordinal in '{s}'")))?;
        if ordinal == 0 || !(-53..=53).contains(&ordinal) {
            return Err(CoreError::InvalidInput(format!("weekday ordinal out of range in '{s}'")));
        }
        Ok(NWeekday::nth(ordinal, weekday))
    }
}

/// A single RRULE or EXRULE value.
///
/// A pattern with none of the BYxxx parts set has no filter stage: every
/// stepped instant is emitted unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub interval: i32,
    pub count: Option<u32>,
    pub until: Option<ZonedInstant>,
    pub by_second: Vec<u32>,
    pub by_minute: Vec<u32>,
    pub by_hour: Vec<u32>,
    pub by_day: Vec<NWeekday>,
    pub by_month_day: Vec<i32>,
    pub by_year_day: Vec<i32>,
    pub by_week_no: Vec<i32>,
    pub by_month: Vec<u32>,
    pub by_set_pos: Vec<i32>,
    pub week_start: Weekday,
}

impl Default for RecurrencePattern {
    fn default() -> Self {
        Self {
            frequency: Frequency::Undefined,
            interval: 1,
            count: None,
            until: None,
            by_second: Vec::new(),
            by_minute: Vec::new(),
            by_hour: Vec::new(),
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_year_day: Vec::new(),
            by_week_no: Vec::new(),
            by_month: Vec::new(),
            by_set_pos: Vec::new(),
            week_start: Weekday::Mon,
        }
    }
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            ..Default::default()
        }
    }

    pub fn interval(mut self, interval: i32) -> Self {
        self.interval = interval;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn until(mut self, until: ZonedInstant) -> Self {
        self.until = Some(until);
        self
    }

    pub fn by_second(mut self, seconds: impl IntoIterator<Item = u32>) -> Self {
        self.by_second = seconds.into_iter().collect();
        self
    }

    pub fn by_minute(mut self, minutes: impl IntoIterator<Item = u32>) -> Self {
        self.by_minute = minutes.into_iter().collect();
        self
    }

    pub fn by_hour(mut self, hours: impl IntoIterator<Item = u32>) -> Self {
        self.by_hour = hours.into_iter().collect();
        self
    }

    pub fn by_day(mut self, days: impl IntoIterator<Item = NWeekday>) -> Self {
        self.by_day = days.into_iter().collect();
        self
    }

    pub fn by_month_day(mut self, days: impl IntoIterator<Item = i32>) -> Self {
        self.by_month_day = days.into_iter().collect();
        self
    }

    pub fn by_year_day(mut self, days: impl IntoIterator<Item = i32>) -> Self {
        self.by_year_day = days.into_iter().collect();
        self
    }

    pub fn by_week_no(mut self, weeks: impl IntoIterator<Item = i32>) -> Self {
        self.by_week_no = weeks.into_iter().collect();
        self
    }

    pub fn by_month(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.by_month = months.into_iter().collect();
        self
    }

    pub fn by_set_pos(mut self, positions: impl IntoIterator<Item = i32>) -> Self {
        self.by_set_pos = positions.into_iter().collect();
        self
    }

    pub fn week_start(mut self, weekday: Weekday) -> Self {
        self.week_start = weekday;
        self
    }

    /// Whether any BYxxx part narrows or expands the stepped instants.
    pub fn has_filter(&self) -> bool {
        !(self.by_second.is_empty()
            && self.by_minute.is_empty()
            && self.by_hour.is_empty()
            && self.by_day.is_empty()
            && self.by_month_day.is_empty()
            && self.by_year_day.is_empty()
            && self.by_week_no.is_empty()
            && self.by_month.is_empty()
            && self.by_set_pos.is_empty())
    }

    /// Whether the rule terminates on its own.
    pub fn is_bounded(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(values: &[T]) -> String {
            values.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        }

        write!(f, "FREQ={}", self.frequency)?;
        if self.interval != 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={count}")?;
        }
        if let Some(until) = &self.until {
            write!(f, ";UNTIL={}", until.instant().format("%Y%m%dT%H%M%SZ"))?;
        }
        let parts: [(&str, String); 9] = [
            ("BYSECOND", join(&self.by_second)),
            ("BYMINUTE", join(&self.by_minute)),
            ("BYHOUR", join(&self.by_hour)),
            ("BYDAY", join(&self.by_day)),
            ("BYMONTHDAY", join(&self.by_month_day)),
            ("BYYEARDAY", join(&self.by_year_day)),
            ("BYWEEKNO", join(&self.by_week_no)),
            ("BYMONTH", join(&self.by_month)),
            ("BYSETPOS", join(&self.by_set_pos)),
        ];
        for (name, value) in parts.iter().filter(|(_, value)| !value.is_empty()) {
            write!(f, ";{name}={value}")?;
        }
        if self.week_start != Weekday::Mon {
            write!(f, ";WKST={}", weekday_code(self.week_start))?;
        }
        Ok(())
    }
}
