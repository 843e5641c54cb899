//! TOML calendar files.
//!
//! A calendar file declares recurring components and time zones with
//! structured rule fields:
//!
//! ```toml
//! [[component]]
//! uid = "standup"
//! start = "2024-01-01T09:00:00"
//! timezone = "America/New_York"
//! duration_minutes = 15
//! exdate = ["2024-01-03"]
//!
//! [[component.rrule]]
//! freq = "weekly"
//! by_day = ["MO", "WE", "FR"]
//!
//! [[timezone]]
//! tzid = "US-Eastern"
//!
//! [[timezone.observance]]
//! kind = "daylight"
//! start = "2007-03-11T02:00:00"
//! offset_from = "-0500"
//! offset_to = "-0400"
//! name = "EDT"
//! rrule = { freq = "yearly", by_month = [3], by_day = ["2SU"] }
//! ```

use anyhow::{bail, Context, Result};
use cadence_core::config::EvaluationConfig;
use cadence_core::datetime::{Period, ZonedInstant};
use cadence_core::pattern::{parse_weekday, Frequency, NWeekday, RecurrencePattern};
use cadence_core::recurring::{ComponentKind, RecurrenceRule, RecurringComponent};
use cadence_core::timezone::{resolve_zone, Zone};
use cadence_core::vtimezone::{Observance, ObservanceKind, TimeZone, UtcOffset};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;

const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Deserialize, Debug, Default)]
pub struct CalendarFile {
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentDef>,
    #[serde(default, rename = "timezone")]
    pub timezones: Vec<TimeZoneDef>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KindDef {
    #[default]
    Event,
    Todo,
    Journal,
}

impl From<KindDef> for ComponentKind {
    fn from(kind: KindDef) -> Self {
        match kind {
            KindDef::Event => ComponentKind::Event,
            KindDef::Todo => ComponentKind::Todo,
            KindDef::Journal => ComponentKind::Journal,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ComponentDef {
    pub uid: String,
    #[serde(default)]
    pub kind: KindDef,
    pub start: String,
    pub timezone: Option<String>,
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub rrule: Vec<RuleDef>,
    #[serde(default)]
    pub exrule: Vec<RuleDef>,
    #[serde(default)]
    pub rdate: Vec<String>,
    #[serde(default)]
    pub exdate: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct TimeZoneDef {
    pub tzid: String,
    #[serde(default, rename = "observance")]
    pub observances: Vec<ObservanceDef>,
}

#[derive(Deserialize, Debug)]
pub struct ObservanceDef {
    pub kind: ObservanceKind,
    pub start: String,
    pub offset_from: String,
    pub offset_to: String,
    pub name: Option<String>,
    pub rrule: Option<RuleDef>,
    #[serde(default)]
    pub rdate: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RuleDef {
    pub freq: String,
    pub interval: Option<i32>,
    pub count: Option<u32>,
    pub until: Option<String>,
    #[serde(default)]
    pub by_second: Vec<u32>,
    #[serde(default)]
    pub by_minute: Vec<u32>,
    #[serde(default)]
    pub by_hour: Vec<u32>,
    #[serde(default)]
    pub by_day: Vec<String>,
    #[serde(default)]
    pub by_month_day: Vec<i32>,
    #[serde(default)]
    pub by_year_day: Vec<i32>,
    #[serde(default)]
    pub by_week_no: Vec<i32>,
    #[serde(default)]
    pub by_month: Vec<u32>,
    #[serde(default)]
    pub by_set_pos: Vec<i32>,
    pub wkst: Option<String>,
}

impl CalendarFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("Calendar file '{}' does not exist", path.display());
        }
        Figment::from(Toml::file(path))
            .extract()
            .with_context(|| format!("Failed to read calendar file '{}'", path.display()))
    }

    /// Builds every component, placing values without an explicit zone in `default_zone`.
    pub fn components(&self, default_zone: Zone, config: &EvaluationConfig) -> Result<Vec<RecurringComponent>> {
        self.components
            .iter()
            .map(|def| {
                def.build(default_zone, config)
                    .with_context(|| format!("Invalid component '{}'", def.uid))
            })
            .collect()
    }

    pub fn timezone(&self, tzid: &str, config: &EvaluationConfig) -> Result<TimeZone> {
        let def = self
            .timezones
            .iter()
            .find(|tz| tz.tzid == tzid)
            .with_context(|| format!("No time zone '{tzid}' is defined in the calendar file"))?;
        def.build(config)
            .with_context(|| format!("Invalid time zone '{tzid}'"))
    }
}

impl ComponentDef {
    pub fn build(&self, default_zone: Zone, config: &EvaluationConfig) -> Result<RecurringComponent> {
        let zone = match &self.timezone {
            Some(id) => resolve_zone(id)?,
            None => default_zone,
        };
        let start = parse_value(&self.start, zone)?;

        let mut component = RecurringComponent::new(self.uid.clone(), self.kind.into(), start).with_config(config.clone());
        if let Some(minutes) = self.duration_minutes {
            if minutes < 0 {
                bail!("duration_minutes must not be negative, got {minutes}");
            }
            component = component.with_duration(Duration::minutes(minutes));
        }

        for rule in &self.rrule {
            component.add_rrule(rule.to_pattern(zone, start.has_time())?);
        }
        for rule in &self.exrule {
            component.add_exrule(rule.to_pattern(zone, start.has_time())?);
        }
        if !self.rdate.is_empty() {
            component.add_rule(RecurrenceRule::RDate(parse_periods(&self.rdate, zone)?));
        }
        if !self.exdate.is_empty() {
            component.add_rule(RecurrenceRule::ExDate(parse_periods(&self.exdate, zone)?));
        }
        Ok(component)
    }
}

impl TimeZoneDef {
    pub fn build(&self, config: &EvaluationConfig) -> Result<TimeZone> {
        let mut tz = TimeZone::new(self.tzid.clone()).with_config(config.clone());
        for (index, def) in self.observances.iter().enumerate() {
            let observance = def
                .build()
                .with_context(|| format!("Invalid observance #{index}"))?;
            tz.add_observance(observance);
        }
        Ok(tz)
    }
}

impl ObservanceDef {
    pub fn build(&self) -> Result<Observance> {
        let offset_from = UtcOffset::parse(&self.offset_from)?;
        let offset_to = UtcOffset::parse(&self.offset_to)?;
        let mut observance = Observance::new(self.kind, parse_local(&self.start)?, offset_from, offset_to)?;

        if let Some(name) = &self.name {
            observance = observance.with_name(name.clone());
        }
        if let Some(rule) = &self.rrule {
            let zone = Zone::fixed(offset_from.to_fixed()?);
            observance = observance.with_rrule(rule.to_pattern(zone, true)?);
        }
        if !self.rdate.is_empty() {
            let onsets = self.rdate.iter().map(|s| parse_local(s)).collect::<Result<Vec<_>>>()?;
            observance = observance.with_rdates(onsets)?;
        }
        Ok(observance)
    }
}

impl RuleDef {
    /// Builds the pattern for a rule whose start is in `zone`. When the start
    /// has a time of day, a bare-date `until` covers that whole local day.
    pub fn to_pattern(&self, zone: Zone, timed: bool) -> Result<RecurrencePattern> {
        let mut pattern = RecurrencePattern::new(self.freq.parse::<Frequency>()?)
            .by_second(self.by_second.iter().copied())
            .by_minute(self.by_minute.iter().copied())
            .by_hour(self.by_hour.iter().copied())
            .by_day(self.by_day.iter().map(|d| d.parse::<NWeekday>()).collect::<Result<Vec<_>, _>>()?)
            .by_month_day(self.by_month_day.iter().copied())
            .by_year_day(self.by_year_day.iter().copied())
            .by_week_no(self.by_week_no.iter().copied())
            .by_month(self.by_month.iter().copied())
            .by_set_pos(self.by_set_pos.iter().copied());

        if let Some(interval) = self.interval {
            pattern = pattern.interval(interval);
        }
        if let Some(count) = self.count {
            pattern = pattern.count(count);
        }
        if let Some(until) = &self.until {
            let mut value = parse_value(until, zone)?;
            if timed && !value.has_time() {
                let last_second = value
                    .date_naive()
                    .and_hms_opt(23, 59, 59)
                    .with_context(|| format!("Invalid until '{until}'"))?;
                value = ZonedInstant::from_local(zone, last_second)?;
            }
            pattern = pattern.until(value);
        }
        if let Some(wkst) = &self.wkst {
            pattern = pattern.week_start(parse_weekday(wkst)?);
        }
        Ok(pattern)
    }
}

/// Parses an RFC 3339 instant, a local date-time in `zone`, or a bare date
/// (which yields a date-only value).
pub fn parse_value(s: &str, zone: Zone) -> Result<ZonedInstant> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(ZonedInstant::new(dt.with_timezone(&Utc), zone));
    }
    if let Ok(local) = parse_local(s) {
        return Ok(ZonedInstant::from_local(zone, local)?);
    }
    let date = parse_date(s)?;
    Ok(ZonedInstant::date(zone, date)?)
}

pub fn parse_local(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .with_context(|| format!("Invalid date-time '{s}', expected YYYY-MM-DDTHH:MM[:SS]"))
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

fn parse_periods(values: &[String], zone: Zone) -> Result<Vec<Period>> {
    values.iter().map(|s| parse_value(s, zone).map(Period::new)).collect()
}
