//! Time zone resolution.
//!
//! A [`Zone`] is the concrete offset timetable a [`ZonedInstant`](crate::datetime::ZonedInstant)
//! is expressed in. Identifiers are resolved by [`resolve_zone`], which tries the
//! IANA database, then host-native names, then a `-` to `/` normalized form.

use chrono::{DateTime, Duration, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use crate::error::CoreError;

/// Process-wide cache of resolved identifiers.
static ZONE_CACHE: OnceLock<Mutex<HashMap<String, Zone>>> = OnceLock::new();

/// IANA names that all denote universal time.
const UTC_ALIASES: &[&str] = &[
    "UTC", "Etc/UTC", "Etc/UCT", "UCT", "Etc/Universal", "Universal", "Etc/Zulu", "Zulu",
];

/// Host-native (Windows registry) zone names mapped to their IANA equivalents.
const WINDOWS_ZONES: &[(&str, &str)] = &[
    ("Dateline Standard Time", "Etc/GMT+12"),
    ("Hawaiian Standard Time", "Pacific/Honolulu"),
    ("Alaskan Standard Time", "America/Anchorage"),
    ("Pacific Standard Time", "America/Los_Angeles"),
    ("US Mountain Standard Time", "America/Phoenix"),
    ("Mountain Standard Time", "America/Denver"),
    ("Central Standard Time", "America/Chicago"),
    ("Eastern Standard Time", "America/New_York"),
    ("Atlantic Standard Time", "America/Halifax"),
    ("Newfoundland Standard Time", "America/St_Johns"),
    ("E. South America Standard Time", "America/Sao_Paulo"),
    ("GMT Standard Time", "Europe/London"),
    ("Greenwich Standard Time", "Atlantic/Reykjavik"),
    ("W. Europe Standard Time", "Europe/Berlin"),
    ("Romance Standard Time", "Europe/Paris"),
    ("Central Europe Standard Time", "Europe/Budapest"),
    ("GTB Standard Time", "Europe/Bucharest"),
    ("FLE Standard Time", "Europe/Kiev"),
    ("Russian Standard Time", "Europe/Moscow"),
    ("Arabian Standard Time", "Asia/Dubai"),
    ("India Standard Time", "Asia/Kolkata"),
    ("China Standard Time", "Asia/Shanghai"),
    ("Singapore Standard Time", "Asia/Singapore"),
    ("Tokyo Standard Time", "Asia/Tokyo"),
    ("Korea Standard Time", "Asia/Seoul"),
    ("AUS Eastern Standard Time", "Australia/Sydney"),
    ("New Zealand Standard Time", "Pacific/Auckland"),
];

/// Prefixes some calendar clients put in front of IANA names.
const VENDOR_PREFIXES: &[&str] = &["/mozilla.org/20050126_1/", "/mozilla.org/", "/softwarestudio.org/"];

/// A concrete offset timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Universal time.
    Utc,
    /// A zone from the IANA database.
    Named(Tz),
    /// A constant offset, used for time zone observances whose wall clock
    /// is defined by a `TZOFFSETFROM` value.
    Fixed(FixedOffset),
}

impl Zone {
    /// Wraps an IANA zone, folding the universal-time aliases into [`Zone::Utc`].
    pub fn from_tz(tz: Tz) -> Self {
        if UTC_ALIASES.contains(&tz.name()) {
            Zone::Utc
        } else {
            Zone::Named(tz)
        }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        if offset.local_minus_utc() == 0 {
            Zone::Utc
        } else {
            Zone::Fixed(offset)
        }
    }

    /// Canonical identifier of this zone.
    pub fn name(&self) -> String {
        match self {
            Zone::Utc => "UTC".to_string(),
            Zone::Named(tz) => tz.name().to_string(),
            Zone::Fixed(offset) => format!("UTC{offset}"),
        }
    }

    #[inline]
    pub fn is_utc(&self) -> bool {
        matches!(self, Zone::Utc)
    }

    /// UTC offset in effect at the given instant.
    pub fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        match self {
            Zone::Utc => Utc.fix(),
            Zone::Named(tz) => tz.offset_from_utc_datetime(&instant.naive_utc()).fix(),
            Zone::Fixed(offset) => *offset,
        }
    }

    /// Wall-clock value of the given instant in this zone.
    pub fn local(&self, instant: &DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset_at(instant)).naive_local()
    }

    /// Abbreviation in effect at the given instant (e.g. "EST", "CEST").
    pub fn abbreviation_at(&self, instant: &DateTime<Utc>) -> String {
        match self {
            Zone::Utc => "UTC".to_string(),
            Zone::Named(tz) => instant.with_timezone(tz).format("%Z").to_string(),
            Zone::Fixed(offset) => offset.to_string(),
        }
    }

    /// All instants whose wall-clock value in this zone is `local`.
    pub fn from_local(&self, local: &NaiveDateTime) -> LocalResult<DateTime<Utc>> {
        match self {
            Zone::Utc => LocalResult::Single(Utc.from_utc_datetime(local)),
            Zone::Named(tz) => tz.from_local_datetime(local).map(|dt| dt.with_timezone(&Utc)),
            Zone::Fixed(offset) => offset.from_local_datetime(local).map(|dt| dt.with_timezone(&Utc)),
        }
    }

    /// Places a wall-clock value in this zone.
    ///
    /// Ambiguous values (DST fold) take the earlier instant. Values inside a
    /// DST gap are interpreted with the offset in effect before the gap, so
    /// 02:30 on a spring-forward night becomes 03:30 of the new offset.
    pub fn resolve_local(&self, local: &NaiveDateTime) -> Result<DateTime<Utc>, CoreError> {
        match self.from_local(local) {
            LocalResult::Single(dt) => Ok(dt),
            LocalResult::Ambiguous(earliest, _) => Ok(earliest),
            LocalResult::None => {
                let probe = Utc.from_utc_datetime(&(*local - Duration::days(1)));
                let before = self.offset_at(&probe);
                let shifted = Utc.from_utc_datetime(&(*local - Duration::seconds(i64::from(before.local_minus_utc()))));
                if self.offset_at(&shifted) == before {
                    return Err(CoreError::InvalidLocalTime(format!("{local} in {self}")));
                }
                tracing::warn!(zone = %self, %local, resolved = %shifted, "local time falls in a DST gap");
                Ok(shifted)
            }
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Zone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve_zone(s)
    }
}

/// Resolves a textual zone identifier.
///
/// Sources are tried in order: the IANA database, host-native names
/// (Windows registry names, vendor-prefixed identifiers and the host's own
/// local zone), and finally the identifier with `-` replaced by `/`.
/// Successful resolutions are cached for the lifetime of the process.
pub fn resolve_zone(id: &str) -> Result<Zone, CoreError> {
    let cache = ZONE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    if let Ok(cache) = cache.lock() {
        if let Some(zone) = cache.get(id) {
            return Ok(*zone);
        }
    }

    let zone = iana_lookup(id)
        .or_else(|| host_native_lookup(id))
        .or_else(|| normalized_lookup(id))
        .ok_or_else(|| CoreError::UnrecognizedTimeZone(id.to_string()))?;

    tracing::trace!(id, zone = %zone, "resolved time zone");
    if let Ok(mut cache) = cache.lock() {
        cache.insert(id.to_string(), zone);
    }
    Ok(zone)
}

fn iana_lookup(id: &str) -> Option<Zone> {
    let id = id.trim();
    if id == "Z" {
        return Some(Zone::Utc);
    }
    Tz::from_str(id).ok().map(Zone::from_tz)
}

fn host_native_lookup(id: &str) -> Option<Zone> {
    let id = id.trim();
    if id.eq_ignore_ascii_case("local") || id.eq_ignore_ascii_case("localtime") {
        return iana_time_zone::get_timezone().ok().and_then(|host| iana_lookup(&host));
    }

    if let Some((_, iana)) = WINDOWS_ZONES.iter().find(|(windows, _)| windows.eq_ignore_ascii_case(id)) {
        return iana_lookup(iana);
    }

    VENDOR_PREFIXES
        .iter()
        .find_map(|prefix| id.strip_prefix(prefix))
        .and_then(iana_lookup)
}

fn normalized_lookup(id: &str) -> Option<Zone> {
    iana_lookup(&id.replace('-', "/"))
}

/// Detects the host's zone, falling back to UTC when detection fails.
pub fn detect_host_zone() -> Zone {
    if let Ok(tz) = std::env::var("TZ") {
        if let Ok(zone) = resolve_zone(&tz) {
            return zone;
        }
    }

    iana_time_zone::get_timezone()
        .ok()
        .and_then(|host| resolve_zone(&host).ok())
        .unwrap_or(Zone::Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_resolve_iana() {
        assert_eq!(resolve_zone("America/New_York").unwrap(), Zone::Named(Tz::America__New_York));
        assert_eq!(resolve_zone("Europe/Berlin").unwrap().name(), "Europe/Berlin");
    }

    #[test]
    fn test_resolve_utc_aliases() {
        assert_eq!(resolve_zone("UTC").unwrap(), Zone::Utc);
        assert_eq!(resolve_zone("Etc/UTC").unwrap(), Zone::Utc);
        assert_eq!(resolve_zone("Z").unwrap(), Zone::Utc);
        assert!(resolve_zone("UTC").unwrap().is_utc());
    }

    #[test]
    fn test_resolve_host_native_names() {
        assert_eq!(
            resolve_zone("Eastern Standard Time").unwrap(),
            Zone::Named(Tz::America__New_York)
        );
        assert_eq!(
            resolve_zone("/mozilla.org/20050126_1/Europe/Paris").unwrap(),
            Zone::Named(Tz::Europe__Paris)
        );
    }

    #[test]
    fn test_resolve_normalized_name() {
        assert_eq!(resolve_zone("America-Chicago").unwrap(), Zone::Named(Tz::America__Chicago));
    }

    #[test]
    fn test_resolve_unrecognized() {
        let result = resolve_zone("Not/AZone");
        assert!(matches!(result, Err(CoreError::UnrecognizedTimeZone(id)) if id == "Not/AZone"));
    }

    #[test]
    fn test_offset_at_follows_dst() {
        let zone = resolve_zone("America/New_York").unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();
        assert_eq!(zone.offset_at(&winter).local_minus_utc(), -5 * 3600);
        assert_eq!(zone.offset_at(&summer).local_minus_utc(), -4 * 3600);
        assert_eq!(zone.abbreviation_at(&summer), "EDT");
    }

    #[test]
    fn test_resolve_local_in_gap_uses_offset_before() {
        let zone = resolve_zone("America/New_York").unwrap();
        let resolved = zone.resolve_local(&naive(2024, 3, 10, 2, 30)).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).unwrap());
        assert_eq!(zone.local(&resolved), naive(2024, 3, 10, 3, 30));
    }

    #[test]
    fn test_resolve_local_in_fold_takes_earliest() {
        let zone = resolve_zone("America/New_York").unwrap();
        let resolved = zone.resolve_local(&naive(2024, 11, 3, 1, 30)).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());
    }

    #[test]
    fn test_fixed_zone() {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let zone = Zone::fixed(offset);
        assert_eq!(zone.name(), "UTC+05:30");
        assert_eq!(Zone::fixed(FixedOffset::east_opt(0).unwrap()), Zone::Utc);
        let instant = zone.resolve_local(&naive(2024, 1, 1, 12, 0)).unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2024, 1, 1, 6, 30, 0).unwrap());
    }
}
