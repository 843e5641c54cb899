//! # Cadence Core Library
//!
//! Windowed, cache-coherent evaluation of RFC 5545 recurrence sets
//! (RRULE, RDATE, EXRULE, EXDATE) and VTIMEZONE observances.
//!
//! ## Features
//!
//! - **Incremental Evaluation**: Every evaluator remembers the span it has
//!   computed and only derives what a new query window adds
//! - **Calendar-Correct Stepping**: Months and years advance by calendar
//!   arithmetic, keeping wall-clock time across DST and short months
//! - **Full BYxxx Filtering**: BYDAY ordinals, BYMONTHDAY, BYYEARDAY,
//!   BYWEEKNO, BYMONTH, BYSETPOS, COUNT and UNTIL per RFC 5545
//! - **Set Algebra**: `(RRULE ∪ RDATE) \ (EXRULE ∪ EXDATE)` with date-only
//!   exclusions removing whole days
//! - **Stitched Time Zones**: Observance onsets joined into a contiguous,
//!   non-overlapping offset timeline
//! - **Zone Resolution**: IANA, host-native and normalized identifiers
//!
//! ## Core Modules
//!
//! - [`timezone`]: Zone resolution and the [`Zone`](timezone::Zone) value
//! - [`datetime`]: Zone-aware instants, periods and occurrences
//! - [`pattern`]: Recurrence patterns and their filter parts
//! - [`evaluator`]: The windowed evaluation cache and frequency stepping
//! - [`recurrence`]: Single-rule expansion
//! - [`recurring`]: Recurrence sets and recurring components
//! - [`vtimezone`]: Observances and stitched time zones
//! - [`config`]: Evaluation limits
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use cadence_core::{
//!     datetime::{Period, ZonedInstant},
//!     pattern::{Frequency, RecurrencePattern},
//!     recurring::{ComponentKind, RecurringComponent},
//!     timezone::resolve_zone,
//! };
//! use chrono::NaiveDate;
//!
//! fn main() -> Result<(), cadence_core::error::CoreError> {
//!     let zone = resolve_zone("America/New_York")?;
//!     let at = |d: u32| NaiveDate::from_ymd_opt(2024, 1, d).and_then(|date| date.and_hms_opt(9, 0, 0));
//!     let start = ZonedInstant::from_local(zone, at(1).unwrap())?;
//!
//!     let mut standup = RecurringComponent::new("standup", ComponentKind::Event, start);
//!     standup.add_rrule(RecurrencePattern::new(Frequency::Daily));
//!     let day_off = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
//!     standup.add_exdate([Period::new(ZonedInstant::date(zone, day_off)?)]);
//!
//!     let end = ZonedInstant::from_local(zone, at(6).unwrap())?;
//!     for occurrence in standup.get_occurrences(&start, &end)? {
//!         println!("{}", occurrence.period);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod datetime;
pub mod error;
pub mod evaluator;
pub mod pattern;
pub mod recurrence;
pub mod recurring;
pub mod timezone;
pub mod vtimezone;
