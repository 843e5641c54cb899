//! Windowed evaluation with an incremental period cache.
//!
//! A [`WindowedEvaluator`] remembers the span it has already evaluated and
//! only computes the parts of a requested window that fall outside it. The
//! cached span only ever widens until [`WindowedEvaluator::clear`] is called.

use chrono::Duration;

use crate::datetime::{Period, PeriodSet, ZonedInstant};
use crate::error::CoreError;
use crate::pattern::{Frequency, RecurrencePattern};

/// The span covered by an evaluator's cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationBounds {
    /// Nothing has been evaluated yet.
    #[default]
    Empty,
    /// `[start, end)` has been evaluated.
    Range { start: ZonedInstant, end: ZonedInstant },
}

impl EvaluationBounds {
    pub fn is_empty(&self) -> bool {
        matches!(self, EvaluationBounds::Empty)
    }

    pub fn start(&self) -> Option<&ZonedInstant> {
        match self {
            EvaluationBounds::Empty => None,
            EvaluationBounds::Range { start, .. } => Some(start),
        }
    }

    pub fn end(&self) -> Option<&ZonedInstant> {
        match self {
            EvaluationBounds::Empty => None,
            EvaluationBounds::Range { end, .. } => Some(end),
        }
    }

    /// Whether `[start, end)` lies entirely inside the evaluated span.
    pub fn covers(&self, start: &ZonedInstant, end: &ZonedInstant) -> bool {
        match self {
            EvaluationBounds::Empty => false,
            EvaluationBounds::Range { start: from, end: to } => from <= start && end <= to,
        }
    }

    fn widen(&mut self, start: &ZonedInstant, end: &ZonedInstant) {
        *self = match *self {
            EvaluationBounds::Empty => EvaluationBounds::Range { start: *start, end: *end },
            EvaluationBounds::Range { start: from, end: to } => EvaluationBounds::Range {
                start: from.min(*start),
                end: to.max(*end),
            },
        };
    }
}

/// Cache state shared by every evaluator: evaluated bounds and the periods
/// found so far.
#[derive(Debug, Clone, Default)]
pub struct WindowedEvaluator {
    bounds: EvaluationBounds,
    periods: PeriodSet,
    computations: usize,
}

impl WindowedEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bounds(&self) -> &EvaluationBounds {
        &self.bounds
    }

    #[inline]
    pub fn periods(&self) -> &PeriodSet {
        &self.periods
    }

    pub(crate) fn periods_mut(&mut self) -> &mut PeriodSet {
        &mut self.periods
    }

    /// Number of sub-windows computed since the last [`clear`](Self::clear).
    #[inline]
    pub fn computations(&self) -> usize {
        self.computations
    }

    /// Evaluates `[start, end)`, computing only what the cache lacks.
    ///
    /// `compute` produces the periods of one uncovered sub-window. When the
    /// cache is empty or the window abuts the cached span, the whole window is
    /// computed and the bounds widen to include it. Otherwise only
    /// `[start, cached start)` and `[cached end, end)` are computed; the
    /// cached middle is never derived again.
    ///
    /// Returns every cached period, which may reach beyond the requested
    /// window.
    pub fn evaluate<F>(&mut self, start: &ZonedInstant, end: &ZonedInstant, compute: &mut F) -> Result<&PeriodSet, CoreError>
    where
        F: FnMut(&ZonedInstant, &ZonedInstant) -> Result<Vec<Period>, CoreError>,
    {
        self.fill(start, end, compute)?;
        Ok(&self.periods)
    }

    fn fill<F>(&mut self, start: &ZonedInstant, end: &ZonedInstant, compute: &mut F) -> Result<(), CoreError>
    where
        F: FnMut(&ZonedInstant, &ZonedInstant) -> Result<Vec<Period>, CoreError>,
    {
        if start >= end {
            tracing::trace!(%start, %end, "empty window");
            return Ok(());
        }

        match self.bounds {
            EvaluationBounds::Empty => self.compute_window(start, end, compute),
            EvaluationBounds::Range { start: from, end: to } if *end == from || *start == to => {
                self.compute_window(start, end, compute)
            }
            EvaluationBounds::Range { start: from, end: to } => {
                if *start < from {
                    tracing::debug!(%start, cached_start = %from, "filling window before cache");
                    self.fill(start, &from, compute)?;
                }
                if *end > to {
                    tracing::debug!(cached_end = %to, %end, "filling window after cache");
                    self.fill(&to, end, compute)?;
                }
                Ok(())
            }
        }
    }

    fn compute_window<F>(&mut self, start: &ZonedInstant, end: &ZonedInstant, compute: &mut F) -> Result<(), CoreError>
    where
        F: FnMut(&ZonedInstant, &ZonedInstant) -> Result<Vec<Period>, CoreError>,
    {
        let periods = compute(start, end)?;
        tracing::debug!(%start, %end, found = periods.len(), "evaluated window");
        self.periods.extend(periods);
        self.bounds.widen(start, end);
        self.computations += 1;
        Ok(())
    }

    /// Resets the bounds to empty and forgets every period.
    pub fn clear(&mut self) {
        self.bounds = EvaluationBounds::Empty;
        self.periods.clear();
        self.computations = 0;
    }
}

/// Advances `current` by `interval` units of the pattern's frequency.
///
/// Seconds through weeks add a fixed duration. Months and years add whole
/// calendar months or years to the local date, keep the original wall-clock
/// time and resolve the zone's offset anew for the resulting date.
///
/// # Errors
/// - [`CoreError::NonPositiveInterval`] if `interval <= 0`
/// - [`CoreError::UndefinedFrequency`] for [`Frequency::Undefined`]
/// - [`CoreError::InvalidLocalTime`] if the result leaves the representable range
pub fn step_instant(current: &ZonedInstant, pattern: &RecurrencePattern, interval: i32) -> Result<ZonedInstant, CoreError> {
    if interval <= 0 {
        return Err(CoreError::NonPositiveInterval(interval));
    }

    let n = i64::from(interval);
    match pattern.frequency {
        Frequency::Secondly => current.checked_add(Duration::seconds(n)),
        Frequency::Minutely => current.checked_add(Duration::minutes(n)),
        Frequency::Hourly => current.checked_add(Duration::hours(n)),
        Frequency::Daily => current.checked_add(Duration::days(n)),
        Frequency::Weekly => current.checked_add(Duration::weeks(n)),
        Frequency::Monthly => current.add_months(interval),
        Frequency::Yearly => current.add_years(interval),
        Frequency::Undefined => Err(CoreError::UndefinedFrequency),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timezone::{resolve_zone, Zone};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn at(y: i32, m: u32, d: u32) -> ZonedInstant {
        ZonedInstant::utc(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    /// Emits one period per day at midnight and records every window computed.
    fn daily(log: &mut Vec<(ZonedInstant, ZonedInstant)>) -> impl FnMut(&ZonedInstant, &ZonedInstant) -> Result<Vec<Period>, CoreError> + '_ {
        move |start: &ZonedInstant, end: &ZonedInstant| {
            log.push((*start, *end));
            let mut periods = Vec::new();
            let mut current = *start;
            while current < *end {
                periods.push(Period::new(current));
                current = current + Duration::days(1);
            }
            Ok(periods)
        }
    }

    #[test]
    fn test_first_evaluation_computes_window() {
        let mut log = Vec::new();
        let mut evaluator = WindowedEvaluator::new();
        let periods = evaluator.evaluate(&at(2024, 1, 1), &at(2024, 1, 5), &mut daily(&mut log)).unwrap();
        assert_eq!(periods.len(), 4);
        assert_eq!(log, vec![(at(2024, 1, 1), at(2024, 1, 5))]);
        assert_eq!(evaluator.bounds().start(), Some(&at(2024, 1, 1)));
        assert_eq!(evaluator.bounds().end(), Some(&at(2024, 1, 5)));
    }

    #[test]
    fn test_abutting_windows_extend_cache() {
        let mut log = Vec::new();
        let mut evaluator = WindowedEvaluator::new();
        let mut compute = daily(&mut log);
        evaluator.evaluate(&at(2024, 1, 5), &at(2024, 1, 10), &mut compute).unwrap();
        evaluator.evaluate(&at(2024, 1, 10), &at(2024, 1, 12), &mut compute).unwrap();
        evaluator.evaluate(&at(2024, 1, 1), &at(2024, 1, 5), &mut compute).unwrap();
        drop(compute);

        assert_eq!(log.len(), 3);
        assert_eq!(evaluator.periods().len(), 11);
        assert!(evaluator.bounds().covers(&at(2024, 1, 1), &at(2024, 1, 12)));
    }

    #[test]
    fn test_covering_window_fills_both_gaps_only() {
        let mut log = Vec::new();
        let mut evaluator = WindowedEvaluator::new();
        let mut compute = daily(&mut log);
        evaluator.evaluate(&at(2024, 1, 10), &at(2024, 1, 20), &mut compute).unwrap();
        evaluator.evaluate(&at(2024, 1, 1), &at(2024, 1, 31), &mut compute).unwrap();
        drop(compute);

        assert_eq!(
            log,
            vec![
                (at(2024, 1, 10), at(2024, 1, 20)),
                (at(2024, 1, 1), at(2024, 1, 10)),
                (at(2024, 1, 20), at(2024, 1, 31)),
            ]
        );
        assert_eq!(evaluator.periods().len(), 30);
    }

    #[test]
    fn test_disjoint_window_fills_gap() {
        let mut log = Vec::new();
        let mut evaluator = WindowedEvaluator::new();
        let mut compute = daily(&mut log);
        evaluator.evaluate(&at(2024, 1, 1), &at(2024, 1, 5), &mut compute).unwrap();
        evaluator.evaluate(&at(2024, 2, 1), &at(2024, 2, 3), &mut compute).unwrap();
        drop(compute);

        assert_eq!(log[1], (at(2024, 1, 5), at(2024, 2, 3)));
        assert!(evaluator.bounds().covers(&at(2024, 1, 1), &at(2024, 2, 3)));
    }

    #[test]
    fn test_covered_window_computes_nothing() {
        let mut log = Vec::new();
        let mut evaluator = WindowedEvaluator::new();
        let mut compute = daily(&mut log);
        evaluator.evaluate(&at(2024, 1, 1), &at(2024, 1, 31), &mut compute).unwrap();
        evaluator.evaluate(&at(2024, 1, 3), &at(2024, 1, 7), &mut compute).unwrap();
        drop(compute);

        assert_eq!(log.len(), 1);
        assert_eq!(evaluator.computations(), 1);
    }

    #[test]
    fn test_failed_computation_leaves_cache_untouched() {
        let mut evaluator = WindowedEvaluator::new();
        let result = evaluator.evaluate(&at(2024, 1, 1), &at(2024, 1, 2), &mut |_: &ZonedInstant, _: &ZonedInstant| {
            Err(CoreError::UndefinedFrequency)
        });
        assert_eq!(result.unwrap_err(), CoreError::UndefinedFrequency);
        assert!(evaluator.bounds().is_empty());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut log = Vec::new();
        let mut evaluator = WindowedEvaluator::new();
        evaluator.evaluate(&at(2024, 1, 1), &at(2024, 1, 5), &mut daily(&mut log)).unwrap();
        evaluator.clear();
        assert!(evaluator.bounds().is_empty());
        assert!(evaluator.periods().is_empty());
        assert_eq!(evaluator.computations(), 0);
    }

    #[test]
    fn test_step_monthly_respects_month_length() {
        let start = ZonedInstant::utc(Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap());
        let pattern = RecurrencePattern::new(Frequency::Monthly);
        let next = step_instant(&start, &pattern, 1).unwrap();
        assert_eq!(next, ZonedInstant::utc(Utc.with_ymd_and_hms(2024, 2, 29, 9, 0, 0).unwrap()));
    }

    #[test]
    fn test_step_yearly_crosses_dst_keeping_wall_clock() {
        let zone = resolve_zone("Europe/Berlin").unwrap();
        let winter = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let start = ZonedInstant::from_local(zone, winter).unwrap();
        let pattern = RecurrencePattern::new(Frequency::Monthly);
        let summer = step_instant(&start, &pattern, 7).unwrap();
        assert_eq!(summer.hour(), 9);
        assert_eq!(summer.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(step_instant(&start, &RecurrencePattern::new(Frequency::Yearly), 1).unwrap().year(), 2024);
    }

    #[test]
    fn test_step_fixed_durations() {
        let start = at(2024, 1, 1);
        let step = |frequency| step_instant(&start, &RecurrencePattern::new(frequency), 2).unwrap();
        assert_eq!(step(Frequency::Secondly), start + Duration::seconds(2));
        assert_eq!(step(Frequency::Minutely), start + Duration::minutes(2));
        assert_eq!(step(Frequency::Hourly), start + Duration::hours(2));
        assert_eq!(step(Frequency::Daily), at(2024, 1, 3));
        assert_eq!(step(Frequency::Weekly), at(2024, 1, 15));
        assert_eq!(step(Frequency::Daily).zone(), Zone::Utc);
    }

    #[test]
    fn test_step_rejects_non_positive_interval() {
        let pattern = RecurrencePattern::new(Frequency::Daily);
        assert_eq!(step_instant(&at(2024, 1, 1), &pattern, 0), Err(CoreError::NonPositiveInterval(0)));
        assert_eq!(step_instant(&at(2024, 1, 1), &pattern, -3), Err(CoreError::NonPositiveInterval(-3)));
    }

    #[test]
    fn test_step_rejects_undefined_frequency() {
        let pattern = RecurrencePattern::default();
        assert_eq!(step_instant(&at(2024, 1, 1), &pattern, 1), Err(CoreError::UndefinedFrequency));
    }

    #[test]
    fn test_step_past_representable_range_fails() {
        let pattern = RecurrencePattern::new(Frequency::Weekly);
        assert!(matches!(step_instant(&at(2024, 1, 1), &pattern, i32::MAX), Err(CoreError::InvalidLocalTime(_))));
        assert!(step_instant(&at(2024, 1, 1), &RecurrencePattern::new(Frequency::Yearly), i32::MAX).is_err());
    }
}
