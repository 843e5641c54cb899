//! Recurring entities: the RRULE / RDATE / EXRULE / EXDATE algebra and the
//! calendar components built on it.

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EvaluationConfig;
use crate::datetime::{Occurrence, Owner, Period, PeriodSet, Reference, Source, ZonedInstant};
use crate::error::CoreError;
use crate::evaluator::{EvaluationBounds, WindowedEvaluator};
use crate::pattern::RecurrencePattern;
use crate::recurrence;

/// One rule of a recurrence set.
#[derive(Debug, Clone, PartialEq)]
pub enum RecurrenceRule {
    RRule(RecurrencePattern),
    RDate(Vec<Period>),
    ExRule(RecurrencePattern),
    ExDate(Vec<Period>),
}

impl RecurrenceRule {
    /// Position in the fixed evaluation order: inclusions before exclusions.
    fn order(&self) -> u8 {
        match self {
            RecurrenceRule::RRule(_) => 0,
            RecurrenceRule::RDate(_) => 1,
            RecurrenceRule::ExRule(_) => 2,
            RecurrenceRule::ExDate(_) => 3,
        }
    }

    pub fn is_exclusion(&self) -> bool {
        matches!(self, RecurrenceRule::ExRule(_) | RecurrenceRule::ExDate(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecurrenceRule::RRule(_) => "RRULE",
            RecurrenceRule::RDate(_) => "RDATE",
            RecurrenceRule::ExRule(_) => "EXRULE",
            RecurrenceRule::ExDate(_) => "EXDATE",
        }
    }

    /// Periods this rule contributes to `[start, end)`.
    ///
    /// Exclusions are widened back to the start of the first day, in the
    /// anchor's zone, so a date-only exclusion still reaches occurrences
    /// later that day. Values
    /// without a time of day come back marked to match by date only.
    pub fn evaluate(
        &self,
        anchor: &ZonedInstant,
        start: &ZonedInstant,
        end: &ZonedInstant,
        config: &EvaluationConfig,
    ) -> Result<Vec<Period>, CoreError> {
        let periods = match self {
            RecurrenceRule::RRule(pattern) => recurrence::expand(anchor, pattern, start, end, config)?
                .into_iter()
                .map(Period::new)
                .collect(),
            RecurrenceRule::RDate(periods) => periods
                .iter()
                .filter(|period| start <= period.start() && period.start() < end)
                .cloned()
                .collect(),
            RecurrenceRule::ExRule(pattern) => {
                let day_start = start.with_zone(anchor.zone()).start_of_day()?;
                recurrence::expand(anchor, pattern, &day_start, end, config)?
                    .into_iter()
                    .map(|instant| date_only_if_untimed(Period::new(instant)))
                    .collect()
            }
            RecurrenceRule::ExDate(periods) => periods.iter().cloned().map(date_only_if_untimed).collect(),
        };
        Ok(periods)
    }
}

fn date_only_if_untimed(mut period: Period) -> Period {
    if !period.start().has_time() {
        period.set_matches_date_only(true);
    }
    period
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceRule::RRule(pattern) | RecurrenceRule::ExRule(pattern) => write!(f, "{}:{pattern}", self.name()),
            RecurrenceRule::RDate(periods) | RecurrenceRule::ExDate(periods) => {
                let values: Vec<String> = periods.iter().map(ToString::to_string).collect();
                write!(f, "{}:{}", self.name(), values.join(","))
            }
        }
    }
}

/// The anchor and rules of a recurring entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Recurrence {
    start: ZonedInstant,
    rules: Vec<RecurrenceRule>,
}

impl Recurrence {
    pub fn new(start: ZonedInstant) -> Self {
        Self { start, rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: RecurrenceRule) -> Self {
        self.rules.push(rule);
        self
    }

    #[inline]
    pub fn start(&self) -> &ZonedInstant {
        &self.start
    }

    #[inline]
    pub fn rules(&self) -> &[RecurrenceRule] {
        &self.rules
    }

    /// Whether the entity produces more than its anchor.
    pub fn is_recurring(&self) -> bool {
        self.rules.iter().any(|rule| !rule.is_exclusion())
    }

    pub(crate) fn push(&mut self, rule: RecurrenceRule) {
        self.rules.push(rule);
    }

    fn remove(&mut self, index: usize) -> Option<RecurrenceRule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    fn set_start(&mut self, start: ZonedInstant) {
        self.start = start;
    }
}

/// An entity exposing a recurrence set.
pub trait Recurrable {
    fn recurrence(&self) -> &Recurrence;

    /// The anchor start (DTSTART).
    fn start(&self) -> &ZonedInstant {
        self.recurrence().start()
    }
}

/// Evaluates a [`Recurrence`] with a window cache for the combined result
/// and one for every rule.
///
/// The caches belong to the single recurrence held by the owning component
/// or observance, which clears them whenever its rules change.
#[derive(Debug, Clone, Default)]
pub struct RecurringEvaluator {
    window: WindowedEvaluator,
    rule_windows: Vec<WindowedEvaluator>,
}

impl RecurringEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bounds(&self) -> &EvaluationBounds {
        self.window.bounds()
    }

    #[inline]
    pub fn periods(&self) -> &PeriodSet {
        self.window.periods()
    }

    /// Combines the rules of `recurrence` over `[start, end)`:
    /// `(RRULE ∪ RDATE) \ (EXRULE ∪ EXDATE)`.
    ///
    /// # Arguments
    /// * `recurrence` - Anchor and rules to evaluate
    /// * `start` - Inclusive window start
    /// * `end` - Exclusive window end
    /// * `include_reference` - Whether the anchor itself belongs to the set
    /// * `config` - Evaluation limits
    ///
    /// # Returns
    /// * `Result<&PeriodSet, CoreError>` - Every cached period, possibly
    ///   wider than the window
    ///
    /// # Behavior
    /// - Rules run in the order RRULE, RDATE, EXRULE, EXDATE
    /// - Each rule is evaluated through its own window cache
    /// - Exclusions remove by period equality, so date-only values remove
    ///   every occurrence on their date
    /// - Any failing rule aborts the whole evaluation
    pub(crate) fn evaluate(
        &mut self,
        recurrence: &Recurrence,
        start: &ZonedInstant,
        end: &ZonedInstant,
        include_reference: bool,
        config: &EvaluationConfig,
    ) -> Result<&PeriodSet, CoreError> {
        let Self { window, rule_windows } = self;
        if rule_windows.len() != recurrence.rules.len() {
            window.clear();
            rule_windows.clear();
            rule_windows.resize_with(recurrence.rules.len(), WindowedEvaluator::new);
        }

        let anchor = recurrence.start();
        let mut order: Vec<usize> = (0..recurrence.rules.len()).collect();
        order.sort_by_key(|&index| recurrence.rules[index].order());

        let mut compute = |from: &ZonedInstant, to: &ZonedInstant| -> Result<Vec<Period>, CoreError> {
            let mut included = PeriodSet::new();
            let mut excluded = PeriodSet::new();

            for &index in &order {
                let rule = &recurrence.rules[index];
                let periods = rule_windows[index].evaluate(from, to, &mut |s: &ZonedInstant, e: &ZonedInstant| {
                    rule.evaluate(anchor, s, e, config)
                })?;
                tracing::trace!(rule = rule.name(), cached = periods.len(), "evaluated rule");
                if rule.is_exclusion() {
                    excluded.extend(periods.iter().cloned());
                } else {
                    included.extend(periods.range(from, to).cloned());
                }
            }

            if include_reference && from <= anchor && anchor < to {
                included.insert(Period::new(*anchor));
            }
            let removed = included.subtract(&excluded);
            tracing::debug!(%from, %to, included = included.len(), removed, "combined recurrence set");
            Ok(included.iter().cloned().collect())
        };

        window.evaluate(start, end, &mut compute)
    }

    /// Forgets every cached period, combined and per rule.
    pub fn clear(&mut self) {
        self.window.clear();
        self.rule_windows.clear();
    }
}

/// The kind of calendar component a recurrence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    #[default]
    Event,
    Todo,
    Journal,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Event => "VEVENT",
            ComponentKind::Todo => "VTODO",
            ComponentKind::Journal => "VJOURNAL",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring event, to-do or journal entry owning its evaluator.
#[derive(Debug, Clone)]
pub struct RecurringComponent {
    uid: String,
    kind: ComponentKind,
    recurrence: Recurrence,
    duration: Option<Duration>,
    evaluator: RecurringEvaluator,
    config: EvaluationConfig,
}

impl RecurringComponent {
    pub fn new(uid: impl Into<String>, kind: ComponentKind, start: ZonedInstant) -> Self {
        Self {
            uid: uid.into(),
            kind,
            recurrence: Recurrence::new(start),
            duration: None,
            evaluator: RecurringEvaluator::new(),
            config: EvaluationConfig::default(),
        }
    }

    /// Gives every produced period `end = start + duration`.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_config(mut self, config: EvaluationConfig) -> Self {
        self.config = config;
        self.evaluator.clear();
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn evaluated_bounds(&self) -> &EvaluationBounds {
        self.evaluator.bounds()
    }

    pub fn set_start(&mut self, start: ZonedInstant) {
        self.recurrence.set_start(start);
        self.evaluator.clear();
    }

    pub fn add_rrule(&mut self, pattern: RecurrencePattern) {
        self.add_rule(RecurrenceRule::RRule(pattern));
    }

    pub fn add_rdate(&mut self, periods: impl IntoIterator<Item = Period>) {
        self.add_rule(RecurrenceRule::RDate(periods.into_iter().collect()));
    }

    pub fn add_exrule(&mut self, pattern: RecurrencePattern) {
        self.add_rule(RecurrenceRule::ExRule(pattern));
    }

    pub fn add_exdate(&mut self, periods: impl IntoIterator<Item = Period>) {
        self.add_rule(RecurrenceRule::ExDate(periods.into_iter().collect()));
    }

    pub fn add_rule(&mut self, rule: RecurrenceRule) {
        self.recurrence.push(rule);
        self.evaluator.clear();
    }

    pub fn remove_rule(&mut self, index: usize) -> Option<RecurrenceRule> {
        let removed = self.recurrence.remove(index);
        if removed.is_some() {
            self.evaluator.clear();
        }
        removed
    }

    /// Drops every cached evaluation result.
    pub fn clear_evaluation(&mut self) {
        self.evaluator.clear();
    }

    /// Evaluates the component's recurrence set over `[start, end)`,
    /// attaching this component to `reference` if it has no owner yet.
    pub fn evaluate(&mut self, reference: &mut Reference, start: &ZonedInstant, end: &ZonedInstant) -> Result<&PeriodSet, CoreError> {
        reference.attach_if_unowned(Owner::Component(self.uid.clone()));
        self.evaluator.evaluate(&self.recurrence, start, end, true, &self.config)
    }

    /// Occurrences starting in `[start, end)`, sorted by start.
    pub fn get_occurrences(&mut self, start: &ZonedInstant, end: &ZonedInstant) -> Result<Vec<Occurrence>, CoreError> {
        let mut reference = Reference::new(*self.recurrence.start());
        let duration = self.duration;
        let source = Source::Component { uid: self.uid.clone() };
        let periods = self.evaluate(&mut reference, start, end)?;

        periods
            .range(start, end)
            .map(|period| {
                let period = match (duration, period.end()) {
                    (Some(duration), None) => Period::with_duration(*period.start(), duration)?,
                    _ => period.clone(),
                };
                Ok(Occurrence::new(source.clone(), period))
            })
            .collect()
    }

    /// Occurrences starting on `date`, a calendar day in the zone of the
    /// component's start.
    pub fn get_occurrences_on(&mut self, date: NaiveDate) -> Result<Vec<Occurrence>, CoreError> {
        let zone = self.recurrence.start().zone();
        let next = date
            .succ_opt()
            .ok_or_else(|| CoreError::InvalidInput(format!("no day follows {date}")))?;
        let start = ZonedInstant::from_local(zone, date.and_time(NaiveTime::MIN))?;
        let end = ZonedInstant::from_local(zone, next.and_time(NaiveTime::MIN))?;
        self.get_occurrences(&start, &end)
    }
}

impl Recurrable for RecurringComponent {
    fn recurrence(&self) -> &Recurrence {
        &self.recurrence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{Frequency, NWeekday};
    use crate::timezone::{resolve_zone, Zone};
    use chrono::{TimeZone, Utc, Weekday};

    fn utc(y: i32, m: u32, d: u32, h: u32) -> ZonedInstant {
        ZonedInstant::utc(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
    }

    fn day(y: i32, m: u32, d: u32) -> ZonedInstant {
        ZonedInstant::date(Zone::Utc, NaiveDate::from_ymd_opt(y, m, d).unwrap()).unwrap()
    }

    fn starts(occurrences: &[Occurrence]) -> Vec<ZonedInstant> {
        occurrences.iter().map(|o| *o.start()).collect()
    }

    fn standup() -> RecurringComponent {
        let mut component = RecurringComponent::new("standup", ComponentKind::Event, utc(2024, 1, 1, 9));
        component.add_rrule(RecurrencePattern::new(Frequency::Daily));
        component
    }

    mod algebra_tests {
        use super::*;

        #[test]
        fn test_date_only_exdate_removes_whole_day() {
            let mut component = standup();
            component.add_exdate([Period::new(day(2024, 1, 3))]);
            let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 6, 0)).unwrap();
            assert_eq!(
                starts(&found),
                vec![utc(2024, 1, 1, 9), utc(2024, 1, 2, 9), utc(2024, 1, 4, 9), utc(2024, 1, 5, 9)]
            );
        }

        #[test]
        fn test_timed_exdate_must_match_exactly() {
            let mut component = standup();
            component.add_exdate([Period::new(utc(2024, 1, 3, 10))]);
            let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 6, 0)).unwrap();
            assert_eq!(found.len(), 5);
        }

        #[test]
        fn test_rdate_adds_and_exrule_removes() {
            let mut component = standup();
            component.add_rdate([Period::new(utc(2024, 1, 2, 15))]);
            component.add_exrule(
                RecurrencePattern::new(Frequency::Weekly).by_day([NWeekday::every(Weekday::Wed)]),
            );
            let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 5, 0)).unwrap();
            assert_eq!(
                starts(&found),
                vec![utc(2024, 1, 1, 9), utc(2024, 1, 2, 9), utc(2024, 1, 2, 15), utc(2024, 1, 4, 9)]
            );
        }

        #[test]
        fn test_exdate_before_window_start_on_same_day() {
            let mut component = standup();
            component.add_exdate([Period::new(day(2024, 1, 3))]);
            let found = component.get_occurrences(&utc(2024, 1, 3, 6), &utc(2024, 1, 4, 0)).unwrap();
            assert!(found.is_empty());
        }

        #[test]
        fn test_all_day_exdate_across_fall_back() {
            let zone = resolve_zone("America/New_York").unwrap();
            let on = |d| ZonedInstant::date(zone, NaiveDate::from_ymd_opt(2024, 11, d).unwrap()).unwrap();
            let mut component = RecurringComponent::new("holiday", ComponentKind::Event, on(1));
            component.add_rrule(RecurrencePattern::new(Frequency::Daily));
            component.add_exdate([Period::new(on(4))]);

            let found = component.get_occurrences(&on(1), &on(7)).unwrap();
            let days: Vec<u32> = found.iter().map(|o| o.start().day()).collect();
            assert_eq!(days, vec![1, 2, 3, 5, 6]);
            assert!(found.iter().all(|o| !o.start().has_time()));
        }

        #[test]
        fn test_all_day_exrule_removes_timed_rdates() {
            let zone = resolve_zone("America/New_York").unwrap();
            let on = |d| ZonedInstant::date(zone, NaiveDate::from_ymd_opt(2024, 1, d).unwrap()).unwrap();
            let at = |d, h| {
                let naive = NaiveDate::from_ymd_opt(2024, 1, d).unwrap().and_hms_opt(h, 0, 0).unwrap();
                ZonedInstant::from_local(zone, naive).unwrap()
            };
            let mut component = RecurringComponent::new("offsite", ComponentKind::Event, on(1));
            component.add_rrule(RecurrencePattern::new(Frequency::Daily).count(5));
            component.add_rdate([at(3, 15), at(4, 21), at(10, 21), at(11, 9)].map(Period::new));
            component.add_exrule(RecurrencePattern::new(Frequency::Weekly).by_day([NWeekday::every(Weekday::Wed)]));

            let found = component.get_occurrences(&on(1), &on(6)).unwrap();
            assert_eq!(starts(&found), vec![on(1), on(2), on(4), at(4, 21), on(5)]);

            // Starts at 20:00 local on Wednesday the 10th.
            let found = component.get_occurrences(&utc(2024, 1, 11, 1), &utc(2024, 1, 12, 0)).unwrap();
            assert_eq!(starts(&found), vec![at(11, 9)]);
        }

        #[test]
        fn test_anchor_alone_without_rules() {
            let mut component = RecurringComponent::new("once", ComponentKind::Todo, utc(2024, 5, 1, 12));
            let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2025, 1, 1, 0)).unwrap();
            assert_eq!(starts(&found), vec![utc(2024, 5, 1, 12)]);
            assert!(!component.recurrence().is_recurring());
        }

        #[test]
        fn test_anchor_not_matching_rule_is_still_included() {
            let mut component = RecurringComponent::new("odd", ComponentKind::Event, utc(2024, 1, 2, 9));
            component.add_rrule(RecurrencePattern::new(Frequency::Weekly).by_day([NWeekday::every(Weekday::Mon)]));
            let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 10, 0)).unwrap();
            assert_eq!(starts(&found), vec![utc(2024, 1, 2, 9), utc(2024, 1, 8, 9)]);
        }

        #[test]
        fn test_evaluator_without_reference() {
            let recurrence = Recurrence::new(utc(2024, 1, 2, 9)).with_rule(RecurrenceRule::RRule(
                RecurrencePattern::new(Frequency::Weekly).by_day([NWeekday::every(Weekday::Mon)]),
            ));
            let mut evaluator = RecurringEvaluator::new();
            let periods = evaluator
                .evaluate(&recurrence, &utc(2024, 1, 1, 0), &utc(2024, 1, 10, 0), false, &EvaluationConfig::default())
                .unwrap();
            assert_eq!(periods.starts(), vec![utc(2024, 1, 8, 9)]);
        }

        #[test]
        fn test_failing_rule_aborts_evaluation() {
            let mut component = standup();
            component.add_rrule(RecurrencePattern::new(Frequency::Daily).interval(0));
            let result = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 6, 0));
            assert_eq!(result.unwrap_err(), CoreError::NonPositiveInterval(0));
        }
    }

    mod cache_tests {
        use super::*;

        #[test]
        fn test_repeated_evaluation_is_idempotent() {
            let mut component = standup();
            let first = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 2, 1, 0)).unwrap();
            let second = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 2, 1, 0)).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.len(), 31);
        }

        #[test]
        fn test_bounds_widen() {
            let mut component = standup();
            component.get_occurrences(&utc(2024, 1, 10, 0), &utc(2024, 1, 20, 0)).unwrap();
            component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 5, 0)).unwrap();
            let bounds = component.evaluated_bounds();
            assert_eq!(bounds.start(), Some(&utc(2024, 1, 1, 0)));
            assert_eq!(bounds.end(), Some(&utc(2024, 1, 20, 0)));

            let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 20, 0)).unwrap();
            assert_eq!(found.len(), 19);
        }

        #[test]
        fn test_mutation_clears_cache() {
            let mut component = standup();
            component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 6, 0)).unwrap();
            assert!(!component.evaluated_bounds().is_empty());

            component.add_exdate([Period::new(day(2024, 1, 2))]);
            assert!(component.evaluated_bounds().is_empty());
            let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 6, 0)).unwrap();
            assert_eq!(found.len(), 4);

            let removed = component.remove_rule(1);
            assert!(matches!(removed, Some(RecurrenceRule::ExDate(_))));
            assert!(component.evaluated_bounds().is_empty());
            assert_eq!(component.remove_rule(5), None);
        }

        #[test]
        fn test_swapping_a_rule_recomputes_cached_window() {
            let mut component = standup();
            let window = (utc(2024, 1, 1, 0), utc(2024, 1, 8, 0));
            assert_eq!(component.get_occurrences(&window.0, &window.1).unwrap().len(), 7);

            component.remove_rule(0);
            component.add_rrule(RecurrencePattern::new(Frequency::Daily).interval(3));
            let found = component.get_occurrences(&window.0, &window.1).unwrap();
            assert_eq!(starts(&found), vec![utc(2024, 1, 1, 9), utc(2024, 1, 4, 9), utc(2024, 1, 7, 9)]);
        }

        #[test]
        fn test_clear_evaluation() {
            let mut component = standup();
            component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 6, 0)).unwrap();
            component.clear_evaluation();
            assert!(component.evaluated_bounds().is_empty());
        }
    }

    #[test]
    fn test_duration_sets_period_end() {
        let mut component = standup().with_duration(Duration::minutes(15));
        let found = component.get_occurrences(&utc(2024, 1, 1, 0), &utc(2024, 1, 2, 0)).unwrap();
        assert_eq!(found[0].period.end(), Some(&(utc(2024, 1, 1, 9) + Duration::minutes(15))));
        assert_eq!(found[0].source, Source::Component { uid: "standup".into() });
    }

    #[test]
    fn test_occurrences_on_local_day() {
        let zone = resolve_zone("Asia/Tokyo").unwrap();
        let start = ZonedInstant::from_local(zone, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap()).unwrap();
        let mut component = RecurringComponent::new("jp", ComponentKind::Journal, start);
        component.add_rrule(RecurrencePattern::new(Frequency::Hourly).interval(8));

        let found = component.get_occurrences_on(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()).unwrap();
        let hours: Vec<u32> = found.iter().map(|o| o.start().hour()).collect();
        assert_eq!(hours, vec![0, 8, 16]);
    }

    #[test]
    fn test_evaluate_attaches_owner() {
        let mut component = standup();
        let mut reference = Reference::new(utc(2024, 1, 1, 0));
        component.evaluate(&mut reference, &utc(2024, 1, 1, 0), &utc(2024, 1, 2, 0)).unwrap();
        assert_eq!(reference.owner(), Some(&Owner::Component("standup".into())));
    }

    #[test]
    fn test_rule_display() {
        let rule = RecurrenceRule::RRule(RecurrencePattern::new(Frequency::Daily).interval(2));
        assert_eq!(rule.to_string(), "RRULE:FREQ=DAILY;INTERVAL=2");
        assert_eq!(ComponentKind::Todo.to_string(), "VTODO");
    }
}
