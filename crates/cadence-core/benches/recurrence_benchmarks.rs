use cadence_core::config::EvaluationConfig;
use cadence_core::datetime::{Period, ZonedInstant};
use cadence_core::pattern::{Frequency, NWeekday, RecurrencePattern};
use cadence_core::recurrence::expand;
use cadence_core::recurring::{ComponentKind, RecurringComponent};
use cadence_core::vtimezone::{Observance, ObservanceKind, TimeZone, UtcOffset};
use chrono::{Duration, NaiveDate, TimeZone as _, Utc, Weekday};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn anchor() -> ZonedInstant {
    ZonedInstant::utc(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap())
}

fn create_test_component() -> RecurringComponent {
    let mut component = RecurringComponent::new("bench", ComponentKind::Event, anchor());
    component.add_rrule(RecurrencePattern::new(Frequency::Daily));
    component.add_exdate((0..30).step_by(5).map(|i| Period::new(anchor() + Duration::days(i))));
    component
}

fn create_test_time_zone() -> TimeZone {
    let onset = |m: u32, d: u32| NaiveDate::from_ymd_opt(2007, m, d).unwrap().and_hms_opt(2, 0, 0).unwrap();
    let daylight = Observance::new(ObservanceKind::Daylight, onset(3, 11), UtcOffset::new(-5, 0, 0), UtcOffset::new(-4, 0, 0))
        .unwrap()
        .with_rrule(RecurrencePattern::new(Frequency::Yearly).by_month([3]).by_day([NWeekday::nth(2, Weekday::Sun)]));
    let standard = Observance::new(ObservanceKind::Standard, onset(11, 4), UtcOffset::new(-4, 0, 0), UtcOffset::new(-5, 0, 0))
        .unwrap()
        .with_rrule(RecurrencePattern::new(Frequency::Yearly).by_month([11]).by_day([NWeekday::nth(1, Weekday::Sun)]));
    TimeZone::new("US-Eastern").with_observance(daylight).with_observance(standard)
}

fn bench_occurrence_generation(c: &mut Criterion) {
    let start = anchor();
    let config = EvaluationConfig::default();
    let patterns = [
        ("daily", RecurrencePattern::new(Frequency::Daily)),
        ("weekdays", RecurrencePattern::new(Frequency::Weekly).by_day(
            [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri].map(NWeekday::every),
        )),
        ("last_friday", RecurrencePattern::new(Frequency::Monthly).by_day([NWeekday::nth(-1, Weekday::Fri)])),
    ];

    let mut group = c.benchmark_group("occurrence_generation");
    for (name, pattern) in &patterns {
        for days in [7, 30, 90, 365].iter() {
            let end = start + Duration::days(*days);
            group.bench_with_input(BenchmarkId::new(*name, days), days, |b, _| {
                b.iter(|| expand(black_box(&start), black_box(pattern), black_box(&start), black_box(&end), &config).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_cached_requery(c: &mut Criterion) {
    let start = anchor();
    let end = start + Duration::days(365);
    let mut component = create_test_component();
    component.get_occurrences(&start, &end).unwrap();

    c.bench_function("cached_requery", |b| {
        b.iter(|| component.get_occurrences(black_box(&start), black_box(&end)).unwrap())
    });
}

fn bench_cold_evaluation_with_exclusions(c: &mut Criterion) {
    let start = anchor();
    let end = start + Duration::days(365);

    c.bench_function("cold_evaluation_with_exclusions", |b| {
        b.iter(|| {
            let mut component = create_test_component();
            component.get_occurrences(black_box(&start), black_box(&end)).unwrap()
        })
    });
}

fn bench_time_zone_offset_lookup(c: &mut Criterion) {
    let instant = ZonedInstant::utc(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap());
    let mut tz = create_test_time_zone();
    tz.offset_at(&instant).unwrap();

    c.bench_function("time_zone_offset_lookup", |b| {
        b.iter(|| tz.offset_at(black_box(&instant)).unwrap())
    });
}

criterion_group!(
    benches,
    bench_occurrence_generation,
    bench_cached_requery,
    bench_cold_evaluation_with_exclusions,
    bench_time_zone_offset_lookup
);
criterion_main!(benches);
