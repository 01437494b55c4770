use chrono::{Datelike, NaiveDate};
use cpm_engine::{
    activity::DependencyLink, CalendarSet, ProjectMetadata, Schedule, WorkCalendar,
    DEFAULT_CALENDAR_ID,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn continuous_schedule(start: NaiveDate, end: NaiveDate) -> Schedule {
    let mut metadata = ProjectMetadata::default();
    metadata.project_start_date = start;
    metadata.project_end_date = end;
    let mut calendars = CalendarSet::standard(start.year(), end.year());
    calendars
        .insert(DEFAULT_CALENDAR_ID, WorkCalendar::continuous())
        .unwrap();
    Schedule::new_with_metadata_and_calendars(metadata, calendars)
}

/// Diamond: 1 -> {2, 3} -> 4 with durations 2, 3, 1, 2.
fn diamond() -> Schedule {
    let mut s = continuous_schedule(d(2026, 3, 2), d(2026, 3, 31));
    s.upsert_activity(1, "T1", 2).unwrap();
    s.upsert_activity(2, "T2", 3).unwrap();
    s.upsert_activity(3, "T3", 1).unwrap();
    s.upsert_activity(4, "T4", 2).unwrap();
    s.set_dependencies(2, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.set_dependencies(3, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.set_dependencies(
        4,
        vec![
            DependencyLink::finish_to_start(2),
            DependencyLink::finish_to_start(3),
        ],
    )
    .unwrap();
    s
}

#[test]
fn backward_pass_sets_late_dates_and_floats() {
    let mut s = diamond();
    let summary = s.refresh().unwrap();
    let solution = s.solution().unwrap();

    let by_id = |id: i32| {
        solution
            .activities
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .unwrap()
    };

    assert_eq!(summary.project_finish, Some(d(2026, 3, 9)));

    let t4 = by_id(4);
    assert_eq!((t4.late_start, t4.late_finish), (d(2026, 3, 7), d(2026, 3, 9)));
    assert_eq!(t4.total_float_days, 0);
    assert!(t4.is_critical);

    let t2 = by_id(2);
    assert_eq!((t2.late_start, t2.late_finish), (d(2026, 3, 4), d(2026, 3, 7)));
    assert!(t2.is_critical);

    // The short branch carries two days of slack.
    let t3 = by_id(3);
    assert_eq!((t3.late_start, t3.late_finish), (d(2026, 3, 6), d(2026, 3, 7)));
    assert_eq!(t3.total_float_days, 2);
    assert_eq!(t3.free_float_days, 2);
    assert!(!t3.is_critical);

    let t1 = by_id(1);
    assert_eq!(t1.total_float_days, 0);
    assert!(t1.is_critical);

    assert_eq!(summary.critical_chains, vec![vec![1, 2, 4]]);
    assert_eq!(summary.critical_count, 3);
}

#[test]
fn parallel_equal_branches_report_every_critical_chain() {
    let mut s = continuous_schedule(d(2026, 3, 2), d(2026, 3, 31));
    s.upsert_activity(1, "Start", 1).unwrap();
    s.upsert_activity(2, "Left", 3).unwrap();
    s.upsert_activity(3, "Right", 3).unwrap();
    s.upsert_activity(4, "End", 1).unwrap();
    s.set_dependencies(2, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.set_dependencies(3, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.set_dependencies(
        4,
        vec![
            DependencyLink::finish_to_start(2),
            DependencyLink::finish_to_start(3),
        ],
    )
    .unwrap();

    let summary = s.refresh().unwrap();
    assert_eq!(
        summary.critical_chains,
        vec![vec![1, 2, 4], vec![1, 3, 4]]
    );
    assert_eq!(summary.critical_count, 4);
}

#[test]
fn unrelated_parallel_activity_carries_complement_float() {
    // A(5) -> B(3) -> C(2) chain plus D(4) running free: D's float is the
    // ten-day project length minus its own four days.
    let mut s = continuous_schedule(d(2026, 3, 1), d(2026, 3, 31));
    s.upsert_activity(1, "A", 5).unwrap();
    s.upsert_activity(2, "B", 3).unwrap();
    s.upsert_activity(3, "C", 2).unwrap();
    s.upsert_activity(4, "D", 4).unwrap();
    s.set_dependencies(2, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.set_dependencies(3, vec![DependencyLink::finish_to_start(2)])
        .unwrap();
    let summary = s.refresh().unwrap();

    assert_eq!(summary.project_finish, Some(d(2026, 3, 11)));

    let solution = s.solution().unwrap();
    let dd = solution.activities.iter().find(|a| a.id == 4).unwrap();
    assert_eq!(dd.total_float_days, 6);
    assert!(!dd.is_critical);
    assert_eq!(summary.critical_chains, vec![vec![1, 2, 3]]);
}

#[test]
fn sink_free_float_equals_total_float() {
    let mut s = continuous_schedule(d(2026, 3, 2), d(2026, 3, 31));
    s.upsert_activity(1, "Long", 6).unwrap();
    s.upsert_activity(2, "Short", 2).unwrap();
    s.refresh().unwrap();

    let solution = s.solution().unwrap();
    let short = solution.activities.iter().find(|a| a.id == 2).unwrap();
    assert_eq!(short.total_float_days, 4);
    assert_eq!(short.free_float_days, 4);
}

#[test]
fn refresh_is_deterministic_across_runs() {
    let mut a = diamond();
    let mut b = diamond();
    a.refresh().unwrap();
    b.refresh().unwrap();

    let sol_a = a.solution().unwrap();
    let sol_b = b.solution().unwrap();
    assert_eq!(sol_a.activities, sol_b.activities);
    assert_eq!(sol_a.critical_chains, sol_b.critical_chains);

    // Re-solving in place does not move anything either.
    a.refresh().unwrap();
    assert_eq!(a.solution().unwrap().activities, sol_b.activities);
}
