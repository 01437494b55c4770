use chrono::{Datelike, NaiveDate};
use cpm_engine::{
    activity::{DependencyLink, LinkType},
    ActivityDates, CalendarSet, ProjectMetadata, Schedule, WorkCalendar, DEFAULT_CALENDAR_ID,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Schedule whose default calendar works every day of the week, so dates
/// line up with plain day offsets.
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

fn dates_for(schedule: &Schedule, id: i32) -> ActivityDates {
    schedule
        .solution()
        .unwrap()
        .activities
        .into_iter()
        .find(|a| a.id == id)
        .unwrap()
}

#[test]
fn finish_to_start_chain_packs_activities_back_to_back() {
    let start = d(2026, 3, 1);
    let mut s = continuous_schedule(start, d(2026, 12, 31));
    s.upsert_activity(1, "A", 5).unwrap();
    s.upsert_activity(2, "B", 3).unwrap();
    s.upsert_activity(3, "C", 2).unwrap();
    s.set_dependencies(2, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.set_dependencies(3, vec![DependencyLink::finish_to_start(2)])
        .unwrap();

    let summary = s.refresh().unwrap();

    let a = dates_for(&s, 1);
    let b = dates_for(&s, 2);
    let c = dates_for(&s, 3);
    assert_eq!((a.early_start, a.early_finish), (d(2026, 3, 1), d(2026, 3, 6)));
    assert_eq!((b.early_start, b.early_finish), (d(2026, 3, 6), d(2026, 3, 9)));
    assert_eq!((c.early_start, c.early_finish), (d(2026, 3, 9), d(2026, 3, 11)));
    assert_eq!(summary.project_finish, Some(d(2026, 3, 11)));
    assert!(a.is_critical && b.is_critical && c.is_critical);
    assert_eq!(summary.critical_chains, vec![vec![1, 2, 3]]);
}

#[test]
fn start_to_start_link_offsets_successor_start_by_lag() {
    let start = d(2026, 3, 1);
    let mut s = continuous_schedule(start, d(2026, 12, 31));
    s.upsert_activity(1, "A", 5).unwrap();
    s.upsert_activity(2, "B", 3).unwrap();
    s.set_dependencies(2, vec![DependencyLink::new(1, LinkType::StartToStart, 2)])
        .unwrap();
    s.refresh().unwrap();

    let b = dates_for(&s, 2);
    assert_eq!(b.early_start, d(2026, 3, 3));
    assert_eq!(b.early_finish, d(2026, 3, 6));
}

#[test]
fn finish_to_finish_link_aligns_successor_finish() {
    let start = d(2026, 3, 1);
    let mut s = continuous_schedule(start, d(2026, 12, 31));
    s.upsert_activity(1, "A", 5).unwrap();
    s.upsert_activity(2, "B", 2).unwrap();
    s.set_dependencies(2, vec![DependencyLink::new(1, LinkType::FinishToFinish, 0)])
        .unwrap();
    s.refresh().unwrap();

    let a = dates_for(&s, 1);
    let b = dates_for(&s, 2);
    assert_eq!(b.early_finish, a.early_finish);
    assert_eq!(b.early_start, d(2026, 3, 4));
}

#[test]
fn start_to_finish_link_bounds_successor_finish_from_predecessor_start() {
    let start = d(2026, 3, 1);
    let mut s = continuous_schedule(start, d(2026, 12, 31));
    s.upsert_activity(1, "A", 5).unwrap();
    s.upsert_activity(2, "B", 2).unwrap();
    s.set_dependencies(2, vec![DependencyLink::new(1, LinkType::StartToFinish, 4)])
        .unwrap();
    s.refresh().unwrap();

    let b = dates_for(&s, 2);
    // finish >= pred start + 4 days, so start = finish - duration
    assert_eq!(b.early_finish, d(2026, 3, 5));
    assert_eq!(b.early_start, d(2026, 3, 3));
}

#[test]
fn negative_lag_never_pulls_before_project_start() {
    let start = d(2026, 3, 1);
    let mut s = continuous_schedule(start, d(2026, 12, 31));
    s.upsert_activity(1, "A", 2).unwrap();
    s.upsert_activity(2, "B", 2).unwrap();
    s.set_dependencies(2, vec![DependencyLink::new(1, LinkType::FinishToStart, -10)])
        .unwrap();
    s.refresh().unwrap();

    let b = dates_for(&s, 2);
    assert_eq!(b.early_start, start);
}

#[test]
fn not_before_constraint_raises_early_start() {
    let start = d(2026, 3, 1);
    let mut s = continuous_schedule(start, d(2026, 12, 31));
    s.upsert_activity(1, "A", 2).unwrap();
    s.set_not_before(1, d(2026, 3, 10)).unwrap();
    s.refresh().unwrap();

    let a = dates_for(&s, 1);
    assert_eq!(a.early_start, d(2026, 3, 10));
    assert_eq!(a.early_finish, d(2026, 3, 12));
}

#[test]
fn milestone_resolves_start_equal_finish() {
    let start = d(2026, 3, 1);
    let mut s = continuous_schedule(start, d(2026, 12, 31));
    s.upsert_activity(1, "Build", 5).unwrap();
    s.upsert_activity(2, "Handover", 0).unwrap();
    s.set_dependencies(2, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.refresh().unwrap();

    let m = dates_for(&s, 2);
    assert_eq!(m.early_start, d(2026, 3, 6));
    assert_eq!(m.early_start, m.early_finish);
    assert!(m.is_critical);
}

#[test]
fn weekend_calendar_pushes_start_to_monday() {
    // Standard five-day calendar: project starts Saturday, work starts Monday.
    let mut metadata = ProjectMetadata::default();
    metadata.project_start_date = d(2026, 1, 3); // Saturday
    metadata.project_end_date = d(2026, 12, 31);
    let mut s = Schedule::new_with_metadata(metadata);
    s.upsert_activity(1, "A", 2).unwrap();
    s.refresh().unwrap();

    let a = dates_for(&s, 1);
    assert_eq!(a.early_start, d(2026, 1, 5));
    assert_eq!(a.early_finish, d(2026, 1, 7));
}

#[test]
fn lag_counts_working_days_of_successor_calendar() {
    let start = d(2026, 1, 5); // Monday
    let mut metadata = ProjectMetadata::default();
    metadata.project_start_date = start;
    metadata.project_end_date = d(2026, 12, 31);
    let mut s = Schedule::new_with_metadata(metadata);
    s.upsert_activity(1, "A", 4).unwrap();
    s.upsert_activity(2, "B", 1).unwrap();
    // A finishes Friday morning boundary; 2 working days of lag spans the
    // weekend, so B starts Tuesday.
    s.set_dependencies(2, vec![DependencyLink::new(1, LinkType::FinishToStart, 2)])
        .unwrap();
    s.refresh().unwrap();

    let b = dates_for(&s, 2);
    assert_eq!(b.early_start, d(2026, 1, 13));
}

#[test]
fn lagged_driver_on_another_calendar_keeps_zero_float() {
    // A works every day, B only Mon-Fri; the one-day lag spans B's weekend
    // in both passes, so A's late finish lands on its early finish.
    let start = d(2026, 1, 5); // Monday
    let mut metadata = ProjectMetadata::default();
    metadata.project_start_date = start;
    metadata.project_end_date = d(2026, 12, 31);
    let mut calendars = CalendarSet::standard(2026, 2026);
    calendars
        .insert("continuous", WorkCalendar::continuous())
        .unwrap();
    let mut s = Schedule::new_with_metadata_and_calendars(metadata, calendars);

    let a = cpm_engine::Activity::new(1, "A", 4).with_calendar("continuous");
    s.upsert_activity_record(a).unwrap();
    s.upsert_activity(2, "B", 1).unwrap();
    s.set_dependencies(2, vec![DependencyLink::new(1, LinkType::FinishToStart, 1)])
        .unwrap();
    let summary = s.refresh().unwrap();

    let a = dates_for(&s, 1);
    let b = dates_for(&s, 2);
    assert_eq!(a.early_finish, d(2026, 1, 9)); // Friday
    assert_eq!(b.early_start, d(2026, 1, 12));
    assert_eq!(a.late_finish, a.early_finish);
    assert_eq!(a.total_float_days, 0);
    assert!(a.is_critical);
    assert_eq!(summary.critical_chains, vec![vec![1, 2]]);
}
