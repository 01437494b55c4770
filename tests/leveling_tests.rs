use chrono::{Datelike, NaiveDate};
use cpm_engine::{
    activity::DependencyLink, CalendarSet, DemandProfile, LevelingConfig, ProjectMetadata,
    ResourceCatalog, ResourceDefinition, Schedule, TieBreak, WorkCalendar, DEFAULT_CALENDAR_ID,
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

fn one_crew_catalog() -> ResourceCatalog {
    let mut catalog = ResourceCatalog::new();
    catalog.insert(ResourceDefinition::new("crew", "Crew", 1.0).with_cost_rate(800.0));
    catalog
}

#[test]
fn leveler_delays_the_activity_with_float() {
    let start = d(2026, 3, 2);
    let mut s = continuous_schedule(start, d(2026, 4, 30));
    let catalog = one_crew_catalog();

    // 1 and 3 form the critical chain; 2 runs parallel with four days of float
    // but competes with 1 for the crew.
    s.upsert_activity(1, "Critical work", 2).unwrap();
    s.upsert_activity(2, "Flexible work", 2).unwrap();
    s.upsert_activity(3, "Follow-on", 4).unwrap();
    s.set_dependencies(3, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.attach_resource(1, "crew", 1.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.attach_resource(2, "crew", 1.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.refresh().unwrap();

    let outcome = s
        .level_resources(&catalog, &LevelingConfig::default())
        .unwrap();

    assert!(outcome.fully_resolved());
    assert_eq!(outcome.shifts.len(), 1);
    let shift = &outcome.shifts[0];
    assert_eq!(shift.activity_id, 2);
    assert_eq!(shift.shifted_days, 2);
    assert_eq!(shift.new_start, d(2026, 3, 4));
    assert_eq!(shift.new_finish, d(2026, 3, 6));

    // No daily bucket exceeds the crew's availability.
    let buckets = &outcome.histogram.per_resource["crew"];
    assert!(buckets.iter().all(|bucket| !bucket.is_over_allocated()));
}

#[test]
fn conflicting_critical_activities_stay_put_and_report_residual() {
    let start = d(2026, 3, 2);
    let mut s = continuous_schedule(start, d(2026, 4, 30));
    let catalog = one_crew_catalog();

    // Both paths have the same length, so both activities are critical and
    // neither may move.
    s.upsert_activity(1, "Left", 2).unwrap();
    s.upsert_activity(2, "Right", 2).unwrap();
    s.attach_resource(1, "crew", 1.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.attach_resource(2, "crew", 1.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.refresh().unwrap();

    let outcome = s
        .level_resources(&catalog, &LevelingConfig::default())
        .unwrap();

    assert!(outcome.shifts.is_empty());
    assert!(!outcome.fully_resolved());
    let unresolved = &outcome.histogram.unresolved;
    assert_eq!(unresolved.len(), 2);
    assert_eq!(unresolved[0].date, d(2026, 3, 2));
    assert_eq!(unresolved[0].demand, 2.0);
    assert_eq!(unresolved[0].limit, 1.0);
    assert_eq!(unresolved[0].excess(), 1.0);
}

#[test]
fn fractional_headroom_still_forces_a_shift() {
    let start = d(2026, 3, 2);
    let mut s = continuous_schedule(start, d(2026, 4, 30));
    let mut catalog = ResourceCatalog::new();
    catalog.insert(ResourceDefinition::new("labor", "Laborers", 4.0).with_cost_rate(400.0));

    // Each activity wants 3 of the 4 available laborers, so they fit the
    // limit alone but not together.
    s.upsert_activity(1, "Pour", 2).unwrap();
    s.upsert_activity(2, "Backfill", 2).unwrap();
    s.upsert_activity(3, "Cure", 4).unwrap();
    s.set_dependencies(3, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.attach_resource(1, "labor", 3.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.attach_resource(2, "labor", 3.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.refresh().unwrap();

    let outcome = s
        .level_resources(&catalog, &LevelingConfig::default())
        .unwrap();

    assert!(outcome.fully_resolved());
    assert_eq!(outcome.shifts.len(), 1);
    assert_eq!(outcome.shifts[0].activity_id, 2);
    assert_eq!(outcome.shifts[0].shifted_days, 2);

    let buckets = &outcome.histogram.per_resource["labor"];
    assert!(buckets.iter().all(|bucket| bucket.demand <= 4.0));
}

#[test]
fn front_loaded_profile_decays_daily_demand() {
    let start = d(2026, 3, 2);
    let mut s = continuous_schedule(start, d(2026, 4, 30));
    let mut catalog = ResourceCatalog::new();
    catalog.insert(ResourceDefinition::new("steel", "Steel", 10.0));

    s.upsert_activity(1, "Erect", 3).unwrap();
    s.attach_resource(1, "steel", 4.0, DemandProfile::FrontLoaded, &catalog)
        .unwrap();
    s.refresh().unwrap();

    let config = LevelingConfig {
        front_load_decay: 0.5,
        ..LevelingConfig::default()
    };
    let outcome = s.level_resources(&catalog, &config).unwrap();

    let buckets = &outcome.histogram.per_resource["steel"];
    let demands: Vec<f64> = buckets.iter().map(|bucket| bucket.demand).collect();
    assert_eq!(demands, vec![4.0, 2.0, 1.0]);
}

#[test]
fn tie_break_picks_the_configured_side() {
    let start = d(2026, 3, 2);
    let end = d(2026, 4, 30);
    let catalog = one_crew_catalog();

    let build = || {
        let mut s = continuous_schedule(start, end);
        // Same one-day float on both contenders; 3 anchors the critical
        // length, so a single shift of either one resolves the conflict.
        s.upsert_activity(1, "First", 1).unwrap();
        s.upsert_activity(2, "Second", 1).unwrap();
        s.upsert_activity(3, "Anchor", 2).unwrap();
        s.attach_resource(1, "crew", 1.0, DemandProfile::Flat, &catalog)
            .unwrap();
        s.attach_resource(2, "crew", 1.0, DemandProfile::Flat, &catalog)
            .unwrap();
        s.refresh().unwrap();
        s
    };

    let low = build()
        .level_resources(&catalog, &LevelingConfig::default())
        .unwrap();
    assert!(low.fully_resolved());
    assert_eq!(low.shifts.len(), 1);
    assert_eq!(low.shifts[0].activity_id, 1);

    let config = LevelingConfig {
        tie_break: TieBreak::HighestId,
        ..LevelingConfig::default()
    };
    let high = build().level_resources(&catalog, &config).unwrap();
    assert!(high.fully_resolved());
    assert_eq!(high.shifts.len(), 1);
    assert_eq!(high.shifts[0].activity_id, 2);
}

#[test]
fn leveling_never_writes_back_to_the_schedule() {
    let start = d(2026, 3, 2);
    let mut s = continuous_schedule(start, d(2026, 4, 30));
    let catalog = one_crew_catalog();

    s.upsert_activity(1, "A", 2).unwrap();
    s.upsert_activity(2, "B", 2).unwrap();
    s.upsert_activity(3, "C", 4).unwrap();
    s.set_dependencies(3, vec![DependencyLink::finish_to_start(1)])
        .unwrap();
    s.attach_resource(1, "crew", 1.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.attach_resource(2, "crew", 1.0, DemandProfile::Flat, &catalog)
        .unwrap();
    s.refresh().unwrap();

    let before = s.solution().unwrap().activities.clone();
    s.level_resources(&catalog, &LevelingConfig::default())
        .unwrap();
    let after = s.solution().unwrap().activities;
    assert_eq!(before, after);
}
