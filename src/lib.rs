pub mod activity;
pub(crate) mod activity_validation;
pub mod calculations;
pub mod calendar;
pub mod earned_value;
pub mod error;
pub mod graph;
pub mod leveling;
pub mod metadata;
pub mod persistence;
pub mod resource;
pub mod schedule;

pub use activity::{Activity, DependencyLink, LinkType};
pub use calendar::{CalendarSet, WorkCalendar, WorkCalendarConfig, DEFAULT_CALENDAR_ID};
pub use earned_value::{EarnedValueAnalyzer, EarnedValueSnapshot};
pub use error::ScheduleError;
pub use leveling::{
    HistogramBucket, LevelingConfig, LevelingOutcome, OverAllocation, ResourceHistogram,
    ResourceLeveler, ShiftedActivity, TieBreak,
};
pub use metadata::ProjectMetadata;
pub use persistence::{
    load_schedule_from_csv, load_schedule_from_json, save_schedule_to_csv, save_schedule_to_json,
    validate_activities, validate_schedule, PersistenceError,
};
pub use resource::{
    DemandCurve, DemandProfile, ResourceAssignment, ResourceCatalog, ResourceDefinition,
};
pub use schedule::{ActivityDates, Schedule, ScheduleSolution, SolveSummary};
