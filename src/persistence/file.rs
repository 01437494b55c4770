use super::{PersistenceError, PersistenceResult};
use crate::{
    activity::{Activity, DependencyLink},
    calendar::{CalendarSet, WorkCalendar, WorkCalendarConfig},
    metadata::ProjectMetadata,
    resource::ResourceAssignment,
    Schedule,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct ScheduleSnapshot {
    metadata: ProjectMetadata,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    calendars: BTreeMap<String, WorkCalendarConfig>,
    #[serde(default)]
    calendars_are_custom: bool,
    activities: Vec<Activity>,
}

impl ScheduleSnapshot {
    fn from_schedule(schedule: &Schedule) -> PersistenceResult<Self> {
        let activities = schedule.activities()?;
        super::validate_activities(&activities)?;
        let calendars = schedule
            .calendars()
            .iter()
            .map(|(id, calendar)| (id.clone(), calendar.to_config()))
            .collect();
        Ok(Self {
            metadata: schedule.metadata().clone(),
            calendars,
            calendars_are_custom: schedule.calendars_are_custom(),
            activities,
        })
    }

    fn into_schedule(self) -> PersistenceResult<Schedule> {
        super::validate_activities(&self.activities)?;
        let mut calendars = CalendarSet::standard(
            self.metadata.project_start_date.year(),
            self.metadata.project_end_date.year(),
        );
        for (id, config) in &self.calendars {
            calendars.insert(id.clone(), WorkCalendar::from_config(config)?)?;
        }

        let mut schedule =
            Schedule::from_parts(self.metadata, calendars, self.calendars_are_custom);
        for activity in self.activities {
            schedule.upsert_activity_record(activity)?;
        }
        Ok(schedule)
    }
}

pub fn save_schedule_to_json<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let snapshot = ScheduleSnapshot::from_schedule(schedule)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    Ok(())
}

pub fn load_schedule_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    let snapshot: ScheduleSnapshot = serde_json::from_reader(file)?;
    snapshot.into_schedule()
}

#[derive(Default, Serialize, Deserialize)]
struct ActivityCsvRecord {
    id: i32,
    name: String,
    duration_days: i64,
    calendar_id: String,
    start_no_earlier_than: String,
    predecessors: String,
    early_start: String,
    early_finish: String,
    late_start: String,
    late_finish: String,
    total_float_days: String,
    free_float_days: String,
    is_critical: String,
    percent_complete: String,
    budgeted_cost: String,
    actual_cost: String,
    resource_assignments: String,
    #[serde(default)]
    metadata_json: String,
    #[serde(default)]
    calendars_json: String,
    #[serde(default)]
    calendars_are_custom: String,
}

impl From<&Activity> for ActivityCsvRecord {
    fn from(activity: &Activity) -> Self {
        let mut record = ActivityCsvRecord::default();
        record.id = activity.id;
        record.name = activity.name.clone();
        record.duration_days = activity.duration_days;
        record.calendar_id = activity.calendar_id.clone();
        record.start_no_earlier_than = format_date(activity.start_no_earlier_than);
        record.predecessors =
            serde_json::to_string(&activity.predecessors).unwrap_or_else(|_| "[]".to_string());
        record.early_start = format_date(activity.early_start);
        record.early_finish = format_date(activity.early_finish);
        record.late_start = format_date(activity.late_start);
        record.late_finish = format_date(activity.late_finish);
        record.total_float_days = format_option_i64(activity.total_float_days);
        record.free_float_days = format_option_i64(activity.free_float_days);
        record.is_critical = format_option_bool(activity.is_critical);
        record.percent_complete = activity.percent_complete.to_string();
        record.budgeted_cost = activity.budgeted_cost.to_string();
        record.actual_cost = activity.actual_cost.to_string();
        record.resource_assignments = serde_json::to_string(&activity.resource_assignments)
            .unwrap_or_else(|_| "[]".to_string());
        record
    }
}

impl ActivityCsvRecord {
    fn metadata_row(schedule: &Schedule) -> PersistenceResult<Self> {
        let metadata_json = serde_json::to_string(schedule.metadata())?;
        let calendars: BTreeMap<String, WorkCalendarConfig> = schedule
            .calendars()
            .iter()
            .map(|(id, calendar)| (id.clone(), calendar.to_config()))
            .collect();
        let mut record = ActivityCsvRecord::default();
        record.name = "__metadata__".to_string();
        record.metadata_json = metadata_json;
        record.calendars_json = serde_json::to_string(&calendars)?;
        record.calendars_are_custom = schedule.calendars_are_custom().to_string();
        Ok(record)
    }

    fn is_metadata_row(&self) -> bool {
        !self.metadata_json.trim().is_empty()
    }

    fn into_activity(self) -> PersistenceResult<Activity> {
        if self.is_metadata_row() {
            return Err(PersistenceError::InvalidData(
                "metadata row cannot be converted to an activity".into(),
            ));
        }
        let mut activity = Activity::new(self.id, self.name, self.duration_days);
        if !self.calendar_id.trim().is_empty() {
            activity.calendar_id = self.calendar_id.trim().to_string();
        }
        activity.start_no_earlier_than = parse_date(&self.start_no_earlier_than)?;
        activity.predecessors = if self.predecessors.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str::<Vec<DependencyLink>>(&self.predecessors)
                .map_err(|err| {
                    PersistenceError::InvalidData(format!("invalid predecessors: {err}"))
                })?
        };
        activity.early_start = parse_date(&self.early_start)?;
        activity.early_finish = parse_date(&self.early_finish)?;
        activity.late_start = parse_date(&self.late_start)?;
        activity.late_finish = parse_date(&self.late_finish)?;
        activity.total_float_days = parse_i64(&self.total_float_days)?;
        activity.free_float_days = parse_i64(&self.free_float_days)?;
        activity.is_critical = parse_bool(&self.is_critical)?;
        activity.percent_complete = parse_f64(&self.percent_complete)?.unwrap_or(0.0);
        activity.budgeted_cost = parse_f64(&self.budgeted_cost)?.unwrap_or(0.0);
        activity.actual_cost = parse_f64(&self.actual_cost)?.unwrap_or(0.0);
        activity.resource_assignments = if self.resource_assignments.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str::<Vec<ResourceAssignment>>(&self.resource_assignments).map_err(
                |err| {
                    PersistenceError::InvalidData(format!("invalid resource_assignments: {err}"))
                },
            )?
        };
        Ok(activity)
    }
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(schedule: &Schedule, path: P) -> PersistenceResult<()> {
    super::validate_schedule(schedule)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.serialize(ActivityCsvRecord::metadata_row(schedule)?)?;
    for activity in schedule.activities()? {
        writer.serialize(ActivityCsvRecord::from(&activity))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_schedule_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Schedule> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut activities = Vec::new();
    let mut metadata: Option<ProjectMetadata> = None;
    let mut calendar_configs: BTreeMap<String, WorkCalendarConfig> = BTreeMap::new();
    let mut calendars_are_custom = false;
    for record in reader.deserialize::<ActivityCsvRecord>() {
        let record = record?;
        if record.is_metadata_row() {
            if metadata.is_some() {
                return Err(PersistenceError::InvalidData(
                    "CSV file contained multiple metadata rows".into(),
                ));
            }
            metadata = Some(serde_json::from_str(&record.metadata_json).map_err(|err| {
                PersistenceError::InvalidData(format!("invalid metadata json: {err}"))
            })?);
            if !record.calendars_json.trim().is_empty() {
                calendar_configs =
                    serde_json::from_str(&record.calendars_json).map_err(|err| {
                        PersistenceError::InvalidData(format!("invalid calendars json: {err}"))
                    })?;
            }
            if !record.calendars_are_custom.trim().is_empty() {
                calendars_are_custom = record
                    .calendars_are_custom
                    .trim()
                    .parse::<bool>()
                    .unwrap_or(false);
            }
            continue;
        }
        activities.push(record.into_activity()?);
    }

    if activities.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no activities".into(),
        ));
    }

    super::validate_activities(&activities)?;

    let snapshot = ScheduleSnapshot {
        metadata: metadata.unwrap_or_default(),
        calendars: calendar_configs,
        calendars_are_custom,
        activities,
    };
    snapshot.into_schedule()
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(input: &str) -> PersistenceResult<Option<NaiveDate>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_f64(input: &str) -> PersistenceResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<f64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid float '{input}': {e}")))
}

fn format_option_i64(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_i64(input: &str) -> PersistenceResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    input
        .trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|e| PersistenceError::InvalidData(format!("invalid integer '{input}': {e}")))
}

fn format_option_bool(value: Option<bool>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_bool(input: &str) -> PersistenceResult<Option<bool>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match input.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}
