use crate::activity::{Activity, DependencyLink, LinkType};
use crate::activity_validation;
use crate::calculations::backward_pass::BackwardPass;
use crate::calculations::forward_pass::ForwardPass;
use crate::calendar::{CalendarSet, WorkCalendar};
use crate::earned_value::{EarnedValueAnalyzer, EarnedValueSnapshot};
use crate::error::ScheduleError;
use crate::graph::ActivityDag;
use crate::leveling::{LevelingConfig, LevelingOutcome, ResourceLeveler};
use crate::metadata::ProjectMetadata;
use crate::resource::{DemandProfile, ResourceAssignment, ResourceCatalog};
use chrono::{Datelike, NaiveDate};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SolveSummary {
    pub activity_count: usize,
    pub critical_count: usize,
    /// Every zero-float chain, source to sink; none is singled out.
    pub critical_chains: Vec<Vec<i32>>,
    pub project_finish: Option<NaiveDate>,
}

impl SolveSummary {
    /// One-line rendering of the solve outcome, suitable for logs.
    pub fn summary_line(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("activities={}", self.activity_count));
        parts.push(format!("critical={}", self.critical_count));
        if let Some(date) = self.project_finish {
            parts.push(format!("finish={}", date));
        }
        for chain in &self.critical_chains {
            let rendered = chain
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("->");
            parts.push(format!("crit_chain={}", rendered));
        }
        parts.join(", ")
    }
}

/// Dated result for one activity in a solved schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDates {
    pub id: i32,
    pub name: String,
    pub early_start: NaiveDate,
    pub early_finish: NaiveDate,
    pub late_start: NaiveDate,
    pub late_finish: NaiveDate,
    pub total_float_days: i64,
    pub free_float_days: i64,
    pub is_critical: bool,
}

/// Full output of a CPM solve. Owned by the caller; recomputed wholesale on
/// every refresh, never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSolution {
    pub project_start: NaiveDate,
    pub project_finish: Option<NaiveDate>,
    pub activities: Vec<ActivityDates>,
    pub critical_chains: Vec<Vec<i32>>,
}

/// The schedule facade: owns the activity frame, the project metadata and
/// the calendar set, and orchestrates validate -> graph -> forward ->
/// backward -> float -> chain assembly. External collaborators consume the
/// result structures and never reach into the frame.
#[derive(Debug)]
pub struct Schedule {
    df: DataFrame,
    metadata: ProjectMetadata,
    calendars: CalendarSet,
    calendars_are_custom: bool,
    project_finish: Option<NaiveDate>,
    critical_chains: Vec<Vec<i32>>,
}

impl Schedule {
    pub(crate) fn from_parts(
        metadata: ProjectMetadata,
        calendars: CalendarSet,
        calendars_are_custom: bool,
    ) -> Self {
        let schema = Self::default_schema();
        let df = DataFrame::empty_with_schema(&schema);

        Self {
            df,
            metadata,
            calendars,
            calendars_are_custom,
            project_finish: None,
            critical_chains: Vec::new(),
        }
    }

    pub fn new() -> Self {
        let metadata = ProjectMetadata::default();
        let calendars = Self::calendars_for_metadata(&metadata);
        Self::from_parts(metadata, calendars, false)
    }

    pub fn new_with_metadata(metadata: ProjectMetadata) -> Self {
        let calendars = Self::calendars_for_metadata(&metadata);
        Self::from_parts(metadata, calendars, false)
    }

    pub fn new_with_metadata_and_calendars(
        metadata: ProjectMetadata,
        calendars: CalendarSet,
    ) -> Self {
        Self::from_parts(metadata, calendars, true)
    }

    fn calendars_for_metadata(metadata: &ProjectMetadata) -> CalendarSet {
        CalendarSet::standard(
            metadata.project_start_date.year(),
            metadata.project_end_date.year(),
        )
    }

    fn default_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("id".into(), DataType::Int32),
            Field::new("name".into(), DataType::String),
            Field::new("duration_days".into(), DataType::Int64),
            Field::new("calendar_id".into(), DataType::String),
            Field::new("start_no_earlier_than".into(), DataType::Date),
            Field::new("predecessors".into(), DataType::String),
            Field::new("early_start".into(), DataType::Date),
            Field::new("early_finish".into(), DataType::Date),
            Field::new("late_start".into(), DataType::Date),
            Field::new("late_finish".into(), DataType::Date),
            Field::new("total_float_days".into(), DataType::Int64),
            Field::new("free_float_days".into(), DataType::Int64),
            Field::new("is_critical".into(), DataType::Boolean),
            Field::new("percent_complete".into(), DataType::Float64),
            Field::new("budgeted_cost".into(), DataType::Float64),
            Field::new("actual_cost".into(), DataType::Float64),
            Field::new("resource_assignments".into(), DataType::String),
        ])
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn metadata(&self) -> &ProjectMetadata {
        &self.metadata
    }

    pub fn project_start_date(&self) -> NaiveDate {
        self.metadata.project_start_date
    }

    pub fn project_end_date(&self) -> NaiveDate {
        self.metadata.project_end_date
    }

    pub fn calendars(&self) -> &CalendarSet {
        &self.calendars
    }

    pub fn calendars_are_custom(&self) -> bool {
        self.calendars_are_custom
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.metadata.project_name = name.into();
    }

    pub fn set_project_description(&mut self, description: impl Into<String>) {
        self.metadata.project_description = description.into();
    }

    pub fn set_metadata(&mut self, metadata: ProjectMetadata) -> Result<(), ScheduleError> {
        self.validate_metadata(&metadata)?;
        self.metadata = metadata;
        if !self.calendars_are_custom {
            self.calendars = Self::calendars_for_metadata(&self.metadata);
        }
        Ok(())
    }

    pub fn set_project_dates(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(), ScheduleError> {
        let mut metadata = self.metadata.clone();
        metadata.project_start_date = start;
        metadata.project_end_date = end;
        self.set_metadata(metadata)
    }

    fn validate_metadata(&self, metadata: &ProjectMetadata) -> Result<(), ScheduleError> {
        if metadata.project_start_date > metadata.project_end_date {
            return Err(ScheduleError::Validation(format!(
                "project start date {} must be on or before project end date {}",
                metadata.project_start_date, metadata.project_end_date
            )));
        }
        if let Some(latest_finish) = self.latest_early_finish()? {
            if latest_finish > metadata.project_end_date {
                return Err(ScheduleError::Validation(format!(
                    "project end date {} is before the current schedule finish {}",
                    metadata.project_end_date, latest_finish
                )));
            }
        }
        Ok(())
    }

    /// Register a named calendar. Re-solves immediately when activities are
    /// already loaded, so no stale dates survive a calendar change.
    pub fn add_calendar(
        &mut self,
        calendar_id: impl Into<String>,
        calendar: WorkCalendar,
    ) -> Result<(), ScheduleError> {
        self.calendars.insert(calendar_id, calendar)?;
        self.calendars_are_custom = true;
        if self.df.height() == 0 {
            return Ok(());
        }
        self.refresh().map(|_| ())
    }

    pub fn activities(&self) -> Result<Vec<Activity>, ScheduleError> {
        let mut activities = Vec::with_capacity(self.df.height());
        for idx in 0..self.df.height() {
            activities.push(Activity::from_dataframe_row(&self.df, idx)?);
        }
        Ok(activities)
    }

    pub fn find_activity(&self, activity_id: i32) -> Result<Option<Activity>, ScheduleError> {
        if self.df.height() == 0 {
            return Ok(None);
        }
        let ids = self.df.column("id")?.i32()?;
        for (idx, id_opt) in ids.into_iter().enumerate() {
            if id_opt == Some(activity_id) {
                return Ok(Some(Activity::from_dataframe_row(&self.df, idx)?));
            }
        }
        Ok(None)
    }

    pub fn upsert_activity(
        &mut self,
        id: i32,
        name: &str,
        duration_days: i64,
    ) -> Result<(), ScheduleError> {
        let record = match self.find_activity(id)? {
            Some(mut existing) => {
                existing.name = name.to_string();
                existing.duration_days = duration_days;
                existing
            }
            None => Activity::new(id, name, duration_days),
        };
        self.upsert_activity_record(record)
    }

    pub fn upsert_activity_record(&mut self, record: Activity) -> Result<(), ScheduleError> {
        activity_validation::validate_activity(&record)?;

        let mut activities = self.activities()?;
        let mut replaced = false;
        for activity in &mut activities {
            if activity.id == record.id {
                *activity = record.clone();
                replaced = true;
            }
        }
        if !replaced {
            activities.push(record);
        }
        self.rebuild_frame(activities)
    }

    /// Remove an activity and scrub every relationship that referenced it,
    /// then re-solve: a structural change invalidates all derived dates.
    pub fn delete_activity(&mut self, activity_id: i32) -> Result<bool, ScheduleError> {
        if self.df.height() == 0 {
            return Ok(false);
        }
        let mut activities = self.activities()?;
        let before = activities.len();
        activities.retain(|activity| activity.id != activity_id);
        if activities.len() == before {
            return Ok(false);
        }
        for activity in &mut activities {
            activity
                .predecessors
                .retain(|link| link.predecessor_id != activity_id);
        }
        self.rebuild_frame(activities)?;
        self.refresh()?;
        Ok(true)
    }

    fn rebuild_frame(&mut self, activities: Vec<Activity>) -> Result<(), ScheduleError> {
        let mut df = DataFrame::empty_with_schema(&Self::default_schema());
        for activity in activities {
            let row = activity.to_dataframe_row()?;
            df = df.vstack(&row)?;
        }
        self.df = df;
        Ok(())
    }

    pub fn set_dependencies(
        &mut self,
        activity_id: i32,
        links: Vec<DependencyLink>,
    ) -> Result<(), ScheduleError> {
        self.require_activity(activity_id)?;
        let payload = serde_json::to_string(&links)
            .map_err(|err| ScheduleError::Computation(err.to_string()))?;
        self.update_string_column("predecessors", activity_id, &payload)
    }

    pub fn set_not_before(
        &mut self,
        activity_id: i32,
        date: NaiveDate,
    ) -> Result<(), ScheduleError> {
        self.require_activity(activity_id)?;
        self.update_date_column("start_no_earlier_than", activity_id, date)
    }

    pub fn set_percent_complete(
        &mut self,
        activity_id: i32,
        percent: f64,
    ) -> Result<(), ScheduleError> {
        let mut activity = self.require_activity(activity_id)?;
        activity.percent_complete = percent;
        activity_validation::validate_activity(&activity)?;
        self.update_float_column("percent_complete", activity_id, percent)
    }

    pub fn set_budgeted_cost(
        &mut self,
        activity_id: i32,
        budgeted_cost: f64,
    ) -> Result<(), ScheduleError> {
        let mut activity = self.require_activity(activity_id)?;
        activity.budgeted_cost = budgeted_cost;
        activity_validation::validate_activity(&activity)?;
        self.update_float_column("budgeted_cost", activity_id, budgeted_cost)
    }

    pub fn set_actual_cost(
        &mut self,
        activity_id: i32,
        actual_cost: f64,
    ) -> Result<(), ScheduleError> {
        let mut activity = self.require_activity(activity_id)?;
        activity.actual_cost = actual_cost;
        activity_validation::validate_activity(&activity)?;
        self.update_float_column("actual_cost", activity_id, actual_cost)
    }

    /// Attach a resource demand to an activity, validated against the
    /// shared catalog before anything is stored.
    pub fn attach_resource(
        &mut self,
        activity_id: i32,
        resource_id: impl Into<String>,
        quantity: f64,
        profile: DemandProfile,
        catalog: &ResourceCatalog,
    ) -> Result<(), ScheduleError> {
        let mut activity = self.require_activity(activity_id)?;
        let assignment = ResourceAssignment::new(resource_id, quantity).with_profile(profile);
        assignment.validate(activity_id, catalog)?;
        activity.resource_assignments.push(assignment);
        let payload = serde_json::to_string(&activity.resource_assignments)
            .map_err(|err| ScheduleError::Computation(err.to_string()))?;
        self.update_string_column("resource_assignments", activity_id, &payload)
    }

    /// Fill in budgeted cost from catalog rates for activities where the
    /// caller set none: quantity x cost rate x working duration, summed
    /// across assignments.
    pub fn apply_catalog_costs(&mut self, catalog: &ResourceCatalog) -> Result<(), ScheduleError> {
        let activities = self.activities()?;
        for activity in activities {
            if activity.budgeted_cost != 0.0 || activity.resource_assignments.is_empty() {
                continue;
            }
            let mut budget = 0.0;
            for assignment in &activity.resource_assignments {
                assignment.validate(activity.id, catalog)?;
                let rate = catalog
                    .get(&assignment.resource_id)
                    .map(|definition| definition.cost_rate)
                    .unwrap_or(0.0);
                budget += assignment.quantity * rate * activity.duration_days as f64;
            }
            self.update_float_column("budgeted_cost", activity.id, budget)?;
        }
        Ok(())
    }

    fn require_activity(&self, activity_id: i32) -> Result<Activity, ScheduleError> {
        self.find_activity(activity_id)?
            .ok_or_else(|| ScheduleError::Validation(format!("activity {activity_id} not found")))
    }

    fn update_string_column(
        &mut self,
        column_name: &str,
        activity_id: i32,
        new_value: &str,
    ) -> Result<(), ScheduleError> {
        let id_col = self.df.column("id")?;
        let target_col = self.df.column(column_name)?;

        let new_series = target_col
            .str()?
            .into_iter()
            .zip(id_col.i32()?.into_iter())
            .map(|(val, id)| {
                if id == Some(activity_id) {
                    Some(new_value)
                } else {
                    val
                }
            })
            .collect::<StringChunked>()
            .into_series()
            .with_name(column_name.into());

        self.df.replace(column_name, new_series)?;
        Ok(())
    }

    fn update_float_column(
        &mut self,
        column_name: &str,
        activity_id: i32,
        new_value: f64,
    ) -> Result<(), ScheduleError> {
        let id_col = self.df.column("id")?;
        let target_col = self.df.column(column_name)?;

        let new_series = target_col
            .f64()?
            .into_iter()
            .zip(id_col.i32()?.into_iter())
            .map(|(val, id)| {
                if id == Some(activity_id) {
                    Some(new_value)
                } else {
                    val
                }
            })
            .collect::<Float64Chunked>()
            .into_series()
            .with_name(column_name.into());

        self.df.replace(column_name, new_series)?;
        Ok(())
    }

    fn update_date_column(
        &mut self,
        column_name: &str,
        activity_id: i32,
        new_date: NaiveDate,
    ) -> Result<(), ScheduleError> {
        self.df = self
            .df
            .clone()
            .lazy()
            .with_column(
                when(col("id").eq(lit(activity_id)))
                    .then(lit(new_date).cast(DataType::Date))
                    .otherwise(col(column_name).cast(DataType::Date))
                    .alias(column_name),
            )
            .collect()?;
        Ok(())
    }

    fn latest_early_finish(&self) -> Result<Option<NaiveDate>, ScheduleError> {
        if self.df.height() == 0 {
            return Ok(None);
        }
        let early_finish = self.df.column("early_finish")?.date()?;
        let mut latest: Option<NaiveDate> = None;
        for idx in 0..early_finish.len() {
            if let Some(days) = early_finish.get(idx) {
                let candidate = Activity::date_from_i32(days);
                latest = Some(match latest {
                    Some(current) if current >= candidate => current,
                    _ => candidate,
                });
            }
        }
        Ok(latest)
    }

    fn replace_date_column(
        &mut self,
        column_name: &'static str,
        values: Vec<Option<i32>>,
    ) -> Result<(), ScheduleError> {
        let series =
            Series::new(PlSmallStr::from_static(column_name), values).cast(&DataType::Date)?;
        self.df.replace(column_name, series)?;
        Ok(())
    }

    /// Full solve pipeline: validate, build the graph (cycle and terminal
    /// checks happen here, before any dates move), forward pass, horizon
    /// check, backward pass, floats and critical chains. The frame is only
    /// written once every stage has succeeded.
    pub fn refresh(&mut self) -> Result<SolveSummary, ScheduleError> {
        if self.df.height() == 0 {
            self.project_finish = None;
            self.critical_chains.clear();
            return Ok(SolveSummary::default());
        }

        let activities = self.activities()?;
        activity_validation::validate_activity_collection(&activities)?;
        if self.metadata.project_start_date > self.metadata.project_end_date {
            return Err(ScheduleError::Validation(format!(
                "project start date {} must be on or before project end date {}",
                self.metadata.project_start_date, self.metadata.project_end_date
            )));
        }

        let dag = ActivityDag::build(&self.df)?;
        dag.topological_order()?;
        let sinks = dag.sinks();
        if sinks.is_empty() {
            return Err(ScheduleError::NoTerminalActivity);
        }

        let early =
            ForwardPass::new(&dag, &self.calendars).execute(self.metadata.project_start_date)?;

        let project_finish = sinks
            .iter()
            .filter_map(|&node_ix| early.get(&dag.graph[node_ix]).map(|&(_, ef)| ef))
            .max()
            .ok_or(ScheduleError::NoTerminalActivity)?;

        if project_finish > self.metadata.project_end_date {
            return Err(ScheduleError::Validation(format!(
                "project end date {} precedes computed schedule finish {}",
                self.metadata.project_end_date, project_finish
            )));
        }

        let late = BackwardPass::new(&dag, &self.calendars).execute(project_finish)?;

        let (total_float, free_float) = self.compute_floats(&dag, &early, &late)?;
        self.persist_solution(&early, &late, &total_float, &free_float)?;

        let critical: HashSet<i32> = total_float
            .iter()
            .filter(|&(_, &tf)| tf == 0)
            .map(|(&id, _)| id)
            .collect();
        self.critical_chains = collect_critical_chains(&dag, &critical);
        self.project_finish = Some(project_finish);

        Ok(SolveSummary {
            activity_count: self.df.height(),
            critical_count: critical.len(),
            critical_chains: self.critical_chains.clone(),
            project_finish: self.project_finish,
        })
    }

    #[allow(clippy::type_complexity)]
    fn compute_floats(
        &self,
        dag: &ActivityDag,
        early: &HashMap<i32, (NaiveDate, NaiveDate)>,
        late: &HashMap<i32, (NaiveDate, NaiveDate)>,
    ) -> Result<(HashMap<i32, i64>, HashMap<i32, i64>), ScheduleError> {
        let mut total_float: HashMap<i32, i64> = HashMap::new();
        let mut free_float: HashMap<i32, i64> = HashMap::new();

        for node_ix in dag.graph.node_indices() {
            let activity_id = dag.graph[node_ix];
            let calendar = self.calendars.resolve(&dag.calendar_ids[&activity_id])?;
            let (es, ef) = early[&activity_id];
            let (ls, _) = late[&activity_id];
            let tf = calendar.working_days_between(es, ls);
            total_float.insert(activity_id, tf);

            // Free float: slack against each successor's earliest start,
            // measured through the same link formula the forward pass uses.
            let mut ff: Option<i64> = None;
            for edge in dag.graph.edges_directed(node_ix, Direction::Outgoing) {
                let link = edge.weight();
                let succ_id = dag.graph[edge.target()];
                let succ_calendar = self.calendars.resolve(&dag.calendar_ids[&succ_id])?;
                let succ_duration = *dag.durations.get(&succ_id).unwrap_or(&0);
                let (succ_es, _) = early[&succ_id];

                let candidate = match link.link_type {
                    LinkType::FinishToStart => succ_calendar.offset(ef, link.lag_days),
                    LinkType::StartToStart => succ_calendar.offset(es, link.lag_days),
                    LinkType::FinishToFinish => {
                        let finish = succ_calendar.offset(ef, link.lag_days);
                        succ_calendar
                            .subtract_duration(succ_calendar.roll_forward(finish), succ_duration)
                    }
                    LinkType::StartToFinish => {
                        let finish = succ_calendar.offset(es, link.lag_days);
                        succ_calendar
                            .subtract_duration(succ_calendar.roll_forward(finish), succ_duration)
                    }
                };
                let slack = succ_calendar
                    .working_days_between(candidate, succ_es)
                    .max(0);
                ff = Some(match ff {
                    Some(current) => current.min(slack),
                    None => slack,
                });
            }
            free_float.insert(activity_id, ff.unwrap_or(tf));
        }

        Ok((total_float, free_float))
    }

    fn persist_solution(
        &mut self,
        early: &HashMap<i32, (NaiveDate, NaiveDate)>,
        late: &HashMap<i32, (NaiveDate, NaiveDate)>,
        total_float: &HashMap<i32, i64>,
        free_float: &HashMap<i32, i64>,
    ) -> Result<(), ScheduleError> {
        let height = self.df.height();
        let ids: Vec<Option<i32>> = self.df.column("id")?.i32()?.into_iter().collect();

        let mut es_vals: Vec<Option<i32>> = vec![None; height];
        let mut ef_vals: Vec<Option<i32>> = vec![None; height];
        let mut ls_vals: Vec<Option<i32>> = vec![None; height];
        let mut lf_vals: Vec<Option<i32>> = vec![None; height];
        let mut tf_vals: Vec<Option<i64>> = vec![None; height];
        let mut ff_vals: Vec<Option<i64>> = vec![None; height];
        let mut crit_vals: Vec<Option<bool>> = vec![None; height];

        for (idx, id_opt) in ids.iter().enumerate() {
            if let Some(activity_id) = id_opt {
                if let Some(&(es, ef)) = early.get(activity_id) {
                    es_vals[idx] = Some(Activity::date_to_i32(es));
                    ef_vals[idx] = Some(Activity::date_to_i32(ef));
                }
                if let Some(&(ls, lf)) = late.get(activity_id) {
                    ls_vals[idx] = Some(Activity::date_to_i32(ls));
                    lf_vals[idx] = Some(Activity::date_to_i32(lf));
                }
                if let Some(&tf) = total_float.get(activity_id) {
                    tf_vals[idx] = Some(tf);
                    crit_vals[idx] = Some(tf == 0);
                }
                ff_vals[idx] = free_float.get(activity_id).copied();
            }
        }

        self.replace_date_column("early_start", es_vals)?;
        self.replace_date_column("early_finish", ef_vals)?;
        self.replace_date_column("late_start", ls_vals)?;
        self.replace_date_column("late_finish", lf_vals)?;

        let tf_series = Series::new(PlSmallStr::from_static("total_float_days"), tf_vals);
        self.df.replace("total_float_days", tf_series)?;
        let ff_series = Series::new(PlSmallStr::from_static("free_float_days"), ff_vals);
        self.df.replace("free_float_days", ff_series)?;
        let crit_series = Series::new(PlSmallStr::from_static("is_critical"), crit_vals);
        self.df.replace("is_critical", crit_series)?;

        Ok(())
    }

    /// Snapshot of the last solve as caller-owned value objects.
    pub fn solution(&self) -> Result<ScheduleSolution, ScheduleError> {
        let mut dated = Vec::with_capacity(self.df.height());
        for activity in self.activities()? {
            let (Some(es), Some(ef), Some(ls), Some(lf)) = (
                activity.early_start,
                activity.early_finish,
                activity.late_start,
                activity.late_finish,
            ) else {
                return Err(ScheduleError::Validation(format!(
                    "activity {} has no computed dates; call refresh first",
                    activity.id
                )));
            };
            dated.push(ActivityDates {
                id: activity.id,
                name: activity.name,
                early_start: es,
                early_finish: ef,
                late_start: ls,
                late_finish: lf,
                total_float_days: activity.total_float_days.unwrap_or(0),
                free_float_days: activity.free_float_days.unwrap_or(0),
                is_critical: activity.is_critical.unwrap_or(false),
            });
        }
        dated.sort_by_key(|dates| dates.id);

        Ok(ScheduleSolution {
            project_start: self.metadata.project_start_date,
            project_finish: self.project_finish,
            activities: dated,
            critical_chains: self.critical_chains.clone(),
        })
    }

    /// Histograms and float-bounded delays against a resource catalog. The
    /// proposed dates are returned, not written back; accepting them is the
    /// caller's call.
    pub fn level_resources(
        &self,
        catalog: &ResourceCatalog,
        config: &LevelingConfig,
    ) -> Result<LevelingOutcome, ScheduleError> {
        let activities = self.activities()?;
        ResourceLeveler::new(catalog, &self.calendars, config).level(&activities)
    }

    /// Earned-value snapshot from the stored progress and cost fields.
    pub fn earned_value(&self, as_of: NaiveDate) -> Result<EarnedValueSnapshot, ScheduleError> {
        let activities = self.activities()?;
        EarnedValueAnalyzer::new(&self.calendars).analyze(&activities, as_of)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}

/// All source-to-sink paths through the zero-float subgraph, successors
/// visited in ascending id order. Parallel zero-float chains are all
/// reported; no tie-break picks a winner.
fn collect_critical_chains(dag: &ActivityDag, critical: &HashSet<i32>) -> Vec<Vec<i32>> {
    let mut chains: Vec<Vec<i32>> = Vec::new();

    let critical_successors = |id: i32| -> Vec<i32> {
        let node_ix = dag.id_to_index[&id];
        let mut succs: Vec<i32> = dag
            .graph
            .neighbors_directed(node_ix, Direction::Outgoing)
            .map(|succ_ix| dag.graph[succ_ix])
            .filter(|succ_id| critical.contains(succ_id))
            .collect();
        succs.sort_unstable();
        succs.dedup();
        succs
    };

    let mut sources: Vec<i32> = critical
        .iter()
        .copied()
        .filter(|&id| {
            let node_ix = dag.id_to_index[&id];
            !dag.graph
                .neighbors_directed(node_ix, Direction::Incoming)
                .map(|pred_ix| dag.graph[pred_ix])
                .any(|pred_id| critical.contains(&pred_id))
        })
        .collect();
    sources.sort_unstable();

    fn walk(
        id: i32,
        path: &mut Vec<i32>,
        chains: &mut Vec<Vec<i32>>,
        successors: &dyn Fn(i32) -> Vec<i32>,
    ) {
        path.push(id);
        let succs = successors(id);
        if succs.is_empty() {
            chains.push(path.clone());
        } else {
            for succ in succs {
                walk(succ, path, chains, successors);
            }
        }
        path.pop();
    }

    for source in sources {
        let mut path = Vec::new();
        walk(source, &mut path, &mut chains, &critical_successors);
    }

    chains.sort();
    chains
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_contains_expected_columns() {
        let schema = Schedule::default_schema();
        let expected = vec![
            "id",
            "name",
            "duration_days",
            "calendar_id",
            "start_no_earlier_than",
            "predecessors",
            "early_start",
            "early_finish",
            "late_start",
            "late_finish",
            "total_float_days",
            "free_float_days",
            "is_critical",
            "percent_complete",
            "budgeted_cost",
            "actual_cost",
            "resource_assignments",
        ];
        for name in expected {
            assert!(schema.contains(name.into()), "missing column {name}");
        }
    }

    #[test]
    fn upsert_activity_inserts_and_updates() {
        let mut schedule = Schedule::new();
        schedule.upsert_activity(1, "Excavate", 5).unwrap();
        assert_eq!(schedule.dataframe().height(), 1);

        schedule
            .upsert_activity(1, "Excavate and shore", 7)
            .unwrap();

        let df = schedule.dataframe();
        let name = df.column("name").unwrap().str().unwrap().get(0).unwrap();
        let dur = df
            .column("duration_days")
            .unwrap()
            .i64()
            .unwrap()
            .get(0)
            .unwrap();
        assert_eq!(name, "Excavate and shore");
        assert_eq!(dur, 7);
        assert_eq!(schedule.dataframe().height(), 1);
    }

    #[test]
    fn negative_duration_rejected_at_construction() {
        let mut schedule = Schedule::new();
        let err = schedule.upsert_activity(1, "Bad", -3).unwrap_err();
        match err {
            ScheduleError::NegativeDuration { id, duration_days } => {
                assert_eq!(id, 1);
                assert_eq!(duration_days, -3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
