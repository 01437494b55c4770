use crate::resource::ResourceAssignment;
use chrono::{Duration, NaiveDate};
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Timing relationship between two activities. A closed enumeration: the
/// CPM passes match exhaustively, so an unknown relationship type cannot
/// exist past deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    #[serde(rename = "FS")]
    FinishToStart,
    #[serde(rename = "SS")]
    StartToStart,
    #[serde(rename = "FF")]
    FinishToFinish,
    #[serde(rename = "SF")]
    StartToFinish,
}

impl LinkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::FinishToStart => "FS",
            LinkType::StartToStart => "SS",
            LinkType::FinishToFinish => "FF",
            LinkType::StartToFinish => "SF",
        }
    }
}

/// Directed edge from a predecessor into the activity that owns this link.
/// Lag is signed working days; negative values are leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyLink {
    pub predecessor_id: i32,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    #[serde(default)]
    pub lag_days: i64,
}

impl DependencyLink {
    pub fn finish_to_start(predecessor_id: i32) -> Self {
        Self {
            predecessor_id,
            link_type: LinkType::FinishToStart,
            lag_days: 0,
        }
    }

    pub fn new(predecessor_id: i32, link_type: LinkType, lag_days: i64) -> Self {
        Self {
            predecessor_id,
            link_type,
            lag_days,
        }
    }
}

/// Atomic unit of work. Duration 0 marks a milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i32,
    pub name: String,
    pub duration_days: i64,
    pub calendar_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_no_earlier_than: Option<NaiveDate>,
    #[serde(default)]
    pub predecessors: Vec<DependencyLink>,
    pub early_start: Option<NaiveDate>,
    pub early_finish: Option<NaiveDate>,
    pub late_start: Option<NaiveDate>,
    pub late_finish: Option<NaiveDate>,
    pub total_float_days: Option<i64>,
    pub free_float_days: Option<i64>,
    pub is_critical: Option<bool>,
    /// Field-reported progress, 0..=100.
    pub percent_complete: f64,
    pub budgeted_cost: f64,
    pub actual_cost: f64,
    #[serde(default)]
    pub resource_assignments: Vec<ResourceAssignment>,
}

impl Activity {
    pub fn new(id: i32, name: impl Into<String>, duration_days: i64) -> Self {
        Self {
            id,
            name: name.into(),
            duration_days,
            calendar_id: crate::calendar::DEFAULT_CALENDAR_ID.to_string(),
            start_no_earlier_than: None,
            predecessors: Vec::new(),
            early_start: None,
            early_finish: None,
            late_start: None,
            late_finish: None,
            total_float_days: None,
            free_float_days: None,
            is_critical: None,
            percent_complete: 0.0,
            budgeted_cost: 0.0,
            actual_cost: 0.0,
            resource_assignments: Vec::new(),
        }
    }

    pub fn is_milestone(&self) -> bool {
        self.duration_days == 0
    }

    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    pub fn with_predecessor(mut self, link: DependencyLink) -> Self {
        self.predecessors.push(link);
        self
    }

    pub fn with_not_before(mut self, date: NaiveDate) -> Self {
        self.start_no_earlier_than = Some(date);
        self
    }

    pub fn with_budgeted_cost(mut self, budgeted_cost: f64) -> Self {
        self.budgeted_cost = budgeted_cost;
        self
    }

    pub fn to_dataframe_row(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(17);

        let id_data: [i32; 1] = [self.id];
        columns.push(Series::new(PlSmallStr::from_static("id"), id_data).into_column());

        let name_data: [&str; 1] = [self.name.as_str()];
        columns.push(Series::new(PlSmallStr::from_static("name"), name_data).into_column());

        let duration_data: [i64; 1] = [self.duration_days];
        columns.push(
            Series::new(PlSmallStr::from_static("duration_days"), duration_data).into_column(),
        );

        let calendar_data: [&str; 1] = [self.calendar_id.as_str()];
        columns.push(
            Series::new(PlSmallStr::from_static("calendar_id"), calendar_data).into_column(),
        );

        columns.push(
            Self::series_from_date("start_no_earlier_than", self.start_no_earlier_than)?
                .into_column(),
        );

        columns.push(Self::series_from_json("predecessors", &self.predecessors)?.into_column());

        columns.push(Self::series_from_date("early_start", self.early_start)?.into_column());
        columns.push(Self::series_from_date("early_finish", self.early_finish)?.into_column());
        columns.push(Self::series_from_date("late_start", self.late_start)?.into_column());
        columns.push(Self::series_from_date("late_finish", self.late_finish)?.into_column());

        let total_float: [Option<i64>; 1] = [self.total_float_days];
        columns.push(
            Series::new(PlSmallStr::from_static("total_float_days"), total_float).into_column(),
        );

        let free_float: [Option<i64>; 1] = [self.free_float_days];
        columns.push(
            Series::new(PlSmallStr::from_static("free_float_days"), free_float).into_column(),
        );

        let is_critical: [Option<bool>; 1] = [self.is_critical];
        columns.push(
            Series::new(PlSmallStr::from_static("is_critical"), is_critical).into_column(),
        );

        let percent_complete: [f64; 1] = [self.percent_complete];
        columns.push(
            Series::new(
                PlSmallStr::from_static("percent_complete"),
                percent_complete,
            )
            .into_column(),
        );

        let budgeted: [f64; 1] = [self.budgeted_cost];
        columns.push(Series::new(PlSmallStr::from_static("budgeted_cost"), budgeted).into_column());

        let actual: [f64; 1] = [self.actual_cost];
        columns.push(Series::new(PlSmallStr::from_static("actual_cost"), actual).into_column());

        columns.push(
            Self::series_from_json("resource_assignments", &self.resource_assignments)?
                .into_column(),
        );

        DataFrame::new(columns)
    }

    pub fn from_dataframe_row(df: &DataFrame, row_idx: usize) -> PolarsResult<Self> {
        let id = df
            .column("id")?
            .i32()?
            .get(row_idx)
            .ok_or_else(|| PolarsError::ComputeError("activity row missing id".into()))?;

        let name = df
            .column("name")?
            .str()?
            .get(row_idx)
            .unwrap_or("")
            .to_string();

        let duration_days = df.column("duration_days")?.i64()?.get(row_idx).unwrap_or(0);

        let calendar_id = df
            .column("calendar_id")?
            .str()?
            .get(row_idx)
            .unwrap_or(crate::calendar::DEFAULT_CALENDAR_ID)
            .to_string();

        let predecessors: Vec<DependencyLink> =
            Self::json_from_column(df, "predecessors", row_idx)?;
        let resource_assignments: Vec<ResourceAssignment> =
            Self::json_from_column(df, "resource_assignments", row_idx)?;

        Ok(Self {
            id,
            name,
            duration_days,
            calendar_id,
            start_no_earlier_than: Self::date_from_series(
                df.column("start_no_earlier_than")?.date()?,
                row_idx,
            ),
            predecessors,
            early_start: Self::date_from_series(df.column("early_start")?.date()?, row_idx),
            early_finish: Self::date_from_series(df.column("early_finish")?.date()?, row_idx),
            late_start: Self::date_from_series(df.column("late_start")?.date()?, row_idx),
            late_finish: Self::date_from_series(df.column("late_finish")?.date()?, row_idx),
            total_float_days: df.column("total_float_days")?.i64()?.get(row_idx),
            free_float_days: df.column("free_float_days")?.i64()?.get(row_idx),
            is_critical: df.column("is_critical")?.bool()?.get(row_idx),
            percent_complete: df
                .column("percent_complete")?
                .f64()?
                .get(row_idx)
                .unwrap_or(0.0),
            budgeted_cost: df
                .column("budgeted_cost")?
                .f64()?
                .get(row_idx)
                .unwrap_or(0.0),
            actual_cost: df.column("actual_cost")?.f64()?.get(row_idx).unwrap_or(0.0),
            resource_assignments,
        })
    }

    fn series_from_json<T: Serialize>(name: &str, values: &[T]) -> PolarsResult<Series> {
        let payload = serde_json::to_string(values)
            .map_err(|err| PolarsError::ComputeError(err.to_string().into()))?;
        let data: [&str; 1] = [payload.as_str()];
        Ok(Series::new(name.into(), data))
    }

    fn json_from_column<T: for<'de> Deserialize<'de>>(
        df: &DataFrame,
        name: &str,
        row_idx: usize,
    ) -> PolarsResult<Vec<T>> {
        let payload = df.column(name)?.str()?.get(row_idx).unwrap_or("[]");
        serde_json::from_str(payload)
            .map_err(|err| PolarsError::ComputeError(format!("{name}: {err}").into()))
    }

    fn series_from_date(name: &str, date: Option<NaiveDate>) -> PolarsResult<Series> {
        let data: [Option<i32>; 1] = [date.map(Self::date_to_i32)];
        Series::new(name.into(), data).cast(&DataType::Date)
    }

    fn date_from_series(chunked: &DateChunked, row_idx: usize) -> Option<NaiveDate> {
        chunked.get(row_idx).map(Self::date_from_i32)
    }

    pub(crate) fn date_to_i32(date: NaiveDate) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        (date - epoch).num_days() as i32
    }

    pub(crate) fn date_from_i32(days: i32) -> NaiveDate {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        epoch + Duration::days(days as i64)
    }
}
