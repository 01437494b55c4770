use crate::activity::Activity;
use crate::calendar::CalendarSet;
use crate::error::ScheduleError;
use crate::resource::{DemandCurve, ResourceCatalog};
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const EPSILON: f64 = 1e-9;

/// Which of two equal-float contenders gets delayed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    LowestId,
    HighestId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelingConfig {
    /// Day-over-day decay factor for front-loaded demand profiles.
    pub front_load_decay: f64,
    pub tie_break: TieBreak,
    /// Hard stop on leveling iterations. Float-bounded shifting terminates
    /// on its own; this caps pathological inputs.
    pub max_iterations: usize,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            front_load_decay: 0.75,
            tie_break: TieBreak::LowestId,
            max_iterations: 10_000,
        }
    }
}

/// One working day of one resource: demand summed across activities
/// against the availability limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub date: NaiveDate,
    pub demand: f64,
    pub limit: f64,
}

impl HistogramBucket {
    pub fn is_over_allocated(&self) -> bool {
        self.demand > self.limit + EPSILON
    }
}

/// A period the leveler could not bring under the limit without touching
/// the critical path. Returned as data; never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverAllocation {
    pub resource_id: String,
    pub date: NaiveDate,
    pub demand: f64,
    pub limit: f64,
}

impl OverAllocation {
    pub fn excess(&self) -> f64 {
        self.demand - self.limit
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceHistogram {
    pub per_resource: BTreeMap<String, Vec<HistogramBucket>>,
    pub unresolved: Vec<OverAllocation>,
}

/// Revised dates for one activity the leveler delayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftedActivity {
    pub activity_id: i32,
    pub new_start: NaiveDate,
    pub new_finish: NaiveDate,
    pub shifted_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelingOutcome {
    pub histogram: ResourceHistogram,
    pub shifts: Vec<ShiftedActivity>,
}

impl LevelingOutcome {
    pub fn fully_resolved(&self) -> bool {
        self.histogram.unresolved.is_empty()
    }
}

/// Delay-non-critical-first resource leveling.
///
/// Shifts are bounded by each activity's free float, so no relationship is
/// ever violated, no zero-float activity ever moves, and the project finish
/// never extends. What the float budget cannot absorb is reported as
/// unresolved over-allocation for the caller to decide.
pub struct ResourceLeveler<'a> {
    catalog: &'a ResourceCatalog,
    calendars: &'a CalendarSet,
    config: &'a LevelingConfig,
}

impl<'a> ResourceLeveler<'a> {
    pub fn new(
        catalog: &'a ResourceCatalog,
        calendars: &'a CalendarSet,
        config: &'a LevelingConfig,
    ) -> Self {
        Self {
            catalog,
            calendars,
            config,
        }
    }

    pub fn level(&self, activities: &[Activity]) -> Result<LevelingOutcome, ScheduleError> {
        let mut windows: HashMap<i32, (NaiveDate, NaiveDate)> = HashMap::new();
        let mut shift_budget: HashMap<i32, i64> = HashMap::new();
        let mut shifted: HashMap<i32, i64> = HashMap::new();
        let mut loaded: Vec<&Activity> = Vec::new();

        for activity in activities {
            for assignment in &activity.resource_assignments {
                assignment.validate(activity.id, self.catalog)?;
            }
            if activity.resource_assignments.is_empty() {
                continue;
            }
            let (start, finish) = match (activity.early_start, activity.early_finish) {
                (Some(start), Some(finish)) => (start, finish),
                _ => {
                    return Err(ScheduleError::Validation(format!(
                        "activity {} has no computed dates; solve the schedule before leveling",
                        activity.id
                    )));
                }
            };
            windows.insert(activity.id, (start, finish));
            shift_budget.insert(activity.id, activity.free_float_days.unwrap_or(0).max(0));
            loaded.push(activity);
        }

        for _ in 0..self.config.max_iterations {
            let (demand, contributors) = self.build_demand(&loaded, &windows)?;
            let Some(candidate) = self.pick_shift_candidate(&demand, &contributors, &shift_budget)
            else {
                break;
            };

            let Some(activity) = loaded.iter().find(|activity| activity.id == candidate) else {
                break;
            };
            let calendar = self.calendars.resolve(&activity.calendar_id)?;
            let (start, _) = windows[&candidate];
            let new_start = calendar.add_duration(start, 1);
            let new_finish = calendar.add_duration(new_start, activity.duration_days);
            windows.insert(candidate, (new_start, new_finish));
            *shift_budget.entry(candidate).or_insert(0) -= 1;
            *shifted.entry(candidate).or_insert(0) += 1;
        }

        let (demand, _) = self.build_demand(&loaded, &windows)?;
        let histogram = self.finalize_histogram(demand);

        let mut shifts: Vec<ShiftedActivity> = shifted
            .into_iter()
            .map(|(activity_id, shifted_days)| {
                let (new_start, new_finish) = windows[&activity_id];
                ShiftedActivity {
                    activity_id,
                    new_start,
                    new_finish,
                    shifted_days,
                }
            })
            .collect();
        shifts.sort_by_key(|shift| shift.activity_id);

        Ok(LevelingOutcome { histogram, shifts })
    }

    /// Sum demand curves into per-resource daily buckets. Curves build in
    /// parallel; the merge is by sorted key, so the result is independent
    /// of completion order.
    #[allow(clippy::type_complexity)]
    fn build_demand(
        &self,
        loaded: &[&Activity],
        windows: &HashMap<i32, (NaiveDate, NaiveDate)>,
    ) -> Result<
        (
            BTreeMap<String, BTreeMap<NaiveDate, f64>>,
            BTreeMap<(String, NaiveDate), Vec<i32>>,
        ),
        ScheduleError,
    > {
        let decay = self.config.front_load_decay;
        let curves: Vec<Result<Vec<DemandCurve>, ScheduleError>> = loaded
            .par_iter()
            .map(|activity| {
                let calendar = self.calendars.resolve(&activity.calendar_id)?;
                let (start, finish) = windows[&activity.id];
                Ok(activity
                    .resource_assignments
                    .iter()
                    .map(|assignment| {
                        DemandCurve::build(activity.id, assignment, calendar, start, finish, decay)
                    })
                    .collect())
            })
            .collect();

        let mut demand: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        let mut contributors: BTreeMap<(String, NaiveDate), Vec<i32>> = BTreeMap::new();
        for activity_curves in curves {
            for curve in activity_curves? {
                for (day, units) in &curve.daily {
                    *demand
                        .entry(curve.resource_id.clone())
                        .or_default()
                        .entry(*day)
                        .or_insert(0.0) += units;
                    let bucket = contributors
                        .entry((curve.resource_id.clone(), *day))
                        .or_default();
                    if !bucket.contains(&curve.activity_id) {
                        bucket.push(curve.activity_id);
                    }
                }
            }
        }
        Ok((demand, contributors))
    }

    /// First over-allocated bucket (resources and days in ascending order)
    /// that still has a contributor with float to spend; within the bucket,
    /// the contributor with the most remaining float is delayed, ties
    /// settled by the configured rule.
    fn pick_shift_candidate(
        &self,
        demand: &BTreeMap<String, BTreeMap<NaiveDate, f64>>,
        contributors: &BTreeMap<(String, NaiveDate), Vec<i32>>,
        shift_budget: &HashMap<i32, i64>,
    ) -> Option<i32> {
        for (resource_id, daily) in demand {
            let limit = self.catalog.get(resource_id)?.availability_per_day;
            for (&day, &units) in daily {
                if units <= limit + EPSILON {
                    continue;
                }
                let bucket = contributors.get(&(resource_id.clone(), day))?;
                let mut best: Option<(i64, i32)> = None;
                for &activity_id in bucket {
                    let budget = shift_budget.get(&activity_id).copied().unwrap_or(0);
                    if budget <= 0 {
                        continue;
                    }
                    let better = match best {
                        None => true,
                        Some((best_budget, best_id)) => {
                            budget > best_budget
                                || (budget == best_budget
                                    && match self.config.tie_break {
                                        TieBreak::LowestId => activity_id < best_id,
                                        TieBreak::HighestId => activity_id > best_id,
                                    })
                        }
                    };
                    if better {
                        best = Some((budget, activity_id));
                    }
                }
                if let Some((_, activity_id)) = best {
                    return Some(activity_id);
                }
            }
        }
        None
    }

    fn finalize_histogram(
        &self,
        demand: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
    ) -> ResourceHistogram {
        let mut histogram = ResourceHistogram::default();
        for (resource_id, daily) in demand {
            let limit = self
                .catalog
                .get(&resource_id)
                .map(|definition| definition.availability_per_day)
                .unwrap_or(0.0);
            let buckets: Vec<HistogramBucket> = daily
                .into_iter()
                .map(|(date, units)| HistogramBucket {
                    date,
                    demand: units,
                    limit,
                })
                .collect();
            for bucket in buckets.iter().filter(|bucket| bucket.is_over_allocated()) {
                histogram.unresolved.push(OverAllocation {
                    resource_id: resource_id.clone(),
                    date: bucket.date,
                    demand: bucket.demand,
                    limit: bucket.limit,
                });
            }
            histogram.per_resource.insert(resource_id, buckets);
        }
        histogram
    }
}
