use crate::activity::Activity;
use crate::calendar::CalendarSet;
use crate::error::ScheduleError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cost-schedule performance as of one status date.
///
/// A pure value: recomputed fresh per as-of date, never cached, never a
/// mutation of the activity data it was derived from. Ratios with a zero
/// denominator are `None` and serialize as null, not as infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnedValueSnapshot {
    pub as_of: NaiveDate,
    /// Budget at Completion: total budgeted cost across all activities.
    pub bac: f64,
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    /// SV = EV - PV.
    pub schedule_variance: f64,
    /// CV = EV - AC.
    pub cost_variance: f64,
    /// EV / PV; None while no work was planned to have started.
    pub spi: Option<f64>,
    /// EV / AC; None until any actual cost is booked.
    pub cpi: Option<f64>,
    /// BAC / CPI when CPI is defined, otherwise BAC.
    pub estimate_at_completion: f64,
}

pub struct EarnedValueAnalyzer<'a> {
    calendars: &'a CalendarSet,
}

impl<'a> EarnedValueAnalyzer<'a> {
    pub fn new(calendars: &'a CalendarSet) -> Self {
        Self { calendars }
    }

    pub fn analyze(
        &self,
        activities: &[Activity],
        as_of: NaiveDate,
    ) -> Result<EarnedValueSnapshot, ScheduleError> {
        let mut bac = 0.0;
        let mut planned_value = 0.0;
        let mut earned_value = 0.0;
        let mut actual_cost = 0.0;

        for activity in activities {
            let calendar = self.calendars.resolve(&activity.calendar_id)?;
            let (start, finish) = match (activity.early_start, activity.early_finish) {
                (Some(start), Some(finish)) => (start, finish),
                _ => {
                    return Err(ScheduleError::Validation(format!(
                        "activity {} has no computed dates; solve the schedule before analysis",
                        activity.id
                    )));
                }
            };

            let planned_fraction = if activity.duration_days == 0 {
                // Milestones earn their entire planned value at their date.
                if as_of >= start { 1.0 } else { 0.0 }
            } else if as_of >= finish {
                1.0
            } else if as_of <= start {
                0.0
            } else {
                let elapsed = calendar.working_days_between(start, as_of) as f64;
                (elapsed / activity.duration_days as f64).clamp(0.0, 1.0)
            };

            bac += activity.budgeted_cost;
            planned_value += activity.budgeted_cost * planned_fraction;
            earned_value += activity.budgeted_cost * activity.percent_complete / 100.0;
            actual_cost += activity.actual_cost;
        }

        let spi = (planned_value != 0.0).then(|| earned_value / planned_value);
        let cpi = (actual_cost != 0.0).then(|| earned_value / actual_cost);
        let estimate_at_completion = match cpi {
            Some(cpi) if cpi != 0.0 => bac / cpi,
            _ => bac,
        };

        Ok(EarnedValueSnapshot {
            as_of,
            bac,
            planned_value,
            earned_value,
            actual_cost,
            schedule_variance: earned_value - planned_value,
            cost_variance: earned_value - actual_cost,
            spi,
            cpi,
            estimate_at_completion,
        })
    }
}
