use crate::activity::LinkType;
use crate::calendar::CalendarSet;
use crate::error::ScheduleError;
use crate::graph::ActivityDag;
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Computes latest start/finish boundaries, anchored at the project finish
/// discovered by the forward pass.
pub struct BackwardPass<'a> {
    dag: &'a ActivityDag,
    calendars: &'a CalendarSet,
}

impl<'a> BackwardPass<'a> {
    pub fn new(dag: &'a ActivityDag, calendars: &'a CalendarSet) -> Self {
        Self { dag, calendars }
    }

    pub fn execute(
        &self,
        project_finish: NaiveDate,
    ) -> Result<HashMap<i32, (NaiveDate, NaiveDate)>, ScheduleError> {
        let mut results: HashMap<i32, (NaiveDate, NaiveDate)> = HashMap::new();

        let mut order = self.dag.topological_order()?;
        order.reverse();

        for node_ix in order {
            let activity_id = self.dag.graph[node_ix];
            let calendar_id = &self.dag.calendar_ids[&activity_id];
            let calendar = self.calendars.resolve(calendar_id)?;
            let duration = *self.dag.durations.get(&activity_id).unwrap_or(&0);

            let mut late_finish = project_finish;
            for edge in self.dag.graph.edges_directed(node_ix, Direction::Outgoing) {
                let link = edge.weight();
                let succ_id = self.dag.graph[edge.target()];
                let succ_calendar = self.calendars.resolve(&self.dag.calendar_ids[&succ_id])?;
                let (succ_ls, succ_lf) = results[&succ_id];

                // Mirror of the forward-pass constraint for each link type,
                // expressed as a bound on this activity's latest finish. Lags
                // count working days of the successor's calendar in both
                // directions; only this activity's own duration moves through
                // its own calendar.
                let candidate = match link.link_type {
                    LinkType::FinishToStart => succ_calendar.offset(succ_ls, -link.lag_days),
                    LinkType::StartToStart => {
                        let latest_start = succ_calendar.offset(succ_ls, -link.lag_days);
                        calendar.add_duration(latest_start, duration)
                    }
                    LinkType::FinishToFinish => succ_calendar.offset(succ_lf, -link.lag_days),
                    LinkType::StartToFinish => {
                        let latest_start = succ_calendar.offset(succ_lf, -link.lag_days);
                        calendar.add_duration(latest_start, duration)
                    }
                };
                if candidate < late_finish {
                    late_finish = candidate;
                }
            }

            let late_start = calendar.subtract_duration(late_finish, duration);
            results.insert(activity_id, (late_start, late_finish));
        }

        Ok(results)
    }
}
