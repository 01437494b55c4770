use crate::calendar::CalendarSet;
use crate::error::ScheduleError;
use crate::graph::ActivityDag;
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Computes earliest start/finish boundaries for every activity.
pub struct ForwardPass<'a> {
    dag: &'a ActivityDag,
    calendars: &'a CalendarSet,
}

impl<'a> ForwardPass<'a> {
    pub fn new(dag: &'a ActivityDag, calendars: &'a CalendarSet) -> Self {
        Self { dag, calendars }
    }

    pub fn execute(
        &self,
        project_start: NaiveDate,
    ) -> Result<HashMap<i32, (NaiveDate, NaiveDate)>, ScheduleError> {
        let mut results: HashMap<i32, (NaiveDate, NaiveDate)> = HashMap::new();
        let order = self.dag.topological_order()?;

        for node_ix in order {
            let activity_id = self.dag.graph[node_ix];
            let calendar_id = &self.dag.calendar_ids[&activity_id];
            let calendar = self.calendars.resolve(calendar_id)?;
            let duration = *self.dag.durations.get(&activity_id).unwrap_or(&0);

            // Floor: project start, raised by an explicit not-before
            // constraint. A negative lag can never pull work before this.
            let mut early_start = project_start;
            if let Some(&not_before) = self.dag.not_before.get(&activity_id) {
                if not_before > early_start {
                    early_start = not_before;
                }
            }

            for edge in self.dag.graph.edges_directed(node_ix, Direction::Incoming) {
                let link = edge.weight();
                let pred_id = self.dag.graph[edge.source()];
                let (pred_es, pred_ef) = results[&pred_id];

                let candidate = match link.link_type {
                    crate::activity::LinkType::FinishToStart => {
                        calendar.offset(pred_ef, link.lag_days)
                    }
                    crate::activity::LinkType::StartToStart => {
                        calendar.offset(pred_es, link.lag_days)
                    }
                    crate::activity::LinkType::FinishToFinish => {
                        let finish = calendar.offset(pred_ef, link.lag_days);
                        calendar.subtract_duration(calendar.roll_forward(finish), duration)
                    }
                    crate::activity::LinkType::StartToFinish => {
                        let finish = calendar.offset(pred_es, link.lag_days);
                        calendar.subtract_duration(calendar.roll_forward(finish), duration)
                    }
                };
                if candidate > early_start {
                    early_start = candidate;
                }
            }

            let early_start = calendar.roll_forward(early_start);
            let early_finish = calendar.add_duration(early_start, duration);
            results.insert(activity_id, (early_start, early_finish));
        }

        Ok(results)
    }
}
