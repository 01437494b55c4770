use crate::activity::DependencyLink;
use crate::error::ScheduleError;
use chrono::NaiveDate;
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use polars::prelude::*;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Activity network as a directed graph. Edges run predecessor -> successor
/// and carry the link type and lag; per-activity scheduling inputs are kept
/// alongside so the CPM passes never have to reach back into the frame.
#[derive(Debug)]
pub struct ActivityDag {
    pub graph: DiGraph<i32, DependencyLink>,
    pub id_to_index: HashMap<i32, NodeIndex>,
    pub durations: HashMap<i32, i64>,
    pub calendar_ids: HashMap<i32, String>,
    pub not_before: HashMap<i32, NaiveDate>,
}

impl ActivityDag {
    pub fn build(df: &DataFrame) -> Result<Self, ScheduleError> {
        let ids_ca = df.column("id")?.i32()?;
        let durations_ca = df.column("duration_days")?.i64()?;
        let calendar_ca = df.column("calendar_id")?.str()?;
        let not_before_ca = df.column("start_no_earlier_than")?.date()?;
        let preds_ca = df.column("predecessors")?.str()?;

        let mut graph: DiGraph<i32, DependencyLink> = DiGraph::new();
        let mut id_to_index: HashMap<i32, NodeIndex> = HashMap::new();
        let mut durations: HashMap<i32, i64> = HashMap::new();
        let mut calendar_ids: HashMap<i32, String> = HashMap::new();
        let mut not_before: HashMap<i32, NaiveDate> = HashMap::new();

        // Nodes first, so every dangling edge endpoint can be named.
        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            if let Some(activity_id) = id_opt {
                if id_to_index.contains_key(&activity_id) {
                    return Err(ScheduleError::DuplicateActivity { id: activity_id });
                }
                let node_ix = graph.add_node(activity_id);
                id_to_index.insert(activity_id, node_ix);
                durations.insert(activity_id, durations_ca.get(idx).unwrap_or(0));
                calendar_ids.insert(
                    activity_id,
                    calendar_ca
                        .get(idx)
                        .unwrap_or(crate::calendar::DEFAULT_CALENDAR_ID)
                        .to_string(),
                );
                if let Some(days) = not_before_ca.get(idx) {
                    not_before.insert(activity_id, crate::activity::Activity::date_from_i32(days));
                }
            }
        }

        // Edges: predecessor -> activity, weighted with the dependency link.
        let ids_ca = df.column("id")?.i32()?;
        for (idx, id_opt) in ids_ca.into_iter().enumerate() {
            if let Some(activity_id) = id_opt {
                let payload = preds_ca.get(idx).unwrap_or("[]");
                let links: Vec<DependencyLink> = serde_json::from_str(payload).map_err(|err| {
                    ScheduleError::Validation(format!(
                        "activity {activity_id}: invalid predecessors payload: {err}"
                    ))
                })?;
                for link in links {
                    let from = link.predecessor_id;
                    match (id_to_index.get(&from), id_to_index.get(&activity_id)) {
                        (Some(&u), Some(&v)) => {
                            graph.add_edge(u, v, link);
                        }
                        _ => {
                            return Err(ScheduleError::DanglingRelationship {
                                from,
                                to: activity_id,
                            });
                        }
                    }
                }
            }
        }

        Ok(Self {
            graph,
            id_to_index,
            durations,
            calendar_ids,
            not_before,
        })
    }

    /// Kahn's algorithm with a min-heap ready set, so the order is
    /// deterministic: among activities whose predecessors are all placed,
    /// the lowest id goes first. The same walk is the cycle check; any node
    /// never drained is in a cycle or blocked behind one, and is reported
    /// by id.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, ScheduleError> {
        let mut indegree: HashMap<NodeIndex, usize> = HashMap::new();
        for node_ix in self.graph.node_indices() {
            indegree.insert(
                node_ix,
                self.graph
                    .neighbors_directed(node_ix, Direction::Incoming)
                    .count(),
            );
        }

        let mut ready: BinaryHeap<Reverse<i32>> = BinaryHeap::new();
        for (&node_ix, &degree) in &indegree {
            if degree == 0 {
                ready.push(Reverse(self.graph[node_ix]));
            }
        }

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(activity_id)) = ready.pop() {
            let node_ix = self.id_to_index[&activity_id];
            order.push(node_ix);
            for succ_ix in self.graph.neighbors_directed(node_ix, Direction::Outgoing) {
                if let Some(remaining) = indegree.get_mut(&succ_ix) {
                    *remaining -= 1;
                    if *remaining == 0 {
                        ready.push(Reverse(self.graph[succ_ix]));
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            // Report only the activities inside a cycle, not the ones merely
            // stuck downstream of one.
            let mut activity_ids: Vec<i32> = tarjan_scc(&self.graph)
                .into_iter()
                .filter(|component| {
                    component.len() > 1
                        || self.graph.contains_edge(component[0], component[0])
                })
                .flatten()
                .map(|node_ix| self.graph[node_ix])
                .collect();
            activity_ids.sort_unstable();
            return Err(ScheduleError::CycleDetected { activity_ids });
        }

        Ok(order)
    }

    /// Activities with no successors. Empty on a non-empty graph means the
    /// network cannot anchor a backward pass.
    pub fn sinks(&self) -> Vec<NodeIndex> {
        let mut sinks: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&node_ix| {
                self.graph
                    .neighbors_directed(node_ix, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .collect();
        sinks.sort_by_key(|&node_ix| self.graph[node_ix]);
        sinks
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
