//! Sprint span aggregation.
//!
//! A sprint's dates are a derived view: earliest child start to latest child
//! end, recomputed wherever sprints are rendered (list, snapshot, TUI) and
//! never written back to the stored rows. Ordinary parent tasks keep their
//! own dates; only sprint-typed containers aggregate.

use chrono::NaiveDate;

use crate::graph::TaskGraph;
use crate::task::Task;

/// Min/max span over the sprint's hierarchy children.
///
/// `None` when the task is not a sprint or has no members (no-op: the
/// sprint keeps its stored dates).
pub fn sprint_span(graph: &TaskGraph, tasks: &[Task], sprint_id: u64) -> Option<(NaiveDate, NaiveDate)> {
    let sprint = tasks.iter().find(|t| t.id == sprint_id)?;
    if !sprint.is_sprint() {
        return None;
    }
    let mut span: Option<(NaiveDate, NaiveDate)> = None;
    for &child_id in graph.children_of(sprint_id) {
        let Some(child) = tasks.iter().find(|t| t.id == child_id) else {
            continue;
        };
        span = Some(match span {
            None => (child.start, child.end),
            Some((lo, hi)) => (lo.min(child.start), hi.max(child.end)),
        });
    }
    span
}

/// Effective dates for display: aggregated span for sprints with members,
/// stored dates otherwise.
pub fn effective_dates(graph: &TaskGraph, tasks: &[Task], task: &Task) -> (NaiveDate, NaiveDate) {
    sprint_span(graph, tasks, task.id).unwrap_or((task.start, task.end))
}
