//! Successor shifting.
//!
//! When a task's dates move and the move-successors preference is on, every
//! transitive dependency successor moves by the same delta. The shift is
//! two-pass: first collect the closure over "blocks" edges and record each
//! successor's original dates, then apply the delta to those recorded
//! originals simultaneously. A diamond-shaped graph therefore shifts each
//! node exactly once instead of compounding per path.

use chrono::{Duration, NaiveDate};

use crate::graph::TaskGraph;
use crate::task::Task;

/// One successor move, reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftedTask {
    pub id: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Compute the shifted dates of every transitive successor of `origin`.
///
/// The origin itself is excluded; the caller moves it first. Hierarchy
/// links never propagate a shift. A zero delta returns an empty plan.
pub fn shift_successors(
    graph: &TaskGraph,
    tasks: &[Task],
    origin: u64,
    delta_days: i64,
) -> Vec<ShiftedTask> {
    if delta_days == 0 {
        return Vec::new();
    }
    let delta = Duration::days(delta_days);

    // Pass 1: closure with original dates, before any mutation.
    let originals: Vec<(u64, NaiveDate, NaiveDate)> = graph
        .successor_closure(origin)
        .into_iter()
        .filter_map(|id| tasks.iter().find(|t| t.id == id).map(|t| (id, t.start, t.end)))
        .collect();

    // Pass 2: every recorded original moves by the same delta.
    originals
        .into_iter()
        .map(|(id, start, end)| ShiftedTask { id, start: start + delta, end: end + delta })
        .collect()
}

/// Apply a computed shift plan to the task rows.
pub fn apply_shift(tasks: &mut [Task], plan: &[ShiftedTask]) {
    for moved in plan {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == moved.id) {
            task.start = moved.start;
            task.end = moved.end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkLabel;
    use crate::testutil::{date, db_with, plain_task};

    fn chain() -> crate::db::Database {
        // A(1) blocks B(2) blocks C(3)
        db_with(
            vec![
                plain_task(1, "a", "2024-01-01", "2024-01-02"),
                plain_task(2, "b", "2024-01-03", "2024-01-04"),
                plain_task(3, "c", "2024-01-05", "2024-01-06"),
            ],
            &[(1, 2, LinkLabel::Blocks), (2, 3, LinkLabel::Blocks)],
        )
    }

    #[test]
    fn chain_shifts_each_successor_by_the_delta_once() {
        let db = chain();
        let g = TaskGraph::build(&db);
        let plan = shift_successors(&g, &db.tasks, 1, 2);
        assert_eq!(
            plan,
            vec![
                ShiftedTask { id: 2, start: date("2024-01-05"), end: date("2024-01-06") },
                ShiftedTask { id: 3, start: date("2024-01-07"), end: date("2024-01-08") },
            ]
        );
    }

    #[test]
    fn diamond_does_not_compound() {
        // 1 -> 2 -> 4 and 1 -> 3 -> 4: node 4 must move by the delta once.
        let db = db_with(
            vec![
                plain_task(1, "a", "2024-01-01", "2024-01-02"),
                plain_task(2, "b", "2024-01-03", "2024-01-04"),
                plain_task(3, "c", "2024-01-03", "2024-01-04"),
                plain_task(4, "d", "2024-01-05", "2024-01-06"),
            ],
            &[
                (1, 2, LinkLabel::Blocks),
                (1, 3, LinkLabel::Blocks),
                (2, 4, LinkLabel::Blocks),
                (3, 4, LinkLabel::Blocks),
            ],
        );
        let g = TaskGraph::build(&db);
        let plan = shift_successors(&g, &db.tasks, 1, 2);
        let four = plan.iter().find(|m| m.id == 4).unwrap();
        assert_eq!(four.start, date("2024-01-07"));
        assert_eq!(plan.iter().filter(|m| m.id == 4).count(), 1);
    }

    #[test]
    fn shift_is_linear_in_the_delta() {
        // shifting by 2 then 3 from the same baseline equals shifting by 5
        let mut db_a = chain();
        let g = TaskGraph::build(&db_a);
        let plan = shift_successors(&g, &db_a.tasks, 1, 2);
        apply_shift(&mut db_a.tasks, &plan);
        let plan = shift_successors(&g, &db_a.tasks, 1, 3);
        apply_shift(&mut db_a.tasks, &plan);

        let mut db_b = chain();
        let plan = shift_successors(&g, &db_b.tasks, 1, 5);
        apply_shift(&mut db_b.tasks, &plan);

        for (a, b) in db_a.tasks.iter().zip(db_b.tasks.iter()) {
            assert_eq!((a.start, a.end), (b.start, b.end), "task {}", a.id);
        }
    }

    #[test]
    fn hierarchy_links_do_not_propagate() {
        let db = db_with(
            vec![
                plain_task(1, "a", "2024-01-01", "2024-01-02"),
                plain_task(2, "b", "2024-01-03", "2024-01-04"),
            ],
            &[(1, 2, LinkLabel::IsAParentOf)],
        );
        let g = TaskGraph::build(&db);
        assert!(shift_successors(&g, &db.tasks, 1, 2).is_empty());
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let db = chain();
        let g = TaskGraph::build(&db);
        assert!(shift_successors(&g, &db.tasks, 1, 0).is_empty());
    }

    #[test]
    fn negative_delta_moves_successors_backwards() {
        let db = chain();
        let g = TaskGraph::build(&db);
        let plan = shift_successors(&g, &db.tasks, 2, -1);
        assert_eq!(
            plan,
            vec![ShiftedTask { id: 3, start: date("2024-01-04"), end: date("2024-01-05") }]
        );
    }
}
