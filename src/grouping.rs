//! Display grouping projection.
//!
//! Re-buckets the flat task list into synthetic parent groups by assignee,
//! category or sprint. Each bucket gets a read-only pseudo-task spanning its
//! members' dates with averaged progress, and the members are re-parented
//! under it in the projection only; nothing is written back. Tasks whose
//! derived parent is an ordinary task stay attached to that task and follow
//! it into its bucket.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::db::Database;
use crate::fields::GroupBy;
use crate::graph::TaskGraph;
use crate::snapshot::{format_snapshot_date, gantt_task_row, GanttTask};
use crate::task::Task;

/// Synthetic group ids count down from here, far below any real task id.
const GROUP_ID_BASE: i64 = -100_000;

/// Bucket label for one task under the given mode.
fn group_label(db: &Database, graph: &TaskGraph, task: &Task, mode: GroupBy) -> String {
    match mode {
        GroupBy::None => String::new(),
        GroupBy::Assignee => {
            let name = db.person_name(task.owner_id);
            if name.is_empty() { "Unassigned".to_string() } else { name }
        }
        GroupBy::Category => {
            let name = db.category_name(task.category_id);
            if name.is_empty() { "Uncategorized".to_string() } else { name }
        }
        GroupBy::Sprint => match graph.sprint_of(task.id).and_then(|id| db.get(id)) {
            Some(sprint) => sprint.title.clone(),
            None => "No Sprint".to_string(),
        },
    }
}

/// Project the task list for display under a grouping mode.
///
/// `GroupBy::None` returns the plain snapshot rows in stored order.
pub fn project_grouped(db: &Database, graph: &TaskGraph, mode: GroupBy) -> Vec<GanttTask> {
    let rows: Vec<GanttTask> = db.tasks.iter().map(|t| gantt_task_row(db, graph, t)).collect();
    if mode == GroupBy::None {
        return rows;
    }

    // Subtasks of a real task keep their parent; everything else buckets.
    let mut subtasks: HashMap<i64, Vec<GanttTask>> = HashMap::new();
    let mut bucket_order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<GanttTask>> = HashMap::new();

    for row in rows {
        let id = row.id as u64;
        if graph.parent_task_of(id).is_some() {
            subtasks.entry(row.parent).or_default().push(row);
            continue;
        }
        let task = match db.get(id) {
            Some(t) => t,
            None => continue,
        };
        let label = group_label(db, graph, task, mode);
        if !buckets.contains_key(&label) {
            bucket_order.push(label.clone());
        }
        buckets.entry(label).or_default().push(row);
    }

    let mut data = Vec::new();
    let mut group_id = GROUP_ID_BASE;

    for label in bucket_order {
        let members = buckets.remove(&label).unwrap_or_default();

        // Summary range and mean progress over the bucket.
        let mut span: Option<(NaiveDate, NaiveDate)> = None;
        let mut progress_sum = 0.0;
        for row in &members {
            let (Some(start), Some(end)) = (parse_row_date(&row.start_date), parse_row_date(&row.end_date)) else {
                continue;
            };
            span = Some(match span {
                None => (start, end),
                Some((lo, hi)) => (lo.min(start), hi.max(end)),
            });
            progress_sum += row.progress;
        }
        let (start, end) = span.unwrap_or_else(|| {
            let today = chrono::Local::now().date_naive();
            (today, today)
        });

        data.push(GanttTask {
            id: group_id,
            text: format!("{}: {}", mode.label_prefix(), label),
            start_date: format_snapshot_date(start),
            end_date: format_snapshot_date(end),
            duration: ((end - start).num_days() + 1).max(1),
            progress: if members.is_empty() { 0.0 } else { progress_sum / members.len() as f64 },
            priority: "normal".to_string(),
            color: String::new(),
            owner_id: 0,
            category_id: 0,
            task_type: "group".to_string(),
            sprint_id: 0,
            child_tasks: Vec::new(),
            parent: 0,
            is_milestone: false,
            readonly: true,
        });

        for mut row in members {
            let row_id = row.id;
            row.parent = group_id;
            data.push(row);
            append_subtree(row_id, &mut subtasks, &mut data);
        }

        group_id -= 1;
    }

    // subtasks whose stored parent row is missing still get emitted,
    // promoted to top level like the tree view's orphan fallback
    let mut orphan_parents: Vec<i64> = subtasks.keys().copied().collect();
    orphan_parents.sort_unstable();
    for parent in orphan_parents {
        let Some(children) = subtasks.remove(&parent) else { continue };
        for mut child in children {
            let id = child.id;
            child.parent = 0;
            data.push(child);
            append_subtree(id, &mut subtasks, &mut data);
        }
    }

    data
}

/// Append the subtask tree under `parent` depth-first, so nested subtasks
/// follow their own parent into the bucket.
fn append_subtree(parent: i64, subtasks: &mut HashMap<i64, Vec<GanttTask>>, out: &mut Vec<GanttTask>) {
    let Some(children) = subtasks.remove(&parent) else { return };
    for child in children {
        let id = child.id;
        out.push(child);
        append_subtree(id, subtasks, out);
    }
}

fn parse_row_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.split(' ').next().unwrap_or(s), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Category, Person};
    use crate::fields::TaskType;
    use crate::link::LinkLabel;
    use crate::testutil::{db_with, plain_task, typed_task};

    fn sample() -> Database {
        let mut db = db_with(
            vec![
                plain_task(1, "Design", "2024-06-03", "2024-06-05"),
                plain_task(2, "Build", "2024-06-06", "2024-06-10"),
                plain_task(3, "Review", "2024-06-04", "2024-06-04"),
                plain_task(5, "Notes", "2024-06-04", "2024-06-04"),
                typed_task(10, "Sprint 1", "2024-06-01", "2024-06-01", TaskType::Sprint),
            ],
            &[
                // 3 is a subtask of 1, 5 a subtask of 3; 2 belongs to sprint 10
                (1, 3, LinkLabel::IsAParentOf),
                (3, 5, LinkLabel::IsAParentOf),
                (10, 2, LinkLabel::IsAParentOf),
            ],
        );
        db.people.push(Person { id: 7, name: "Alice".into() });
        db.categories.push(Category { id: 4, name: "Core".into(), color: None });
        db.get_mut(1).unwrap().owner_id = 7;
        db.get_mut(1).unwrap().progress = 0.5;
        db.get_mut(2).unwrap().progress = 0.25;
        db
    }

    fn real_ids(rows: &[GanttTask]) -> Vec<i64> {
        let mut ids: Vec<i64> = rows.iter().map(|r| r.id).filter(|&id| id > 0).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn none_mode_returns_plain_rows() {
        let db = sample();
        let g = TaskGraph::build(&db);
        let rows = project_grouped(&db, &g, GroupBy::None);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.id > 0));
    }

    #[test]
    fn assignee_buckets_with_unassigned_fallback() {
        let db = sample();
        let g = TaskGraph::build(&db);
        let rows = project_grouped(&db, &g, GroupBy::Assignee);

        let labels: Vec<&str> = rows.iter().filter(|r| r.id < 0).map(|r| r.text.as_str()).collect();
        assert_eq!(labels, vec!["Assignee: Alice", "Assignee: Unassigned"]);

        // Alice's bucket carries task 1 re-parented under the synthetic id,
        // with its subtask 3 (and 3's own subtask 5) still attached.
        let alice_group = rows.iter().find(|r| r.text == "Assignee: Alice").unwrap();
        let design = rows.iter().find(|r| r.id == 1).unwrap();
        assert_eq!(design.parent, alice_group.id);
        let review = rows.iter().find(|r| r.id == 3).unwrap();
        assert_eq!(review.parent, 1);
        let notes = rows.iter().find(|r| r.id == 5).unwrap();
        assert_eq!(notes.parent, 3);
    }

    #[test]
    fn nested_subtasks_follow_their_parent_into_the_bucket() {
        // chain 1 <- 2 <- 3: only 1 buckets, 2 and 3 must still be emitted
        // in tree order below it
        let db = db_with(
            vec![
                plain_task(1, "top", "2024-06-03", "2024-06-05"),
                plain_task(2, "child", "2024-06-03", "2024-06-04"),
                plain_task(3, "grandchild", "2024-06-03", "2024-06-03"),
            ],
            &[(1, 2, LinkLabel::IsAParentOf), (2, 3, LinkLabel::IsAParentOf)],
        );
        let g = TaskGraph::build(&db);
        let rows = project_grouped(&db, &g, GroupBy::Assignee);
        let ids: Vec<i64> = rows.iter().filter(|r| r.id > 0).map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(rows.iter().find(|r| r.id == 2).unwrap().parent, 1);
        assert_eq!(rows.iter().find(|r| r.id == 3).unwrap().parent, 2);
    }

    #[test]
    fn subtask_of_a_missing_parent_is_promoted_to_top_level() {
        // stored hierarchy link points at a task that no longer exists
        let db = db_with(
            vec![plain_task(2, "stray", "2024-06-03", "2024-06-04")],
            &[(9, 2, LinkLabel::IsAParentOf)],
        );
        let g = TaskGraph::build(&db);
        let rows = project_grouped(&db, &g, GroupBy::Assignee);
        let stray = rows.iter().find(|r| r.id == 2).unwrap();
        assert_eq!(stray.parent, 0);
    }

    #[test]
    fn projection_is_lossless_for_real_tasks() {
        let db = sample();
        let g = TaskGraph::build(&db);
        let plain = project_grouped(&db, &g, GroupBy::None);
        for mode in [GroupBy::Assignee, GroupBy::Category, GroupBy::Sprint] {
            let rows = project_grouped(&db, &g, mode);
            assert_eq!(real_ids(&rows), vec![1, 2, 3, 5, 10], "{mode:?}");
            // leaf attributes are untouched apart from the parent pointer
            for row in rows.iter().filter(|r| r.id > 0) {
                let original = plain.iter().find(|r| r.id == row.id).unwrap();
                let mut reparented = row.clone();
                reparented.parent = original.parent;
                assert_eq!(&reparented, original, "{mode:?} id {}", row.id);
            }
        }
    }

    #[test]
    fn group_rows_span_members_and_average_progress() {
        let db = sample();
        let g = TaskGraph::build(&db);
        let rows = project_grouped(&db, &g, GroupBy::Sprint);
        let group = rows.iter().find(|r| r.text == "Sprint: Sprint 1").unwrap();
        assert_eq!(group.start_date, "2024-06-06 00:00");
        assert_eq!(group.end_date, "2024-06-10 00:00");
        assert!((group.progress - 0.25).abs() < f64::EPSILON);
        assert!(group.readonly);
        assert!(group.id <= GROUP_ID_BASE);
    }

    #[test]
    fn synthetic_ids_are_unique_and_descending() {
        let db = sample();
        let g = TaskGraph::build(&db);
        let rows = project_grouped(&db, &g, GroupBy::Category);
        let ids: Vec<i64> = rows.iter().map(|r| r.id).filter(|&id| id < 0).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
        assert!(ids.iter().all(|&id| id <= GROUP_ID_BASE));
    }
}
