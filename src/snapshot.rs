//! Client-visible project snapshot.
//!
//! Serializes the project into the `{data, links}` JSON shape the chart
//! front end consumes: one flat row per task with derived parent/sprint
//! fields and display color, plus the dependency links normalized to
//! "blocks" orientation. Hierarchy links are folded into `parent` /
//! `child_tasks` and never appear in `links`.

use serde::{Deserialize, Serialize};

use crate::aggregate::effective_dates;
use crate::db::Database;
use crate::fields::{format_priority, format_task_type};
use crate::graph::TaskGraph;
use crate::task::Task;

/// One task row in the wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GanttTask {
    /// Real task id, or a negative synthetic id for projected group rows.
    pub id: i64,
    pub text: String,
    pub start_date: String,
    pub end_date: String,
    pub duration: i64,
    pub progress: f64,
    pub priority: String,
    pub color: String,
    pub owner_id: u64,
    /// Kept for the grouping projection; not part of the wire shape.
    #[serde(skip)]
    pub category_id: u64,
    pub task_type: String,
    /// Containing sprint id, 0 = none.
    pub sprint_id: u64,
    /// Member ids, filled for sprint rows only.
    pub child_tasks: Vec<u64>,
    /// Derived hierarchy parent (sprint or task), 0 = top-level.
    pub parent: i64,
    pub is_milestone: bool,
    pub readonly: bool,
}

/// One dependency edge in the wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GanttLink {
    pub id: u64,
    pub source: u64,
    pub target: u64,
    #[serde(rename = "type")]
    pub link_type: String,
}

/// The full project snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: Vec<GanttTask>,
    pub links: Vec<GanttLink>,
}

/// Wire date format: day precision rendered at midnight.
pub fn format_snapshot_date(d: chrono::NaiveDate) -> String {
    format!("{} 00:00", d.format("%Y-%m-%d"))
}

/// Project one task row. Sprint rows get their aggregated span and member
/// list; everything else carries its stored dates.
pub fn gantt_task_row(db: &Database, graph: &TaskGraph, task: &Task) -> GanttTask {
    let (start, end) = effective_dates(graph, &db.tasks, task);
    let duration = if task.is_milestone() {
        0
    } else {
        ((end - start).num_days() + 1).max(1)
    };
    let child_tasks = if task.is_sprint() {
        graph.children_of(task.id).to_vec()
    } else {
        Vec::new()
    };
    GanttTask {
        id: task.id as i64,
        text: task.title.clone(),
        start_date: format_snapshot_date(start),
        end_date: format_snapshot_date(end),
        duration,
        progress: task.progress,
        priority: format_priority(task.priority).to_string(),
        color: db.task_color(task),
        owner_id: task.owner_id,
        category_id: task.category_id,
        task_type: format_task_type(task.task_type).to_string(),
        sprint_id: graph.sprint_of(task.id).unwrap_or(0),
        child_tasks,
        parent: graph.parent_of(task.id).unwrap_or(0) as i64,
        is_milestone: task.is_milestone(),
        readonly: false,
    }
}

/// Dependency links in canonical orientation. Edges that break the
/// same-level rule (pathological stored data) are filtered out rather than
/// handed to the client.
pub fn snapshot_links(db: &Database, graph: &TaskGraph) -> Vec<GanttLink> {
    let mut out = Vec::new();
    for link in &db.links {
        if !link.label.is_dependency() {
            continue;
        }
        let (source, target, _) = link.normalized();
        if db.get(source).is_none() || db.get(target).is_none() {
            continue;
        }
        let pa = graph.level_parent(source);
        let pb = graph.level_parent(target);
        let same_level = matches!((pa, pb), (None, None)) || (pa.is_some() && pa == pb);
        if !same_level {
            continue;
        }
        out.push(GanttLink { id: link.id, source, target, link_type: "0".to_string() });
    }
    out
}

/// Build the full snapshot in stored task order.
pub fn build_snapshot(db: &Database) -> Snapshot {
    let graph = TaskGraph::build(db);
    let data = db.tasks.iter().map(|t| gantt_task_row(db, &graph, t)).collect();
    let links = snapshot_links(db, &graph);
    Snapshot { data, links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Category, MILESTONE_COLOR};
    use crate::fields::TaskType;
    use crate::link::LinkLabel;
    use crate::testutil::{db_with, plain_task, typed_task};

    fn sample() -> Database {
        let mut db = db_with(
            vec![
                typed_task(10, "Sprint 1", "2024-06-01", "2024-06-01", TaskType::Sprint),
                plain_task(1, "Design", "2024-06-03", "2024-06-05"),
                plain_task(2, "Build", "2024-06-06", "2024-06-10"),
                typed_task(3, "Ship", "2024-06-11", "2024-06-11", TaskType::Milestone),
            ],
            &[
                (10, 1, LinkLabel::IsAParentOf),
                (10, 2, LinkLabel::IsAParentOf),
                (2, 1, LinkLabel::IsBlockedBy),
            ],
        );
        db.categories.push(Category { id: 4, name: "Core".into(), color: Some("#0a0a0a".into()) });
        db
    }

    #[test]
    fn sprint_rows_carry_aggregated_span_and_members() {
        let db = sample();
        let snap = build_snapshot(&db);
        let sprint = snap.data.iter().find(|r| r.id == 10).unwrap();
        assert_eq!(sprint.start_date, "2024-06-03 00:00");
        assert_eq!(sprint.end_date, "2024-06-10 00:00");
        assert_eq!(sprint.child_tasks, vec![1, 2]);
        assert_eq!(sprint.task_type, "sprint");
    }

    #[test]
    fn member_rows_point_at_their_sprint() {
        let db = sample();
        let snap = build_snapshot(&db);
        let design = snap.data.iter().find(|r| r.id == 1).unwrap();
        assert_eq!(design.sprint_id, 10);
        assert_eq!(design.parent, 10);
        assert_eq!(design.duration, 3);
    }

    #[test]
    fn milestones_render_green_with_zero_duration() {
        let db = sample();
        let snap = build_snapshot(&db);
        let ship = snap.data.iter().find(|r| r.id == 3).unwrap();
        assert!(ship.is_milestone);
        assert_eq!(ship.duration, 0);
        assert_eq!(ship.color, MILESTONE_COLOR);
    }

    #[test]
    fn inverse_dependency_is_normalized_in_links() {
        let db = sample();
        let snap = build_snapshot(&db);
        assert_eq!(snap.links.len(), 1);
        let l = &snap.links[0];
        // "2 is blocked by 1" serializes as 1 -> 2
        assert_eq!((l.source, l.target, l.link_type.as_str()), (1, 2, "0"));
    }

    #[test]
    fn cross_level_stored_links_are_filtered() {
        // 1 is a child of 2; a stored dependency 1 -> 3 crosses levels
        let db = db_with(
            vec![
                plain_task(1, "a", "2024-06-01", "2024-06-02"),
                plain_task(2, "b", "2024-06-01", "2024-06-02"),
                plain_task(3, "c", "2024-06-01", "2024-06-02"),
            ],
            &[(2, 1, LinkLabel::IsAParentOf), (1, 3, LinkLabel::Blocks)],
        );
        let snap = build_snapshot(&db);
        assert!(snap.links.is_empty());
    }

    #[test]
    fn wire_shape_field_names_survive_serialization() {
        let db = sample();
        let snap = build_snapshot(&db);
        let json = serde_json::to_value(&snap).unwrap();
        let row = &json["data"][0];
        for field in [
            "id", "text", "start_date", "end_date", "duration", "progress", "priority",
            "color", "owner_id", "task_type", "sprint_id", "child_tasks", "parent",
            "is_milestone", "readonly",
        ] {
            assert!(row.get(field).is_some(), "missing field {field}");
        }
        // internal-only field stays out of the client JSON
        assert!(row.get("category_id").is_none());
        assert_eq!(json["links"][0]["type"], "0");
    }
}
