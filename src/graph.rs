//! Adjacency index over the link table.
//!
//! The link table stores hierarchy and dependency edges side by side,
//! distinguished only by label. Scanning it on every access gets quadratic
//! fast, so `TaskGraph` builds the derived relations once per read:
//! parent/child from hierarchy labels, successor/predecessor from dependency
//! labels, with inverse labels ("is a child of", "is blocked by") folded
//! into the canonical orientation.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::db::Database;
use crate::fields::TaskType;
use crate::task::Task;

/// Derived relations for one snapshot of the task/link tables.
///
/// The link set is the single source of truth for parentage and sprint
/// membership; tasks carry no parent column. Rebuild after structural edits.
#[derive(Debug, Default)]
pub struct TaskGraph {
    /// child -> parent, from hierarchy links. First link wins when the
    /// stored data pathologically disagrees.
    parent: HashMap<u64, u64>,
    /// parent -> children, in link-table order.
    children: HashMap<u64, Vec<u64>>,
    /// source -> targets over "blocks" edges (canonical orientation).
    successors: HashMap<u64, Vec<u64>>,
    /// target -> sources over "blocks" edges.
    predecessors: HashMap<u64, Vec<u64>>,
    /// Task id -> is the task sprint-typed.
    sprint_ids: HashSet<u64>,
}

impl TaskGraph {
    /// Build the index from a database snapshot.
    pub fn build(db: &Database) -> Self {
        Self::from_parts(&db.tasks, db.links.iter().map(|l| l.normalized()))
    }

    fn from_parts(
        tasks: &[Task],
        normalized_links: impl Iterator<Item = (u64, u64, crate::link::LinkLabel)>,
    ) -> Self {
        use crate::link::LinkLabel;

        let mut graph = TaskGraph::default();
        for t in tasks {
            if t.task_type == TaskType::Sprint {
                graph.sprint_ids.insert(t.id);
            }
        }
        for (source, target, label) in normalized_links {
            match label {
                LinkLabel::Blocks => {
                    graph.successors.entry(source).or_default().push(target);
                    graph.predecessors.entry(target).or_default().push(source);
                }
                LinkLabel::IsAParentOf => {
                    graph.parent.entry(target).or_insert(source);
                    graph.children.entry(source).or_default().push(target);
                }
                // normalized() never yields inverse labels
                _ => {}
            }
        }
        graph
    }

    /// Hierarchy parent (sprint or regular), if any.
    pub fn parent_of(&self, id: u64) -> Option<u64> {
        self.parent.get(&id).copied()
    }

    /// Parent when it is an ordinary task; sprint containers excluded.
    pub fn parent_task_of(&self, id: u64) -> Option<u64> {
        self.parent_of(id).filter(|p| !self.sprint_ids.contains(p))
    }

    /// Containing sprint, if the derived parent is sprint-typed.
    pub fn sprint_of(&self, id: u64) -> Option<u64> {
        self.parent_of(id).filter(|p| self.sprint_ids.contains(p))
    }

    /// Hierarchy children (sprint members or subtasks), link-table order.
    pub fn children_of(&self, id: u64) -> &[u64] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct dependency successors ("blocks" orientation).
    pub fn successors_of(&self, id: u64) -> &[u64] {
        self.successors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct dependency predecessors.
    pub fn predecessors_of(&self, id: u64) -> &[u64] {
        self.predecessors.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `to` is reachable from `from` over dependency edges only.
    /// Hierarchy edges are never traversed.
    pub fn reaches(&self, from: u64, to: u64) -> bool {
        if from == to {
            return true;
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([from]);
        seen.insert(from);
        while let Some(id) = queue.pop_front() {
            for &next in self.successors_of(id) {
                if next == to {
                    return true;
                }
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// The hierarchy level used by the same-level link rule: a task's
    /// derived parent, `None` meaning top-level.
    pub fn level_parent(&self, id: u64) -> Option<u64> {
        self.parent_of(id)
    }

    /// Transitive closure of dependency successors, excluding `origin`
    /// itself. Each task appears once regardless of how many paths lead
    /// to it.
    pub fn successor_closure(&self, origin: u64) -> Vec<u64> {
        let mut seen = HashSet::from([origin]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([origin]);
        while let Some(id) = queue.pop_front() {
            for &next in self.successors_of(id) {
                if seen.insert(next) {
                    order.push(next);
                    queue.push_back(next);
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TaskType;
    use crate::link::LinkLabel;
    use crate::testutil::{db_with, plain_task, typed_task};

    fn sample() -> Database {
        // sprint 10 contains 1 and 2; 3 is a subtask of 1 (stored as the
        // inverse "is a child of" row); dependency chain 1 -> 2 -> 4.
        db_with(
            vec![
                plain_task(1, "a", "2024-01-01", "2024-01-02"),
                plain_task(2, "b", "2024-01-03", "2024-01-04"),
                plain_task(3, "c", "2024-01-01", "2024-01-01"),
                plain_task(4, "d", "2024-01-05", "2024-01-06"),
                typed_task(10, "s", "2024-01-01", "2024-01-06", TaskType::Sprint),
            ],
            &[
                (10, 1, LinkLabel::IsAParentOf),
                (10, 2, LinkLabel::IsAParentOf),
                (3, 1, LinkLabel::IsAChildOf),
                (1, 2, LinkLabel::Blocks),
                (4, 2, LinkLabel::IsBlockedBy),
            ],
        )
    }

    #[test]
    fn parent_and_sprint_are_derived_from_links() {
        let db = sample();
        let g = TaskGraph::build(&db);
        assert_eq!(g.sprint_of(1), Some(10));
        assert_eq!(g.parent_task_of(1), None);
        assert_eq!(g.parent_task_of(3), Some(1));
        assert_eq!(g.sprint_of(3), None);
        assert_eq!(g.parent_of(4), None);
        assert_eq!(g.children_of(10), &[1, 2]);
    }

    #[test]
    fn inverse_dependency_rows_fold_into_blocks_orientation() {
        let db = sample();
        let g = TaskGraph::build(&db);
        // "4 is blocked by 2" indexes as 2 -> 4
        assert_eq!(g.successors_of(2), &[4]);
        assert_eq!(g.predecessors_of(4), &[2]);
    }

    #[test]
    fn reaches_is_transitive_over_dependencies_only() {
        let db = sample();
        let g = TaskGraph::build(&db);
        assert!(g.reaches(1, 4)); // 1 -> 2 -> 4
        assert!(!g.reaches(4, 1));
        // hierarchy edges do not count as reachability
        assert!(!g.reaches(10, 1));
    }

    #[test]
    fn first_hierarchy_link_wins_on_conflicting_parents() {
        let db = db_with(
            vec![
                plain_task(1, "a", "2024-01-01", "2024-01-02"),
                plain_task(2, "b", "2024-01-01", "2024-01-02"),
                plain_task(3, "c", "2024-01-01", "2024-01-02"),
            ],
            &[(2, 1, LinkLabel::IsAParentOf), (3, 1, LinkLabel::IsAParentOf)],
        );
        let g = TaskGraph::build(&db);
        assert_eq!(g.parent_of(1), Some(2));
    }

    #[test]
    fn successor_closure_visits_diamond_nodes_once() {
        // 1 -> 2, 1 -> 3, 2 -> 4, 3 -> 4
        let db = db_with(
            vec![
                plain_task(1, "a", "2024-01-01", "2024-01-02"),
                plain_task(2, "b", "2024-01-01", "2024-01-02"),
                plain_task(3, "c", "2024-01-01", "2024-01-02"),
                plain_task(4, "d", "2024-01-01", "2024-01-02"),
            ],
            &[
                (1, 2, LinkLabel::Blocks),
                (1, 3, LinkLabel::Blocks),
                (2, 4, LinkLabel::Blocks),
                (3, 4, LinkLabel::Blocks),
            ],
        );
        let g = TaskGraph::build(&db);
        let closure = g.successor_closure(1);
        assert_eq!(closure.len(), 3);
        assert!(closure.contains(&2) && closure.contains(&3) && closure.contains(&4));
    }
}
