//! Task data structure.
//!
//! A task carries its own dates, priority and assignment fields. Parent and
//! sprint membership are *not* stored here: both are derived from hierarchy
//! links by the graph index (see `graph::TaskGraph`), keeping the link set
//! the single source of truth.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::{Priority, TaskType};

/// A schedulable work item on the Gantt timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    /// Assignee id, 0 = unassigned.
    #[serde(default)]
    pub owner_id: u64,
    /// Category id, 0 = none.
    #[serde(default)]
    pub category_id: u64,
    /// Completion fraction in 0..=1.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub task_type: TaskType,
    pub created_at_utc: i64,
    pub updated_at_utc: i64,
}

impl Task {
    pub fn is_milestone(&self) -> bool {
        self.task_type == TaskType::Milestone
    }

    pub fn is_sprint(&self) -> bool {
        self.task_type == TaskType::Sprint
    }

    /// Inclusive duration in whole days; milestones render as zero-length.
    pub fn duration_days(&self) -> i64 {
        if self.is_milestone() {
            return 0;
        }
        ((self.end - self.start).num_days() + 1).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task(start: &str, end: &str, ty: TaskType) -> Task {
        Task {
            id: 1,
            title: "t".into(),
            start: d(start),
            end: d(end),
            priority: Priority::Normal,
            owner_id: 0,
            category_id: 0,
            progress: 0.0,
            task_type: ty,
            created_at_utc: 0,
            updated_at_utc: 0,
        }
    }

    #[test]
    fn duration_is_inclusive_and_at_least_one_day() {
        assert_eq!(task("2024-03-01", "2024-03-01", TaskType::Task).duration_days(), 1);
        assert_eq!(task("2024-03-01", "2024-03-05", TaskType::Task).duration_days(), 5);
        // end before start degrades to a single day rather than negative
        assert_eq!(task("2024-03-05", "2024-03-01", TaskType::Task).duration_days(), 1);
    }

    #[test]
    fn milestones_have_zero_duration() {
        assert_eq!(task("2024-03-01", "2024-03-01", TaskType::Milestone).duration_days(), 0);
    }
}
