//! Shared builders for unit tests.

use chrono::NaiveDate;

use crate::db::Database;
use crate::fields::{Priority, TaskType};
use crate::link::{Link, LinkLabel};
use crate::task::Task;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn plain_task(id: u64, title: &str, start: &str, end: &str) -> Task {
    Task {
        id,
        title: title.into(),
        start: date(start),
        end: date(end),
        priority: Priority::Normal,
        owner_id: 0,
        category_id: 0,
        progress: 0.0,
        task_type: TaskType::Task,
        created_at_utc: 0,
        updated_at_utc: 0,
    }
}

pub fn typed_task(id: u64, title: &str, start: &str, end: &str, ty: TaskType) -> Task {
    let mut t = plain_task(id, title, start, end);
    t.task_type = ty;
    t
}

/// Build a database from task rows and (source, target, label) edges,
/// allocating link ids sequentially.
pub fn db_with(tasks: Vec<Task>, edges: &[(u64, u64, LinkLabel)]) -> Database {
    let mut db = Database { tasks, ..Database::default() };
    for (i, &(source, target, label)) in edges.iter().enumerate() {
        db.links.push(Link { id: i as u64 + 1, source, target, label });
    }
    db
}
