//! Project database and utility functions.
//!
//! This module provides the `Database` struct holding the task and link rows
//! for one project, along with the people/category lookup tables and the
//! per-project settings. Persistence is a single JSON file written
//! atomically (temp file + rename).

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::*;
use crate::link::Link;
use crate::task::Task;

/// An assignable person, as exposed by the "project members" lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
}

/// A task category with an optional display color (hex, "#rrggbb").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Per-project behaviour toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// When a task's dates move, shift its transitive dependency successors
    /// by the same delta.
    #[serde(default)]
    pub move_successors: bool,
    /// Render progress fill inside timeline bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings { move_successors: false, show_progress: true }
    }
}

/// In-memory database for one project's tasks and links.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub settings: Settings,
}

impl Database {
    /// Load database from JSON file, creating a new empty database if the
    /// file doesn't exist.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Database::default();
        }
        let mut buf = String::new();
        match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("Error parsing DB, starting fresh: {e}");
                    Database::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading DB, starting fresh: {e}");
                Database::default()
            }
        }
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    /// Generate the next available task ID.
    pub fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Generate the next available link ID.
    pub fn next_link_id(&self) -> u64 {
        self.links.iter().map(|l| l.id).max().unwrap_or(0) + 1
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Get a mutable reference to a task by ID.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Get a link by ID.
    pub fn get_link(&self, id: u64) -> Option<&Link> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Remove a task and every link touching it. Sprint members and child
    /// tasks lose their hierarchy link and fall back to top-level.
    pub fn remove_task(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return false;
        }
        self.links.retain(|l| l.source != id && l.target != id);
        true
    }

    /// Remove a link by ID.
    pub fn remove_link(&mut self, id: u64) -> bool {
        let before = self.links.len();
        self.links.retain(|l| l.id != id);
        self.links.len() != before
    }

    /// Person name for an owner id; empty string when unassigned/unknown.
    pub fn person_name(&self, owner_id: u64) -> String {
        if owner_id == 0 {
            return String::new();
        }
        self.people
            .iter()
            .find(|p| p.id == owner_id)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }

    /// Category name for a category id; empty string when none/unknown.
    pub fn category_name(&self, category_id: u64) -> String {
        if category_id == 0 {
            return String::new();
        }
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .map(|c| c.name.clone())
            .unwrap_or_default()
    }

    /// Display color for a task: milestones are green, then the category
    /// color when one is set, then a priority fallback.
    pub fn task_color(&self, task: &Task) -> String {
        if task.is_milestone() {
            return MILESTONE_COLOR.to_string();
        }
        if task.category_id != 0 {
            if let Some(color) = self
                .categories
                .iter()
                .find(|c| c.id == task.category_id)
                .and_then(|c| c.color.as_ref())
                .filter(|c| !c.trim().is_empty())
            {
                return color.clone();
            }
        }
        priority_color(task.priority).to_string()
    }
}

/// Milestone bars render green regardless of category.
pub const MILESTONE_COLOR: &str = "#27ae60";

/// Priority fallback palette for uncategorised tasks.
pub fn priority_color(p: Priority) -> &'static str {
    match p {
        Priority::High => "#e74c3c",
        Priority::Medium => "#f39c12",
        Priority::Low => "#3498db",
        Priority::Normal => "#95a5a6",
    }
}

/// Parse a date argument in ISO format.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks in a formatted table with optional tree indentation.
pub fn print_table(db: &Database, tasks: &[&Task], id_to_depth: Option<&HashMap<u64, usize>>) {
    println!(
        "{:<5} {:<10} {:<9} {:<11} {:<11} {:<5} {:<12} {}",
        "ID", "Type", "Priority", "Start", "End", "Days", "Assignee", "Title"
    );
    for t in tasks {
        let indent = id_to_depth.and_then(|m| m.get(&t.id).copied()).unwrap_or(0);
        let indent_str = "  ".repeat(indent);
        let assignee = db.person_name(t.owner_id);
        println!(
            "{:<5} {:<10} {:<9} {:<11} {:<11} {:<5} {:<12} {}{}",
            t.id,
            format_task_type(t.task_type),
            format_priority(t.priority),
            t.start.format("%Y-%m-%d"),
            t.end.format("%Y-%m-%d"),
            t.duration_days(),
            truncate(if assignee.is_empty() { "-" } else { &assignee }, 12),
            indent_str,
            t.title,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::LinkLabel;
    use crate::testutil::{date, plain_task};

    #[test]
    fn remove_task_drops_its_links() {
        let mut db = Database::default();
        db.tasks.push(plain_task(1, "a", "2024-01-01", "2024-01-02"));
        db.tasks.push(plain_task(2, "b", "2024-01-03", "2024-01-04"));
        db.links.push(Link { id: 1, source: 1, target: 2, label: LinkLabel::Blocks });
        db.links.push(Link { id: 2, source: 2, target: 1, label: LinkLabel::IsAChildOf });

        assert!(db.remove_task(2));
        assert!(db.links.is_empty());
        assert_eq!(db.tasks.len(), 1);
        assert!(!db.remove_task(2));
    }

    #[test]
    fn task_color_prefers_milestone_then_category_then_priority() {
        let mut db = Database::default();
        db.categories.push(Category { id: 5, name: "Backend".into(), color: Some("#123456".into()) });
        db.categories.push(Category { id: 6, name: "Blank".into(), color: Some("  ".into()) });

        let mut t = plain_task(1, "a", "2024-01-01", "2024-01-02");
        t.priority = Priority::High;
        assert_eq!(db.task_color(&t), "#e74c3c");

        t.category_id = 5;
        assert_eq!(db.task_color(&t), "#123456");

        // whitespace-only category color falls through to priority
        t.category_id = 6;
        assert_eq!(db.task_color(&t), "#e74c3c");

        t.task_type = TaskType::Milestone;
        assert_eq!(db.task_color(&t), MILESTONE_COLOR);
    }

    #[test]
    fn id_allocation_skips_existing_rows() {
        let mut db = Database::default();
        assert_eq!(db.next_task_id(), 1);
        db.tasks.push(plain_task(7, "a", "2024-01-01", "2024-01-02"));
        assert_eq!(db.next_task_id(), 8);
        db.links.push(Link { id: 3, source: 7, target: 7, label: LinkLabel::Blocks });
        assert_eq!(db.next_link_id(), 4);
    }

    #[test]
    fn parse_date_accepts_iso_only() {
        assert_eq!(parse_date(" 2024-02-29 "), Some(date("2024-02-29")));
        assert_eq!(parse_date("29/02/2024"), None);
    }
}
