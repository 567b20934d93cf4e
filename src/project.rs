//! Multi-project file management.
//!
//! Each project is one JSON file named `<project_name>_gantt.json` inside
//! the data directory (default `~/.taskgantt/`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::db::Database;

/// A project with its name and database file path.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    pub display_name: String,
    pub file_path: PathBuf,
}

impl Project {
    /// Create a new project with the given display name.
    pub fn new(display_name: &str, data_dir: &Path) -> Self {
        let name = sanitize_project_name(display_name);
        let file_path = data_dir.join(format!("{}_gantt.json", name));
        Project {
            name,
            display_name: display_name.to_string(),
            file_path,
        }
    }

    /// Load a project from an existing database file.
    pub fn from_file(file_path: PathBuf) -> Option<Self> {
        let file_name = file_path.file_stem()?.to_str()?;
        let name = file_name.strip_suffix("_gantt")?;
        let display_name = name.replace('_', " ");
        Some(Project {
            name: name.to_string(),
            display_name,
            file_path,
        })
    }

    /// Create the database file for this project if it doesn't exist.
    pub fn create_if_not_exists(&self) -> std::io::Result<()> {
        if !self.file_path.exists() {
            let db = Database::default();
            db.save(&self.file_path)?;
        }
        Ok(())
    }
}

/// Convert a display name to a safe file-name stem: lowercase,
/// non-alphanumeric runs collapsed to single underscores.
pub fn sanitize_project_name(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Discover all existing projects in the data directory, sorted by name.
pub fn discover_projects(data_dir: &Path) -> std::io::Result<Vec<Project>> {
    let mut projects = Vec::new();
    if !data_dir.exists() {
        return Ok(projects);
    }
    for entry in fs::read_dir(data_dir)? {
        let path = entry?.path();
        if path.is_file() {
            if let Some(project) = Project::from_file(path) {
                projects.push(project);
            }
        }
    }
    projects.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(projects)
}

/// The most recently modified project, if any.
pub fn most_recent_project(data_dir: &Path) -> std::io::Result<Option<Project>> {
    let mut most_recent: Option<(Project, std::time::SystemTime)> = None;
    for project in discover_projects(data_dir)? {
        let modified = fs::metadata(&project.file_path)?.modified()?;
        let newer = match &most_recent {
            Some((_, at)) => modified > *at,
            None => true,
        };
        if newer {
            most_recent = Some((project, modified));
        }
    }
    Ok(most_recent.map(|(project, _)| project))
}
