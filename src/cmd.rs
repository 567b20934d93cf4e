//! Command implementations for the CLI interface.
//!
//! Every persistent mutation follows the same flow: resolve ids, rebuild
//! the link-derived graph index, validate, mutate the database, save. The
//! graph is always rebuilt from the stored links rather than cached across
//! commands, since links are the source of truth for parent and sprint
//! relationships.

use std::collections::HashMap;
use std::path::Path;

use chrono::{Duration, NaiveDate, Utc};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::db::*;
use crate::fields::*;
use crate::graph::TaskGraph;
use crate::grouping::project_grouped;
use crate::link::{format_label, Link, LinkLabel};
use crate::project::{discover_projects, Project};
use crate::shift::{apply_shift, shift_successors};
use crate::snapshot::build_snapshot;
use crate::task::Task;
use crate::validate::validate_link;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the terminal Gantt timeline.
    Ui,

    /// Add a new task.
    Add {
        /// Task title.
        title: String,
        /// Start date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD). Mutually exclusive with --duration.
        #[arg(long)]
        end: Option<String>,
        /// Duration in days from the start date.
        #[arg(long)]
        duration: Option<i64>,
        /// Task type: task | milestone | sprint.
        #[arg(long = "type", value_enum, default_value_t = TaskType::Task)]
        task_type: TaskType,
        /// Priority: low | normal | medium | high.
        #[arg(long, value_enum, default_value_t = Priority::Normal)]
        priority: Priority,
        /// Assignee id (see `tg person list`). 0 = unassigned.
        #[arg(long)]
        owner: Option<u64>,
        /// Category id (see `tg category list`).
        #[arg(long)]
        category: Option<u64>,
        /// Progress fraction in 0..=1.
        #[arg(long)]
        progress: Option<f64>,
        /// Parent task id (stored as a hierarchy link).
        #[arg(long)]
        parent: Option<u64>,
        /// Sprint id to join (stored as a hierarchy link).
        #[arg(long)]
        sprint: Option<u64>,
    },

    /// Update fields on a task.
    Update {
        /// Task id to update.
        id: u64,
        #[arg(long)]
        title: Option<String>,
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,
        /// Task type: task | milestone | sprint.
        #[arg(long = "type", value_enum)]
        task_type: Option<TaskType>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        owner: Option<u64>,
        #[arg(long)]
        category: Option<u64>,
        #[arg(long)]
        progress: Option<f64>,
        /// Re-parent under another task.
        #[arg(long)]
        parent: Option<u64>,
        /// Move into a sprint.
        #[arg(long)]
        sprint: Option<u64>,
        /// Detach from the current parent or sprint.
        #[arg(long)]
        clear_parent: bool,
    },

    /// Delete a task and every link touching it.
    Delete {
        /// Task id to delete.
        id: u64,
    },

    /// View a single task with its derived relationships.
    View {
        /// Task id to view.
        id: u64,
    },

    /// List tasks.
    List {
        /// Render as a tree across hierarchy links.
        #[arg(long)]
        tree: bool,
        /// Group into synthetic buckets: none | assignee | category | sprint.
        #[arg(long, value_enum, default_value_t = GroupBy::None)]
        group_by: GroupBy,
        /// Filter by task type.
        #[arg(long = "type", value_enum)]
        task_type: Option<TaskType>,
        /// Filter by assignee id.
        #[arg(long)]
        owner: Option<u64>,
    },

    /// Manage dependency and hierarchy links.
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// List all links.
    Links,

    /// Move a task by a number of days, shifting dependency successors
    /// when the move-successors setting (or --successors) is on.
    Shift {
        /// Task id to move.
        id: u64,
        /// Signed day delta, e.g. 2 or -3.
        days: i64,
        /// Shift successors even if the setting is off.
        #[arg(long)]
        successors: bool,
    },

    /// Export the project snapshot as JSON (tasks + dependency links).
    Snapshot {
        /// Output file path; stdout when omitted.
        #[arg(long, short)]
        output: Option<String>,
    },

    /// Manage assignable people.
    Person {
        #[command(subcommand)]
        action: PersonAction,
    },

    /// Manage task categories.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Show or change project settings.
    Config {
        /// Shift dependency successors when a task's dates move.
        #[arg(long)]
        move_successors: Option<bool>,
        /// Render progress fill inside timeline bars.
        #[arg(long)]
        show_progress: Option<bool>,
    },

    /// List projects in the data directory.
    Projects,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum LinkAction {
    /// Add a link between two tasks (validated).
    Add {
        /// Source task id.
        source: u64,
        /// Target task id.
        target: u64,
        /// Label: blocks | is-blocked-by | is-a-parent-of | is-a-child-of.
        #[arg(long, value_enum, default_value_t = LinkLabel::Blocks)]
        label: LinkLabel,
    },
    /// Remove a link by id.
    Rm {
        /// Link id to remove.
        id: u64,
    },
}

#[derive(Subcommand)]
pub enum PersonAction {
    /// Add a person.
    Add {
        /// Display name.
        name: String,
    },
    /// List people.
    List,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Add a category.
    Add {
        /// Category name.
        name: String,
        /// Display color as "#rrggbb".
        #[arg(long)]
        color: Option<String>,
    },
    /// List categories.
    List,
}

fn save_or_exit(db: &Database, db_path: &Path) {
    if let Err(e) = db.save(db_path) {
        eprintln!("Failed to save DB: {e}");
        std::process::exit(1);
    }
}

fn parse_date_or_exit(s: &str) -> NaiveDate {
    match parse_date(s) {
        Some(d) => d,
        None => {
            eprintln!("Invalid date '{s}', expected YYYY-MM-DD");
            std::process::exit(1);
        }
    }
}

fn require_task(db: &Database, id: u64) -> &Task {
    match db.get(id) {
        Some(t) => t,
        None => {
            eprintln!("Task {id} not found");
            std::process::exit(1);
        }
    }
}

/// Replace a task's hierarchy link so `parent_id` becomes its (sole)
/// derived parent. Pass `None` to detach.
fn set_parent_link(db: &mut Database, child: u64, parent_id: Option<u64>) {
    db.links.retain(|l| {
        let (_, c, label) = l.normalized();
        !(label == LinkLabel::IsAParentOf && c == child)
    });
    if let Some(parent) = parent_id {
        let id = db.next_link_id();
        db.links.push(Link { id, source: parent, target: child, label: LinkLabel::IsAParentOf });
    }
}

/// Reject a prospective parent that is the child itself or one of the
/// child's hierarchy descendants (would loop the tree walk).
fn check_hierarchy_target(db: &Database, child: u64, parent: u64) {
    if parent == child {
        eprintln!("Parent cannot equal child.");
        std::process::exit(1);
    }
    let graph = TaskGraph::build(db);
    let mut cursor = Some(parent);
    while let Some(id) = cursor {
        if id == child {
            eprintln!("Task {parent} is a descendant of task {child}; re-parenting would create a loop");
            std::process::exit(1);
        }
        cursor = graph.parent_of(id);
    }
}

/// Resolve --parent/--sprint flags into the single derived-parent target.
fn resolve_parent_target(db: &Database, child: u64, parent: Option<u64>, sprint: Option<u64>) -> Option<u64> {
    if parent.is_some() && sprint.is_some() {
        eprintln!("--parent and --sprint are mutually exclusive; a task has one container");
        std::process::exit(1);
    }
    if let Some(pid) = parent {
        let parent_task = require_task(db, pid);
        if parent_task.is_sprint() {
            eprintln!("Task {pid} is a sprint; use --sprint to join it");
            std::process::exit(1);
        }
        check_hierarchy_target(db, child, pid);
        return Some(pid);
    }
    if let Some(sid) = sprint {
        let sprint_task = require_task(db, sid);
        if !sprint_task.is_sprint() {
            eprintln!("Task {sid} is not a sprint");
            std::process::exit(1);
        }
        check_hierarchy_target(db, child, sid);
        return Some(sid);
    }
    None
}

/// Add a new task to the database.
#[allow(clippy::too_many_arguments)]
pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    title: String,
    start: Option<String>,
    end: Option<String>,
    duration: Option<i64>,
    task_type: TaskType,
    priority: Priority,
    owner: Option<u64>,
    category: Option<u64>,
    progress: Option<f64>,
    parent: Option<u64>,
    sprint: Option<u64>,
) {
    if end.is_some() && duration.is_some() {
        eprintln!("--end and --duration are mutually exclusive");
        std::process::exit(1);
    }

    let start_date = start
        .as_deref()
        .map(parse_date_or_exit)
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let end_date = match (&end, duration) {
        (Some(e), _) => parse_date_or_exit(e),
        (None, Some(days)) => start_date + Duration::days(days.max(1) - 1),
        (None, None) => start_date,
    };
    if end_date < start_date {
        eprintln!("End date is before start date");
        std::process::exit(1);
    }

    let id = db.next_task_id();
    let parent_target = resolve_parent_target(db, id, parent, sprint);

    // Type rules: milestones collapse to a point, sprints are unassigned.
    let end_date = if task_type == TaskType::Milestone { start_date } else { end_date };
    let owner_id = if task_type == TaskType::Sprint { 0 } else { owner.unwrap_or(0) };

    let now_utc = Utc::now().timestamp();
    db.tasks.push(Task {
        id,
        title,
        start: start_date,
        end: end_date,
        priority,
        owner_id,
        category_id: category.unwrap_or(0),
        progress: progress.unwrap_or(0.0).clamp(0.0, 1.0),
        task_type,
        created_at_utc: now_utc,
        updated_at_utc: now_utc,
    });
    if parent_target.is_some() {
        set_parent_link(db, id, parent_target);
    }
    save_or_exit(db, db_path);
    println!("Added task {id}");
}

/// Update fields on an existing task.
#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    db: &mut Database,
    db_path: &Path,
    id: u64,
    title: Option<String>,
    start: Option<String>,
    end: Option<String>,
    task_type: Option<TaskType>,
    priority: Option<Priority>,
    owner: Option<u64>,
    category: Option<u64>,
    progress: Option<f64>,
    parent: Option<u64>,
    sprint: Option<u64>,
    clear_parent: bool,
) {
    require_task(db, id);

    // Becoming a sprint is refused while dependency links exist: sprints
    // may not be dependency endpoints.
    if task_type == Some(TaskType::Sprint) {
        let has_dependencies = db
            .links
            .iter()
            .any(|l| l.label.is_dependency() && (l.source == id || l.target == id));
        if has_dependencies {
            eprintln!("Task {id} has dependency links; remove them before making it a sprint");
            std::process::exit(1);
        }
    }

    let parent_target = resolve_parent_target(db, id, parent, sprint);
    let reparent = parent_target.is_some() || clear_parent;

    let Some(task) = db.get_mut(id) else { return };
    if let Some(t) = title {
        task.title = t;
    }
    if let Some(s) = start {
        task.start = parse_date_or_exit(&s);
    }
    if let Some(e) = end {
        task.end = parse_date_or_exit(&e);
    }
    if task.end < task.start {
        task.end = task.start;
    }
    if let Some(ty) = task_type {
        task.task_type = ty;
    }
    if let Some(p) = priority {
        task.priority = p;
    }
    if let Some(o) = owner {
        task.owner_id = o;
    }
    if let Some(c) = category {
        task.category_id = c;
    }
    if let Some(p) = progress {
        task.progress = p.clamp(0.0, 1.0);
    }
    // Type rules mirror the edit form: milestone drops its span, sprint
    // drops its assignee.
    match task.task_type {
        TaskType::Milestone => task.end = task.start,
        TaskType::Sprint => task.owner_id = 0,
        TaskType::Task => {}
    }
    task.updated_at_utc = Utc::now().timestamp();

    if reparent {
        set_parent_link(db, id, parent_target);
    }
    save_or_exit(db, db_path);
    println!("Updated task {id}");
}

/// Delete a task. Links touching it disappear with it, so sprint members
/// and subtasks fall back to top-level.
pub fn cmd_delete(db: &mut Database, db_path: &Path, id: u64) {
    let graph = TaskGraph::build(db);
    let released = graph.children_of(id).len();
    if !db.remove_task(id) {
        eprintln!("Task {id} not found");
        std::process::exit(1);
    }
    save_or_exit(db, db_path);
    if released > 0 {
        println!("Deleted task {id}; released {released} child task(s) to top level");
    } else {
        println!("Deleted task {id}");
    }
}

/// View a single task with its derived relationships.
pub fn cmd_view(db: &Database, id: u64) {
    let task = require_task(db, id);
    let graph = TaskGraph::build(db);

    println!("Task {}: {}", task.id, task.title);
    println!("  Type:      {}", format_task_type(task.task_type));
    println!("  Priority:  {}", format_priority(task.priority));
    println!("  Start:     {}", task.start.format("%Y-%m-%d"));
    println!("  End:       {}", task.end.format("%Y-%m-%d"));
    println!("  Days:      {}", task.duration_days());
    println!("  Progress:  {:.0}%", task.progress * 100.0);
    let assignee = db.person_name(task.owner_id);
    if !assignee.is_empty() {
        println!("  Assignee:  {assignee}");
    }
    let category = db.category_name(task.category_id);
    if !category.is_empty() {
        println!("  Category:  {category}");
    }
    if let Some(pid) = graph.parent_task_of(id) {
        println!("  Parent:    #{pid} {}", db.get(pid).map(|t| t.title.as_str()).unwrap_or(""));
    }
    if let Some(sid) = graph.sprint_of(id) {
        println!("  Sprint:    #{sid} {}", db.get(sid).map(|t| t.title.as_str()).unwrap_or(""));
    }
    let children = graph.children_of(id);
    if !children.is_empty() {
        let titles: Vec<String> = children.iter().map(|&c| format!("#{c}")).collect();
        let label = if task.is_sprint() { "Members" } else { "Children" };
        println!("  {label}:   {}", titles.join(", "));
    }
    let preds = graph.predecessors_of(id);
    if !preds.is_empty() {
        let titles: Vec<String> = preds.iter().map(|&p| format!("#{p}")).collect();
        println!("  Blocked by: {}", titles.join(", "));
    }
    let succs = graph.successors_of(id);
    if !succs.is_empty() {
        let titles: Vec<String> = succs.iter().map(|&s| format!("#{s}")).collect();
        println!("  Blocks:    {}", titles.join(", "));
    }
}

/// List tasks as a table, a hierarchy tree, or a grouped projection.
pub fn cmd_list(
    db: &Database,
    tree: bool,
    group_by: GroupBy,
    task_type: Option<TaskType>,
    owner: Option<u64>,
) {
    if group_by != GroupBy::None {
        let graph = TaskGraph::build(db);
        for row in project_grouped(db, &graph, group_by) {
            if row.id < 0 {
                println!("{} ({} .. {}, {:.0}%)", row.text, &row.start_date[..10], &row.end_date[..10], row.progress * 100.0);
            } else {
                let indent = if row.parent > 0 { "    " } else { "  " };
                println!("{indent}#{:<4} {} [{}]", row.id, row.text, row.task_type);
            }
        }
        return;
    }

    let filtered: Vec<&Task> = db
        .tasks
        .iter()
        .filter(|t| task_type.map_or(true, |ty| t.task_type == ty))
        .filter(|t| owner.map_or(true, |o| t.owner_id == o))
        .collect();

    if tree {
        let graph = TaskGraph::build(db);
        let mut depth: HashMap<u64, usize> = HashMap::new();
        let mut ordered: Vec<&Task> = Vec::new();
        fn walk<'a>(
            db: &'a Database,
            graph: &TaskGraph,
            id: u64,
            level: usize,
            depth: &mut HashMap<u64, usize>,
            ordered: &mut Vec<&'a Task>,
        ) {
            if depth.contains_key(&id) {
                return;
            }
            let Some(task) = db.get(id) else { return };
            depth.insert(id, level);
            ordered.push(task);
            for &child in graph.children_of(id) {
                walk(db, graph, child, level + 1, depth, ordered);
            }
        }
        for t in &db.tasks {
            if graph.parent_of(t.id).is_none() {
                walk(db, &graph, t.id, 0, &mut depth, &mut ordered);
            }
        }
        // orphans under a missing parent still get printed
        for t in &db.tasks {
            if !depth.contains_key(&t.id) {
                depth.insert(t.id, 0);
                ordered.push(t);
            }
        }
        let ordered: Vec<&Task> = ordered
            .into_iter()
            .filter(|t| filtered.iter().any(|f| f.id == t.id))
            .collect();
        print_table(db, &ordered, Some(&depth));
    } else {
        print_table(db, &filtered, None);
    }
}

/// Add a link after running the validator.
pub fn cmd_link_add(db: &mut Database, db_path: &Path, source: u64, target: u64, label: LinkLabel) {
    let graph = TaskGraph::build(db);
    if let Err(rejection) = validate_link(db, &graph, source, target, label) {
        eprintln!("{rejection}");
        std::process::exit(1);
    }
    if label.is_hierarchy() {
        // Hierarchy links replace the child's existing parent attachment.
        let (parent, child) = match label {
            LinkLabel::IsAParentOf => (source, target),
            _ => (target, source),
        };
        check_hierarchy_target(db, child, parent);
        set_parent_link(db, child, Some(parent));
        save_or_exit(db, db_path);
        println!("Task {child} attached under task {parent}");
        return;
    }
    let id = db.next_link_id();
    db.links.push(Link { id, source, target, label });
    save_or_exit(db, db_path);
    println!("Added link {id}: {source} {} {target}", format_label(label));
}

/// Remove a link by id.
pub fn cmd_link_rm(db: &mut Database, db_path: &Path, id: u64) {
    if !db.remove_link(id) {
        eprintln!("Link {id} not found");
        std::process::exit(1);
    }
    save_or_exit(db, db_path);
    println!("Removed link {id}");
}

/// List all links with their labels.
pub fn cmd_links(db: &Database) {
    println!("{:<5} {:<6} {:<15} {:<6}", "ID", "From", "Label", "To");
    for l in &db.links {
        println!("{:<5} {:<6} {:<15} {:<6}", l.id, l.source, format_label(l.label), l.target);
    }
}

/// Move a task by a day delta, propagating to successors when enabled.
pub fn cmd_shift(db: &mut Database, db_path: &Path, id: u64, days: i64, force_successors: bool) {
    require_task(db, id);
    if days == 0 {
        println!("Nothing to do");
        return;
    }
    let propagate = force_successors || db.settings.move_successors;
    let graph = TaskGraph::build(db);
    let plan = if propagate {
        shift_successors(&graph, &db.tasks, id, days)
    } else {
        Vec::new()
    };

    let delta = Duration::days(days);
    let Some(task) = db.get_mut(id) else { return };
    task.start += delta;
    task.end += delta;
    task.updated_at_utc = Utc::now().timestamp();

    apply_shift(&mut db.tasks, &plan);
    save_or_exit(db, db_path);
    if plan.is_empty() {
        println!("Moved task {id} by {days} day(s)");
    } else {
        println!("Moved task {id} by {days} day(s); shifted {} successor(s)", plan.len());
    }
}

/// Export the project snapshot as JSON.
pub fn cmd_snapshot(db: &Database, output: Option<String>) {
    let snapshot = build_snapshot(db);
    let json = match serde_json::to_string_pretty(&snapshot) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Failed to serialize snapshot: {e}");
            std::process::exit(1);
        }
    };
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, json) {
                eprintln!("Failed to write {path}: {e}");
                std::process::exit(1);
            }
            println!("Wrote snapshot to {path}");
        }
        None => println!("{json}"),
    }
}

/// Add an assignable person.
pub fn cmd_person_add(db: &mut Database, db_path: &Path, name: String) {
    let id = db.people.iter().map(|p| p.id).max().unwrap_or(0) + 1;
    db.people.push(Person { id, name: name.clone() });
    save_or_exit(db, db_path);
    println!("Added person {id}: {name}");
}

/// List assignable people.
pub fn cmd_person_list(db: &Database) {
    println!("{:<5} {}", "ID", "Name");
    for p in &db.people {
        println!("{:<5} {}", p.id, p.name);
    }
}

/// Add a category.
pub fn cmd_category_add(db: &mut Database, db_path: &Path, name: String, color: Option<String>) {
    if let Some(c) = &color {
        if !c.starts_with('#') || c.len() != 7 {
            eprintln!("Color must look like #rrggbb");
            std::process::exit(1);
        }
    }
    let id = db.categories.iter().map(|c| c.id).max().unwrap_or(0) + 1;
    db.categories.push(Category { id, name: name.clone(), color });
    save_or_exit(db, db_path);
    println!("Added category {id}: {name}");
}

/// List categories.
pub fn cmd_category_list(db: &Database) {
    println!("{:<5} {:<20} {}", "ID", "Name", "Color");
    for c in &db.categories {
        println!("{:<5} {:<20} {}", c.id, c.name, c.color.as_deref().unwrap_or("-"));
    }
}

/// Show or change project settings.
pub fn cmd_config(
    db: &mut Database,
    db_path: &Path,
    move_successors: Option<bool>,
    show_progress: Option<bool>,
) {
    let mut changed = false;
    if let Some(v) = move_successors {
        db.settings.move_successors = v;
        changed = true;
    }
    if let Some(v) = show_progress {
        db.settings.show_progress = v;
        changed = true;
    }
    if changed {
        save_or_exit(db, db_path);
    }
    println!("move_successors = {}", db.settings.move_successors);
    println!("show_progress   = {}", db.settings.show_progress);
}

/// List projects in the data directory.
pub fn cmd_projects(data_dir: &Path) {
    match discover_projects(data_dir) {
        Ok(projects) if !projects.is_empty() => {
            for p in projects {
                println!("{} ({})", p.display_name, p.file_path.display());
            }
        }
        Ok(_) => println!("No projects found in {}", data_dir.display()),
        Err(e) => {
            eprintln!("Failed to scan {}: {e}", data_dir.display());
            std::process::exit(1);
        }
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui(db_path: &Path) {
    if let Err(e) = crate::tui::app::run_tui(db_path) {
        eprintln!("UI error: {e}");
        std::process::exit(1);
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

/// Ensure a default project exists and return its path.
pub fn default_project_path(data_dir: &Path) -> std::path::PathBuf {
    match crate::project::most_recent_project(data_dir) {
        Ok(Some(project)) => project.file_path,
        _ => {
            let default_project = Project::new("Default", data_dir);
            if let Err(e) = default_project.create_if_not_exists() {
                eprintln!("Failed to create default project: {e}");
                std::process::exit(1);
            }
            default_project.file_path
        }
    }
}
