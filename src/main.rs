//! # tg - Gantt planning CLI
//!
//! A command-line Gantt planner with sprint grouping, validated task
//! dependencies and a terminal timeline view.
//!
//! ## Key Features
//!
//! - **Tasks, milestones and sprints**: milestones are zero-length markers,
//!   sprints group member tasks and span them automatically
//! - **Validated dependencies**: same-level rule, cycle detection and
//!   sprint-endpoint rules run before any link is stored
//! - **Successor shifting**: moving a task can carry its transitive
//!   dependency successors with it, without compounding across diamonds
//! - **Grouped views**: project the flat task list into assignee, category
//!   or sprint buckets for display
//! - **Local file storage**: one JSON file per project, plus a JSON
//!   snapshot export in the chart wire format
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a sprint and some members
//! tg add "Sprint 1" --type sprint
//! tg add "Design" --start 2024-06-03 --duration 3 --sprint 1
//! tg add "Build" --start 2024-06-06 --duration 5 --sprint 1
//!
//! # Wire a dependency and look at the timeline
//! tg link add 2 3
//! tg ui
//!
//! # Move "Design" two days out, dragging its successors along
//! tg shift 2 2 --successors
//! ```
//!
//! Data is stored locally in `~/.taskgantt/` with each project as a
//! separate JSON file.

use std::path::PathBuf;

use clap::Parser;

pub mod aggregate;
pub mod cli;
pub mod cmd;
pub mod db;
pub mod fields;
pub mod graph;
pub mod grouping;
pub mod link;
pub mod project;
pub mod save_queue;
pub mod shift;
pub mod snapshot;
pub mod task;
pub mod validate;
pub mod tui {
    pub mod app;
    pub mod colors;
}

#[cfg(test)]
pub mod testutil;

use cli::Cli;
use cmd::*;
use db::Database;

fn main() {
    let cli = Cli::parse();

    // Determine the data directory
    let data_dir = if let Some(db_path) = cli.db.as_ref() {
        db_path
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .to_path_buf()
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let data_dir = PathBuf::from(home).join(".taskgantt");
        if let Err(e) = std::fs::create_dir_all(&data_dir) {
            eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
            std::process::exit(1);
        }
        data_dir
    };

    // Commands that don't operate on a single project database
    match &cli.command {
        Commands::Projects => {
            cmd_projects(&data_dir);
            return;
        }
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return;
        }
        _ => {}
    }

    let db_path = cli.db.unwrap_or_else(|| default_project_path(&data_dir));
    let mut db = Database::load(&db_path);

    match cli.command {
        Commands::Projects | Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Ui => cmd_ui(&db_path),

        Commands::Add {
            title, start, end, duration, task_type, priority, owner, category,
            progress, parent, sprint,
        } => cmd_add(&mut db, &db_path, title, start, end, duration, task_type,
                     priority, owner, category, progress, parent, sprint),

        Commands::Update {
            id, title, start, end, task_type, priority, owner, category,
            progress, parent, sprint, clear_parent,
        } => cmd_update(&mut db, &db_path, id, title, start, end, task_type,
                        priority, owner, category, progress, parent, sprint, clear_parent),

        Commands::Delete { id } => cmd_delete(&mut db, &db_path, id),

        Commands::View { id } => cmd_view(&db, id),

        Commands::List { tree, group_by, task_type, owner } =>
            cmd_list(&db, tree, group_by, task_type, owner),

        Commands::Link { action } => match action {
            LinkAction::Add { source, target, label } =>
                cmd_link_add(&mut db, &db_path, source, target, label),
            LinkAction::Rm { id } => cmd_link_rm(&mut db, &db_path, id),
        },

        Commands::Links => cmd_links(&db),

        Commands::Shift { id, days, successors } =>
            cmd_shift(&mut db, &db_path, id, days, successors),

        Commands::Snapshot { output } => cmd_snapshot(&db, output),

        Commands::Person { action } => match action {
            PersonAction::Add { name } => cmd_person_add(&mut db, &db_path, name),
            PersonAction::List => cmd_person_list(&db),
        },

        Commands::Category { action } => match action {
            CategoryAction::Add { name, color } =>
                cmd_category_add(&mut db, &db_path, name, color),
            CategoryAction::List => cmd_category_list(&db),
        },

        Commands::Config { move_successors, show_progress } =>
            cmd_config(&mut db, &db_path, move_successors, show_progress),
    }
}
