//! Enumerations and field types for the Gantt task model.
//!
//! These are the structured vocabularies shared between the on-disk task
//! rows, the CLI argument parser, and the client-visible snapshot.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Task priority scale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    Medium,
    High,
}

/// On-screen task type.
///
/// Milestones have zero effective duration. Sprints are grouping containers:
/// their members are attached through hierarchy links, not stored ownership.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    #[default]
    Task,
    Milestone,
    Sprint,
}

/// Display grouping mode for the projected task list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    #[default]
    None,
    Assignee,
    Category,
    Sprint,
}

impl GroupBy {
    /// Cycle to the next grouping mode (used by the TUI toggle).
    pub fn next(self) -> Self {
        match self {
            GroupBy::None => GroupBy::Assignee,
            GroupBy::Assignee => GroupBy::Category,
            GroupBy::Category => GroupBy::Sprint,
            GroupBy::Sprint => GroupBy::None,
        }
    }

    /// Label prefix used for synthetic group rows ("Assignee: Alice").
    pub fn label_prefix(self) -> &'static str {
        match self {
            GroupBy::None => "",
            GroupBy::Assignee => "Assignee",
            GroupBy::Category => "Category",
            GroupBy::Sprint => "Sprint",
        }
    }
}

/// Format a priority for tables and the snapshot `priority` field.
pub fn format_priority(p: Priority) -> &'static str {
    match p {
        Priority::Low => "low",
        Priority::Normal => "normal",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

/// Format a task type for tables and the snapshot `task_type` field.
pub fn format_task_type(t: TaskType) -> &'static str {
    match t {
        TaskType::Task => "task",
        TaskType::Milestone => "milestone",
        TaskType::Sprint => "sprint",
    }
}
