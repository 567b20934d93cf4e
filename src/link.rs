//! Directed links between tasks.
//!
//! Dependency edges ("blocks" / "is blocked by") and hierarchy edges
//! ("is a parent of" / "is a child of") share the same storage and are told
//! apart only by their label, mirroring the generic link table this model
//! grew out of.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Link label vocabulary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LinkLabel {
    /// source blocks target (dependency).
    Blocks,
    /// source is blocked by target (dependency, inverse orientation).
    IsBlockedBy,
    /// source is the hierarchy parent of target.
    IsAParentOf,
    /// source is a hierarchy child of target.
    IsAChildOf,
}

impl LinkLabel {
    pub fn is_dependency(self) -> bool {
        matches!(self, LinkLabel::Blocks | LinkLabel::IsBlockedBy)
    }

    pub fn is_hierarchy(self) -> bool {
        !self.is_dependency()
    }
}

/// Human-readable label string, matching the stored vocabulary.
pub fn format_label(label: LinkLabel) -> &'static str {
    match label {
        LinkLabel::Blocks => "blocks",
        LinkLabel::IsBlockedBy => "is blocked by",
        LinkLabel::IsAParentOf => "is a parent of",
        LinkLabel::IsAChildOf => "is a child of",
    }
}

/// A directed edge between two tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: u64,
    pub source: u64,
    pub target: u64,
    pub label: LinkLabel,
}

impl Link {
    /// The same edge expressed in canonical orientation: dependencies as
    /// `Blocks`, hierarchy as `IsAParentOf`. Inverse labels swap endpoints.
    pub fn normalized(&self) -> (u64, u64, LinkLabel) {
        match self.label {
            LinkLabel::Blocks => (self.source, self.target, LinkLabel::Blocks),
            LinkLabel::IsBlockedBy => (self.target, self.source, LinkLabel::Blocks),
            LinkLabel::IsAParentOf => (self.source, self.target, LinkLabel::IsAParentOf),
            LinkLabel::IsAChildOf => (self.target, self.source, LinkLabel::IsAParentOf),
        }
    }
}
