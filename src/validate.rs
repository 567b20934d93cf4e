//! Link validation.
//!
//! Dependency links obey three rules: sprints are never endpoints, both
//! endpoints must sit at the same hierarchy level (both top-level, or
//! siblings under the same parent), and the new edge must not close a cycle
//! among the existing "blocks" edges. The cycle check walks the dependency
//! subset transitively; hierarchy edges are excluded.
//!
//! Rejections abort the operation before anything is stored and surface as
//! one-line notices, deduplicated through `NoticeLimiter`.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::db::Database;
use crate::graph::TaskGraph;
use crate::link::LinkLabel;

/// Why a candidate link was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkRejection {
    #[error("Task #{0} does not exist")]
    UnknownTask(u64),
    #[error("A task cannot be linked to itself")]
    SelfLink,
    #[error("Sprints cannot be linked to other tasks")]
    SprintEndpoint,
    #[error("Only siblings or top-level tasks can be linked")]
    CrossLevel,
    #[error("Circular dependency detected")]
    WouldCycle,
    #[error("These tasks are already linked")]
    Duplicate,
}

/// Validate a candidate link before it is stored.
///
/// Hierarchy labels only need existing, distinct endpoints; the dependency
/// rules apply to "blocks" / "is blocked by" candidates, checked in their
/// canonical blocks-orientation.
pub fn validate_link(
    db: &Database,
    graph: &TaskGraph,
    source: u64,
    target: u64,
    label: LinkLabel,
) -> Result<(), LinkRejection> {
    let source_task = db.get(source).ok_or(LinkRejection::UnknownTask(source))?;
    let target_task = db.get(target).ok_or(LinkRejection::UnknownTask(target))?;
    if source == target {
        return Err(LinkRejection::SelfLink);
    }
    if label.is_hierarchy() {
        return Ok(());
    }

    // Normalize "is blocked by" so (s, t) always reads "s blocks t".
    let (s, t) = match label {
        LinkLabel::IsBlockedBy => (target, source),
        _ => (source, target),
    };

    if source_task.is_sprint() || target_task.is_sprint() {
        return Err(LinkRejection::SprintEndpoint);
    }

    let pa = graph.level_parent(s);
    let pb = graph.level_parent(t);
    let same_level = match (pa, pb) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    if !same_level {
        return Err(LinkRejection::CrossLevel);
    }

    // Adding s -> t closes a cycle iff t already reaches s.
    if graph.reaches(t, s) {
        return Err(LinkRejection::WouldCycle);
    }

    if graph.successors_of(s).contains(&t) {
        return Err(LinkRejection::Duplicate);
    }

    Ok(())
}

/// Suppresses a notice repeated with identical text within one second.
///
/// The widget this behaviour comes from fired the same validation toast
/// from several callbacks at once; the limiter keeps the last text and
/// timestamp and drops immediate repeats. Time is passed in by the caller
/// so tests don't sleep.
#[derive(Debug, Default)]
pub struct NoticeLimiter {
    last: Option<(String, Instant)>,
}

impl NoticeLimiter {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the notice should be shown.
    pub fn admit(&mut self, text: &str, now: Instant) -> bool {
        if let Some((last_text, at)) = &self.last {
            if last_text == text && now.duration_since(*at) < Self::WINDOW {
                return false;
            }
        }
        self.last = Some((text.to_string(), now));
        true
    }
}
