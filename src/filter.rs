// Derived views over the task list

use crate::task::Task;
use eyre::{Result, eyre};
use std::str::FromStr;

/// Status predicate applied to derive the visible subset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Active => write!(f, "active"),
            StatusFilter::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(eyre!("Invalid filter: {} (expected all, active or completed)", other)),
        }
    }
}

/// Tasks whose text contains `search` (case-insensitive) and that pass `filter`
///
/// Borrowed view in store order. Recomputed on every call.
pub fn visible_tasks<'a>(tasks: &'a [Task], filter: StatusFilter, search: &str) -> Vec<&'a Task> {
    let needle = search.to_lowercase();
    tasks
        .iter()
        .filter(|t| filter.matches(t) && t.text.to_lowercase().contains(&needle))
        .collect()
}

/// Number of tasks still left to complete
pub fn remaining(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| !t.completed).count()
}

/// Hint shown when the visible view comes up empty
pub fn empty_hint(filter: StatusFilter, search: &str) -> String {
    if !search.is_empty() {
        "Try a different search query".to_string()
    } else if filter != StatusFilter::All {
        format!("No {} tasks", filter)
    } else {
        "Add a task to get started".to_string()
    }
}
