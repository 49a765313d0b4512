// Task record and its persisted shape

use chrono::Local;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Wire name, as stored in the slot
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl FromStr for Priority {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(eyre!("Invalid priority: {} (expected low, medium or high)", other)),
        }
    }
}

/// Task identifier, a bare JSON number on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(TaskId)
            .map_err(|e| eyre!("Invalid task id: {} ({})", s, e))
    }
}

/// A single to-do entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl Task {
    pub fn new(id: TaskId, text: String, priority: Option<Priority>, stamp: Stamp) -> Self {
        Self {
            id,
            text,
            completed: false,
            date: stamp.date,
            time: stamp.time,
            priority,
        }
    }

    /// Priority with the medium default applied
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }
}

/// Creation date and time as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp {
    pub date: String,
    pub time: String,
}

impl Stamp {
    /// Capture the local clock with the given strftime formats
    pub fn now(date_format: &str, time_format: &str) -> Self {
        let now = Local::now();
        Self {
            date: now.format(date_format).to_string(),
            time: now.format(time_format).to_string(),
        }
    }
}

/// Loosely typed task as found in the slot
///
/// Older writers left out everything but `text`, used floating point ids and
/// sometimes stored junk in `completed`. Only `text` is required here.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawTask {
    #[serde(default)]
    pub id: Option<Value>,
    pub text: String,
    #[serde(default)]
    pub completed: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl RawTask {
    /// Id as a `TaskId`, if it is a usable number
    pub fn parsed_id(&self) -> Option<TaskId> {
        self.id.as_ref().and_then(parse_id)
    }

    /// `completed` if it is a real boolean
    pub fn parsed_completed(&self) -> Option<bool> {
        self.completed.as_ref().and_then(Value::as_bool)
    }

    pub fn parsed_priority(&self) -> Option<Priority> {
        self.priority.as_deref().and_then(|p| p.parse().ok())
    }

    pub fn non_empty_date(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.is_empty())
    }

    pub fn non_empty_time(&self) -> Option<&str> {
        self.time.as_deref().filter(|t| !t.is_empty())
    }
}

/// Largest id accepted from the slot (2^53 - 1, the largest exact JSON integer)
pub const MAX_ID: u64 = (1 << 53) - 1;

/// Accepts integers, floats (truncated) and numeric strings up to `MAX_ID`
fn parse_id(value: &Value) -> Option<TaskId> {
    let id = match value {
        Value::Number(n) => n.as_u64().or_else(|| float_id(n.as_f64()?)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>().ok().or_else(|| float_id(s.parse::<f64>().ok()?))
        }
        _ => None,
    };
    id.filter(|&id| id <= MAX_ID).map(TaskId)
}

fn float_id(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f <= MAX_ID as f64 {
        Some(f.trunc() as u64)
    } else {
        None
    }
}
