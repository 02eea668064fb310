//! Data models for Bearing entities.
//!
//! This module defines the core data structures:
//! - `Task` - Board items with priority, dates, and an optional parent task
//! - `TaskStatus` - Board location (todo, doing, done, archived)
//! - `Priority` - Eisenhower quadrant of a task
//! - `TaskOrder` - Advisory manual ordering per drop zone
//! - `DayFocus` / `CalendarYear` - Yearly calendar entries
//! - `NavigationContext` - UI preference state kept out of version history
//!
//! The OKR tree lives in [`okr`], the static board layout in [`board`].

pub mod board;
pub mod okr;

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Board location of a task.
///
/// The status is not stored inside a task record; it is the name of the
/// directory the record lives in. `Task::status` carries it in memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Todo,
    Doing,
    Done,
    Archived,
}

impl TaskStatus {
    /// All locations, in board order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::Doing,
        TaskStatus::Done,
        TaskStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Doing => "doing",
            TaskStatus::Done => "done",
            TaskStatus::Archived => "archived",
        }
    }

    /// Whether a plain board move from `self` to `to` is permitted.
    ///
    /// todo <-> doing, doing <-> done, todo -> done. Archived is never
    /// reachable or leavable by a move.
    pub fn can_move_to(&self, to: TaskStatus) -> bool {
        matches!(
            (self, to),
            (TaskStatus::Todo, TaskStatus::Doing)
                | (TaskStatus::Doing, TaskStatus::Todo)
                | (TaskStatus::Doing, TaskStatus::Done)
                | (TaskStatus::Done, TaskStatus::Doing)
                | (TaskStatus::Todo, TaskStatus::Done)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "doing" | "in-progress" | "in_progress" => Ok(TaskStatus::Doing),
            "done" => Ok(TaskStatus::Done),
            "archived" => Ok(TaskStatus::Archived),
            other => Err(Error::InvalidInput(format!(
                "Invalid task status: {} (expected todo|doing|done|archived)",
                other
            ))),
        }
    }
}

/// Eisenhower priority of a task.
///
/// The fourth quadrant parses so that the rule engine can reject it with a
/// structured violation instead of a parse error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    ImportantUrgent,
    #[default]
    ImportantNotUrgent,
    NotImportantUrgent,
    NotImportantNotUrgent,
}

impl Priority {
    /// Priorities accepted on the board, in section order.
    pub const ALLOWED: [Priority; 3] = [
        Priority::ImportantUrgent,
        Priority::ImportantNotUrgent,
        Priority::NotImportantUrgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::ImportantUrgent => "important-urgent",
            Priority::ImportantNotUrgent => "important-not-urgent",
            Priority::NotImportantUrgent => "not-important-urgent",
            Priority::NotImportantNotUrgent => "not-important-not-urgent",
        }
    }

    pub fn is_allowed(&self) -> bool {
        Self::ALLOWED.contains(self)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "important-urgent" | "q1" => Ok(Priority::ImportantUrgent),
            "important-not-urgent" | "q2" => Ok(Priority::ImportantNotUrgent),
            "not-important-urgent" | "q3" => Ok(Priority::NotImportantUrgent),
            "not-important-not-urgent" | "q4" => Ok(Priority::NotImportantNotUrgent),
            other => Err(Error::InvalidInput(format!("Invalid priority: {}", other))),
        }
    }
}

/// A board item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Theme-scoped identifier (e.g., "H-T12")
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Owning theme
    pub theme_id: String,

    /// Calendar day the task is planned for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_date: Option<NaiveDate>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// Day on which an important-not-urgent task becomes important-urgent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Location-derived status; never written into the record itself.
    #[serde(skip)]
    pub status: TaskStatus,
}

impl Task {
    /// Create a new todo task with the given ID, title, and theme.
    pub fn new(id: String, title: String, theme_id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: String::new(),
            theme_id,
            day_date: None,
            priority: Priority::default(),
            tags: Vec::new(),
            due_date: None,
            promotion_date: None,
            parent_task_id: None,
            created_at: now,
            updated_at: now,
            status: TaskStatus::Todo,
        }
    }

    /// Drop zone this task belongs to for manual ordering.
    pub fn drop_zone(&self) -> String {
        drop_zone(self.status, self.priority)
    }
}

/// Drop zone key: the priority for todo tasks, the status otherwise.
pub fn drop_zone(status: TaskStatus, priority: Priority) -> String {
    match status {
        TaskStatus::Todo => priority.as_str().to_string(),
        other => other.as_str().to_string(),
    }
}

/// Fixed rank of a drop zone, giving a total order across the collection.
pub fn zone_rank(zone: &str) -> u8 {
    match zone {
        "important-urgent" => 0,
        "important-not-urgent" => 1,
        "not-important-urgent" => 2,
        "not-important-not-urgent" => 3,
        "doing" => 4,
        "done" => 5,
        "archived" => 6,
        _ => 7,
    }
}

/// Advisory manual ordering: drop zone -> ordered task IDs.
pub type TaskOrder = BTreeMap<String, Vec<String>>;

/// Focus entry for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayFocus {
    pub date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

/// One persisted calendar file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarYear {
    pub year: i32,
    #[serde(default)]
    pub entries: Vec<DayFocus>,
}

/// UI navigation and preference state.
///
/// Persisted to a file listed in `.gitignore`, so it never shows up in
/// history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationContext {
    pub current_view: String,
    pub current_item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_theme_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_date: Option<NaiveDate>,
    pub show_completed: bool,
    pub show_archived: bool,
    pub expanded_okr_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed: Option<DateTime<Utc>>,
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidInput(format!("Invalid date (expected YYYY-MM-DD): {}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_round_trips_through_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_board_transitions() {
        use TaskStatus::*;
        assert!(Todo.can_move_to(Doing));
        assert!(Doing.can_move_to(Todo));
        assert!(Doing.can_move_to(Done));
        assert!(Done.can_move_to(Doing));
        assert!(Todo.can_move_to(Done));

        assert!(!Done.can_move_to(Todo));
        assert!(!Done.can_move_to(Archived));
        assert!(!Archived.can_move_to(Done));
        assert!(!Todo.can_move_to(Todo));
    }

    #[test]
    fn test_priority_parse_and_allowed_set() {
        assert_eq!(
            "important-urgent".parse::<Priority>().unwrap(),
            Priority::ImportantUrgent
        );
        assert_eq!("Q3".parse::<Priority>().unwrap(), Priority::NotImportantUrgent);
        assert!(!Priority::NotImportantNotUrgent.is_allowed());
        assert!(Priority::ImportantNotUrgent.is_allowed());
        assert!("urgent-ish".parse::<Priority>().is_err());
    }

    #[test]
    fn test_priority_serialization() {
        let json = serde_json::to_string(&Priority::ImportantNotUrgent).unwrap();
        assert_eq!(json, r#""important-not-urgent""#);
    }

    #[test]
    fn test_task_record_omits_status() {
        let mut task = Task::new("H-T1".to_string(), "Stretch".to_string(), "H".to_string());
        task.status = TaskStatus::Doing;
        let json = serde_json::to_string(&task).unwrap();
        assert!(!json.contains("status"));
        assert!(json.contains(r#""themeId":"H""#));

        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, TaskStatus::Todo);
    }

    #[test]
    fn test_drop_zone() {
        let mut task = Task::new("H-T1".to_string(), "Stretch".to_string(), "H".to_string());
        task.priority = Priority::ImportantUrgent;
        assert_eq!(task.drop_zone(), "important-urgent");
        task.status = TaskStatus::Doing;
        assert_eq!(task.drop_zone(), "doing");
    }

    #[test]
    fn test_zone_rank_orders_todo_sections_first() {
        assert!(zone_rank("important-urgent") < zone_rank("important-not-urgent"));
        assert!(zone_rank("not-important-urgent") < zone_rank("doing"));
        assert!(zone_rank("done") < zone_rank("archived"));
        assert!(zone_rank("archived") < zone_rank("mystery"));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date("03/01/2026").is_err());
    }

    #[test]
    fn test_navigation_context_tolerates_missing_fields() {
        let ctx: NavigationContext = serde_json::from_str(r#"{"currentView":"okr"}"#).unwrap();
        assert_eq!(ctx.current_view, "okr");
        assert!(!ctx.show_archived);
        assert!(ctx.expanded_okr_ids.is_empty());
    }
}
