//! Task rule engine.
//!
//! Every task create, update, and move is checked here before anything is
//! written. The engine is pure: it sees the event, the task as it would look
//! afterwards, and a read-only snapshot of every task, and returns a
//! [`Verdict`]. Denials carry one [`RuleViolation`] per failed rule.
//!
//! Rules are plain enum variants; [`RuleEngine::evaluate`] dispatches each
//! one that applies to the event.

use crate::models::{Task, TaskStatus};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// What is about to happen to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    Create,
    Update,
    Move { from: TaskStatus, to: TaskStatus },
}

impl TaskEvent {
    fn name(&self) -> &'static str {
        match self {
            TaskEvent::Create => "create",
            TaskEvent::Update => "update",
            TaskEvent::Move { .. } => "move",
        }
    }
}

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub rule_id: String,
    pub message: String,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule_id, self.message)
    }
}

/// Outcome of evaluating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub allowed: bool,
    pub violations: Vec<RuleViolation>,
}

impl Verdict {
    /// Convert a denial into an error, for callers that must not proceed.
    pub fn into_result(self) -> crate::Result<()> {
        if self.allowed {
            Ok(())
        } else {
            Err(crate::Error::RuleViolation(self.violations))
        }
    }
}

/// A single board rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Priority must be one of the three board quadrants.
    PriorityAllowed,
    /// Moves must follow the board state machine.
    StatusTransition,
    /// A parent task must exist.
    ParentExists,
    /// A parent task must belong to the same theme.
    ParentSameTheme,
    /// A parent task must not be archived.
    ParentNotArchived,
    /// Following parents must never lead back to the task.
    NoParentCycle,
    /// At most `limit` tasks may be in doing.
    WipLimit { limit: usize },
}

impl Rule {
    pub fn id(&self) -> &'static str {
        match self {
            Rule::PriorityAllowed => "priority-allowed",
            Rule::StatusTransition => "status-transition",
            Rule::ParentExists => "parent-exists",
            Rule::ParentSameTheme => "parent-same-theme",
            Rule::ParentNotArchived => "parent-not-archived",
            Rule::NoParentCycle => "no-parent-cycle",
            Rule::WipLimit { .. } => "wip-limit",
        }
    }

    fn applies_to(&self, event: TaskEvent) -> bool {
        match self {
            Rule::PriorityAllowed
            | Rule::ParentExists
            | Rule::ParentSameTheme
            | Rule::ParentNotArchived => matches!(event, TaskEvent::Create | TaskEvent::Update),
            Rule::NoParentCycle => event == TaskEvent::Update,
            Rule::StatusTransition | Rule::WipLimit { .. } => {
                matches!(event, TaskEvent::Move { .. })
            }
        }
    }

    /// Parent rules only judge a parent being set. An update that keeps the
    /// stored parent is not re-checked, so a restored subtask of an archived
    /// parent stays editable.
    fn is_parent_rule(&self) -> bool {
        matches!(
            self,
            Rule::ParentExists | Rule::ParentSameTheme | Rule::ParentNotArchived
        )
    }

    /// Run the rule. `Some(message)` means the rule failed.
    fn check(&self, event: TaskEvent, task: &Task, snapshot: &[Task]) -> Option<String> {
        if self.is_parent_rule() && event == TaskEvent::Update && parent_unchanged(task, snapshot) {
            return None;
        }
        match *self {
            Rule::PriorityAllowed => (!task.priority.is_allowed()).then(|| {
                format!("priority {} is not allowed on the board", task.priority)
            }),
            Rule::StatusTransition => {
                let TaskEvent::Move { from, to } = event else {
                    return None;
                };
                (!from.can_move_to(to)).then(|| format!("cannot move task from {} to {}", from, to))
            }
            Rule::ParentExists => {
                let parent_id = task.parent_task_id.as_deref()?;
                find(snapshot, parent_id)
                    .is_none()
                    .then(|| format!("parent task {} does not exist", parent_id))
            }
            Rule::ParentSameTheme => {
                let parent = parent_of(task, snapshot)?;
                (parent.theme_id != task.theme_id).then(|| {
                    format!(
                        "parent task {} belongs to theme {}, not {}",
                        parent.id, parent.theme_id, task.theme_id
                    )
                })
            }
            Rule::ParentNotArchived => {
                let parent = parent_of(task, snapshot)?;
                (parent.status == TaskStatus::Archived)
                    .then(|| format!("parent task {} is archived", parent.id))
            }
            Rule::NoParentCycle => {
                let mut seen = HashSet::new();
                let mut next = task.parent_task_id.as_deref();
                while let Some(id) = next {
                    if id == task.id {
                        return Some(format!(
                            "making {} a subtask of {} would create a cycle",
                            task.id,
                            task.parent_task_id.as_deref().unwrap_or_default()
                        ));
                    }
                    if !seen.insert(id) {
                        break;
                    }
                    next = find(snapshot, id).and_then(|t| t.parent_task_id.as_deref());
                }
                None
            }
            Rule::WipLimit { limit } => {
                let TaskEvent::Move { to, .. } = event else {
                    return None;
                };
                if to != TaskStatus::Doing {
                    return None;
                }
                let doing = snapshot
                    .iter()
                    .filter(|t| t.status == TaskStatus::Doing && t.id != task.id)
                    .count();
                (doing + 1 > limit)
                    .then(|| format!("doing already holds {} task(s); limit is {}", doing, limit))
            }
        }
    }
}

fn find<'a>(snapshot: &'a [Task], id: &str) -> Option<&'a Task> {
    snapshot.iter().find(|t| t.id == id)
}

fn parent_unchanged(task: &Task, snapshot: &[Task]) -> bool {
    find(snapshot, &task.id).is_some_and(|stored| stored.parent_task_id == task.parent_task_id)
}

fn parent_of<'a>(task: &Task, snapshot: &'a [Task]) -> Option<&'a Task> {
    task.parent_task_id
        .as_deref()
        .and_then(|id| find(snapshot, id))
}

/// Ordered set of rules applied to every task event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl Default for RuleEngine {
    /// Every rule except the WIP limit.
    fn default() -> Self {
        Self {
            rules: vec![
                Rule::PriorityAllowed,
                Rule::StatusTransition,
                Rule::ParentExists,
                Rule::ParentSameTheme,
                Rule::ParentNotArchived,
                Rule::NoParentCycle,
            ],
        }
    }
}

impl RuleEngine {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Default rules plus a limit on the doing column.
    pub fn with_wip_limit(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.rules.push(Rule::WipLimit { limit });
        }
        self
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate every applicable rule. `task` is the task as it will be after
    /// the event; `snapshot` is every task as currently stored.
    pub fn evaluate(&self, event: TaskEvent, task: &Task, snapshot: &[Task]) -> Verdict {
        let violations: Vec<RuleViolation> = self
            .rules
            .iter()
            .filter(|rule| rule.applies_to(event))
            .filter_map(|rule| {
                rule.check(event, task, snapshot).map(|message| RuleViolation {
                    rule_id: rule.id().to_string(),
                    message,
                })
            })
            .collect();

        if !violations.is_empty() {
            tracing::debug!(
                "{} of {} denied by {} rule(s)",
                event.name(),
                task.id,
                violations.len()
            );
        }
        Verdict {
            allowed: violations.is_empty(),
            violations,
        }
    }
}
