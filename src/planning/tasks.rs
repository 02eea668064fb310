//! Task operations: CRUD, board moves with cascades, archive and restore,
//! and priority promotion.

use super::ordering::{append_to_zone, merge_order, prune_order, remove_from_zone};
use super::{PlanningManager, require_text};
use crate::ids::next_task_id;
use crate::models::{Priority, Task, TaskOrder, TaskStatus};
use crate::rules::TaskEvent;
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Fields for a new task. Status always starts at todo.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub theme_id: String,
    pub description: String,
    pub priority: Priority,
    pub day_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub promotion_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub parent_task_id: Option<String>,
}

/// Partial task edit. `None` keeps the current value; for the optional
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub day_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub promotion_date: Option<Option<NaiveDate>>,
    pub tags: Option<Vec<String>>,
    pub parent_task_id: Option<Option<String>>,
}

/// A cascade step that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeFailure {
    pub task_id: String,
    pub message: String,
}

/// Result of a board move: the moved task plus what the cascades did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub task: Task,
    /// IDs of other tasks moved as a consequence.
    pub cascaded: Vec<String>,
    pub cascade_failures: Vec<CascadeFailure>,
}

fn find<'a>(snapshot: &'a [Task], id: &str) -> Result<&'a Task> {
    snapshot
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| Error::not_found("Task", id))
}

/// Every descendant of `id`, breadth-first.
fn descendants(snapshot: &[Task], id: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([id]);
    let mut frontier = vec![id];
    while let Some(current) = frontier.pop() {
        for child in snapshot
            .iter()
            .filter(|t| t.parent_task_id.as_deref() == Some(current))
        {
            if seen.insert(child.id.as_str()) {
                found.push(child.id.clone());
                frontier.push(child.id.as_str());
            }
        }
    }
    found
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

impl PlanningManager {
    /// Create a todo task in a theme.
    pub fn create_task(&self, new: NewTask) -> Result<Task> {
        let title = require_text("Task title", &new.title)?;
        if !self
            .storage
            .load_themes()?
            .iter()
            .any(|t| t.id == new.theme_id)
        {
            return Err(Error::not_found("Theme", new.theme_id));
        }

        let snapshot = self.storage.load_tasks()?;
        let id = next_task_id(&new.theme_id, snapshot.iter().map(|t| t.id.as_str()));
        let mut task = Task::new(id, title, new.theme_id);
        task.description = new.description.trim().to_string();
        task.priority = new.priority;
        task.day_date = new.day_date;
        task.due_date = new.due_date;
        task.promotion_date = new.promotion_date;
        task.tags = clean_tags(new.tags);
        task.parent_task_id = new.parent_task_id;

        self.rules
            .evaluate(TaskEvent::Create, &task, &snapshot)
            .into_result()?;

        let task_path = self.storage.write_task(&task)?;
        let mut order = self.storage.load_task_order()?;
        append_to_zone(&mut order, &task.drop_zone(), &task.id);
        let order_path = self.storage.write_task_order(&order)?;

        self.storage.commit(
            &[task_path, order_path],
            &format!("Create task {}: {}", task.id, task.title),
        )?;
        tracing::info!("created task {}", task.id);
        Ok(task)
    }

    /// Edit task fields. Status changes go through [`move_task`](Self::move_task).
    pub fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task> {
        let snapshot = self.storage.load_tasks()?;
        let mut task = find(&snapshot, id)?.clone();
        let old_zone = task.drop_zone();

        if let Some(title) = update.title {
            task.title = require_text("Task title", &title)?;
        }
        if let Some(description) = update.description {
            task.description = description.trim().to_string();
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(day_date) = update.day_date {
            task.day_date = day_date;
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        if let Some(promotion_date) = update.promotion_date {
            task.promotion_date = promotion_date;
        }
        if let Some(tags) = update.tags {
            task.tags = clean_tags(tags);
        }
        if let Some(parent_task_id) = update.parent_task_id {
            task.parent_task_id = parent_task_id;
        }
        task.updated_at = Utc::now();

        self.rules
            .evaluate(TaskEvent::Update, &task, &snapshot)
            .into_result()?;

        let mut paths = vec![self.storage.write_task(&task)?];
        let new_zone = task.drop_zone();
        if new_zone != old_zone {
            let mut order = self.storage.load_task_order()?;
            remove_from_zone(&mut order, &old_zone, &task.id);
            append_to_zone(&mut order, &new_zone, &task.id);
            paths.push(self.storage.write_task_order(&order)?);
        }

        self.storage
            .commit(&paths, &format!("Update task {}", task.id))?;
        Ok(task)
    }

    /// Move a task to another board column.
    ///
    /// `positions`, when given, replaces the listed order zones (typically the
    /// destination zone with the task at its drop position). Afterwards two
    /// best-effort cascades run, each in its own commit: starting a subtask
    /// starts a parent that is still todo, and finishing a task finishes
    /// every open direct subtask. Cascade failures are logged and reported in
    /// the outcome; they never undo the move itself.
    pub fn move_task(
        &self,
        id: &str,
        to: TaskStatus,
        positions: Option<TaskOrder>,
    ) -> Result<MoveOutcome> {
        let snapshot = self.storage.load_tasks()?;
        let task = find(&snapshot, id)?.clone();
        let message = format!("Move task {} to {}", id, to);
        let moved = self.apply_move(task, to, positions, &snapshot, true, &message)?;

        let mut outcome = MoveOutcome {
            task: moved,
            cascaded: Vec::new(),
            cascade_failures: Vec::new(),
        };
        match to {
            TaskStatus::Doing => self.start_parent(&mut outcome),
            TaskStatus::Done => self.finish_subtasks(&mut outcome),
            _ => {}
        }
        Ok(outcome)
    }

    /// Rename the record into its new column, update the order, and commit.
    fn apply_move(
        &self,
        mut task: Task,
        to: TaskStatus,
        positions: Option<TaskOrder>,
        snapshot: &[Task],
        enforce_rules: bool,
        message: &str,
    ) -> Result<Task> {
        let from = task.status;
        if enforce_rules {
            let mut candidate = task.clone();
            candidate.status = to;
            self.rules
                .evaluate(TaskEvent::Move { from, to }, &candidate, snapshot)
                .into_result()?;
        }

        let old_zone = task.drop_zone();
        let [from_path, to_path] = self.storage.move_task_file(&task, to)?;
        task.status = to;
        task.updated_at = Utc::now();
        self.storage.write_task(&task)?;

        let mut order = self.storage.load_task_order()?;
        remove_from_zone(&mut order, &old_zone, &task.id);
        let new_zone = task.drop_zone();
        if let Some(positions) = positions {
            merge_order(&mut order, positions);
        }
        append_to_zone(&mut order, &new_zone, &task.id);
        let order_path = self.storage.write_task_order(&order)?;

        self.storage
            .commit(&[from_path, to_path, order_path], message)?;
        Ok(task)
    }

    fn start_parent(&self, outcome: &mut MoveOutcome) {
        let Some(parent_id) = outcome.task.parent_task_id.clone() else {
            return;
        };
        let result = self.storage.load_tasks().and_then(|snapshot| {
            let parent = find(&snapshot, &parent_id)?.clone();
            if parent.status != TaskStatus::Todo {
                return Ok(false);
            }
            let message = format!(
                "Move task {} to doing (subtask {} started)",
                parent_id, outcome.task.id
            );
            self.apply_move(parent, TaskStatus::Doing, None, &snapshot, true, &message)?;
            Ok(true)
        });

        match result {
            Ok(true) => outcome.cascaded.push(parent_id),
            Ok(false) => {}
            Err(e) => record_cascade_failure(outcome, parent_id, e),
        }
    }

    fn finish_subtasks(&self, outcome: &mut MoveOutcome) {
        let snapshot = match self.storage.load_tasks() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                let id = outcome.task.id.clone();
                record_cascade_failure(outcome, id, e);
                return;
            }
        };

        let open: Vec<Task> = snapshot
            .iter()
            .filter(|t| t.parent_task_id.as_deref() == Some(outcome.task.id.as_str()))
            .filter(|t| matches!(t.status, TaskStatus::Todo | TaskStatus::Doing))
            .cloned()
            .collect();

        for child in open {
            let child_id = child.id.clone();
            let message = format!(
                "Move task {} to done (parent {} finished)",
                child_id, outcome.task.id
            );
            match self.apply_move(child, TaskStatus::Done, None, &snapshot, false, &message) {
                Ok(_) => outcome.cascaded.push(child_id),
                Err(e) => record_cascade_failure(outcome, child_id, e),
            }
        }
    }

    /// Delete a task record. Its direct subtasks become top-level tasks.
    pub fn delete_task(&self, id: &str) -> Result<Task> {
        let snapshot = self.storage.load_tasks()?;
        let task = find(&snapshot, id)?.clone();

        let mut paths: Vec<PathBuf> = vec![self.storage.remove_task_file(&task)?];
        for child in snapshot
            .iter()
            .filter(|t| t.parent_task_id.as_deref() == Some(id))
        {
            let mut child = child.clone();
            child.parent_task_id = None;
            child.updated_at = Utc::now();
            paths.push(self.storage.write_task(&child)?);
        }

        let mut order = self.storage.load_task_order()?;
        prune_order(&mut order, &[task.id.clone()]);
        paths.push(self.storage.write_task_order(&order)?);

        self.storage
            .commit(&paths, &format!("Delete task {}: {}", task.id, task.title))?;
        tracing::info!("deleted task {}", task.id);
        Ok(task)
    }

    /// Archive a done task together with all of its descendants, whatever
    /// their status. Returns the IDs that were archived.
    pub fn archive_task(&self, id: &str) -> Result<Vec<String>> {
        let snapshot = self.storage.load_tasks()?;
        let task = find(&snapshot, id)?;
        if task.status != TaskStatus::Done {
            return Err(Error::InvalidTransition {
                id: id.to_string(),
                from: task.status.to_string(),
                to: TaskStatus::Archived.to_string(),
            });
        }

        let mut affected = vec![task.id.clone()];
        affected.extend(descendants(&snapshot, id));

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut archived = Vec::new();
        for task in snapshot
            .iter()
            .filter(|t| affected.contains(&t.id) && t.status != TaskStatus::Archived)
        {
            paths.extend(self.relocate(task.clone(), TaskStatus::Archived)?);
            archived.push(task.id.clone());
        }

        let mut order = self.storage.load_task_order()?;
        prune_order(&mut order, &affected);
        paths.push(self.storage.write_task_order(&order)?);

        let message = match archived.len() {
            1 => format!("Archive task {}", id),
            n => format!("Archive task {} and {} subtask(s)", id, n - 1),
        };
        self.storage.commit(&paths, &message)?;
        tracing::info!("archived {} task(s) under {}", archived.len(), id);
        Ok(archived)
    }

    /// Bring an archived task back to done, along with its archived
    /// descendants. Descendants in other columns are left alone.
    pub fn restore_task(&self, id: &str) -> Result<Vec<String>> {
        let snapshot = self.storage.load_tasks()?;
        let task = find(&snapshot, id)?;
        if task.status != TaskStatus::Archived {
            return Err(Error::InvalidTransition {
                id: id.to_string(),
                from: task.status.to_string(),
                to: TaskStatus::Done.to_string(),
            });
        }

        let mut affected = vec![task.id.clone()];
        affected.extend(descendants(&snapshot, id));

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut restored = Vec::new();
        let mut order = self.storage.load_task_order()?;
        for task in snapshot
            .iter()
            .filter(|t| affected.contains(&t.id) && t.status == TaskStatus::Archived)
        {
            paths.extend(self.relocate(task.clone(), TaskStatus::Done)?);
            append_to_zone(&mut order, TaskStatus::Done.as_str(), &task.id);
            restored.push(task.id.clone());
        }
        paths.push(self.storage.write_task_order(&order)?);

        let message = match restored.len() {
            1 => format!("Restore task {}", id),
            n => format!("Restore task {} and {} subtask(s)", id, n - 1),
        };
        self.storage.commit(&paths, &message)?;
        Ok(restored)
    }

    /// Archive every done task that is not below another done task.
    pub fn archive_all_done_tasks(&self) -> Result<Vec<String>> {
        let snapshot = self.storage.load_tasks()?;
        let done: HashSet<&str> = snapshot
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .map(|t| t.id.as_str())
            .collect();
        let roots: Vec<String> = snapshot
            .iter()
            .filter(|t| t.status == TaskStatus::Done)
            .filter(|t| match t.parent_task_id.as_deref() {
                Some(parent) => !done.contains(parent),
                None => true,
            })
            .map(|t| t.id.clone())
            .collect();

        let mut archived = Vec::new();
        for root in roots {
            // An earlier root may already have archived this one as a descendant.
            if self.storage.find_task(&root)?.status != TaskStatus::Done {
                continue;
            }
            archived.extend(self.archive_task(&root)?);
        }
        Ok(archived)
    }

    /// Promote every important-not-urgent task whose promotion date has
    /// arrived to important-urgent, clearing the date. Returns the promoted
    /// tasks. Running it twice on the same day changes nothing the second time.
    pub fn process_priority_promotions(&self, today: NaiveDate) -> Result<Vec<Task>> {
        let snapshot = self.storage.load_tasks()?;
        let due: Vec<Task> = snapshot
            .into_iter()
            .filter(|t| t.priority == Priority::ImportantNotUrgent)
            .filter(|t| t.promotion_date.is_some_and(|date| date <= today))
            .collect();
        if due.is_empty() {
            return Ok(Vec::new());
        }

        let mut order = self.storage.load_task_order()?;
        let mut paths: Vec<PathBuf> = Vec::new();
        let mut promoted = Vec::new();
        for mut task in due {
            let old_zone = task.drop_zone();
            task.priority = Priority::ImportantUrgent;
            task.promotion_date = None;
            task.updated_at = Utc::now();
            let new_zone = task.drop_zone();
            if new_zone != old_zone {
                remove_from_zone(&mut order, &old_zone, &task.id);
                append_to_zone(&mut order, &new_zone, &task.id);
            }
            paths.push(self.storage.write_task(&task)?);
            promoted.push(task);
        }
        paths.push(self.storage.write_task_order(&order)?);

        self.storage.commit(
            &paths,
            &format!("Promote {} task(s) to important-urgent", promoted.len()),
        )?;
        tracing::info!("promoted {} task(s)", promoted.len());
        Ok(promoted)
    }

    /// Move a record to `to` without rules or order changes. Returns the paths
    /// to stage.
    fn relocate(&self, mut task: Task, to: TaskStatus) -> Result<[PathBuf; 2]> {
        let paths = self.storage.move_task_file(&task, to)?;
        task.status = to;
        task.updated_at = Utc::now();
        self.storage.write_task(&task)?;
        Ok(paths)
    }
}

fn record_cascade_failure(outcome: &mut MoveOutcome, task_id: String, error: Error) {
    tracing::warn!(
        "cascade from {} failed for {}: {}",
        outcome.task.id,
        task_id,
        error
    );
    outcome.cascade_failures.push(CascadeFailure {
        task_id,
        message: error.to_string(),
    });
}
