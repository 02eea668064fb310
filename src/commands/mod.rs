//! Command implementations for the Bearing CLI.
//!
//! Each command opens the data directory, calls one planning operation, and
//! returns a result type implementing [`Output`]. Commands are grouped by
//! entity:
//! - `init` - Create the data directory and its history
//! - `theme_*`, `objective_*`, `kr_*` - OKR tree
//! - `task_*` - Board tasks, ordering, and promotions
//! - `calendar_*`, `nav_*` - Yearly focus and navigation state
//! - `config_*` - Layered configuration

use crate::config::{
    BearingConfig, OutputFormat, ResolvedConfig, ValueSource, data_config_path, read_config_file,
    system_config_path, write_config_file,
};
use crate::models::board::BoardConfiguration;
use crate::models::okr::{KeyResult, KeyResultKind, Objective, OkrStatus, Theme};
use crate::models::{
    CalendarYear, DayFocus, NavigationContext, Priority, Task, TaskOrder, TaskStatus, drop_zone,
    parse_date, zone_rank,
};
use crate::planning::tasks::CascadeFailure;
use crate::planning::{MoveOutcome, NewTask, PlanningManager, TaskUpdate};
use crate::storage::{CommitInfo, Storage};
use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Open an initialized data directory with the resolved identity and rules.
pub fn open_manager(data_dir: &Path, config: &ResolvedConfig) -> Result<PlanningManager> {
    let storage = Storage::open_with_identity(data_dir, config.identity())?;
    Ok(PlanningManager::with_rules(storage, config.rule_engine()))
}

/// "none" (any case) or an empty string clears an optional value.
fn is_clear(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

fn optional_date(value: Option<String>) -> Result<Option<NaiveDate>> {
    value.as_deref().map(parse_date).transpose()
}

fn clearable_date(value: Option<String>) -> Result<Option<Option<NaiveDate>>> {
    match value {
        None => Ok(None),
        Some(v) if is_clear(&v) => Ok(Some(None)),
        Some(v) => parse_date(&v).map(|d| Some(Some(d))),
    }
}

fn clearable_text(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if is_clear(&v) { None } else { Some(v) })
}

// === Shared results ===

/// Confirmation that an entity was removed.
#[derive(Serialize)]
pub struct Deleted {
    pub deleted: bool,
    pub kind: &'static str,
    pub id: String,
}

impl Deleted {
    fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            deleted: true,
            kind,
            id: id.into(),
        }
    }
}

impl Output for Deleted {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted {} {}", self.kind.to_lowercase(), self.id)
    }
}

// === Init ===

#[derive(Serialize)]
pub struct InitResult {
    pub path: PathBuf,
    /// False when the directory already held a data set.
    pub created: bool,
}

impl Output for InitResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.created {
            format!("Initialized bearing data in {}", self.path.display())
        } else {
            format!("Bearing data already initialized in {}", self.path.display())
        }
    }
}

/// Initialize the data directory. Safe to run again.
pub fn init(data_dir: &Path, config: &ResolvedConfig) -> Result<InitResult> {
    let created = !Storage::exists(data_dir);
    Storage::init_with_identity(data_dir, config.identity())?;
    Ok(InitResult {
        path: data_dir.to_path_buf(),
        created,
    })
}

// === Themes ===

fn format_theme(out: &mut String, theme: &Theme) {
    let _ = writeln!(out, "{}  {} ({})", theme.id, theme.name, theme.color);
    for objective in &theme.objectives {
        format_objective(out, objective, 1);
    }
}

fn format_objective(out: &mut String, objective: &Objective, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(
        out,
        "{}{} [{}] {}",
        indent, objective.id, objective.status, objective.title
    );
    for kr in &objective.key_results {
        let _ = writeln!(out, "{}  {}", indent, format_key_result(kr));
    }
    for child in &objective.objectives {
        format_objective(out, child, depth + 1);
    }
}

fn format_key_result(kr: &KeyResult) -> String {
    let measure = match kr.kind() {
        KeyResultKind::Untracked => String::new(),
        KeyResultKind::Binary => {
            if kr.current_value >= 1 {
                " (done)".to_string()
            } else {
                " (open)".to_string()
            }
        }
        KeyResultKind::Numeric => format!(
            " ({}/{}, start {})",
            kr.current_value, kr.target_value, kr.start_value
        ),
    };
    format!("{} [{}] {}{}", kr.id, kr.status, kr.description, measure)
}

#[derive(Serialize)]
pub struct ThemeList {
    pub themes: Vec<Theme>,
    pub count: usize,
}

impl Output for ThemeList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.themes.is_empty() {
            return "No themes.".to_string();
        }
        let mut out = String::new();
        for theme in &self.themes {
            format_theme(&mut out, theme);
        }
        out.trim_end().to_string()
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct ThemeResult(pub Theme);

impl Output for ThemeResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = String::new();
        format_theme(&mut out, &self.0);
        out.trim_end().to_string()
    }
}

#[derive(Serialize)]
pub struct Suggestion {
    pub name: String,
    pub abbreviation: String,
}

impl Output for Suggestion {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("{} -> {}", self.name, self.abbreviation)
    }
}

pub fn theme_list(manager: &PlanningManager) -> Result<ThemeList> {
    let themes = manager.get_themes()?;
    Ok(ThemeList {
        count: themes.len(),
        themes,
    })
}

pub fn theme_show(manager: &PlanningManager, id: &str) -> Result<ThemeResult> {
    manager
        .get_themes()?
        .into_iter()
        .find(|t| t.id == id)
        .map(ThemeResult)
        .ok_or_else(|| Error::not_found("Theme", id))
}

pub fn theme_create(
    manager: &PlanningManager,
    name: &str,
    color: &str,
    id: Option<&str>,
) -> Result<ThemeResult> {
    manager.create_theme(name, color, id).map(ThemeResult)
}

pub fn theme_update(
    manager: &PlanningManager,
    id: &str,
    name: Option<&str>,
    color: Option<&str>,
) -> Result<ThemeResult> {
    manager.update_theme(id, name, color).map(ThemeResult)
}

/// Replace a theme from a JSON document; `-` reads stdin.
pub fn theme_save(manager: &PlanningManager, file: &Path) -> Result<ThemeResult> {
    let content = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };
    let theme: Theme = serde_json::from_str(&content)?;
    manager.save_theme(theme).map(ThemeResult)
}

pub fn theme_delete(manager: &PlanningManager, id: &str) -> Result<Deleted> {
    let removed = manager.delete_theme(id)?;
    Ok(Deleted::new("Theme", removed.id))
}

pub fn theme_suggest(manager: &PlanningManager, name: &str) -> Result<Suggestion> {
    Ok(Suggestion {
        name: name.to_string(),
        abbreviation: manager.suggest_theme_abbreviation(name)?,
    })
}

// === Objectives ===

#[derive(Serialize)]
#[serde(transparent)]
pub struct ObjectiveResult(pub Objective);

impl Output for ObjectiveResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = String::new();
        format_objective(&mut out, &self.0, 0);
        out.trim_end().to_string()
    }
}

pub fn objective_create(
    manager: &PlanningManager,
    parent: &str,
    title: &str,
) -> Result<ObjectiveResult> {
    manager.create_objective(parent, title).map(ObjectiveResult)
}

pub fn objective_update(manager: &PlanningManager, id: &str, title: &str) -> Result<ObjectiveResult> {
    manager.update_objective(id, title).map(ObjectiveResult)
}

pub fn objective_delete(manager: &PlanningManager, id: &str) -> Result<Deleted> {
    let removed = manager.delete_objective(id)?;
    Ok(Deleted::new("Objective", removed.id))
}

pub fn objective_move(manager: &PlanningManager, id: &str, parent: &str) -> Result<ObjectiveResult> {
    manager.move_objective(id, parent).map(ObjectiveResult)
}

pub fn objective_status(
    manager: &PlanningManager,
    id: &str,
    status: &str,
) -> Result<ObjectiveResult> {
    let status: OkrStatus = status.parse()?;
    manager.set_objective_status(id, status).map(ObjectiveResult)
}

// === Key results ===

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResultView {
    #[serde(flatten)]
    pub key_result: KeyResult,
    pub kind: KeyResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl From<KeyResult> for KeyResultView {
    fn from(key_result: KeyResult) -> Self {
        Self {
            kind: key_result.kind(),
            progress: key_result.progress(),
            key_result,
        }
    }
}

impl Output for KeyResultView {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self.progress {
            Some(p) => format!("{} - {:.0}%", format_key_result(&self.key_result), p * 100.0),
            None => format_key_result(&self.key_result),
        }
    }
}

pub fn kr_create(
    manager: &PlanningManager,
    objective: &str,
    description: &str,
    start: i64,
    target: i64,
) -> Result<KeyResultView> {
    manager
        .create_key_result(objective, description, start, target)
        .map(KeyResultView::from)
}

pub fn kr_update(
    manager: &PlanningManager,
    id: &str,
    description: Option<&str>,
    start: Option<i64>,
    target: Option<i64>,
) -> Result<KeyResultView> {
    manager
        .update_key_result(id, description, start, target)
        .map(KeyResultView::from)
}

pub fn kr_progress(manager: &PlanningManager, id: &str, value: i64) -> Result<KeyResultView> {
    manager
        .update_key_result_progress(id, value)
        .map(KeyResultView::from)
}

pub fn kr_delete(manager: &PlanningManager, id: &str) -> Result<Deleted> {
    let removed = manager.delete_key_result(id)?;
    Ok(Deleted::new("Key result", removed.id))
}

pub fn kr_status(manager: &PlanningManager, id: &str, status: &str) -> Result<KeyResultView> {
    let status: OkrStatus = status.parse()?;
    manager
        .set_key_result_status(id, status)
        .map(KeyResultView::from)
}

// === Tasks ===

/// A task together with its location-derived status.
#[derive(Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub status: TaskStatus,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            status: task.status,
            task,
        }
    }
}

fn format_task_line(task: &Task) -> String {
    let mut line = format!("[{}] {} {}", task.drop_zone(), task.id, task.title);
    if let Some(parent) = &task.parent_task_id {
        let _ = write!(line, " (sub of {})", parent);
    }
    if let Some(due) = task.due_date {
        let _ = write!(line, " due {}", due);
    }
    line
}

impl Output for TaskView {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let task = &self.task;
        let mut lines = vec![
            format!("{} {}", task.id, task.title),
            format!("  Theme: {}", task.theme_id),
            format!("  Status: {}", self.status),
            format!("  Priority: {}", task.priority),
        ];
        if !task.description.is_empty() {
            lines.push(format!("  Description: {}", task.description));
        }
        if let Some(day) = task.day_date {
            lines.push(format!("  Day: {}", day));
        }
        if let Some(due) = task.due_date {
            lines.push(format!("  Due: {}", due));
        }
        if let Some(promote) = task.promotion_date {
            lines.push(format!("  Promote on: {}", promote));
        }
        if let Some(parent) = &task.parent_task_id {
            lines.push(format!("  Parent: {}", parent));
        }
        if !task.tags.is_empty() {
            lines.push(format!("  Tags: {}", task.tags.join(", ")));
        }
        lines.join("\n")
    }
}

#[derive(Serialize)]
pub struct TaskList {
    pub tasks: Vec<TaskView>,
    pub count: usize,
}

impl TaskList {
    fn new(tasks: Vec<Task>) -> Self {
        Self {
            count: tasks.len(),
            tasks: tasks.into_iter().map(TaskView::from).collect(),
        }
    }
}

impl Output for TaskList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.tasks.is_empty() {
            return "No tasks.".to_string();
        }
        self.tasks
            .iter()
            .map(|v| format_task_line(&v.task))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    pub task: TaskView,
    pub cascaded: Vec<String>,
    pub cascade_failures: Vec<CascadeFailure>,
}

impl From<MoveOutcome> for MoveResult {
    fn from(outcome: MoveOutcome) -> Self {
        Self {
            task: outcome.task.into(),
            cascaded: outcome.cascaded,
            cascade_failures: outcome.cascade_failures,
        }
    }
}

impl Output for MoveResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = format!("Moved {} to {}", self.task.task.id, self.task.status);
        if !self.cascaded.is_empty() {
            let _ = write!(out, "\n  Also moved: {}", self.cascaded.join(", "));
        }
        for failure in &self.cascade_failures {
            let _ = write!(out, "\n  Could not move {}: {}", failure.task_id, failure.message);
        }
        out
    }
}

/// IDs touched by a bulk task operation.
#[derive(Serialize)]
pub struct TaskIdsResult {
    pub action: &'static str,
    pub ids: Vec<String>,
    pub count: usize,
}

impl TaskIdsResult {
    fn new(action: &'static str, ids: Vec<String>) -> Self {
        Self {
            action,
            count: ids.len(),
            ids,
        }
    }
}

impl Output for TaskIdsResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.ids.is_empty() {
            format!("Nothing {}.", self.action)
        } else {
            format!("{} {} task(s): {}", capitalize(self.action), self.count, self.ids.join(", "))
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct OrderResult(pub TaskOrder);

impl Output for OrderResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.0.is_empty() {
            return "No manual order.".to_string();
        }
        let mut zones: Vec<(&String, &Vec<String>)> = self.0.iter().collect();
        zones.sort_by_key(|(zone, _)| zone_rank(zone));
        zones
            .into_iter()
            .map(|(zone, ids)| format!("{}: {}", zone, ids.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Filter for `task list`.
#[derive(Debug, Default)]
pub struct TaskFilter {
    pub theme: Option<String>,
    pub status: Option<String>,
}

pub fn task_list(manager: &PlanningManager, filter: TaskFilter) -> Result<TaskList> {
    let status: Option<TaskStatus> = filter.status.as_deref().map(str::parse).transpose()?;
    let tasks = manager
        .get_tasks()?
        .into_iter()
        .filter(|t| filter.theme.as_deref().is_none_or(|theme| t.theme_id == theme))
        .filter(|t| status.is_none_or(|s| t.status == s))
        .collect();
    Ok(TaskList::new(tasks))
}

pub fn task_show(manager: &PlanningManager, id: &str) -> Result<TaskView> {
    manager.storage().find_task(id).map(TaskView::from)
}

/// Arguments of `task create`, still in their textual form.
#[derive(Debug, Default)]
pub struct TaskCreateArgs {
    pub title: String,
    pub theme: String,
    pub priority: Option<String>,
    pub description: Option<String>,
    pub day: Option<String>,
    pub due: Option<String>,
    pub promote_on: Option<String>,
    pub tags: Vec<String>,
    pub parent: Option<String>,
}

pub fn task_create(manager: &PlanningManager, args: TaskCreateArgs) -> Result<TaskView> {
    let priority: Priority = match args.priority {
        Some(p) => p.parse()?,
        None => Priority::default(),
    };
    let new = NewTask {
        title: args.title,
        theme_id: args.theme,
        description: args.description.unwrap_or_default(),
        priority,
        day_date: optional_date(args.day)?,
        due_date: optional_date(args.due)?,
        promotion_date: optional_date(args.promote_on)?,
        tags: args.tags,
        parent_task_id: args.parent,
    };
    manager.create_task(new).map(TaskView::from)
}

/// Arguments of `task update`, still in their textual form.
#[derive(Debug, Default)]
pub struct TaskUpdateArgs {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub day: Option<String>,
    pub due: Option<String>,
    pub promote_on: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
    pub parent: Option<String>,
}

pub fn task_update(manager: &PlanningManager, id: &str, args: TaskUpdateArgs) -> Result<TaskView> {
    let tags = if args.clear_tags {
        Some(Vec::new())
    } else if args.tags.is_empty() {
        None
    } else {
        Some(args.tags)
    };
    let update = TaskUpdate {
        title: args.title,
        description: args.description,
        priority: args.priority.as_deref().map(str::parse).transpose()?,
        day_date: clearable_date(args.day)?,
        due_date: clearable_date(args.due)?,
        promotion_date: clearable_date(args.promote_on)?,
        tags,
        parent_task_id: clearable_text(args.parent),
    };
    manager.update_task(id, update).map(TaskView::from)
}

/// Move a task. A non-empty `order` becomes the destination zone's order.
pub fn task_move(
    manager: &PlanningManager,
    id: &str,
    status: &str,
    order: Vec<String>,
) -> Result<MoveResult> {
    let to: TaskStatus = status.parse()?;
    let positions = if order.is_empty() {
        None
    } else {
        let task = manager.storage().find_task(id)?;
        Some(TaskOrder::from([(drop_zone(to, task.priority), order)]))
    };
    manager.move_task(id, to, positions).map(MoveResult::from)
}

pub fn task_delete(manager: &PlanningManager, id: &str) -> Result<Deleted> {
    let removed = manager.delete_task(id)?;
    Ok(Deleted::new("Task", removed.id))
}

pub fn task_archive(manager: &PlanningManager, id: &str) -> Result<TaskIdsResult> {
    Ok(TaskIdsResult::new("archived", manager.archive_task(id)?))
}

pub fn task_archive_done(manager: &PlanningManager) -> Result<TaskIdsResult> {
    Ok(TaskIdsResult::new("archived", manager.archive_all_done_tasks()?))
}

pub fn task_restore(manager: &PlanningManager, id: &str) -> Result<TaskIdsResult> {
    Ok(TaskIdsResult::new("restored", manager.restore_task(id)?))
}

/// Replace one drop zone's manual order.
pub fn task_reorder(manager: &PlanningManager, zone: &str, ids: Vec<String>) -> Result<OrderResult> {
    let zone = zone.trim().to_lowercase();
    // off-board and unknown zones have no manual order
    if zone_rank(&zone) >= zone_rank(TaskStatus::Archived.as_str()) {
        return Err(Error::InvalidInput(format!("Unknown drop zone: {}", zone)));
    }
    manager
        .reorder_tasks(TaskOrder::from([(zone, ids)]))
        .map(OrderResult)
}

pub fn task_order(manager: &PlanningManager) -> Result<OrderResult> {
    manager.get_task_order().map(OrderResult)
}

#[derive(Serialize)]
pub struct PromoteResult {
    pub today: NaiveDate,
    pub promoted: Vec<TaskView>,
    pub count: usize,
}

impl Output for PromoteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.promoted.is_empty() {
            return format!("No tasks due for promotion on {}.", self.today);
        }
        let mut out = format!("Promoted {} task(s) to important-urgent:", self.count);
        for view in &self.promoted {
            let _ = write!(out, "\n  {} {}", view.task.id, view.task.title);
        }
        out
    }
}

/// Run priority promotions as of `today`, defaulting to the local date.
pub fn task_promote(manager: &PlanningManager, today: Option<String>) -> Result<PromoteResult> {
    let today = match today {
        Some(date) => parse_date(&date)?,
        None => Local::now().date_naive(),
    };
    let promoted: Vec<TaskView> = manager
        .process_priority_promotions(today)?
        .into_iter()
        .map(TaskView::from)
        .collect();
    Ok(PromoteResult {
        today,
        count: promoted.len(),
        promoted,
    })
}

// === Board ===

#[derive(Serialize)]
#[serde(transparent)]
pub struct BoardResult(pub BoardConfiguration);

impl Output for BoardResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut out = String::new();
        for column in &self.0.columns {
            let _ = writeln!(out, "{} ({})", column.title, column.status);
            for section in &column.sections {
                let _ = writeln!(out, "  {} ({})", section.title, section.priority);
            }
        }
        out.trim_end().to_string()
    }
}

pub fn board(manager: &PlanningManager) -> BoardResult {
    BoardResult(manager.board_configuration())
}

// === Calendar ===

fn format_day(day: &DayFocus) -> String {
    let mut line = day.date.to_string();
    if let Some(theme) = &day.theme_id {
        let _ = write!(line, " [{}]", theme);
    }
    if !day.text.is_empty() {
        let _ = write!(line, " {}", day.text);
    }
    if !day.notes.is_empty() {
        let _ = write!(line, " - {}", day.notes);
    }
    line
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct CalendarResult(pub CalendarYear);

impl Output for CalendarResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.0.entries.is_empty() {
            return format!("No focus entries for {}.", self.0.year);
        }
        self.0
            .entries
            .iter()
            .map(format_day)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Serialize)]
#[serde(transparent)]
pub struct DayFocusResult(pub DayFocus);

impl Output for DayFocusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format_day(&self.0)
    }
}

#[derive(Serialize)]
pub struct ClearResult {
    pub date: NaiveDate,
    pub cleared: bool,
}

impl Output for ClearResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.cleared {
            format!("Cleared focus for {}", self.date)
        } else {
            format!("No focus set for {}", self.date)
        }
    }
}

pub fn calendar_show(manager: &PlanningManager, year: i32) -> Result<CalendarResult> {
    manager.get_year_focus(year).map(CalendarResult)
}

pub fn calendar_set(
    manager: &PlanningManager,
    date: &str,
    theme: Option<String>,
    text: String,
    notes: String,
) -> Result<DayFocusResult> {
    let day = DayFocus {
        date: parse_date(date)?,
        theme_id: theme.filter(|t| !is_clear(t)),
        notes,
        text,
    };
    manager.save_day_focus(day).map(DayFocusResult)
}

pub fn calendar_clear(manager: &PlanningManager, date: &str) -> Result<ClearResult> {
    let date = parse_date(date)?;
    Ok(ClearResult {
        date,
        cleared: manager.clear_day_focus(date)?,
    })
}

// === Navigation ===

#[derive(Serialize)]
#[serde(transparent)]
pub struct NavResult(pub NavigationContext);

impl Output for NavResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let nav = &self.0;
        let mut lines = vec![
            format!("View: {}", nav.current_view),
            format!("Item: {}", nav.current_item),
        ];
        if let Some(theme) = &nav.filter_theme_id {
            lines.push(format!("Theme filter: {}", theme));
        }
        if let Some(date) = nav.filter_date {
            lines.push(format!("Date filter: {}", date));
        }
        lines.push(format!("Show completed: {}", nav.show_completed));
        lines.push(format!("Show archived: {}", nav.show_archived));
        if !nav.expanded_okr_ids.is_empty() {
            lines.push(format!("Expanded: {}", nav.expanded_okr_ids.join(", ")));
        }
        lines.join("\n")
    }
}

/// Changes for `nav set`. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct NavArgs {
    pub view: Option<String>,
    pub item: Option<String>,
    pub theme: Option<String>,
    pub date: Option<String>,
    pub show_completed: Option<bool>,
    pub show_archived: Option<bool>,
    pub expanded: Option<Vec<String>>,
}

pub fn nav_show(manager: &PlanningManager) -> Result<NavResult> {
    manager.load_navigation_context().map(NavResult)
}

pub fn nav_set(manager: &PlanningManager, args: NavArgs) -> Result<NavResult> {
    let mut nav = manager.load_navigation_context()?;
    if let Some(view) = args.view {
        nav.current_view = view;
    }
    if let Some(item) = args.item {
        nav.current_item = item;
    }
    if let Some(theme) = clearable_text(args.theme) {
        nav.filter_theme_id = theme;
    }
    if let Some(date) = clearable_date(args.date)? {
        nav.filter_date = date;
    }
    if let Some(show) = args.show_completed {
        nav.show_completed = show;
    }
    if let Some(show) = args.show_archived {
        nav.show_archived = show;
    }
    if let Some(expanded) = args.expanded {
        nav.expanded_okr_ids = expanded;
    }
    manager.save_navigation_context(nav).map(NavResult)
}

// === History ===

#[derive(Serialize)]
pub struct HistoryResult {
    pub commits: Vec<CommitInfo>,
    pub count: usize,
}

impl Output for HistoryResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.commits.is_empty() {
            return "No history.".to_string();
        }
        self.commits
            .iter()
            .map(|c| {
                let short = c.id.get(..7).unwrap_or(&c.id);
                format!("{} {} {}", short, c.timestamp, c.message)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn history(manager: &PlanningManager, limit: usize) -> Result<HistoryResult> {
    let commits = manager.history(limit)?;
    Ok(HistoryResult {
        count: commits.len(),
        commits,
    })
}

// === Config ===

/// Keys accepted by `config get` and `config set`.
pub const CONFIG_KEYS: [&str; 5] = [
    "git-author-name",
    "git-author-email",
    "doing-wip-limit",
    "log-level",
    "output-format",
];

#[derive(Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: Option<String>,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigList {
    pub entries: Vec<ConfigEntry>,
}

impl Output for ConfigList {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.entries
            .iter()
            .map(format_entry)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn format_entry(entry: &ConfigEntry) -> String {
    format!(
        "{} = {} ({})",
        entry.key,
        entry.value.as_deref().unwrap_or("(unset)"),
        entry.source
    )
}

impl Output for ConfigEntry {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format_entry(self)
    }
}

#[derive(Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: Option<String>,
    pub path: PathBuf,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => format!("Set {} = {} in {}", self.key, value, self.path.display()),
            None => format!("Unset {} in {}", self.key, self.path.display()),
        }
    }
}

fn config_entries(config: &ResolvedConfig) -> Vec<ConfigEntry> {
    let limit = config.doing_wip_limit.as_ref();
    vec![
        ConfigEntry {
            key: "git-author-name",
            value: Some(config.git_author_name.value.clone()),
            source: config.git_author_name.source.to_string(),
        },
        ConfigEntry {
            key: "git-author-email",
            value: Some(config.git_author_email.value.clone()),
            source: config.git_author_email.source.to_string(),
        },
        ConfigEntry {
            key: "doing-wip-limit",
            value: limit.map(|l| l.value.to_string()),
            source: limit
                .map(|l| l.source.to_string())
                .unwrap_or_else(|| ValueSource::Default.to_string()),
        },
        ConfigEntry {
            key: "log-level",
            value: Some(config.log_level.value.clone()),
            source: config.log_level.source.to_string(),
        },
        ConfigEntry {
            key: "output-format",
            value: Some(config.output_format.value.to_string()),
            source: config.output_format.source.to_string(),
        },
    ]
}

pub fn config_list(config: &ResolvedConfig) -> ConfigList {
    ConfigList {
        entries: config_entries(config),
    }
}

pub fn config_get(config: &ResolvedConfig, key: &str) -> Result<ConfigEntry> {
    config_entries(config)
        .into_iter()
        .find(|e| e.key == key)
        .ok_or_else(|| unknown_key(key))
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "Unknown config key: {} (expected one of {})",
        key,
        CONFIG_KEYS.join(", ")
    ))
}

/// Apply one textual key/value to a config layer. "none" unsets the key.
fn apply_config_value(config: &mut BearingConfig, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    let set = (!is_clear(value)).then(|| value.to_string());
    match key {
        "git-author-name" => config.git_author_name = set,
        "git-author-email" => config.git_author_email = set,
        "log-level" => config.log_level = set.map(|v| v.to_lowercase()),
        "doing-wip-limit" => {
            config.doing_wip_limit = set
                .map(|v| {
                    v.parse::<u32>().map_err(|_| {
                        Error::Config(format!("doing-wip-limit must be a positive integer, got {}", v))
                    })
                })
                .transpose()?;
        }
        "output-format" => {
            config.output_format = set
                .map(|v| {
                    OutputFormat::parse(&v).ok_or_else(|| {
                        Error::Config(format!("output-format must be json or human, got {}", v))
                    })
                })
                .transpose()?;
        }
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

/// Write one key into the data-dir config, or the system config.
pub fn config_set(data_dir: &Path, key: &str, value: &str, system: bool) -> Result<ConfigSetResult> {
    let path = if system {
        system_config_path()
            .ok_or_else(|| Error::Config("Could not determine system config directory".to_string()))?
    } else {
        data_config_path(data_dir)
    };
    let mut config = read_config_file(&path)?;
    apply_config_value(&mut config, key, value)?;
    write_config_file(&path, &config)?;
    tracing::info!("set {} in {}", key, path.display());

    let value = layer_value(&config, key);
    Ok(ConfigSetResult {
        key: key.to_string(),
        value,
        path,
    })
}

fn layer_value(config: &BearingConfig, key: &str) -> Option<String> {
    match key {
        "git-author-name" => config.git_author_name.clone(),
        "git-author-email" => config.git_author_email.clone(),
        "doing-wip-limit" => config.doing_wip_limit.map(|l| l.to_string()),
        "log-level" => config.log_level.clone(),
        "output-format" => config.output_format.map(|f| f.to_string()),
        _ => None,
    }
}

// === Version ===

#[derive(Serialize)]
pub struct VersionResult {
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub git_commit: &'static str,
}

impl Output for VersionResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!(
            "bearing {} ({} built {})",
            self.version, self.git_commit, self.build_timestamp
        )
    }
}

pub fn version() -> VersionResult {
    VersionResult {
        version: env!("CARGO_PKG_VERSION"),
        build_timestamp: env!("BEARING_BUILD_TIMESTAMP"),
        git_commit: env!("BEARING_GIT_COMMIT"),
    }
}
