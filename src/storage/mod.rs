//! Storage layer for Bearing data.
//!
//! This module handles persistence of themes, tasks, task ordering, calendar
//! years, and navigation state inside one data directory.
//!
//! ## Layout
//!
//! ```text
//! .git/                              version history
//! .gitignore                         excludes navigation and config files
//! themes.json                        {"themes": [...]}
//! calendar/<year>.json               {"year": ..., "entries": [...]}
//! tasks/<THEME>/<status>/<ID>.json   one record per task
//! task_order.json                    {"zone": ["id", ...]}
//! navigation_context.json            never committed
//! config.kdl                         never committed
//! ```
//!
//! A task's status is the directory its record lives in, so a column move is
//! a file rename.
//!
//! Reads and writes go through [`RecordStore`]; every mutation then commits
//! exactly the paths it touched through a [`Transaction`] on the
//! [`VersionedStore`].

pub mod backend;
pub mod git;
pub mod record;

pub use backend::{CommitInfo, CommitOutcome, Transaction, VersionedStore};
pub use git::{GitBackend, GitIdentity};
pub use record::RecordStore;

use crate::models::okr::Theme;
use crate::models::{CalendarYear, NavigationContext, Task, TaskOrder, TaskStatus};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const THEMES_FILE: &str = "themes.json";
pub const TASK_ORDER_FILE: &str = "task_order.json";
pub const NAVIGATION_FILE: &str = "navigation_context.json";
pub const CONFIG_FILE: &str = "config.kdl";
pub const GITIGNORE_FILE: &str = ".gitignore";
pub const TASKS_DIR: &str = "tasks";
pub const CALENDAR_DIR: &str = "calendar";

/// Commit message of the repository's first commit.
const INIT_MESSAGE: &str = "Initialize planning data";

/// On-disk shape of `themes.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ThemesFile {
    #[serde(default)]
    themes: Vec<Theme>,
}

/// Storage manager for one data directory.
pub struct Storage {
    /// Root directory for this data set
    pub root: PathBuf,
    records: RecordStore,
    versions: Box<dyn VersionedStore>,
}

impl Storage {
    /// Open existing storage. Fails with `NotInitialized` when there is no
    /// repository at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        Self::open_with_identity(root, GitIdentity::default())
    }

    pub fn open_with_identity(root: &Path, identity: GitIdentity) -> Result<Self> {
        let storage = Self::with_backend(root, Box::new(GitBackend::new(root, identity)));
        if !storage.versions.is_initialized() {
            return Err(Error::NotInitialized);
        }
        Ok(storage)
    }

    /// Initialize storage: create the directory, the repository, and the
    /// ignore file, and commit them. Safe to run on an existing data set.
    pub fn init(root: &Path) -> Result<Self> {
        Self::init_with_identity(root, GitIdentity::default())
    }

    pub fn init_with_identity(root: &Path, identity: GitIdentity) -> Result<Self> {
        fs::create_dir_all(root)?;
        let storage = Self::with_backend(root, Box::new(GitBackend::new(root, identity)));
        storage.versions.init()?;
        storage.ensure_gitignore()?;
        storage.commit(&[GITIGNORE_FILE], INIT_MESSAGE)?;
        tracing::info!("initialized data directory at {}", root.display());
        Ok(storage)
    }

    /// Build storage over an arbitrary versioned store.
    pub fn with_backend(root: &Path, versions: Box<dyn VersionedStore>) -> Self {
        Self {
            root: root.to_path_buf(),
            records: RecordStore::new(root),
            versions,
        }
    }

    /// Check whether storage exists at `root`.
    pub fn exists(root: &Path) -> bool {
        root.join(".git").exists()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Human-readable location of the version history.
    pub fn location(&self) -> String {
        self.versions.location()
    }

    fn ensure_gitignore(&self) -> Result<()> {
        let path = self.root.join(GITIGNORE_FILE);
        let existing = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let mut content = existing.clone();
        for entry in [NAVIGATION_FILE, CONFIG_FILE, "*.tmp"] {
            if !existing.lines().any(|line| line.trim() == entry) {
                if !content.is_empty() && !content.ends_with('\n') {
                    content.push('\n');
                }
                content.push_str(entry);
                content.push('\n');
            }
        }
        if content != existing {
            fs::write(&path, content)?;
        }
        Ok(())
    }

    // === Themes ===

    /// Load every theme. A missing file is an empty collection.
    pub fn load_themes(&self) -> Result<Vec<Theme>> {
        let file: Option<ThemesFile> = self.records.read(Path::new(THEMES_FILE))?;
        Ok(file.map(|f| f.themes).unwrap_or_default())
    }

    /// Rewrite the whole theme collection. Returns the path to stage.
    pub fn write_themes(&self, themes: &[Theme]) -> Result<PathBuf> {
        let path = PathBuf::from(THEMES_FILE);
        self.records.write(
            &path,
            &ThemesFile {
                themes: themes.to_vec(),
            },
        )?;
        Ok(path)
    }

    // === Tasks ===

    /// Load every task in every theme and location.
    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for theme_id in self.records.list_dirs(Path::new(TASKS_DIR))? {
            for status in TaskStatus::ALL {
                let dir = Path::new(TASKS_DIR).join(&theme_id).join(status.as_str());
                for rel in self.records.list(&dir)? {
                    if let Some(mut task) = self.records.read::<Task>(&rel)? {
                        task.status = status;
                        tasks.push(task);
                    }
                }
            }
        }
        Ok(tasks)
    }

    /// Find one task by ID across every location.
    pub fn find_task(&self, id: &str) -> Result<Task> {
        if !crate::ids::is_task_id(id) {
            return Err(Error::not_found("Task", id));
        }
        let theme_id = crate::ids::theme_of(id).ok_or_else(|| Error::not_found("Task", id))?;
        for status in TaskStatus::ALL {
            let rel = task_path(theme_id, status, id);
            if let Some(mut task) = self.records.read::<Task>(&rel)? {
                task.status = status;
                return Ok(task);
            }
        }
        Err(Error::not_found("Task", id))
    }

    /// Write a task record at the location matching its status.
    pub fn write_task(&self, task: &Task) -> Result<PathBuf> {
        let rel = task_path(&task.theme_id, task.status, &task.id);
        self.records.write(&rel, task)?;
        Ok(rel)
    }

    /// Remove a task record from its location.
    pub fn remove_task_file(&self, task: &Task) -> Result<PathBuf> {
        let rel = task_path(&task.theme_id, task.status, &task.id);
        self.records.remove(&rel)?;
        Ok(rel)
    }

    /// Move a task record between locations. Returns both paths to stage.
    pub fn move_task_file(&self, task: &Task, to: TaskStatus) -> Result<[PathBuf; 2]> {
        let from_rel = task_path(&task.theme_id, task.status, &task.id);
        let to_rel = task_path(&task.theme_id, to, &task.id);
        self.records.rename(&from_rel, &to_rel)?;
        Ok([from_rel, to_rel])
    }

    // === Task order ===

    pub fn load_task_order(&self) -> Result<TaskOrder> {
        Ok(self
            .records
            .read(Path::new(TASK_ORDER_FILE))?
            .unwrap_or_default())
    }

    pub fn write_task_order(&self, order: &TaskOrder) -> Result<PathBuf> {
        let path = PathBuf::from(TASK_ORDER_FILE);
        self.records.write(&path, order)?;
        Ok(path)
    }

    // === Calendar ===

    /// Load one calendar year. A missing file is an empty year.
    pub fn load_calendar(&self, year: i32) -> Result<CalendarYear> {
        Ok(self
            .records
            .read(&calendar_path(year))?
            .unwrap_or(CalendarYear {
                year,
                entries: Vec::new(),
            }))
    }

    pub fn write_calendar(&self, calendar: &CalendarYear) -> Result<PathBuf> {
        let path = calendar_path(calendar.year);
        self.records.write(&path, calendar)?;
        Ok(path)
    }

    // === Navigation ===

    pub fn load_navigation(&self) -> Result<NavigationContext> {
        Ok(self
            .records
            .read(Path::new(NAVIGATION_FILE))?
            .unwrap_or_default())
    }

    /// Persist navigation state. Never committed.
    pub fn save_navigation(&self, context: &NavigationContext) -> Result<()> {
        self.records.write(Path::new(NAVIGATION_FILE), context)?;
        Ok(())
    }

    // === Versioning ===

    /// Stage exactly `paths` and commit them as one transaction.
    pub fn commit<P: AsRef<Path>>(&self, paths: &[P], message: &str) -> Result<CommitOutcome> {
        let mut tx = Transaction::begin(self.versions.as_ref());
        tx.stage(paths)?;
        tx.commit(message)
    }

    /// Newest `limit` commits, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        self.versions.history(limit)
    }
}

/// Relative path of a task record.
pub fn task_path(theme_id: &str, status: TaskStatus, id: &str) -> PathBuf {
    Path::new(TASKS_DIR)
        .join(theme_id)
        .join(status.as_str())
        .join(format!("{}.json", id))
}

/// Relative path of a calendar year file.
pub fn calendar_path(year: i32) -> PathBuf {
    Path::new(CALENDAR_DIR).join(format!("{}.json", year))
}

/// Resolve the data directory: explicit path, else `<data_dir>/bearing`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    dirs::data_dir()
        .map(|dir| dir.join("bearing"))
        .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
}
