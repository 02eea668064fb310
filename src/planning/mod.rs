//! Planning manager: the operations front ends call.
//!
//! Every operation re-reads the files it needs, validates, writes the changed
//! records, and commits exactly those paths with a descriptive message. There
//! is no cache between calls.
//!
//! - [`okr`] - themes, objectives, key results, and their lifecycle
//! - [`tasks`] - task CRUD, board moves, archive/restore, promotions
//! - [`ordering`] - manual ordering overlay and the `get_tasks` sort

pub mod okr;
pub mod ordering;
pub mod tasks;

pub use tasks::{MoveOutcome, NewTask, TaskUpdate};

use crate::models::board::{BoardConfiguration, board_configuration};
use crate::models::{CalendarYear, DayFocus, NavigationContext};
use crate::rules::RuleEngine;
use crate::storage::{CommitInfo, Storage};
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, Utc};

/// Entry point for all planning operations on one data directory.
pub struct PlanningManager {
    storage: Storage,
    rules: RuleEngine,
}

impl PlanningManager {
    /// Manager with the default rule set.
    pub fn new(storage: Storage) -> Self {
        Self::with_rules(storage, RuleEngine::default())
    }

    pub fn with_rules(storage: Storage, rules: RuleEngine) -> Self {
        Self { storage, rules }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    // === Board ===

    /// Static board layout.
    pub fn board_configuration(&self) -> BoardConfiguration {
        board_configuration()
    }

    // === Calendar ===

    /// Every focus entry of one year, sorted by date.
    pub fn get_year_focus(&self, year: i32) -> Result<CalendarYear> {
        self.storage.load_calendar(year)
    }

    /// Insert or replace the entry for `day.date`.
    pub fn save_day_focus(&self, day: DayFocus) -> Result<DayFocus> {
        if let Some(theme_id) = &day.theme_id {
            if !self.storage.load_themes()?.iter().any(|t| &t.id == theme_id) {
                return Err(Error::not_found("Theme", theme_id.clone()));
            }
        }

        let mut calendar = self.storage.load_calendar(day.date.year())?;
        calendar.entries.retain(|e| e.date != day.date);
        calendar.entries.push(day.clone());
        calendar.entries.sort_by_key(|e| e.date);

        let path = self.storage.write_calendar(&calendar)?;
        self.storage
            .commit(&[path], &format!("Set focus for {}", day.date))?;
        Ok(day)
    }

    /// Remove the entry for `date`. Returns `false` if there was none.
    pub fn clear_day_focus(&self, date: NaiveDate) -> Result<bool> {
        let mut calendar = self.storage.load_calendar(date.year())?;
        let before = calendar.entries.len();
        calendar.entries.retain(|e| e.date != date);
        if calendar.entries.len() == before {
            return Ok(false);
        }

        let path = self.storage.write_calendar(&calendar)?;
        self.storage
            .commit(&[path], &format!("Clear focus for {}", date))?;
        Ok(true)
    }

    // === Navigation ===

    pub fn load_navigation_context(&self) -> Result<NavigationContext> {
        self.storage.load_navigation()
    }

    /// Persist navigation state, stamping `last_accessed`. Not versioned.
    pub fn save_navigation_context(&self, mut context: NavigationContext) -> Result<NavigationContext> {
        context.last_accessed = Some(Utc::now());
        self.storage.save_navigation(&context)?;
        Ok(context)
    }

    // === History ===

    /// Newest `limit` commits in the data directory.
    pub fn history(&self, limit: usize) -> Result<Vec<CommitInfo>> {
        self.storage.history(limit)
    }
}

/// Reject empty or whitespace-only text arguments.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    fn day(date: &str, text: &str) -> DayFocus {
        DayFocus {
            date: crate::models::parse_date(date).unwrap(),
            theme_id: None,
            notes: String::new(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_day_focus_upsert_and_clear() {
        let env = TestEnv::new();
        let manager = env.init_manager();

        manager.save_day_focus(day("2026-03-02", "Long run")).unwrap();
        manager.save_day_focus(day("2026-03-01", "Rest")).unwrap();
        manager.save_day_focus(day("2026-03-02", "Tempo run")).unwrap();

        let year = manager.get_year_focus(2026).unwrap();
        assert_eq!(year.entries.len(), 2);
        assert_eq!(year.entries[0].text, "Rest");
        assert_eq!(year.entries[1].text, "Tempo run");
        assert!(env.path().join("calendar/2026.json").exists());

        assert!(manager
            .clear_day_focus(crate::models::parse_date("2026-03-01").unwrap())
            .unwrap());
        assert!(!manager
            .clear_day_focus(crate::models::parse_date("2026-03-01").unwrap())
            .unwrap());
        assert_eq!(manager.get_year_focus(2026).unwrap().entries.len(), 1);
    }

    #[test]
    fn test_day_focus_rejects_unknown_theme() {
        let env = TestEnv::new();
        let manager = env.init_manager();
        let mut entry = day("2026-03-02", "Long run");
        entry.theme_id = Some("Z".to_string());
        assert!(matches!(
            manager.save_day_focus(entry),
            Err(Error::NotFound { kind: "Theme", .. })
        ));
    }

    #[test]
    fn test_navigation_context_is_stamped_and_unversioned() {
        let env = TestEnv::new();
        let manager = env.init_manager();
        let commits_before = manager.history(50).unwrap().len();

        let saved = manager
            .save_navigation_context(NavigationContext {
                current_view: "calendar".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(saved.last_accessed.is_some());
        assert_eq!(manager.load_navigation_context().unwrap(), saved);
        assert_eq!(manager.history(50).unwrap().len(), commits_before);
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("Title", "  Run  ").unwrap(), "Run");
        assert!(matches!(
            require_text("Title", "   "),
            Err(Error::InvalidInput(_))
        ));
    }
}
