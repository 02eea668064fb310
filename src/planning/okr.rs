//! Theme, objective, and key-result operations.
//!
//! The whole theme collection is read, edited in memory through index paths,
//! re-numbered by [`assign_tree_ids`], and written back as one file per
//! mutation.

use super::{PlanningManager, require_text};
use crate::ids::{assign_tree_ids, suggest_abbreviation, validate_theme_id, validate_tree_ids};
use crate::models::okr::{
    KeyResult, Objective, OkrStatus, Theme, locate_key_result, locate_objective, locate_parent,
};
use crate::rules::RuleViolation;
use crate::{Error, Result};

/// Validate a `#RRGGBB` color.
fn validate_color(color: &str) -> Result<String> {
    let color = color.trim();
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(Error::InvalidInput(format!(
            "Color must be #RRGGBB, got: {}",
            color
        )));
    }
    Ok(color.to_string())
}

impl PlanningManager {
    /// Number every unnumbered node, heal parent IDs, write, and commit.
    fn persist_themes(&self, themes: &mut [Theme], message: &str) -> Result<()> {
        for theme in themes.iter_mut() {
            assign_tree_ids(theme);
        }
        let path = self.storage.write_themes(themes)?;
        self.storage.commit(&[path], message)?;
        Ok(())
    }

    // === Themes ===

    pub fn get_themes(&self) -> Result<Vec<Theme>> {
        self.storage.load_themes()
    }

    /// Suggest a free abbreviation for a theme name.
    pub fn suggest_theme_abbreviation(&self, name: &str) -> Result<String> {
        let existing: Vec<String> = self.storage.load_themes()?.into_iter().map(|t| t.id).collect();
        Ok(suggest_abbreviation(name, &existing))
    }

    /// Create a theme. Without an explicit ID one is derived from the name.
    pub fn create_theme(&self, name: &str, color: &str, id: Option<&str>) -> Result<Theme> {
        let name = require_text("Theme name", name)?;
        let color = validate_color(color)?;
        let mut themes = self.storage.load_themes()?;

        let id = match id {
            Some(id) => {
                validate_theme_id(id)?;
                if themes.iter().any(|t| t.id == id) {
                    return Err(Error::InvalidId(format!("Theme {} already exists", id)));
                }
                id.to_string()
            }
            None => {
                let existing: Vec<String> = themes.iter().map(|t| t.id.clone()).collect();
                let suggested = suggest_abbreviation(&name, &existing);
                if existing.contains(&suggested) {
                    return Err(Error::InvalidId(format!(
                        "No free abbreviation for {}; pass an explicit ID",
                        name
                    )));
                }
                suggested
            }
        };

        let theme = Theme::new(id, name, color);
        themes.push(theme.clone());
        self.persist_themes(&mut themes, &format!("Create theme {} ({})", theme.id, theme.name))?;
        tracing::info!("created theme {}", theme.id);
        Ok(theme)
    }

    /// Rename or recolor a theme.
    pub fn update_theme(&self, id: &str, name: Option<&str>, color: Option<&str>) -> Result<Theme> {
        let mut themes = self.storage.load_themes()?;
        let index = theme_index(&themes, id)?;

        if let Some(name) = name {
            themes[index].name = require_text("Theme name", name)?;
        }
        if let Some(color) = color {
            themes[index].color = validate_color(color)?;
        }

        self.persist_themes(&mut themes, &format!("Update theme {}", id))?;
        Ok(themes[index].clone())
    }

    /// Insert or replace a whole theme tree. New nodes are numbered and every
    /// parent reference is rewritten from the tree shape. Supplied IDs must
    /// be unique and carry this theme's prefix.
    pub fn save_theme(&self, mut theme: Theme) -> Result<Theme> {
        validate_theme_id(&theme.id)?;
        theme.name = require_text("Theme name", &theme.name)?;
        theme.color = validate_color(&theme.color)?;

        let mut themes = self.storage.load_themes()?;
        let others: Vec<Theme> = themes.iter().filter(|t| t.id != theme.id).cloned().collect();
        validate_tree_ids(&theme, &others)?;
        let index = match themes.iter().position(|t| t.id == theme.id) {
            Some(index) => {
                themes[index] = theme;
                index
            }
            None => {
                themes.push(theme);
                themes.len() - 1
            }
        };

        let message = format!("Save theme {}", themes[index].id);
        self.persist_themes(&mut themes, &message)?;
        Ok(themes[index].clone())
    }

    /// Delete a theme and its whole objective tree.
    pub fn delete_theme(&self, id: &str) -> Result<Theme> {
        let mut themes = self.storage.load_themes()?;
        let index = theme_index(&themes, id)?;
        let removed = themes.remove(index);

        self.persist_themes(&mut themes, &format!("Delete theme {} ({})", removed.id, removed.name))?;
        tracing::info!("deleted theme {}", removed.id);
        Ok(removed)
    }

    // === Objectives ===

    /// Create an objective under a theme or another objective.
    pub fn create_objective(&self, parent_id: &str, title: &str) -> Result<Objective> {
        let title = require_text("Objective title", title)?;
        let mut themes = self.storage.load_themes()?;
        let parent = locate_parent(&themes, parent_id)
            .ok_or_else(|| Error::not_found("Parent", parent_id))?;

        let theme = &mut themes[parent.theme_index];
        let siblings = theme
            .children_at_mut(&parent.path)
            .ok_or_else(|| Error::not_found("Parent", parent_id))?;
        siblings.push(Objective::new(title));
        let mut path = parent.path.clone();
        path.push(siblings.len() - 1);

        // Number first so the commit message can name the new ID.
        assign_tree_ids(theme);
        let created = theme
            .objective_at(&path)
            .cloned()
            .ok_or_else(|| Error::not_found("Objective", parent_id))?;

        self.persist_themes(
            &mut themes,
            &format!("Create objective {}: {}", created.id, created.title),
        )?;
        Ok(created)
    }

    pub fn update_objective(&self, id: &str, title: &str) -> Result<Objective> {
        let title = require_text("Objective title", title)?;
        let mut themes = self.storage.load_themes()?;
        let (theme_index, path) =
            locate_objective(&themes, id).ok_or_else(|| Error::not_found("Objective", id))?;

        let objective = objective_mut(&mut themes[theme_index], &path, id)?;
        objective.title = title;
        let updated = objective.clone();

        self.persist_themes(&mut themes, &format!("Update objective {}", id))?;
        Ok(updated)
    }

    /// Delete an objective with all of its descendants.
    pub fn delete_objective(&self, id: &str) -> Result<Objective> {
        let mut themes = self.storage.load_themes()?;
        let (theme_index, path) =
            locate_objective(&themes, id).ok_or_else(|| Error::not_found("Objective", id))?;

        let removed = themes[theme_index]
            .remove_objective(&path)
            .ok_or_else(|| Error::not_found("Objective", id))?;

        self.persist_themes(&mut themes, &format!("Delete objective {}", id))?;
        Ok(removed)
    }

    /// Re-parent an objective inside its theme.
    pub fn move_objective(&self, id: &str, new_parent_id: &str) -> Result<Objective> {
        let mut themes = self.storage.load_themes()?;
        let (theme_index, path) =
            locate_objective(&themes, id).ok_or_else(|| Error::not_found("Objective", id))?;
        let target = locate_parent(&themes, new_parent_id)
            .ok_or_else(|| Error::not_found("Parent", new_parent_id))?;

        if target.theme_index != theme_index {
            return Err(Error::RuleViolation(vec![RuleViolation {
                rule_id: "objective-same-theme".to_string(),
                message: format!(
                    "{} cannot move to {} in another theme",
                    id, new_parent_id
                ),
            }]));
        }
        if target.path.starts_with(&path) {
            return Err(Error::RuleViolation(vec![RuleViolation {
                rule_id: "no-objective-cycle".to_string(),
                message: format!("{} cannot move under itself or its descendant {}", id, new_parent_id),
            }]));
        }

        let theme = &mut themes[theme_index];
        let moved = theme
            .remove_objective(&path)
            .ok_or_else(|| Error::not_found("Objective", id))?;

        // Removal may shift sibling indices, so resolve the target again.
        let target_path = if new_parent_id == theme.id {
            Vec::new()
        } else {
            theme
                .find_objective(new_parent_id)
                .ok_or_else(|| Error::not_found("Parent", new_parent_id))?
        };
        let siblings = theme
            .children_at_mut(&target_path)
            .ok_or_else(|| Error::not_found("Parent", new_parent_id))?;
        siblings.push(moved);
        let mut new_path = target_path;
        new_path.push(siblings.len() - 1);

        assign_tree_ids(theme);
        let result = theme
            .objective_at(&new_path)
            .cloned()
            .ok_or_else(|| Error::not_found("Objective", id))?;

        self.persist_themes(&mut themes, &format!("Move objective {} under {}", id, new_parent_id))?;
        Ok(result)
    }

    /// Change an objective's lifecycle status.
    ///
    /// Completing requires every direct child objective and key result to be
    /// completed or archived; otherwise the error lists each open child.
    pub fn set_objective_status(&self, id: &str, status: OkrStatus) -> Result<Objective> {
        let mut themes = self.storage.load_themes()?;
        let (theme_index, path) =
            locate_objective(&themes, id).ok_or_else(|| Error::not_found("Objective", id))?;
        let objective = objective_mut(&mut themes[theme_index], &path, id)?;

        if !objective.status.can_transition_to(status) {
            return Err(Error::InvalidTransition {
                id: id.to_string(),
                from: objective.status.to_string(),
                to: status.to_string(),
            });
        }
        if status == OkrStatus::Completed && objective.status != OkrStatus::Completed {
            let blockers = objective.open_children();
            if !blockers.is_empty() {
                return Err(Error::CompletionBlocked {
                    id: id.to_string(),
                    blockers,
                });
            }
        }

        objective.status = status;
        let updated = objective.clone();
        self.persist_themes(&mut themes, &format!("Set objective {} {}", id, status))?;
        Ok(updated)
    }

    // === Key results ===

    /// Create a key result on an objective. `current` starts at `start`.
    pub fn create_key_result(
        &self,
        objective_id: &str,
        description: &str,
        start_value: i64,
        target_value: i64,
    ) -> Result<KeyResult> {
        let description = require_text("Key result description", description)?;
        let mut themes = self.storage.load_themes()?;
        let (theme_index, path) = locate_objective(&themes, objective_id)
            .ok_or_else(|| Error::not_found("Objective", objective_id))?;

        let theme = &mut themes[theme_index];
        let objective = objective_mut(theme, &path, objective_id)?;
        objective
            .key_results
            .push(KeyResult::new(description, start_value, target_value));
        let kr_index = objective.key_results.len() - 1;

        assign_tree_ids(theme);
        let created = theme
            .objective_at(&path)
            .and_then(|o| o.key_results.get(kr_index))
            .cloned()
            .ok_or_else(|| Error::not_found("Objective", objective_id))?;

        self.persist_themes(
            &mut themes,
            &format!("Create key result {}: {}", created.id, created.description),
        )?;
        Ok(created)
    }

    /// Edit a key result's description and values. `None` leaves a field as is.
    pub fn update_key_result(
        &self,
        id: &str,
        description: Option<&str>,
        start_value: Option<i64>,
        target_value: Option<i64>,
    ) -> Result<KeyResult> {
        let description = description
            .map(|d| require_text("Key result description", d))
            .transpose()?;

        self.edit_key_result(id, &format!("Update key result {}", id), |kr| {
            if let Some(description) = description {
                kr.description = description;
            }
            if let Some(start) = start_value {
                kr.start_value = start;
            }
            if let Some(target) = target_value {
                kr.target_value = target;
            }
            Ok(())
        })
    }

    /// Record progress. Values past the target are kept.
    pub fn update_key_result_progress(&self, id: &str, current_value: i64) -> Result<KeyResult> {
        self.edit_key_result(
            id,
            &format!("Update key result {} progress to {}", id, current_value),
            |kr| {
                kr.current_value = current_value;
                Ok(())
            },
        )
    }

    pub fn delete_key_result(&self, id: &str) -> Result<KeyResult> {
        let mut themes = self.storage.load_themes()?;
        let (theme_index, path, kr_index) =
            locate_key_result(&themes, id).ok_or_else(|| Error::not_found("Key result", id))?;

        let objective = objective_mut(&mut themes[theme_index], &path, id)?;
        let removed = objective.key_results.remove(kr_index);

        self.persist_themes(&mut themes, &format!("Delete key result {}", id))?;
        Ok(removed)
    }

    /// Change a key result's lifecycle status.
    pub fn set_key_result_status(&self, id: &str, status: OkrStatus) -> Result<KeyResult> {
        self.edit_key_result(id, &format!("Set key result {} {}", id, status), |kr| {
            if !kr.status.can_transition_to(status) {
                return Err(Error::InvalidTransition {
                    id: kr.id.clone(),
                    from: kr.status.to_string(),
                    to: status.to_string(),
                });
            }
            kr.status = status;
            Ok(())
        })
    }

    fn edit_key_result<F>(&self, id: &str, message: &str, edit: F) -> Result<KeyResult>
    where
        F: FnOnce(&mut KeyResult) -> Result<()>,
    {
        let mut themes = self.storage.load_themes()?;
        let (theme_index, path, kr_index) =
            locate_key_result(&themes, id).ok_or_else(|| Error::not_found("Key result", id))?;

        let objective = objective_mut(&mut themes[theme_index], &path, id)?;
        let key_result = &mut objective.key_results[kr_index];
        edit(key_result)?;
        let updated = key_result.clone();

        self.persist_themes(&mut themes, message)?;
        Ok(updated)
    }
}

fn theme_index(themes: &[Theme], id: &str) -> Result<usize> {
    themes
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| Error::not_found("Theme", id))
}

fn objective_mut<'a>(theme: &'a mut Theme, path: &[usize], id: &str) -> Result<&'a mut Objective> {
    theme
        .objective_at_mut(path)
        .ok_or_else(|| Error::not_found("Objective", id))
}
