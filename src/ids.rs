//! Deterministic hierarchical ID allocation.
//!
//! IDs are namespaced by theme abbreviation:
//! - Theme: `H` (1-3 uppercase letters)
//! - Objective: `H-O3`
//! - Key result: `H-KR5`
//! - Task: `H-T12`
//!
//! Counters are never persisted. Each allocation scans the IDs already present
//! for that theme and continues from the highest suffix, so themes number
//! independently and a deleted ID is never handed out twice while a higher one
//! exists.

use crate::models::okr::{Objective, Theme};
use crate::{Error, Result};
use std::collections::HashSet;

/// Stand-in first letter for names without any letters.
const FALLBACK_LETTER: char = 'X';

/// Returned when every candidate is taken. Callers must still check it.
const FALLBACK_ABBREVIATION: &str = "X";

/// Suggest a unique theme abbreviation for `name`.
///
/// Candidates, in order:
/// 1. initials of the first (up to) three words, for multi-word names
/// 2. one- to three-letter prefixes of the first word
/// 3. two-letter, then three-letter combinations starting with the first letter
///
/// Names without letters are treated as `"X"`. Returns `"X"` when nothing is
/// free, so the result is not guaranteed to be unused.
pub fn suggest_abbreviation(name: &str, existing: &[String]) -> String {
    let words: Vec<Vec<char>> = name
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_ascii_alphabetic())
                .map(|c| c.to_ascii_uppercase())
                .collect::<Vec<char>>()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let fallback = [FALLBACK_LETTER];
    let first_word: &[char] = match words.first() {
        Some(word) => word.as_slice(),
        None => &fallback[..],
    };
    let is_free = |candidate: &str| !existing.iter().any(|e| e == candidate);

    if words.len() > 1 {
        let initials: String = words.iter().take(3).map(|w| w[0]).collect();
        if is_free(&initials) {
            return initials;
        }
    }

    for len in 1..=first_word.len().min(3) {
        let prefix: String = first_word[..len].iter().collect();
        if is_free(&prefix) {
            return prefix;
        }
    }

    let first = first_word[0];
    for second in 'A'..='Z' {
        let candidate: String = [first, second].iter().collect();
        if is_free(&candidate) {
            return candidate;
        }
    }
    for second in 'A'..='Z' {
        for third in 'A'..='Z' {
            let candidate: String = [first, second, third].iter().collect();
            if is_free(&candidate) {
                return candidate;
            }
        }
    }

    FALLBACK_ABBREVIATION.to_string()
}

/// Validate a theme ID: 1-3 uppercase ASCII letters.
pub fn validate_theme_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 3 || !id.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(Error::InvalidId(format!(
            "Theme ID must be 1-3 uppercase letters, got: {}",
            id
        )));
    }
    Ok(())
}

/// Theme abbreviation of a theme-scoped ID (`"H-T12"` -> `"H"`).
pub fn theme_of(id: &str) -> Option<&str> {
    id.split_once('-').map(|(abbr, _)| abbr)
}

/// Whether `id` has the shape of a task ID (`H-T12`).
pub fn is_task_id(id: &str) -> bool {
    let Some((theme, rest)) = id.split_once('-') else {
        return false;
    };
    let Some(digits) = rest.strip_prefix('T') else {
        return false;
    };
    validate_theme_id(theme).is_ok()
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
}

/// Highest numeric suffix among IDs of the form `{prefix}{n}`.
pub fn max_suffix<'a>(ids: impl IntoIterator<Item = &'a str>, prefix: &str) -> u32 {
    ids.into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|rest| rest.parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// Next free task ID for a theme, given every task ID currently on disk.
pub fn next_task_id<'a>(theme_id: &str, existing: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = format!("{}-T", theme_id);
    let next = max_suffix(existing, &prefix) + 1;
    format!("{}{}", prefix, next)
}

fn has_numbered_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Check caller-supplied objective and key-result IDs before a tree is saved.
///
/// Empty IDs are left for [`assign_tree_ids`]. Every other ID must carry this
/// theme's prefix for its kind, appear once in the tree, and not belong to
/// any theme in `others`.
pub fn validate_tree_ids(theme: &Theme, others: &[Theme]) -> Result<()> {
    let objective_prefix = format!("{}-O", theme.id);
    let key_result_prefix = format!("{}-KR", theme.id);
    let taken: HashSet<String> = others.iter().flat_map(Theme::all_ids).collect();

    let mut seen = HashSet::new();
    let mut problem = None;
    let mut check = |id: &str, prefix: &str, kind: &str| {
        if problem.is_some() || id.is_empty() {
            return;
        }
        if !has_numbered_prefix(id, prefix) {
            problem = Some(format!("{} ID {} must look like {}<n>", kind, id, prefix));
        } else if !seen.insert(id.to_string()) {
            problem = Some(format!("{} ID {} appears more than once", kind, id));
        } else if taken.contains(id) {
            problem = Some(format!("{} ID {} belongs to another theme", kind, id));
        }
    };

    theme.walk(|_, objective| {
        check(&objective.id, &objective_prefix, "Objective");
        for key_result in &objective.key_results {
            check(&key_result.id, &key_result_prefix, "Key result");
        }
    });

    match problem {
        Some(message) => Err(Error::InvalidId(message)),
        None => Ok(()),
    }
}

/// Assign IDs to unnumbered objectives and key results, and rewrite every
/// `parent_id` to match the tree shape.
///
/// Existing IDs are kept verbatim. Counters continue from the highest suffix
/// already present in this theme. Running it twice changes nothing.
pub fn assign_tree_ids(theme: &mut Theme) {
    let existing = theme.all_ids();
    let objective_prefix = format!("{}-O", theme.id);
    let key_result_prefix = format!("{}-KR", theme.id);

    let mut counters = Counters {
        objective_prefix: &objective_prefix,
        key_result_prefix: &key_result_prefix,
        next_objective: max_suffix(existing.iter().map(String::as_str), &objective_prefix),
        next_key_result: max_suffix(existing.iter().map(String::as_str), &key_result_prefix),
    };

    let theme_id = theme.id.clone();
    for objective in &mut theme.objectives {
        assign_objective(objective, &theme_id, &mut counters);
    }
}

struct Counters<'a> {
    objective_prefix: &'a str,
    key_result_prefix: &'a str,
    next_objective: u32,
    next_key_result: u32,
}

fn assign_objective(objective: &mut Objective, parent_id: &str, counters: &mut Counters<'_>) {
    objective.parent_id = parent_id.to_string();
    if objective.id.is_empty() {
        counters.next_objective += 1;
        objective.id = format!("{}{}", counters.objective_prefix, counters.next_objective);
    }

    for key_result in &mut objective.key_results {
        key_result.parent_id = objective.id.clone();
        if key_result.id.is_empty() {
            counters.next_key_result += 1;
            key_result.id = format!("{}{}", counters.key_result_prefix, counters.next_key_result);
        }
    }

    let own_id = objective.id.clone();
    for child in &mut objective.objectives {
        assign_objective(child, &own_id, counters);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::okr::KeyResult;

    fn existing(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_word_uses_first_letter() {
        assert_eq!(suggest_abbreviation("Health", &[]), "H");
    }

    #[test]
    fn test_multi_word_uses_initials() {
        assert_eq!(suggest_abbreviation("Personal Growth", &[]), "PG");
        assert_eq!(
            suggest_abbreviation("Friends and family time together", &[]),
            "FAF"
        );
    }

    #[test]
    fn test_taken_initials_fall_back_to_prefixes() {
        let taken = existing(&["PG"]);
        assert_eq!(suggest_abbreviation("Personal Growth", &taken), "P");
        let taken = existing(&["PG", "P"]);
        assert_eq!(suggest_abbreviation("Personal Growth", &taken), "PE");
    }

    #[test]
    fn test_prefixes_then_combinations() {
        let taken = existing(&["H", "HE", "HEA"]);
        assert_eq!(suggest_abbreviation("Health", &taken), "HA");

        let taken = existing(&["H"]);
        assert_eq!(suggest_abbreviation("H", &taken), "HA");
    }

    #[test]
    fn test_non_letters_are_ignored() {
        assert_eq!(suggest_abbreviation("  2026 career!  ", &[]), "C");
        assert_eq!(suggest_abbreviation("123", &[]), "X");
        assert_eq!(suggest_abbreviation("", &[]), "X");
    }

    #[test]
    fn test_letterless_names_skip_taken_candidates() {
        let taken = existing(&["X"]);
        assert_eq!(suggest_abbreviation("2027", &taken), "XA");
        let taken = existing(&["X", "XA", "XB"]);
        assert_eq!(suggest_abbreviation("!!", &taken), "XC");
    }

    #[test]
    fn test_suggestion_is_deterministic() {
        let taken = existing(&["F", "FI"]);
        let a = suggest_abbreviation("Finance", &taken);
        let b = suggest_abbreviation("Finance", &taken);
        assert_eq!(a, b);
        assert_eq!(a, "FIN");
    }

    #[test]
    fn test_validate_theme_id() {
        assert!(validate_theme_id("H").is_ok());
        assert!(validate_theme_id("ABC").is_ok());
        assert!(validate_theme_id("").is_err());
        assert!(validate_theme_id("ABCD").is_err());
        assert!(validate_theme_id("h").is_err());
        assert!(validate_theme_id("H1").is_err());
    }

    #[test]
    fn test_max_suffix_ignores_other_kinds() {
        let ids = ["H-O1", "H-O12", "H-KR40", "H-Ox", "HE-O99"];
        assert_eq!(max_suffix(ids, "H-O"), 12);
        assert_eq!(max_suffix(ids, "H-KR"), 40);
        assert_eq!(max_suffix(ids, "H-T"), 0);
    }

    #[test]
    fn test_next_task_id() {
        assert_eq!(next_task_id("H", []), "H-T1");
        assert_eq!(next_task_id("H", ["H-T3", "H-T11", "C-T40"]), "H-T12");
    }

    #[test]
    fn test_is_task_id() {
        assert!(is_task_id("H-T1"));
        assert!(is_task_id("ABC-T120"));
        assert!(!is_task_id("H-O1"));
        assert!(!is_task_id("H-T"));
        assert!(!is_task_id("../H-T1"));
        assert!(!is_task_id("H-T1/../x"));
    }

    #[test]
    fn test_theme_of() {
        assert_eq!(theme_of("H-T12"), Some("H"));
        assert_eq!(theme_of("PG-KR1"), Some("PG"));
        assert_eq!(theme_of("nothing"), None);
    }

    fn unnumbered_theme() -> Theme {
        let mut theme = Theme::new("H", "Health", "#22aa44");
        let mut marathon = Objective::new("Run a marathon");
        marathon.key_results.push(KeyResult::new("Run 10k", 0, 1));
        marathon.objectives.push(Objective::new("Build base"));
        theme.objectives.push(marathon);
        theme
    }

    #[test]
    fn test_assign_tree_ids_numbers_depth_first() {
        let mut theme = unnumbered_theme();
        assign_tree_ids(&mut theme);

        let marathon = &theme.objectives[0];
        assert_eq!(marathon.id, "H-O1");
        assert_eq!(marathon.parent_id, "H");
        assert_eq!(marathon.key_results[0].id, "H-KR1");
        assert_eq!(marathon.key_results[0].parent_id, "H-O1");
        assert_eq!(marathon.objectives[0].id, "H-O2");
        assert_eq!(marathon.objectives[0].parent_id, "H-O1");
    }

    #[test]
    fn test_assign_tree_ids_is_idempotent() {
        let mut theme = unnumbered_theme();
        assign_tree_ids(&mut theme);
        let snapshot = theme.clone();
        assign_tree_ids(&mut theme);
        assert_eq!(theme, snapshot);
    }

    #[test]
    fn test_assign_tree_ids_continues_from_existing_max() {
        let mut theme = unnumbered_theme();
        theme.objectives[0].id = "H-O7".to_string();
        theme.objectives[0].objectives[0].key_results.push(KeyResult::new("Weekly long run", 0, 12));
        assign_tree_ids(&mut theme);

        assert_eq!(theme.objectives[0].id, "H-O7");
        assert_eq!(theme.objectives[0].objectives[0].id, "H-O8");
        assert_eq!(theme.objectives[0].key_results[0].id, "H-KR1");
        assert_eq!(theme.objectives[0].objectives[0].key_results[0].id, "H-KR2");
    }

    #[test]
    fn test_validate_tree_ids() {
        let mut theme = unnumbered_theme();
        assign_tree_ids(&mut theme);
        assert!(validate_tree_ids(&theme, &[]).is_ok());

        let mut duplicate = theme.clone();
        duplicate.objectives[0].objectives[0].id = "H-O1".to_string();
        assert!(matches!(
            validate_tree_ids(&duplicate, &[]),
            Err(Error::InvalidId(msg)) if msg.contains("more than once")
        ));

        let mut foreign = theme.clone();
        foreign.objectives[0].id = "C-O1".to_string();
        assert!(validate_tree_ids(&foreign, &[]).is_err());

        let mut wrong_kind = theme.clone();
        wrong_kind.objectives[0].key_results[0].id = "H-O9".to_string();
        assert!(validate_tree_ids(&wrong_kind, &[]).is_err());

        // An unnumbered node is fine; it gets an ID on save.
        theme.objectives.push(Objective::new("Swim"));
        assert!(validate_tree_ids(&theme, &[]).is_ok());
    }

    #[test]
    fn test_validate_tree_ids_rejects_ids_of_other_themes() {
        let mut theme = unnumbered_theme();
        assign_tree_ids(&mut theme);
        // Stored data from another theme that already holds an H-prefixed ID.
        let mut other = Theme::new("C", "Career", "#123456");
        let mut stray = Objective::new("Stray");
        stray.id = "H-O2".to_string();
        other.objectives.push(stray);

        assert!(matches!(
            validate_tree_ids(&theme, &[other]),
            Err(Error::InvalidId(msg)) if msg.contains("another theme")
        ));
    }

    #[test]
    fn test_assign_tree_ids_heals_parent_ids() {
        let mut theme = unnumbered_theme();
        assign_tree_ids(&mut theme);
        theme.objectives[0].objectives[0].parent_id = "WRONG".to_string();
        theme.objectives[0].key_results[0].parent_id = String::new();
        assign_tree_ids(&mut theme);
        assert_eq!(theme.objectives[0].objectives[0].parent_id, "H-O1");
        assert_eq!(theme.objectives[0].key_results[0].parent_id, "H-O1");
    }
}
