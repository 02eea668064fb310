//! OKR tree model: themes, objectives, and key results.
//!
//! Themes are stored as nested trees. Lookups return index paths into the
//! nested vectors (`TreePath`), so find-by-id and find-parent are plain index
//! walks and every mutation is "locate, then edit through the path".

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index path from a theme's top-level objectives down to one objective.
///
/// `[2, 0]` is `theme.objectives[2].objectives[0]`. The empty path denotes
/// the theme itself.
pub type TreePath = Vec<usize>;

/// Lifecycle status shared by objectives and key results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OkrStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

impl OkrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OkrStatus::Active => "active",
            OkrStatus::Completed => "completed",
            OkrStatus::Archived => "archived",
        }
    }

    /// Partial order: active -> completed -> archived, anything -> active.
    /// Re-applying the current status is a no-op and allowed.
    pub fn can_transition_to(&self, to: OkrStatus) -> bool {
        if *self == to || to == OkrStatus::Active {
            return true;
        }
        matches!(
            (self, to),
            (OkrStatus::Active, OkrStatus::Completed) | (OkrStatus::Completed, OkrStatus::Archived)
        )
    }

    /// Completed or archived items no longer block a parent's completion.
    pub fn is_closed(&self) -> bool {
        matches!(self, OkrStatus::Completed | OkrStatus::Archived)
    }
}

impl fmt::Display for OkrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OkrStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(OkrStatus::Active),
            "completed" | "complete" => Ok(OkrStatus::Completed),
            "archived" => Ok(OkrStatus::Archived),
            other => Err(Error::InvalidInput(format!(
                "Invalid OKR status: {} (expected active|completed|archived)",
                other
            ))),
        }
    }
}

/// Top-level life area. Its ID namespaces every descendant ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// 1-3 uppercase letters (e.g., "H")
    pub id: String,
    pub name: String,
    /// `#RRGGBB`
    pub color: String,
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

/// Nestable goal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    #[serde(default)]
    pub id: String,
    /// Theme ID or objective ID; rewritten from the tree shape on every save.
    #[serde(default)]
    pub parent_id: String,
    pub title: String,
    #[serde(default)]
    pub status: OkrStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<Objective>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_results: Vec<KeyResult>,
}

/// Measurable outcome on an objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyResult {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub parent_id: String,
    pub description: String,
    #[serde(default)]
    pub status: OkrStatus,
    #[serde(default)]
    pub start_value: i64,
    #[serde(default)]
    pub current_value: i64,
    #[serde(default)]
    pub target_value: i64,
}

/// Shape of a key result, derived from its start and target values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyResultKind {
    /// target 0: no measurement
    Untracked,
    /// start 0, target 1: rendered as a checkbox
    Binary,
    /// anything else: progress between start and target
    Numeric,
}

/// One open direct child preventing an objective from completing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionBlocker {
    pub id: String,
    /// Title for objectives, description for key results.
    pub label: String,
    pub status: OkrStatus,
}

impl Theme {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            objectives: Vec::new(),
        }
    }

    /// Objective at `path`, or `None` for an empty or dangling path.
    pub fn objective_at(&self, path: &[usize]) -> Option<&Objective> {
        let (first, rest) = path.split_first()?;
        let mut node = self.objectives.get(*first)?;
        for index in rest {
            node = node.objectives.get(*index)?;
        }
        Some(node)
    }

    pub fn objective_at_mut(&mut self, path: &[usize]) -> Option<&mut Objective> {
        let (first, rest) = path.split_first()?;
        let mut node = self.objectives.get_mut(*first)?;
        for index in rest {
            node = node.objectives.get_mut(*index)?;
        }
        Some(node)
    }

    /// Child objective list under `path`; the empty path is the theme root.
    pub fn children_at_mut(&mut self, path: &[usize]) -> Option<&mut Vec<Objective>> {
        if path.is_empty() {
            return Some(&mut self.objectives);
        }
        self.objective_at_mut(path).map(|o| &mut o.objectives)
    }

    /// Depth-first search for an objective by ID.
    pub fn find_objective(&self, id: &str) -> Option<TreePath> {
        fn search(nodes: &[Objective], id: &str, path: &mut TreePath) -> bool {
            for (index, node) in nodes.iter().enumerate() {
                path.push(index);
                if node.id == id || search(&node.objectives, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        search(&self.objectives, id, &mut path).then_some(path)
    }

    /// Locate a key result: owning objective path plus index in its list.
    pub fn find_key_result(&self, id: &str) -> Option<(TreePath, usize)> {
        let mut found = None;
        self.walk(|path, objective| {
            if found.is_none() {
                if let Some(index) = objective.key_results.iter().position(|kr| kr.id == id) {
                    found = Some((path.to_vec(), index));
                }
            }
        });
        found
    }

    /// Detach the objective at `path` (with its whole subtree).
    pub fn remove_objective(&mut self, path: &[usize]) -> Option<Objective> {
        let (last, parent) = path.split_last()?;
        let siblings = self.children_at_mut(parent)?;
        (*last < siblings.len()).then(|| siblings.remove(*last))
    }

    /// Visit every objective depth-first, parents before children.
    pub fn walk<F: FnMut(&[usize], &Objective)>(&self, mut visit: F) {
        fn go<F: FnMut(&[usize], &Objective)>(
            nodes: &[Objective],
            path: &mut TreePath,
            visit: &mut F,
        ) {
            for (index, node) in nodes.iter().enumerate() {
                path.push(index);
                visit(path.as_slice(), node);
                go(&node.objectives, path, visit);
                path.pop();
            }
        }

        let mut path = Vec::new();
        go(&self.objectives, &mut path, &mut visit);
    }

    /// Every objective and key result ID in this theme.
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.walk(|_, objective| {
            ids.push(objective.id.clone());
            ids.extend(objective.key_results.iter().map(|kr| kr.id.clone()));
        });
        ids
    }
}

impl Objective {
    /// Create an objective without an ID; the allocator assigns one on save.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            parent_id: String::new(),
            title: title.into(),
            status: OkrStatus::Active,
            objectives: Vec::new(),
            key_results: Vec::new(),
        }
    }

    /// Direct children that are neither completed nor archived.
    pub fn open_children(&self) -> Vec<CompletionBlocker> {
        let objectives = self
            .objectives
            .iter()
            .filter(|o| !o.status.is_closed())
            .map(|o| CompletionBlocker {
                id: o.id.clone(),
                label: o.title.clone(),
                status: o.status,
            });
        let key_results = self
            .key_results
            .iter()
            .filter(|kr| !kr.status.is_closed())
            .map(|kr| CompletionBlocker {
                id: kr.id.clone(),
                label: kr.description.clone(),
                status: kr.status,
            });
        objectives.chain(key_results).collect()
    }

    /// Whether any descendant objective has the given ID.
    pub fn contains_objective(&self, id: &str) -> bool {
        self.objectives
            .iter()
            .any(|child| child.id == id || child.contains_objective(id))
    }
}

impl KeyResult {
    /// Create a key result without an ID; the allocator assigns one on save.
    pub fn new(description: impl Into<String>, start_value: i64, target_value: i64) -> Self {
        Self {
            id: String::new(),
            parent_id: String::new(),
            description: description.into(),
            status: OkrStatus::Active,
            start_value,
            current_value: start_value,
            target_value,
        }
    }

    pub fn kind(&self) -> KeyResultKind {
        if self.target_value == 0 {
            KeyResultKind::Untracked
        } else if self.start_value == 0 && self.target_value == 1 {
            KeyResultKind::Binary
        } else {
            KeyResultKind::Numeric
        }
    }

    /// Fraction achieved. May exceed 1.0 for over-achievement.
    pub fn progress(&self) -> Option<f64> {
        match self.kind() {
            KeyResultKind::Untracked => None,
            KeyResultKind::Binary => Some(if self.current_value >= 1 { 1.0 } else { 0.0 }),
            KeyResultKind::Numeric => {
                // Widened so extreme values cannot overflow.
                let span = i128::from(self.target_value) - i128::from(self.start_value);
                if span == 0 {
                    return None;
                }
                let done = i128::from(self.current_value) - i128::from(self.start_value);
                Some(done as f64 / span as f64)
            }
        }
    }
}

/// Where a new child attaches: a theme root or an objective inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLocation {
    pub theme_index: usize,
    /// Empty when the parent is the theme itself.
    pub path: TreePath,
}

/// Resolve a parent ID: first as a theme ID, then as an objective ID.
pub fn locate_parent(themes: &[Theme], parent_id: &str) -> Option<ParentLocation> {
    if let Some(theme_index) = themes.iter().position(|t| t.id == parent_id) {
        return Some(ParentLocation {
            theme_index,
            path: Vec::new(),
        });
    }
    locate_objective(themes, parent_id).map(|(theme_index, path)| ParentLocation {
        theme_index,
        path,
    })
}

/// Find an objective anywhere in the collection.
pub fn locate_objective(themes: &[Theme], id: &str) -> Option<(usize, TreePath)> {
    themes
        .iter()
        .enumerate()
        .find_map(|(index, theme)| theme.find_objective(id).map(|path| (index, path)))
}

/// Find a key result anywhere in the collection.
pub fn locate_key_result(themes: &[Theme], id: &str) -> Option<(usize, TreePath, usize)> {
    themes.iter().enumerate().find_map(|(index, theme)| {
        theme
            .find_key_result(id)
            .map(|(path, kr_index)| (index, path, kr_index))
    })
}
