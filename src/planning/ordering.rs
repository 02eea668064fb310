//! Manual task ordering.
//!
//! The persisted [`TaskOrder`] maps each drop zone to an ordered list of task
//! IDs. It is advisory: IDs that no longer exist are ignored, tasks missing
//! from their zone's list sort after listed ones by creation time.

use super::PlanningManager;
use crate::Result;
use crate::models::{Task, TaskOrder, zone_rank};
use std::cmp::Ordering;
use std::collections::HashMap;

impl PlanningManager {
    /// The full persisted order map.
    pub fn get_task_order(&self) -> Result<TaskOrder> {
        self.storage.load_task_order()
    }

    /// Replace the listed zones with the given ID lists, leaving every other
    /// zone untouched. Returns the merged map.
    pub fn reorder_tasks(&self, partial: TaskOrder) -> Result<TaskOrder> {
        let mut order = self.storage.load_task_order()?;
        let zones: Vec<String> = partial.keys().cloned().collect();
        merge_order(&mut order, partial);

        let path = self.storage.write_task_order(&order)?;
        self.storage
            .commit(&[path], &format!("Reorder tasks in {}", zones.join(", ")))?;
        Ok(order)
    }

    /// Every task, sorted for display.
    pub fn get_tasks(&self) -> Result<Vec<Task>> {
        let mut tasks = self.storage.load_tasks()?;
        let order = self.storage.load_task_order()?;
        sort_tasks(&mut tasks, &order);
        Ok(tasks)
    }
}

/// Overwrite zones of `order` with those in `partial`.
pub(crate) fn merge_order(order: &mut TaskOrder, partial: TaskOrder) {
    for (zone, ids) in partial {
        order.insert(zone, ids);
    }
}

/// Append `id` to the end of `zone`, unless it is already listed there.
pub(crate) fn append_to_zone(order: &mut TaskOrder, zone: &str, id: &str) {
    let ids = order.entry(zone.to_string()).or_default();
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

/// Drop `id` from one zone.
pub(crate) fn remove_from_zone(order: &mut TaskOrder, zone: &str, id: &str) {
    if let Some(ids) = order.get_mut(zone) {
        ids.retain(|existing| existing != id);
        if ids.is_empty() {
            order.remove(zone);
        }
    }
}

/// Drop every given ID from every zone.
pub(crate) fn prune_order(order: &mut TaskOrder, ids: &[String]) {
    for list in order.values_mut() {
        list.retain(|existing| !ids.contains(existing));
    }
    order.retain(|_, list| !list.is_empty());
}

/// Sort by zone rank, then persisted position (unlisted last), then creation
/// time, then ID.
pub fn sort_tasks(tasks: &mut [Task], order: &TaskOrder) {
    let positions: HashMap<(&str, &str), usize> = order
        .iter()
        .flat_map(|(zone, ids)| {
            ids.iter()
                .enumerate()
                .map(move |(index, id)| ((zone.as_str(), id.as_str()), index))
        })
        .collect();

    let mut keyed: Vec<(u8, Option<usize>, usize)> = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        let zone = task.drop_zone();
        let position = positions.get(&(zone.as_str(), task.id.as_str())).copied();
        keyed.push((zone_rank(&zone), position, index));
    }

    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| compare_positions(a.1, b.1))
            .then_with(|| tasks[a.2].created_at.cmp(&tasks[b.2].created_at))
            .then_with(|| tasks[a.2].id.cmp(&tasks[b.2].id))
    });

    let sorted: Vec<Task> = keyed.iter().map(|k| tasks[k.2].clone()).collect();
    tasks.clone_from_slice(&sorted);
}

fn compare_positions(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
