use std::collections::HashSet;

use pagewise::{Item, ItemId, OrderOverride};

use crate::{ClientCache, ClientError, Result};

/// Moves the element at `source` so it ends up at `destination`.
///
/// `source` addresses `view` before the move and `destination` the moved element's index
/// afterwards. Out-of-range indices leave `view` untouched.
pub fn move_in_view<T>(view: &mut Vec<T>, source: usize, destination: usize) -> Result<()> {
    let len = view.len();
    for index in [source, destination] {
        if index >= len {
            return Err(ClientError::Reorder { index, len });
        }
    }
    let moved = view.remove(source);
    view.insert(destination, moved);
    Ok(())
}

/// Writes a reordered view back into the full sequence.
///
/// The positions held by `in_view` ids in `full` receive `new_view` in order; every other id
/// keeps its position. `new_view` is expected to be a permutation of `in_view`.
pub fn reconcile(full: &[ItemId], in_view: &[ItemId], new_view: &[ItemId]) -> Vec<ItemId> {
    let in_view: HashSet<ItemId> = in_view.iter().copied().collect();
    let mut replacement = new_view.iter().copied();
    full.iter()
        .map(|&id| {
            if in_view.contains(&id) {
                replacement.next().unwrap_or(id)
            } else {
                id
            }
        })
        .collect()
}

/// The rows a drag-drop acted on, before or after the move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSnapshot {
    /// The leading run of loaded rows, in row order.
    pub view: Vec<Item>,
    /// The full id order pushed to the server.
    pub full: Vec<ItemId>,
}

/// Slot-fills the cache: rows whose ids appear in `view` take `view`'s order.
pub(crate) fn apply_to_cache(cache: &mut ClientCache, view: &[Item]) {
    let ids: HashSet<ItemId> = view.iter().map(|item| item.id).collect();
    let mut replacement = view.iter();
    for slot in cache.items_mut() {
        if !ids.contains(&slot.id) {
            continue;
        }
        match replacement.next() {
            Some(item) => *slot = *item,
            None => break,
        }
    }
}

/// Full order to reconcile against: the saved override in effective rank order, followed by
/// the ids of `prefix` it lacks.
///
/// `prefix` must be the leading run of loaded rows; rows after a hole have no place in it.
pub(crate) fn full_order(saved: &OrderOverride, prefix: &[Item]) -> Vec<ItemId> {
    let mut full: Vec<ItemId> = saved
        .ids()
        .iter()
        .enumerate()
        .filter(|&(i, &id)| saved.rank(id) == Some(i))
        .map(|(_, &id)| id)
        .collect();
    let listed: HashSet<ItemId> = full.iter().copied().collect();
    full.extend(
        prefix
            .iter()
            .map(|item| item.id)
            .filter(|id| !listed.contains(id)),
    );
    full
}
