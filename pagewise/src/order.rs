use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{Item, ItemId};

/// A partial ranking applied on top of natural id order.
///
/// Ids listed in the override sort first, in override order. Every other id sorts after them
/// in ascending id order. When an id is listed more than once its last occurrence wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ItemId>", into = "Vec<ItemId>")]
pub struct OrderOverride {
    ids: Vec<ItemId>,
    rank: HashMap<ItemId, usize>,
}

impl OrderOverride {
    pub fn new(ids: Vec<ItemId>) -> Self {
        let mut rank = HashMap::with_capacity(ids.len());
        for (i, &id) in ids.iter().enumerate() {
            rank.insert(id, i);
        }
        Self { ids, rank }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The ids exactly as supplied (including duplicates and unknown ids).
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    pub fn rank(&self, id: ItemId) -> Option<usize> {
        self.rank.get(&id).copied()
    }

    /// The total sort key used by both the query engine and client-side re-sorts.
    ///
    /// Unranked ids share the rank `usize::MAX` and fall back to ascending id.
    pub fn sort_key(&self, id: ItemId) -> (usize, ItemId) {
        (self.rank(id).unwrap_or(usize::MAX), id)
    }

    /// Stable sort of `items` by [`Self::sort_key`]. A no-op when the override is empty.
    pub fn sort_items(&self, items: &mut [Item]) {
        if self.is_empty() {
            return;
        }
        items.sort_by_key(|item| self.sort_key(item.id));
    }
}

impl From<Vec<ItemId>> for OrderOverride {
    fn from(ids: Vec<ItemId>) -> Self {
        Self::new(ids)
    }
}

impl From<OrderOverride> for Vec<ItemId> {
    fn from(order: OrderOverride) -> Self {
        order.ids
    }
}

/// A membership-only set of selected ids.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<ItemId>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symmetric difference with `{id}`. Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: ItemId) -> bool {
        if self.0.remove(&id) {
            false
        } else {
            self.0.insert(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Ascending ids.
    pub fn iter(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ItemId> {
        self.iter().collect()
    }
}

impl FromIterator<ItemId> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = ItemId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
