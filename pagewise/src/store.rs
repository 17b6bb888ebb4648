use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{Item, ItemId, OrderOverride, SelectionSet};

/// A monotonically increasing stamp bumped on every overlay write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateVersion(pub u64);

impl StateVersion {
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for StateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A snapshot of the mutable overlay: order override and selection set, with their versions.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentState {
    pub order: Vec<ItemId>,
    pub selected: Vec<ItemId>,
    #[serde(default)]
    pub order_version: StateVersion,
    #[serde(default)]
    pub selection_version: StateVersion,
}

/// The canonical item set plus the overlay state layered on top of it.
///
/// The item set is fixed at construction. The overlay is plain data: the store performs no
/// locking of its own, callers that share it wrap it (see [`crate::StateService`]).
#[derive(Clone, Debug)]
pub struct CollectionStore {
    items: Vec<Item>,
    order: OrderOverride,
    order_version: StateVersion,
    selection: SelectionSet,
    selection_version: StateVersion,
}

impl CollectionStore {
    /// Builds the canonical collection `1..=len` where every item's value equals its id.
    pub fn with_len(len: usize) -> Self {
        let items = (1..=len as ItemId).map(Item::canonical).collect();
        Self::from_sorted(items)
    }

    /// Builds a store over an arbitrary item set. Items are kept in ascending id order.
    pub fn from_items(mut items: Vec<Item>) -> Self {
        items.sort_by_key(|item| item.id);
        Self::from_sorted(items)
    }

    fn from_sorted(items: Vec<Item>) -> Self {
        tracing::debug!(target: "pagewise", len = items.len(), "CollectionStore created");
        Self {
            items,
            order: OrderOverride::default(),
            order_version: StateVersion::default(),
            selection: SelectionSet::default(),
            selection_version: StateVersion::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items in natural (ascending id) order.
    pub fn all(&self) -> &[Item] {
        &self.items
    }

    pub fn order(&self) -> &OrderOverride {
        &self.order
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn order_version(&self) -> StateVersion {
        self.order_version
    }

    pub fn selection_version(&self) -> StateVersion {
        self.selection_version
    }

    /// Replaces the order override wholesale.
    pub fn apply_order(&mut self, ids: Vec<ItemId>) -> StateVersion {
        self.order = OrderOverride::new(ids);
        self.order_version = self.order_version.next();
        tracing::debug!(
            target: "pagewise",
            len = self.order.len(),
            version = self.order_version.0,
            "order override applied"
        );
        self.order_version
    }

    /// Replaces the selection set wholesale.
    pub fn apply_selection(&mut self, ids: impl IntoIterator<Item = ItemId>) -> StateVersion {
        self.selection = ids.into_iter().collect();
        self.selection_version = self.selection_version.next();
        tracing::debug!(
            target: "pagewise",
            len = self.selection.len(),
            version = self.selection_version.0,
            "selection applied"
        );
        self.selection_version
    }

    pub fn current_state(&self) -> CurrentState {
        CurrentState {
            order: self.order.ids().to_vec(),
            selected: self.selection.to_vec(),
            order_version: self.order_version,
            selection_version: self.selection_version,
        }
    }
}
