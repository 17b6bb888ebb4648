use serde::{Deserialize, Serialize};

pub type ItemId = i64;

/// A single element of the canonical collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub value: i64,
}

impl Item {
    /// The canonical item for `id`, whose value mirrors its id.
    pub fn canonical(id: ItemId) -> Self {
        Self { id, value: id }
    }
}
