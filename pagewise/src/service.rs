use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    CollectionStore, CurrentState, Error, ItemId, PageRequest, PageResult, Result, StateVersion,
};

/// A cloneable handle over a shared [`CollectionStore`].
///
/// Reads take a shared lock; overlay writes take an exclusive lock and bump the corresponding
/// version. Writes are last-writer-wins unless the caller passes the version it last observed,
/// in which case a stale write is rejected with [`Error::Conflict`].
#[derive(Clone, Debug)]
pub struct StateService {
    store: Arc<RwLock<CollectionStore>>,
    max_page_size: Option<usize>,
}

impl StateService {
    pub fn new(store: CollectionStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            max_page_size: None,
        }
    }

    /// Rejects page requests larger than `max_page_size`.
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = Some(max_page_size);
        self
    }

    pub fn max_page_size(&self) -> Option<usize> {
        self.max_page_size
    }

    pub fn collection_len(&self) -> usize {
        self.store.read().len()
    }

    pub fn query(&self, request: &PageRequest) -> Result<PageResult> {
        if let Some(max) = self.max_page_size {
            if request.page_size > max {
                return Err(Error::validation(
                    "pageSize",
                    format!("must be at most {max}"),
                ));
            }
        }
        crate::query(&self.store.read(), request)
    }

    pub fn state(&self) -> CurrentState {
        self.store.read().current_state()
    }

    /// Replaces the order override. Unknown ids are accepted and simply never match an item.
    pub fn set_order(
        &self,
        ids: Vec<ItemId>,
        expected: Option<StateVersion>,
    ) -> Result<StateVersion> {
        let mut store = self.store.write();
        check_version(expected, store.order_version())?;
        Ok(store.apply_order(ids))
    }

    /// Replaces the selection set.
    pub fn set_selected(
        &self,
        ids: Vec<ItemId>,
        expected: Option<StateVersion>,
    ) -> Result<StateVersion> {
        let mut store = self.store.write();
        check_version(expected, store.selection_version())?;
        Ok(store.apply_selection(ids))
    }
}

fn check_version(expected: Option<StateVersion>, actual: StateVersion) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => {
            tracing::warn!(
                target: "pagewise",
                %expected,
                %actual,
                "rejecting overlay write with stale version"
            );
            Err(Error::Conflict { expected, actual })
        }
        _ => Ok(()),
    }
}
