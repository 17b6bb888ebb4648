use pagewise::{CurrentState, ItemId, SelectionSet, StateVersion};
use serde::{Deserialize, Serialize};

use crate::{ClientError, PendingMutation};

/// How the locally saved selection relates to the server's copy.
///
/// The local copy is a cache of the server selection: `version` is the server selection version
/// it last agreed with and `dirty` is set while a local change has not been confirmed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSync {
    #[serde(default)]
    pub version: Option<StateVersion>,
    #[serde(default)]
    pub dirty: bool,
}

/// Outcome of comparing the local selection with the server's at session start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncDecision {
    /// Both copies already agree.
    InSync,
    /// The server copy replaced the local one.
    AdoptedServer,
    /// Unconfirmed local changes win; they must be pushed.
    PushLocal,
}

/// Selection state with optimistic server sync.
#[derive(Clone, Debug, Default)]
pub struct SelectionManager {
    selected: SelectionSet,
    /// Last selection the server confirmed.
    synced: SelectionSet,
    sync: SelectionSync,
    pending: Option<PendingMutation<SelectionSet>>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a selection restored from local storage.
    pub fn restore(selected: SelectionSet, sync: SelectionSync) -> Self {
        let synced = if sync.dirty {
            SelectionSet::new()
        } else {
            selected.clone()
        };
        Self {
            selected,
            synced,
            sync,
            pending: None,
        }
    }

    pub fn selected(&self) -> &SelectionSet {
        &self.selected
    }

    pub fn is_selected(&self, id: ItemId) -> bool {
        self.selected.contains(id)
    }

    pub fn sync(&self) -> SelectionSync {
        self.sync
    }

    pub fn pending(&self) -> Option<&PendingMutation<SelectionSet>> {
        self.pending.as_ref()
    }

    /// Flips membership of `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: ItemId) -> bool {
        self.update(|s| {
            s.toggle(id);
        });
        self.selected.contains(id)
    }

    /// Replaces the selection with `ids`, the rows passing the active search.
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = ItemId>) {
        let ids: SelectionSet = ids.into_iter().collect();
        self.update(|s| *s = ids);
    }

    pub fn clear(&mut self) {
        self.update(SelectionSet::clear);
    }

    fn update(&mut self, f: impl FnOnce(&mut SelectionSet)) {
        f(&mut self.selected);
        self.sync.dirty = self.selected != self.synced;
        self.pending = Some(PendingMutation::new(
            self.synced.clone(),
            self.selected.clone(),
        ));
    }

    /// Decides which copy wins when the server state arrives at session start.
    ///
    /// Unconfirmed local changes win and are queued as a pending push; otherwise the server copy
    /// replaces the local one.
    pub fn reconcile(&mut self, server: &CurrentState) -> SyncDecision {
        let server_selected: SelectionSet = server.selected.iter().copied().collect();
        if self.sync.dirty && self.selected != server_selected {
            tracing::info!(
                target: "pagewise_client",
                local = self.selected.len(),
                server = server_selected.len(),
                "keeping unconfirmed local selection"
            );
            self.synced = server_selected;
            self.sync.version = Some(server.selection_version);
            self.pending = Some(PendingMutation::new(
                self.synced.clone(),
                self.selected.clone(),
            ));
            return SyncDecision::PushLocal;
        }

        let decision = if self.selected == server_selected {
            SyncDecision::InSync
        } else {
            tracing::debug!(target: "pagewise_client", "adopting server selection");
            SyncDecision::AdoptedServer
        };
        self.selected = server_selected.clone();
        self.synced = server_selected;
        self.sync = SelectionSync {
            version: Some(server.selection_version),
            dirty: false,
        };
        self.pending = None;
        decision
    }

    /// Records that the server accepted the pending selection.
    pub fn confirm(&mut self, version: StateVersion) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.confirm();
        self.synced = pending.next().clone();
        self.sync.version = Some(version);
        self.sync.dirty = self.selected != self.synced;
    }

    pub fn fail(&mut self, error: ClientError) {
        if let Some(pending) = self.pending.as_mut() {
            pending.fail(error);
        }
    }

    /// Puts a failed push back in flight; returns the set to push again.
    pub fn retry(&mut self) -> Result<SelectionSet, ClientError> {
        self.pending
            .as_mut()
            .ok_or(ClientError::NothingPending)?
            .retry()
            .cloned()
    }

    /// Drops a failed push and returns to the last confirmed selection.
    pub fn revert(&mut self) -> Result<(), ClientError> {
        let pending = self.pending.take().ok_or(ClientError::NothingPending)?;
        match pending.revert() {
            Ok(previous) => {
                self.selected = previous;
                self.sync.dirty = self.selected != self.synced;
                Ok(())
            }
            Err(pending) => {
                self.pending = Some(pending);
                Err(ClientError::NothingPending)
            }
        }
    }
}
