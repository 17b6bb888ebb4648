//! Headless infinite-scroll client for a `pagewise` server.
//!
//! The server holds a large collection and answers page queries. This crate keeps a sparse cache
//! of the pages a list has scrolled through and decides which page to fetch next from the rows
//! the renderer needs. Selection changes and drag-drop reorders are applied locally first and
//! pushed to the server afterwards.
//!
//! Building blocks:
//! - [`WindowFetcher`]: page-fetch state machine (stale-response and timeout handling)
//! - [`SelectionManager`]: selection with local/server reconciliation
//! - [`reorder`]: drag-drop moves and slot-fill reconciliation
//! - [`LocalStore`]: durable storage for the selection and search term
//! - [`ListController`]: wires the above to a [`pagewise_virtual::RowVirtualizer`]
//!
//! Nothing here touches UI objects; adapters drive the controller with viewport and scroll
//! events and render [`RowSlot`]s.
#![forbid(unsafe_code)]

mod api;
mod cache;
mod controller;
mod error;
mod fetcher;
mod mutation;
pub mod reorder;
mod selection;
mod storage;

#[cfg(test)]
mod tests;

pub use api::{HttpItemsApi, ItemsApi};
pub use cache::ClientCache;
pub use controller::{
    DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_PAGE_SIZE, DEFAULT_ROW_HEIGHT, ListController, ListOptions,
    RowSlot,
};
pub use error::{ClientError, Result};
pub use fetcher::{LoadFailure, LoadOutcome, PageTicket, WindowFetcher};
pub use mutation::{MutationState, PendingMutation};
pub use selection::{SelectionManager, SelectionSync, SyncDecision};
pub use storage::{
    FileStore, LocalStore, MemoryStore, SEARCH_TERM_KEY, SELECTED_ITEMS_KEY, SELECTION_SYNC_KEY,
    SavedSession,
};
