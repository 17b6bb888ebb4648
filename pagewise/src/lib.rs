//! Ordered collection store and paginated query engine.
//!
//! This crate owns the server side of a windowed list:
//! - a fixed, immutable item set (the canonical collection)
//! - a user-defined order override and a selection set layered on top of it
//! - a query engine that turns `(page, page_size, search)` into a window of the filtered,
//!   ordered sequence
//!
//! It is transport-agnostic. The HTTP surface lives in `pagewise-server`; the wire envelope
//! shared by server and client lives in [`wire`].
#![forbid(unsafe_code)]

mod error;
mod item;
mod order;
mod query;
mod service;
mod store;
pub mod wire;


pub use error::{Error, Result};
pub use item::{Item, ItemId};
pub use order::{OrderOverride, SelectionSet};
pub use query::{PageRequest, PageResult, matches_search, query};
pub use service::StateService;
pub use store::{CollectionStore, CurrentState, StateVersion};

/// Number of items in the reference collection.
pub const DEFAULT_COLLECTION_LEN: usize = 1_000_000;
