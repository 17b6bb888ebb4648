//! Headless row virtualization for very long, lazily loaded lists.
//!
//! Given a row count, a per-row height estimate, a viewport size and a scroll offset, this
//! crate answers the questions a list renderer needs every frame:
//! - how tall is the whole scrollable area (`total_size`)
//! - which rows intersect the viewport (`visible_range`), and which rows to materialize once
//!   overscan is added (`virtual_range`)
//! - where a given row starts, and which row sits at a given offset
//!
//! The row count is usually the server-reported total, not the number of rows fetched so far,
//! so the scroll extent is correct before the lower pages arrive. Rows that are not loaded yet
//! are the adapter's business (render a placeholder).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod options;
mod rows;
mod sums;
mod types;


pub use options::RowOptions;
pub use rows::RowVirtualizer;
pub use types::{Align, RowRange, VirtualRow};

/// Rows rendered beyond each edge of the viewport unless configured otherwise.
pub const DEFAULT_OVERSCAN: usize = 5;
