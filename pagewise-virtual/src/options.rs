use alloc::sync::Arc;

use crate::DEFAULT_OVERSCAN;

/// Configuration for [`crate::RowVirtualizer`].
///
/// Cheap to clone: the size estimator is shared behind an `Arc`.
pub struct RowOptions {
    /// Number of rows the list logically contains (fetched or not).
    pub count: usize,
    /// Height estimate for row `i`, used until the row is measured.
    pub estimate_size: Arc<dyn Fn(usize) -> u32 + Send + Sync>,
    pub overscan: usize,
    /// Padding before the first row.
    pub padding_start: u32,
    /// Padding after the last row.
    pub padding_end: u32,
    pub initial_offset: u64,
}

impl RowOptions {
    pub fn new(count: usize, estimate_size: impl Fn(usize) -> u32 + Send + Sync + 'static) -> Self {
        Self {
            count,
            estimate_size: Arc::new(estimate_size),
            overscan: DEFAULT_OVERSCAN,
            padding_start: 0,
            padding_end: 0,
            initial_offset: 0,
        }
    }

    /// Rows of a single fixed height.
    pub fn fixed(count: usize, row_height: u32) -> Self {
        Self::new(count, move |_| row_height)
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_padding(mut self, padding_start: u32, padding_end: u32) -> Self {
        self.padding_start = padding_start;
        self.padding_end = padding_end;
        self
    }

    pub fn with_initial_offset(mut self, initial_offset: u64) -> Self {
        self.initial_offset = initial_offset;
        self
    }
}

impl Clone for RowOptions {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            estimate_size: Arc::clone(&self.estimate_size),
            overscan: self.overscan,
            padding_start: self.padding_start,
            padding_end: self.padding_end,
            initial_offset: self.initial_offset,
        }
    }
}

impl core::fmt::Debug for RowOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RowOptions")
            .field("count", &self.count)
            .field("overscan", &self.overscan)
            .field("padding_start", &self.padding_start)
            .field("padding_end", &self.padding_end)
            .field("initial_offset", &self.initial_offset)
            .finish_non_exhaustive()
    }
}
