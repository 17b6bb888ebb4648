use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp;

use crate::sums::RowSums;
use crate::{Align, RowOptions, RowRange, VirtualRow};

/// A headless row virtualizer.
///
/// It holds no UI objects. The adapter reports the viewport size and scroll offset; the
/// virtualizer answers which rows to materialize and where they go.
#[derive(Clone, Debug)]
pub struct RowVirtualizer {
    options: RowOptions,
    viewport_size: u32,
    scroll_offset: u64,
    sizes: Vec<u32>,
    sums: RowSums,
}

impl RowVirtualizer {
    pub fn new(options: RowOptions) -> Self {
        vdebug!(
            count = options.count,
            overscan = options.overscan,
            "RowVirtualizer::new"
        );
        let sizes: Vec<u32> = (0..options.count).map(|i| (options.estimate_size)(i)).collect();
        let sums = RowSums::from_heights(&sizes);
        Self {
            viewport_size: 0,
            scroll_offset: options.initial_offset,
            sizes,
            sums,
            options,
        }
    }

    pub fn options(&self) -> &RowOptions {
        &self.options
    }

    pub fn count(&self) -> usize {
        self.options.count
    }

    /// Grows or shrinks the row count, keeping the sizes of surviving rows.
    ///
    /// Small changes (such as a trailing placeholder row appearing and disappearing) cost
    /// `O(log n)` per row.
    pub fn set_count(&mut self, count: usize) {
        let cur = self.sizes.len();
        if count == cur {
            return;
        }
        vtrace!(from = cur, to = count, "set_count");
        self.options.count = count;
        if count < cur {
            self.sizes.truncate(count);
            self.sums.truncate(count);
            return;
        }

        let grow = count - cur;
        self.sizes.reserve_exact(grow);
        if grow > cur {
            self.sizes
                .extend((cur..count).map(|i| (self.options.estimate_size)(i)));
            self.sums = RowSums::from_heights(&self.sizes);
        } else {
            for i in cur..count {
                let size = (self.options.estimate_size)(i);
                self.sizes.push(size);
                self.sums.push(size);
            }
        }
    }

    /// Replaces the size estimator and discards all measurements.
    pub fn set_estimate_size(&mut self, f: impl Fn(usize) -> u32 + Send + Sync + 'static) {
        self.options.estimate_size = Arc::new(f);
        self.sizes.clear();
        self.sizes
            .extend((0..self.options.count).map(|i| (self.options.estimate_size)(i)));
        self.sums = RowSums::from_heights(&self.sizes);
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.options.overscan = overscan;
    }

    /// Records the real size of a rendered row.
    pub fn measure(&mut self, index: usize, size: u32) {
        let Some(cur) = self.sizes.get(index).copied() else {
            return;
        };
        if cur == size {
            return;
        }
        self.sizes[index] = size;
        self.sums.adjust(index, size as i64 - cur as i64);
    }

    pub fn viewport_size(&self) -> u32 {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, size: u32) {
        self.viewport_size = size;
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        self.scroll_offset = offset;
    }

    pub fn set_scroll_offset_clamped(&mut self, offset: u64) {
        self.scroll_offset = self.clamp_scroll_offset(offset);
    }

    pub fn set_viewport_and_scroll(&mut self, viewport_size: u32, scroll_offset: u64) {
        self.viewport_size = viewport_size;
        self.scroll_offset = scroll_offset;
    }

    /// Height of the whole scrollable area.
    pub fn total_size(&self) -> u64 {
        (self.options.padding_start as u64)
            .saturating_add(self.sums.total())
            .saturating_add(self.options.padding_end as u64)
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.total_size()
            .saturating_sub(self.viewport_size as u64)
    }

    pub fn clamp_scroll_offset(&self, offset: u64) -> u64 {
        offset.min(self.max_scroll_offset())
    }

    /// Rows intersecting the viewport, without overscan.
    pub fn visible_range(&self) -> RowRange {
        self.visible_range_for(self.scroll_offset, self.viewport_size)
    }

    /// Rows to materialize: the visible range widened by `overscan` on each side.
    pub fn virtual_range(&self) -> RowRange {
        self.virtual_range_for(self.scroll_offset, self.viewport_size)
    }

    pub fn virtual_range_for(&self, scroll_offset: u64, viewport_size: u32) -> RowRange {
        let visible = self.visible_range_for(scroll_offset, viewport_size);
        if visible.is_empty() {
            return visible;
        }
        let overscan = self.options.overscan;
        RowRange {
            start_index: visible.start_index.saturating_sub(overscan),
            end_index: cmp::min(
                self.options.count,
                visible.end_index.saturating_add(overscan),
            ),
        }
    }

    pub fn visible_range_for(&self, scroll_offset: u64, viewport_size: u32) -> RowRange {
        let count = self.options.count;
        if count == 0 || viewport_size == 0 {
            return RowRange::EMPTY;
        }

        let view = viewport_size as u64;
        let total = self.total_size();
        let start = scroll_offset.min(total.saturating_sub(view));
        let end_inclusive = start.saturating_add(view).saturating_sub(1);

        let first = self.index_in_list(start).unwrap_or(count);
        let last = self.index_in_list(cmp::max(end_inclusive, start)).unwrap_or(count);
        RowRange {
            start_index: first.min(count),
            end_index: last.saturating_add(1).min(count),
        }
    }

    /// Calls `f` for every row in [`Self::virtual_range`], in ascending order.
    pub fn for_each_virtual_row(&self, mut f: impl FnMut(VirtualRow)) {
        let range = self.virtual_range();
        if range.is_empty() {
            return;
        }
        let mut start = self.start_of(range.start_index);
        for index in range.start_index..range.end_index {
            let size = self.sizes[index];
            f(VirtualRow { index, start, size });
            start = start.saturating_add(size as u64);
        }
    }

    /// Collects [`Self::virtual_range`] rows into `out` (clears `out` first).
    pub fn collect_virtual_rows(&self, out: &mut Vec<VirtualRow>) {
        out.clear();
        self.for_each_virtual_row(|row| out.push(row));
    }

    pub fn index_at_offset(&self, offset: u64) -> Option<usize> {
        self.index_in_list(offset)
    }

    pub fn row_start(&self, index: usize) -> Option<u64> {
        (index < self.options.count).then(|| self.start_of(index))
    }

    pub fn row_size(&self, index: usize) -> Option<u32> {
        self.sizes.get(index).copied()
    }

    pub fn row_end(&self, index: usize) -> Option<u64> {
        let start = self.row_start(index)?;
        Some(start.saturating_add(self.row_size(index)? as u64))
    }

    pub fn row(&self, index: usize) -> Option<VirtualRow> {
        Some(VirtualRow {
            index,
            start: self.row_start(index)?,
            size: self.row_size(index)?,
        })
    }

    /// Computes the (clamped) offset that brings `index` into view with the given alignment.
    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> u64 {
        if self.options.count == 0 {
            return 0;
        }
        let index = index.min(self.options.count - 1);
        let start = self.start_of(index);
        let end = start.saturating_add(self.sizes[index] as u64);
        let view = self.viewport_size as u64;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => {
                let center = start.saturating_add((end - start) / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                let cur = self.scroll_offset;
                let cur_end = cur.saturating_add(view);
                if start >= cur && end <= cur_end {
                    cur
                } else if start < cur {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };
        self.clamp_scroll_offset(target)
    }

    /// Scrolls to `index` and returns the applied offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> u64 {
        let offset = self.scroll_to_index_offset(index, align);
        self.scroll_offset = offset;
        offset
    }

    fn start_of(&self, index: usize) -> u64 {
        (self.options.padding_start as u64).saturating_add(self.sums.prefix(index))
    }

    fn index_in_list(&self, offset: u64) -> Option<usize> {
        let count = self.options.count;
        if count == 0 {
            return None;
        }
        let ps = self.options.padding_start as u64;
        if offset < ps {
            return Some(0);
        }
        Some(self.sums.rows_within(offset - ps).min(count - 1))
    }
}
