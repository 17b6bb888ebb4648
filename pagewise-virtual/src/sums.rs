use alloc::vec::Vec;

/// Prefix sums over row heights (a Fenwick tree).
///
/// `tree[i]` (1-indexed) holds the sum of the `lsb(i)` heights ending at row `i - 1`.
#[derive(Clone, Debug)]
pub(crate) struct RowSums {
    tree: Vec<u64>,
    total: u64,
    top_bit: usize,
}

impl RowSums {
    pub(crate) fn from_heights(heights: &[u32]) -> Self {
        let n = heights.len();
        let mut tree = alloc::vec![0u64; n + 1];
        let mut total = 0u64;
        for i in 1..=n {
            let h = heights[i - 1] as u64;
            total = total.saturating_add(h);
            tree[i] = tree[i].saturating_add(h);
            let parent = i + lsb(i);
            if parent <= n {
                tree[parent] = tree[parent].saturating_add(tree[i]);
            }
        }
        Self {
            tree,
            total,
            top_bit: top_bit(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Appends one row in `O(log n)`.
    pub(crate) fn push(&mut self, height: u32) {
        let n = self.len() + 1;
        let height = height as u64;
        // The new node covers rows (n - lsb(n), n]; all but the last are already summed.
        let covered = self
            .prefix(n - 1)
            .saturating_sub(self.prefix(n - lsb(n)));
        self.tree.push(covered.saturating_add(height));
        self.total = self.total.saturating_add(height);
        self.top_bit = top_bit(n);
    }

    /// Drops every row at or after `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        self.total = self.prefix(len);
        self.tree.truncate(len + 1);
        self.top_bit = top_bit(len);
    }

    /// Adds `delta` to the height of row `index`.
    pub(crate) fn adjust(&mut self, index: usize, delta: i64) {
        let n = self.len();
        if index >= n || delta == 0 {
            return;
        }
        self.total = apply_delta(self.total, delta);
        let mut i = index + 1;
        while i <= n {
            self.tree[i] = apply_delta(self.tree[i], delta);
            i += lsb(i);
        }
    }

    /// Sum of the first `rows` heights.
    pub(crate) fn prefix(&self, rows: usize) -> u64 {
        let mut i = rows.min(self.len());
        let mut sum = 0u64;
        while i > 0 {
            sum = sum.saturating_add(self.tree[i]);
            i &= i - 1;
        }
        sum
    }

    /// Number of leading rows whose combined height is `<= offset`.
    ///
    /// For an offset inside the list this is the index of the row containing it.
    pub(crate) fn rows_within(&self, mut offset: u64) -> usize {
        let n = self.len();
        let mut idx = 0usize;
        let mut bit = self.top_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && self.tree[next] <= offset {
                offset -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }
}

fn apply_delta(v: u64, delta: i64) -> u64 {
    if delta >= 0 {
        v.saturating_add(delta as u64)
    } else {
        v.saturating_sub(delta.unsigned_abs())
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn top_bit(n: usize) -> usize {
    if n == 0 {
        0
    } else {
        1usize << (usize::BITS - 1 - n.leading_zeros())
    }
}
