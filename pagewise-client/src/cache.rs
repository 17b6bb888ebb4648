use std::collections::BTreeMap;

use pagewise::{Item, ItemId};

/// A sparse, index-addressable view of the rows fetched so far for one query.
///
/// Rows are stored per page, so a jump-scroll that fetches page 500 does not materialize the
/// 9,980 rows above it. Indices whose page has not arrived are "pending".
#[derive(Clone, Debug)]
pub struct ClientCache {
    page_size: usize,
    pages: BTreeMap<usize, Vec<Item>>,
    total: usize,
    loaded: usize,
}

impl ClientCache {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            pages: BTreeMap::new(),
            total: 0,
            loaded: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Server-reported number of rows matching the query.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of rows actually present.
    pub fn loaded_len(&self) -> usize {
        self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.loaded == 0
    }

    /// Logical row count for the renderer.
    ///
    /// While a trailing fetch is in flight and every known row is present, one extra
    /// placeholder row is reported so the adapter can show a loading indicator.
    pub fn row_count(&self, fetch_in_flight: bool) -> usize {
        self.total + usize::from(fetch_in_flight && self.loaded >= self.total)
    }

    /// 1-based page containing `index`.
    pub fn page_of(&self, index: usize) -> usize {
        index / self.page_size + 1
    }

    /// Number of rows present without a gap from row 0.
    ///
    /// Only this prefix is a complete leading run of the server's order, so only it can be
    /// written back as an order without displacing the rows in a hole.
    pub fn contiguous_len(&self) -> usize {
        let mut len = 0;
        for (expected, (&page, items)) in (1..).zip(&self.pages) {
            if page != expected {
                break;
            }
            len += items.len();
            if items.len() < self.page_size {
                break;
            }
        }
        len
    }

    pub fn has_page(&self, page: usize) -> bool {
        self.pages.contains_key(&page)
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.pages
            .get(&self.page_of(index))?
            .get(index % self.page_size)
    }

    /// Drops everything and starts over with `items` as page 1.
    pub fn replace(&mut self, items: Vec<Item>, total: usize) {
        self.pages.clear();
        self.loaded = 0;
        self.merge(1, items, total);
    }

    /// Stores `items` as `page`, replacing any previous copy of that page.
    pub fn merge(&mut self, page: usize, mut items: Vec<Item>, total: usize) {
        items.truncate(self.page_size);
        self.loaded += items.len();
        if let Some(old) = self.pages.insert(page, items) {
            self.loaded -= old.len();
        }
        self.total = total;
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.loaded = 0;
        self.total = 0;
    }

    /// Present rows as `(index, item)`, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Item)> + '_ {
        let page_size = self.page_size;
        self.pages.iter().flat_map(move |(&page, items)| {
            let base = page.saturating_sub(1) * page_size;
            items.iter().enumerate().map(move |(i, item)| (base + i, item))
        })
    }

    /// Present rows, mutably, in index order.
    pub(crate) fn items_mut(&mut self) -> impl Iterator<Item = &mut Item> + '_ {
        self.pages.values_mut().flat_map(|items| items.iter_mut())
    }

    /// Ids of the present rows, in index order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.iter().map(|(_, item)| item.id).collect()
    }
}
