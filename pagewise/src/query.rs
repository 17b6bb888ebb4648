use core::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::{CollectionStore, Error, Item, Result};

/// A request for one window of the filtered, ordered collection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// 1-based page index.
    pub page: usize,
    pub page_size: usize,
    /// Substring matched against the decimal text of each item's value. Empty matches all.
    #[serde(default)]
    pub search: String,
}

impl PageRequest {
    pub fn new(page: usize, page_size: usize, search: impl Into<String>) -> Self {
        Self {
            page,
            page_size,
            search: search.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(Error::validation("page", "must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(Error::validation("pageSize", "must be at least 1"));
        }
        Ok(())
    }

    /// Index of the first row of this page in the filtered sequence.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// One window of the filtered, ordered collection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    pub items: Vec<Item>,
    /// Number of items matching the search, before pagination.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// Returns whether `value` rendered as decimal text contains `search`.
///
/// `buf` is scratch space reused across calls.
pub fn matches_search(value: i64, search: &str, buf: &mut String) -> bool {
    if search.is_empty() {
        return true;
    }
    buf.clear();
    write!(buf, "{value}").is_ok() && buf.contains(search)
}

/// Filters, orders and paginates the store's items.
///
/// Ranked items (present in the order override) come first in override order, followed by
/// the remaining matches in ascending id order. A page past the end yields no items but still
/// reports `total` and `total_pages`.
pub fn query(store: &CollectionStore, request: &PageRequest) -> Result<PageResult> {
    request.validate()?;

    let search = request.search.as_str();
    let order = store.order();
    let start = request.offset();
    let end = start.saturating_add(request.page_size);

    if search.is_empty() && order.is_empty() {
        let all = store.all();
        let total = all.len();
        let items = all
            .get(start.min(total)..end.min(total))
            .map(<[Item]>::to_vec)
            .unwrap_or_default();
        return Ok(page_result(items, total, request));
    }

    // First pass: collect ranked matches and count the unranked ones.
    let mut buf = String::new();
    let mut ranked: Vec<(usize, Item)> = Vec::new();
    let mut unranked = 0usize;
    for item in store.all() {
        if !matches_search(item.value, search, &mut buf) {
            continue;
        }
        match order.rank(item.id) {
            Some(rank) => ranked.push((rank, *item)),
            None => unranked += 1,
        }
    }
    ranked.sort_by_key(|&(rank, item)| (rank, item.id));

    let total = ranked.len() + unranked;
    let mut items: Vec<Item> = ranked
        .iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(|&(_, item)| item)
        .collect();

    // Second pass: fill the rest of the window from unranked matches, already in id order.
    let wanted = request.page_size.saturating_sub(items.len());
    if wanted > 0 && start.saturating_add(items.len()) < total {
        let skip = start.saturating_sub(ranked.len());
        items.extend(
            store
                .all()
                .iter()
                .filter(|item| order.rank(item.id).is_none())
                .filter(|item| matches_search(item.value, search, &mut buf))
                .skip(skip)
                .take(wanted)
                .copied(),
        );
    }

    tracing::trace!(
        target: "pagewise",
        page = request.page,
        page_size = request.page_size,
        search,
        total,
        returned = items.len(),
        "query"
    );
    Ok(page_result(items, total, request))
}

fn page_result(items: Vec<Item>, total: usize, request: &PageRequest) -> PageResult {
    PageResult {
        items,
        total,
        page: request.page,
        total_pages: total.div_ceil(request.page_size),
    }
}

