use pagewise::{CurrentState, Item, ItemId, OrderOverride, PageResult, StateVersion};
use pagewise_virtual::{Align, RowOptions, RowVirtualizer};

use crate::api;
use crate::fetcher::{LoadOutcome, PageTicket};
use crate::reorder::{self, OrderSnapshot};
use crate::selection::{SelectionManager, SyncDecision};
use crate::storage::{self, LocalStore, SavedSession};
use crate::{ClientError, ItemsApi, PendingMutation, Result, WindowFetcher};

/// Rows requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;
/// Estimated row height in pixels.
pub const DEFAULT_ROW_HEIGHT: u32 = 35;
/// How long any api call may run before it is abandoned.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone, Debug)]
pub struct ListOptions {
    pub page_size: usize,
    pub row_height: u32,
    pub overscan: usize,
    pub fetch_timeout_ms: u64,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: pagewise_virtual::DEFAULT_OVERSCAN,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
        }
    }
}

impl ListOptions {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_fetch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.fetch_timeout_ms = timeout_ms;
        self
    }
}

/// Page 1 is refetched at most this often when it races a concurrent order change.
const FIRST_PAGE_ATTEMPTS: usize = 3;

/// One rendered row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSlot {
    Item {
        index: usize,
        start: u64,
        item: Item,
        selected: bool,
    },
    /// The row's page has not arrived (or this is the trailing loading row).
    Pending { index: usize, start: u64 },
}

impl RowSlot {
    pub fn index(&self) -> usize {
        match self {
            Self::Item { index, .. } | Self::Pending { index, .. } => *index,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match self {
            Self::Item { item, .. } => Some(item),
            Self::Pending { .. } => None,
        }
    }
}

/// A framework-neutral infinite-scroll list over an [`ItemsApi`].
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_viewport_size` / `on_scroll` when UI events occur
/// - `sync(now_ms)` after each of those (and on a timer while a fetch may be hung), which
///   fetches whatever page the rendered range needs
/// - `visible_rows()` to render
///
/// Selection changes and drag-drop reorders are applied locally first, then pushed to the server
/// and tracked as pending mutations that can be retried or reverted.
pub struct ListController<A, S> {
    api: A,
    store: S,
    rows: RowVirtualizer,
    fetcher: WindowFetcher,
    selection: SelectionManager,
    order: OrderOverride,
    order_version: StateVersion,
    reorder: Option<PendingMutation<OrderSnapshot>>,
}

impl<A: ItemsApi, S: LocalStore> ListController<A, S> {
    pub fn new(api: A, store: S, options: ListOptions) -> Self {
        let rows = RowVirtualizer::new(
            RowOptions::fixed(0, options.row_height).with_overscan(options.overscan),
        );
        Self {
            api,
            store,
            rows,
            fetcher: WindowFetcher::new(options.page_size, options.fetch_timeout_ms),
            selection: SelectionManager::new(),
            order: OrderOverride::default(),
            order_version: StateVersion::default(),
            reorder: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rows(&self) -> &RowVirtualizer {
        &self.rows
    }

    pub fn fetcher(&self) -> &WindowFetcher {
        &self.fetcher
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn search(&self) -> &str {
        self.fetcher.search()
    }

    /// The order the server last confirmed.
    pub fn saved_order(&self) -> &OrderOverride {
        &self.order
    }

    pub fn pending_reorder(&self) -> Option<&PendingMutation<OrderSnapshot>> {
        self.reorder.as_ref()
    }

    /// Restores the selection and search term a previous session left in local storage.
    pub fn restore_session(&mut self) -> Result<()> {
        let saved = SavedSession::load(&self.store)?;
        tracing::debug!(
            target: "pagewise_client",
            selected = saved.selected.len(),
            search = %saved.search,
            dirty = saved.sync.dirty,
            "restored session"
        );
        self.selection = SelectionManager::restore(saved.selected, saved.sync);
        self.fetcher.set_search(saved.search);
        self.sync_count();
        Ok(())
    }

    /// Fetches page 1 with the saved state, then reconciles the local selection against it.
    pub async fn initialize(&mut self, now_ms: u64) -> Result<SyncDecision> {
        self.fetcher.reset();
        for _ in 0..FIRST_PAGE_ATTEMPTS {
            if self.load(1, now_ms).await? != LoadOutcome::Stale {
                break;
            }
        }
        let Some(state) = self.fetcher.last_state().cloned() else {
            return Ok(SyncDecision::InSync);
        };
        let decision = self.selection.reconcile(&state);
        self.persist_selection()?;
        if decision == SyncDecision::PushLocal {
            self.push_selection(Some(state.selection_version)).await?;
        }
        Ok(decision)
    }

    pub fn on_viewport_size(&mut self, viewport_size: u32) {
        self.rows.set_viewport_size(viewport_size);
    }

    /// Call this when the UI reports a scroll offset change.
    pub fn on_scroll(&mut self, scroll_offset: u64) {
        self.rows.set_scroll_offset_clamped(scroll_offset);
    }

    /// Computes and applies a scroll-to-index. Returns the applied offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align) -> u64 {
        self.rows.scroll_to_index(index, align)
    }

    /// Abandons a hung fetch, then starts the page the rendered range needs, if any.
    ///
    /// Adapter-driven: the caller performs the request and reports back through
    /// [`Self::finish_page`]. Use [`Self::sync`] to do both with the controller's api.
    pub fn poll_page(&mut self, now_ms: u64) -> Option<PageTicket> {
        self.fetcher.expire(now_ms);
        self.sync_count();
        let page = self.fetcher.next_page(self.rows.virtual_range())?;
        let ticket = self.fetcher.begin_load(page, now_ms);
        self.sync_count();
        ticket
    }

    /// Reports the result of a fetch started by [`Self::poll_page`].
    pub fn finish_page(
        &mut self,
        ticket: PageTicket,
        result: Result<(PageResult, Option<CurrentState>)>,
        now_ms: u64,
    ) -> Result<LoadOutcome> {
        let outcome = match result {
            Ok((page, state)) => {
                let outcome = self.fetcher.complete_load(ticket, page, state);
                if matches!(outcome, LoadOutcome::Merged { page: 1, .. }) {
                    self.adopt_saved_order();
                }
                Ok(outcome)
            }
            Err(e) => {
                self.fetcher.fail_load(&ticket, e.clone(), now_ms);
                Err(e)
            }
        };
        self.sync_count();
        outcome
    }

    /// Level-triggered fetch: safe to call on every render.
    pub async fn sync(&mut self, now_ms: u64) -> Result<Option<LoadOutcome>> {
        self.fetcher.expire(now_ms);
        self.sync_count();
        let Some(page) = self.fetcher.next_page(self.rows.virtual_range()) else {
            return Ok(None);
        };
        self.load(page, now_ms).await.map(Some)
    }

    /// Forgets the last fetch failure so the trigger asks for that page again.
    pub async fn retry_load(&mut self, now_ms: u64) -> Result<Option<LoadOutcome>> {
        self.fetcher.clear_failure();
        self.sync(now_ms).await
    }

    async fn load(&mut self, page: usize, now_ms: u64) -> Result<LoadOutcome> {
        let result = self.fetcher.load_page(&self.api, page, now_ms).await;
        if matches!(result, Ok(LoadOutcome::Merged { page: 1, .. })) {
            self.adopt_saved_order();
        }
        self.sync_count();
        result
    }

    fn adopt_saved_order(&mut self) {
        if let Some(state) = self.fetcher.last_state() {
            self.order = OrderOverride::new(state.order.clone());
            self.order_version = state.order_version;
        }
    }

    fn sync_count(&mut self) {
        let count = self.fetcher.cache().row_count(self.fetcher.is_loading());
        if self.rows.count() != count {
            self.rows.set_count(count);
        }
    }

    /// Rows in the rendered range (visible plus overscan), in index order.
    pub fn visible_rows(&self) -> Vec<RowSlot> {
        let cache = self.fetcher.cache();
        let mut out = Vec::with_capacity(self.rows.virtual_range().len());
        self.rows.for_each_virtual_row(|row| {
            out.push(match cache.get(row.index) {
                Some(item) => RowSlot::Item {
                    index: row.index,
                    start: row.start,
                    item: *item,
                    selected: self.selection.is_selected(item.id),
                },
                None => RowSlot::Pending {
                    index: row.index,
                    start: row.start,
                },
            });
        });
        out
    }

    /// Switches the search term; the list restarts from page 1 on the next `sync`.
    pub fn set_search(&mut self, search: impl Into<String>) -> Result<bool> {
        if !self.fetcher.set_search(search) {
            return Ok(false);
        }
        storage::save_search(&mut self.store, self.fetcher.search())?;
        self.rows.set_scroll_offset(0);
        self.sync_count();
        Ok(true)
    }

    /// Flips selection of `id`. Returns whether it is selected afterwards.
    ///
    /// A failed push is recorded on [`SelectionManager::pending`], not returned.
    pub async fn toggle(&mut self, id: ItemId) -> Result<bool> {
        let selected = self.selection.toggle(id);
        self.persist_selection()?;
        self.push_selection(None).await?;
        Ok(selected)
    }

    /// Selects exactly the loaded rows of the current search.
    pub async fn select_all(&mut self) -> Result<()> {
        let ids = self.fetcher.cache().ids();
        self.selection.select_all(ids);
        self.persist_selection()?;
        self.push_selection(None).await
    }

    pub async fn clear_selection(&mut self) -> Result<()> {
        self.selection.clear();
        self.persist_selection()?;
        self.push_selection(None).await
    }

    pub async fn retry_selection(&mut self) -> Result<()> {
        self.selection.retry()?;
        self.push_selection(None).await
    }

    pub fn revert_selection(&mut self) -> Result<()> {
        self.selection.revert()?;
        self.persist_selection()
    }

    fn persist_selection(&mut self) -> Result<()> {
        storage::save_selection(
            &mut self.store,
            self.selection.selected(),
            &self.selection.sync(),
        )
    }

    async fn push_selection(&mut self, expected: Option<StateVersion>) -> Result<()> {
        let ids = self.selection.selected().to_vec();
        let save = self.api.save_selected(&ids, expected);
        match api::bounded(self.fetcher.timeout_ms(), save).await {
            Ok(version) => self.selection.confirm(version),
            Err(e) => {
                tracing::warn!(target: "pagewise_client", error = %e, "saving selection failed");
                self.selection.fail(e);
            }
        }
        self.persist_selection()
    }

    /// Drag-drop: moves the row at `source` to `destination` and saves the resulting order.
    ///
    /// Both are row indices and must fall in the leading run of loaded rows; a row behind a
    /// hole left by a jump-scroll is rejected until the hole is backfilled. A failed save is
    /// recorded on [`Self::pending_reorder`], not returned.
    pub async fn drop_item(&mut self, source: usize, destination: usize) -> Result<()> {
        let cache = self.fetcher.cache();
        let len = cache.contiguous_len();
        let view: Vec<Item> = cache
            .iter()
            .take(len)
            .map(|(_, item)| *item)
            .collect();
        let mut moved = view.clone();
        reorder::move_in_view(&mut moved, source, destination)?;

        let full = reorder::full_order(&self.order, &view);
        let view_ids: Vec<ItemId> = view.iter().map(|item| item.id).collect();
        let moved_ids: Vec<ItemId> = moved.iter().map(|item| item.id).collect();
        let reconciled = reorder::reconcile(&full, &view_ids, &moved_ids);

        reorder::apply_to_cache(self.fetcher.cache_mut(), &moved);
        self.reorder = Some(PendingMutation::new(
            OrderSnapshot { view, full },
            OrderSnapshot {
                view: moved,
                full: reconciled,
            },
        ));
        self.push_order().await;
        Ok(())
    }

    /// Pushes a failed reorder again, overwriting whatever order the server holds now.
    pub async fn retry_reorder(&mut self) -> Result<()> {
        let pending = self.reorder.as_mut().ok_or(ClientError::NothingPending)?;
        let conflicted = matches!(
            pending.error(),
            Some(ClientError::Status { status: 409, .. })
        );
        pending.retry()?;
        if conflicted {
            let timeout_ms = self.fetcher.timeout_ms();
            self.order_version = api::bounded(timeout_ms, self.api.get_state())
                .await?
                .order_version;
        }
        self.push_order().await;
        Ok(())
    }

    /// Abandons a failed reorder and puts the rows back where they were.
    pub fn revert_reorder(&mut self) -> Result<()> {
        let pending = self.reorder.take().ok_or(ClientError::NothingPending)?;
        match pending.revert() {
            Ok(previous) => {
                reorder::apply_to_cache(self.fetcher.cache_mut(), &previous.view);
                Ok(())
            }
            Err(pending) => {
                self.reorder = Some(pending);
                Err(ClientError::NothingPending)
            }
        }
    }

    async fn push_order(&mut self) {
        let Some(pending) = self.reorder.as_ref() else {
            return;
        };
        let full = pending.next().full.clone();
        let save = self.api.save_order(&full, Some(self.order_version));
        let result = api::bounded(self.fetcher.timeout_ms(), save).await;
        let Some(pending) = self.reorder.as_mut() else {
            return;
        };
        match result {
            Ok(version) => {
                pending.confirm();
                self.order = OrderOverride::new(full);
                self.order_version = version;
            }
            Err(e) => {
                tracing::warn!(target: "pagewise_client", error = %e, "saving order failed");
                pending.fail(e);
            }
        }
    }
}
