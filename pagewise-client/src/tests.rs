use crate::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pagewise::{
    CollectionStore, CurrentState, Item, ItemId, PageRequest, PageResult, StateService,
    StateVersion,
};
use pagewise_virtual::RowRange;

fn service(len: usize) -> StateService {
    StateService::new(CollectionStore::with_len(len))
}

fn ids(items: &[Item]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).collect()
}

fn page(items: std::ops::RangeInclusive<ItemId>, page: usize, total: usize) -> PageResult {
    let items: Vec<Item> = items.map(Item::canonical).collect();
    PageResult {
        total_pages: total.div_ceil(20),
        items,
        total,
        page,
    }
}

fn range(start_index: usize, end_index: usize) -> RowRange {
    RowRange {
        start_index,
        end_index,
    }
}

fn loaded_ids<A: ItemsApi, S: LocalStore>(c: &ListController<A, S>) -> Vec<ItemId> {
    c.fetcher().cache().ids()
}

/// A `StateService` whose writes and item reads can be made to fail or hang.
#[derive(Clone)]
struct FlakyApi {
    inner: StateService,
    fail_writes: Arc<AtomicBool>,
    hang_writes: Arc<AtomicBool>,
    hang_items: Arc<AtomicBool>,
}

impl FlakyApi {
    fn new(inner: StateService) -> Self {
        Self {
            inner,
            fail_writes: Arc::new(AtomicBool::new(false)),
            hang_writes: Arc::new(AtomicBool::new(false)),
            hang_items: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn write_result(&self) -> Result<()> {
        if self.hang_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(ClientError::Transport("connection reset".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ItemsApi for FlakyApi {
    async fn get_items(&self, request: &PageRequest) -> Result<PageResult> {
        if self.hang_items.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.get_items(request).await
    }

    async fn get_state(&self) -> Result<CurrentState> {
        self.inner.get_state().await
    }

    async fn save_order(
        &self,
        order: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion> {
        self.write_result().await?;
        self.inner.save_order(order, version).await
    }

    async fn save_selected(
        &self,
        selected: &[ItemId],
        version: Option<StateVersion>,
    ) -> Result<StateVersion> {
        self.write_result().await?;
        self.inner.save_selected(selected, version).await
    }
}

#[test]
fn trigger_does_not_request_a_page_twice() {
    let mut f = WindowFetcher::new(20, 10_000);
    let t = f.begin_load(1, 0).expect("idle fetcher starts");
    assert!(t.with_state);
    assert_eq!(f.page_to_load(39), None, "loading blocks the trigger");
    assert!(f.begin_load(2, 0).is_none());

    f.complete_load(t, page(1..=20, 1, 1000), None);
    assert_eq!(f.page_to_load(19), None);
    assert_eq!(f.page_to_load(39), Some(2));

    let t = f.begin_load(2, 5).expect("page 2 starts");
    assert!(!t.with_state);
    assert_eq!(f.page_to_load(39), None);
    f.complete_load(t, page(21..=40, 2, 1000), None);

    // Same visible range after the page arrived: nothing more to do.
    assert_eq!(f.page_to_load(39), None);
    assert_eq!(f.next_page(range(20, 40)), None);
    assert_eq!(f.current_page(), 2);
    assert_eq!(f.cache().loaded_len(), 40);
}

#[test]
fn trigger_stops_once_everything_is_loaded() {
    let mut f = WindowFetcher::new(20, 10_000);
    let t = f.begin_load(1, 0).expect("starts");
    f.complete_load(t, page(1..=15, 1, 15), None);
    assert_eq!(f.page_to_load(14), None);
    assert_eq!(f.page_to_load(40), None);
    assert_eq!(f.next_page(range(0, 15)), None);
}

#[test]
fn response_for_an_old_search_is_discarded() {
    let mut f = WindowFetcher::new(20, 10_000);
    let old = f.begin_load(1, 0).expect("starts");
    assert!(f.set_search("12"));
    assert!(!f.is_loading());

    let fresh = f.begin_load(1, 1).expect("new query starts");
    assert_eq!(fresh.request.search, "12");
    assert_eq!(f.complete_load(old, page(1..=20, 1, 1000), None), LoadOutcome::Stale);
    assert!(f.is_loading(), "stale response must not clear the live fetch");
    assert!(f.cache().is_empty());

    let matching: Vec<Item> = [12, 112, 120].into_iter().map(Item::canonical).collect();
    let result = PageResult {
        items: matching,
        total: 3,
        page: 1,
        total_pages: 1,
    };
    assert_eq!(
        f.complete_load(fresh, result, None),
        LoadOutcome::Merged { page: 1, rows: 3 }
    );
    assert_eq!(f.cache().ids(), vec![12, 112, 120]);
    assert!(!f.set_search("12"));
}

#[test]
fn expire_unwedges_loading_and_drops_the_late_response() {
    let mut f = WindowFetcher::new(20, 1_000);
    let t = f.begin_load(1, 100).expect("starts");
    assert!(!f.expire(1_099));
    assert!(f.is_loading());
    assert!(f.expire(1_100));
    assert!(!f.is_loading());
    assert!(matches!(
        f.last_failure(),
        Some(LoadFailure { page: 1, error: ClientError::Timeout(1_000), .. })
    ));

    // The failed page is not retried by the trigger until the failure is cleared.
    assert_eq!(f.next_page(range(0, 10)), None);
    assert_eq!(f.complete_load(t, page(1..=20, 1, 100), None), LoadOutcome::Stale);
    assert!(f.clear_failure().is_some());
    assert_eq!(f.next_page(range(0, 10)), Some(1));
}

#[test]
fn first_page_must_agree_with_the_saved_order() {
    let mut f = WindowFetcher::new(5, 10_000);
    let t = f.begin_load(1, 0).expect("starts");
    let state = CurrentState {
        order: vec![3, 1],
        ..CurrentState::default()
    };
    let items: Vec<Item> = [3, 1, 2, 4, 5].into_iter().map(Item::canonical).collect();
    let result = PageResult {
        items,
        total: 10,
        page: 1,
        total_pages: 2,
    };
    f.complete_load(t, result, Some(state.clone()));
    assert_eq!(f.cache().ids(), vec![3, 1, 2, 4, 5]);
    assert_eq!(f.last_state(), Some(&state));

    // A page computed under an older order is not merged with the newer state.
    f.reset();
    let newer = CurrentState {
        order: vec![9, 1],
        ..CurrentState::default()
    };
    let t = f.begin_load(1, 0).expect("starts");
    assert_eq!(
        f.complete_load(t, page(1..=5, 1, 10), Some(newer)),
        LoadOutcome::Stale
    );
    assert!(f.cache().is_empty());
    assert!(!f.is_loading());
    assert_eq!(f.last_state(), Some(&state));
    assert_eq!(f.next_page(range(0, 4)), Some(1));
}

#[test]
fn jump_scroll_leaves_a_hole_that_is_backfilled() {
    let mut f = WindowFetcher::new(20, 10_000);
    let t = f.begin_load(1, 0).expect("starts");
    f.complete_load(t, page(1..=20, 1, 1000), None);

    let view = range(95, 115);
    assert_eq!(f.next_page(view), Some(6));
    let t = f.begin_load(6, 0).expect("starts");
    f.complete_load(t, page(101..=120, 6, 1000), None);

    assert_eq!(f.page_to_load(114), None);
    assert_eq!(f.backfill_page(view), Some(5));
    let t = f.begin_load(5, 0).expect("starts");
    f.complete_load(t, page(81..=100, 5, 1000), None);

    assert_eq!(f.next_page(view), None);
    assert_eq!(f.cache().get(95).map(|i| i.id), Some(96));
    assert_eq!(f.cache().get(40), None);
    assert_eq!(f.current_page(), 6);
}

#[test]
fn row_count_adds_a_placeholder_only_for_a_trailing_fetch() {
    let mut cache = ClientCache::new(20);
    assert_eq!(cache.row_count(true), 1);
    assert_eq!(cache.row_count(false), 0);

    cache.replace((1..=20).map(Item::canonical).collect(), 45);
    assert_eq!(cache.row_count(true), 45);
    cache.merge(2, (21..=40).map(Item::canonical).collect(), 45);
    cache.merge(3, (41..=45).map(Item::canonical).collect(), 45);
    assert_eq!(cache.row_count(true), 46);
    assert_eq!(cache.row_count(false), 45);
    assert_eq!(cache.loaded_len(), 45);

    // Re-merging a page does not double count.
    cache.merge(3, (41..=45).map(Item::canonical).collect(), 45);
    assert_eq!(cache.loaded_len(), 45);
}

#[test]
fn contiguous_len_stops_at_the_first_hole() {
    let mut cache = ClientCache::new(20);
    assert_eq!(cache.contiguous_len(), 0);

    cache.merge(2, (21..=40).map(Item::canonical).collect(), 100);
    assert_eq!(cache.contiguous_len(), 0);

    cache.merge(1, (1..=20).map(Item::canonical).collect(), 100);
    cache.merge(4, (61..=80).map(Item::canonical).collect(), 100);
    assert_eq!(cache.contiguous_len(), 40);
    assert_eq!(cache.loaded_len(), 60);

    let mut short = ClientCache::new(20);
    short.replace((1..=20).map(Item::canonical).collect(), 25);
    short.merge(2, (21..=25).map(Item::canonical).collect(), 25);
    assert_eq!(short.contiguous_len(), 25);
}

#[test]
fn move_in_view_rejects_out_of_range_indices() {
    let mut view = vec![1, 2, 3];
    assert!(matches!(
        reorder::move_in_view(&mut view, 3, 0),
        Err(ClientError::Reorder { index: 3, len: 3 })
    ));
    assert!(reorder::move_in_view(&mut view, 0, 5).is_err());
    assert_eq!(view, vec![1, 2, 3]);

    reorder::move_in_view(&mut view, 0, 2).expect("in range");
    assert_eq!(view, vec![2, 3, 1]);
    reorder::move_in_view(&mut view, 2, 0).expect("in range");
    assert_eq!(view, vec![1, 2, 3]);
}

#[test]
fn reconcile_keeps_out_of_view_positions() {
    let full = [1, 2, 3, 4, 5, 6];
    let in_view = [2, 4, 6];
    let new_view = [6, 2, 4];
    assert_eq!(
        reorder::reconcile(&full, &in_view, &new_view),
        vec![1, 6, 3, 2, 5, 4]
    );
    assert_eq!(reorder::reconcile(&full, &in_view, &in_view), full.to_vec());
}

#[test]
fn pending_mutation_retry_and_revert() {
    let mut m = PendingMutation::new(vec![1, 2], vec![2, 1]);
    assert!(matches!(m.retry(), Err(ClientError::NothingPending)));
    m.fail(ClientError::Timeout(10));
    assert!(m.is_failed());
    assert_eq!(m.retry().ok(), Some(&vec![2, 1]));
    assert_eq!(m.attempts(), 2);
    m.fail(ClientError::Timeout(10));
    assert_eq!(m.revert().ok(), Some(vec![1, 2]));

    let mut m = PendingMutation::new(1, 2);
    m.confirm();
    assert!(m.is_confirmed());
    assert!(m.revert().is_err());
}

#[test]
fn toggling_twice_restores_the_selection() {
    let mut s = SelectionManager::new();
    s.select_all([1, 2, 3]);
    let before = s.selected().clone();
    assert!(!s.toggle(2));
    assert!(s.toggle(2));
    assert_eq!(s.selected(), &before);
    assert!(s.toggle(9));
    assert!(!s.toggle(9));
    assert_eq!(s.selected(), &before);
}

#[test]
fn saved_session_survives_a_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("session.json");
    {
        let mut store = FileStore::open(&path).expect("open");
        store.set(SELECTED_ITEMS_KEY, "[7,3]").expect("set");
        store.set(SEARCH_TERM_KEY, "42").expect("set");
    }

    let store = FileStore::open(&path).expect("reopen");
    let saved = SavedSession::load(&store).expect("load");
    assert_eq!(saved.selected.to_vec(), vec![3, 7]);
    assert_eq!(saved.search, "42");
    assert!(saved.sync.dirty, "a selection without a sync marker is unconfirmed");

    let mut store = store;
    store.remove(SEARCH_TERM_KEY).expect("remove");
    let store = FileStore::open(&path).expect("reopen");
    assert_eq!(store.get(SEARCH_TERM_KEY).expect("get"), None);
}

#[test]
fn corrupt_saved_selection_is_ignored() {
    let mut store = MemoryStore::new();
    store.set(SELECTED_ITEMS_KEY, "not json").expect("set");
    let saved = SavedSession::load(&store).expect("load");
    assert!(saved.selected.is_empty());
    assert_eq!(saved.search, "");
}

#[tokio::test]
async fn initial_extent_covers_the_whole_collection() {
    let mut c = ListController::new(service(1_000_000), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");

    assert_eq!(c.rows().count(), 1_000_000);
    assert_eq!(c.rows().total_size(), 35_000_000);
    assert_eq!(c.fetcher().cache().loaded_len(), 20);

    let rows = c.visible_rows();
    assert_eq!(rows.len(), 15);
    assert_eq!(rows[0].item().map(|i| i.id), Some(1));
    assert_eq!(rows[14].item().map(|i| i.id), Some(15));
    assert_eq!(c.sync(1).await.expect("sync"), None);
}

#[tokio::test]
async fn scrolling_fetches_the_needed_pages() {
    let mut c = ListController::new(service(1_000_000), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");

    c.on_scroll(35 * 100);
    assert_eq!(
        c.sync(1).await.expect("sync"),
        Some(LoadOutcome::Merged { page: 6, rows: 20 })
    );
    let rows = c.visible_rows();
    assert_eq!(rows.first().map(RowSlot::index), Some(95));
    assert!(matches!(rows[0], RowSlot::Pending { index: 95, .. }));
    assert_eq!(rows[5].item().map(|i| i.id), Some(101));

    assert_eq!(
        c.sync(2).await.expect("sync"),
        Some(LoadOutcome::Merged { page: 5, rows: 20 })
    );
    assert_eq!(c.sync(3).await.expect("sync"), None);
    assert!(c.visible_rows().iter().all(|row| row.item().is_some()));
}

#[tokio::test]
async fn hung_fetch_times_out() {
    let api = FlakyApi::new(service(100));
    api.hang_items.store(true, Ordering::SeqCst);
    let hang = api.hang_items.clone();
    let mut c = ListController::new(
        api,
        MemoryStore::new(),
        ListOptions::default().with_fetch_timeout_ms(20),
    );
    c.on_viewport_size(350);

    let err = c.sync(0).await.expect_err("times out");
    assert!(matches!(err, ClientError::Timeout(20)));
    assert!(err.is_transient());
    assert!(!c.fetcher().is_loading());
    assert_eq!(c.sync(1).await.expect("sync"), None, "failed page waits for retry");

    hang.store(false, Ordering::SeqCst);
    assert_eq!(
        c.retry_load(2).await.expect("retry"),
        Some(LoadOutcome::Merged { page: 1, rows: 20 })
    );
}

#[tokio::test]
async fn adapter_driven_fetch_shows_a_loading_row() {
    let server = service(30);
    let mut c = ListController::new(server.clone(), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(35 * 40);

    let ticket = c.poll_page(0).expect("page 1");
    assert_eq!(c.rows().count(), 1);
    assert!(c.poll_page(1).is_none());

    let result = server.get_items(&ticket.request).await;
    let state = server.get_state().await.expect("state");
    let outcome = c.finish_page(ticket, result.map(|r| (r, Some(state))), 2);
    assert_eq!(outcome.ok(), Some(LoadOutcome::Merged { page: 1, rows: 20 }));
    assert_eq!(c.rows().count(), 30);

    let ticket = c.poll_page(3).expect("page 2");
    assert_eq!(ticket.page(), 2);
    assert_eq!(c.rows().count(), 30, "rows 20..30 are pending, no extra row");
}

#[tokio::test]
async fn drag_drop_reorders_and_saves_the_full_order() {
    let server = service(50);
    let mut c = ListController::new(server.clone(), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");

    c.drop_item(0, 2).await.expect("drop");
    let mut expected: Vec<ItemId> = vec![2, 3, 1];
    expected.extend(4..=20);
    assert_eq!(loaded_ids(&c), expected);
    assert!(c.pending_reorder().is_some_and(PendingMutation::is_confirmed));

    let state = server.state();
    assert_eq!(state.order, expected);
    assert_eq!(state.order_version, StateVersion(1));
    let first = server
        .query(&PageRequest::new(1, 20, ""))
        .expect("query");
    assert_eq!(ids(&first.items), expected);

    // Dropping onto a row that is not loaded is rejected without changes.
    assert!(matches!(
        c.drop_item(0, 40).await,
        Err(ClientError::Reorder { index: 40, .. })
    ));
    assert_eq!(loaded_ids(&c), expected);
}

async fn jumped_controller(server: StateService) -> ListController<StateService, MemoryStore> {
    let mut c = ListController::new(server, MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");
    c.on_scroll(35 * 160);
    let mut now = 1;
    while c.sync(now).await.expect("sync").is_some() {
        now += 1;
    }
    assert!(!c.fetcher().cache().has_page(2));
    assert_eq!(c.fetcher().cache().get(160).map(|item| item.id), Some(161));
    c
}

#[tokio::test]
async fn reorder_after_a_jump_scroll_leaves_the_hole_alone() {
    let server = service(200);
    let mut c = jumped_controller(server.clone()).await;
    assert_eq!(c.fetcher().cache().contiguous_len(), 20);

    c.drop_item(0, 1).await.expect("drop");
    let mut expected: Vec<ItemId> = vec![2, 1];
    expected.extend(3..=20);
    assert_eq!(server.state().order, expected);
    assert_eq!(c.fetcher().cache().get(160).map(|item| item.id), Some(161));

    let second = server
        .query(&PageRequest::new(2, 20, ""))
        .expect("query");
    assert_eq!(ids(&second.items), (21..=40).collect::<Vec<_>>());
    let ninth = server
        .query(&PageRequest::new(9, 20, ""))
        .expect("query");
    assert_eq!(ids(&ninth.items), (161..=180).collect::<Vec<_>>());

    // Rows behind the hole cannot be dragged until it is filled.
    assert!(matches!(
        c.drop_item(160, 0).await,
        Err(ClientError::Reorder { index: 160, len: 20 })
    ));
    assert_eq!(server.state().order, expected);

    // Backfilling the hole brings no duplicates.
    c.on_scroll(35 * 20);
    let mut now = 100;
    while c.sync(now).await.expect("sync").is_some() {
        now += 1;
    }
    let mut loaded = loaded_ids(&c);
    let len = loaded.len();
    loaded.sort_unstable();
    loaded.dedup();
    assert_eq!(loaded.len(), len);
}

#[tokio::test]
async fn select_all_after_a_jump_scroll_takes_only_loaded_rows() {
    let server = service(200);
    let mut c = jumped_controller(server.clone()).await;

    c.select_all().await.expect("select all");
    let selected = server.state().selected;
    let mut loaded = loaded_ids(&c);
    loaded.sort_unstable();
    assert_eq!(selected, loaded);
    assert!(selected.contains(&1));
    assert!(selected.contains(&161));
    assert!(!selected.contains(&21));
}

#[tokio::test]
async fn reorder_within_a_search_keeps_other_rows_in_place() {
    let server = service(30);
    server.set_order(vec![30, 1], None).expect("order");
    let mut c = ListController::new(server.clone(), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.set_search("2").expect("search");
    c.initialize(0).await.expect("initialize");
    // 2, 12, 20..=29 match; 30 does not.
    assert_eq!(loaded_ids(&c)[..3], [2, 12, 20]);

    c.drop_item(2, 0).await.expect("drop");
    assert_eq!(loaded_ids(&c)[..3], [20, 2, 12]);
    let order = server.state().order;
    assert_eq!(order[..5], [30, 1, 20, 2, 12]);
}

#[tokio::test]
async fn failed_reorder_can_be_reverted() {
    let api = FlakyApi::new(service(50));
    let fail = api.fail_writes.clone();
    let mut c = ListController::new(api, MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");
    let before = loaded_ids(&c);

    fail.store(true, Ordering::SeqCst);
    c.drop_item(5, 0).await.expect("applied locally");
    assert_eq!(loaded_ids(&c)[0], 6);
    let pending = c.pending_reorder().expect("tracked");
    assert!(pending.is_failed());
    assert!(pending.error().is_some_and(ClientError::is_transient));

    c.revert_reorder().expect("revert");
    assert_eq!(loaded_ids(&c), before);
    assert!(c.pending_reorder().is_none());
    assert!(c.api().inner.state().order.is_empty());
    assert!(matches!(c.revert_reorder(), Err(ClientError::NothingPending)));
}

#[tokio::test]
async fn failed_reorder_can_be_retried() {
    let api = FlakyApi::new(service(50));
    let fail = api.fail_writes.clone();
    let mut c = ListController::new(api, MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");

    fail.store(true, Ordering::SeqCst);
    c.drop_item(1, 0).await.expect("applied locally");
    fail.store(false, Ordering::SeqCst);
    c.retry_reorder().await.expect("retry");

    let pending = c.pending_reorder().expect("tracked");
    assert!(pending.is_confirmed());
    assert_eq!(pending.attempts(), 2);
    assert_eq!(c.api().inner.state().order[..3], [2, 1, 3]);
}

#[tokio::test]
async fn concurrent_order_change_is_detected_and_retry_overwrites() {
    let server = service(50);
    let mut c = ListController::new(server.clone(), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");

    // Another client saves an order after ours was loaded.
    server.set_order(vec![50], None).expect("order");
    c.drop_item(1, 0).await.expect("applied locally");
    let pending = c.pending_reorder().expect("tracked");
    assert!(matches!(
        pending.error(),
        Some(ClientError::Status { status: 409, .. })
    ));
    assert_eq!(server.state().order, vec![50]);

    c.retry_reorder().await.expect("retry");
    assert!(c.pending_reorder().is_some_and(PendingMutation::is_confirmed));
    assert_eq!(server.state().order[..2], [2, 1]);
}

#[tokio::test]
async fn hung_writes_time_out_and_can_be_reverted() {
    let api = FlakyApi::new(service(50));
    let hang = api.hang_writes.clone();
    let mut c = ListController::new(
        api,
        MemoryStore::new(),
        ListOptions::default().with_fetch_timeout_ms(20),
    );
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");
    let before = loaded_ids(&c);

    hang.store(true, Ordering::SeqCst);
    let toggled = tokio::time::timeout(Duration::from_millis(500), c.toggle(1)).await;
    assert!(toggled.expect("bounded").expect("applied locally"));
    let pending = c.selection().pending().expect("tracked");
    assert!(matches!(pending.error(), Some(ClientError::Timeout(20))));

    let dropped = tokio::time::timeout(Duration::from_millis(500), c.drop_item(1, 0)).await;
    dropped.expect("bounded").expect("applied locally");
    let pending = c.pending_reorder().expect("tracked");
    assert!(matches!(pending.error(), Some(ClientError::Timeout(20))));

    c.revert_reorder().expect("revert");
    c.revert_selection().expect("revert");
    assert_eq!(loaded_ids(&c), before);
    assert!(!c.selection().is_selected(1));
    assert!(c.api().inner.state().order.is_empty());
}

#[tokio::test]
async fn selection_is_saved_locally_and_on_the_server() {
    let server = service(100);
    let mut c = ListController::new(server.clone(), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(350);
    c.initialize(0).await.expect("initialize");

    assert!(c.toggle(7).await.expect("toggle"));
    assert!(c.toggle(3).await.expect("toggle"));
    assert_eq!(server.state().selected, vec![3, 7]);
    assert_eq!(
        c.store().get(SELECTED_ITEMS_KEY).expect("get").as_deref(),
        Some("[3,7]")
    );
    assert!(!c.selection().sync().dirty);

    assert!(!c.toggle(7).await.expect("toggle"));
    assert!(c.toggle(7).await.expect("toggle"));
    assert_eq!(server.state().selected, vec![3, 7]);

    let rows = c.visible_rows();
    assert!(matches!(rows[6], RowSlot::Item { selected: true, .. }));
    assert!(matches!(rows[5], RowSlot::Item { selected: false, .. }));

    c.clear_selection().await.expect("clear");
    assert!(server.state().selected.is_empty());
}

#[tokio::test]
async fn select_all_takes_the_filtered_rows() {
    let server = service(100);
    let mut c = ListController::new(server.clone(), MemoryStore::new(), ListOptions::default());
    c.on_viewport_size(35 * 30);
    c.set_search("1").expect("search");
    c.initialize(0).await.expect("initialize");

    c.select_all().await.expect("select all");
    let selected = server.state().selected;
    assert_eq!(selected.len(), 20);
    assert!(selected.iter().all(|id| id.to_string().contains('1')));
    assert_eq!(
        c.store().get(SEARCH_TERM_KEY).expect("get").as_deref(),
        Some("1")
    );
}

#[tokio::test]
async fn failed_selection_push_can_be_reverted() {
    let api = FlakyApi::new(service(100));
    let fail = api.fail_writes.clone();
    let mut c = ListController::new(api, MemoryStore::new(), ListOptions::default());
    c.initialize(0).await.expect("initialize");
    c.toggle(1).await.expect("toggle");

    fail.store(true, Ordering::SeqCst);
    c.toggle(2).await.expect("applied locally");
    assert!(c.selection().is_selected(2));
    assert!(c.selection().pending().is_some_and(PendingMutation::is_failed));
    assert!(c.selection().sync().dirty);

    c.revert_selection().expect("revert");
    assert_eq!(c.selection().selected().to_vec(), vec![1]);
    assert!(!c.selection().sync().dirty);
    assert_eq!(
        c.store().get(SELECTED_ITEMS_KEY).expect("get").as_deref(),
        Some("[1]")
    );
}

#[tokio::test]
async fn unconfirmed_local_selection_wins_at_startup() {
    let server = service(100);
    server.set_selected(vec![1], None).expect("select");
    let mut store = MemoryStore::new();
    store.set(SELECTED_ITEMS_KEY, "[4,7]").expect("set");

    let mut c = ListController::new(server.clone(), store, ListOptions::default());
    c.restore_session().expect("restore");
    assert_eq!(c.initialize(0).await.expect("initialize"), SyncDecision::PushLocal);

    assert_eq!(server.state().selected, vec![4, 7]);
    assert_eq!(c.selection().selected().to_vec(), vec![4, 7]);
    assert_eq!(
        c.selection().sync(),
        SelectionSync {
            version: Some(StateVersion(2)),
            dirty: false
        }
    );
}

#[tokio::test]
async fn confirmed_local_selection_yields_to_the_server() {
    let server = service(100);
    server.set_selected(vec![1, 2], None).expect("select");
    let mut store = MemoryStore::new();
    store.set(SELECTED_ITEMS_KEY, "[4,7]").expect("set");
    store
        .set(SELECTION_SYNC_KEY, r#"{"version":1,"dirty":false}"#)
        .expect("set");
    store.set(SEARCH_TERM_KEY, "").expect("set");

    let mut c = ListController::new(server.clone(), store, ListOptions::default());
    c.restore_session().expect("restore");
    assert_eq!(
        c.initialize(0).await.expect("initialize"),
        SyncDecision::AdoptedServer
    );
    assert_eq!(c.selection().selected().to_vec(), vec![1, 2]);
    assert_eq!(server.state().selected, vec![1, 2]);
    assert_eq!(
        c.store().get(SELECTED_ITEMS_KEY).expect("get").as_deref(),
        Some("[1,2]")
    );
}

#[tokio::test]
async fn restored_search_term_drives_the_first_query() {
    let mut store = MemoryStore::new();
    store.set(SEARCH_TERM_KEY, "99").expect("set");
    let mut c = ListController::new(service(1000), store, ListOptions::default());
    c.restore_session().expect("restore");
    c.initialize(0).await.expect("initialize");

    assert_eq!(c.search(), "99");
    assert_eq!(c.fetcher().cache().total(), 19);
    assert_eq!(loaded_ids(&c)[..3], [99, 199, 299]);
}
