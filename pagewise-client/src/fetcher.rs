use pagewise::{CurrentState, OrderOverride, PageRequest, PageResult};
use pagewise_virtual::RowRange;

use crate::api;
use crate::{ClientCache, ClientError, ItemsApi, Result};

/// Identifies one page fetch and the query it was issued for.
///
/// A response is merged only if its ticket is still the one in flight; anything else is stale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageTicket {
    pub request: PageRequest,
    pub generation: u64,
    /// Page 1 is fetched together with the saved order/selection state.
    pub with_state: bool,
}

impl PageTicket {
    pub fn page(&self) -> usize {
        self.request.page
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was stored in the cache.
    Merged { page: usize, rows: usize },
    /// The response belonged to an abandoned fetch or an old query and was dropped.
    Stale,
    /// Another fetch was already in flight; nothing was requested.
    Busy,
}

/// The most recent fetch failure for the current query.
#[derive(Clone, Debug)]
pub struct LoadFailure {
    pub page: usize,
    pub generation: u64,
    pub error: ClientError,
    pub at_ms: u64,
}

#[derive(Clone, Debug)]
struct InFlight {
    ticket: PageTicket,
    started_ms: u64,
}

/// Accumulates server pages into a [`ClientCache`] for the search term in effect.
///
/// This is a headless state machine: `begin_load` hands out a ticket, the adapter performs the
/// request however it likes, then reports back with `complete_load` or `fail_load`.
/// [`Self::load_page`] does all three with the given [`ItemsApi`].
#[derive(Clone, Debug)]
pub struct WindowFetcher {
    cache: ClientCache,
    search: String,
    generation: u64,
    current_page: usize,
    in_flight: Option<InFlight>,
    timeout_ms: u64,
    last_failure: Option<LoadFailure>,
    last_state: Option<CurrentState>,
}

impl WindowFetcher {
    pub fn new(page_size: usize, timeout_ms: u64) -> Self {
        Self {
            cache: ClientCache::new(page_size),
            search: String::new(),
            generation: 0,
            current_page: 0,
            in_flight: None,
            timeout_ms,
            last_failure: None,
            last_state: None,
        }
    }

    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut ClientCache {
        &mut self.cache
    }

    pub fn page_size(&self) -> usize {
        self.cache.page_size()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Highest page merged into the cache for the current query (0 before the first).
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// Upper bound on each api call, in milliseconds.
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_failure(&self) -> Option<&LoadFailure> {
        self.last_failure.as_ref()
    }

    /// Order/selection state received with the latest first page.
    pub fn last_state(&self) -> Option<&CurrentState> {
        self.last_state.as_ref()
    }

    /// Switches to a new search term. Returns `false` if the term is unchanged.
    ///
    /// The cache is emptied and any fetch in flight becomes stale.
    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let search = search.into();
        if search == self.search {
            return false;
        }
        tracing::debug!(target: "pagewise_client", %search, "search changed");
        self.search = search;
        self.reset();
        true
    }

    /// Forgets every fetched page of the current query so it is fetched again from page 1.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.cache.clear();
        self.current_page = 0;
        self.in_flight = None;
        self.last_failure = None;
    }

    /// Starts fetching `page` unless a fetch is already in flight.
    pub fn begin_load(&mut self, page: usize, now_ms: u64) -> Option<PageTicket> {
        if self.in_flight.is_some() || page == 0 {
            return None;
        }
        let ticket = PageTicket {
            request: PageRequest::new(page, self.cache.page_size(), self.search.clone()),
            generation: self.generation,
            with_state: page == 1,
        };
        tracing::trace!(target: "pagewise_client", page, generation = self.generation, "begin_load");
        self.in_flight = Some(InFlight {
            ticket: ticket.clone(),
            started_ms: now_ms,
        });
        Some(ticket)
    }

    /// Merges a successful response.
    ///
    /// Page 1 replaces the cache. Its rows must already be in the order the accompanying state
    /// describes; if another writer saved between the two requests they are not, and the response
    /// is dropped as [`LoadOutcome::Stale`] so the trigger asks for page 1 again.
    pub fn complete_load(
        &mut self,
        ticket: PageTicket,
        result: PageResult,
        state: Option<CurrentState>,
    ) -> LoadOutcome {
        if !self.is_current(&ticket) {
            tracing::debug!(
                target: "pagewise_client",
                page = ticket.page(),
                generation = ticket.generation,
                "discarding stale page"
            );
            return LoadOutcome::Stale;
        }
        self.in_flight = None;
        self.last_failure = None;

        let page = ticket.page();
        let items = result.items;
        let rows = items.len();
        if page == 1 {
            if let Some(state) = &state {
                let order = OrderOverride::new(state.order.clone());
                let mut sorted = items.clone();
                order.sort_items(&mut sorted);
                if sorted != items {
                    tracing::warn!(
                        target: "pagewise_client",
                        order_version = state.order_version.0,
                        "first page disagrees with the saved order; refetching"
                    );
                    return LoadOutcome::Stale;
                }
            }
            self.cache.replace(items, result.total);
            self.current_page = 1;
        } else {
            self.cache.merge(page, items, result.total);
            self.current_page = self.current_page.max(page);
        }
        if state.is_some() {
            self.last_state = state;
        }
        LoadOutcome::Merged { page, rows }
    }

    /// Records a failed fetch. Returns `false` if the ticket was already stale.
    pub fn fail_load(&mut self, ticket: &PageTicket, error: ClientError, now_ms: u64) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        tracing::warn!(
            target: "pagewise_client",
            page = ticket.page(),
            %error,
            "page fetch failed"
        );
        self.in_flight = None;
        self.last_failure = Some(LoadFailure {
            page: ticket.page(),
            generation: ticket.generation,
            error,
            at_ms: now_ms,
        });
        true
    }

    /// Abandons a fetch that has been running for longer than the timeout.
    ///
    /// Returns `true` if a fetch was abandoned; its response will be discarded if it arrives.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        let Some(in_flight) = &self.in_flight else {
            return false;
        };
        if now_ms.saturating_sub(in_flight.started_ms) < self.timeout_ms {
            return false;
        }
        let ticket = in_flight.ticket.clone();
        self.fail_load(&ticket, ClientError::Timeout(self.timeout_ms), now_ms)
    }

    /// Infinite-scroll rule: the page holding the last rendered row, if it lies past the
    /// highest page merged so far.
    ///
    /// Level-triggered: calling it again with the same input never yields a page that is
    /// already loaded or loading.
    pub fn page_to_load(&self, last_visible_index: usize) -> Option<usize> {
        if self.in_flight.is_some() || self.cache.loaded_len() >= self.cache.total() {
            return None;
        }
        let page = last_visible_index / self.cache.page_size() + 1;
        (page > self.current_page && !self.failed(page)).then_some(page)
    }

    /// The first page intersecting `range` that is missing from the cache.
    ///
    /// Covers holes left behind when a jump-scroll fetched a page far below `current_page`.
    pub fn backfill_page(&self, range: RowRange) -> Option<usize> {
        if self.in_flight.is_some() {
            return None;
        }
        let last = range.last()?;
        let total = self.cache.total();
        let first_page = self.cache.page_of(range.start_index);
        let last_page = self.cache.page_of(last);
        (first_page..=last_page).find(|&page| {
            let first_row = (page - 1) * self.cache.page_size();
            first_row < total && !self.cache.has_page(page) && !self.failed(page)
        })
    }

    /// The page the renderer needs next for the rows in `range`, if any.
    pub fn next_page(&self, range: RowRange) -> Option<usize> {
        if self.in_flight.is_some() {
            return None;
        }
        if self.current_page == 0 {
            return (!self.failed(1)).then_some(1);
        }
        range
            .last()
            .and_then(|last| self.page_to_load(last))
            .or_else(|| self.backfill_page(range))
    }

    /// Forgets the recorded failure so the trigger may request that page again.
    pub fn clear_failure(&mut self) -> Option<LoadFailure> {
        self.last_failure.take()
    }

    /// Fetches `page` through `api`, bounded by the configured timeout.
    pub async fn load_page<A: ItemsApi + ?Sized>(
        &mut self,
        api: &A,
        page: usize,
        now_ms: u64,
    ) -> Result<LoadOutcome> {
        let Some(ticket) = self.begin_load(page, now_ms) else {
            return Ok(LoadOutcome::Busy);
        };
        let fetched = api::bounded(self.timeout_ms, fetch(api, &ticket)).await;
        match fetched {
            Ok((result, state)) => Ok(self.complete_load(ticket, result, state)),
            Err(e) => {
                self.fail_load(&ticket, e.clone(), now_ms);
                Err(e)
            }
        }
    }

    fn is_current(&self, ticket: &PageTicket) -> bool {
        ticket.generation == self.generation
            && self
                .in_flight
                .as_ref()
                .is_some_and(|f| f.ticket == *ticket)
    }

    fn failed(&self, page: usize) -> bool {
        self.last_failure
            .as_ref()
            .is_some_and(|f| f.page == page && f.generation == self.generation)
    }
}

async fn fetch<A: ItemsApi + ?Sized>(
    api: &A,
    ticket: &PageTicket,
) -> Result<(PageResult, Option<CurrentState>)> {
    if ticket.with_state {
        let (items, state) = tokio::join!(api.get_items(&ticket.request), api.get_state());
        Ok((items?, Some(state?)))
    } else {
        Ok((api.get_items(&ticket.request).await?, None))
    }
}
