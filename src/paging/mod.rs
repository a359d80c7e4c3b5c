//! Paginated remote lists.
//!
//! A [`PagedList`] owns the cursor and accumulated items for one screen's
//! worth of results and pulls pages from an injected [`PageSource`]. It
//! allows one request in flight at a time; overlapping calls return
//! [`PageLoad::Busy`] without touching state. A page is committed all at
//! once after it arrives, so dropping an in-flight call leaves the list as
//! it was.

pub mod sources;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::outcome::{Failure, Outcome};

pub use sources::{latest, popular, search, FnSource, LatestSource, PopularSource, SearchSource};

pub const FIRST_PAGE: u32 = 1;

#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Outcome<Vec<T>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    LoadingMore,
    Error,
}

/// What a load call did.
#[derive(Debug, Clone, PartialEq)]
pub enum PageLoad {
    /// A page with `count` items was committed.
    Loaded { count: usize },
    /// The source has no more pages; nothing was appended.
    Exhausted,
    /// Another request was in flight; this call was ignored.
    Busy,
    Failed(Failure),
}

#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub phase: Phase,
    pub exhausted: bool,
    pub error: Option<Failure>,
}

struct ListState<T> {
    items: Vec<T>,
    page: u32,
    phase: Phase,
    exhausted: bool,
    error: Option<Failure>,
}

pub struct PagedList<T> {
    source: Arc<dyn PageSource<T>>,
    state: Mutex<ListState<T>>,
    in_flight: AtomicBool,
}

/// Held while a request is outstanding. Releases the in-flight flag on drop
/// and, if the request never settled, puts the phase back.
struct Flight<'a, T> {
    list: &'a PagedList<T>,
    previous: Phase,
    settled: bool,
}

impl<T> Drop for Flight<'_, T> {
    fn drop(&mut self) {
        if !self.settled {
            self.list.lock().phase = self.previous;
        }
        self.list.in_flight.store(false, Ordering::Release);
    }
}

impl<T> PagedList<T> {
    pub fn new<S>(source: S) -> Self
    where
        S: PageSource<T> + 'static,
    {
        Self::with_source(Arc::new(source))
    }

    pub fn with_source(source: Arc<dyn PageSource<T>>) -> Self {
        Self {
            source,
            state: Mutex::new(ListState {
                items: Vec::new(),
                page: 0,
                phase: Phase::Idle,
                exhausted: false,
                error: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, phase: Phase) -> Option<Flight<'_, T>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;

        let mut state = self.lock();
        let previous = state.phase;
        state.phase = phase;
        Some(Flight {
            list: self,
            previous,
            settled: false,
        })
    }

    /// Loads page 1, replacing whatever was accumulated. On failure the
    /// previous items stay in place.
    pub async fn load_result(&self) -> PageLoad {
        let Some(mut flight) = self.begin(Phase::Loading) else {
            tracing::debug!("Load ignored: request already in flight");
            return PageLoad::Busy;
        };

        let outcome = self.source.fetch_page(FIRST_PAGE).await;

        let mut state = self.lock();
        flight.settled = true;
        match outcome {
            Outcome::Success(items) => {
                let count = items.len();
                state.items = items;
                state.page = FIRST_PAGE;
                state.exhausted = count == 0;
                state.phase = Phase::Loaded;
                state.error = None;
                if count == 0 {
                    PageLoad::Exhausted
                } else {
                    PageLoad::Loaded { count }
                }
            }
            Outcome::Error(failure) => {
                tracing::warn!("Failed to load first page: {}", failure);
                state.phase = Phase::Error;
                state.error = Some(failure.clone());
                PageLoad::Failed(failure)
            }
        }
    }

    /// Fetches the page after the cursor and appends it. An empty page marks
    /// the list exhausted; later calls return [`PageLoad::Exhausted`] without
    /// asking the source.
    pub async fn fetch_more_result(&self) -> PageLoad {
        let Some(mut flight) = self.begin(Phase::LoadingMore) else {
            tracing::debug!("Fetch ignored: request already in flight");
            return PageLoad::Busy;
        };

        let next = {
            let state = self.lock();
            if state.exhausted {
                drop(state);
                return PageLoad::Exhausted;
            }
            state.page + 1
        };

        let outcome = self.source.fetch_page(next).await;

        let mut state = self.lock();
        flight.settled = true;
        match outcome {
            Outcome::Success(items) if items.is_empty() => {
                tracing::debug!("Page {} is empty, no more pages", next);
                state.exhausted = true;
                state.phase = Phase::Loaded;
                state.error = None;
                PageLoad::Exhausted
            }
            Outcome::Success(items) => {
                let count = items.len();
                state.items.extend(items);
                state.page = next;
                state.phase = Phase::Loaded;
                state.error = None;
                PageLoad::Loaded { count }
            }
            Outcome::Error(failure) => {
                tracing::warn!("Failed to fetch page {}: {}", next, failure);
                state.phase = Phase::Error;
                state.error = Some(failure.clone());
                PageLoad::Failed(failure)
            }
        }
    }

    pub fn page(&self) -> u32 {
        self.lock().page
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_exhausted(&self) -> bool {
        self.lock().exhausted
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    pub fn last_error(&self) -> Option<Failure> {
        self.lock().error.clone()
    }
}

impl<T: Clone> PagedList<T> {
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        let state = self.lock();
        Snapshot {
            items: state.items.clone(),
            page: state.page,
            phase: state.phase,
            exhausted: state.exhausted,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::LisuError;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    /// Replays scripted pages, optionally waiting for a permit before each.
    struct ScriptedSource {
        pages: Mutex<VecDeque<Outcome<Vec<u32>>>>,
        requested: Arc<Mutex<Vec<u32>>>,
        gate: Option<Arc<Semaphore>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Outcome<Vec<u32>>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                requested: Arc::new(Mutex::new(Vec::new())),
                gate: None,
            }
        }

        fn gated(pages: Vec<Outcome<Vec<u32>>>, gate: Arc<Semaphore>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::new(pages)
            }
        }
    }

    #[async_trait]
    impl PageSource<u32> for ScriptedSource {
        async fn fetch_page(&self, page: u32) -> Outcome<Vec<u32>> {
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            self.requested.lock().unwrap().push(page);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Outcome::Success(Vec::new()))
        }
    }

    fn fail() -> Outcome<Vec<u32>> {
        Outcome::failed(LisuError::Other("timeout".into()))
    }

    #[tokio::test]
    async fn test_load_sets_cursor_to_first_page() {
        let list = PagedList::new(ScriptedSource::new(vec![Outcome::Success(vec![1, 2, 3])]));
        assert_eq!(list.phase(), Phase::Idle);
        assert_eq!(list.page(), 0);

        assert_eq!(list.load_result().await, PageLoad::Loaded { count: 3 });
        assert_eq!(list.page(), 1);
        assert_eq!(list.phase(), Phase::Loaded);
        assert_eq!(list.items(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fetch_more_appends_in_order() {
        let source = ScriptedSource::new(vec![
            Outcome::Success(vec![1, 2]),
            Outcome::Success(vec![3, 4]),
            Outcome::Success(vec![5]),
        ]);
        let requested = source.requested.clone();
        let list = PagedList::new(source);

        list.load_result().await;
        assert_eq!(list.fetch_more_result().await, PageLoad::Loaded { count: 2 });
        assert_eq!(list.page(), 2);
        assert_eq!(list.fetch_more_result().await, PageLoad::Loaded { count: 1 });
        assert_eq!(list.page(), 3);

        assert_eq!(list.items(), vec![1, 2, 3, 4, 5]);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_page_exhausts_without_error() {
        let source = ScriptedSource::new(vec![
            Outcome::Success(vec![1, 2]),
            Outcome::Success(vec![]),
        ]);
        let requested = source.requested.clone();
        let list = PagedList::new(source);

        list.load_result().await;
        assert_eq!(list.fetch_more_result().await, PageLoad::Exhausted);
        assert!(list.is_exhausted());
        assert_eq!(list.phase(), Phase::Loaded);
        assert_eq!(list.page(), 1);
        assert_eq!(list.items(), vec![1, 2]);
        assert!(list.last_error().is_none());

        // No further requests once exhausted
        assert_eq!(list.fetch_more_result().await, PageLoad::Exhausted);
        assert_eq!(list.page(), 1);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_empty_first_page_exhausts() {
        let list = PagedList::new(ScriptedSource::new(vec![Outcome::Success(vec![])]));

        assert_eq!(list.load_result().await, PageLoad::Exhausted);
        assert!(list.is_empty());
        assert!(list.is_exhausted());
        assert_eq!(list.fetch_more_result().await, PageLoad::Exhausted);
    }

    #[tokio::test]
    async fn test_reload_clears_exhaustion() {
        let list = PagedList::new(ScriptedSource::new(vec![
            Outcome::Success(vec![1]),
            Outcome::Success(vec![]),
            Outcome::Success(vec![7, 8]),
            Outcome::Success(vec![9]),
        ]));

        list.load_result().await;
        list.fetch_more_result().await;
        assert!(list.is_exhausted());

        assert_eq!(list.load_result().await, PageLoad::Loaded { count: 2 });
        assert!(!list.is_exhausted());
        assert_eq!(list.items(), vec![7, 8]);
        assert_eq!(list.fetch_more_result().await, PageLoad::Loaded { count: 1 });
        assert_eq!(list.items(), vec![7, 8, 9]);
    }

    #[tokio::test]
    async fn test_fetch_more_failure_keeps_list_and_cursor() {
        let list = PagedList::new(ScriptedSource::new(vec![
            Outcome::Success(vec![1, 2]),
            fail(),
            Outcome::Success(vec![3]),
        ]));

        list.load_result().await;
        let result = list.fetch_more_result().await;
        let PageLoad::Failed(failure) = result else {
            panic!("expected failure, got {:?}", result);
        };
        assert_eq!(failure.to_string(), "timeout");

        let snapshot = list.snapshot();
        assert_eq!(snapshot.items, vec![1, 2]);
        assert_eq!(snapshot.page, 1);
        assert_eq!(snapshot.phase, Phase::Error);
        assert_eq!(snapshot.error, Some(failure));

        // Retrying asks for the same page again
        assert_eq!(list.fetch_more_result().await, PageLoad::Loaded { count: 1 });
        assert_eq!(list.page(), 2);
        assert!(list.last_error().is_none());
    }

    #[tokio::test]
    async fn test_load_failure_keeps_previous_items() {
        let list = PagedList::new(ScriptedSource::new(vec![
            Outcome::Success(vec![1, 2]),
            fail(),
        ]));

        list.load_result().await;
        assert!(matches!(list.load_result().await, PageLoad::Failed(_)));
        assert_eq!(list.phase(), Phase::Error);
        assert_eq!(list.items(), vec![1, 2]);
        assert_eq!(list.page(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_requests_are_ignored() {
        let gate = Arc::new(Semaphore::new(0));
        let source = ScriptedSource::gated(vec![Outcome::Success(vec![1, 2])], gate.clone());
        let requested = source.requested.clone();
        let list = Arc::new(PagedList::new(source));

        let background = list.clone();
        let handle = tokio::spawn(async move { background.load_result().await });

        while list.phase() != Phase::Loading {
            tokio::task::yield_now().await;
        }
        assert_eq!(list.fetch_more_result().await, PageLoad::Busy);
        assert_eq!(list.load_result().await, PageLoad::Busy);

        gate.add_permits(1);
        assert_eq!(handle.await.unwrap(), PageLoad::Loaded { count: 2 });
        assert_eq!(list.page(), 1);
        assert_eq!(*requested.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_commits_nothing() {
        let gate = Arc::new(Semaphore::new(0));
        let list = PagedList::new(ScriptedSource::gated(
            vec![Outcome::Success(vec![1, 2])],
            gate.clone(),
        ));

        let cancelled = tokio::time::timeout(Duration::from_millis(20), list.load_result()).await;
        assert!(cancelled.is_err());
        assert_eq!(list.phase(), Phase::Idle);
        assert_eq!(list.page(), 0);
        assert!(list.is_empty());

        gate.add_permits(1);
        assert_eq!(list.load_result().await, PageLoad::Loaded { count: 2 });
    }

    #[tokio::test]
    async fn test_cancelled_fetch_more_commits_nothing() {
        let gate = Arc::new(Semaphore::new(1));
        let source = ScriptedSource::gated(
            vec![Outcome::Success(vec![1, 2]), Outcome::Success(vec![3, 4])],
            gate.clone(),
        );
        let requested = source.requested.clone();
        let list = PagedList::new(source);
        assert_eq!(list.load_result().await, PageLoad::Loaded { count: 2 });

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), list.fetch_more_result()).await;
        assert!(cancelled.is_err());

        let snapshot = list.snapshot();
        assert_eq!(snapshot.items, vec![1, 2]);
        assert_eq!(snapshot.page, 1);
        assert_eq!(snapshot.phase, Phase::Loaded);
        assert!(!snapshot.exhausted);
        assert!(snapshot.error.is_none());

        // The guard was released, so the next call goes through
        gate.add_permits(1);
        assert_eq!(list.fetch_more_result().await, PageLoad::Loaded { count: 2 });
        assert_eq!(list.items(), vec![1, 2, 3, 4]);
        assert_eq!(list.page(), 2);
        assert_eq!(*requested.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_fetch_more_before_load_starts_at_first_page() {
        let source = ScriptedSource::new(vec![Outcome::Success(vec![4])]);
        let requested = source.requested.clone();
        let list = PagedList::new(source);

        let result = tokio_test::block_on(list.fetch_more_result());
        assert_eq!(result, PageLoad::Loaded { count: 1 });
        assert_eq!(list.page(), 1);
        assert_eq!(*requested.lock().unwrap(), vec![1]);
    }
}
