//! Queries that re-run whenever the store reports a relevant change.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::app::{LisuError, Result};
use crate::domain::{HistoryKey, ReadingHistoryEntry, ServerBookmark};
use crate::store::{LibraryStore, StoreChange};

type Filter = Box<dyn Fn(&StoreChange) -> bool + Send + Sync>;

pub struct LiveQuery<S: ?Sized, T> {
    store: Arc<S>,
    changes: broadcast::Receiver<StoreChange>,
    filter: Filter,
    query: Box<dyn Fn(&S) -> Result<T> + Send + Sync>,
}

impl<S, T> LiveQuery<S, T>
where
    S: LibraryStore + ?Sized,
{
    pub fn new<F, Q>(store: Arc<S>, filter: F, query: Q) -> Self
    where
        F: Fn(&StoreChange) -> bool + Send + Sync + 'static,
        Q: Fn(&S) -> Result<T> + Send + Sync + 'static,
    {
        let changes = store.subscribe();
        Self {
            store,
            changes,
            filter: Box::new(filter),
            query: Box::new(query),
        }
    }

    pub fn current(&self) -> Result<T> {
        (self.query)(self.store.as_ref())
    }

    /// Waits for the next relevant change and returns the refreshed value.
    ///
    /// Missed notifications (a lagging receiver) trigger a refresh as well,
    /// since the value may have changed in the gap.
    pub async fn changed(&mut self) -> Result<T> {
        loop {
            match self.changes.recv().await {
                Ok(change) if (self.filter)(&change) => return self.current(),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Live query lagged behind by {} changes", skipped);
                    return self.current();
                }
                Err(RecvError::Closed) => return Err(LisuError::Closed),
            }
        }
    }
}

/// All server bookmarks, in display order.
pub fn servers<S>(store: Arc<S>) -> LiveQuery<S, Vec<ServerBookmark>>
where
    S: LibraryStore + ?Sized + 'static,
{
    LiveQuery::new(
        store,
        |change| *change == StoreChange::Servers,
        |store: &S| store.get_servers(),
    )
}

/// Reading history of one server, most recent first.
pub fn history<S>(store: Arc<S>, server_id: i64) -> LiveQuery<S, Vec<ReadingHistoryEntry>>
where
    S: LibraryStore + ?Sized + 'static,
{
    LiveQuery::new(
        store,
        move |change| matches!(change, StoreChange::History { server_id: id } if *id == server_id),
        move |store: &S| store.get_history(server_id),
    )
}

pub fn history_entry<S>(store: Arc<S>, key: HistoryKey) -> LiveQuery<S, Option<ReadingHistoryEntry>>
where
    S: LibraryStore + ?Sized + 'static,
{
    let server_id = key.server_id;
    LiveQuery::new(
        store,
        move |change| matches!(change, StoreChange::History { server_id: id } if *id == server_id),
        move |store: &S| store.get_history_entry(&key),
    )
}
