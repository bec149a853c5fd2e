//! Sync orchestration.
//!
//! One cycle runs strictly in order: resolve the latest identifier, check
//! the cache, download and decode if stale, persist, then publish. The
//! published [`CatalogView`] is swapped atomically, so searches issued while a
//! cycle is in flight keep answering from the previous catalog.
//!
//! Every failure is absorbed here. A failed cycle ends in
//! [`SyncState::Failed`] but still publishes the last good data it can find,
//! marked [`Freshness::Fallback`], so callers can tell "possibly stale" apart
//! from "fresh".

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use lista_core::{Catalog, SnapshotId};
use tokio::sync::watch;

use crate::cache::{CacheEntry, SnapshotCache};
use crate::client::FeedClient;
use crate::error::FeedError;
use crate::search::{Query, SearchIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Resolving,
    CacheHit,
    Fetching,
    Ready,
    Failed,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SyncState::Idle => "idle",
            SyncState::Resolving => "resolving",
            SyncState::CacheHit => "cache-hit",
            SyncState::Fetching => "fetching",
            SyncState::Ready => "ready",
            SyncState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// How far the published data can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Matches the identifier the locator reported in the last cycle.
    Fresh,
    /// Last good data kept after a failed cycle; may be out of date.
    Fallback,
    /// No data at all.
    Empty,
}

/// The catalog currently exposed to renderers, with its search index.
#[derive(Debug, Clone)]
pub struct CatalogView {
    identifier: Option<SnapshotId>,
    index: SearchIndex,
    freshness: Freshness,
}

impl CatalogView {
    fn new(identifier: SnapshotId, catalog: Catalog, freshness: Freshness) -> Self {
        Self {
            identifier: Some(identifier),
            index: SearchIndex::new(catalog),
            freshness,
        }
    }

    fn empty() -> Self {
        Self {
            identifier: None,
            index: SearchIndex::default(),
            freshness: Freshness::Empty,
        }
    }

    fn downgraded(&self) -> Self {
        Self {
            freshness: Freshness::Fallback,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&SnapshotId> {
        self.identifier.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.index.catalog()
    }

    #[must_use]
    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    /// Date token of the snapshot identifier, e.g. `"24-06-25"`.
    #[must_use]
    pub fn date_label(&self) -> Option<&str> {
        self.identifier.as_ref().and_then(SnapshotId::date)
    }

    #[must_use]
    pub fn search(&self, raw_query: &str) -> Catalog {
        self.index.search(&Query::parse(raw_query))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new snapshot was downloaded and published.
    Fetched,
    /// The cached snapshot was current; nothing was downloaded.
    CacheHit,
    /// The cycle failed; see [`SyncReport::error`].
    Failed,
    /// Another cycle was already running, or this one was overtaken.
    Skipped,
}

#[derive(Debug)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// States entered during this cycle, in order.
    pub transitions: Vec<SyncState>,
    pub error: Option<FeedError>,
    /// The view published when the cycle ended.
    pub view: Arc<CatalogView>,
}

impl SyncReport {
    /// Terminal state of the cycle, or `None` when it was skipped outright.
    #[must_use]
    pub fn final_state(&self) -> Option<SyncState> {
        self.transitions.last().copied()
    }
}

/// Owns the feed client, the snapshot cache and the session state.
pub struct SyncOrchestrator<C> {
    client: FeedClient,
    cache: C,
    view: RwLock<Arc<CatalogView>>,
    state: watch::Sender<SyncState>,
    /// Bumped at the start of every cycle; a cycle publishes only while it
    /// is still the latest.
    generation: AtomicU64,
    in_flight: tokio::sync::Mutex<()>,
}

impl<C: SnapshotCache> SyncOrchestrator<C> {
    pub fn new(client: FeedClient, cache: C) -> Self {
        let (state, _) = watch::channel(SyncState::Idle);
        Self {
            client,
            cache,
            view: RwLock::new(Arc::new(CatalogView::empty())),
            state,
            generation: AtomicU64::new(0),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Receives every state change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn view(&self) -> Arc<CatalogView> {
        Arc::clone(&self.view.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Searches whatever catalog is published right now.
    #[must_use]
    pub fn search(&self, raw_query: &str) -> Catalog {
        self.view().search(raw_query)
    }

    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Runs one sync cycle. Never fails; the outcome is in the report.
    ///
    /// A call made while another cycle is in flight returns immediately
    /// with [`SyncOutcome::Skipped`].
    pub async fn sync(&self) -> SyncReport {
        let Ok(_running) = self.in_flight.try_lock() else {
            tracing::debug!("sync already in flight; ignoring trigger");
            return self.report(SyncOutcome::Skipped, Vec::new(), None);
        };

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let mut transitions = Vec::new();
        self.enter(&mut transitions, SyncState::Resolving);

        let identifier = match self.client.resolve_latest().await {
            Ok(identifier) => identifier,
            Err(err) => return self.fail(transitions, err),
        };
        tracing::info!(%identifier, "resolved latest snapshot");

        if let Some(entry) = self.fresh_entry(&identifier) {
            self.enter(&mut transitions, SyncState::CacheHit);
            tracing::info!(
                %identifier,
                products = entry.catalog.len(),
                "cached snapshot is current; skipping download"
            );
            self.publish(CatalogView::new(
                entry.identifier,
                entry.catalog,
                Freshness::Fresh,
            ));
            self.enter(&mut transitions, SyncState::Ready);
            return self.report(SyncOutcome::CacheHit, transitions, None);
        }

        self.enter(&mut transitions, SyncState::Fetching);
        let catalog = match self.client.fetch_snapshot(&identifier).await {
            Ok(catalog) => catalog,
            Err(err) => return self.fail(transitions, err),
        };

        // A newer cycle owns the state and the view; leave both to it.
        if self.generation.load(Ordering::Acquire) != generation {
            tracing::warn!(%identifier, "discarding snapshot fetched by a superseded cycle");
            return self.report(SyncOutcome::Skipped, transitions, None);
        }

        if let Err(err) = self.cache.put(&identifier, &catalog) {
            tracing::warn!(
                %identifier,
                error = %err,
                "could not persist snapshot; keeping it in memory only"
            );
        }

        tracing::info!(%identifier, products = catalog.len(), "published new snapshot");
        self.publish(CatalogView::new(identifier, catalog, Freshness::Fresh));
        self.enter(&mut transitions, SyncState::Ready);
        self.report(SyncOutcome::Fetched, transitions, None)
    }

    /// Returns the cached entry if it matches `identifier`. Read errors
    /// count as a miss.
    fn fresh_entry(&self, identifier: &SnapshotId) -> Option<CacheEntry> {
        match self.cache.get() {
            Ok(Some(entry)) if entry.identifier == *identifier => Some(entry),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, "snapshot cache unreadable; fetching instead");
                None
            }
        }
    }

    fn fail(&self, mut transitions: Vec<SyncState>, err: FeedError) -> SyncReport {
        tracing::warn!(kind = ?err.kind(), error = %err, "sync failed");

        let current = self.view();
        let fallback = if current.freshness() == Freshness::Empty {
            match self.cache.get() {
                Ok(Some(entry)) => {
                    CatalogView::new(entry.identifier, entry.catalog, Freshness::Fallback)
                }
                Ok(None) => CatalogView::empty(),
                Err(cache_err) => {
                    tracing::warn!(error = %cache_err, "snapshot cache unreadable; no fallback data");
                    CatalogView::empty()
                }
            }
        } else {
            current.downgraded()
        };

        self.publish(fallback);
        self.enter(&mut transitions, SyncState::Failed);
        self.report(SyncOutcome::Failed, transitions, Some(err))
    }

    fn enter(&self, transitions: &mut Vec<SyncState>, state: SyncState) {
        tracing::debug!(%state, "sync state changed");
        transitions.push(state);
        self.state.send_replace(state);
    }

    fn publish(&self, view: CatalogView) {
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(view);
    }

    fn report(
        &self,
        outcome: SyncOutcome,
        transitions: Vec<SyncState>,
        error: Option<FeedError>,
    ) -> SyncReport {
        SyncReport {
            outcome,
            transitions,
            error,
            view: self.view(),
        }
    }
}
