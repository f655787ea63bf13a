//! Settings & Fetch Orchestrator
//!
//! Persists a settings group, runs the one fetch it asks for, and fans the
//! result out to the bubble as [`BusEvent::ContentReplaced`].
//!
//! ```text
//! save(settings)
//!   ├─► store.set_many(entries)          (always)
//!   ├─► fetch_target() == None ─► done   (nothing to fetch)
//!   └─► fetcher(target)
//!         ├─ Ok(items)  ─► normalize ─► publish content-replaced
//!         └─ Err(e)     ─► returned to the caller for a notice
//! ```

use std::sync::Arc;

use crate::bus::{BusEvent, EventBus};
use crate::collaborators::ContentFetcher;
use crate::content::{normalize, ContentItem};
use crate::error::FetchError;
use crate::settings::{FetchTarget, Settings};
use crate::store::{self, KeyValueStore};

/// What a successful save did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Items were fetched and published
    Published {
        /// Number of items after normalization
        items: usize,
    },
    /// The selected source had no URL/handle; only persisted
    NothingToFetch,
}

/// Shared handle that saves settings and publishes fetched content
#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn ContentFetcher>,
    bus: EventBus,
    default_feed_url: String,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        fetcher: Arc<dyn ContentFetcher>,
        bus: EventBus,
        default_feed_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            bus,
            default_feed_url: default_feed_url.into(),
        }
    }

    /// Snapshot of the stored settings
    #[must_use]
    pub fn current(&self) -> Settings {
        Settings::load(self.store.as_ref(), &self.default_feed_url)
    }

    /// Persist `settings` and fetch the selected source
    ///
    /// A store failure is logged and does not prevent the fetch. Only the
    /// fetcher for the selected kind is called.
    pub async fn save(&self, settings: &Settings) -> Result<SaveOutcome, FetchError> {
        let entries = settings
            .store_entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        if let Err(e) = store::persist(self.store.clone(), entries).await {
            tracing::warn!(error = %e, "Failed to persist settings");
        } else {
            tracing::info!(source = %settings.source_kind, "Settings saved");
        }

        let Some(target) = settings.fetch_target() else {
            tracing::debug!(source = %settings.source_kind, "No source configured, skipping fetch");
            return Ok(SaveOutcome::NothingToFetch);
        };

        let items = self.fetch(&target).await?;
        let count = items.len();
        self.bus.publish(BusEvent::ContentReplaced { items });
        Ok(SaveOutcome::Published { items: count })
    }

    /// Run one fetch and normalize the result
    pub async fn fetch(&self, target: &FetchTarget) -> Result<Vec<ContentItem>, FetchError> {
        let result = match target {
            FetchTarget::Feed(url) => self.fetcher.fetch_feed(url).await,
            FetchTarget::Author(source, handle) => self.fetcher.fetch_author(*source, handle).await,
        };
        match result {
            Ok(items) => {
                let items = normalize(items);
                tracing::info!(items = items.len(), "Fetched content");
                Ok(items)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Content fetch failed");
                Err(e)
            }
        }
    }

    /// Fetch the stored feed URL (or the default) for the bubble's first load
    pub async fn fetch_initial(&self) -> Result<Vec<ContentItem>, FetchError> {
        let settings = self.current();
        let url = settings.trimmed().feed_url;
        let url = if url.is_empty() {
            self.default_feed_url.clone()
        } else {
            url
        };
        self.fetch(&FetchTarget::Feed(url)).await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("default_feed_url", &self.default_feed_url)
            .finish_non_exhaustive()
    }
}
