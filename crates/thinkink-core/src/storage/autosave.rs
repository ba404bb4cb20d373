//! Periodic autosave and one-shot hydration of the element collection.
//!
//! The whole collection is saved under [`STORAGE_KEY`] on a fixed timer,
//! but only while it is non-empty. Failures are logged and swallowed; the
//! in-memory store stays authoritative.

use crate::document::Document;
use crate::element::Element;
use crate::storage::{Storage, StorageError, StorageResult};
use crate::store::ElementStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 5;

/// Key the collection is persisted under.
pub const STORAGE_KEY: &str = "think-canvas-data";

/// Manages automatic persistence of the element collection.
pub struct AutoSaveManager<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    hydrated: bool,
}

impl<S: Storage> AutoSaveManager<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            hydrated: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Whether the timer has elapsed at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_save {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Save if the timer has elapsed and there is anything to save.
    /// Returns true when a save succeeded.
    pub async fn maybe_save(&mut self, elements: &[Element], now: Instant) -> bool {
        if elements.is_empty() || !self.is_due(now) {
            return false;
        }
        self.last_save = Some(now);
        match self.save(elements).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Autosave failed: {}", e);
                false
            }
        }
    }

    /// Save immediately.
    pub async fn save(&mut self, elements: &[Element]) -> StorageResult<()> {
        let document = Document::new(elements.to_vec());
        self.storage.save(STORAGE_KEY, &document).await?;
        log::debug!("Autosaved {} elements", elements.len());
        Ok(())
    }

    /// Load the saved collection into `store`, at most once per manager.
    ///
    /// Missing or unreadable data is treated as absent. Returns true when
    /// elements were restored.
    pub async fn hydrate(&mut self, store: &mut ElementStore) -> bool {
        if self.hydrated {
            return false;
        }
        self.hydrated = true;

        match self.storage.load(STORAGE_KEY).await {
            Ok(document) if !document.is_empty() => {
                log::info!("Restored {} elements from local storage", document.elements.len());
                store.set_elements(Arc::new(document.elements));
                true
            }
            Ok(_) => false,
            Err(StorageError::NotFound(_)) => false,
            Err(e) => {
                log::warn!("Ignoring saved data: {}", e);
                false
            }
        }
    }

    /// Remove the saved collection.
    pub async fn clear_saved(&self) -> StorageResult<()> {
        self.storage.delete(STORAGE_KEY).await
    }
}
