//! Snapshot refresh background task
//!
//! This module provides SnapshotRefresher that runs in a background thread
//! and periodically pulls the latest transaction snapshot from a
//! [`SnapshotProvider`] into a [`SnapshotCache`].
//!
//! # Design Notes
//!
//! - Refreshes immediately on start so the cache warms as early as possible
//! - Never blocks readers: publishing is a single `Arc` swap
//! - Provider failures are logged and retried on the next tick
//! - Graceful shutdown via atomic flag

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use txfilter_core::{Result, TransactionSnapshot};

use crate::cache::SnapshotCache;

/// Where published snapshots come from (the transaction manager)
pub trait SnapshotProvider: Send + Sync {
    /// Fetch the newest snapshot, `None` if none exists yet
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot could not be read.
    fn fetch(&self) -> Result<Option<TransactionSnapshot>>;
}

/// Background snapshot refresh task
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use txfilter_processor::{SnapshotCache, SnapshotRefresher};
///
/// let cache = Arc::new(SnapshotCache::new());
/// let refresher = SnapshotRefresher::new(provider, Arc::clone(&cache), Duration::from_secs(15));
/// let handle = refresher.start();
///
/// // ... serve requests ...
///
/// refresher.shutdown();
/// handle.join().unwrap();
/// ```
pub struct SnapshotRefresher {
    provider: Arc<dyn SnapshotProvider>,
    cache: Arc<SnapshotCache>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
}

impl SnapshotRefresher {
    /// Create a refresher polling `provider` every `interval`
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        cache: Arc<SnapshotCache>,
        interval: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            interval,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fetch once and publish
    ///
    /// Returns whether a new snapshot was installed.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub fn refresh_once(&self) -> Result<bool> {
        refresh(self.provider.as_ref(), &self.cache)
    }

    /// Start the background refresh task
    ///
    /// The thread runs until `shutdown()` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        thread::spawn(move || {
            while !shutdown.load(Ordering::Relaxed) {
                if let Err(e) = refresh(provider.as_ref(), &cache) {
                    tracing::warn!(error = %e, "Failed to refresh transaction snapshot");
                }

                // Sleep in small steps to notice shutdown promptly
                let step = Duration::from_millis(50).min(interval);
                let mut elapsed = Duration::ZERO;
                while elapsed < interval {
                    if shutdown.load(Ordering::Relaxed) {
                        return;
                    }
                    thread::sleep(step);
                    elapsed += step;
                }
            }
        })
    }

    /// Signal shutdown
    ///
    /// After calling this, the background thread exits on its next check.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Check if shutdown has been signaled
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn refresh(provider: &dyn SnapshotProvider, cache: &SnapshotCache) -> Result<bool> {
    match provider.fetch()? {
        Some(snapshot) => {
            let bound = snapshot.visibility_upper_bound();
            let installed = cache.publish(snapshot);
            if installed {
                tracing::debug!(visibility_upper_bound = bound, "Refreshed transaction snapshot");
            }
            Ok(installed)
        }
        None => Ok(false),
    }
}
