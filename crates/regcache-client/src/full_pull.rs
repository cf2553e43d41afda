//! One-shot full registry pull

use regcache_common::{RegistryTransport, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::container::VersionedCache;
use crate::stats::CacheStats;

/// Result of one full-pull invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullPullOutcome {
    /// The fetched snapshot became the live one.
    Applied { stamp: u64, instance_count: u64 },
    /// Another fetch completed while this one was in flight; the result was
    /// dropped and the live snapshot left untouched.
    Discarded,
}

/// Fetches a complete snapshot and installs it, guarded by the fetch-version gate.
#[derive(Clone)]
pub struct FullPullWorker {
    cache: Arc<VersionedCache>,
    transport: Arc<dyn RegistryTransport>,
    stats: Arc<CacheStats>,
}

impl FullPullWorker {
    pub fn new(
        cache: Arc<VersionedCache>,
        transport: Arc<dyn RegistryTransport>,
        stats: Arc<CacheStats>,
    ) -> Self {
        Self {
            cache,
            transport,
            stats,
        }
    }

    /// Starts a single full pull in the background.
    ///
    /// Failures are logged; the previous snapshot (empty at startup) stays live.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            match self.run_once().await {
                Ok(FullPullOutcome::Applied { stamp, instance_count }) => {
                    info!("Full registry pull installed {} instances (stamp {})", instance_count, stamp);
                }
                Ok(FullPullOutcome::Discarded) => {}
                Err(e) => {
                    self.stats.record_transport_failure();
                    error!("Full registry pull failed: {}", e);
                }
            }
        })
    }

    /// Runs one full pull to completion.
    ///
    /// The fetch version is captured before the network call. A slow response
    /// that returns after any other fetch has completed fails the gate and is
    /// discarded rather than overwriting newer data. No retry happens within
    /// this invocation.
    pub async fn run_once(&self) -> Result<FullPullOutcome> {
        let expected = self.cache.fetch_version().current();

        let fetched = self.transport.fetch_full_registry().await?;

        if !self.cache.fetch_version().advance_if_unchanged(expected) {
            self.stats.record_stale_fetch();
            debug!("Discarding stale full registry (fetch version {} superseded)", expected);
            return Ok(FullPullOutcome::Discarded);
        }

        let instance_count = fetched.total_instance_count();
        let stamp = self.cache.install(fetched);
        self.stats.record_full_pull_applied();

        Ok(FullPullOutcome::Applied {
            stamp,
            instance_count,
        })
    }
}
