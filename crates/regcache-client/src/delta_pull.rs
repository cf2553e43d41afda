//! Periodic delta registry pull
//!
//! Each iteration captures the fetch version, pulls a delta batch, and if the
//! gate still holds merges the batch and reconciles against the authority's
//! reported total. The loop sleeps for the configured interval between
//! iterations whatever the outcome, and exits when the shutdown signal flips.

use regcache_common::{RegistryTransport, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::container::VersionedCache;
use crate::merge::{merge_delta, MergeOutcome};
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::stats::CacheStats;

/// Result of one delta-pull iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaPullOutcome {
    Applied {
        merge: MergeOutcome,
        reconcile: ReconcileOutcome,
    },
    /// Another fetch completed in the meantime; merge and reconciliation
    /// were skipped for this cycle.
    Discarded,
}

/// Recurring delta pull with merge and reconciliation.
pub struct DeltaPullWorker {
    cache: Arc<VersionedCache>,
    transport: Arc<dyn RegistryTransport>,
    stats: Arc<CacheStats>,
    reconciler: Reconciler,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl DeltaPullWorker {
    pub fn new(
        cache: Arc<VersionedCache>,
        transport: Arc<dyn RegistryTransport>,
        stats: Arc<CacheStats>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let reconciler = Reconciler::new(cache.clone(), transport.clone(), stats.clone());
        Self {
            cache,
            transport,
            stats,
            reconciler,
            interval,
            shutdown,
        }
    }

    /// Starts the delta pull loop.
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Main delta pull loop
    async fn run(mut self) {
        info!("Delta registry pull started (interval {:?})", self.interval);

        while !*self.shutdown.borrow() {
            match self.run_iteration().await {
                Ok(DeltaPullOutcome::Applied { merge, reconcile }) => {
                    debug!(
                        "Delta merged: {} applied, {} ignored; {:?}",
                        merge.applied(),
                        merge.ignored(),
                        reconcile
                    );
                }
                Ok(DeltaPullOutcome::Discarded) => {}
                Err(e) => {
                    self.stats.record_transport_failure();
                    if e.is_retryable() {
                        warn!("Delta registry pull failed: {}", e);
                    } else {
                        error!("Delta registry pull failed: {}", e);
                    }
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = self.shutdown.changed() => {
                    // A dropped sender means the owner is gone.
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Delta registry pull stopped");
    }

    /// Runs one fetch/merge/reconcile cycle.
    pub async fn run_iteration(&self) -> Result<DeltaPullOutcome> {
        let expected = self.cache.fetch_version().current();

        let batch = self.transport.fetch_delta_registry().await?;

        if !self.cache.fetch_version().advance_if_unchanged(expected) {
            self.stats.record_stale_fetch();
            debug!("Discarding stale delta registry (fetch version {} superseded)", expected);
            return Ok(DeltaPullOutcome::Discarded);
        }

        let authority_total = batch.authority_total_instance_count;
        // Nothing to merge; the total still gets checked.
        let merge = if batch.is_empty() {
            MergeOutcome::default()
        } else {
            let mut registry = self.cache.write().await;
            merge_delta(&mut registry, batch)
        };
        self.stats.record_delta_pull_applied(merge.applied());

        let reconcile = self.reconciler.reconcile(authority_total).await?;

        Ok(DeltaPullOutcome::Applied { merge, reconcile })
    }
}
