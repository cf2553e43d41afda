//! Drift detection and correction
//!
//! After every applied delta, the local instance total is compared with the
//! total the authority reported alongside that delta. Any difference means the
//! delta stream lost or reordered something, and the cache is corrected with
//! an inline full pull.

use regcache_common::{RegistryTransport, Result};
use std::sync::Arc;
use tracing::info;

use crate::container::VersionedCache;
use crate::stats::CacheStats;

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Local and authority totals agreed.
    InSync { total: u64 },
    /// Totals disagreed and a fresh full snapshot was installed.
    Resynced {
        local_total: u64,
        authority_total: u64,
        installed_total: u64,
        stamp: u64,
    },
}

/// Compares instance counts and resynchronizes on drift.
pub struct Reconciler {
    cache: Arc<VersionedCache>,
    transport: Arc<dyn RegistryTransport>,
    stats: Arc<CacheStats>,
}

impl Reconciler {
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

    /// Checks the live snapshot against `authority_total`.
    ///
    /// On mismatch, in either direction, fetches a full snapshot and installs
    /// it without consulting the fetch-version gate. The outgoing snapshot's
    /// write lock is held only for the swap itself, never across the fetch.
    ///
    /// A failed fetch leaves the live snapshot as it was and is returned to the
    /// caller.
    pub async fn reconcile(&self, authority_total: u64) -> Result<ReconcileOutcome> {
        let local_total = self.cache.write().await.total_instance_count();

        if local_total == authority_total {
            return Ok(ReconcileOutcome::InSync { total: local_total });
        }

        info!(
            "Registry drift detected: local has {} instances, authority reports {}; resyncing",
            local_total, authority_total
        );

        let fetched = self.transport.fetch_full_registry().await?;
        let installed_total = fetched.total_instance_count();
        let stamp = self.cache.install_exclusive(fetched).await;
        self.stats.record_drift_resync();

        info!(
            "Registry resynced to {} instances (stamp {})",
            installed_total, stamp
        );

        Ok(ReconcileOutcome::Resynced {
            local_total,
            authority_total,
            installed_total,
            stamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use regcache_common::{InstanceRecord, RegcacheError, RegistrySnapshot};

    fn snapshot_of(count: usize) -> RegistrySnapshot {
        RegistrySnapshot::from_instances((0..count).map(|i| {
            InstanceRecord::new("ORDER-SERVICE", format!("o-{}", i), "10.0.0.1", "order", 9000)
        }))
    }

    fn setup(local: usize) -> (Arc<VersionedCache>, Arc<ScriptedTransport>, Arc<CacheStats>, Reconciler) {
        let cache = Arc::new(VersionedCache::with_snapshot(snapshot_of(local)));
        let transport = Arc::new(ScriptedTransport::new());
        let stats = Arc::new(CacheStats::new());
        let reconciler = Reconciler::new(cache.clone(), transport.clone(), stats.clone());
        (cache, transport, stats, reconciler)
    }

    #[tokio::test]
    async fn test_matching_counts_take_no_action() {
        let (cache, transport, stats, reconciler) = setup(2);

        let outcome = reconciler.reconcile(2).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::InSync { total: 2 });
        assert_eq!(transport.full_calls(), 0);
        assert_eq!(cache.stamp(), 0);
        assert_eq!(stats.snapshot(0, 0, 0).drift_resyncs, 0);
    }

    #[tokio::test]
    async fn test_authority_ahead_triggers_single_resync() {
        let (cache, transport, stats, reconciler) = setup(1);
        transport.push_full(Ok(snapshot_of(2)));

        let outcome = reconciler.reconcile(2).await.unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome::Resynced {
                local_total: 1,
                authority_total: 2,
                installed_total: 2,
                stamp: 1,
            }
        );
        assert_eq!(transport.full_calls(), 1);
        assert_eq!(cache.read().await.total_instance_count(), 2);
        assert_eq!(stats.snapshot(0, 0, 0).drift_resyncs, 1);
    }

    #[tokio::test]
    async fn test_authority_behind_also_resyncs() {
        let (cache, transport, _stats, reconciler) = setup(3);
        transport.push_full(Ok(snapshot_of(1)));

        let outcome = reconciler.reconcile(1).await.unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Resynced { installed_total: 1, .. }));
        assert_eq!(cache.read().await.total_instance_count(), 1);
    }

    #[tokio::test]
    async fn test_resync_bypasses_fetch_version_gate() {
        let (cache, transport, _stats, reconciler) = setup(0);
        transport.push_full(Ok(snapshot_of(4)));

        reconciler.reconcile(4).await.unwrap();

        assert_eq!(cache.fetch_version().current(), 0);
        assert_eq!(cache.stamp(), 1);
    }

    #[tokio::test]
    async fn test_failed_resync_leaves_snapshot_untouched() {
        let (cache, transport, stats, reconciler) = setup(1);
        transport.push_full(Err(RegcacheError::Timeout(30_000)));

        let err = reconciler.reconcile(5).await.unwrap_err();

        assert!(matches!(err, RegcacheError::Timeout(30_000)));
        assert_eq!(cache.stamp(), 0);
        assert_eq!(cache.read().await.total_instance_count(), 1);
        assert_eq!(stats.snapshot(0, 0, 0).drift_resyncs, 0);
    }
}
