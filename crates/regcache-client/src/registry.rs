//! Client-side cached service registry
//!
//! [`CachedServiceRegistry`] wires the versioned container to the two
//! background workers and exposes the read API used by request-routing code.

use regcache_common::{InstanceRecord, RegistryTransport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::CacheConfig;
use crate::container::{RegistryView, VersionedCache};
use crate::delta_pull::DeltaPullWorker;
use crate::full_pull::FullPullWorker;
use crate::stats::{CacheStats, CacheStatsSnapshot};

/// Eventually-consistent local mirror of the registry authority.
///
/// # Lifecycle
///
/// - [`initialize`](Self::initialize) starts one full pull and the periodic
///   delta pull
/// - [`shutdown`](Self::shutdown) signals the delta loop to stop after its
///   current iteration; an in-flight fetch is not aborted
///
/// Until the first full pull lands the registry reads as empty.
///
/// # Example
///
/// ```no_run
/// # use regcache_client::{CacheConfig, CachedServiceRegistry};
/// # use regcache_common::{HttpRegistryTransport, HttpTransportConfig};
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpRegistryTransport::new(HttpTransportConfig::new("http://127.0.0.1:8761/"))?;
/// let registry = CachedServiceRegistry::new(Arc::new(transport), CacheConfig::default());
/// registry.initialize();
///
/// for instance in registry.instances_of("ORDER-SERVICE").await {
///     println!("{}", instance.address());
/// }
///
/// registry.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct CachedServiceRegistry {
    cache: Arc<VersionedCache>,
    transport: Arc<dyn RegistryTransport>,
    stats: Arc<CacheStats>,
    config: CacheConfig,
    shutdown_tx: watch::Sender<bool>,
    initialized: AtomicBool,
    delta_handle: Mutex<Option<JoinHandle<()>>>,
}

impl CachedServiceRegistry {
    pub fn new(transport: Arc<dyn RegistryTransport>, config: CacheConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            cache: Arc::new(VersionedCache::new()),
            transport,
            stats: Arc::new(CacheStats::new()),
            config,
            shutdown_tx,
            initialized: AtomicBool::new(false),
            delta_handle: Mutex::new(None),
        }
    }

    /// Starts the full-pull and delta-pull background tasks.
    ///
    /// Must be called from within a tokio runtime. Returns `false` without
    /// starting anything if the registry was already initialized.
    pub fn initialize(&self) -> bool {
        if self.initialized.swap(true, Ordering::SeqCst) {
            warn!("Cached registry already initialized; ignoring");
            return false;
        }

        self.full_pull_worker().spawn();

        let delta = DeltaPullWorker::new(
            self.cache.clone(),
            self.transport.clone(),
            self.stats.clone(),
            self.config.delta_interval,
            self.shutdown_tx.subscribe(),
        );
        let handle = delta.spawn();
        *self.delta_slot() = Some(handle);

        info!("Cached registry initialized");
        true
    }

    /// Signals the delta loop to stop.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        info!("Cached registry shutting down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Waits for the delta loop to exit. Returns immediately if it was never
    /// started or has already been awaited.
    pub async fn wait_stopped(&self) {
        let handle = self.delta_slot().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Delta registry pull task ended abnormally: {}", e);
            }
        }
    }

    /// The slot only ever holds a `JoinHandle`, so a poisoned lock still
    /// guards a usable value.
    fn delta_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.delta_handle.lock().unwrap_or_else(|poisoned| {
            warn!("Delta task slot lock was poisoned; recovering");
            poisoned.into_inner()
        })
    }

    /// A full-pull worker bound to this registry, for ad-hoc refreshes.
    pub fn full_pull_worker(&self) -> FullPullWorker {
        FullPullWorker::new(self.cache.clone(), self.transport.clone(), self.stats.clone())
    }

    /// Live view of `service name -> instance id -> instance`.
    ///
    /// The view holds the read lock until dropped and is never a copy.
    pub async fn get_registry(&self) -> RegistryView {
        self.cache.read().await
    }

    /// Cloned instances of one service, in no particular order.
    pub async fn instances_of(&self, service_name: &str) -> Vec<InstanceRecord> {
        let registry = self.cache.read().await;
        registry
            .service(service_name)
            .map(|instances| instances.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn total_instance_count(&self) -> u64 {
        self.cache.read().await.total_instance_count()
    }

    /// Stamp of the live snapshot; bumps on every whole-snapshot replacement.
    pub fn stamp(&self) -> u64 {
        self.cache.stamp()
    }

    pub fn fetch_version(&self) -> u64 {
        self.cache.fetch_version().current()
    }

    pub async fn stats(&self) -> CacheStatsSnapshot {
        let local = self.total_instance_count().await;
        self.stats.snapshot(self.stamp(), self.fetch_version(), local)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl Drop for CachedServiceRegistry {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}
