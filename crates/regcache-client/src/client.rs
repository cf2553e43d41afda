use regcache_common::RegistryTransport;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::registry::CachedServiceRegistry;

/// Owner of a cached registry on behalf of one service instance.
///
/// Starting the client starts the cache; shutting it down stops the cache and
/// sends a best-effort cancel notice for this instance.
pub struct RegistryClient {
    config: ClientConfig,
    transport: Arc<dyn RegistryTransport>,
    registry: CachedServiceRegistry,
    running: AtomicBool,
}

impl RegistryClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn RegistryTransport>) -> Self {
        let registry = CachedServiceRegistry::new(transport.clone(), config.cache.clone());
        Self {
            config,
            transport,
            registry,
            running: AtomicBool::new(false),
        }
    }

    /// Starts the cache's background pulls.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(
            "Registry client {}/{} starting",
            self.config.service_name, self.config.instance_id
        );
        self.registry.initialize();
    }

    /// Stops the cache and tells the authority this instance is leaving.
    ///
    /// A failed cancel notice is logged and otherwise ignored.
    pub async fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.registry.shutdown();

        if let Err(e) = self
            .transport
            .cancel_instance(&self.config.service_name, &self.config.instance_id)
            .await
        {
            warn!(
                "Cancel notice for {}/{} failed: {}",
                self.config.service_name, self.config.instance_id, e
            );
        }

        self.registry.wait_stopped().await;
        info!(
            "Registry client {}/{} stopped",
            self.config.service_name, self.config.instance_id
        );
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn registry(&self) -> &CachedServiceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
