use std::time::Duration;

/// Scheduling configuration for the cached registry.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Pause between two delta pulls, measured from the end of one iteration
    /// to the start of the next.
    pub delta_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            delta_interval: Duration::from_secs(30),
        }
    }
}

impl CacheConfig {
    pub fn with_delta_interval(mut self, delta_interval: Duration) -> Self {
        self.delta_interval = delta_interval;
        self
    }
}

/// Identity of the instance that owns the cache.
///
/// Only used for the best-effort cancel notice sent on shutdown. The identity
/// is supplied by the caller; generating it is not this crate's concern.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub service_name: String,
    pub instance_id: String,
    pub cache: CacheConfig,
}

impl ClientConfig {
    pub fn new(service_name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            instance_id: instance_id.into(),
            cache: CacheConfig::default(),
        }
    }

    pub fn with_cache_config(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}
