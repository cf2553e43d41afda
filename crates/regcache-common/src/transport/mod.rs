//! Transport seam between the cache and the registry authority
//!
//! The cache only ever talks to the authority through [`RegistryTransport`].
//! Request construction, timeouts and wire encoding all live behind it, so
//! tests can swap in a scripted implementation and the HTTP client can be
//! replaced without touching the cache.
//!
//! # Components
//!
//! - **[`RegistryTransport`]**: The three calls the cache consumes
//! - **[`HttpRegistryTransport`]**: JSON-RPC over HTTP implementation

pub mod http;

pub use http::{HttpRegistryTransport, HttpTransportConfig};

use async_trait::async_trait;

use crate::protocol::{DeltaBatch, RegistrySnapshot, Result};

/// Capabilities the cache consumes from the registry authority.
///
/// Implementations must be safe to call from several tasks at once: the
/// full-pull and delta-pull workers fetch concurrently and neither waits for
/// the other.
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Returns the authority's complete current registry.
    ///
    /// May take arbitrarily long and must be assumed to race with other fetches.
    async fn fetch_full_registry(&self) -> Result<RegistrySnapshot>;

    /// Returns changes observed within the authority's recent window plus its
    /// current total instance count.
    async fn fetch_delta_registry(&self) -> Result<DeltaBatch>;

    /// Best-effort deregistration notice for one instance.
    async fn cancel_instance(&self, service_name: &str, instance_id: &str) -> Result<()>;
}
