//! Regcache Client
//!
//! Client-side cache of a service registry. The cache keeps a local,
//! eventually-consistent mirror of which service instances exist and where,
//! fed by periodic full snapshots and cheaper deltas from the registry
//! authority, and readable by request-routing code without waiting on the
//! network.
//!
//! # Architecture
//!
//! - [`VersionedCache`]: the live snapshot behind a stamped, atomically
//!   swappable reference, plus the fetch-version gate
//! - [`FullPullWorker`]: fetches and installs a complete snapshot
//! - [`DeltaPullWorker`]: recurring fetch, [`merge_delta`] and reconcile loop
//! - [`Reconciler`]: compares local and authority totals, resyncs on drift
//! - [`CachedServiceRegistry`]: lifecycle and read API
//! - [`RegistryClient`]: owner that also sends the shutdown cancel notice
//!
//! # Consistency
//!
//! Readers never see a half-merged snapshot (merges hold the write lock for
//! their whole traversal) nor a half-installed one (replacement is a single
//! pointer swap). A fetch is applied only if no other fetch completed while it
//! was in flight. The gate orders completions, not data: a full snapshot that
//! passes the gate is installed even if a delta merged between its gate check
//! and its swap, and its contents are never compared for recency against the
//! live snapshot.

pub mod client;
pub mod config;
pub mod container;
pub mod delta_pull;
pub mod full_pull;
pub mod merge;
pub mod reconcile;
pub mod registry;
pub mod stats;

pub use client::RegistryClient;
pub use config::{CacheConfig, ClientConfig};
pub use container::{FetchVersion, RegistryView, StampedSnapshot, VersionedCache};
pub use delta_pull::{DeltaPullOutcome, DeltaPullWorker};
pub use full_pull::{FullPullOutcome, FullPullWorker};
pub use merge::{merge_delta, MergeOutcome};
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use registry::CachedServiceRegistry;
pub use stats::{CacheStats, CacheStatsSnapshot};

#[cfg(test)]
#[path = "../tests/common/scripted.rs"]
mod testing;
