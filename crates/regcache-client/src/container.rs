// Copyright 2025 Regcache Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Versioned cache container
//!
//! Holds the live [`RegistrySnapshot`] behind an atomically swappable,
//! stamped reference, and a separate fetch-version counter that sequences
//! fetch attempts between the two background workers.
//!
//! # Concurrency Model
//!
//! - The `(snapshot, stamp)` pair lives in one `Arc<StampedSnapshot>` inside an
//!   [`ArcSwap`]. Whole-snapshot replacement is a compare-and-swap on that
//!   pointer, so a reader always sees a pair produced by exactly one
//!   successful replacement.
//! - The snapshot's maps sit behind a tokio `RwLock`. The merge engine takes
//!   the write side for its whole traversal; readers take the read side.
//! - [`FetchVersion`] is an independent atomic counter. A worker captures it
//!   before its network call and applies the result only if
//!   [`FetchVersion::advance_if_unchanged`] succeeds afterwards.

use arc_swap::ArcSwap;
use regcache_common::RegistrySnapshot;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// The lock-guarded snapshot a stamp refers to.
pub type SharedSnapshot = Arc<RwLock<RegistrySnapshot>>;

/// Read-only live view of the registry, held under the read lock.
///
/// Merges on the same snapshot wait until every outstanding view is dropped,
/// so callers should not hold one across long operations.
pub type RegistryView = OwnedRwLockReadGuard<RegistrySnapshot>;

/// A snapshot reference paired with the stamp it was installed under.
#[derive(Debug)]
pub struct StampedSnapshot {
    snapshot: SharedSnapshot,
    stamp: u64,
}

impl StampedSnapshot {
    pub fn snapshot(&self) -> &SharedSnapshot {
        &self.snapshot
    }

    pub fn stamp(&self) -> u64 {
        self.stamp
    }
}

/// Monotonic counter gating "may I apply what I fetched".
#[derive(Debug, Default)]
pub struct FetchVersion(AtomicU64);

impl FetchVersion {
    pub fn new() -> Self {
        Self::default()
    }

    /// The version to capture before issuing a fetch.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Advances the counter by one if it still equals `expected`.
    ///
    /// Returns `false` when another fetch completed in between; the caller
    /// must then discard its result.
    pub fn advance_if_unchanged(&self, expected: u64) -> bool {
        self.0
            .compare_exchange(expected, expected + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Owner of the live registry snapshot.
#[derive(Debug)]
pub struct VersionedCache {
    current: ArcSwap<StampedSnapshot>,
    fetch_version: FetchVersion,
}

impl Default for VersionedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionedCache {
    /// Creates a container whose live snapshot is empty, at stamp 0.
    pub fn new() -> Self {
        Self::with_snapshot(RegistrySnapshot::new())
    }

    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: ArcSwap::from_pointee(StampedSnapshot {
                snapshot: Arc::new(RwLock::new(snapshot)),
                stamp: 0,
            }),
            fetch_version: FetchVersion::new(),
        }
    }

    /// The current `(snapshot, stamp)` pair.
    pub fn load(&self) -> Arc<StampedSnapshot> {
        self.current.load_full()
    }

    pub fn stamp(&self) -> u64 {
        self.current.load().stamp
    }

    pub fn fetch_version(&self) -> &FetchVersion {
        &self.fetch_version
    }

    /// Replaces the live snapshot if the current stamp is still
    /// `expected_stamp`. On success the stamp becomes `expected_stamp + 1`.
    pub fn swap(&self, expected_stamp: u64, snapshot: SharedSnapshot) -> bool {
        let current = self.current.load();
        if current.stamp != expected_stamp {
            return false;
        }

        let replacement = Arc::new(StampedSnapshot {
            snapshot,
            stamp: expected_stamp + 1,
        });
        let previous = self.current.compare_and_swap(&*current, replacement);
        Arc::ptr_eq(&*previous, &*current)
    }

    /// Installs `snapshot` as the live one, retrying the stamped swap until it
    /// lands. Returns the new stamp.
    ///
    /// Only other swaps contend here, so the loop is short.
    pub fn install(&self, snapshot: RegistrySnapshot) -> u64 {
        let shared: SharedSnapshot = Arc::new(RwLock::new(snapshot));
        loop {
            let expected = self.stamp();
            if self.swap(expected, shared.clone()) {
                return expected + 1;
            }
            std::hint::spin_loop();
        }
    }

    /// Like [`install`](Self::install), but holds the outgoing snapshot's
    /// write lock across each swap attempt so no merge or reader is midway
    /// through it when it is retired.
    pub async fn install_exclusive(&self, snapshot: RegistrySnapshot) -> u64 {
        let shared: SharedSnapshot = Arc::new(RwLock::new(snapshot));
        loop {
            let outgoing = self.load();
            let _guard = outgoing.snapshot.write().await;
            if self.swap(outgoing.stamp, shared.clone()) {
                return outgoing.stamp + 1;
            }
        }
    }

    /// Live read view of the current snapshot.
    pub async fn read(&self) -> RegistryView {
        self.load().snapshot.clone().read_owned().await
    }

    /// Exclusive access to the current snapshot's maps.
    pub async fn write(&self) -> OwnedRwLockWriteGuard<RegistrySnapshot> {
        self.load().snapshot.clone().write_owned().await
    }
}
