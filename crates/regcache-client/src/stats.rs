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

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters describing what the background workers have done.
///
/// Shared by both workers through an `Arc`. Every counter only ever grows;
/// none of them feed back into cache behavior.
#[derive(Debug, Default)]
pub struct CacheStats {
    full_pulls_applied: AtomicU64,
    delta_pulls_applied: AtomicU64,
    stale_fetches_discarded: AtomicU64,
    drift_resyncs: AtomicU64,
    transport_failures: AtomicU64,
    changes_applied: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_full_pull_applied(&self) {
        self.full_pulls_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delta_pull_applied(&self, changes_applied: u64) {
        self.delta_pulls_applied.fetch_add(1, Ordering::Relaxed);
        self.changes_applied.fetch_add(changes_applied, Ordering::Relaxed);
    }

    pub fn record_stale_fetch(&self) {
        self.stale_fetches_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drift_resync(&self) {
        self.drift_resyncs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads every counter and pairs it with the container state supplied by
    /// the caller.
    pub fn snapshot(&self, stamp: u64, fetch_version: u64, local_instance_count: u64) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            stamp,
            fetch_version,
            local_instance_count,
            full_pulls_applied: self.full_pulls_applied.load(Ordering::Relaxed),
            delta_pulls_applied: self.delta_pulls_applied.load(Ordering::Relaxed),
            stale_fetches_discarded: self.stale_fetches_discarded.load(Ordering::Relaxed),
            drift_resyncs: self.drift_resyncs.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            changes_applied: self.changes_applied.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`] plus container state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub stamp: u64,
    pub fetch_version: u64,
    pub local_instance_count: u64,
    pub full_pulls_applied: u64,
    pub delta_pulls_applied: u64,
    pub stale_fetches_discarded: u64,
    pub drift_resyncs: u64,
    pub transport_failures: u64,
    pub changes_applied: u64,
}
