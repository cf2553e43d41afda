//! Scripted transport shared by the unit and integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use regcache_common::{DeltaBatch, RegcacheError, RegistrySnapshot, RegistryTransport, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Replays queued responses. An empty queue answers with a transport error.
///
/// When a call kind is held, each call of that kind blocks after being
/// counted until the test hands out a permit with `release_full`/`release_delta`.
pub struct ScriptedTransport {
    full: Mutex<VecDeque<Result<RegistrySnapshot>>>,
    delta: Mutex<VecDeque<Result<DeltaBatch>>>,
    pub full_calls: AtomicUsize,
    pub delta_calls: AtomicUsize,
    pub cancels: Mutex<Vec<(String, String)>>,
    pub fail_cancel: AtomicBool,
    hold_full: AtomicBool,
    hold_delta: AtomicBool,
    full_permits: Semaphore,
    delta_permits: Semaphore,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            full: Mutex::new(VecDeque::new()),
            delta: Mutex::new(VecDeque::new()),
            full_calls: AtomicUsize::new(0),
            delta_calls: AtomicUsize::new(0),
            cancels: Mutex::new(Vec::new()),
            fail_cancel: AtomicBool::new(false),
            hold_full: AtomicBool::new(false),
            hold_delta: AtomicBool::new(false),
            full_permits: Semaphore::new(0),
            delta_permits: Semaphore::new(0),
        }
    }

    pub fn push_full(&self, response: Result<RegistrySnapshot>) {
        self.full.lock().unwrap().push_back(response);
    }

    pub fn push_delta(&self, response: Result<DeltaBatch>) {
        self.delta.lock().unwrap().push_back(response);
    }

    pub fn hold_full(&self) {
        self.hold_full.store(true, Ordering::SeqCst);
    }

    pub fn hold_delta(&self) {
        self.hold_delta.store(true, Ordering::SeqCst);
    }

    pub fn release_full(&self, n: usize) {
        self.full_permits.add_permits(n);
    }

    pub fn release_delta(&self, n: usize) {
        self.delta_permits.add_permits(n);
    }

    pub fn full_calls(&self) -> usize {
        self.full_calls.load(Ordering::SeqCst)
    }

    pub fn delta_calls(&self) -> usize {
        self.delta_calls.load(Ordering::SeqCst)
    }

    /// Polls until `counter` reaches `n`, panicking after five seconds.
    pub async fn wait_for(counter: &AtomicUsize, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < n {
            assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {} calls", n);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }
}

fn unscripted() -> RegcacheError {
    RegcacheError::Transport("no scripted response".into())
}

#[async_trait]
impl RegistryTransport for ScriptedTransport {
    async fn fetch_full_registry(&self) -> Result<RegistrySnapshot> {
        self.full_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_full.load(Ordering::SeqCst) {
            self.full_permits.acquire().await.map_err(|_| unscripted())?.forget();
        }
        self.full.lock().unwrap().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn fetch_delta_registry(&self) -> Result<DeltaBatch> {
        self.delta_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_delta.load(Ordering::SeqCst) {
            self.delta_permits.acquire().await.map_err(|_| unscripted())?.forget();
        }
        self.delta.lock().unwrap().pop_front().unwrap_or_else(|| Err(unscripted()))
    }

    async fn cancel_instance(&self, service_name: &str, instance_id: &str) -> Result<()> {
        self.cancels
            .lock()
            .unwrap()
            .push((service_name.to_string(), instance_id.to_string()));
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(RegcacheError::Transport("connection refused".into()));
        }
        Ok(())
    }
}
