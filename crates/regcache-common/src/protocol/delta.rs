use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::instance::InstanceRecord;

/// Operation carried by a change record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOperation {
    Register,
    Remove,
}

/// A single register/remove observed by the authority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeRecord {
    pub instance: InstanceRecord,
    /// Milliseconds since the UNIX epoch at which the authority saw the change.
    pub timestamp_ms: u64,
    pub operation: ChangeOperation,
}

impl ChangeRecord {
    pub fn new(instance: InstanceRecord, operation: ChangeOperation) -> Self {
        Self {
            instance,
            timestamp_ms: now_ms(),
            operation,
        }
    }

    pub fn register(instance: InstanceRecord) -> Self {
        Self::new(instance, ChangeOperation::Register)
    }

    pub fn remove(instance: InstanceRecord) -> Self {
        Self::new(instance, ChangeOperation::Remove)
    }
}

/// Changes observed since the last delta pull, in the order the authority
/// emitted them, plus the authority's instance count at emission time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeltaBatch {
    pub changes: Vec<ChangeRecord>,
    pub authority_total_instance_count: u64,
}

impl DeltaBatch {
    pub fn new(changes: Vec<ChangeRecord>, authority_total_instance_count: u64) -> Self {
        Self {
            changes,
            authority_total_instance_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
