//! Delta merge engine
//!
//! Applies a [`DeltaBatch`] onto the live snapshot's maps, in batch order.
//! Callers hold the snapshot's write lock for the whole call.

use regcache_common::{ChangeOperation, DeltaBatch, RegistrySnapshot};
use std::collections::hash_map::Entry;

/// What a merge did with each change record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// REGISTER records that inserted a new instance.
    pub registered: u64,
    /// REGISTER records whose instance id was already present.
    pub duplicate_registers: u64,
    /// REMOVE records that removed an instance.
    pub removed: u64,
    /// REMOVE records for a service or instance id that was not present.
    pub absent_removes: u64,
}

impl MergeOutcome {
    /// Records that changed the snapshot.
    pub fn applied(&self) -> u64 {
        self.registered + self.removed
    }

    /// Records that were no-ops.
    pub fn ignored(&self) -> u64 {
        self.duplicate_registers + self.absent_removes
    }
}

/// Merges `batch` into `registry`, consuming the batch.
///
/// - REGISTER inserts the instance unless its id is already present under the
///   service; the first record for an id wins.
/// - REMOVE drops the instance if present. A missing service or id is a no-op
///   and never creates an empty service entry.
///
/// Records are applied strictly in order, so a REMOVE following a REGISTER of
/// the same id in one batch leaves the id absent.
pub fn merge_delta(registry: &mut RegistrySnapshot, batch: DeltaBatch) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for change in batch.changes {
        let instance = change.instance;
        match change.operation {
            ChangeOperation::Register => {
                let instances = registry.entry(instance.service_name.clone()).or_default();
                match instances.entry(instance.instance_id.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(instance);
                        outcome.registered += 1;
                    }
                    Entry::Occupied(_) => outcome.duplicate_registers += 1,
                }
            }
            ChangeOperation::Remove => {
                let removed = registry
                    .get_mut(&instance.service_name)
                    .and_then(|instances| instances.remove(&instance.instance_id));
                match removed {
                    Some(_) => outcome.removed += 1,
                    None => outcome.absent_removes += 1,
                }
            }
        }
    }

    outcome
}
