//! Regcache Common Types and Transport
//!
//! This crate provides the protocol definitions and the authority transport
//! shared by the regcache registry client and its command-line runner.
//!
//! # Overview
//!
//! A regcache client keeps a local, eventually-consistent mirror of a remote
//! service registry. The mirror is fed by two kinds of responses from the
//! registry authority:
//!
//! - **Full snapshots**: the complete `service -> instance id -> instance` map
//! - **Delta batches**: recently observed register/remove operations plus the
//!   authority's total instance count at emission time
//!
//! # Components
//!
//! - [`protocol`] - Instance records, snapshots, delta batches, JSON-RPC envelope, errors
//! - [`transport`] - The [`RegistryTransport`] seam and its HTTP implementation
//!
//! # Example
//!
//! ```
//! use regcache_common::{ChangeRecord, DeltaBatch, InstanceRecord, RegistrySnapshot};
//!
//! let instance = InstanceRecord::new("ORDER-SERVICE", "ORDER-SERVICE-1", "10.0.0.1", "order-01", 9000);
//! let snapshot = RegistrySnapshot::from_instances(vec![instance.clone()]);
//! assert_eq!(snapshot.total_instance_count(), 1);
//!
//! let delta = DeltaBatch::new(vec![ChangeRecord::remove(instance)], 0);
//! assert_eq!(delta.changes.len(), 1);
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
pub use transport::{HttpRegistryTransport, HttpTransportConfig, RegistryTransport};
pub use transport::http::validate_http_url;
