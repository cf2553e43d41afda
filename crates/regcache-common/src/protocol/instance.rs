use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Service name -> instance id -> instance.
pub type RegistryMap = HashMap<String, HashMap<String, InstanceRecord>>;

/// One addressable service endpoint as reported by the registry authority.
///
/// Records are never edited once observed. A changed instance arrives as a
/// new record under the same `instance_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct InstanceRecord {
    pub service_name: String,
    pub instance_id: String,
    pub ip: String,
    pub hostname: String,
    pub port: u16,
}

impl InstanceRecord {
    pub fn new(
        service_name: impl Into<String>,
        instance_id: impl Into<String>,
        ip: impl Into<String>,
        hostname: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            instance_id: instance_id.into(),
            ip: ip.into(),
            hostname: hostname.into(),
            port,
        }
    }

    /// `ip:port`, the form routing code usually wants.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

impl fmt::Display for InstanceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} @ {}:{})",
            self.service_name, self.instance_id, self.hostname, self.ip, self.port
        )
    }
}

/// The full registry view held by one client.
///
/// Serializes as the bare nested map so the authority's wire format is just
/// `{"SERVICE": {"instance-id": {...}}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RegistrySnapshot {
    services: RegistryMap,
}

impl RegistrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a flat list of instances.
    ///
    /// Duplicate `(service_name, instance_id)` pairs keep the last record seen.
    pub fn from_instances(instances: impl IntoIterator<Item = InstanceRecord>) -> Self {
        let mut services = RegistryMap::new();
        for instance in instances {
            services
                .entry(instance.service_name.clone())
                .or_default()
                .insert(instance.instance_id.clone(), instance);
        }
        Self { services }
    }

    /// Sum of every per-service instance map's size.
    pub fn total_instance_count(&self) -> u64 {
        self.services.values().map(|instances| instances.len() as u64).sum()
    }

    pub fn service(&self, service_name: &str) -> Option<&HashMap<String, InstanceRecord>> {
        self.services.get(service_name)
    }

    pub fn instance(&self, service_name: &str, instance_id: &str) -> Option<&InstanceRecord> {
        self.services.get(service_name)?.get(instance_id)
    }

    /// Service names in sorted order.
    pub fn service_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Deref for RegistrySnapshot {
    type Target = RegistryMap;

    fn deref(&self) -> &Self::Target {
        &self.services
    }
}

impl DerefMut for RegistrySnapshot {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.services
    }
}
