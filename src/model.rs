//! Domain model for the policy administration service.
//!
//! The admin server exposes two catalogs: service *definitions* (the pluggable
//! component types) and service *instances* (configured services of a type).
//! Both arrive wrapped in a JSON envelope.

use serde::Deserialize;
use tokio::sync::watch;

/// A pluggable service type (e.g. a storage or compute component kind).
///
/// The name is unique and doubles as the display label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
}

/// A configured service belonging to exactly one [`ServiceDefinition`] type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceInstance {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
}

impl ServiceInstance {
    pub fn new(name: impl Into<String>, service_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
        }
    }
}

/// Envelope of the `/service/plugins/definitions` response.
#[derive(Debug, Deserialize)]
pub struct ServiceDefEnvelope {
    #[serde(rename = "serviceDefs", default)]
    pub service_defs: Vec<ServiceDefinition>,
}

/// Envelope of the `/service/plugins/services` response.
#[derive(Debug, Deserialize)]
pub struct ServiceEnvelope {
    #[serde(default)]
    pub services: Vec<ServiceInstance>,
}

/// Both catalogs, fetched together at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub definitions: Vec<ServiceDefinition>,
    pub services: Vec<ServiceInstance>,
}

impl Catalog {
    pub fn type_names(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.name.clone()).collect()
    }
}

/// Handle to the policy collection shared with list consumers.
///
/// The export dialog does not own any policy rows itself; it only signals a
/// reset whenever the derived service set changes so that any consumer
/// refreshes its view.
#[derive(Debug, Clone)]
pub struct PolicyList {
    resets: watch::Sender<u64>,
}

impl Default for PolicyList {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyList {
    pub fn new() -> Self {
        let (resets, _) = watch::channel(0);
        Self { resets }
    }

    /// Signal consumers that the applicable service set changed.
    pub fn trigger_reset(&self) {
        self.resets.send_modify(|n| *n += 1);
    }

    /// Subscribe to reset notifications. The value is a generation counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.resets.subscribe()
    }

    /// Number of resets triggered so far.
    pub fn generation(&self) -> u64 {
        *self.resets.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_definition_envelope() {
        let json = r#"{"serviceDefs":[{"name":"hdfs"},{"name":"hive"}]}"#;
        let envelope: ServiceDefEnvelope = serde_json::from_str(json).unwrap();
        let names: Vec<_> = envelope.service_defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["hdfs", "hive"]);
    }

    #[test]
    fn parses_service_envelope_with_type_field() {
        let json = r#"{"services":[{"name":"cl1_hadoop","type":"hdfs"}]}"#;
        let envelope: ServiceEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(
            envelope.services,
            vec![ServiceInstance::new("cl1_hadoop", "hdfs")]
        );
    }

    #[test]
    fn policy_list_counts_resets() {
        let policies = PolicyList::new();
        let rx = policies.subscribe();
        policies.trigger_reset();
        policies.trigger_reset();
        assert_eq!(*rx.borrow(), 2);
        assert_eq!(policies.generation(), 2);
    }
}
