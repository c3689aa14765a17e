//! Install-config data structures.
//!
//! Every struct rejects unknown keys so a persisted document that does not
//! match the current schema fails to decode instead of silently losing data.

use serde::{Deserialize, Serialize};

use super::cidr::Cidr;
use crate::platform::Platform;

/// The canonical cluster specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InstallConfig {
    /// Schema version tag (`v1`, or an older generation before upconversion).
    #[serde(default)]
    pub api_version: String,

    /// Object metadata; only the cluster name is meaningful.
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Base DNS domain of the cluster.
    #[serde(default)]
    pub base_domain: String,

    /// Public key authorized on every node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<String>,

    /// Registry pull secret, a JSON document with an `auths` object.
    #[serde(default)]
    pub pull_secret: String,

    /// PEM bundle appended to the node trust store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_trust_bundle: Option<String>,

    /// Cluster network topology.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub networking: Option<Networking>,

    /// Control plane machine pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane: Option<MachinePool>,

    /// Compute machine pools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compute: Vec<MachinePool>,

    /// Whether endpoints are published externally or kept internal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishStrategy>,

    /// Restrict cryptography to FIPS-validated modules.
    #[serde(default, skip_serializing_if = "is_false")]
    pub fips: bool,

    /// The one target platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

impl InstallConfig {
    /// Cluster name from the object metadata.
    pub fn cluster_name(&self) -> &str {
        &self.metadata.name
    }
}

/// Object metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
}

/// Cluster network topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Networking {
    /// Network plugin (e.g. `OVNKubernetes`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_type: String,

    /// Networks the machines are attached to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_network: Vec<MachineNetworkEntry>,

    /// Pod networks with their per-node allocation size.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cluster_network: Vec<ClusterNetworkEntry>,

    /// Service networks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_network: Vec<Cidr>,

    /// Deprecated: replaced by `machineNetwork`.
    #[serde(default, rename = "machineCIDR", skip_serializing_if = "Option::is_none")]
    pub deprecated_machine_cidr: Option<Cidr>,

    /// Deprecated: replaced by `networkType`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub deprecated_type: Option<String>,

    /// Deprecated: replaced by `clusterNetwork`.
    #[serde(default, rename = "clusterNetworks", skip_serializing_if = "Vec::is_empty")]
    pub deprecated_cluster_networks: Vec<DeprecatedClusterNetworkEntry>,

    /// Deprecated: replaced by `serviceNetwork`.
    #[serde(default, rename = "serviceCIDR", skip_serializing_if = "Option::is_none")]
    pub deprecated_service_cidr: Option<Cidr>,
}

impl Networking {
    /// Returns true if any deprecated field is still populated.
    pub fn has_deprecated_fields(&self) -> bool {
        self.deprecated_machine_cidr.is_some()
            || self.deprecated_type.is_some()
            || !self.deprecated_cluster_networks.is_empty()
            || self.deprecated_service_cidr.is_some()
    }
}

/// A machine network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineNetworkEntry {
    pub cidr: Cidr,
}

/// A pod network and the prefix length allocated to each node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClusterNetworkEntry {
    pub cidr: Cidr,
    pub host_prefix: u8,
}

/// Deprecated pod network shape, sized by host bits instead of prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeprecatedClusterNetworkEntry {
    pub cidr: Cidr,
    pub host_subnet_length: u8,
}

/// A pool of identically configured machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MachinePool {
    /// Pool name (`master` for the control plane).
    #[serde(default)]
    pub name: String,

    /// Number of machines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,

    /// Simultaneous multithreading setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperthreading: Option<Hyperthreading>,

    /// CPU architecture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<Architecture>,
}

impl MachinePool {
    /// Creates an empty pool with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replicas: None,
            hyperthreading: None,
            architecture: None,
        }
    }
}

/// Simultaneous multithreading setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Hyperthreading {
    Enabled,
    Disabled,
}

/// CPU architecture of a machine pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Amd64,
    Arm64,
    Ppc64le,
    S390x,
}

/// How cluster endpoints are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishStrategy {
    /// Endpoints are reachable from outside the cluster network.
    External,
    /// Endpoints are only reachable from inside the cluster network.
    Internal,
}

fn is_false(value: &bool) -> bool {
    !*value
}
