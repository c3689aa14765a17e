//! Upconversion of persisted install configs to the current schema.
//!
//! Each schema generation has one pure step that moves deprecated fields to
//! their replacements. Steps run in order from the document's version up to
//! the current one.

use super::model::{ClusterNetworkEntry, InstallConfig, MachineNetworkEntry, Networking};
use crate::error::UpconvertError;

/// Persisted schema generations, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    V1Beta3,
    V1Beta4,
    V1,
}

type Step = fn(InstallConfig) -> Result<InstallConfig, UpconvertError>;

impl SchemaVersion {
    /// The version written by this crate.
    pub const CURRENT: SchemaVersion = SchemaVersion::V1;

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "v1beta3" => Some(SchemaVersion::V1Beta3),
            "v1beta4" => Some(SchemaVersion::V1Beta4),
            "v1" => Some(SchemaVersion::V1),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V1Beta3 => "v1beta3",
            SchemaVersion::V1Beta4 => "v1beta4",
            SchemaVersion::V1 => "v1",
        }
    }

    /// The step that upgrades a document at this version, and the version it
    /// produces. The current version folds deprecated fields in place.
    fn step(&self) -> (Step, SchemaVersion) {
        match self {
            SchemaVersion::V1Beta3 => (v1beta3_to_v1beta4, SchemaVersion::V1Beta4),
            SchemaVersion::V1Beta4 => (v1beta4_to_v1, SchemaVersion::V1),
            SchemaVersion::V1 => (fold_deprecated, SchemaVersion::V1),
        }
    }
}

/// Upgrades a decoded configuration to [`SchemaVersion::CURRENT`].
///
/// On success the version tag is current and no deprecated field is set.
pub fn upconvert(config: InstallConfig) -> Result<InstallConfig, UpconvertError> {
    let mut version = SchemaVersion::parse(&config.api_version)
        .ok_or_else(|| UpconvertError::UnsupportedVersion(config.api_version.clone()))?;
    let mut config = config;

    loop {
        let (step, next) = version.step();
        config = step(config)?;
        config.api_version = next.as_str().to_string();

        if next == version {
            break;
        }
        tracing::debug!(from = version.as_str(), to = next.as_str(), "Upconverted install config");
        version = next;
    }

    Ok(config)
}

/// `machineCIDR` → `machineNetwork`, `type` → `networkType`.
pub fn v1beta3_to_v1beta4(config: InstallConfig) -> Result<InstallConfig, UpconvertError> {
    map_networking(config, |networking| {
        let networking = convert_machine_cidr(networking)?;
        convert_network_type(networking)
    })
}

/// `clusterNetworks` → `clusterNetwork`, `serviceCIDR` → `serviceNetwork`.
pub fn v1beta4_to_v1(config: InstallConfig) -> Result<InstallConfig, UpconvertError> {
    map_networking(config, |networking| {
        let networking = convert_cluster_networks(networking)?;
        convert_service_cidr(networking)
    })
}

/// Deprecated fields are still accepted in current documents.
fn fold_deprecated(config: InstallConfig) -> Result<InstallConfig, UpconvertError> {
    let config = v1beta3_to_v1beta4(config)?;
    v1beta4_to_v1(config)
}

fn map_networking(
    mut config: InstallConfig,
    convert: impl FnOnce(Networking) -> Result<Networking, UpconvertError>,
) -> Result<InstallConfig, UpconvertError> {
    config.networking = config.networking.map(convert).transpose()?;
    Ok(config)
}

fn convert_machine_cidr(mut networking: Networking) -> Result<Networking, UpconvertError> {
    if let Some(cidr) = networking.deprecated_machine_cidr.take() {
        let replacement = vec![MachineNetworkEntry { cidr }];
        if networking.machine_network.is_empty() {
            networking.machine_network = replacement;
        } else if networking.machine_network != replacement {
            return Err(UpconvertError::Conflict {
                deprecated: "networking.machineCIDR",
                replacement: "networking.machineNetwork",
            });
        }
    }
    Ok(networking)
}

fn convert_network_type(mut networking: Networking) -> Result<Networking, UpconvertError> {
    if let Some(network_type) = networking.deprecated_type.take() {
        if networking.network_type.is_empty() {
            networking.network_type = network_type;
        } else if networking.network_type != network_type {
            return Err(UpconvertError::Conflict {
                deprecated: "networking.type",
                replacement: "networking.networkType",
            });
        }
    }
    Ok(networking)
}

fn convert_cluster_networks(mut networking: Networking) -> Result<Networking, UpconvertError> {
    if networking.deprecated_cluster_networks.is_empty() {
        return Ok(networking);
    }

    let deprecated = std::mem::take(&mut networking.deprecated_cluster_networks);
    let mut replacement = Vec::with_capacity(deprecated.len());
    for (i, entry) in deprecated.into_iter().enumerate() {
        let bits = entry.cidr.address_bits();
        if entry.host_subnet_length > bits {
            return Err(UpconvertError::HostSubnetLength {
                field: format!("networking.clusterNetworks[{}].hostSubnetLength", i),
                length: entry.host_subnet_length,
                cidr: entry.cidr.to_string(),
            });
        }
        replacement.push(ClusterNetworkEntry {
            cidr: entry.cidr,
            host_prefix: bits - entry.host_subnet_length,
        });
    }

    if networking.cluster_network.is_empty() {
        networking.cluster_network = replacement;
    } else if networking.cluster_network != replacement {
        return Err(UpconvertError::Conflict {
            deprecated: "networking.clusterNetworks",
            replacement: "networking.clusterNetwork",
        });
    }
    Ok(networking)
}

fn convert_service_cidr(mut networking: Networking) -> Result<Networking, UpconvertError> {
    if let Some(cidr) = networking.deprecated_service_cidr.take() {
        if networking.service_network.is_empty() {
            networking.service_network = vec![cidr];
        } else if networking.service_network != [cidr] {
            return Err(UpconvertError::Conflict {
                deprecated: "networking.serviceCIDR",
                replacement: "networking.serviceNetwork",
            });
        }
    }
    Ok(networking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cidr::Cidr;
    use crate::config::fixtures::sample_config;
    use crate::config::model::DeprecatedClusterNetworkEntry;

    fn cidr(s: &str) -> Cidr {
        s.parse().unwrap()
    }

    fn with_networking(version: &str, networking: Networking) -> InstallConfig {
        let mut config = sample_config();
        config.api_version = version.to_string();
        config.networking = Some(networking);
        config
    }

    #[test]
    fn v1beta3_moves_machine_cidr_and_type() {
        let config = with_networking(
            "v1beta3",
            Networking {
                deprecated_machine_cidr: Some(cidr("10.0.0.0/16")),
                deprecated_type: Some("OpenShiftSDN".to_string()),
                ..Default::default()
            },
        );

        let networking = v1beta3_to_v1beta4(config).unwrap().networking.unwrap();
        assert_eq!(networking.machine_network[0].cidr, cidr("10.0.0.0/16"));
        assert_eq!(networking.network_type, "OpenShiftSDN");
        assert!(!networking.has_deprecated_fields());
    }

    #[test]
    fn v1beta4_converts_host_subnet_length() {
        let config = with_networking(
            "v1beta4",
            Networking {
                deprecated_cluster_networks: vec![DeprecatedClusterNetworkEntry {
                    cidr: cidr("10.128.0.0/14"),
                    host_subnet_length: 9,
                }],
                deprecated_service_cidr: Some(cidr("172.30.0.0/16")),
                ..Default::default()
            },
        );

        let networking = v1beta4_to_v1(config).unwrap().networking.unwrap();
        assert_eq!(networking.cluster_network[0].host_prefix, 23);
        assert_eq!(networking.service_network, vec![cidr("172.30.0.0/16")]);
        assert!(!networking.has_deprecated_fields());
    }

    #[test]
    fn oversized_host_subnet_length() {
        let config = with_networking(
            "v1beta4",
            Networking {
                deprecated_cluster_networks: vec![DeprecatedClusterNetworkEntry {
                    cidr: cidr("10.128.0.0/14"),
                    host_subnet_length: 40,
                }],
                ..Default::default()
            },
        );

        assert!(matches!(
            v1beta4_to_v1(config),
            Err(UpconvertError::HostSubnetLength { length: 40, .. })
        ));
    }

    #[test]
    fn conflicting_old_and_new_fields() {
        let config = with_networking(
            "v1beta3",
            Networking {
                network_type: "OVNKubernetes".to_string(),
                deprecated_type: Some("OpenShiftSDN".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(
            upconvert(config).unwrap_err(),
            UpconvertError::Conflict {
                deprecated: "networking.type",
                replacement: "networking.networkType",
            }
        );
    }

    #[test]
    fn identical_old_and_new_fields_are_accepted() {
        let config = with_networking(
            "v1",
            Networking {
                service_network: vec![cidr("172.30.0.0/16")],
                deprecated_service_cidr: Some(cidr("172.30.0.0/16")),
                ..Default::default()
            },
        );

        let networking = upconvert(config).unwrap().networking.unwrap();
        assert_eq!(networking.service_network.len(), 1);
        assert!(networking.deprecated_service_cidr.is_none());
    }

    #[test]
    fn full_chain_reaches_current() {
        let config = with_networking(
            "v1beta3",
            Networking {
                deprecated_machine_cidr: Some(cidr("10.0.0.0/16")),
                deprecated_cluster_networks: vec![DeprecatedClusterNetworkEntry {
                    cidr: cidr("10.128.0.0/14"),
                    host_subnet_length: 9,
                }],
                ..Default::default()
            },
        );

        let config = upconvert(config).unwrap();
        assert_eq!(config.api_version, SchemaVersion::CURRENT.as_str());
        assert!(!config.networking.unwrap().has_deprecated_fields());
    }

    #[test]
    fn current_documents_pass_through() {
        let config = sample_config();
        assert_eq!(upconvert(config.clone()).unwrap(), config);
    }

    #[test]
    fn unknown_versions_are_rejected() {
        for version in ["", "v2", "v1alpha1"] {
            let mut config = sample_config();
            config.api_version = version.to_string();
            assert_eq!(
                upconvert(config).unwrap_err(),
                UpconvertError::UnsupportedVersion(version.to_string())
            );
        }
    }
}
