//! Network topology validation.

use crate::config::cidr::Cidr;
use crate::config::model::Networking;

use super::{ValidationIssue, ValidationResult};

/// Network plugins shipped with the platform.
const KNOWN_NETWORK_TYPES: &[&str] = &["OVNKubernetes", "OpenShiftSDN"];

/// Validates CIDR shapes, host prefixes and overlaps between the machine,
/// service and cluster networks.
pub fn validate(networking: &Networking) -> ValidationResult {
    let mut result = ValidationResult::new();

    if networking.network_type.is_empty() {
        result.add(ValidationIssue::required("networking.networkType"));
    } else if !KNOWN_NETWORK_TYPES.contains(&networking.network_type.as_str()) {
        result.add(
            ValidationIssue::warning(
                "networking.networkType",
                format!("{:?} is not a bundled network plugin", networking.network_type),
            )
            .with_suggestion(format!("bundled plugins: {}", KNOWN_NETWORK_TYPES.join(", "))),
        );
    }

    validate_deprecated_unset(networking, &mut result);

    // Named networks, collected for the overlap check
    let mut named: Vec<(String, Cidr)> = Vec::new();

    if networking.machine_network.is_empty() {
        result.add(ValidationIssue::required("networking.machineNetwork"));
    }
    for (i, entry) in networking.machine_network.iter().enumerate() {
        let path = format!("networking.machineNetwork[{}].cidr", i);
        validate_network_address(&entry.cidr, &path, &mut result);
    }

    if networking.service_network.is_empty() {
        result.add(ValidationIssue::required("networking.serviceNetwork"));
    }
    let ipv4_services = networking.service_network.iter().filter(|c| c.is_ipv4()).count();
    let ipv6_services = networking.service_network.len() - ipv4_services;
    if ipv4_services > 1 || ipv6_services > 1 {
        result.add(ValidationIssue::error(
            "networking.serviceNetwork",
            "only one service network can be specified per address family",
        ));
    }
    for (i, cidr) in networking.service_network.iter().enumerate() {
        let path = format!("networking.serviceNetwork[{}]", i);
        validate_network_address(cidr, &path, &mut result);
        for entry in &networking.machine_network {
            if cidr.overlaps(&entry.cidr) {
                result.add(ValidationIssue::error(
                    path.clone(),
                    format!("service network {} overlaps with machine network {}", cidr, entry.cidr),
                ));
            }
        }
        named.push((path, *cidr));
    }

    if networking.cluster_network.is_empty() {
        result.add(ValidationIssue::required("networking.clusterNetwork"));
    }
    for (i, entry) in networking.cluster_network.iter().enumerate() {
        let prefix = format!("networking.clusterNetwork[{}]", i);
        let cidr_path = format!("{}.cidr", prefix);
        validate_network_address(&entry.cidr, &cidr_path, &mut result);
        validate_host_prefix(&entry.cidr, entry.host_prefix, &format!("{}.hostPrefix", prefix), &mut result);

        for machine in &networking.machine_network {
            if entry.cidr.overlaps(&machine.cidr) {
                result.add(ValidationIssue::error(
                    cidr_path.clone(),
                    format!("cluster network {} overlaps with machine network {}", entry.cidr, machine.cidr),
                ));
            }
        }
        for (other_path, other) in &named {
            if entry.cidr.overlaps(other) {
                result.add(ValidationIssue::error(
                    cidr_path.clone(),
                    format!("cluster network {} overlaps with {} ({})", entry.cidr, other_path, other),
                ));
            }
        }
        named.push((cidr_path, entry.cidr));
    }

    result
}

fn validate_network_address(cidr: &Cidr, path: &str, result: &mut ValidationResult) {
    if !cidr.is_network_address() {
        result.add(ValidationIssue::error(
            path,
            format!(
                "invalid network address. got {}, expecting {}/{}",
                cidr,
                cidr.network(),
                cidr.prefix()
            ),
        ));
    }
}

fn validate_host_prefix(cidr: &Cidr, host_prefix: u8, path: &str, result: &mut ValidationResult) {
    if host_prefix < cidr.prefix() {
        result.add(ValidationIssue::error(
            path,
            format!(
                "cluster network host subnetwork prefix {} must not be larger than the network prefix {}",
                host_prefix,
                cidr.prefix()
            ),
        ));
        return;
    }

    // Leave room for at least a handful of pod addresses per node
    let limit = if cidr.is_ipv4() { 30 } else { 126 };
    if host_prefix > limit {
        result.add(ValidationIssue::error(
            path,
            format!("host prefix {} must be at most {}", host_prefix, limit),
        ));
    }
}

fn validate_deprecated_unset(networking: &Networking, result: &mut ValidationResult) {
    let deprecated = [
        (networking.deprecated_machine_cidr.is_some(), "machineCIDR", "machineNetwork"),
        (networking.deprecated_type.is_some(), "type", "networkType"),
        (!networking.deprecated_cluster_networks.is_empty(), "clusterNetworks", "clusterNetwork"),
        (networking.deprecated_service_cidr.is_some(), "serviceCIDR", "serviceNetwork"),
    ];

    for (set, field, replacement) in deprecated {
        if set {
            result.add(
                ValidationIssue::error(format!("networking.{}", field), "Forbidden: deprecated field")
                    .with_suggestion(format!("use networking.{} instead", replacement)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::default_networking;
    use crate::config::model::{ClusterNetworkEntry, MachineNetworkEntry};

    fn cidr(s: &str) -> Cidr {
        s.parse().unwrap()
    }

    fn error_paths(networking: &Networking) -> Vec<String> {
        validate(networking).errors().map(|i| i.path.clone()).collect()
    }

    #[test]
    fn defaults_are_valid() {
        let result = validate(&default_networking(cidr("10.0.0.0/16")));
        assert!(result.is_valid());
        assert_eq!(result.issue_count(), 0);
    }

    #[test]
    fn host_bits_set() {
        let mut networking = default_networking(cidr("10.0.0.0/16"));
        networking.machine_network = vec![MachineNetworkEntry { cidr: cidr("10.0.0.5/16") }];
        let result = validate(&networking);
        let issue = result.errors().next().unwrap();
        assert_eq!(issue.path, "networking.machineNetwork[0].cidr");
        assert_eq!(issue.message, "invalid network address. got 10.0.0.5/16, expecting 10.0.0.0/16");
    }

    #[test]
    fn overlapping_networks() {
        let mut networking = default_networking(cidr("10.128.0.0/16"));
        networking.service_network = vec![cidr("10.128.0.0/24")];
        let paths = error_paths(&networking);
        assert!(paths.contains(&"networking.serviceNetwork[0]".to_string()));
        assert!(paths.contains(&"networking.clusterNetwork[0].cidr".to_string()));
    }

    #[test]
    fn host_prefix_bounds() {
        let mut networking = default_networking(cidr("10.0.0.0/16"));
        networking.cluster_network = vec![ClusterNetworkEntry {
            cidr: cidr("10.128.0.0/14"),
            host_prefix: 12,
        }];
        assert_eq!(error_paths(&networking), vec!["networking.clusterNetwork[0].hostPrefix"]);

        networking.cluster_network[0].host_prefix = 31;
        assert_eq!(error_paths(&networking), vec!["networking.clusterNetwork[0].hostPrefix"]);
    }

    #[test]
    fn one_service_network_per_family() {
        let mut networking = default_networking(cidr("10.0.0.0/16"));
        networking.service_network.push(cidr("172.31.0.0/16"));
        networking.service_network.push(cidr("fd02::/112"));
        assert_eq!(error_paths(&networking), vec!["networking.serviceNetwork"]);
    }

    #[test]
    fn unknown_plugin_is_a_warning() {
        let mut networking = default_networking(cidr("10.0.0.0/16"));
        networking.network_type = "Calico".to_string();
        let result = validate(&networking);
        assert!(result.is_valid());
        assert_eq!(result.warnings().count(), 1);
    }

    #[test]
    fn deprecated_fields_are_forbidden() {
        let mut networking = default_networking(cidr("10.0.0.0/16"));
        networking.deprecated_type = Some("OpenShiftSDN".to_string());
        assert_eq!(error_paths(&networking), vec!["networking.type"]);
    }
}
