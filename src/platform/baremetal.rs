//! Installer-provisioned bare metal.

use std::collections::HashSet;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::PlatformKind;
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

static MAC_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}$").expect("valid regex"));

const HOST_ROLES: &[&str] = &["master", "worker"];

/// How the provisioning network is managed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningNetwork {
    #[default]
    Managed,
    Unmanaged,
    Disabled,
}

/// Bare metal platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BareMetalPlatform {
    #[serde(rename = "apiVIP", default, skip_serializing_if = "Option::is_none")]
    pub api_vip: Option<IpAddr>,
    #[serde(rename = "ingressVIP", default, skip_serializing_if = "Option::is_none")]
    pub ingress_vip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_network: Option<ProvisioningNetwork>,
    #[serde(default)]
    pub hosts: Vec<Host>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Host {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub bmc: Bmc,
    #[serde(rename = "bootMACAddress", default)]
    pub boot_mac_address: String,
}

/// Baseboard management controller access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Bmc {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub fn apply_defaults(mut p: BareMetalPlatform) -> BareMetalPlatform {
    if p.provisioning_network.is_none() {
        p.provisioning_network = Some(ProvisioningNetwork::default());
    }
    p
}

/// Checks VIPs against the machine network and the host inventory.
pub fn validate_structure(p: &BareMetalPlatform, config: &InstallConfig) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::BareMetal.field_path();

    let machine_networks: Vec<_> = config
        .networking
        .iter()
        .flat_map(|n| n.machine_network.iter().map(|entry| entry.cidr))
        .collect();

    for (field, vip) in [("apiVIP", p.api_vip), ("ingressVIP", p.ingress_vip)] {
        let path = format!("{}.{}", base, field);
        match vip {
            None => result.add(ValidationIssue::required(path)),
            Some(ip) if !machine_networks.is_empty() && !machine_networks.iter().any(|c| c.contains(&ip)) => {
                result.add(ValidationIssue::error(
                    path,
                    format!("IP {} is not in the machine network", ip),
                ))
            }
            Some(_) => {}
        }
    }

    if p.api_vip.is_some() && p.api_vip == p.ingress_vip {
        result.add(ValidationIssue::error(
            format!("{}.ingressVIP", base),
            "IPs for both API and Ingress should not be the same",
        ));
    }

    if p.hosts.is_empty() {
        result.add(ValidationIssue::required(format!("{}.hosts", base)));
    }

    let mut names = HashSet::new();
    let mut macs = HashSet::new();
    for (i, host) in p.hosts.iter().enumerate() {
        let path = format!("{}.hosts[{}]", base, i);

        if host.name.is_empty() {
            result.add(ValidationIssue::required(format!("{}.name", path)));
        } else if !names.insert(host.name.as_str()) {
            result.add(ValidationIssue::error(
                format!("{}.name", path),
                format!("Duplicate value: {:?}", host.name),
            ));
        }

        if let Some(role) = &host.role {
            if !HOST_ROLES.contains(&role.as_str()) {
                result.add(ValidationIssue::unsupported(format!("{}.role", path), role, HOST_ROLES));
            }
        }

        if host.bmc.address.is_empty() {
            result.add(ValidationIssue::required(format!("{}.bmc.address", path)));
        }

        let mac = host.boot_mac_address.to_ascii_lowercase();
        if !MAC_ADDRESS.is_match(&mac) {
            result.add(ValidationIssue::error(
                format!("{}.bootMACAddress", path),
                format!("{:?} is not a MAC address", host.boot_mac_address),
            ));
        } else if !macs.insert(mac) {
            result.add(ValidationIssue::error(
                format!("{}.bootMACAddress", path),
                format!("Duplicate value: {:?}", host.boot_mac_address),
            ));
        }
    }

    result
}
