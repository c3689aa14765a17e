//! Red Hat Virtualization (oVirt).

use std::net::IpAddr;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

static UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("valid regex")
});

/// oVirt platform settings. Keys are snake_case on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OvirtPlatform {
    #[serde(default)]
    pub ovirt_cluster_id: String,
    #[serde(default)]
    pub ovirt_storage_domain_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ovirt_network_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_vip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_vip: Option<IpAddr>,
}

pub fn validate_structure(p: &OvirtPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::Ovirt.field_path();

    if p.ovirt_cluster_id.is_empty() {
        result.add(ValidationIssue::required(format!("{}.ovirt_cluster_id", base)));
    }
    if p.ovirt_storage_domain_id.is_empty() {
        result.add(ValidationIssue::required(format!("{}.ovirt_storage_domain_id", base)));
    }
    if p.api_vip.is_none() {
        result.add(ValidationIssue::required(format!("{}.api_vip", base)));
    }
    if p.ingress_vip.is_none() {
        result.add(ValidationIssue::required(format!("{}.ingress_vip", base)));
    }

    result
}

/// Checks identifier formats and VIP assignment.
pub struct OvirtValidator;

#[async_trait]
impl PlatformValidator for OvirtValidator {
    async fn validate(
        &self,
        _client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let p = match &config.platform {
            Some(Platform::Ovirt(p)) => p,
            _ => return result,
        };
        let base = PlatformKind::Ovirt.field_path();

        for (field, id) in [
            ("ovirt_cluster_id", &p.ovirt_cluster_id),
            ("ovirt_storage_domain_id", &p.ovirt_storage_domain_id),
        ] {
            if !UUID.is_match(id) {
                result.add(ValidationIssue::error(
                    format!("{}.{}", base, field),
                    format!("{:?} is not a UUID", id),
                ));
            }
        }

        if p.api_vip.is_some() && p.api_vip == p.ingress_vip {
            result.add(ValidationIssue::error(
                format!("{}.ingress_vip", base),
                "IPs for both API and Ingress should not be the same",
            ));
        }

        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::local(OvirtValidator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_config;

    const YAML: &str = "ovirt_cluster_id: 5a1f3b4e-8c2d-4f6a-9b7c-0d1e2f3a4b5c
ovirt_storage_domain_id: 7c9d0e1f-2a3b-4c5d-8e6f-a0b1c2d3e4f5
api_vip: 192.168.1.10
ingress_vip: 192.168.1.11
";

    #[test]
    fn snake_case_wire_form() {
        let p: OvirtPlatform = serde_yaml::from_str(YAML).unwrap();
        assert!(validate_structure(&p).is_valid());
        assert!(serde_yaml::from_str::<OvirtPlatform>("ovirtClusterId: x\n").is_err());
    }

    #[test]
    fn ids_and_vips_required() {
        assert_eq!(validate_structure(&OvirtPlatform::default()).error_count(), 4);
    }

    #[tokio::test]
    async fn ids_must_be_uuids_and_vips_distinct() {
        let mut p: OvirtPlatform = serde_yaml::from_str(YAML).unwrap();
        p.ovirt_cluster_id = "cluster-1".to_string();
        p.ingress_vip = p.api_vip;

        let mut config = sample_config();
        config.platform = Some(Platform::Ovirt(p));
        let paths: Vec<_> = OvirtValidator
            .validate(None, &config)
            .await
            .errors()
            .map(|i| i.path.clone())
            .collect();
        assert_eq!(paths, vec!["platform.ovirt.ovirt_cluster_id", "platform.ovirt.ingress_vip"]);
    }
}
