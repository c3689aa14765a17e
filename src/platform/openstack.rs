//! OpenStack.

use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

/// Entry in `clouds.yaml` used when none is named.
pub const DEFAULT_CLOUD: &str = "openstack";

/// OpenStack platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OpenStackPlatform {
    /// Entry in `clouds.yaml` holding the credentials.
    #[serde(default)]
    pub cloud: String,
    #[serde(default)]
    pub external_network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_flavor: Option<String>,
    #[serde(rename = "apiFloatingIP", default, skip_serializing_if = "Option::is_none")]
    pub api_floating_ip: Option<IpAddr>,
    #[serde(rename = "ingressFloatingIP", default, skip_serializing_if = "Option::is_none")]
    pub ingress_floating_ip: Option<IpAddr>,
    #[serde(rename = "externalDNS", default, skip_serializing_if = "Vec::is_empty")]
    pub external_dns: Vec<IpAddr>,
}

pub fn apply_defaults(mut p: OpenStackPlatform) -> OpenStackPlatform {
    if p.cloud.is_empty() {
        p.cloud = DEFAULT_CLOUD.to_string();
    }
    p
}

pub fn validate_structure(p: &OpenStackPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::OpenStack.field_path();

    if p.cloud.is_empty() {
        result.add(ValidationIssue::required(format!("{}.cloud", base)));
    }
    if p.external_network.is_empty() {
        result.add(ValidationIssue::required(format!("{}.externalNetwork", base)));
    }

    result
}

/// Checks floating IP and DNS assignments.
pub struct OpenStackValidator;

#[async_trait]
impl PlatformValidator for OpenStackValidator {
    async fn validate(
        &self,
        _client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let p = match &config.platform {
            Some(Platform::OpenStack(p)) => p,
            _ => return result,
        };
        let base = PlatformKind::OpenStack.field_path();

        if p.api_floating_ip.is_some() && p.api_floating_ip == p.ingress_floating_ip {
            result.add(ValidationIssue::error(
                format!("{}.ingressFloatingIP", base),
                "ingressFloatingIP can not be the same as apiFloatingIP",
            ));
        }

        let mut seen = Vec::new();
        for (i, server) in p.external_dns.iter().enumerate() {
            if seen.contains(server) {
                result.add(ValidationIssue::warning(
                    format!("{}.externalDNS[{}]", base, i),
                    format!("duplicate DNS server {}", server),
                ));
            }
            seen.push(*server);
        }

        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::local(OpenStackValidator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_config;

    #[test]
    fn cloud_defaults_and_external_network_required() {
        let p = apply_defaults(OpenStackPlatform::default());
        assert_eq!(p.cloud, DEFAULT_CLOUD);

        let paths: Vec<_> = validate_structure(&p).errors().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec!["platform.openstack.externalNetwork"]);
    }

    #[test]
    fn explicit_cloud_is_kept() {
        let p = apply_defaults(OpenStackPlatform {
            cloud: "shiftstack".to_string(),
            ..Default::default()
        });
        assert_eq!(p.cloud, "shiftstack");
    }

    #[tokio::test]
    async fn floating_ips_must_differ() {
        let p: OpenStackPlatform = serde_yaml::from_str(
            "cloud: c\nexternalNetwork: public\napiFloatingIP: 203.0.113.5\ningressFloatingIP: 203.0.113.5\nexternalDNS: [1.1.1.1, 1.1.1.1]\n",
        )
        .unwrap();
        let mut config = sample_config();
        config.platform = Some(Platform::OpenStack(p));

        let result = OpenStackValidator.validate(None, &config).await;
        assert_eq!(result.error_count(), 1);
        assert_eq!(result.warnings().count(), 1);
    }
}
