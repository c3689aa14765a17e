//! Nutanix AOS via Prism Central.

use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

pub const DEFAULT_PRISM_PORT: u16 = 9440;

/// Nutanix platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NutanixPlatform {
    #[serde(default)]
    pub prism_central: PrismCentral,
    #[serde(rename = "subnetUUIDs", default)]
    pub subnet_uuids: Vec<String>,
    #[serde(rename = "apiVIP", default, skip_serializing_if = "Option::is_none")]
    pub api_vip: Option<IpAddr>,
    #[serde(rename = "ingressVIP", default, skip_serializing_if = "Option::is_none")]
    pub ingress_vip: Option<IpAddr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrismCentral {
    #[serde(default)]
    pub endpoint: PrismEndpoint,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrismEndpoint {
    #[serde(default)]
    pub address: String,
    /// Zero until defaulted.
    #[serde(default)]
    pub port: u16,
}

pub fn apply_defaults(mut p: NutanixPlatform) -> NutanixPlatform {
    if p.prism_central.endpoint.port == 0 {
        p.prism_central.endpoint.port = DEFAULT_PRISM_PORT;
    }
    p
}

pub fn validate_structure(p: &NutanixPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = format!("{}.prismCentral", PlatformKind::Nutanix.field_path());

    for (field, value) in [
        ("endpoint.address", &p.prism_central.endpoint.address),
        ("username", &p.prism_central.username),
        ("password", &p.prism_central.password),
    ] {
        if value.is_empty() {
            result.add(ValidationIssue::required(format!("{}.{}", base, field)));
        }
    }

    if p.subnet_uuids.is_empty() {
        result.add(ValidationIssue::required(format!(
            "{}.subnetUUIDs",
            PlatformKind::Nutanix.field_path()
        )));
    }

    result
}

/// Checks the Prism Central endpoint and network selection.
pub struct NutanixValidator;

#[async_trait]
impl PlatformValidator for NutanixValidator {
    async fn validate(
        &self,
        _client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let p = match &config.platform {
            Some(Platform::Nutanix(p)) => p,
            _ => return result,
        };
        let base = PlatformKind::Nutanix.field_path();

        if p.prism_central.endpoint.port == 0 {
            result.add(ValidationIssue::error(
                format!("{}.prismCentral.endpoint.port", base),
                "port must be between 1 and 65535",
            ));
        }

        if p.subnet_uuids.len() > 1 {
            result.add(ValidationIssue::error(
                format!("{}.subnetUUIDs", base),
                format!("only one subnet is supported, got {}", p.subnet_uuids.len()),
            ));
        }

        if p.api_vip.is_some() && p.api_vip == p.ingress_vip {
            result.add(ValidationIssue::error(
                format!("{}.ingressVIP", base),
                "IPs for both API and Ingress should not be the same",
            ));
        }

        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::local(NutanixValidator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_config;

    const YAML: &str = "prismCentral:
  endpoint:
    address: pc.example.com
  username: admin
  password: secret
subnetUUIDs: [c7938dc6-7659-453e-a688-e26020c68e43]
";

    #[test]
    fn port_defaults_to_prism_central() {
        let p: NutanixPlatform = serde_yaml::from_str(YAML).unwrap();
        assert_eq!(p.prism_central.endpoint.port, 0);
        assert_eq!(apply_defaults(p).prism_central.endpoint.port, DEFAULT_PRISM_PORT);
    }

    #[test]
    fn endpoint_credentials_and_subnet_required() {
        let result = validate_structure(&NutanixPlatform::default());
        let paths: Vec<_> = result.errors().map(|i| i.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "platform.nutanix.prismCentral.endpoint.address",
                "platform.nutanix.prismCentral.username",
                "platform.nutanix.prismCentral.password",
                "platform.nutanix.subnetUUIDs",
            ]
        );
    }

    #[tokio::test]
    async fn single_subnet_and_defaulted_port() {
        let mut p: NutanixPlatform = serde_yaml::from_str(YAML).unwrap();
        let mut config = sample_config();
        config.platform = Some(Platform::Nutanix(p.clone()));
        assert_eq!(NutanixValidator.validate(None, &config).await.error_count(), 1);

        p = apply_defaults(p);
        p.subnet_uuids.push("another".to_string());
        config.platform = Some(Platform::Nutanix(p));
        let errors = NutanixValidator.validate(None, &config).await.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "platform.nutanix.subnetUUIDs");
    }
}
