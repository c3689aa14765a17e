//! VMware vSphere.

use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

/// vSphere platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VSpherePlatform {
    /// vCenter host name, without a scheme.
    #[serde(rename = "vCenter", default)]
    pub vcenter: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub datacenter: String,
    #[serde(default)]
    pub default_datastore: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    /// Absolute inventory path of the VM folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(rename = "apiVIP", default, skip_serializing_if = "Option::is_none")]
    pub api_vip: Option<IpAddr>,
    #[serde(rename = "ingressVIP", default, skip_serializing_if = "Option::is_none")]
    pub ingress_vip: Option<IpAddr>,
}

pub fn validate_structure(p: &VSpherePlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::VSphere.field_path();

    for (field, value) in [
        ("vCenter", &p.vcenter),
        ("username", &p.username),
        ("password", &p.password),
        ("datacenter", &p.datacenter),
        ("defaultDatastore", &p.default_datastore),
    ] {
        if value.is_empty() {
            result.add(ValidationIssue::required(format!("{}.{}", base, field)));
        }
    }

    match (p.api_vip, p.ingress_vip) {
        (Some(api), Some(ingress)) if api == ingress => result.add(ValidationIssue::error(
            format!("{}.ingressVIP", base),
            "IPs for both API and Ingress should not be the same",
        )),
        (Some(_), None) => result.add(ValidationIssue::required(format!("{}.ingressVIP", base))),
        (None, Some(_)) => result.add(ValidationIssue::required(format!("{}.apiVIP", base))),
        _ => {}
    }

    result
}

/// Checks vCenter addressing and inventory paths.
pub struct VSphereValidator;

#[async_trait]
impl PlatformValidator for VSphereValidator {
    async fn validate(
        &self,
        _client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let p = match &config.platform {
            Some(Platform::VSphere(p)) => p,
            _ => return result,
        };
        let base = PlatformKind::VSphere.field_path();

        if p.vcenter.contains("://") {
            result.add(
                ValidationIssue::error(
                    format!("{}.vCenter", base),
                    format!("{:?} must be a host name, not a URL", p.vcenter),
                )
                .with_suggestion("remove the scheme and any path"),
            );
        }

        if let Some(folder) = &p.folder {
            let expected = format!("/{}/vm/", p.datacenter);
            if !folder.starts_with(&expected) {
                result.add(ValidationIssue::error(
                    format!("{}.folder", base),
                    format!("folder must be absolute and below {}", expected),
                ));
            }
        }

        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::local(VSphereValidator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_config;

    fn platform() -> VSpherePlatform {
        VSpherePlatform {
            vcenter: "vcenter.example.com".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            datacenter: "dc1".to_string(),
            default_datastore: "ds1".to_string(),
            ..Default::default()
        }
    }

    async fn semantic(p: VSpherePlatform) -> ValidationResult {
        let mut config = sample_config();
        config.platform = Some(Platform::VSphere(p));
        VSphereValidator.validate(None, &config).await
    }

    #[test]
    fn credentials_and_inventory_required() {
        let result = validate_structure(&VSpherePlatform::default());
        assert_eq!(result.error_count(), 5);
        assert!(validate_structure(&platform()).is_valid());
    }

    #[test]
    fn vips_come_in_distinct_pairs() {
        let mut p = platform();
        p.api_vip = Some("10.0.0.5".parse().unwrap());
        let paths: Vec<_> = validate_structure(&p).errors().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec!["platform.vsphere.ingressVIP"]);

        p.ingress_vip = p.api_vip;
        assert!(!validate_structure(&p).is_valid());

        p.ingress_vip = Some("10.0.0.6".parse().unwrap());
        assert!(validate_structure(&p).is_valid());
    }

    #[tokio::test]
    async fn vcenter_must_not_be_a_url() {
        let mut p = platform();
        p.vcenter = "https://vcenter.example.com/sdk".to_string();
        assert!(!semantic(p).await.is_valid());
    }

    #[tokio::test]
    async fn folder_lives_under_datacenter() {
        let mut p = platform();
        p.folder = Some("/dc1/vm/ocp".to_string());
        assert!(semantic(p.clone()).await.is_valid());

        p.folder = Some("ocp".to_string());
        let errors = semantic(p).await.into_errors();
        assert_eq!(errors[0].message, "folder must be absolute and below /dc1/vm/");
    }
}
