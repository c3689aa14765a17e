//! IBM Cloud VPC.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::{check_region, missing_client, CloudProfile, HttpClientBuilder};
use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

pub const PROFILE: CloudProfile = CloudProfile {
    kind: PlatformKind::IbmCloud,
    regions: &[
        "au-syd", "br-sao", "ca-tor", "eu-de", "eu-gb", "jp-osa", "jp-tok", "us-east", "us-south",
    ],
    credentials: &[&["IC_API_KEY"], &["IBMCLOUD_API_KEY"]],
};

/// IBM Cloud platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IbmCloudPlatform {
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub control_plane_subnets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compute_subnets: Vec<String>,
}

/// Client metadata for IBM Cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbmCloudMetadata {
    pub base_domain: String,
    pub region: String,
}

impl IbmCloudMetadata {
    pub fn new(base_domain: String, region: String) -> Self {
        Self { base_domain, region }
    }
}

pub fn validate_structure(p: &IbmCloudPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::IbmCloud.field_path();

    if p.region.is_empty() {
        result.add(ValidationIssue::required(format!("{}.region", base)));
    }

    let has_subnets = !p.control_plane_subnets.is_empty() || !p.compute_subnets.is_empty();
    if has_subnets && p.vpc_name.is_none() {
        result.add(ValidationIssue::required(format!("{}.vpcName", base)).with_suggestion(
            "subnets can only be given for an existing VPC",
        ));
    }
    if p.vpc_name.is_some() && p.resource_group_name.is_none() {
        result.add(ValidationIssue::required(format!("{}.resourceGroupName", base)));
    }

    result
}

/// Checks the region against the live API.
pub struct IbmCloudValidator;

#[async_trait]
impl PlatformValidator for IbmCloudValidator {
    async fn validate(
        &self,
        client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let (client, p) = match (client, &config.platform) {
            (Some(client), Some(Platform::IbmCloud(p))) => (client, p),
            _ => return missing_client(PlatformKind::IbmCloud),
        };

        let mut result = ValidationResult::new();
        let path = format!("{}.region", PlatformKind::IbmCloud.field_path());
        check_region(client, &path, &p.region, &mut result).await;
        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::remote(HttpClientBuilder::new(PROFILE), IbmCloudValidator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_required() {
        let result = validate_structure(&IbmCloudPlatform::default());
        assert_eq!(result.error_count(), 1);

        let p = IbmCloudPlatform {
            region: "us-south".to_string(),
            ..Default::default()
        };
        assert!(validate_structure(&p).is_valid());
    }

    #[test]
    fn existing_vpc_needs_resource_group() {
        let p = IbmCloudPlatform {
            region: "us-south".to_string(),
            compute_subnets: vec!["workers".to_string()],
            ..Default::default()
        };
        let paths: Vec<_> = validate_structure(&p).errors().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec!["platform.ibmcloud.vpcName"]);

        let p = IbmCloudPlatform {
            vpc_name: Some("vpc".to_string()),
            ..p
        };
        let paths: Vec<_> = validate_structure(&p).errors().map(|i| i.path.clone()).collect();
        assert_eq!(paths, vec!["platform.ibmcloud.resourceGroupName"]);
    }
}
