//! Microsoft Azure, including Azure Stack Hub.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::{check_endpoint, check_region, missing_client, CloudProfile, HttpClientBuilder};
use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

pub const PROFILE: CloudProfile = CloudProfile {
    kind: PlatformKind::Azure,
    regions: &[
        "australiaeast",
        "brazilsouth",
        "canadacentral",
        "centralindia",
        "centralus",
        "eastasia",
        "eastus",
        "eastus2",
        "francecentral",
        "germanywestcentral",
        "japaneast",
        "koreacentral",
        "northcentralus",
        "northeurope",
        "norwayeast",
        "southafricanorth",
        "southcentralus",
        "southeastasia",
        "swedencentral",
        "switzerlandnorth",
        "uaenorth",
        "uksouth",
        "westeurope",
        "westus",
        "westus2",
        "westus3",
    ],
    credentials: &[
        &[
            "AZURE_CLIENT_ID",
            "AZURE_CLIENT_SECRET",
            "AZURE_TENANT_ID",
            "AZURE_SUBSCRIPTION_ID",
        ],
        &["AZURE_AUTH_LOCATION"],
    ],
};

/// Azure cloud environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AzureCloudName {
    #[default]
    AzurePublicCloud,
    AzureUSGovernmentCloud,
    AzureChinaCloud,
    AzureGermanCloud,
    AzureStackCloud,
}

/// Azure platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AzurePlatform {
    #[serde(default)]
    pub region: String,
    /// Resource group holding the base domain's DNS zone.
    #[serde(default)]
    pub base_domain_resource_group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_name: Option<AzureCloudName>,
    /// Resource manager endpoint; only meaningful on Azure Stack Hub.
    #[serde(rename = "armEndpoint", default, skip_serializing_if = "Option::is_none")]
    pub arm_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_resource_group_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_network: Option<String>,
}

/// Client metadata for Azure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureMetadata {
    pub cloud_name: AzureCloudName,
    pub arm_endpoint: Option<String>,
}

impl AzureMetadata {
    pub fn new(cloud_name: AzureCloudName, arm_endpoint: Option<String>) -> Self {
        Self {
            cloud_name,
            arm_endpoint,
        }
    }
}

pub fn apply_defaults(mut p: AzurePlatform) -> AzurePlatform {
    if p.cloud_name.is_none() {
        p.cloud_name = Some(AzureCloudName::default());
    }
    p
}

pub fn validate_structure(p: &AzurePlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::Azure.field_path();

    if p.region.is_empty() {
        result.add(ValidationIssue::required(format!("{}.region", base)));
    }
    if p.base_domain_resource_group_name.is_empty() {
        result.add(ValidationIssue::required(format!(
            "{}.baseDomainResourceGroupName",
            base
        )));
    }

    let stack = p.cloud_name == Some(AzureCloudName::AzureStackCloud);
    match (&p.arm_endpoint, stack) {
        (None, true) => result.add(
            ValidationIssue::required(format!("{}.armEndpoint", base))
                .with_suggestion("AzureStackCloud requires the Azure Stack Hub resource manager endpoint"),
        ),
        (Some(_), false) => result.add(ValidationIssue::error(
            format!("{}.armEndpoint", base),
            "armEndpoint is only supported on AzureStackCloud",
        )),
        (Some(endpoint), true) if reqwest::Url::parse(endpoint).is_err() => {
            result.add(ValidationIssue::error(
                format!("{}.armEndpoint", base),
                format!("{:?} is not a valid URL", endpoint),
            ))
        }
        _ => {}
    }

    match (&p.network_resource_group_name, &p.virtual_network) {
        (Some(_), None) => result.add(ValidationIssue::required(format!("{}.virtualNetwork", base))),
        (None, Some(_)) => result.add(ValidationIssue::required(format!(
            "{}.networkResourceGroupName",
            base
        ))),
        _ => {}
    }

    result
}

/// Checks the region, or the resource manager endpoint on Azure Stack Hub.
pub struct AzureValidator;

#[async_trait]
impl PlatformValidator for AzureValidator {
    async fn validate(
        &self,
        client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let (client, p) = match (client, &config.platform) {
            (Some(client), Some(Platform::Azure(p))) => (client, p),
            _ => return missing_client(PlatformKind::Azure),
        };

        let base = PlatformKind::Azure.field_path();
        let mut result = ValidationResult::new();

        match (p.cloud_name.unwrap_or_default(), &p.arm_endpoint) {
            (AzureCloudName::AzureStackCloud, Some(endpoint)) => {
                check_endpoint(client, &format!("{}.armEndpoint", base), endpoint, &mut result).await
            }
            (AzureCloudName::AzurePublicCloud, _) => {
                check_region(client, &format!("{}.region", base), &p.region, &mut result).await
            }
            // Sovereign clouds publish their own region lists.
            _ => {}
        }

        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::remote(HttpClientBuilder::new(PROFILE), AzureValidator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_config;
    use crate::platform::MockPlatformClient;

    fn platform() -> AzurePlatform {
        AzurePlatform {
            region: "eastus".to_string(),
            base_domain_resource_group_name: "dns-rg".to_string(),
            ..Default::default()
        }
    }

    fn error_paths(result: &ValidationResult) -> Vec<String> {
        result.errors().map(|i| i.path.clone()).collect()
    }

    #[test]
    fn defaults_to_public_cloud() {
        let p = apply_defaults(platform());
        assert_eq!(p.cloud_name, Some(AzureCloudName::AzurePublicCloud));
        assert_eq!(apply_defaults(p.clone()), p);
    }

    #[test]
    fn stack_cloud_requires_arm_endpoint() {
        let mut p = platform();
        p.cloud_name = Some(AzureCloudName::AzureStackCloud);
        assert_eq!(
            error_paths(&validate_structure(&p)),
            vec!["platform.azure.armEndpoint"]
        );

        p.arm_endpoint = Some("https://management.local.azurestack.external".to_string());
        assert!(validate_structure(&p).is_valid());
    }

    #[test]
    fn arm_endpoint_outside_stack_is_rejected() {
        let mut p = apply_defaults(platform());
        p.arm_endpoint = Some("https://management.azure.com".to_string());
        assert_eq!(
            error_paths(&validate_structure(&p)),
            vec!["platform.azure.armEndpoint"]
        );
    }

    #[test]
    fn required_fields_and_vnet_pairing() {
        let mut p = AzurePlatform::default();
        p.network_resource_group_name = Some("net-rg".to_string());
        assert_eq!(
            error_paths(&validate_structure(&p)),
            vec![
                "platform.azure.region",
                "platform.azure.baseDomainResourceGroupName",
                "platform.azure.virtualNetwork",
            ]
        );
    }

    #[test]
    fn cloud_name_wire_form() {
        let p: AzurePlatform = serde_yaml::from_str(
            "region: eastus\nbaseDomainResourceGroupName: rg\ncloudName: AzureUSGovernmentCloud\n",
        )
        .unwrap();
        assert_eq!(p.cloud_name, Some(AzureCloudName::AzureUSGovernmentCloud));
    }

    #[tokio::test]
    async fn stack_cloud_probes_arm_endpoint() {
        let mut config = sample_config();
        let mut p = platform();
        p.cloud_name = Some(AzureCloudName::AzureStackCloud);
        p.arm_endpoint = Some("https://management.local".to_string());
        config.platform = Some(Platform::Azure(p));

        let mut client = MockPlatformClient::new();
        client.expect_regions().never();
        client.expect_probe().times(1).returning(|_| Ok(()));

        let result = AzureValidator
            .validate(Some(&client as &dyn PlatformClient), &config)
            .await;
        assert!(result.is_valid());
    }
}
