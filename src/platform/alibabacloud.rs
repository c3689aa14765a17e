//! Alibaba Cloud.

use std::collections::BTreeMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::client::{check_region, missing_client, CloudProfile, HttpClientBuilder};
use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

static RESOURCE_GROUP_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rg-[0-9a-z]+$").expect("valid regex"));
static VSWITCH_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^vsw-[0-9a-z]+$").expect("valid regex"));

pub const PROFILE: CloudProfile = CloudProfile {
    kind: PlatformKind::AlibabaCloud,
    regions: &[
        "ap-northeast-1",
        "ap-south-1",
        "ap-southeast-1",
        "ap-southeast-2",
        "ap-southeast-3",
        "ap-southeast-5",
        "cn-beijing",
        "cn-chengdu",
        "cn-hangzhou",
        "cn-hongkong",
        "cn-huhehaote",
        "cn-qingdao",
        "cn-shanghai",
        "cn-shenzhen",
        "cn-zhangjiakou",
        "eu-central-1",
        "eu-west-1",
        "me-east-1",
        "us-east-1",
        "us-west-1",
    ],
    credentials: &[&["ALIBABA_CLOUD_ACCESS_KEY_ID", "ALIBABA_CLOUD_ACCESS_KEY_SECRET"]],
};

/// Alibaba Cloud platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AlibabaCloudPlatform {
    #[serde(default)]
    pub region: String,
    #[serde(rename = "resourceGroupID", default)]
    pub resource_group_id: String,
    #[serde(rename = "vpcID", default, skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
    #[serde(rename = "vswitchIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub vswitch_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Client metadata for Alibaba Cloud.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlibabaCloudMetadata {
    pub region: String,
    pub vswitch_ids: Vec<String>,
}

impl AlibabaCloudMetadata {
    pub fn new(region: String, vswitch_ids: Vec<String>) -> Self {
        Self { region, vswitch_ids }
    }
}

pub fn validate_structure(p: &AlibabaCloudPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::AlibabaCloud.field_path();

    if p.region.is_empty() {
        result.add(ValidationIssue::required(format!("{}.region", base)));
    }

    if p.resource_group_id.is_empty() {
        result.add(ValidationIssue::required(format!("{}.resourceGroupID", base)));
    } else if !RESOURCE_GROUP_ID.is_match(&p.resource_group_id) {
        result.add(ValidationIssue::error(
            format!("{}.resourceGroupID", base),
            format!("{:?} is not a resource group ID", p.resource_group_id),
        ));
    }

    if !p.vswitch_ids.is_empty() && p.vpc_id.is_none() {
        result.add(ValidationIssue::required(format!("{}.vpcID", base)).with_suggestion(
            "vswitchIDs can only be given for an existing VPC",
        ));
    }
    for (i, id) in p.vswitch_ids.iter().enumerate() {
        if !VSWITCH_ID.is_match(id) {
            result.add(ValidationIssue::error(
                format!("{}.vswitchIDs[{}]", base, i),
                format!("{:?} is not a vSwitch ID", id),
            ));
        }
    }

    for key in p.tags.keys() {
        if key.starts_with("aliyun") || key.starts_with("acs:") {
            result.add(ValidationIssue::error(
                format!("{}.tags[{}]", base, key),
                "tag keys may not start with \"aliyun\" or \"acs:\"",
            ));
        }
    }

    result
}

/// Checks the region against the live API.
pub struct AlibabaCloudValidator;

#[async_trait]
impl PlatformValidator for AlibabaCloudValidator {
    async fn validate(
        &self,
        client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let (client, p) = match (client, &config.platform) {
            (Some(client), Some(Platform::AlibabaCloud(p))) => (client, p),
            _ => return missing_client(PlatformKind::AlibabaCloud),
        };

        let mut result = ValidationResult::new();
        let path = format!("{}.region", PlatformKind::AlibabaCloud.field_path());
        check_region(client, &path, &p.region, &mut result).await;
        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::remote(HttpClientBuilder::new(PROFILE), AlibabaCloudValidator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_paths(result: &ValidationResult) -> Vec<String> {
        result.errors().map(|i| i.path.clone()).collect()
    }

    #[test]
    fn region_and_resource_group_required() {
        assert_eq!(
            error_paths(&validate_structure(&AlibabaCloudPlatform::default())),
            vec!["platform.alibabacloud.region", "platform.alibabacloud.resourceGroupID"]
        );
    }

    #[test]
    fn vswitches_need_vpc_and_shape() {
        let p: AlibabaCloudPlatform = serde_yaml::from_str(
            "region: cn-hangzhou\nresourceGroupID: rg-acfm\nvswitchIDs: [vsw-1a, subnet-2]\n",
        )
        .unwrap();
        assert_eq!(
            error_paths(&validate_structure(&p)),
            vec!["platform.alibabacloud.vpcID", "platform.alibabacloud.vswitchIDs[1]"]
        );
    }

    #[test]
    fn reserved_tag_prefixes() {
        let mut p = AlibabaCloudPlatform {
            region: "cn-hangzhou".to_string(),
            resource_group_id: "rg-acfm".to_string(),
            ..Default::default()
        };
        p.tags.insert("acs:owner".to_string(), "me".to_string());
        assert_eq!(
            error_paths(&validate_structure(&p)),
            vec!["platform.alibabacloud.tags[acs:owner]"]
        );
    }
}
