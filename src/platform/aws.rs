//! Amazon Web Services.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::client::{check_endpoint, check_region, missing_client, CloudProfile, HttpClientBuilder};
use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

static SUBNET_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^subnet-[0-9a-f]+$").expect("valid regex"));
static AMI_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ami-[0-9a-f]+$").expect("valid regex"));

const RESERVED_TAG_PREFIXES: &[&str] = &["kubernetes.io/cluster/", "openshift.io/", "aws:"];

pub const PROFILE: CloudProfile = CloudProfile {
    kind: PlatformKind::Aws,
    regions: &[
        "af-south-1",
        "ap-east-1",
        "ap-northeast-1",
        "ap-northeast-2",
        "ap-northeast-3",
        "ap-south-1",
        "ap-southeast-1",
        "ap-southeast-2",
        "ap-southeast-3",
        "ca-central-1",
        "eu-central-1",
        "eu-north-1",
        "eu-south-1",
        "eu-west-1",
        "eu-west-2",
        "eu-west-3",
        "me-south-1",
        "sa-east-1",
        "us-east-1",
        "us-east-2",
        "us-gov-east-1",
        "us-gov-west-1",
        "us-west-1",
        "us-west-2",
    ],
    credentials: &[
        &["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"],
        &["AWS_PROFILE"],
        &["AWS_SHARED_CREDENTIALS_FILE"],
    ],
};

/// AWS platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AwsPlatform {
    #[serde(default)]
    pub region: String,
    /// Existing subnets to install into.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service_endpoints: Vec<ServiceEndpoint>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_tags: BTreeMap<String, String>,
    #[serde(rename = "amiID", default, skip_serializing_if = "Option::is_none")]
    pub ami_id: Option<String>,
}

/// Override for an AWS service's API endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceEndpoint {
    pub name: String,
    pub url: String,
}

/// Client metadata for AWS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsMetadata {
    pub region: String,
    pub subnets: Vec<String>,
    pub service_endpoints: Vec<ServiceEndpoint>,
}

impl AwsMetadata {
    pub fn new(region: String, subnets: Vec<String>, service_endpoints: Vec<ServiceEndpoint>) -> Self {
        Self {
            region,
            subnets,
            service_endpoints,
        }
    }
}

pub fn validate_structure(p: &AwsPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::Aws.field_path();

    if p.region.is_empty() {
        result.add(ValidationIssue::required(format!("{}.region", base)));
    }

    let mut subnets = HashSet::new();
    for (i, subnet) in p.subnets.iter().enumerate() {
        let path = format!("{}.subnets[{}]", base, i);
        if !SUBNET_ID.is_match(subnet) {
            result.add(ValidationIssue::error(
                &path,
                format!("{:?} is not a subnet ID", subnet),
            ));
        }
        if !subnets.insert(subnet) {
            result.add(ValidationIssue::error(path, format!("Duplicate value: {:?}", subnet)));
        }
    }

    let mut services = HashSet::new();
    for (i, endpoint) in p.service_endpoints.iter().enumerate() {
        let path = format!("{}.serviceEndpoints[{}]", base, i);
        if endpoint.name.is_empty() {
            result.add(ValidationIssue::required(format!("{}.name", path)));
        } else if !services.insert(endpoint.name.as_str()) {
            result.add(ValidationIssue::error(
                format!("{}.name", path),
                format!("duplicate service endpoint not allowed for {}", endpoint.name),
            ));
        }
        validate_url(&endpoint.url, &format!("{}.url", path), &mut result);
    }

    for (key, value) in &p.user_tags {
        let path = format!("{}.userTags[{}]", base, key);
        if let Some(prefix) = RESERVED_TAG_PREFIXES.iter().find(|prefix| key.starts_with(*prefix)) {
            result.add(ValidationIssue::error(
                &path,
                format!("tag keys starting with {:?} are reserved", prefix),
            ));
        }
        if key.len() > 128 || value.len() > 256 {
            result.add(ValidationIssue::error(
                path,
                "tag keys are limited to 128 characters and values to 256",
            ));
        }
    }

    if let Some(ami) = &p.ami_id {
        if !AMI_ID.is_match(ami) {
            result.add(ValidationIssue::error(
                format!("{}.amiID", base),
                format!("{:?} is not an AMI ID", ami),
            ));
        }
    }

    result
}

fn validate_url(url: &str, path: &str, result: &mut ValidationResult) {
    match reqwest::Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => result.add(ValidationIssue::unsupported(
            path,
            parsed.scheme(),
            &["http", "https"],
        )),
        Err(e) => result.add(ValidationIssue::error(path, format!("invalid URL: {}", e))),
    }
}

/// Checks the region and every endpoint override against the live API.
pub struct AwsValidator;

#[async_trait]
impl PlatformValidator for AwsValidator {
    async fn validate(
        &self,
        client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let (client, p) = match (client, &config.platform) {
            (Some(client), Some(Platform::Aws(p))) => (client, p),
            _ => return missing_client(PlatformKind::Aws),
        };

        let base = PlatformKind::Aws.field_path();
        let mut result = ValidationResult::new();
        check_region(client, &format!("{}.region", base), &p.region, &mut result).await;

        for (i, endpoint) in p.service_endpoints.iter().enumerate() {
            let path = format!("{}.serviceEndpoints[{}].url", base, i);
            check_endpoint(client, &path, &endpoint.url, &mut result).await;
        }

        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::remote(HttpClientBuilder::new(PROFILE), AwsValidator)
}
