//! Google Cloud Platform.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::client::{check_region, missing_client, CloudProfile, HttpClientBuilder};
use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

static PROJECT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][-a-z0-9]{4,28}[a-z0-9]$").expect("valid regex"));

pub const PROFILE: CloudProfile = CloudProfile {
    kind: PlatformKind::Gcp,
    regions: &[
        "asia-east1",
        "asia-east2",
        "asia-northeast1",
        "asia-northeast2",
        "asia-northeast3",
        "asia-south1",
        "asia-southeast1",
        "asia-southeast2",
        "australia-southeast1",
        "europe-north1",
        "europe-west1",
        "europe-west2",
        "europe-west3",
        "europe-west4",
        "europe-west6",
        "northamerica-northeast1",
        "southamerica-east1",
        "us-central1",
        "us-east1",
        "us-east4",
        "us-west1",
        "us-west2",
        "us-west3",
        "us-west4",
    ],
    credentials: &[&["GOOGLE_APPLICATION_CREDENTIALS"], &["GOOGLE_CREDENTIALS"]],
};

/// GCP platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GcpPlatform {
    #[serde(rename = "projectID", default)]
    pub project_id: String,
    #[serde(default)]
    pub region: String,
    /// Existing VPC to install into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_plane_subnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_subnet: Option<String>,
}

/// Client metadata for GCP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpMetadata {
    pub project_id: String,
    pub region: String,
}

impl GcpMetadata {
    pub fn new(project_id: String, region: String) -> Self {
        Self { project_id, region }
    }
}

pub fn validate_structure(p: &GcpPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::Gcp.field_path();

    if p.project_id.is_empty() {
        result.add(ValidationIssue::required(format!("{}.projectID", base)));
    } else if !PROJECT_ID.is_match(&p.project_id) {
        result.add(ValidationIssue::error(
            format!("{}.projectID", base),
            format!("{:?} is not a valid project ID", p.project_id),
        ));
    }

    if p.region.is_empty() {
        result.add(ValidationIssue::required(format!("{}.region", base)));
    }

    // Subnets only make sense inside an existing network.
    if p.network.is_none() {
        for (field, value) in [
            ("controlPlaneSubnet", &p.control_plane_subnet),
            ("computeSubnet", &p.compute_subnet),
        ] {
            if value.is_some() {
                result.add(ValidationIssue::error(
                    format!("{}.{}", base, field),
                    "must provide a network when providing subnets",
                ));
            }
        }
    } else if p.control_plane_subnet.is_none() || p.compute_subnet.is_none() {
        result.add(ValidationIssue::error(
            format!("{}.network", base),
            "must provide both controlPlaneSubnet and computeSubnet with an existing network",
        ));
    }

    result
}

/// Checks the region against the live API.
pub struct GcpValidator;

#[async_trait]
impl PlatformValidator for GcpValidator {
    async fn validate(
        &self,
        client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let (client, p) = match (client, &config.platform) {
            (Some(client), Some(Platform::Gcp(p))) => (client, p),
            _ => return missing_client(PlatformKind::Gcp),
        };

        let mut result = ValidationResult::new();
        let path = format!("{}.region", PlatformKind::Gcp.field_path());
        check_region(client, &path, &p.region, &mut result).await;
        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::remote(HttpClientBuilder::new(PROFILE), GcpValidator)
}
