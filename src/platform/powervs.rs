//! IBM Power Virtual Server.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Platform, PlatformClient, PlatformEntry, PlatformKind, PlatformValidator};
use crate::config::model::InstallConfig;
use crate::validation::{ValidationIssue, ValidationResult};

static GUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").expect("valid regex")
});

/// Zones and the region each belongs to.
const ZONES: &[(&str, &str)] = &[
    ("dal10", "dal"),
    ("dal12", "dal"),
    ("eu-de-1", "eu-de"),
    ("eu-de-2", "eu-de"),
    ("lon04", "lon"),
    ("lon06", "lon"),
    ("mon01", "mon"),
    ("osa21", "osa"),
    ("sao01", "sao"),
    ("syd04", "syd"),
    ("syd05", "syd"),
    ("tok04", "tok"),
    ("tor01", "tor"),
    ("us-east", "us-east"),
    ("us-south", "us-south"),
    ("wdc06", "wdc"),
    ("wdc07", "wdc"),
];

/// Region containing `zone`, if the zone is known.
pub fn region_for_zone(zone: &str) -> Option<&'static str> {
    ZONES.iter().find(|(z, _)| *z == zone).map(|(_, region)| *region)
}

/// Power VS platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PowerVsPlatform {
    #[serde(default)]
    pub zone: String,
    /// Derived from the zone when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "userID", default)]
    pub user_id: String,
    #[serde(rename = "serviceInstanceID", default, skip_serializing_if = "Option::is_none")]
    pub service_instance_id: Option<String>,
}

/// Client metadata for Power VS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerVsMetadata {
    pub base_domain: String,
}

impl PowerVsMetadata {
    pub fn new(base_domain: String) -> Self {
        Self { base_domain }
    }
}

pub fn apply_defaults(mut p: PowerVsPlatform) -> PowerVsPlatform {
    if p.region.is_none() {
        p.region = region_for_zone(&p.zone).map(str::to_string);
    }
    p
}

pub fn validate_structure(p: &PowerVsPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::PowerVs.field_path();

    if p.zone.is_empty() {
        result.add(ValidationIssue::required(format!("{}.zone", base)));
    }
    if p.user_id.is_empty() {
        result.add(ValidationIssue::required(format!("{}.userID", base)));
    }
    if let Some(id) = &p.service_instance_id {
        if !GUID.is_match(id) {
            result.add(ValidationIssue::error(
                format!("{}.serviceInstanceID", base),
                format!("{:?} is not a GUID", id),
            ));
        }
    }

    result
}

/// Checks the zone against the known zone catalog.
pub struct PowerVsValidator;

#[async_trait]
impl PlatformValidator for PowerVsValidator {
    async fn validate(
        &self,
        _client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();
        let p = match &config.platform {
            Some(Platform::PowerVs(p)) => p,
            _ => return result,
        };
        let base = PlatformKind::PowerVs.field_path();

        match region_for_zone(&p.zone) {
            None => {
                let known: Vec<&str> = ZONES.iter().map(|(zone, _)| *zone).collect();
                result.add(ValidationIssue::unsupported(format!("{}.zone", base), &p.zone, &known));
            }
            Some(region) => {
                if let Some(configured) = &p.region {
                    if configured != region {
                        result.add(ValidationIssue::error(
                            format!("{}.region", base),
                            format!("zone {} is in region {}, not {}", p.zone, region, configured),
                        ));
                    }
                }
            }
        }

        result
    }
}

pub fn entry() -> PlatformEntry {
    PlatformEntry::local(PowerVsValidator)
}
