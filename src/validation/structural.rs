//! Structural validation: required fields, formats and cross-field rules.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::model::{Architecture, InstallConfig, PublishStrategy};
use crate::config::INSTALL_CONFIG_VERSION;
use crate::platform::{self, Platform, PlatformKind};

use super::{ValidationIssue, ValidationResult};

static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

static DNS_SUBDOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid regex")
});

const SSH_KEY_TYPES: &[&str] = &[
    "ssh-rsa",
    "ssh-ed25519",
    "ssh-dss",
    "ecdsa-sha2-nistp256",
    "ecdsa-sha2-nistp384",
    "ecdsa-sha2-nistp521",
    "sk-ssh-ed25519@openssh.com",
    "sk-ecdsa-sha2-nistp256@openssh.com",
];

/// Platforms that can keep their endpoints internal.
const INTERNAL_PUBLISH_PLATFORMS: &[PlatformKind] = &[
    PlatformKind::Aws,
    PlatformKind::Azure,
    PlatformKind::Gcp,
    PlatformKind::IbmCloud,
    PlatformKind::AlibabaCloud,
    PlatformKind::PowerVs,
];

/// Validates the platform-independent shape of the configuration and the
/// required fields of its platform.
pub fn validate(config: &InstallConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    if config.api_version != INSTALL_CONFIG_VERSION {
        result.add(ValidationIssue::error(
            "apiVersion",
            format!(
                "install-config version must be {:?}, got {:?}",
                INSTALL_CONFIG_VERSION, config.api_version
            ),
        ));
    }

    validate_cluster_name(config.cluster_name(), &mut result);
    validate_base_domain(config, &mut result);
    validate_pull_secret(&config.pull_secret, &mut result);

    if let Some(key) = &config.ssh_key {
        validate_ssh_key(key, &mut result);
    }

    if let Some(bundle) = &config.additional_trust_bundle {
        if !bundle.contains("-----BEGIN CERTIFICATE-----") {
            result.add(ValidationIssue::error(
                "additionalTrustBundle",
                "must contain at least one PEM-encoded certificate",
            ));
        }
    }

    if config.networking.is_none() {
        result.add(ValidationIssue::required("networking"));
    }

    validate_machine_pools(config, &mut result);

    match &config.platform {
        Some(platform) => {
            validate_publish(config, platform.kind(), &mut result);
            result.extend(validate_platform(platform, config));
        }
        None => result.add(
            ValidationIssue::required("platform").with_suggestion(format!(
                "set exactly one of: {}",
                PlatformKind::ALL.map(|k| k.as_str()).join(", ")
            )),
        ),
    }

    result
}

fn validate_cluster_name(name: &str, result: &mut ValidationResult) {
    if name.is_empty() {
        result.add(ValidationIssue::required("metadata.name"));
        return;
    }

    if name.len() > 63 || !DNS_LABEL.is_match(name) {
        result.add(
            ValidationIssue::error(
                "metadata.name",
                format!("{:?} is not a valid DNS-1123 label", name),
            )
            .with_suggestion(
                "use at most 63 lowercase alphanumeric characters or '-', starting and ending with an alphanumeric character",
            ),
        );
    }
}

fn validate_base_domain(config: &InstallConfig, result: &mut ValidationResult) {
    let domain = config.base_domain.as_str();
    if domain.is_empty() {
        result.add(ValidationIssue::required("baseDomain"));
        return;
    }

    if domain.len() > 253 || !DNS_SUBDOMAIN.is_match(domain) {
        result.add(ValidationIssue::error(
            "baseDomain",
            format!("{:?} is not a valid DNS-1123 subdomain", domain),
        ));
        return;
    }

    let fqdn_len = config.cluster_name().len() + 1 + domain.len();
    if fqdn_len > 253 {
        result.add(ValidationIssue::error(
            "baseDomain",
            format!(
                "cluster domain {}.{} is {} characters, must be at most 253",
                config.cluster_name(),
                domain,
                fqdn_len
            ),
        ));
    }
}

fn validate_pull_secret(secret: &str, result: &mut ValidationResult) {
    if secret.trim().is_empty() {
        result.add(ValidationIssue::required("pullSecret"));
        return;
    }

    match serde_json::from_str::<serde_json::Value>(secret) {
        Ok(value) => {
            if !value.get("auths").map(|a| a.is_object()).unwrap_or(false) {
                result.add(ValidationIssue::error(
                    "pullSecret",
                    "auths required",
                ));
            }
        }
        Err(e) => result.add(ValidationIssue::error(
            "pullSecret",
            format!("failed to parse pull secret as JSON: {}", e),
        )),
    }
}

fn validate_ssh_key(key: &str, result: &mut ValidationResult) {
    for (i, line) in key.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        let mut parts = line.split_whitespace();
        let key_type = parts.next().unwrap_or_default();
        let body = parts.next();

        if !SSH_KEY_TYPES.contains(&key_type) {
            result.add(
                ValidationIssue::error(
                    "sshKey",
                    format!("key {}: unrecognised key type {:?}", i, key_type),
                )
                .with_suggestion(format!("supported key types: {}", SSH_KEY_TYPES.join(", "))),
            );
            continue;
        }

        let body_valid = body
            .map(|b| {
                !b.is_empty()
                    && b
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '='))
            })
            .unwrap_or(false);
        if !body_valid {
            result.add(ValidationIssue::error(
                "sshKey",
                format!("key {}: missing or malformed key data", i),
            ));
        }
    }
}

fn validate_machine_pools(config: &InstallConfig, result: &mut ValidationResult) {
    let control_plane = match &config.control_plane {
        Some(pool) => pool,
        None => {
            result.add(ValidationIssue::required("controlPlane"));
            return;
        }
    };

    if control_plane.name != "master" {
        result.add(ValidationIssue::unsupported(
            "controlPlane.name",
            &control_plane.name,
            &["master"],
        ));
    }

    if control_plane.replicas.unwrap_or(0) < 1 {
        result.add(ValidationIssue::error(
            "controlPlane.replicas",
            "number of control plane replicas must be positive",
        ));
    }

    let control_arch = control_plane.architecture.unwrap_or(Architecture::Amd64);
    let mut seen_names = HashSet::new();

    for (i, pool) in config.compute.iter().enumerate() {
        let prefix = format!("compute[{}]", i);

        if pool.name != "worker" {
            result.add(ValidationIssue::unsupported(
                format!("{}.name", prefix),
                &pool.name,
                &["worker"],
            ));
        }

        if !seen_names.insert(pool.name.as_str()) {
            result.add(ValidationIssue::error(
                format!("{}.name", prefix),
                format!("Duplicate compute pool name: {:?}", pool.name),
            ));
        }

        let arch = pool.architecture.unwrap_or(Architecture::Amd64);
        if arch != control_arch {
            result.add(ValidationIssue::error(
                format!("{}.architecture", prefix),
                format!(
                    "heterogeneous architecture is not supported; compute uses {:?} but the control plane uses {:?}",
                    arch, control_arch
                ),
            ));
        }
    }
}

fn validate_publish(config: &InstallConfig, kind: PlatformKind, result: &mut ValidationResult) {
    if config.publish == Some(PublishStrategy::Internal) && !INTERNAL_PUBLISH_PLATFORMS.contains(&kind) {
        result.add(ValidationIssue::error(
            "publish",
            format!("Internal publish strategy is not supported on {} platform", kind),
        ));
    }
}

fn validate_platform(platform: &Platform, config: &InstallConfig) -> ValidationResult {
    match platform {
        Platform::AlibabaCloud(p) => platform::alibabacloud::validate_structure(p),
        Platform::Azure(p) => platform::azure::validate_structure(p),
        Platform::Gcp(p) => platform::gcp::validate_structure(p),
        Platform::IbmCloud(p) => platform::ibmcloud::validate_structure(p),
        Platform::Aws(p) => platform::aws::validate_structure(p),
        Platform::VSphere(p) => platform::vsphere::validate_structure(p),
        Platform::Ovirt(p) => platform::ovirt::validate_structure(p),
        Platform::OpenStack(p) => platform::openstack::validate_structure(p),
        Platform::PowerVs(p) => platform::powervs::validate_structure(p),
        Platform::Nutanix(p) => platform::nutanix::validate_structure(p),
        Platform::Libvirt(p) => platform::libvirt::validate_structure(p),
        Platform::BareMetal(p) => platform::baremetal::validate_structure(p, config),
        Platform::None(_) => ValidationResult::new(),
    }
}
