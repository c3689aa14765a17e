//! libvirt, for development clusters.

use serde::{Deserialize, Serialize};

use super::PlatformKind;
use crate::validation::{ValidationIssue, ValidationResult};

pub const DEFAULT_URI: &str = "qemu+tcp://192.168.122.1/system";

/// Bridge interface created for the cluster network.
pub const DEFAULT_INTERFACE: &str = "tt0";

/// libvirt platform settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibvirtPlatform {
    /// Connection URI of the libvirt daemon.
    #[serde(rename = "URI", default)]
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<LibvirtNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LibvirtNetwork {
    #[serde(rename = "if", default)]
    pub if_name: String,
}

pub fn apply_defaults(mut p: LibvirtPlatform) -> LibvirtPlatform {
    if p.uri.is_empty() {
        p.uri = DEFAULT_URI.to_string();
    }
    let network = p.network.get_or_insert_with(LibvirtNetwork::default);
    if network.if_name.is_empty() {
        network.if_name = DEFAULT_INTERFACE.to_string();
    }
    p
}

pub fn validate_structure(p: &LibvirtPlatform) -> ValidationResult {
    let mut result = ValidationResult::new();
    let base = PlatformKind::Libvirt.field_path();

    if p.uri.is_empty() {
        result.add(ValidationIssue::required(format!("{}.URI", base)));
    } else if reqwest::Url::parse(&p.uri).is_err() {
        result.add(ValidationIssue::error(
            format!("{}.URI", base),
            format!("{:?} is not a valid connection URI", p.uri),
        ));
    }

    if let Some(network) = &p.network {
        if network.if_name.is_empty() {
            result.add(ValidationIssue::required(format!("{}.network.if", base)));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_uri_and_interface() {
        let p = apply_defaults(LibvirtPlatform::default());
        assert_eq!(p.uri, DEFAULT_URI);
        assert_eq!(p.network.as_ref().unwrap().if_name, DEFAULT_INTERFACE);
        assert!(validate_structure(&p).is_valid());
    }

    #[test]
    fn wire_names() {
        let p: LibvirtPlatform =
            serde_yaml::from_str("URI: qemu:///system\nnetwork:\n  if: br0\n").unwrap();
        assert_eq!(p.uri, "qemu:///system");
        assert_eq!(apply_defaults(p).network.unwrap().if_name, "br0");
    }

    #[test]
    fn uri_must_parse() {
        let p = LibvirtPlatform {
            uri: "not a uri".to_string(),
            network: None,
        };
        assert_eq!(validate_structure(&p).error_count(), 1);
    }
}
