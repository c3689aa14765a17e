//! Target platforms and their capabilities.
//!
//! A configuration names exactly one platform. Each platform may derive
//! client metadata, build a live API client, and run semantic validation;
//! the [`PlatformRegistry`] maps a [`PlatformKind`] to those capabilities.

pub mod alibabacloud;
pub mod aws;
pub mod azure;
pub mod baremetal;
pub mod client;
pub mod gcp;
pub mod ibmcloud;
pub mod libvirt;
pub mod nutanix;
pub mod openstack;
pub mod ovirt;
pub mod powervs;
pub mod registry;
pub mod vsphere;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::model::InstallConfig;
use crate::error::ClientError;
use crate::validation::ValidationResult;

pub use alibabacloud::{AlibabaCloudMetadata, AlibabaCloudPlatform};
pub use aws::{AwsMetadata, AwsPlatform};
pub use azure::{AzureMetadata, AzurePlatform};
pub use baremetal::BareMetalPlatform;
pub use gcp::{GcpMetadata, GcpPlatform};
pub use ibmcloud::{IbmCloudMetadata, IbmCloudPlatform};
pub use libvirt::LibvirtPlatform;
pub use nutanix::NutanixPlatform;
pub use openstack::OpenStackPlatform;
pub use ovirt::OvirtPlatform;
pub use powervs::{PowerVsMetadata, PowerVsPlatform};
pub use registry::{PlatformEntry, PlatformRegistry};
pub use vsphere::VSpherePlatform;

/// Tag of a [`Platform`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    AlibabaCloud,
    Azure,
    Gcp,
    IbmCloud,
    Aws,
    VSphere,
    Ovirt,
    OpenStack,
    PowerVs,
    Nutanix,
    Libvirt,
    BareMetal,
    None,
}

impl PlatformKind {
    /// Every platform, in dispatch priority order.
    pub const ALL: [PlatformKind; 13] = [
        PlatformKind::AlibabaCloud,
        PlatformKind::Azure,
        PlatformKind::Gcp,
        PlatformKind::IbmCloud,
        PlatformKind::Aws,
        PlatformKind::VSphere,
        PlatformKind::Ovirt,
        PlatformKind::OpenStack,
        PlatformKind::PowerVs,
        PlatformKind::Nutanix,
        PlatformKind::Libvirt,
        PlatformKind::BareMetal,
        PlatformKind::None,
    ];

    /// Key used for this platform in the `platform` mapping.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::AlibabaCloud => "alibabacloud",
            PlatformKind::Azure => "azure",
            PlatformKind::Gcp => "gcp",
            PlatformKind::IbmCloud => "ibmcloud",
            PlatformKind::Aws => "aws",
            PlatformKind::VSphere => "vsphere",
            PlatformKind::Ovirt => "ovirt",
            PlatformKind::OpenStack => "openstack",
            PlatformKind::PowerVs => "powervs",
            PlatformKind::Nutanix => "nutanix",
            PlatformKind::Libvirt => "libvirt",
            PlatformKind::BareMetal => "baremetal",
            PlatformKind::None => "none",
        }
    }

    /// Field path prefix for issues under this platform.
    pub fn field_path(&self) -> String {
        format!("platform.{}", self.as_str())
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown platform {:?}", s))
    }
}

/// The single populated platform of a configuration.
///
/// On the wire this is a mapping with exactly one key, e.g.
/// `platform: {aws: {region: us-east-1}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PlatformDocument", into = "PlatformDocument")]
pub enum Platform {
    AlibabaCloud(AlibabaCloudPlatform),
    Azure(AzurePlatform),
    Gcp(GcpPlatform),
    IbmCloud(IbmCloudPlatform),
    Aws(AwsPlatform),
    VSphere(VSpherePlatform),
    Ovirt(OvirtPlatform),
    OpenStack(OpenStackPlatform),
    PowerVs(PowerVsPlatform),
    Nutanix(NutanixPlatform),
    Libvirt(LibvirtPlatform),
    BareMetal(BareMetalPlatform),
    None(NonePlatform),
}

impl Platform {
    /// Tag of the populated variant.
    pub fn kind(&self) -> PlatformKind {
        match self {
            Platform::AlibabaCloud(_) => PlatformKind::AlibabaCloud,
            Platform::Azure(_) => PlatformKind::Azure,
            Platform::Gcp(_) => PlatformKind::Gcp,
            Platform::IbmCloud(_) => PlatformKind::IbmCloud,
            Platform::Aws(_) => PlatformKind::Aws,
            Platform::VSphere(_) => PlatformKind::VSphere,
            Platform::Ovirt(_) => PlatformKind::Ovirt,
            Platform::OpenStack(_) => PlatformKind::OpenStack,
            Platform::PowerVs(_) => PlatformKind::PowerVs,
            Platform::Nutanix(_) => PlatformKind::Nutanix,
            Platform::Libvirt(_) => PlatformKind::Libvirt,
            Platform::BareMetal(_) => PlatformKind::BareMetal,
            Platform::None(_) => PlatformKind::None,
        }
    }
}

/// The `none` platform: no infrastructure integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NonePlatform {}

/// Wire shape of [`Platform`]: one optional field per platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alibabacloud: Option<AlibabaCloudPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aws: Option<AwsPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    azure: Option<AzurePlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    baremetal: Option<BareMetalPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gcp: Option<GcpPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ibmcloud: Option<IbmCloudPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    libvirt: Option<LibvirtPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    none: Option<NonePlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nutanix: Option<NutanixPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    openstack: Option<OpenStackPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ovirt: Option<OvirtPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    powervs: Option<PowerVsPlatform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vsphere: Option<VSpherePlatform>,
}

impl TryFrom<PlatformDocument> for Platform {
    type Error = String;

    fn try_from(doc: PlatformDocument) -> Result<Self, Self::Error> {
        let PlatformDocument {
            alibabacloud,
            aws,
            azure,
            baremetal,
            gcp,
            ibmcloud,
            libvirt,
            none,
            nutanix,
            openstack,
            ovirt,
            powervs,
            vsphere,
        } = doc;

        let mut populated: Vec<Platform> = [
            alibabacloud.map(Platform::AlibabaCloud),
            azure.map(Platform::Azure),
            gcp.map(Platform::Gcp),
            ibmcloud.map(Platform::IbmCloud),
            aws.map(Platform::Aws),
            vsphere.map(Platform::VSphere),
            ovirt.map(Platform::Ovirt),
            openstack.map(Platform::OpenStack),
            powervs.map(Platform::PowerVs),
            nutanix.map(Platform::Nutanix),
            libvirt.map(Platform::Libvirt),
            baremetal.map(Platform::BareMetal),
            none.map(Platform::None),
        ]
        .into_iter()
        .flatten()
        .collect();

        match populated.len() {
            0 => Err(format!(
                "exactly one platform must be configured, valid platforms: {}",
                PlatformKind::ALL.map(|k| k.as_str()).join(", ")
            )),
            1 => Ok(populated.remove(0)),
            _ => Err(format!(
                "exactly one platform must be configured, found {}",
                populated
                    .iter()
                    .map(|p| p.kind().as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

impl From<Platform> for PlatformDocument {
    fn from(platform: Platform) -> Self {
        let mut doc = PlatformDocument::default();
        match platform {
            Platform::AlibabaCloud(p) => doc.alibabacloud = Some(p),
            Platform::Azure(p) => doc.azure = Some(p),
            Platform::Gcp(p) => doc.gcp = Some(p),
            Platform::IbmCloud(p) => doc.ibmcloud = Some(p),
            Platform::Aws(p) => doc.aws = Some(p),
            Platform::VSphere(p) => doc.vsphere = Some(p),
            Platform::Ovirt(p) => doc.ovirt = Some(p),
            Platform::OpenStack(p) => doc.openstack = Some(p),
            Platform::PowerVs(p) => doc.powervs = Some(p),
            Platform::Nutanix(p) => doc.nutanix = Some(p),
            Platform::Libvirt(p) => doc.libvirt = Some(p),
            Platform::BareMetal(p) => doc.baremetal = Some(p),
            Platform::None(p) => doc.none = Some(p),
        }
        doc
    }
}

/// Non-sensitive fields needed to build a live client for the populated
/// platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformMetadata {
    AlibabaCloud(AlibabaCloudMetadata),
    Azure(AzureMetadata),
    Gcp(GcpMetadata),
    IbmCloud(IbmCloudMetadata),
    Aws(AwsMetadata),
    PowerVs(PowerVsMetadata),
}

impl PlatformMetadata {
    /// Extracts metadata for the configured platform, if it has any.
    ///
    /// Pure value extraction: no client is constructed here.
    pub fn derive(config: &InstallConfig) -> Option<Self> {
        match config.platform.as_ref()? {
            Platform::AlibabaCloud(p) => Some(Self::AlibabaCloud(AlibabaCloudMetadata::new(
                p.region.clone(),
                p.vswitch_ids.clone(),
            ))),
            Platform::Azure(p) => Some(Self::Azure(AzureMetadata::new(
                p.cloud_name.unwrap_or_default(),
                p.arm_endpoint.clone(),
            ))),
            Platform::Gcp(p) => Some(Self::Gcp(GcpMetadata::new(
                p.project_id.clone(),
                p.region.clone(),
            ))),
            Platform::IbmCloud(p) => Some(Self::IbmCloud(IbmCloudMetadata::new(
                config.base_domain.clone(),
                p.region.clone(),
            ))),
            Platform::Aws(p) => Some(Self::Aws(AwsMetadata::new(
                p.region.clone(),
                p.subnets.clone(),
                p.service_endpoints.clone(),
            ))),
            Platform::PowerVs(_) => Some(Self::PowerVs(PowerVsMetadata::new(
                config.base_domain.clone(),
            ))),
            _ => None,
        }
    }

    /// Platform this metadata belongs to.
    pub fn platform(&self) -> PlatformKind {
        match self {
            PlatformMetadata::AlibabaCloud(_) => PlatformKind::AlibabaCloud,
            PlatformMetadata::Azure(_) => PlatformKind::Azure,
            PlatformMetadata::Gcp(_) => PlatformKind::Gcp,
            PlatformMetadata::IbmCloud(_) => PlatformKind::IbmCloud,
            PlatformMetadata::Aws(_) => PlatformKind::Aws,
            PlatformMetadata::PowerVs(_) => PlatformKind::PowerVs,
        }
    }

    /// Region the client talks to, where the platform has one.
    pub fn region(&self) -> Option<&str> {
        match self {
            PlatformMetadata::AlibabaCloud(m) => Some(&m.region),
            PlatformMetadata::Gcp(m) => Some(&m.region),
            PlatformMetadata::IbmCloud(m) => Some(&m.region),
            PlatformMetadata::Aws(m) => Some(&m.region),
            PlatformMetadata::Azure(_) | PlatformMetadata::PowerVs(_) => None,
        }
    }
}

/// A live connection to a platform's API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Regions available to the client's credentials.
    async fn regions(&self) -> Result<Vec<String>, ClientError>;

    /// Issues a request to `url`, failing if the endpoint cannot be reached.
    async fn probe(&self, url: &str) -> Result<(), ClientError>;
}

/// Builds a live client from platform metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientBuilder: Send + Sync {
    async fn build(&self, metadata: &PlatformMetadata) -> Result<Box<dyn PlatformClient>, ClientError>;
}

/// Platform-specific semantic validation.
///
/// Validators that need remote state receive the client built for the
/// configuration; purely local validators receive `None`.
#[async_trait]
pub trait PlatformValidator: Send + Sync {
    async fn validate(
        &self,
        client: Option<&dyn PlatformClient>,
        config: &InstallConfig,
    ) -> ValidationResult;
}
