//! Platform capability registry.

use std::collections::HashMap;
use std::sync::Arc;

use super::{
    alibabacloud, aws, azure, gcp, ibmcloud, nutanix, openstack, ovirt, powervs, vsphere,
    ClientBuilder, PlatformKind, PlatformMetadata, PlatformValidator,
};
use crate::config::model::InstallConfig;
use crate::error::{ClientError, InstallConfigError};

/// Capabilities registered for one platform.
#[derive(Clone)]
pub struct PlatformEntry {
    builder: Option<Arc<dyn ClientBuilder>>,
    validator: Arc<dyn PlatformValidator>,
}

impl PlatformEntry {
    /// A platform validated against a live client.
    pub fn remote(
        builder: impl ClientBuilder + 'static,
        validator: impl PlatformValidator + 'static,
    ) -> Self {
        Self {
            builder: Some(Arc::new(builder)),
            validator: Arc::new(validator),
        }
    }

    /// A platform validated without any outbound calls.
    pub fn local(validator: impl PlatformValidator + 'static) -> Self {
        Self {
            builder: None,
            validator: Arc::new(validator),
        }
    }

    pub fn requires_client(&self) -> bool {
        self.builder.is_some()
    }
}

/// Maps each platform to its semantic validation capabilities.
///
/// Platforms without an entry pass semantic validation without doing
/// anything.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    entries: HashMap<PlatformKind, PlatformEntry>,
}

impl PlatformRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of built-in platform capabilities.
    pub fn builtin() -> Self {
        Self::new()
            .with(PlatformKind::AlibabaCloud, alibabacloud::entry())
            .with(PlatformKind::Azure, azure::entry())
            .with(PlatformKind::Gcp, gcp::entry())
            .with(PlatformKind::IbmCloud, ibmcloud::entry())
            .with(PlatformKind::Aws, aws::entry())
            .with(PlatformKind::VSphere, vsphere::entry())
            .with(PlatformKind::Ovirt, ovirt::entry())
            .with(PlatformKind::OpenStack, openstack::entry())
            .with(PlatformKind::PowerVs, powervs::entry())
            .with(PlatformKind::Nutanix, nutanix::entry())
    }

    /// Registers `entry` for `kind`, replacing any previous entry.
    pub fn register(&mut self, kind: PlatformKind, entry: PlatformEntry) {
        self.entries.insert(kind, entry);
    }

    pub fn with(mut self, kind: PlatformKind, entry: PlatformEntry) -> Self {
        self.register(kind, entry);
        self
    }

    pub fn entry(&self, kind: PlatformKind) -> Option<&PlatformEntry> {
        self.entries.get(&kind)
    }

    /// Registered platforms in dispatch priority order.
    pub fn kinds(&self) -> Vec<PlatformKind> {
        let mut kinds: Vec<_> = self.entries.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Runs semantic validation for the configured platform.
    ///
    /// Builds a client first when the platform needs one. Warnings are
    /// logged; any error-level issue fails the configuration.
    pub async fn validate(
        &self,
        config: &InstallConfig,
        metadata: Option<&PlatformMetadata>,
    ) -> Result<(), InstallConfigError> {
        let kind = match &config.platform {
            Some(platform) => platform.kind(),
            None => return Ok(()),
        };

        let entry = match self.entry(kind) {
            Some(entry) => entry,
            None => {
                tracing::debug!(platform = %kind, "No semantic validation registered");
                return Ok(());
            }
        };

        let result = match &entry.builder {
            Some(builder) => {
                let metadata = metadata.ok_or(InstallConfigError::ClientConstruction {
                    platform: kind,
                    source: ClientError::MissingMetadata(kind),
                })?;

                tracing::debug!(platform = %kind, "Building platform client");
                let client = builder.build(metadata).await.map_err(|source| {
                    InstallConfigError::ClientConstruction {
                        platform: kind,
                        source,
                    }
                })?;

                entry.validator.validate(Some(client.as_ref()), config).await
            }
            None => entry.validator.validate(None, config).await,
        };

        result.log_warnings();
        if !result.is_valid() {
            return Err(InstallConfigError::SemanticValidation {
                platform: kind,
                issues: result.into_errors(),
            });
        }

        tracing::debug!(platform = %kind, "Platform validation passed");
        Ok(())
    }
}
