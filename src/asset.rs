//! The install-config asset lifecycle.
//!
//! Both entry points produce a [`FinishedInstallConfig`] through the same
//! finishing steps: defaults, platform metadata, structural validation,
//! platform semantic validation and serialization.

use sha2::{Digest, Sha256};

use crate::config::defaults::apply_defaults;
use crate::config::loader;
use crate::config::{assemble, FileFetcher, InstallConfig, Parents, INSTALL_CONFIG_FILENAME};
use crate::error::InstallConfigError;
use crate::platform::{PlatformMetadata, PlatformRegistry};
use crate::validation::validate_install_config;

/// A serialized asset file ready to be written by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Artifact {
    /// Hex-encoded SHA-256 of the artifact contents.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.data))
    }
}

/// A defaulted, validated install config and its serialized form.
#[derive(Debug, Clone)]
pub struct FinishedInstallConfig {
    config: InstallConfig,
    metadata: Option<PlatformMetadata>,
    artifact: Artifact,
    loaded: bool,
}

impl FinishedInstallConfig {
    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Client metadata for the configured platform, if it has any.
    pub fn metadata(&self) -> Option<&PlatformMetadata> {
        self.metadata.as_ref()
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    /// Whether the config was read from a persisted file.
    pub fn loaded(&self) -> bool {
        self.loaded
    }
}

/// Produces the install-config asset.
#[derive(Clone, Default)]
pub struct InstallConfigAsset {
    registry: PlatformRegistry,
}

impl InstallConfigAsset {
    pub fn new(registry: PlatformRegistry) -> Self {
        Self { registry }
    }

    /// An asset using the built-in platform capabilities.
    pub fn builtin() -> Self {
        Self::new(PlatformRegistry::builtin())
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    /// Builds a fresh install config from the resolved parent inputs.
    pub async fn generate(
        &self,
        parents: &dyn Parents,
    ) -> Result<FinishedInstallConfig, InstallConfigError> {
        let inputs = parents.resolve()?;
        let config = assemble(inputs);
        tracing::debug!(cluster = %config.cluster_name(), "Assembled install config");

        let finished = self.finish(config, None).await?;
        tracing::info!(
            platform = ?finished.config.platform.as_ref().map(|p| p.kind()),
            digest = %finished.artifact.digest(),
            "Generated install config"
        );
        Ok(finished)
    }

    /// Loads the persisted install config, if there is one.
    pub async fn load(
        &self,
        fetcher: &dyn FileFetcher,
    ) -> Result<Option<FinishedInstallConfig>, InstallConfigError> {
        let config = match loader::load(fetcher)? {
            Some(config) => config,
            None => return Ok(None),
        };

        let mut finished = self.finish(config, Some(INSTALL_CONFIG_FILENAME)).await?;
        finished.loaded = true;
        tracing::info!(
            file = INSTALL_CONFIG_FILENAME,
            platform = ?finished.config.platform.as_ref().map(|p| p.kind()),
            digest = %finished.artifact.digest(),
            "Loaded install config"
        );
        Ok(Some(finished))
    }

    /// Loads the persisted install config, generating one if none exists.
    pub async fn resolve(
        &self,
        fetcher: &dyn FileFetcher,
        parents: &dyn Parents,
    ) -> Result<FinishedInstallConfig, InstallConfigError> {
        match self.load(fetcher).await? {
            Some(finished) => Ok(finished),
            None => self.generate(parents).await,
        }
    }

    /// Runs the finishing steps on an assembled or loaded config.
    ///
    /// `filename` names the file the config came from and appears in
    /// structural validation errors.
    pub async fn finish(
        &self,
        config: InstallConfig,
        filename: Option<&str>,
    ) -> Result<FinishedInstallConfig, InstallConfigError> {
        let config = apply_defaults(config);
        let metadata = PlatformMetadata::derive(&config);
        tracing::debug!(
            platform = ?metadata.as_ref().map(|m| m.platform()),
            "Applied defaults"
        );

        let result = validate_install_config(&config);
        result.log_warnings();
        if !result.is_valid() {
            tracing::error!(errors = result.error_count(), "Install config is invalid");
            return Err(InstallConfigError::Invalid {
                filename: filename.map(str::to_string),
                issues: result.into_errors(),
            });
        }
        tracing::debug!("Structural validation passed");

        self.registry.validate(&config, metadata.as_ref()).await?;

        let data = serde_yaml::to_string(&config)
            .map_err(|e| InstallConfigError::Serialization(e.to_string()))?;

        Ok(FinishedInstallConfig {
            config,
            metadata,
            artifact: Artifact {
                filename: INSTALL_CONFIG_FILENAME.to_string(),
                data: data.into_bytes(),
            },
            loaded: false,
        })
    }
}
