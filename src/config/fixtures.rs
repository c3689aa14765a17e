//! Shared test configurations.

use std::collections::HashMap;

use super::loader::{AssetFile, FileFetcher};
use super::model::{InstallConfig, ObjectMeta};
use super::{INSTALL_CONFIG_FILENAME, INSTALL_CONFIG_VERSION};
use crate::error::FetchError;
use crate::platform::{AwsPlatform, NonePlatform, Platform};

pub(crate) const PULL_SECRET: &str = r#"{"auths":{"quay.io":{"auth":"Zm9vOmJhcg=="}}}"#;

/// An assembled, undefaulted configuration on the `none` platform.
pub(crate) fn sample_config() -> InstallConfig {
    InstallConfig {
        api_version: INSTALL_CONFIG_VERSION.to_string(),
        metadata: ObjectMeta {
            name: "demo".to_string(),
        },
        base_domain: "example.com".to_string(),
        ssh_key: None,
        pull_secret: PULL_SECRET.to_string(),
        additional_trust_bundle: None,
        networking: None,
        control_plane: None,
        compute: Vec::new(),
        publish: None,
        fips: false,
        platform: Some(Platform::None(NonePlatform {})),
    }
}

/// The sample configuration targeting AWS `us-east-1`.
pub(crate) fn aws_config() -> InstallConfig {
    let mut config = sample_config();
    config.platform = Some(Platform::Aws(AwsPlatform {
        region: "us-east-1".to_string(),
        ..Default::default()
    }));
    config
}

/// In-memory asset files.
#[derive(Default)]
pub(crate) struct MemoryFetcher(pub HashMap<String, Vec<u8>>);

impl MemoryFetcher {
    /// A fetcher holding only an install config with `content`.
    pub(crate) fn with(content: &str) -> Self {
        let mut files = HashMap::new();
        files.insert(INSTALL_CONFIG_FILENAME.to_string(), content.as_bytes().to_vec());
        Self(files)
    }
}

impl FileFetcher for MemoryFetcher {
    fn fetch_by_name(&self, name: &str) -> Result<Option<AssetFile>, FetchError> {
        Ok(self.0.get(name).map(|data| AssetFile {
            filename: name.to_string(),
            data: data.clone(),
        }))
    }
}
