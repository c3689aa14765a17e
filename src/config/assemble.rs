//! Assembly of a fresh install config from resolved inputs.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::cidr::Cidr;
use super::model::{InstallConfig, MachineNetworkEntry, Networking, ObjectMeta};
use super::INSTALL_CONFIG_VERSION;
use crate::error::DependencyError;
use crate::platform::Platform;

/// Cluster name and base domain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterIdentity {
    pub name: String,
    pub base_domain: String,
}

/// Secret material placed in the config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Secrets {
    pub pull_secret: String,
    pub ssh_key: Option<String>,
}

/// Resolved network topology inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkInputs {
    pub machine_network: Vec<Cidr>,
}

/// Every parent input of the install config, already resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedInputs {
    pub identity: ClusterIdentity,
    pub secrets: Secrets,
    pub networking: NetworkInputs,
    pub platform: Option<Platform>,
}

/// Supplies the resolved parent inputs of the install config.
pub trait Parents: Send + Sync {
    fn resolve(&self) -> Result<ResolvedInputs, DependencyError>;
}

/// Builds an install config at the current schema version from resolved
/// inputs. No defaults are applied.
pub fn assemble(inputs: ResolvedInputs) -> InstallConfig {
    let ResolvedInputs {
        identity,
        secrets,
        networking,
        platform,
    } = inputs;

    InstallConfig {
        api_version: INSTALL_CONFIG_VERSION.to_string(),
        metadata: ObjectMeta {
            name: identity.name,
        },
        base_domain: identity.base_domain,
        ssh_key: secrets.ssh_key,
        pull_secret: secrets.pull_secret,
        additional_trust_bundle: None,
        networking: Some(Networking {
            machine_network: networking
                .machine_network
                .into_iter()
                .map(|cidr| MachineNetworkEntry { cidr })
                .collect(),
            ..Default::default()
        }),
        control_plane: None,
        compute: Vec::new(),
        publish: None,
        fips: false,
        platform,
    }
}

/// Resolved inputs read from a YAML file.
///
/// Secrets may be inlined or referenced by a path relative to the file.
#[derive(Debug, Clone)]
pub struct InputsFile {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct InputsDocument {
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    base_domain: String,
    #[serde(default)]
    ssh_key: Option<String>,
    #[serde(default)]
    ssh_key_file: Option<PathBuf>,
    #[serde(default)]
    pull_secret: Option<String>,
    #[serde(default)]
    pull_secret_file: Option<PathBuf>,
    #[serde(default)]
    machine_network: Vec<Cidr>,
    #[serde(default)]
    platform: Option<Platform>,
}

impl InputsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_secret(
        &self,
        name: &str,
        inline: Option<String>,
        file: Option<PathBuf>,
    ) -> Result<Option<String>, DependencyError> {
        match (inline, file) {
            (Some(_), Some(_)) => Err(DependencyError::ParseFailed {
                path: self.path.clone(),
                message: format!("set only one of {} and {}File", name, name),
            }),
            (Some(value), None) => Ok(Some(value)),
            (None, Some(file)) => {
                let path = self.relative(&file);
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| DependencyError::ReadFailed { path, source: e })?;
                Ok(Some(content.trim_end().to_string()))
            }
            (None, None) => Ok(None),
        }
    }

    fn relative(&self, file: &Path) -> PathBuf {
        match self.path.parent() {
            Some(dir) if file.is_relative() => dir.join(file),
            _ => file.to_path_buf(),
        }
    }
}

impl Parents for InputsFile {
    fn resolve(&self) -> Result<ResolvedInputs, DependencyError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| DependencyError::ReadFailed {
                path: self.path.clone(),
                source: e,
            })?;

        let doc: InputsDocument =
            serde_yaml::from_str(&content).map_err(|e| DependencyError::ParseFailed {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        let ssh_key = self.read_secret("sshKey", doc.ssh_key, doc.ssh_key_file)?;
        let pull_secret = self
            .read_secret("pullSecret", doc.pull_secret, doc.pull_secret_file)?
            .unwrap_or_default();

        Ok(ResolvedInputs {
            identity: ClusterIdentity {
                name: doc.cluster_name,
                base_domain: doc.base_domain,
            },
            secrets: Secrets {
                pull_secret,
                ssh_key,
            },
            networking: NetworkInputs {
                machine_network: doc.machine_network,
            },
            platform: doc.platform,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformKind;

    fn inputs() -> ResolvedInputs {
        ResolvedInputs {
            identity: ClusterIdentity {
                name: "demo".to_string(),
                base_domain: "example.com".to_string(),
            },
            secrets: Secrets {
                pull_secret: r#"{"auths":{}}"#.to_string(),
                ssh_key: None,
            },
            networking: NetworkInputs {
                machine_network: vec!["10.0.0.0/16".parse().unwrap()],
            },
            platform: None,
        }
    }

    #[test]
    fn assembles_current_version_without_defaults() {
        let config = assemble(inputs());
        assert_eq!(config.api_version, INSTALL_CONFIG_VERSION);
        assert_eq!(config.cluster_name(), "demo");
        assert_eq!(config.base_domain, "example.com");

        let networking = config.networking.unwrap();
        assert_eq!(networking.machine_network.len(), 1);
        assert!(networking.network_type.is_empty());
        assert!(networking.cluster_network.is_empty());
        assert!(config.control_plane.is_none());
        assert!(config.compute.is_empty());
        assert!(config.publish.is_none());
    }

    #[test]
    fn inputs_file_resolves_relative_secret_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("id.pub"), "ssh-ed25519 AAAAC3Nz user@host\n").unwrap();
        std::fs::write(dir.path().join("pull.json"), "{\"auths\":{}}\n").unwrap();
        std::fs::write(
            dir.path().join("inputs.yaml"),
            "clusterName: demo\nbaseDomain: example.com\nsshKeyFile: id.pub\npullSecretFile: pull.json\nmachineNetwork: [10.0.0.0/16]\nplatform:\n  aws:\n    region: us-east-1\n",
        )
        .unwrap();

        let resolved = InputsFile::new(dir.path().join("inputs.yaml")).resolve().unwrap();
        assert_eq!(resolved.identity.name, "demo");
        assert_eq!(resolved.secrets.ssh_key.as_deref(), Some("ssh-ed25519 AAAAC3Nz user@host"));
        assert_eq!(resolved.secrets.pull_secret, "{\"auths\":{}}");
        assert_eq!(resolved.networking.machine_network.len(), 1);
        assert_eq!(resolved.platform.unwrap().kind(), PlatformKind::Aws);
    }

    #[test]
    fn inputs_file_rejects_inline_and_file_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inputs.yaml");
        std::fs::write(&path, "clusterName: demo\npullSecret: x\npullSecretFile: pull.json\n").unwrap();

        let err = InputsFile::new(&path).resolve().unwrap_err();
        assert!(err.to_string().contains("set only one of pullSecret and pullSecretFile"));
    }

    #[test]
    fn inputs_file_missing() {
        let err = InputsFile::new("/nonexistent/inputs.yaml").resolve().unwrap_err();
        assert!(matches!(err, DependencyError::ReadFailed { .. }));
    }
}
