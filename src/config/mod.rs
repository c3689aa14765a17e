//! Install-config model, assembly, loading, upconversion and defaults.

pub mod assemble;
pub mod cidr;
pub mod defaults;
pub mod loader;
pub mod migrate;
pub mod model;

#[cfg(test)]
pub(crate) mod fixtures;

pub use assemble::{assemble, InputsFile, Parents, ResolvedInputs};
pub use loader::{AssetFile, FileFetcher, FsFetcher};
pub use model::InstallConfig;

/// Name of the persisted install-config artifact.
pub const INSTALL_CONFIG_FILENAME: &str = "install-config.yaml";

/// Schema version written by this crate.
pub const INSTALL_CONFIG_VERSION: &str = "v1";
