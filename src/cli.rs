//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Generates, loads and validates the cluster install-config asset.
#[derive(Parser, Debug)]
#[command(name = "install-config", version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Returns the log level based on verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load the install config, or generate it from inputs, and write it.
    Create(CreateArgs),

    /// Load and validate the persisted install config.
    Validate(AssetDirArgs),

    /// Print the persisted install config after defaults are applied.
    Show(AssetDirArgs),

    /// List known platforms and their validation capabilities.
    Platforms,
}

/// Location of the asset directory.
#[derive(Args, Debug)]
pub struct AssetDirArgs {
    /// Directory holding install-config.yaml.
    #[arg(short, long, default_value = ".", env = "INSTALL_CONFIG_DIR")]
    pub dir: PathBuf,
}

/// Arguments for the create subcommand.
#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub asset: AssetDirArgs,

    /// Inputs file used when no install config exists yet.
    #[arg(short, long, env = "INSTALL_CONFIG_INPUTS")]
    pub inputs: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_level() {
        let cli = Cli::parse_from(["install-config", "-vv", "platforms"]);
        assert_eq!(cli.log_level(), "trace");
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn create_takes_dir_and_inputs() {
        let cli = Cli::parse_from([
            "install-config",
            "--log-format",
            "json",
            "create",
            "--dir",
            "/tmp/assets",
            "--inputs",
            "inputs.yaml",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.asset.dir, PathBuf::from("/tmp/assets"));
                assert_eq!(args.inputs, Some(PathBuf::from("inputs.yaml")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
