//! Main CLI application structure

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{check, graph_cmd};
use crate::domain::VersionedIdentifier;
use crate::storage::{ChangeKind, ChangeSpec, Config, HostConfig, Workspace};

#[derive(Parser)]
#[command(name = "update-guard")]
#[command(author, version, about = "Validates changes to an installed feature configuration")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub platform: PlatformArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the host platform
#[derive(Args, Debug, Default)]
pub struct PlatformArgs {
    /// Operating system to validate for
    #[arg(long, global = true, env = "UPDATE_GUARD_OS")]
    pub os: Option<String>,

    /// Windowing system to validate for
    #[arg(long, global = true, env = "UPDATE_GUARD_WS")]
    pub ws: Option<String>,

    /// Architecture to validate for
    #[arg(long, global = true, env = "UPDATE_GUARD_ARCH")]
    pub arch: Option<String>,
}

impl PlatformArgs {
    fn overrides(&self) -> HostConfig {
        HostConfig {
            os: self.os.clone(),
            ws: self.ws.clone(),
            arch: self.arch.clone(),
            ..HostConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new workspace
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Validate the current configuration
    Status,

    /// Validate installing a feature
    Install {
        /// Feature to install (id@version)
        feature: VersionedIdentifier,

        /// Feature replaced by the install (id@version)
        #[arg(long)]
        replace: Option<VersionedIdentifier>,
    },

    /// Validate uninstalling a feature
    Uninstall {
        /// Feature to uninstall (id@version)
        feature: VersionedIdentifier,
    },

    /// Validate configuring an installed feature
    Configure {
        /// Feature to configure (id@version)
        feature: VersionedIdentifier,
    },

    /// Validate unconfiguring a feature
    Unconfigure {
        /// Feature to unconfigure (id@version)
        feature: VersionedIdentifier,
    },

    /// Validate reverting to a saved configuration
    Revert {
        /// Configuration name under configurations/
        configuration: String,
    },

    /// Validate a session delta manifest
    Delta {
        /// Delta file (yaml, json or toml)
        file: PathBuf,
    },

    /// Validate a batch of changes applied together
    Batch {
        /// Batch file (yaml, json or toml)
        file: PathBuf,
    },

    /// Show the include tree of a feature in install order
    Graph {
        /// Top feature (id@version)
        feature: VersionedIdentifier,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format.into(),
    };
    let output = Output::new(format);
    let overrides = cli.platform.overrides();

    let valid = match cli.command {
        Commands::Init { path } => {
            let workspace = Workspace::init(&path)?;
            output.success(&format!(
                "Initialized update-guard workspace at {}",
                workspace.root().display()
            ));
            true
        }

        Commands::Status => check::status(&output, &overrides)?,

        Commands::Install { feature, replace } => {
            let spec = ChangeSpec {
                kind: ChangeKind::Install,
                feature,
                replaces: replace,
            };
            check::change(&output, &overrides, &spec)?
        }
        Commands::Uninstall { feature } => {
            check::change(&output, &overrides, &single(ChangeKind::Uninstall, feature))?
        }
        Commands::Configure { feature } => {
            check::change(&output, &overrides, &single(ChangeKind::Configure, feature))?
        }
        Commands::Unconfigure { feature } => {
            check::change(&output, &overrides, &single(ChangeKind::Unconfigure, feature))?
        }

        Commands::Revert { configuration } => check::revert(&output, &overrides, &configuration)?,
        Commands::Delta { file } => check::delta(&output, &overrides, &file)?,
        Commands::Batch { file } => check::batch(&output, &overrides, &file)?,

        Commands::Graph { feature } => {
            graph_cmd::run(&output, &overrides, &feature)?;
            true
        }
    };

    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn single(kind: ChangeKind, feature: VersionedIdentifier) -> ChangeSpec {
    ChangeSpec {
        kind,
        feature,
        replaces: None,
    }
}

/// Logs to stderr; `RUST_LOG` takes precedence over `--verbose`
fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("update_guard=debug")
        } else {
            EnvFilter::new("update_guard=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_install_with_replacement() {
        let cli = Cli::try_parse_from([
            "update-guard",
            "--os",
            "win32",
            "install",
            "com.acme.ide@2.0.0",
            "--replace",
            "com.acme.ide@1.0.0",
        ])
        .unwrap();

        assert_eq!(cli.platform.os.as_deref(), Some("win32"));
        match cli.command {
            Commands::Install { feature, replace } => {
                assert_eq!(feature.to_string(), "com.acme.ide@2.0.0");
                assert_eq!(replace.map(|r| r.to_string()).as_deref(), Some("com.acme.ide@1.0.0"));
            }
            _ => panic!("expected install"),
        }
    }

    #[test]
    fn reject_malformed_identifier() {
        assert!(Cli::try_parse_from(["update-guard", "configure", "no-version"]).is_err());
    }
}
