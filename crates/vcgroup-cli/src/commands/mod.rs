//! CLI command definitions and dispatch.

pub mod probe;
pub mod show;
pub mod validate;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use vcgroup_common::config::CgroupConfig;
use vcgroup_core::cgroup::{CgroupBackend, registry};

/// vcg: inspect cgroup v1 hierarchies and machine groups.
#[derive(Parser, Debug)]
#[command(name = "vcg", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file.
    #[arg(long, global = true, env = "VCGROUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Alternative procfs location.
    #[arg(long, global = true)]
    pub proc_root: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report whether the cgroup v1 backend is usable on this host.
    Probe(probe::ProbeArgs),
    /// Show mounts and placements detected for a process.
    Show(show::ShowArgs),
    /// Check that a process sits in the group of a given machine.
    Validate(validate::ValidateArgs),
}

impl Cli {
    /// Resolves the configuration from `--config` and `--proc-root`.
    fn resolve_config(&self) -> anyhow::Result<CgroupConfig> {
        let mut config = match &self.config {
            Some(path) => CgroupConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => CgroupConfig::default(),
        };
        if let Some(proc_root) = &self.proc_root {
            config.proc_root.clone_from(proc_root);
            config
                .validate()
                .with_context(|| format!("--proc-root {}", proc_root.display()))?;
        }
        Ok(config)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if configuration loading or the command fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    tracing::debug!(config = ?config, "resolved configuration");
    let backends = registry::init(&config);
    tracing::debug!(backends = ?backends, "cgroup backends registered");
    match cli.command {
        Command::Probe(args) => probe::execute(&args, &config),
        Command::Show(args) => show::execute(&args, &config),
        Command::Validate(args) => validate::execute(&args, &config),
    }
}

/// Backend selected once for this process.
///
/// # Errors
///
/// Returns an error when no backend is available on this host.
pub fn selected_backend() -> anyhow::Result<&'static dyn CgroupBackend> {
    registry::backend().ok_or_else(|| anyhow::anyhow!("no cgroup backend available"))
}
