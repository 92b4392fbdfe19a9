//! `vcg probe`: Report cgroup v1 availability.

use clap::Args;
use vcgroup_common::config::CgroupConfig;
use vcgroup_core::cgroup::registry;

/// Arguments for the `probe` command.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Exit with an error when no backend is available.
    #[arg(long)]
    pub strict: bool,
}

/// Executes the `probe` command.
///
/// # Errors
///
/// Returns an error in strict mode when no backend is available.
pub fn execute(args: &ProbeArgs, config: &CgroupConfig) -> anyhow::Result<()> {
    tracing::debug!(proc_root = %config.proc_root.display(), "probing cgroup backends");
    match registry::backend() {
        Some(backend) => println!("{}: available", backend.backend_type()),
        None if args.strict => anyhow::bail!("no cgroup backend available"),
        None => println!("no cgroup backend available"),
    }
    Ok(())
}
