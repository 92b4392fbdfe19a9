//! `vcg validate`: Check a process against a machine identity.

use clap::Args;
use nix::unistd::Pid;
use vcgroup_common::config::CgroupConfig;
use vcgroup_core::cgroup::detect_group;

use super::selected_backend;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Process whose placement is checked.
    #[arg(long)]
    pub pid: i32,

    /// Short machine name, e.g. `demo`.
    #[arg(long)]
    pub name: String,

    /// Driver name, e.g. `qemu`.
    #[arg(long, default_value = "qemu")]
    pub driver: String,

    /// Full machine name, e.g. `qemu-1-demo`.
    #[arg(long)]
    pub machine: String,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if detection fails or the placement does not belong
/// to the machine.
pub fn execute(args: &ValidateArgs, config: &CgroupConfig) -> anyhow::Result<()> {
    let backend = selected_backend()?;
    let group = detect_group(backend, config, "", Some(Pid::from_raw(args.pid)), None)?;

    if !backend.validate_machine_group(&group, &args.name, &args.driver, &args.machine) {
        anyhow::bail!(
            "process {} is not in the cgroup of machine '{}'",
            args.pid,
            args.machine
        );
    }
    println!("process {} belongs to machine '{}'", args.pid, args.machine);
    Ok(())
}
