//! `vcg show`: Show detected controllers of a process.

use clap::Args;
use nix::unistd::Pid;
use vcgroup_common::config::CgroupConfig;
use vcgroup_common::types::Controller;
use vcgroup_core::cgroup::detect_group;

use super::selected_backend;
use crate::output::{display_or_dash, parse_controllers};

/// Arguments for the `show` command.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Process to inspect (defaults to this process).
    #[arg(long)]
    pub pid: Option<i32>,

    /// Group path relative to the process placement.
    #[arg(long, default_value = "")]
    pub path: String,

    /// Comma-separated controllers to keep (defaults to all mounted).
    #[arg(long)]
    pub controllers: Option<String>,
}

/// Executes the `show` command.
///
/// # Errors
///
/// Returns an error if no backend is available or detection fails.
pub fn execute(args: &ShowArgs, config: &CgroupConfig) -> anyhow::Result<()> {
    let backend = selected_backend()?;
    let wanted = args.controllers.as_deref().map(parse_controllers).transpose()?;

    let group = detect_group(backend, config, &args.path, args.pid.map(Pid::from_raw), wanted)?;

    println!("{:<12} {:<40} {:<40} {:<30}", "CONTROLLER", "MOUNT", "PLACEMENT", "LINK");
    for (controller, state) in group.controllers() {
        if !state.is_mounted() && controller != Controller::Systemd {
            continue;
        }
        println!(
            "{:<12} {:<40} {:<40} {:<30}",
            controller,
            display_or_dash(state.mount_point.as_deref().map(|p| p.display().to_string())),
            display_or_dash(state.placement.clone()),
            display_or_dash(state.link_point.as_deref().map(|p| p.display().to_string())),
        );
    }
    Ok(())
}
