//! # vcg: vcgroup CLI
//!
//! Inspects the cgroup v1 hierarchies of the host: backend availability,
//! the controllers and placements of a process, and whether a process
//! sits in the expected machine group.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
