//! Scalar control file access.
//!
//! Every tunable is one value in one file under a controller's group
//! directory. Reads drop the trailing newline the kernel appends.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use vcgroup_common::error::{Result, VcgroupError};
use vcgroup_common::types::Controller;

use super::controllers::path_of_controller;
use crate::cgroup::group::Group;

fn read_file(path: &Path) -> Result<String> {
    let mut value = std::fs::read_to_string(path).map_err(|e| VcgroupError::io(path, e))?;
    if value.ends_with('\n') {
        let _ = value.pop();
    }
    Ok(value)
}

pub(super) fn get_value_str(group: &Group, controller: Controller, key: &str) -> Result<String> {
    let path = path_of_controller(group, controller, Some(key))?;
    let value = read_file(&path)?;
    tracing::debug!(path = %path.display(), value, "get value");
    Ok(value)
}

pub(super) fn set_value_str(
    group: &Group,
    controller: Controller,
    key: &str,
    value: &str,
) -> Result<()> {
    let path = path_of_controller(group, controller, Some(key))?;
    tracing::debug!(path = %path.display(), value, "set value");
    // Control files come from the kernel; a missing one is never created.
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(&path)
        .map_err(|e| VcgroupError::io(&path, e))?;
    file.write_all(value.as_bytes())
        .map_err(|e| VcgroupError::io(&path, e))
}

fn get_parsed<T: FromStr>(group: &Group, controller: Controller, key: &str) -> Result<T> {
    let path = path_of_controller(group, controller, Some(key))?;
    let value = read_file(&path)?;
    value
        .trim()
        .parse()
        .map_err(|_| VcgroupError::Parse { path, value })
}

pub(super) fn get_value_u64(group: &Group, controller: Controller, key: &str) -> Result<u64> {
    get_parsed(group, controller, key)
}

pub(super) fn get_value_u32(group: &Group, controller: Controller, key: &str) -> Result<u32> {
    get_parsed(group, controller, key)
}

pub(super) fn get_value_i64(group: &Group, controller: Controller, key: &str) -> Result<i64> {
    get_parsed(group, controller, key)
}

pub(super) fn set_value_u64(
    group: &Group,
    controller: Controller,
    key: &str,
    value: u64,
) -> Result<()> {
    set_value_str(group, controller, key, &value.to_string())
}

pub(super) fn set_value_i64(
    group: &Group,
    controller: Controller,
    key: &str,
    value: i64,
) -> Result<()> {
    set_value_str(group, controller, key, &value.to_string())
}

pub(super) fn get_flag(group: &Group, controller: Controller, key: &str) -> Result<bool> {
    Ok(get_value_u64(group, controller, key)? == 1)
}

pub(super) fn set_flag(group: &Group, controller: Controller, key: &str, on: bool) -> Result<()> {
    set_value_u64(group, controller, key, u64::from(on))
}
