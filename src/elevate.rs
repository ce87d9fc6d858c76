use anyhow::{bail, Context, Result};
use std::ffi::OsStr;
use std::process::Command;

use crate::error::InstallError;
use crate::fs_ops;

/// Whether an install targets the current user only or the whole system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    System,
}

/// The run-wide privilege decision. Resolved once by the orchestrator and
/// passed by reference into everything that writes to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elevation {
    command: Option<String>,
    privileged: bool,
}

/// Probe order when the process itself is not already root.
const ELEVATION_TOOLS: [&str; 2] = ["sudo", "doas"];

impl Elevation {
    pub fn none() -> Elevation {
        Elevation {
            command: None,
            privileged: false,
        }
    }

    fn direct() -> Elevation {
        Elevation {
            command: None,
            privileged: true,
        }
    }

    fn through(tool: &str) -> Elevation {
        Elevation {
            command: Some(tool.to_string()),
            privileged: true,
        }
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// True when writes may target system-wide locations, either because
    /// the process is privileged or an elevation command is in effect.
    pub fn privileged(&self) -> bool {
        self.privileged
    }

    /// Runs `program args...` through the elevation command when one is
    /// active, directly otherwise.
    pub fn run<I, S>(&self, program: &str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = match self.command.as_deref() {
            Some(elevator) => {
                let mut cmd = Command::new(elevator);
                cmd.arg(program);
                cmd
            }
            None => Command::new(program),
        };
        cmd.args(args);
        let status = cmd
            .status()
            .with_context(|| format!("spawn {program}"))?;
        if !status.success() {
            bail!("{program} failed (exit {:?})", status.code());
        }
        Ok(())
    }
}

pub fn resolve(scope: Scope) -> Result<Elevation> {
    resolve_with(scope, process_is_root(), |tool| {
        fs_ops::find_on_path(tool).is_some()
    })
}

pub fn resolve_with(
    scope: Scope,
    already_root: bool,
    available: impl Fn(&str) -> bool,
) -> Result<Elevation> {
    if scope == Scope::User {
        return Ok(Elevation::none());
    }
    if already_root {
        return Ok(Elevation::direct());
    }
    for tool in ELEVATION_TOOLS {
        if available(tool) {
            return Ok(Elevation::through(tool));
        }
    }
    Err(InstallError::ElevationUnavailable(format!(
        "system-wide install needs root or one of: {}",
        ELEVATION_TOOLS.join(", ")
    ))
    .into())
}

#[cfg(unix)]
fn process_is_root() -> bool {
    Command::new("id")
        .arg("-u")
        .output()
        .map(|out| out.status.success() && String::from_utf8_lossy(&out.stdout).trim() == "0")
        .unwrap_or(false)
}

// Writes to machine-wide locations go through UAC, not an external
// elevator; failures surface as IO errors at write time.
#[cfg(not(unix))]
fn process_is_root() -> bool {
    true
}
