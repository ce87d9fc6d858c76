use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Host operating system, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    pub fn current() -> Result<Os> {
        Os::from_name(std::env::consts::OS)
    }

    pub fn from_name(name: &str) -> Result<Os> {
        match name {
            "linux" => Ok(Os::Linux),
            "macos" => Ok(Os::MacOs),
            "windows" => Ok(Os::Windows),
            other => bail!("unsupported operating system: {other}"),
        }
    }

    pub fn runtime_exe(self) -> &'static str {
        match self {
            Os::Windows => "deno.exe",
            _ => "deno",
        }
    }

    pub fn jq_exe(self) -> &'static str {
        match self {
            Os::Windows => "jq.exe",
            _ => "jq",
        }
    }

    /// Icon format each desktop environment expects.
    pub fn icon_ext(self) -> &'static str {
        match self {
            Os::Linux => "png",
            Os::MacOs => "icns",
            Os::Windows => "ico",
        }
    }
}

/// Release asset holding the runtime for this host.
pub fn runtime_asset(os: Os, arch: &str) -> Result<&'static str> {
    match (os, arch) {
        (Os::Linux, "x86_64") => Ok("deno-x86_64-unknown-linux-gnu.zip"),
        (Os::Linux, "aarch64") => Ok("deno-aarch64-unknown-linux-gnu.zip"),
        (Os::MacOs, "x86_64") => Ok("deno-x86_64-apple-darwin.zip"),
        (Os::MacOs, "aarch64") => Ok("deno-aarch64-apple-darwin.zip"),
        (Os::Windows, "x86_64") => Ok("deno-x86_64-pc-windows-msvc.zip"),
        (os, arch) => bail!("no runtime build for {os:?}/{arch}"),
    }
}

/// Prebuilt jq binary for this host.
pub fn jq_asset(os: Os, arch: &str) -> Result<&'static str> {
    match (os, arch) {
        (Os::Linux, "x86_64") => Ok("jq-linux-amd64"),
        (Os::Linux, "aarch64") => Ok("jq-linux-arm64"),
        (Os::MacOs, "x86_64") => Ok("jq-macos-amd64"),
        (Os::MacOs, "aarch64") => Ok("jq-macos-arm64"),
        (Os::Windows, "x86_64") => Ok("jq-windows-amd64.exe"),
        (os, arch) => bail!("no jq build for {os:?}/{arch}"),
    }
}

pub fn home_dir() -> Result<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    let home = std::env::var(var).with_context(|| format!("{var} not set"))?;
    Ok(PathBuf::from(home))
}
