use anyhow::{bail, Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use crate::config;
use crate::fetch::Transport;
use crate::fs_ops;
use crate::platform::{self, Os};

/// A usable `jq` binary. When the host has none, a prebuilt release binary
/// is staged in a temp directory that lives only as long as this value.
pub struct JqTool {
    path: PathBuf,
    _staging: Option<tempfile::TempDir>,
}

impl JqTool {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn ensure(os: Os, transport: &dyn Transport) -> Result<JqTool> {
    ensure_with(os, transport, fs_ops::find_on_path)
}

pub fn ensure_with(
    os: Os,
    transport: &dyn Transport,
    on_path: impl Fn(&str) -> Option<PathBuf>,
) -> Result<JqTool> {
    if let Some(path) = on_path(os.jq_exe()) {
        return Ok(JqTool {
            path,
            _staging: None,
        });
    }

    let asset = platform::jq_asset(os, std::env::consts::ARCH)?;
    let url = format!("{}/{asset}", config::JQ_RELEASE_BASE);
    log::debug!("jq not on search path, fetching {url}");

    let staging = tempfile::tempdir().context("create jq staging dir")?;
    let path = staging.path().join(os.jq_exe());
    let body = transport
        .get(&url)
        .with_context(|| format!("download {url}"))?;
    fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    fs_ops::set_mode(&path, 0o755)?;
    Ok(JqTool {
        path,
        _staging: Some(staging),
    })
}

/// Runs the tool over a tree payload and returns the blob paths.
pub fn blob_paths(tool: &JqTool, payload: &[u8]) -> Result<Vec<String>> {
    let mut child = Command::new(tool.path())
        .arg("-r")
        .arg(r#".tree[] | select(.type == "blob") | .path"#)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("spawn {}", tool.path().display()))?;

    child
        .stdin
        .take()
        .context("jq stdin not piped")?
        .write_all(payload)
        .context("feed jq")?;
    let out = child.wait_with_output().context("wait for jq")?;
    if !out.status.success() {
        bail!("jq failed (exit {:?})", out.status.code());
    }

    Ok(String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}
