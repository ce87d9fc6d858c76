use anyhow::{bail, Context, Result};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::config;
use crate::elevate::Elevation;
use crate::error::InstallError;
use crate::fetch::{Downloader, Transport};
use crate::fs_ops;
use crate::platform::{self, Os};

/// Finds the Deno runtime, downloading the latest release when the host has
/// none. Returns the directory containing the executable: entrypoint
/// generation only needs something to prepend to `PATH`.
pub fn locate_or_install(
    os: Os,
    elevation: &Elevation,
    transport: &dyn Transport,
) -> Result<PathBuf> {
    locate_or_install_with(
        os,
        elevation,
        transport,
        fs_ops::find_on_path,
        well_known_dirs(os),
    )
}

pub fn locate_or_install_with(
    os: Os,
    elevation: &Elevation,
    transport: &dyn Transport,
    on_path: impl Fn(&str) -> Option<PathBuf>,
    fallback_dirs: Vec<PathBuf>,
) -> Result<PathBuf> {
    if let Some(exe) = on_path(os.runtime_exe()) {
        if let Some(dir) = exe.parent() {
            log::debug!("runtime on search path: {}", exe.display());
            return Ok(dir.to_path_buf());
        }
    }
    if let Some(dir) = locate_in(&fallback_dirs, os) {
        log::debug!("runtime in well-known location: {}", dir.display());
        return Ok(dir);
    }

    log::info!("deno not found, fetching latest release");
    let target = target_bin_dir(os, elevation)?;
    install_runtime_into(&target, os, elevation, transport)
        .map_err(|err| InstallError::RuntimeAcquisition(format!("{err:#}")).into())
}

fn locate_in(dirs: &[PathBuf], os: Os) -> Option<PathBuf> {
    dirs.iter()
        .find(|dir| dir.join(os.runtime_exe()).is_file())
        .cloned()
}

/// System-wide first, then per-user locations in decreasing specificity.
fn well_known_dirs(os: Os) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if os != Os::Windows {
        dirs.push(PathBuf::from("/usr/local/bin"));
        dirs.push(PathBuf::from("/usr/bin"));
    }
    if let Ok(home) = platform::home_dir() {
        dirs.push(home.join(".deno").join("bin"));
        if os != Os::Windows {
            dirs.push(home.join(".local").join("bin"));
        }
    }
    dirs
}

fn target_bin_dir(os: Os, elevation: &Elevation) -> Result<PathBuf> {
    if elevation.privileged() && os != Os::Windows {
        return Ok(PathBuf::from("/usr/local/bin"));
    }
    Ok(platform::home_dir()?.join(".deno").join("bin"))
}

pub fn install_runtime_into(
    target_dir: &Path,
    os: Os,
    elevation: &Elevation,
    transport: &dyn Transport,
) -> Result<PathBuf> {
    let asset = platform::runtime_asset(os, std::env::consts::ARCH)?;
    let url = format!("{}/{asset}", config::RUNTIME_RELEASE_BASE);

    let staging = tempfile::tempdir().context("create staging dir")?;
    let archive = staging.path().join(asset);
    let body = transport
        .get(&url)
        .with_context(|| format!("download {url}"))?;
    fs::write(&archive, body).with_context(|| format!("write {}", archive.display()))?;

    let exe = extract_executable(&archive, os.runtime_exe())
        .with_context(|| format!("unpack {asset}"))?;
    Downloader::new(transport, elevation).place(
        &target_dir.join(os.runtime_exe()),
        &exe,
        Some(0o755),
    )?;
    Ok(target_dir.to_path_buf())
}

fn extract_executable(archive: &Path, exe_name: &str) -> Result<Vec<u8>> {
    let file = fs::File::open(archive).context("open archive")?;
    let mut zip = zip::ZipArchive::new(file).context("read archive")?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_owned();
        let matches = Path::new(&name)
            .file_name()
            .map(|f| f == exe_name)
            .unwrap_or(false);
        if !matches {
            continue;
        }
        let mut buf = Vec::new();
        io::copy(&mut entry, &mut buf).context("read archive entry")?;
        return Ok(buf);
    }
    bail!("{exe_name} not present in {}", archive.display())
}
