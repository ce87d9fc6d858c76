use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::config;
use crate::elevate::Elevation;
use crate::error::InstallError;
use crate::fs_ops;

/// Transfer half of the download client; every network access goes
/// through this seam.
pub trait Transport {
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<HttpTransport> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config::HTTP_TIMEOUT_SECS))
            .user_agent(config::USER_AGENT)
            .build()
            .context("build http client")?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .context("http GET failed")?
            .error_for_status()
            .context("http error")?;
        let body = resp.bytes().context("read response body")?;
        Ok(body.to_vec())
    }
}

/// Writes fetched and generated files, honoring the run's elevation.
pub struct Downloader<'a> {
    transport: &'a dyn Transport,
    elevation: &'a Elevation,
}

impl<'a> Downloader<'a> {
    pub fn new(transport: &'a dyn Transport, elevation: &'a Elevation) -> Downloader<'a> {
        Downloader {
            transport,
            elevation,
        }
    }

    /// Transfers `url` to `dest`, optionally applying a permission mode.
    /// The destination is untouched unless the full transfer succeeded.
    pub fn fetch(&self, url: &str, dest: &Path, mode: Option<u32>) -> Result<()> {
        let bytes = self.transport.get(url).map_err(|err| InstallError::Download {
            url: url.to_string(),
            reason: format!("{err:#}"),
        })?;
        self.place(dest, &bytes, mode)
            .with_context(|| format!("install {}", dest.display()))
    }

    /// Write path shared with locally generated files (wrappers, manifests).
    pub fn place(&self, dest: &Path, bytes: &[u8], mode: Option<u32>) -> Result<()> {
        let parent = dest.parent().context("dest has no parent")?;
        match self.elevation.command() {
            None => {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
                fs_ops::write_bytes_with_retry(dest, bytes, 3)?;
                if let Some(mode) = mode {
                    fs_ops::set_mode(dest, mode)?;
                }
            }
            Some(_) => {
                let mut staged = tempfile::NamedTempFile::new().context("stage download")?;
                staged.write_all(bytes).context("write staged download")?;
                staged.flush().context("flush staged download")?;
                self.elevation
                    .run("mkdir", [OsStr::new("-p"), parent.as_os_str()])?;
                self.elevation
                    .run("cp", [staged.path().as_os_str(), dest.as_os_str()])?;
                if let Some(mode) = mode {
                    self.elevation.run(
                        "chmod",
                        [
                            std::ffi::OsString::from(format!("{mode:o}")),
                            dest.as_os_str().to_os_string(),
                        ],
                    )?;
                }
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FixtureTransport;
    use super::*;

    #[test]
    fn fetch_writes_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("apps").join("boop").join("index.ts");
        let transport = FixtureTransport::new().with("http://x/index.ts", "console.log(1)");
        let elevation = Elevation::none();
        let dl = Downloader::new(&transport, &elevation);

        dl.fetch("http://x/index.ts", &dest, None).unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "console.log(1)");
    }

    #[cfg(unix)]
    #[test]
    fn fetch_applies_mode() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("run");
        let transport = FixtureTransport::new().with("http://x/run", "#!/bin/sh\n");
        let elevation = Elevation::none();
        let dl = Downloader::new(&transport, &elevation);

        dl.fetch("http://x/run", &dest, Some(0o755)).unwrap();

        let mode = std::fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn failed_transfer_leaves_destination_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("index.ts");
        std::fs::write(&dest, "previous install").unwrap();
        let transport = FixtureTransport::new();
        let elevation = Elevation::none();
        let dl = Downloader::new(&transport, &elevation);

        let err = dl.fetch("http://x/missing", &dest, None).unwrap_err();

        let class = err.downcast_ref::<InstallError>().unwrap();
        assert!(matches!(class, InstallError::Download { .. }));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous install");
    }

    #[test]
    fn fetch_overwrites_previous_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("index.html");
        let elevation = Elevation::none();

        let first = FixtureTransport::new().with("http://x/p", "v1");
        Downloader::new(&first, &elevation)
            .fetch("http://x/p", &dest, None)
            .unwrap();
        let second = FixtureTransport::new().with("http://x/p", "v2");
        Downloader::new(&second, &elevation)
            .fetch("http://x/p", &dest, None)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "v2");
    }
}
