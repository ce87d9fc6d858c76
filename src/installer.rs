use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;
use crate::elevate::{Elevation, Scope};
use crate::fetch::{Downloader, Transport};
use crate::layout::{self, InstallLayout};
use crate::platform::Os;

/// Everything one app install needs, resolved once per run by the
/// orchestrator and shared across apps.
pub struct InstallRequest<'a> {
    pub app: &'a str,
    pub scope: Scope,
    pub git_ref: &'a str,
    pub runtime_dir: &'a Path,
    pub elevation: &'a Elevation,
    pub transport: &'a dyn Transport,
}

pub struct InstallOutcome {
    pub layout: InstallLayout,
}

pub trait PlatformInstaller {
    fn install(&self, req: &InstallRequest) -> Result<InstallOutcome>;
}

pub fn for_os(os: Os) -> Box<dyn PlatformInstaller> {
    match os {
        Os::Linux => Box::new(LinuxInstaller),
        Os::MacOs => Box::new(MacInstaller),
        Os::Windows => Box::new(WindowsInstaller),
    }
}

/// Backend, frontend and icon transfers shared by every strategy. The
/// backend is executable-flagged; the icon comes from the shared assets
/// directory in the OS-native format.
fn fetch_artifacts(req: &InstallRequest, layout: &InstallLayout, os: Os) -> Result<()> {
    let dl = Downloader::new(req.transport, req.elevation);
    let app_src = format!("{}{}", config::SOURCE_PREFIX, req.app);
    dl.fetch(
        &config::raw_url(req.git_ref, &format!("{app_src}/{}", config::BACKEND_FILE)),
        &layout.backend,
        Some(0o755),
    )?;
    dl.fetch(
        &config::raw_url(req.git_ref, &format!("{app_src}/{}", config::FRONTEND_FILE)),
        &layout.frontend,
        None,
    )?;
    dl.fetch(
        &config::raw_url(
            req.git_ref,
            &format!("{}/icon.{}", config::ICON_DIR, os.icon_ext()),
        ),
        &layout.icon,
        None,
    )?;
    Ok(())
}

/// Launchers invoke the entry by path without the user's shell
/// environment, so the wrapper makes the runtime discoverable itself.
fn sh_wrapper(runtime_dir: &Path, backend: &Path) -> String {
    format!(
        "#!/bin/sh\n\
         PATH=\"{}:$PATH\"\n\
         export PATH\n\
         exec deno run --allow-all \"{}\"\n",
        runtime_dir.display(),
        backend.display()
    )
}

fn cmd_wrapper(runtime_dir: &Path, backend: &Path) -> String {
    format!(
        "@echo off\r\n\
         set \"PATH={};%PATH%\"\r\n\
         deno run --allow-all \"{}\" %*\r\n",
        runtime_dir.display(),
        backend.display()
    )
}

fn desktop_entry(app: &str, layout: &InstallLayout) -> String {
    let title = layout::title(app);
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={title}\n\
         Exec={}\n\
         Icon={}\n\
         Terminal=false\n\
         Categories=Utility;\n",
        layout.entrypoint.display(),
        layout.icon.display()
    )
}

fn info_plist(app: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleName</key>
	<string>{title}</string>
	<key>CFBundleIdentifier</key>
	<string>{bundle_id}</string>
	<key>CFBundleExecutable</key>
	<string>{app}</string>
	<key>CFBundleIconFile</key>
	<string>icon.icns</string>
	<key>CFBundlePackageType</key>
	<string>APPL</string>
</dict>
</plist>
"#,
        title = layout::title(app),
        bundle_id = layout::bundle_id(app),
    )
}

pub struct LinuxInstaller;

impl PlatformInstaller for LinuxInstaller {
    fn install(&self, req: &InstallRequest) -> Result<InstallOutcome> {
        let layout = layout::for_host(Os::Linux, req.scope, req.app)?;
        fetch_artifacts(req, &layout, Os::Linux)?;

        let dl = Downloader::new(req.transport, req.elevation);
        dl.place(
            &layout.entrypoint,
            sh_wrapper(req.runtime_dir, &layout.backend).as_bytes(),
            Some(0o755),
        )
        .context("write entrypoint wrapper")?;
        dl.place(
            &layout.manifest,
            desktop_entry(req.app, &layout).as_bytes(),
            None,
        )
        .context("write desktop entry")?;
        Ok(InstallOutcome { layout })
    }
}

pub struct MacInstaller;

impl PlatformInstaller for MacInstaller {
    fn install(&self, req: &InstallRequest) -> Result<InstallOutcome> {
        let layout = layout::for_host(Os::MacOs, req.scope, req.app)?;
        fetch_artifacts(req, &layout, Os::MacOs)?;

        let dl = Downloader::new(req.transport, req.elevation);
        dl.place(
            &layout.entrypoint,
            sh_wrapper(req.runtime_dir, &layout.backend).as_bytes(),
            Some(0o755),
        )
        .context("write entrypoint wrapper")?;
        dl.place(&layout.manifest, info_plist(req.app).as_bytes(), None)
            .context("write Info.plist")?;
        Ok(InstallOutcome { layout })
    }
}

/// On Windows the Start-Menu shortcut is the integration manifest: its
/// target is the runtime executable invoking the backend with
/// full-permission flags.
pub struct ShortcutSpec {
    pub lnk_path: PathBuf,
    pub target: PathBuf,
    pub args: String,
    pub icon: PathBuf,
}

pub struct WindowsInstaller;

impl WindowsInstaller {
    pub fn install_with(
        &self,
        req: &InstallRequest,
        create_shortcut: impl Fn(&ShortcutSpec) -> Result<()>,
    ) -> Result<InstallOutcome> {
        let layout = layout::for_host(Os::Windows, req.scope, req.app)?;
        fetch_artifacts(req, &layout, Os::Windows)?;

        let dl = Downloader::new(req.transport, req.elevation);
        dl.place(
            &layout.entrypoint,
            cmd_wrapper(req.runtime_dir, &layout.backend).as_bytes(),
            None,
        )
        .context("write entrypoint wrapper")?;

        let spec = ShortcutSpec {
            lnk_path: layout.manifest.clone(),
            target: req.runtime_dir.join("deno.exe"),
            args: format!("run --allow-all \"{}\"", layout.backend.display()),
            icon: layout.icon.clone(),
        };
        create_shortcut(&spec).context("create Start Menu shortcut")?;
        Ok(InstallOutcome { layout })
    }
}

impl PlatformInstaller for WindowsInstaller {
    fn install(&self, req: &InstallRequest) -> Result<InstallOutcome> {
        self.install_with(req, write_start_menu_shortcut)
    }
}

#[cfg(windows)]
fn write_start_menu_shortcut(spec: &ShortcutSpec) -> Result<()> {
    use mslnk::ShellLink;

    let menu_dir = spec.lnk_path.parent().context("shortcut has no parent")?;
    std::fs::create_dir_all(menu_dir)
        .with_context(|| format!("create {}", menu_dir.display()))?;

    let mut link = ShellLink::new(&spec.target)
        .map_err(|err| anyhow::anyhow!("shortcut target {}: {err}", spec.target.display()))?;
    link.set_arguments(Some(spec.args.clone()));
    link.set_icon_location(Some(spec.icon.display().to_string()));
    link.create_lnk(&spec.lnk_path)
        .map_err(|err| anyhow::anyhow!("write {}: {err}", spec.lnk_path.display()))?;
    Ok(())
}

#[cfg(not(windows))]
fn write_start_menu_shortcut(_spec: &ShortcutSpec) -> Result<()> {
    anyhow::bail!("Start Menu shortcuts require a Windows host")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapper_extends_path_before_invoking_backend() {
        let script = sh_wrapper(Path::new("/opt/runtime/bin"), Path::new("/apps/boop/index.ts"));
        let path_line = script.find("PATH=\"/opt/runtime/bin:$PATH\"").unwrap();
        let exec_line = script.find("exec deno run --allow-all").unwrap();
        assert!(path_line < exec_line);
        assert!(script.ends_with("\"/apps/boop/index.ts\"\n"));
    }

    #[test]
    fn cmd_wrapper_extends_path_before_invoking_backend() {
        let script = cmd_wrapper(Path::new(r"C:\runtime"), Path::new(r"C:\apps\boop\index.ts"));
        let path_line = script.find("set \"PATH=").unwrap();
        let run_line = script.find("deno run --allow-all").unwrap();
        assert!(path_line < run_line);
    }

    #[test]
    fn desktop_entry_points_at_wrapper_and_icon() {
        let layout = layout::for_host(Os::Linux, Scope::System, "boop").unwrap();
        let entry = desktop_entry("boop", &layout);
        assert!(entry.starts_with("[Desktop Entry]\n"));
        assert!(entry.contains("Name=Boop\n"));
        assert!(entry.contains("Exec=/opt/deno_apps/boop/boop\n"));
        assert!(entry.contains("Icon=/opt/deno_apps/boop/icon.png\n"));
    }

    #[test]
    fn plist_carries_hyphenated_bundle_identifier() {
        let plist = info_plist("text_editor");
        assert!(plist.contains("<string>com.denoapps.text-editor</string>"));
        assert!(plist.contains("<string>Text_editor</string>"));
        assert!(plist.contains("<string>text_editor</string>"));
    }
}
