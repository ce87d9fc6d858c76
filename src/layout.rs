use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config;
use crate::elevate::Scope;
use crate::platform::{self, Os};

/// Absolute destinations for one app install. Derived fresh from
/// `{os, scope, app}` on every install; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub app_dir: PathBuf,
    pub backend: PathBuf,
    pub frontend: PathBuf,
    pub icon: PathBuf,
    pub entrypoint: PathBuf,
    pub manifest: PathBuf,
}

/// Launcher display name: the identifier with its first character
/// upper-cased.
pub fn title(app: &str) -> String {
    let mut chars = app.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub fn bundle_id(app: &str) -> String {
    format!("{}{}", config::BUNDLE_ID_PREFIX, app.replace('_', "-"))
}

pub fn for_host(os: Os, scope: Scope, app: &str) -> Result<InstallLayout> {
    match os {
        Os::Linux => linux(scope, app),
        Os::MacOs => macos(scope, app),
        Os::Windows => windows(scope, app),
    }
}

fn linux(scope: Scope, app: &str) -> Result<InstallLayout> {
    let (app_dir, applications) = match scope {
        Scope::System => (
            PathBuf::from("/opt/deno_apps").join(app),
            PathBuf::from("/usr/share/applications"),
        ),
        Scope::User => {
            let data = xdg_data_home()?;
            (data.join("deno_apps").join(app), data.join("applications"))
        }
    };
    Ok(InstallLayout {
        backend: app_dir.join(config::BACKEND_FILE),
        frontend: app_dir.join(config::FRONTEND_FILE),
        icon: app_dir.join("icon.png"),
        entrypoint: app_dir.join(app),
        manifest: applications.join(format!("{app}.desktop")),
        app_dir,
    })
}

fn macos(scope: Scope, app: &str) -> Result<InstallLayout> {
    let root = match scope {
        Scope::System => PathBuf::from("/Applications"),
        Scope::User => platform::home_dir()?.join("Applications"),
    };
    let contents = root.join(format!("{}.app", title(app))).join("Contents");
    let macos_dir = contents.join("MacOS");
    Ok(InstallLayout {
        backend: macos_dir.join(config::BACKEND_FILE),
        frontend: macos_dir.join(config::FRONTEND_FILE),
        icon: contents.join("Resources").join("icon.icns"),
        entrypoint: macos_dir.join(app),
        manifest: contents.join("Info.plist"),
        app_dir: macos_dir,
    })
}

fn windows(scope: Scope, app: &str) -> Result<InstallLayout> {
    let (base, menu_base) = match scope {
        Scope::System => (
            env_path("ProgramFiles")?.join("Deno Apps"),
            env_path("ProgramData")?,
        ),
        Scope::User => (
            env_path("LOCALAPPDATA")?.join("DenoApps"),
            env_path("APPDATA")?,
        ),
    };
    let app_dir = base.join(app);
    let start_menu = menu_base
        .join("Microsoft")
        .join("Windows")
        .join("Start Menu")
        .join("Programs");
    Ok(InstallLayout {
        backend: app_dir.join(config::BACKEND_FILE),
        frontend: app_dir.join(config::FRONTEND_FILE),
        icon: app_dir.join("icon.ico"),
        entrypoint: app_dir.join(format!("{app}.cmd")),
        manifest: start_menu.join(format!("{}.lnk", title(app))),
        app_dir,
    })
}

fn xdg_data_home() -> Result<PathBuf> {
    match std::env::var("XDG_DATA_HOME") {
        Ok(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => Ok(platform::home_dir()?.join(".local").join("share")),
    }
}

fn env_path(var: &str) -> Result<PathBuf> {
    let value = std::env::var(var).with_context(|| format!("{var} not set"))?;
    Ok(PathBuf::from(value))
}
