mod catalog;
mod cli;
mod config;
mod elevate;
mod error;
mod fetch;
mod fs_ops;
mod installer;
mod jqtool;
mod layout;
mod platform;
mod runtime;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::elevate::Scope;
use crate::error::InstallError;
use crate::fetch::HttpTransport;
use crate::platform::Os;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);
    if let Err(err) = run(&cli) {
        eprintln!("error: {err:#}");
        std::process::exit(error::exit_code(&err));
    }
}

fn init_logging(debug: bool) {
    let quiet = std::env::var_os(config::NOLOG_ENV)
        .map(|value| !value.is_empty())
        .unwrap_or(false);
    let level = if quiet {
        log::LevelFilter::Error
    } else if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let os = Os::current()?;
    let transport = HttpTransport::new()?;

    if cli.list {
        for app in catalog::list_apps(os, &transport, &cli.version)? {
            println!("{app}");
        }
        return Ok(());
    }
    if cli.apps.is_empty() {
        return Err(InstallError::Usage(
            "no app given (use --list to see what is installable)".into(),
        )
        .into());
    }

    let scope = if cli.user { Scope::User } else { Scope::System };
    let elevation = elevate::resolve(scope)?;
    let available = catalog::list_apps(os, &transport, &cli.version)?;
    let strategy = installer::for_os(os);

    // The runtime is resolved at most once, lazily before the first
    // matching install, and shared by every app in the batch.
    let mut runtime_dir: Option<PathBuf> = None;
    let mut missed: Vec<&str> = Vec::new();
    let mut installed = 0usize;
    let mut failed = 0usize;

    for requested in &cli.apps {
        let app = normalize(requested);
        if !available.iter().any(|known| *known == app) {
            log::warn!("{requested}: no such app in the catalog");
            missed.push(requested);
            continue;
        }

        let rt = match runtime_dir.as_ref() {
            Some(dir) => dir.clone(),
            None => {
                let dir = runtime::locate_or_install(os, &elevation, &transport)?;
                runtime_dir = Some(dir.clone());
                dir
            }
        };

        let request = installer::InstallRequest {
            app: &app,
            scope,
            git_ref: &cli.version,
            runtime_dir: &rt,
            elevation: &elevation,
            transport: &transport,
        };
        // One app failing must not sink its siblings; failures are
        // reported here and reflected in the exit code after the batch.
        match strategy.install(&request) {
            Ok(outcome) => {
                installed += 1;
                log::info!("installed {app} -> {}", outcome.layout.app_dir.display());
            }
            Err(err) => {
                failed += 1;
                eprintln!("error: {app}: {err:#}");
            }
        }
    }

    if installed == 0 && failed == 0 {
        return Err(InstallError::Usage(format!(
            "no requested app matched the catalog: {}",
            missed.join(", ")
        ))
        .into());
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} installs failed", installed + failed);
    }
    Ok(())
}

/// Catalog identifiers use underscores as word separators; accept the
/// hyphenated spelling people actually type.
fn normalize(requested: &str) -> String {
    requested.trim().replace('-', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_maps_hyphens_to_underscores() {
        assert_eq!(normalize("text-editor"), "text_editor");
        assert_eq!(normalize(" boop "), "boop");
    }
}
