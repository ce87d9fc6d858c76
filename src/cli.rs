use clap::Parser;

use crate::config;

/// `-v` selects the catalog version ref, so clap's built-in version flag
/// stays off.
#[derive(Parser, Debug)]
#[command(
    name = "install",
    about = "Install Deno apps from the remote catalog",
    disable_version_flag = true
)]
pub struct Cli {
    /// Print debug output
    #[arg(long)]
    pub debug: bool,

    /// List installable apps and exit
    #[arg(short, long)]
    pub list: bool,

    /// Install for the current user instead of system-wide
    #[arg(short, long)]
    pub user: bool,

    /// Catalog version ref to install from
    #[arg(short = 'v', long = "version", value_name = "REF", default_value = config::DEFAULT_REF)]
    pub version: String,

    /// Apps to install
    #[arg(value_name = "APP")]
    pub apps: Vec<String>,
}
