//! Remote catalog conventions and release download locations.

/// Repository holding the app catalog, as `owner/name`.
pub const CATALOG_REPO: &str = "denoapps/deno_apps";

/// Version ref used when none is given on the command line.
pub const DEFAULT_REF: &str = "master";

/// Every installable app lives at `src/<name>/index.ts` in the catalog.
pub const SOURCE_PREFIX: &str = "src/";
pub const BACKEND_FILE: &str = "index.ts";
pub const FRONTEND_FILE: &str = "index.html";

/// Shared icon artifacts, one per OS icon format.
pub const ICON_DIR: &str = "assets";

pub const RUNTIME_RELEASE_BASE: &str =
    "https://github.com/denoland/deno/releases/latest/download";
pub const JQ_RELEASE_BASE: &str =
    "https://github.com/jqlang/jq/releases/latest/download";

/// Reverse-domain prefix for macOS bundle identifiers.
pub const BUNDLE_ID_PREFIX: &str = "com.denoapps.";

pub const USER_AGENT: &str = concat!("deno-apps-installer/", env!("CARGO_PKG_VERSION"));
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Environment variable that silences informational output when non-empty.
pub const NOLOG_ENV: &str = "DENO_APPS_NOLOG";

pub fn tree_url(git_ref: &str) -> String {
    format!("https://api.github.com/repos/{CATALOG_REPO}/git/trees/{git_ref}?recursive=1")
}

pub fn raw_url(git_ref: &str, path: &str) -> String {
    format!("https://raw.githubusercontent.com/{CATALOG_REPO}/{git_ref}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_url_embeds_ref() {
        let url = tree_url("v1.2");
        assert!(url.contains("/git/trees/v1.2?recursive=1"));
        assert!(url.contains(CATALOG_REPO));
    }

    #[test]
    fn raw_url_joins_ref_and_path() {
        let url = raw_url("master", "src/boop/index.ts");
        assert!(url.ends_with("/master/src/boop/index.ts"));
    }
}
