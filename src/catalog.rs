use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config;
use crate::error::InstallError;
use crate::fetch::Transport;
use crate::jqtool;
use crate::platform::Os;

#[derive(Debug, Deserialize)]
struct TreePayload {
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Installable app identifiers for a version ref, sorted and deduplicated.
/// The hosting API promises no ordering; sorting here keeps reporting
/// deterministic.
pub fn list_apps(os: Os, transport: &dyn Transport, git_ref: &str) -> Result<Vec<String>> {
    let url = config::tree_url(git_ref);
    let payload = transport
        .get(&url)
        .map_err(|err| InstallError::CatalogUnavailable(format!("{err:#}")))?;

    let paths = match decode_blob_paths(&payload) {
        Ok(paths) => paths,
        Err(decode_err) => {
            // Degraded path: give an external jq one try at the payload
            // before declaring the catalog unreadable.
            log::debug!("native tree decode failed: {decode_err:#}");
            jqtool::ensure(os, transport)
                .and_then(|tool| jqtool::blob_paths(&tool, &payload))
                .map_err(|_| {
                    InstallError::CatalogUnavailable(format!("ref {git_ref}: {decode_err:#}"))
                })?
        }
    };
    Ok(apps_from_paths(paths))
}

fn decode_blob_paths(payload: &[u8]) -> Result<Vec<String>> {
    let tree: TreePayload =
        serde_json::from_slice(payload).context("decode tree payload")?;
    Ok(tree
        .tree
        .into_iter()
        .filter(|entry| entry.kind == "blob")
        .map(|entry| entry.path)
        .collect())
}

/// An app is exactly one `src/<name>/index.ts` blob; `<name>` is a single
/// path segment.
pub fn apps_from_paths(paths: impl IntoIterator<Item = String>) -> Vec<String> {
    let suffix = format!("/{}", config::BACKEND_FILE);
    let mut apps: Vec<String> = paths
        .into_iter()
        .filter_map(|path| {
            let rest = path.strip_prefix(config::SOURCE_PREFIX)?;
            let name = rest.strip_suffix(suffix.as_str())?;
            (!name.is_empty() && !name.contains('/')).then(|| name.to_string())
        })
        .collect();
    apps.sort();
    apps.dedup();
    apps
}
