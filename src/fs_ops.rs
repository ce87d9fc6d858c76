use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

fn retry<F>(mut op: F, attempts: usize) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let mut delay = Duration::from_millis(200);
    for i in 0..attempts {
        match op() {
            Ok(()) => return Ok(()),
            Err(err) => {
                if i + 1 == attempts {
                    return Err(err);
                }
            }
        }
        std::thread::sleep(delay);
        delay = std::cmp::min(delay * 2, Duration::from_secs(2));
    }
    Ok(())
}

fn temp_path_for(dest: &Path) -> Result<PathBuf> {
    let parent = dest.parent().context("dest has no parent")?;
    let name = dest
        .file_name()
        .context("dest has no filename")?
        .to_string_lossy();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(Duration::from_millis(0))
        .as_nanos();
    Ok(parent.join(format!("{name}.tmp-{nonce}")))
}

fn write_bytes_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path_for(dest)?;
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    if dest.exists() {
        fs::remove_file(dest)
            .with_context(|| format!("remove {}", dest.display()))?;
    }
    fs::rename(&tmp, dest)
        .with_context(|| format!("rename {} -> {}", tmp.display(), dest.display()))?;
    Ok(())
}

pub fn write_bytes_with_retry(dest: &Path, bytes: &[u8], attempts: usize) -> Result<()> {
    retry(|| write_bytes_atomic(dest, bytes), attempts)
}

/// Sets the Unix permission bits; a no-op on Windows where the executable
/// bit does not exist.
pub fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("chmod {:o} {}", mode, path.display()))?;
    }
    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
    Ok(())
}

/// First directory entry on `PATH` containing an executable of this name.
pub fn find_on_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    find_in_dirs(std::env::split_paths(&path), name)
}

pub fn find_in_dirs(dirs: impl IntoIterator<Item = PathBuf>, name: &str) -> Option<PathBuf> {
    for dir in dirs {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Serializes tests that rewrite process environment variables; every test
/// touching the environment must go through this one lock.
#[cfg(test)]
pub mod testenv {
    use std::sync::Mutex;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    pub fn with_env(pairs: &[(&str, &str)], f: impl FnOnce()) {
        let _guard = ENV_MUTEX.lock().unwrap();
        let prior: Vec<(String, Option<String>)> = pairs
            .iter()
            .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
            .collect();
        for (key, value) in pairs {
            std::env::set_var(key, value);
        }
        f();
        for (key, value) in prior {
            match value {
                Some(value) => std::env::set_var(&key, value),
                None => std::env::remove_var(&key),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_bytes_with_retry_writes_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.bin");
        write_bytes_with_retry(&dest, b"payload", 3).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn write_bytes_with_retry_overwrites_in_place() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("out.bin");
        write_bytes_with_retry(&dest, b"first", 3).unwrap();
        write_bytes_with_retry(&dest, b"second", 3).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"second");
        // no stray temp files left behind
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn set_mode_applies_executable_bit() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("run.sh");
        fs::write(&dest, "#!/bin/sh\n").unwrap();
        set_mode(&dest, 0o755).unwrap();
        let mode = fs::metadata(&dest).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn find_in_dirs_returns_first_hit() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        fs::write(b.path().join("tool"), "x").unwrap();
        let found = find_in_dirs(
            vec![a.path().to_path_buf(), b.path().to_path_buf()],
            "tool",
        )
        .unwrap();
        assert_eq!(found, b.path().join("tool"));
    }

    #[test]
    fn find_in_dirs_misses_directories() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("tool")).unwrap();
        assert!(find_in_dirs(vec![tmp.path().to_path_buf()], "tool").is_none());
    }
}
