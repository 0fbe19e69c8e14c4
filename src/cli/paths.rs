//! Root and configuration path resolution

use std::env;
use std::path::{Path, PathBuf};

use tonebench_core::config::CONFIG_FILE;

/// Resolve the working root: explicit `--root`, else the current directory,
/// or "." if that cannot be determined.
pub fn resolve_root_path(root: Option<PathBuf>) -> PathBuf {
    root.unwrap_or_else(|| env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Locate the config file and the base directory its relative paths use.
///
/// An explicit `--root` always wins as the base. Otherwise relative paths
/// resolve against the directory holding the config file.
pub fn resolve_config(
    config: Option<&Path>,
    root: Option<&Path>,
    cwd: &Path,
) -> (PathBuf, PathBuf) {
    let fallback_root = root.unwrap_or(cwd);
    let config_path = match config {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => fallback_root.join(CONFIG_FILE),
    };

    let base = match root {
        Some(root) => root.to_path_buf(),
        None => config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf()),
    };

    (config_path, base)
}
