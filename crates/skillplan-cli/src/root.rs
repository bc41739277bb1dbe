use skillplan_core::paths::STORE_DIR;
use std::path::{Path, PathBuf};

/// Resolve the store root: an explicit `--root`/`SKILLPLAN_ROOT` wins,
/// otherwise the nearest ancestor holding a `.skillplan/` store, otherwise
/// the nearest git checkout, otherwise the current directory as-is.
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    nearest_with(&cwd, STORE_DIR)
        .or_else(|| nearest_with(&cwd, ".git"))
        .unwrap_or(cwd)
}

fn nearest_with(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
