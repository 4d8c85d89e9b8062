use std::path::{Path, PathBuf};

/// Directory holding `settings.json`, the asset list and the toast log.
pub fn app_config_dir() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("AssetOverlay"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolve `relative` against the directory of `settings_path`.
/// Absolute paths are returned unchanged.
pub fn resolve_config_path(settings_path: &Path, relative: &str) -> PathBuf {
    let relative = Path::new(relative);
    if relative.is_absolute() {
        return relative.to_path_buf();
    }
    let base_dir = settings_path.parent().unwrap_or_else(|| Path::new("."));
    base_dir.join(relative)
}

#[cfg(test)]
mod tests {
    use super::resolve_config_path;
    use std::path::Path;

    #[test]
    fn resolves_path_relative_to_settings_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings_path = dir.path().join("settings.json");
        let resolved = resolve_config_path(&settings_path, "data/assets_config.json");
        assert_eq!(
            resolved,
            dir.path().join(Path::new("data").join("assets_config.json"))
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        let dir = tempfile::tempdir().expect("tempdir");
        let absolute = dir.path().join("elsewhere.json");
        let resolved = resolve_config_path(
            Path::new("settings.json"),
            absolute.to_str().expect("utf-8 temp path"),
        );
        assert_eq!(resolved, absolute);
    }
}
