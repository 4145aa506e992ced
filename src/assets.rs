//! Filesystem chores around a build: recreating the export directory,
//! copying static assets, and scaffolding an empty resources tree.

use crate::config::ResolvedPaths;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("refusing to clear {}: it contains {}", export.display(), input.display())]
    ExportContainsInput { export: PathBuf, input: PathBuf },
}

/// Delete `dir` if present and create it empty.
pub fn recreate_dir(dir: &Path) -> Result<(), AssetError> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Refuse to clear an export directory that holds any build input.
pub fn guard_export(paths: &ResolvedPaths) -> Result<(), AssetError> {
    let export = absolute(&paths.export);
    for input in [
        &paths.resources,
        &paths.templates,
        &paths.blog_templates,
        &paths.singles_templates,
        &paths.components,
        &paths.static_assets,
    ] {
        if absolute(input).starts_with(&export) {
            return Err(AssetError::ExportContainsInput {
                export: paths.export.clone(),
                input: input.clone(),
            });
        }
    }
    Ok(())
}

/// Absolute form of `path` with `.` and `..` folded away lexically.
fn absolute(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Copy every file under `src` into `dst`, keeping relative paths.
///
/// A missing `src` copies nothing. Returns the number of files copied.
pub fn copy_static(src: &Path, dst: &Path) -> Result<usize, AssetError> {
    if !src.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Create the empty resources skeleton. Returns the directories created.
pub fn scaffold_resources(paths: &ResolvedPaths) -> Result<Vec<PathBuf>, AssetError> {
    let mut created = Vec::new();
    for dir in [
        &paths.static_assets,
        &paths.blog_templates,
        &paths.singles_templates,
        &paths.components,
    ] {
        if ensure_dir(dir)? {
            created.push(dir.clone());
        }
    }
    Ok(created)
}

/// Create `dir` if missing. Returns whether it had to be created.
pub fn ensure_dir(dir: &Path) -> Result<bool, AssetError> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use tempfile::TempDir;

    fn paths_in(root: &Path) -> ResolvedPaths {
        PathsConfig {
            resources: root.join("resources"),
            export: root.join("output"),
            ..PathsConfig::default()
        }
        .resolve()
    }

    #[test]
    fn recreate_dir_empties_existing() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        fs::create_dir_all(dir.join("stale")).unwrap();
        fs::write(dir.join("stale/old.html"), "old").unwrap();

        recreate_dir(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn copy_static_preserves_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("static");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::write(src.join("robots.txt"), "User-agent: *").unwrap();
        fs::write(src.join("css/site.css"), "body{}").unwrap();

        let dst = tmp.path().join("out");
        let copied = copy_static(&src, &dst).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("css/site.css")).unwrap(), "body{}");
        assert!(dst.join("robots.txt").exists());
    }

    #[test]
    fn copy_static_missing_source_is_noop() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(copy_static(&tmp.path().join("nope"), tmp.path()).unwrap(), 0);
    }

    #[test]
    fn scaffold_creates_skeleton_once() {
        let tmp = TempDir::new().unwrap();
        let paths = paths_in(tmp.path());

        let created = scaffold_resources(&paths).unwrap();
        assert_eq!(created.len(), 4);
        assert!(paths.blog_templates.is_dir());
        assert!(paths.singles_templates.is_dir());
        assert!(paths.components.is_dir());
        assert!(paths.static_assets.is_dir());

        assert!(scaffold_resources(&paths).unwrap().is_empty());
    }

    #[test]
    fn guard_accepts_separate_dirs() {
        let tmp = TempDir::new().unwrap();
        assert!(guard_export(&paths_in(tmp.path())).is_ok());
    }

    #[test]
    fn guard_rejects_export_over_resources() {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig {
            resources: tmp.path().join("site/resources"),
            export: tmp.path().join("site"),
            ..PathsConfig::default()
        }
        .resolve();
        assert!(matches!(
            guard_export(&paths),
            Err(AssetError::ExportContainsInput { .. })
        ));
    }

    #[test]
    fn guard_sees_through_parent_components() {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig {
            resources: tmp.path().join("site/resources"),
            export: tmp.path().join("site/x/.."),
            ..PathsConfig::default()
        }
        .resolve();
        assert!(matches!(
            guard_export(&paths),
            Err(AssetError::ExportContainsInput { .. })
        ));
    }

    #[test]
    fn guard_accepts_sibling_reached_through_parent() {
        let tmp = TempDir::new().unwrap();
        let paths = PathsConfig {
            resources: tmp.path().join("site/resources"),
            export: tmp.path().join("site/resources/../output"),
            ..PathsConfig::default()
        }
        .resolve();
        assert!(guard_export(&paths).is_ok());
    }
}
