//! Free-form single pages.
//!
//! Every `*.html` file under the singles directory is its own template set
//! (the file plus all components) rendered once into the export directory at
//! the same relative path. All singles get the same data: the latest items
//! and the pruned category list.

use super::{RenderEnv, RenderError};
use crate::helpers::Helpers;
use crate::source::ContentSource;
use crate::templates::TemplateSet;
use crate::types::{Category, Item};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Serialize)]
pub struct SinglesData<'a> {
    pub latest: &'a [Item],
    pub categories: &'a [Category],
}

/// A discovered single template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleTemplate {
    pub path: PathBuf,
    pub relative: PathBuf,
}

/// Every `*.html` file under `root`, sorted. A missing `root` has none.
pub fn discover(root: &Path) -> Result<Vec<SingleTemplate>, RenderError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| RenderError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let is_html = entry.path().extension().is_some_and(|ext| ext == "html");
        if !entry.file_type().is_file() || !is_html {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            found.push(SingleTemplate {
                path: entry.path().to_path_buf(),
                relative: relative.to_path_buf(),
            });
        }
    }
    Ok(found)
}

/// Render every single template under `root`. Returns how many were written.
pub fn render_singles<S: ContentSource>(
    env: &RenderEnv<S>,
    root: &Path,
    components: &[PathBuf],
    helpers: &Helpers,
    data: &SinglesData,
) -> Result<usize, RenderError> {
    let templates = discover(root)?;
    let total = templates.len();

    templates.par_iter().try_for_each(|single| {
        let set = TemplateSet::parse(&single.path, components, helpers)?;
        set.render_to_file(data, &env.export.join(&single.relative))?;
        env.progress
            .single_rendered(&single.relative.display().to_string(), total);
        Ok::<(), RenderError>(())
    })?;

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::BuildProgress;
    use crate::templates::TemplateError;
    use crate::test_helpers::{MockSource, category, item, plan};
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn render(root: &Path, components: &[PathBuf], export: &Path) -> Result<usize, RenderError> {
        let source = MockSource::new(vec![], vec![]);
        let progress = BuildProgress::new(None);
        let plan = plan(10);
        let env = RenderEnv {
            source: &source,
            plan: &plan,
            export,
            progress: &progress,
        };
        let latest = vec![item("newest", &["rust"])];
        let categories = vec![category("rust", "Rust")];
        let data = SinglesData {
            latest: &latest,
            categories: &categories,
        };
        render_singles(&env, root, components, &Helpers::new(chrono_tz::UTC, ""), &data)
    }

    #[test]
    fn discovers_html_recursively() {
        let tmp = TempDir::new().unwrap();
        write(&tmp.path().join("about.html"), "");
        write(&tmp.path().join("nested/deep/info.html"), "");
        write(&tmp.path().join("notes.txt"), "");

        let found = discover(tmp.path()).unwrap();
        let relative: Vec<PathBuf> = found.into_iter().map(|s| s.relative).collect();
        assert_eq!(
            relative,
            vec![PathBuf::from("about.html"), PathBuf::from("nested/deep/info.html")]
        );
    }

    #[test]
    fn missing_root_has_no_singles() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(&tmp.path().join("none")).unwrap().is_empty());
    }

    #[test]
    fn renders_at_relative_paths_with_shared_data() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("singles");
        let footer = tmp.path().join("components/footer.html");
        write(&footer, "<footer>f</footer>");
        write(
            &root.join("about.html"),
            r#"{% for i in latest %}{{ i.id }}{% endfor %}{% include "footer.html" %}"#,
        );
        write(
            &root.join("nested/info.html"),
            "{% for c in categories %}{{ c.name }}{% endfor %}",
        );

        let export = tmp.path().join("out");
        let count = render(&root, &[footer], &export).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(export.join("about.html")).unwrap(),
            "newest<footer>f</footer>"
        );
        assert_eq!(fs::read_to_string(export.join("nested/info.html")).unwrap(), "Rust");
    }

    #[test]
    fn broken_single_aborts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("singles");
        write(&root.join("ok.html"), "fine");
        write(&root.join("bad.html"), "{% if %}");

        let result = render(&root, &[], &tmp.path().join("out"));
        assert!(matches!(
            result,
            Err(RenderError::Template(TemplateError::Parse { .. }))
        ));
    }
}
