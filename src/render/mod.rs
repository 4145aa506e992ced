//! Renderers for the three kinds of output pages.
//!
//! - [`pages`]: the paginated main index and one file per article.
//! - [`categories`]: a paginated index per non-empty category.
//! - [`singles`]: one page per free-form template.
//!
//! Every renderer fans out with rayon and returns only once all of its
//! workers have finished; the first error aborts the fan-out and is returned.
//!
//! ## Output layout
//!
//! ```text
//! export/
//! ├── index.html                         # main page 1
//! ├── page/{n}/index.html                # main page n ≥ 2
//! ├── articles/{id}.html
//! ├── articles/category/{id}/index.html
//! ├── articles/category/{id}/page/{n}/index.html
//! └── {relative path of each single template}
//! ```

pub mod categories;
pub mod pages;
pub mod singles;

use crate::progress::BuildProgress;
use crate::source::{ContentSource, FetchError, QueryPlan};
use crate::templates::TemplateError;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("id '{0}' cannot be used as a file name")]
    UnsafeId(String),
    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Everything a renderer needs besides its templates.
pub struct RenderEnv<'a, S: ContentSource> {
    pub source: &'a S,
    pub plan: &'a QueryPlan,
    pub export: &'a Path,
    pub progress: &'a BuildProgress,
}

/// `index.html` for the first page, `page/{n}/index.html` after that.
pub fn index_output_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        base.join("index.html")
    } else {
        base.join("page")
            .join((index + 1).to_string())
            .join("index.html")
    }
}

/// Ids become path components, so they must be a single plain segment.
pub fn ensure_safe_id(id: &str) -> Result<(), RenderError> {
    let unsafe_id = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.contains('\0');
    if unsafe_id {
        return Err(RenderError::UnsafeId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_is_index_html() {
        assert_eq!(
            index_output_path(Path::new("out"), 0),
            PathBuf::from("out/index.html")
        );
    }

    #[test]
    fn later_pages_are_numbered_from_two() {
        assert_eq!(
            index_output_path(Path::new("out/articles/category/go"), 1),
            PathBuf::from("out/articles/category/go/page/2/index.html")
        );
        assert_eq!(
            index_output_path(Path::new("out"), 9),
            PathBuf::from("out/page/10/index.html")
        );
    }

    #[test]
    fn safe_ids() {
        assert!(ensure_safe_id("hello-world_2").is_ok());
        assert!(ensure_safe_id("日本語").is_ok());
    }

    #[test]
    fn unsafe_ids() {
        for id in ["", ".", "..", "a/b", "..\\x", "nul\0"] {
            assert!(
                matches!(ensure_safe_id(id), Err(RenderError::UnsafeId(_))),
                "{id:?}"
            );
        }
    }
}
