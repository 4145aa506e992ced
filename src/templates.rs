//! Template sets.
//!
//! A [`TemplateSet`] is one primary template plus every shared component,
//! parsed together into a private `Tera` instance with the helper library
//! registered. Components are addressed by file name, so a template pulls
//! one in with `{% include "header.html" %}` or extends it with
//! `{% extends "base.html" %}`.
//!
//! Parsing is the verification step: a syntax error, an unknown parent
//! template, or a missing file fails here, before any output is written.
//! HTML autoescaping is off because item bodies are trusted HTML fragments.

use crate::helpers::Helpers;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to parse {}: {detail}", path.display())]
    Parse { path: PathBuf, detail: String },
    #[error("failed to render {name}: {detail}")]
    Render { name: String, detail: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One primary template and its components, ready to render.
pub struct TemplateSet {
    tera: Tera,
    name: String,
}

impl TemplateSet {
    /// Parse `primary` together with `components`.
    pub fn parse(primary: &Path, components: &[PathBuf], helpers: &Helpers) -> Result<Self, TemplateError> {
        if !primary.is_file() {
            return Err(TemplateError::Missing(primary.to_path_buf()));
        }
        let name = primary.display().to_string();

        let mut files: Vec<(PathBuf, Option<String>)> = components
            .iter()
            .map(|path| (path.clone(), Some(file_name(path))))
            .collect();
        files.push((primary.to_path_buf(), Some(name.clone())));

        let mut tera = Self::empty(helpers);
        tera.add_template_files(files)
            .map_err(|e| TemplateError::Parse {
                path: primary.to_path_buf(),
                detail: describe(&e),
            })?;
        Ok(Self { tera, name })
    }

    /// Build a set from an in-memory template with no components.
    pub fn from_source(name: &str, source: &str, helpers: &Helpers) -> Result<Self, TemplateError> {
        let mut tera = Self::empty(helpers);
        tera.add_raw_template(name, source)
            .map_err(|e| TemplateError::Parse {
                path: PathBuf::from(name),
                detail: describe(&e),
            })?;
        Ok(Self {
            tera,
            name: name.to_string(),
        })
    }

    fn empty(helpers: &Helpers) -> Tera {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        helpers.register(&mut tera);
        tera
    }

    pub fn render(&self, data: &impl Serialize) -> Result<String, TemplateError> {
        let context = Context::from_serialize(data).map_err(|e| self.render_error(&e))?;
        self.tera
            .render(&self.name, &context)
            .map_err(|e| self.render_error(&e))
    }

    /// Render and write to `output`, creating parent directories.
    pub fn render_to_file(&self, data: &impl Serialize, output: &Path) -> Result<(), TemplateError> {
        let rendered = self.render(data)?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, rendered)?;
        Ok(())
    }

    fn render_error(&self, err: &tera::Error) -> TemplateError {
        TemplateError::Render {
            name: self.name.clone(),
            detail: describe(err),
        }
    }
}

/// Every regular file directly inside `dir`, sorted by name.
pub fn component_files(dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Tera reports the interesting part of an error in its source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn helpers() -> Helpers {
        Helpers::new(chrono_tz::UTC, "https://images.microcms-assets.io/assets/")
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn renders_with_components() {
        let tmp = TempDir::new().unwrap();
        let header = write(tmp.path(), "components/header.html", "<h1>{{ title }}</h1>");
        let base = write(
            tmp.path(),
            "components/base.html",
            "<html>{% block content %}{% endblock %}</html>",
        );
        let page = write(
            tmp.path(),
            "blog/index.html",
            r#"{% extends "base.html" %}{% block content %}{% include "header.html" %}{% endblock %}"#,
        );

        let set = TemplateSet::parse(&page, &[base, header], &helpers()).unwrap();
        let out = set.render(&json!({"title": "Hi"})).unwrap();
        assert_eq!(out, "<html><h1>Hi</h1></html>");
    }

    #[test]
    fn html_is_not_escaped() {
        let set = TemplateSet::from_source("t", "{{ body }}", &helpers()).unwrap();
        let out = set.render(&json!({"body": "<p>a & b</p>"})).unwrap();
        assert_eq!(out, "<p>a & b</p>");
    }

    #[test]
    fn missing_primary_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = TemplateSet::parse(&tmp.path().join("nope.html"), &[], &helpers());
        assert!(matches!(result, Err(TemplateError::Missing(_))));
    }

    #[test]
    fn syntax_error_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let page = write(tmp.path(), "index.html", "{% for x in %}");
        let result = TemplateSet::parse(&page, &[], &helpers());
        assert!(matches!(result, Err(TemplateError::Parse { .. })));
    }

    #[test]
    fn unknown_parent_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let page = write(tmp.path(), "index.html", r#"{% extends "missing.html" %}"#);
        let result = TemplateSet::parse(&page, &[], &helpers());
        assert!(matches!(result, Err(TemplateError::Parse { .. })));
    }

    #[test]
    fn undefined_variable_is_render_error() {
        let set = TemplateSet::from_source("t", "{{ nope.deeper }}", &helpers()).unwrap();
        let result = set.render(&json!({}));
        assert!(matches!(result, Err(TemplateError::Render { name, .. }) if name == "t"));
    }

    #[test]
    fn render_to_file_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let set = TemplateSet::from_source("t", "ok", &helpers()).unwrap();
        let out = tmp.path().join("a/b/c/index.html");
        set.render_to_file(&json!({}), &out).unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), "ok");
    }

    #[test]
    fn component_files_lists_regular_files_sorted() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.html", "");
        write(tmp.path(), "a.html", "");
        fs::create_dir_all(tmp.path().join("nested")).unwrap();

        let files = component_files(tmp.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["a.html", "b.html"]);
    }
}
