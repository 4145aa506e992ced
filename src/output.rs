//! CLI output formatting.
//!
//! Pure `format_*` functions turn build events and reports into lines of
//! text; the `print_*` wrappers write them to stdout. Keeping formatting
//! pure lets the output be tested without capturing stdout.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! ==> Templates verified
//! ==> Output directory recreated
//! ==> Fetched latest articles
//! Main page 1 / 3
//!     001 / 023 hello-world
//!     002 / 023 second-post
//! Main page 2 / 3
//!     ...
//! ==> Main pages rendered
//! ==> Fetched categories
//! Category 1 / 3 rust (2 pages)
//! Category 2 / 3 empty: no articles, skipped
//! ==> Category pages rendered
//! ==> Empty categories pruned
//! Snapshot latest.json
//! Snapshot category.json
//! ==> Snapshots written
//! Single 1 / 2 about.html
//! ==> Single pages rendered
//! ==> Build complete: 3 main pages, 23 articles, 2 categories (1 pruned), 2 singles
//! ```
//!
//! Counters in the indented lines reflect completion order, not item order:
//! articles and categories finish in parallel.

use crate::pipeline::CheckReport;
use crate::progress::{BuildEvent, BuildSummary};
use std::path::Path;

/// Zero-padded `n / total` with the width of `total`.
fn counter(done: usize, total: usize) -> String {
    let width = total.to_string().len().max(3);
    format!("{done:0width$} / {total:0width$}")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Build events
// ============================================================================

pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Stage(stage) => vec![format!("==> {}", stage.label())],
        BuildEvent::Warning(message) => vec![format!("Warning: {message}")],
        BuildEvent::ResourcesScaffolded(path) => vec![
            format!("==> Created empty resources directory {}", path.display()),
            "    Add templates/blog/index.html and templates/blog/article.html, then build again."
                .to_string(),
        ],
        BuildEvent::MainPageRendered { page, total } => {
            vec![format!("Main page {page} / {total}")]
        }
        BuildEvent::ArticleRendered { id, done, total } => {
            vec![format!("    {} {id}", counter(*done, *total))]
        }
        BuildEvent::CategoryRendered {
            id,
            pages,
            done,
            total,
        } => {
            let unit = if *pages == 1 { "page" } else { "pages" };
            vec![format!("Category {done} / {total} {id} ({pages} {unit})")]
        }
        BuildEvent::CategorySkipped { id, done, total } => {
            vec![format!("Category {done} / {total} {id}: no articles, skipped")]
        }
        BuildEvent::SingleRendered { path, done, total } => {
            vec![format!("Single {done} / {total} {path}")]
        }
        BuildEvent::SnapshotWritten(path) => vec![format!("Snapshot {}", file_name(path))],
        BuildEvent::Done(summary) => vec![format_summary(summary)],
    }
}

pub fn format_summary(summary: &BuildSummary) -> String {
    format!(
        "==> Build complete: {} main pages, {} articles, {} categories ({} pruned), {} singles",
        summary.main_pages,
        summary.articles,
        summary.categories_rendered,
        summary.categories_pruned.len(),
        summary.singles,
    )
}

pub fn print_build_event(event: &BuildEvent) {
    for line in format_build_event(event) {
        println!("{line}");
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport, blog_templates: &Path) -> Vec<String> {
    let mut lines = vec![
        "Blog templates".to_string(),
        format!("    {}", blog_templates.join("index.html").display()),
        format!("    {}", blog_templates.join("article.html").display()),
        format!("Components: {}", report.components),
        format!("Singles: {}", report.singles.len()),
    ];
    for single in &report.singles {
        lines.push(format!("    {}", single.display()));
    }
    lines
}

pub fn print_check_report(report: &CheckReport, blog_templates: &Path) {
    for line in format_check_report(report, blog_templates) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::BuildStage;
    use std::path::PathBuf;

    #[test]
    fn counter_pads_to_three() {
        assert_eq!(counter(7, 23), "007 / 023");
    }

    #[test]
    fn counter_widens_for_large_totals() {
        assert_eq!(counter(42, 12000), "00042 / 12000");
    }

    #[test]
    fn stage_line() {
        assert_eq!(
            format_build_event(&BuildEvent::Stage(BuildStage::TemplatesVerified)),
            vec!["==> Templates verified"]
        );
    }

    #[test]
    fn article_line_is_indented() {
        let lines = format_build_event(&BuildEvent::ArticleRendered {
            id: "hello".into(),
            done: 2,
            total: 10,
        });
        assert_eq!(lines, vec!["    002 / 010 hello"]);
    }

    #[test]
    fn category_lines() {
        let one = format_build_event(&BuildEvent::CategoryRendered {
            id: "go".into(),
            pages: 1,
            done: 1,
            total: 3,
        });
        assert_eq!(one, vec!["Category 1 / 3 go (1 page)"]);

        let skipped = format_build_event(&BuildEvent::CategorySkipped {
            id: "empty".into(),
            done: 2,
            total: 3,
        });
        assert_eq!(skipped, vec!["Category 2 / 3 empty: no articles, skipped"]);
    }

    #[test]
    fn snapshot_line_shows_file_name() {
        let lines = format_build_event(&BuildEvent::SnapshotWritten(PathBuf::from(
            "/tmp/out/latest.json",
        )));
        assert_eq!(lines, vec!["Snapshot latest.json"]);
    }

    #[test]
    fn scaffold_has_hint() {
        let lines = format_build_event(&BuildEvent::ResourcesScaffolded(PathBuf::from("resources")));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("resources"));
    }

    #[test]
    fn done_line_summarizes() {
        let summary = BuildSummary {
            main_pages: 3,
            articles: 23,
            categories_rendered: 2,
            categories_pruned: vec!["empty".into()],
            singles: 2,
        };
        assert_eq!(
            format_build_event(&BuildEvent::Done(summary)),
            vec!["==> Build complete: 3 main pages, 23 articles, 2 categories (1 pruned), 2 singles"]
        );
    }

    #[test]
    fn check_report_lists_singles() {
        let report = CheckReport {
            components: 3,
            singles: vec![PathBuf::from("about.html"), PathBuf::from("nested/info.html")],
        };
        let lines = format_check_report(&report, Path::new("res/templates/blog"));
        assert_eq!(lines[0], "Blog templates");
        assert_eq!(lines[3], "Components: 3");
        assert_eq!(lines[4], "Singles: 2");
        assert_eq!(lines[6], "    nested/info.html");
    }
}
