//! # cmsgen
//!
//! A static site generator for a headless-CMS blog. Articles and categories
//! are pulled from a paginated list API and rendered through user-supplied
//! Tera templates into a directory of plain HTML plus two JSON snapshots.
//! Every build recreates the output directory from scratch.
//!
//! # Pipeline
//!
//! ```text
//! resources/templates ─┐
//!                      ├─▶ verify templates ─▶ recreate output/ ─▶ copy static/
//! CMS list API ────────┘
//!
//!   latest items ─▶ main pages ─▶ articles          (page by page)
//!   categories   ─▶ category listings               (in parallel)
//!                ─▶ prune empty categories
//!   snapshots    ─▶ latest.json, category.json
//!   singles      ─▶ one page per free-form template (in parallel)
//! ```
//!
//! Each step finishes, parallel workers included, before the next begins.
//! The first error of any kind aborts the build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Stage sequencing, first-run scaffolding, `check` |
//! | [`source`] | `ContentSource` trait, HTTP client, the exact queries a build issues |
//! | [`render`] | Main page, article, category, and single page renderers |
//! | [`templates`] | Template sets: one primary template plus shared components |
//! | [`helpers`] | Filters and functions available to every template |
//! | [`pagination`] | Page counts, page metadata, paginator windows |
//! | [`snapshot`] | `latest.json` and `category.json` |
//! | [`assets`] | Output directory reset, static copy, resource skeleton |
//! | [`progress`] | Build stages, progress events, shared counters |
//! | [`config`] | Layered `cmsgen.toml` + environment configuration |
//! | [`types`] | Items, categories, list envelopes, page contexts |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Runtime Templates
//!
//! Site authors own the markup, so templates are read from disk at build time
//! with [Tera](https://keats.github.io/tera/). Autoescaping is off: item
//! bodies are HTML fragments from the CMS and are rendered verbatim.
//!
//! ## One Fetch, One Render
//!
//! A listing page is fetched, stamped with its navigation metadata, rendered,
//! and dropped. Nothing is cached between pages, so memory stays flat no
//! matter how many articles the CMS holds.
//!
//! ## Pruning After Rendering
//!
//! Empty categories are discovered while rendering and only then removed from
//! the category list. `category.json` and the single pages get the pruned
//! list; an item's own `category` field is left as the CMS returned it.

pub mod assets;
pub mod config;
pub mod helpers;
pub mod output;
pub mod pagination;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod snapshot;
pub mod source;
pub mod templates;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
