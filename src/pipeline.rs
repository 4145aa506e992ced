//! The build pipeline.
//!
//! A build walks a fixed sequence of stages. Each stage starts only after the
//! previous one has fully finished, parallel fan-outs included:
//!
//! ```text
//! Init → TemplatesVerified → OutputRecreated → LatestFetched
//!      → MainPagesRendered → CategoriesFetched → CategoriesRendered
//!      → CategoriesFiltered → SnapshotsWritten → SinglesRendered → Done
//! ```
//!
//! Any error ends the build at once. The export directory is never touched
//! before the blog templates have parsed, so a broken template leaves the
//! previous output in place.
//!
//! On a first run with no resources directory the pipeline creates the empty
//! skeleton and stops; there is nothing to render yet.

use crate::assets::{self, AssetError};
use crate::config::{BuildSettings, ResolvedPaths};
use crate::helpers::Helpers;
use crate::progress::{BuildEvent, BuildProgress, BuildStage, BuildSummary};
use crate::render::categories::{prune, render_categories};
use crate::render::pages::render_main_pages;
use crate::render::singles::{self, SinglesData, render_singles};
use crate::render::{RenderEnv, RenderError};
use crate::snapshot::{self, SnapshotError};
use crate::source::{ContentSource, FetchError, list_as};
use crate::templates::{TemplateError, TemplateSet, component_files};
use crate::types::{Category, Item};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Built(BuildSummary),
    /// No resources directory existed; these directories were created.
    Scaffolded(Vec<PathBuf>),
}

/// The two blog templates plus the component list shared by every set.
pub struct BlogTemplates {
    pub index: TemplateSet,
    pub article: TemplateSet,
    pub components: Vec<PathBuf>,
}

impl BlogTemplates {
    pub fn load(paths: &ResolvedPaths, helpers: &Helpers) -> Result<Self, TemplateError> {
        let components = if paths.components.is_dir() {
            component_files(&paths.components)?
        } else {
            Vec::new()
        };
        let index = TemplateSet::parse(&paths.blog_templates.join("index.html"), &components, helpers)?;
        let article =
            TemplateSet::parse(&paths.blog_templates.join("article.html"), &components, helpers)?;
        Ok(Self {
            index,
            article,
            components,
        })
    }
}

/// Run a full build against `source`.
pub fn build(
    settings: &BuildSettings,
    source: &impl ContentSource,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildOutcome, BuildError> {
    let progress = BuildProgress::new(events);
    let paths = &settings.paths;
    progress.stage(BuildStage::Init);

    if !paths.resources.exists() {
        let created = assets::scaffold_resources(paths)?;
        progress.emit(BuildEvent::ResourcesScaffolded(paths.resources.clone()));
        return Ok(BuildOutcome::Scaffolded(created));
    }

    if assets::ensure_dir(&paths.components)? {
        progress.warn(format!(
            "components directory {} did not exist; created it",
            paths.components.display()
        ));
    }

    let helpers = Helpers::new(settings.timezone, &settings.webp_asset_prefix);
    let blog = BlogTemplates::load(paths, &helpers)?;
    progress.stage(BuildStage::TemplatesVerified);

    assets::guard_export(paths)?;
    assets::recreate_dir(&paths.export)?;
    assets::ensure_dir(&paths.export.join("articles").join("category"))?;
    let copied = assets::copy_static(&paths.static_assets, &paths.export)?;
    debug!(copied, "static assets copied");
    progress.stage(BuildStage::OutputRecreated);

    let plan = settings.query_plan();
    let latest = list_as::<Item>(source, &plan.latest())?;
    info!(total = latest.total_count, "items available");
    progress.stage(BuildStage::LatestFetched);

    let env = RenderEnv {
        source,
        plan: &plan,
        export: &paths.export,
        progress: &progress,
    };

    let main_pages = render_main_pages(&env, &blog.index, &blog.article, latest.total_count)?;
    progress.stage(BuildStage::MainPagesRendered);

    let categories = list_as::<Category>(source, &plan.categories())?.contents;
    progress.stage(BuildStage::CategoriesFetched);

    let run = render_categories(&env, &blog.index, &categories, &settings.category_tag_name)?;
    progress.stage(BuildStage::CategoriesRendered);

    let kept = prune(&categories, &run.empty);
    let pruned: Vec<String> = categories
        .iter()
        .filter(|c| run.empty.contains(&c.id))
        .map(|c| c.id.clone())
        .collect();
    progress.stage(BuildStage::CategoriesFiltered);

    let latest_path = snapshot::write_latest(&paths.export, &latest.contents)?;
    progress.emit(BuildEvent::SnapshotWritten(latest_path));
    let category_path = snapshot::write_categories(&paths.export, &kept)?;
    progress.emit(BuildEvent::SnapshotWritten(category_path));
    progress.stage(BuildStage::SnapshotsWritten);

    let data = SinglesData {
        latest: &latest.contents,
        categories: &kept,
    };
    let singles = render_singles(
        &env,
        &paths.singles_templates,
        &blog.components,
        &helpers,
        &data,
    )?;
    progress.stage(BuildStage::SinglesRendered);

    let summary = BuildSummary {
        main_pages,
        articles: progress.articles_done(),
        categories_rendered: run.rendered,
        categories_pruned: pruned,
        singles,
    };
    progress.emit(BuildEvent::Done(summary.clone()));
    Ok(BuildOutcome::Built(summary))
}

/// What `check` found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub components: usize,
    pub singles: Vec<PathBuf>,
}

/// Parse every template a build would use, without fetching or writing.
pub fn check(settings: &BuildSettings) -> Result<CheckReport, BuildError> {
    let paths = &settings.paths;
    let helpers = Helpers::new(settings.timezone, &settings.webp_asset_prefix);
    let blog = BlogTemplates::load(paths, &helpers)?;

    let found = singles::discover(&paths.singles_templates)?;
    for single in &found {
        TemplateSet::parse(&single.path, &blog.components, &helpers)?;
    }

    Ok(CheckReport {
        components: blog.components.len(),
        singles: found.into_iter().map(|s| s.relative).collect(),
    })
}
