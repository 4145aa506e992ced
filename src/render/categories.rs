//! Category listings.
//!
//! Categories are rendered in parallel. Each worker first probes the
//! category's item count with an id-only query; an empty category is
//! recorded and skipped, anything else gets a paginated index under
//! `articles/category/{id}/`. Pages within one category are sequential.

use super::{RenderEnv, RenderError, ensure_safe_id, index_output_path};
use crate::pagination;
use crate::progress::EmptyCategories;
use crate::source::{ContentSource, list_as};
use crate::templates::TemplateSet;
use crate::types::{Category, ContentPage, Item};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Outcome of rendering every category.
#[derive(Debug, Default)]
pub struct CategoryRun {
    pub rendered: usize,
    /// Ids whose probe returned zero items.
    pub empty: HashSet<String>,
}

/// Render one listing per category. `label` prefixes each listing's
/// `archiveName` (`"{label}: {name}"`).
pub fn render_categories<S: ContentSource>(
    env: &RenderEnv<S>,
    index: &TemplateSet,
    categories: &[Category],
    label: &str,
) -> Result<CategoryRun, RenderError> {
    let empty = EmptyCategories::default();
    let total = categories.len();

    categories
        .par_iter()
        .try_for_each(|category| render_category(env, index, category, label, total, &empty))?;

    let empty = empty.into_set();
    Ok(CategoryRun {
        rendered: total - empty.len(),
        empty,
    })
}

fn render_category<S: ContentSource>(
    env: &RenderEnv<S>,
    index: &TemplateSet,
    category: &Category,
    label: &str,
    total: usize,
    empty: &EmptyCategories,
) -> Result<(), RenderError> {
    ensure_safe_id(&category.id)?;

    let count = env
        .source
        .list(&env.plan.category_probe(&category.id))?
        .total_count;
    if count == 0 {
        empty.record(&category.id);
        env.progress.category_skipped(&category.id, total);
        return Ok(());
    }

    let base = env.export.join("articles").join("category").join(&category.id);
    let root = format!("/articles/category/{}/", category.id);
    let archive_name = format!("{label}: {}", category.name);

    let mut pages = 0;
    for meta in pagination::pages(count, env.plan.page_size) {
        let query = env.plan.category_page(&category.id, meta);
        let mut page = ContentPage::from_response(list_as::<Item>(env.source, &query)?);
        page.stamp(meta, count, &root, false, &archive_name);
        index.render_to_file(&page, &index_output_path(&base, meta.index()))?;
        pages += 1;
    }

    debug!(category = %category.id, items = count, pages, "category rendered");
    env.progress.category_rendered(&category.id, pages, total);
    Ok(())
}

/// Categories not in `empty`, original order preserved.
pub fn prune(categories: &[Category], empty: &HashSet<String>) -> Vec<Category> {
    categories
        .iter()
        .filter(|c| !empty.contains(&c.id))
        .cloned()
        .collect()
}
