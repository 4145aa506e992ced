//! Main index pages and article pages.
//!
//! Pages are processed strictly in order. For each page the listing is
//! fetched and its index file written, then every article on that page is
//! rendered in parallel; the next page starts only after all of them are on
//! disk.

use super::{RenderEnv, RenderError, ensure_safe_id, index_output_path};
use crate::pagination;
use crate::source::{ContentSource, list_as};
use crate::templates::TemplateSet;
use crate::types::{ContentPage, Item};
use rayon::prelude::*;
use tracing::debug;

/// Render all main pages and their articles.
///
/// `total` is the item count reported by the latest-items query. Returns the
/// number of main pages written.
pub fn render_main_pages<S: ContentSource>(
    env: &RenderEnv<S>,
    index: &TemplateSet,
    article: &TemplateSet,
    total: usize,
) -> Result<usize, RenderError> {
    let mut written = 0;
    for meta in pagination::pages(total, env.plan.page_size) {
        let response = list_as::<Item>(env.source, &env.plan.main_page(meta))?;
        let mut page = ContentPage::from_response(response);
        page.stamp(meta, total, "/", true, "");

        let path = index_output_path(env.export, meta.index());
        debug!(page = meta.current, items = page.contents.len(), "rendering main page");
        index.render_to_file(&page, &path)?;
        env.progress.main_page_rendered(meta.current, meta.all);
        written += 1;

        page.contents
            .par_iter()
            .try_for_each(|item| render_article(env, article, item, total))?;
    }
    Ok(written)
}

fn render_article<S: ContentSource>(
    env: &RenderEnv<S>,
    article: &TemplateSet,
    item: &Item,
    total: usize,
) -> Result<(), RenderError> {
    ensure_safe_id(&item.id)?;
    let path = env.export.join("articles").join(format!("{}.html", item.id));
    article.render_to_file(item, &path)?;
    env.progress.article_rendered(&item.id, total);
    Ok(())
}
