//! Build progress: stages, events, and the counters shared by render workers.
//!
//! Workers never print. They bump a counter in [`BuildProgress`] and the
//! resulting [`BuildEvent`] is sent over an optional channel; the binary
//! formats and prints events on its own thread (see [`crate::output`]).
//! Each counter is incremented and its event sent under the same lock, so
//! the `done` numbers of one kind arrive in order.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};

/// Pipeline states, in the order a successful build passes through them.
/// The final state is reported as [`BuildEvent::Done`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Init,
    TemplatesVerified,
    OutputRecreated,
    LatestFetched,
    MainPagesRendered,
    CategoriesFetched,
    CategoriesRendered,
    CategoriesFiltered,
    SnapshotsWritten,
    SinglesRendered,
}

impl BuildStage {
    pub fn label(self) -> &'static str {
        match self {
            BuildStage::Init => "Starting build",
            BuildStage::TemplatesVerified => "Templates verified",
            BuildStage::OutputRecreated => "Output directory recreated",
            BuildStage::LatestFetched => "Fetched latest articles",
            BuildStage::MainPagesRendered => "Main pages rendered",
            BuildStage::CategoriesFetched => "Fetched categories",
            BuildStage::CategoriesRendered => "Category pages rendered",
            BuildStage::CategoriesFiltered => "Empty categories pruned",
            BuildStage::SnapshotsWritten => "Snapshots written",
            BuildStage::SinglesRendered => "Single pages rendered",
        }
    }
}

/// Final tallies of a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub main_pages: usize,
    pub articles: usize,
    pub categories_rendered: usize,
    /// Ids of categories with no items, in category-list order.
    pub categories_pruned: Vec<String>,
    pub singles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Stage(BuildStage),
    Warning(String),
    ResourcesScaffolded(PathBuf),
    MainPageRendered {
        page: usize,
        total: usize,
    },
    ArticleRendered {
        id: String,
        done: usize,
        total: usize,
    },
    CategoryRendered {
        id: String,
        pages: usize,
        done: usize,
        total: usize,
    },
    CategorySkipped {
        id: String,
        done: usize,
        total: usize,
    },
    SingleRendered {
        path: String,
        done: usize,
        total: usize,
    },
    SnapshotWritten(PathBuf),
    Done(BuildSummary),
}

/// Counters and event sink shared by every worker of one build.
#[derive(Default)]
pub struct BuildProgress {
    articles: Mutex<usize>,
    categories: Mutex<usize>,
    singles: Mutex<usize>,
    events: Option<Sender<BuildEvent>>,
}

impl BuildProgress {
    pub fn new(events: Option<Sender<BuildEvent>>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    pub fn emit(&self, event: BuildEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }

    pub fn stage(&self, stage: BuildStage) {
        self.emit(BuildEvent::Stage(stage));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(BuildEvent::Warning(message.into()));
    }

    pub fn main_page_rendered(&self, page: usize, total: usize) {
        self.emit(BuildEvent::MainPageRendered { page, total });
    }

    pub fn article_rendered(&self, id: &str, total: usize) {
        let mut done = self.articles.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        self.emit(BuildEvent::ArticleRendered {
            id: id.to_string(),
            done: *done,
            total,
        });
    }

    pub fn category_rendered(&self, id: &str, pages: usize, total: usize) {
        let mut done = self.categories.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        self.emit(BuildEvent::CategoryRendered {
            id: id.to_string(),
            pages,
            done: *done,
            total,
        });
    }

    pub fn category_skipped(&self, id: &str, total: usize) {
        let mut done = self.categories.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        self.emit(BuildEvent::CategorySkipped {
            id: id.to_string(),
            done: *done,
            total,
        });
    }

    pub fn single_rendered(&self, path: &str, total: usize) {
        let mut done = self.singles.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        self.emit(BuildEvent::SingleRendered {
            path: path.to_string(),
            done: *done,
            total,
        });
    }

    pub fn articles_done(&self) -> usize {
        *self.articles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Ids of categories found to have no items, collected from parallel workers.
#[derive(Default)]
pub struct EmptyCategories {
    ids: Mutex<Vec<String>>,
}

impl EmptyCategories {
    pub fn record(&self, id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id.to_string());
    }

    pub fn into_set(self) -> HashSet<String> {
        self.ids
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .collect()
    }
}
