//! Shared test utilities for the cmsgen test suite.
//!
//! Provides an in-memory [`MockSource`], builders for items and categories,
//! and fixture setup for template trees.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let settings = settings_for(tmp.path(), 10);
//! let source = MockSource::new(
//!     vec![item("hello", &["rust"])],
//!     vec![category("rust", "Rust")],
//! );
//! pipeline::build(&settings, &source, None).unwrap();
//! ```

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::Value;
use tempfile::TempDir;

use crate::config::{BuildSettings, PathsConfig, SiteConfig};
use crate::source::{ContentSource, FetchError, ListQuery, QueryPlan};
use crate::types::{Body, Category, Item, ListResponse};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/` to a temp directory and return it.
///
/// The copy holds a complete `resources/` tree. Tests get an isolated copy
/// they can mutate without affecting other tests or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Settings with `root/resources` as input and `root/output` as export.
pub fn settings_for(root: &Path, page_size: i64) -> BuildSettings {
    let mut config = SiteConfig {
        paths: PathsConfig {
            resources: root.join("resources"),
            export: root.join("output"),
            ..PathsConfig::default()
        },
        ..SiteConfig::default()
    };
    config.pagination.page_show_limit = page_size;
    config.pagination.latest_articles = 2;
    config.resolve().unwrap().0
}

pub fn plan(page_size: usize) -> QueryPlan {
    QueryPlan {
        items_endpoint: "article".to_string(),
        categories_endpoint: "category".to_string(),
        page_size,
        latest_count: 5,
        free_contents_limit: 10000,
    }
}

// =========================================================================
// Builders
// =========================================================================

pub fn category(id: &str, name: &str) -> Category {
    Category {
        id: id.to_string(),
        name: name.to_string(),
    }
}

/// An item tagged with `categories` (names equal ids).
pub fn item(id: &str, categories: &[&str]) -> Item {
    Item {
        id: id.to_string(),
        title: format!("Title of {id}"),
        body: vec![Body {
            field_id: "richText".to_string(),
            body: format!("<p>Body of {id}</p>"),
        }],
        published_at: Some(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()),
        updated_at: Some(Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap()),
        category: categories.iter().map(|c| category(c, c)).collect(),
        event: None,
    }
}

// =========================================================================
// MockSource
// =========================================================================

type FailWhen = Box<dyn Fn(&ListQuery) -> bool + Send + Sync>;

/// In-memory content source.
///
/// Serves `items` from every endpoint except `"category"`, which serves
/// `categories`. Honors `category[contains]` filters, offset/limit slicing
/// and field selection. Every query is recorded.
pub struct MockSource {
    items: Vec<Item>,
    categories: Vec<Category>,
    queries: Mutex<Vec<ListQuery>>,
    delay: Option<Duration>,
    fail_when: Option<FailWhen>,
}

impl MockSource {
    pub fn new(items: Vec<Item>, categories: Vec<Category>) -> Self {
        Self {
            items,
            categories,
            queries: Mutex::new(Vec::new()),
            delay: None,
            fail_when: None,
        }
    }

    /// Sleep this long in every call, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every query matching `predicate`.
    pub fn failing_when(mut self, predicate: impl Fn(&ListQuery) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Every query received so far, in arrival order.
    pub fn queries(&self) -> Vec<ListQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn matching(&self, query: &ListQuery) -> Vec<Value> {
        if query.endpoint == "category" {
            return self
                .categories
                .iter()
                .map(|c| serde_json::to_value(c).unwrap())
                .collect();
        }
        let wanted = query
            .filters
            .as_deref()
            .and_then(|f| f.strip_prefix("category[contains]"));
        self.items
            .iter()
            .filter(|item| wanted.is_none_or(|id| item.category.iter().any(|c| c.id == id)))
            .map(|item| serde_json::to_value(item).unwrap())
            .collect()
    }
}

fn project(value: Value, fields: &[String]) -> Value {
    if fields.is_empty() {
        return value;
    }
    let Value::Object(map) = value else {
        return value;
    };
    let keep = |key: &str| {
        fields
            .iter()
            .any(|f| f.split('.').next() == Some(key))
    };
    Value::Object(map.into_iter().filter(|(k, _)| keep(k)).collect())
}

impl ContentSource for MockSource {
    fn list(&self, query: &ListQuery) -> Result<ListResponse<Value>, FetchError> {
        self.queries.lock().unwrap().push(query.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail_when.as_ref().is_some_and(|fail| fail(query)) {
            return Err(FetchError::Status {
                url: format!("mock://{}", query.endpoint),
                status: 500,
            });
        }

        let all = self.matching(query);
        let total_count = all.len();
        let contents = all
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .map(|v| project(v, &query.fields))
            .collect();
        Ok(ListResponse {
            contents,
            total_count,
            offset: query.offset,
            limit: query.limit,
        })
    }
}
