//! Content types shared by the fetcher, the renderers, and the snapshot writer.
//!
//! Field names serialize in camelCase. The same shape is used on the wire
//! (CMS list responses), in template contexts, and in the JSON snapshots, so
//! a template author sees exactly the keys the CMS returns.

use crate::pagination::PageMeta;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A taxonomy entry (category / tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One named fragment of an item body (a repeated rich-text field).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default)]
    pub field_id: String,
    #[serde(default)]
    pub body: String,
}

/// Optional event block attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub event_text: String,
    #[serde(default)]
    pub event_link: String,
}

/// A single article.
///
/// Timestamps are instants; they are only turned into calendar dates at
/// render time, in the configured timezone. Fields the query did not ask for
/// come back as their empty value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Vec<Body>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category: Vec<Category>,
    #[serde(default)]
    pub event: Option<Event>,
}

/// Envelope of every CMS list call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub contents: Vec<T>,
    /// Total number of matches across all pages, not just this one.
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
}

/// One page of a listing, as handed to the index template.
///
/// Built from a fresh fetch, stamped once with pagination metadata, rendered,
/// then dropped.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage {
    pub contents: Vec<Item>,
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    pub current_page: usize,
    /// `0` on the first page: "no previous page".
    pub prev_page: usize,
    /// `all_page + 1` on the last page: "no next page".
    pub next_page: usize,
    pub all_page: usize,
    /// Link prefix for pagination URLs (`/` or `/articles/category/{id}/`).
    pub root: String,
    pub is_index: bool,
    /// Listing label such as `Category: Rust`; empty on the main index.
    pub archive_name: String,
}

impl ContentPage {
    pub fn from_response(response: ListResponse<Item>) -> Self {
        Self {
            contents: response.contents,
            total_count: response.total_count,
            offset: response.offset,
            limit: response.limit,
            ..Self::default()
        }
    }

    /// Attach navigation metadata for the page described by `meta`.
    ///
    /// `total` replaces whatever the page fetch reported, so every page of a
    /// listing carries the same count.
    pub fn stamp(&mut self, meta: PageMeta, total: usize, root: &str, is_index: bool, archive_name: &str) {
        self.total_count = total;
        self.current_page = meta.current;
        self.prev_page = meta.prev;
        self.next_page = meta.next;
        self.all_page = meta.all;
        self.root = root.to_string();
        self.is_index = is_index;
        self.archive_name = archive_name.to_string();
    }
}
