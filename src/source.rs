//! Content source: where items and categories come from.
//!
//! The pipeline only ever talks to the [`ContentSource`] trait. Production
//! builds use [`HttpSource`], a blocking `reqwest` client for a
//! microCMS-style list API; tests use an in-memory mock.
//!
//! ## Queries
//!
//! Every call is a list call described by a [`ListQuery`]. The exact
//! queries the pipeline issues are built by [`QueryPlan`] so the renderers
//! never assemble field lists or filters by hand.
//!
//! ## Errors
//!
//! Any failed call is fatal for the build: there are no retries and no
//! partial snapshots.

use crate::pagination::PageMeta;
use crate::types::ListResponse;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode '{endpoint}' response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One list request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub endpoint: String,
    pub fields: Vec<String>,
    pub limit: usize,
    pub offset: usize,
    pub orders: Vec<String>,
    pub filters: Option<String>,
}

impl ListQuery {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn order(mut self, order: &str) -> Self {
        self.orders.push(order.to_string());
        self
    }

    pub fn filter(mut self, filter: String) -> Self {
        self.filters = Some(filter);
        self
    }

    /// Query-string parameters in API form. Empty lists are omitted.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if !self.fields.is_empty() {
            params.push(("fields", self.fields.join(",")));
        }
        params.push(("limit", self.limit.to_string()));
        params.push(("offset", self.offset.to_string()));
        if !self.orders.is_empty() {
            params.push(("orders", self.orders.join(",")));
        }
        if let Some(filters) = &self.filters {
            params.push(("filters", filters.clone()));
        }
        params
    }
}

/// A list API that items and categories can be fetched from.
///
/// `Sync` so one source can be shared by every render worker.
pub trait ContentSource: Sync {
    fn list(&self, query: &ListQuery) -> Result<ListResponse<serde_json::Value>, FetchError>;
}

/// Run `query` and decode its contents into `T`.
pub fn list_as<T: DeserializeOwned>(
    source: &impl ContentSource,
    query: &ListQuery,
) -> Result<ListResponse<T>, FetchError> {
    let raw = source.list(query)?;
    let contents = raw
        .contents
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| FetchError::Decode {
            endpoint: query.endpoint.clone(),
            source,
        })?;
    Ok(ListResponse {
        contents,
        total_count: raw.total_count,
        offset: raw.offset,
        limit: raw.limit,
    })
}

// =============================================================================
// Query plan
// =============================================================================

pub const ORDER_NEWEST_FIRST: &str = "-publishedAt";

/// Fields rendered by the index and article templates.
pub const FULL_FIELDS: &[&str] = &[
    "id",
    "title",
    "event",
    "body",
    "publishedAt",
    "updatedAt",
    "category.id",
    "category.name",
];

/// Fields kept in the latest-articles snapshot.
pub const LATEST_FIELDS: &[&str] = &[
    "id",
    "title",
    "publishedAt",
    "updatedAt",
    "category.id",
    "category.name",
];

pub fn category_filter(id: &str) -> String {
    format!("category[contains]{id}")
}

/// Builds the exact queries a build issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub items_endpoint: String,
    pub categories_endpoint: String,
    pub page_size: usize,
    pub latest_count: usize,
    pub free_contents_limit: usize,
}

impl QueryPlan {
    /// Newest items; also yields the authoritative item total.
    pub fn latest(&self) -> ListQuery {
        ListQuery::new(&self.items_endpoint)
            .fields(LATEST_FIELDS)
            .limit(self.latest_count)
            .order(ORDER_NEWEST_FIRST)
    }

    pub fn main_page(&self, meta: PageMeta) -> ListQuery {
        ListQuery::new(&self.items_endpoint)
            .fields(FULL_FIELDS)
            .limit(self.page_size)
            .offset(meta.offset(self.page_size))
            .order(ORDER_NEWEST_FIRST)
    }

    pub fn categories(&self) -> ListQuery {
        ListQuery::new(&self.categories_endpoint)
            .fields(&["id", "name"])
            .limit(self.free_contents_limit)
    }

    /// Id-only query whose `total_count` is the category's item count.
    pub fn category_probe(&self, id: &str) -> ListQuery {
        ListQuery::new(&self.items_endpoint)
            .fields(&["id"])
            .limit(self.free_contents_limit)
            .order(ORDER_NEWEST_FIRST)
            .filter(category_filter(id))
    }

    pub fn category_page(&self, id: &str, meta: PageMeta) -> ListQuery {
        ListQuery::new(&self.items_endpoint)
            .fields(FULL_FIELDS)
            .limit(self.page_size)
            .offset(meta.offset(self.page_size))
            .order(ORDER_NEWEST_FIRST)
            .filter(category_filter(id))
    }
}

// =============================================================================
// HTTP source
// =============================================================================

pub const API_KEY_HEADER: &str = "X-MICROCMS-API-KEY";

/// Blocking HTTP client for a microCMS-style list API.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpSource {
    /// Client for `https://{service_domain}.microcms.io/api/v1`.
    pub fn new(service_domain: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        Self::with_base_url(
            &format!("https://{service_domain}.microcms.io/api/v1"),
            api_key,
            timeout,
        )
    }

    pub fn with_base_url(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cmsgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Transport {
                url: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }
}

impl ContentSource for HttpSource {
    fn list(&self, query: &ListQuery) -> Result<ListResponse<serde_json::Value>, FetchError> {
        let url = self.endpoint_url(&query.endpoint);
        let params = query.params();
        debug!(url = %url, ?params, "fetching");

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .query(&params)
            .send()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(|source| FetchError::Transport {
            url: url.clone(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            endpoint: query.endpoint.clone(),
            source,
        })
    }
}
