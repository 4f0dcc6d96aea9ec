//! Listing queries
//!
//! [`ListParams`] is the raw query string as a web layer receives it.
//! [`ListQuery::from_params`] turns it into a typed [`ListQuery`], applying
//! defaults and the page-size cap from [`CatalogConfig`].
//!
//! ## Example
//!
//! ```
//! use ccg_catalog::{CatalogConfig, ListParams, ListQuery, Ordering};
//!
//! let params = ListParams {
//!     page_size: Some("500".into()),
//!     tags: Some("nlp, summarization".into()),
//!     ordering: Some("-votes".into()),
//!     ..Default::default()
//! };
//! let query = ListQuery::from_params(&params, &CatalogConfig::default()).unwrap();
//!
//! assert_eq!(query.page, 1);
//! assert_eq!(query.page_size, 100);
//! assert_eq!(query.filters.tags, vec!["nlp", "summarization"]);
//! assert_eq!(query.ordering, Ordering::MostVoted);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::version::{ResourceType, ResourceVersion, VersionStatus};

/// Raw listing parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListParams {
    /// 1-based page number
    pub page: Option<String>,
    /// Results per page
    pub page_size: Option<String>,
    /// Case-insensitive text search on title and description
    pub search: Option<String>,
    /// Resource type
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
    /// Version status
    pub status: Option<String>,
    /// Comma-separated tags, all of which must be present
    pub tags: Option<String>,
    /// `-created_at`, `created_at`, or `-votes`
    pub ordering: Option<String>,
}

/// Result ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Ordering {
    /// Most recently created first (default)
    #[default]
    #[serde(rename = "-created_at")]
    NewestFirst,
    /// Oldest first
    #[serde(rename = "created_at")]
    OldestFirst,
    /// Most votes first, ties broken newest first
    #[serde(rename = "-votes")]
    MostVoted,
}

impl Ordering {
    /// Get the query-string spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Ordering::NewestFirst => "-created_at",
            Ordering::OldestFirst => "created_at",
            Ordering::MostVoted => "-votes",
        }
    }

    /// Parse the query-string spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "-created_at" => Some(Ordering::NewestFirst),
            "created_at" => Some(Ordering::OldestFirst),
            "-votes" => Some(Ordering::MostVoted),
            _ => None,
        }
    }
}

/// Filters applied to each resource's latest version.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceFilters {
    /// Exact type match
    pub resource_type: Option<ResourceType>,
    /// Exact status match
    pub status: Option<VersionStatus>,
    /// Every tag must be present
    pub tags: Vec<String>,
    /// Substring of title or description, case-insensitive
    pub search: Option<String>,
}

impl ResourceFilters {
    /// Check whether a latest version passes every filter.
    pub fn matches(&self, version: &ResourceVersion) -> bool {
        if self.resource_type.is_some_and(|t| t != version.resource_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != version.status) {
            return false;
        }
        if !version.has_all_tags(&self.tags) {
            return false;
        }
        match &self.search {
            Some(needle) => version.matches_text(needle),
            None => true,
        }
    }
}

/// A validated listing request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    /// Filters
    pub filters: ResourceFilters,
    /// Ordering
    pub ordering: Ordering,
    /// 1-based page number
    pub page: u32,
    /// Results per page
    pub page_size: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: ResourceFilters::default(),
            ordering: Ordering::default(),
            page: 1,
            page_size: CatalogConfig::default().default_page_size,
        }
    }
}

impl ListQuery {
    /// Parse raw parameters.
    pub fn from_params(params: &ListParams, config: &CatalogConfig) -> CatalogResult<Self> {
        let page = parse_positive(params.page.as_deref(), "page")?.unwrap_or(1);
        let page_size = parse_positive(params.page_size.as_deref(), "page_size")?
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size);

        let resource_type = non_empty(params.resource_type.as_deref())
            .map(|s| {
                ResourceType::parse(s).ok_or_else(|| CatalogError::InvalidField {
                    field: "type",
                    reason: format!("unknown resource type {:?}", s),
                })
            })
            .transpose()?;

        let status = non_empty(params.status.as_deref())
            .map(|s| {
                VersionStatus::parse(s).ok_or_else(|| CatalogError::InvalidField {
                    field: "status",
                    reason: format!("unknown status {:?}", s),
                })
            })
            .transpose()?;

        let ordering = non_empty(params.ordering.as_deref())
            .map(|s| {
                Ordering::parse(s).ok_or_else(|| CatalogError::InvalidField {
                    field: "ordering",
                    reason: format!("expected -created_at, created_at or -votes, got {:?}", s),
                })
            })
            .transpose()?
            .unwrap_or_default();

        let tags = params
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            filters: ResourceFilters {
                resource_type,
                status,
                tags,
                search: non_empty(params.search.as_deref()).map(String::from),
            },
            ordering,
            page,
            page_size,
        })
    }

    /// Set the page. Values below 1 are raised to 1.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set the page size. Values below 1 are raised to 1.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set the ordering.
    pub fn with_ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Filter by type.
    pub fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.filters.resource_type = Some(resource_type);
        self
    }

    /// Filter by status.
    pub fn with_status(mut self, status: VersionStatus) -> Self {
        self.filters.status = Some(status);
        self
    }

    /// Require tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Search title and description.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.filters.search = non_empty(Some(search.as_str())).map(String::from);
        self
    }
}

/// One page of results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    /// Items on this page
    pub results: Vec<T>,
    /// Total matching items across all pages
    pub count: usize,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub page_size: u32,
    /// Whether a later page has items
    pub has_next: bool,
    /// Whether this is not the first page
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Slice one page out of the full ordered result set.
    pub fn paginate(items: Vec<T>, page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        let page_size = page_size.max(1);
        let count = items.len();

        let start = (page as usize - 1).saturating_mul(page_size as usize);
        let end = start.saturating_add(page_size as usize);

        let results = items.into_iter().skip(start).take(page_size as usize).collect();

        Self {
            results,
            count,
            page,
            page_size,
            has_next: end < count,
            has_previous: page > 1,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_positive(value: Option<&str>, field: &'static str) -> CatalogResult<Option<u32>> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(CatalogError::InvalidField {
            field,
            reason: format!("must be a positive integer, got {:?}", raw),
        }),
    }
}
