use std::convert::Infallible;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pagination::page_offset;

/// Name used for the "no category filter" choice.
pub const ALL_CATEGORIES: &str = "all";

/// The category a listing is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    #[default]
    All,
    Slug(String),
}

impl CategoryFilter {
    pub fn slug(&self) -> Option<&str> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Slug(slug) => Some(slug),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL_CATEGORIES) {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Slug(s.to_string()))
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(filter) => filter,
            Err(infallible) => match infallible {},
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug().unwrap_or(ALL_CATEGORIES))
    }
}

/// What the user asked to see: a search term, a category and a page.
///
/// Changing the search term or the category always returns to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    search_query: String,
    category: CategoryFilter,
    page: NonZeroU32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            category: CategoryFilter::All,
            page: NonZeroU32::MIN,
        }
    }
}

impl QueryState {
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// The search term, if it isn't blank.
    pub fn search_term(&self) -> Option<&str> {
        Some(self.search_query.trim()).filter(|term| !term.is_empty())
    }

    pub fn category(&self) -> &CategoryFilter {
        &self.category
    }

    pub fn page(&self) -> NonZeroU32 {
        self.page
    }

    pub fn with_search_query(self, search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            page: NonZeroU32::MIN,
            ..self
        }
    }

    pub fn with_category(self, category: CategoryFilter) -> Self {
        Self {
            category,
            page: NonZeroU32::MIN,
            ..self
        }
    }

    pub fn with_page(self, page: NonZeroU32) -> Self {
        Self { page, ..self }
    }

    /// Whether both queries list the same products, ignoring the page.
    pub fn same_listing(&self, other: &QueryState) -> bool {
        self.search_query == other.search_query && self.category == other.category
    }
}

/// Which catalog operation serves a [QueryState].
///
/// A non-blank search term wins over the category filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    Search {
        term: String,
        limit: NonZeroU32,
        offset: u64,
    },
    /// The catalog can't paginate category listings, so the whole category
    /// is fetched and sliced locally.
    Category {
        slug: String,
        page: NonZeroU32,
        page_size: NonZeroU32,
    },
    Default {
        limit: NonZeroU32,
        offset: u64,
    },
}

impl FetchPlan {
    pub fn for_query(query: &QueryState, page_size: NonZeroU32) -> Self {
        let offset = page_offset(query.page(), page_size);
        if let Some(term) = query.search_term() {
            return FetchPlan::Search {
                term: term.to_string(),
                limit: page_size,
                offset,
            };
        }
        match query.category() {
            CategoryFilter::Slug(slug) => FetchPlan::Category {
                slug: slug.clone(),
                page: query.page(),
                page_size,
            },
            CategoryFilter::All => FetchPlan::Default {
                limit: page_size,
                offset,
            },
        }
    }
}
