//! Structured queries against the catalog index.
//!
//! A [`SearchQuery`] is the index-neutral description of one request:
//! optional free text, exact-match filters, field boosts, sort order and a
//! page window. [`builder::QueryBuilder`] produces them from identifiers or
//! request parameters, and [`solr`] turns them into Solr select parameters.

pub mod builder;
pub mod params;
pub mod solr;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};

pub use self::builder::QueryBuilder;
pub use self::params::SearchParams;

/// Sort field name the index uses for relevance.
pub const SCORE_FIELD: &str = "score";

/// An exact-match filter on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Field to match.
    pub field: String,
    /// Value the field must (or must not) hold.
    pub value: String,
    /// Exclude matching documents instead of requiring them.
    #[serde(default)]
    pub negate: bool,
}

impl Filter {
    /// Require `field` to equal `value`.
    pub fn must<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Filter {
            field: field.into(),
            value: value.into(),
            negate: false,
        }
    }

    /// Exclude documents where `field` equals `value`.
    pub fn must_not<F: Into<String>, V: Into<String>>(field: F, value: V) -> Self {
        Filter {
            field: field.into(),
            value: value.into(),
            negate: true,
        }
    }
}

/// Relevance multiplier for one field in free-text matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldWeight {
    pub field: String,
    pub boost: f32,
}

impl FieldWeight {
    pub fn new<S: Into<String>>(field: S, boost: f32) -> Self {
        FieldWeight {
            field: field.into(),
            boost,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One `field direction` sort clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortClause {
    pub field: String,
    pub direction: Direction,
}

impl SortClause {
    pub fn new<S: Into<String>>(field: S, direction: Direction) -> Self {
        SortClause {
            field: field.into(),
            direction,
        }
    }

    /// Relevance, best match first.
    pub fn relevance() -> Self {
        SortClause::new(SCORE_FIELD, Direction::Desc)
    }

    /// Parse a Solr-style sort string such as `cobject_title_ssi asc, score desc`.
    pub fn parse_list(sort: &str) -> Result<Vec<SortClause>> {
        let mut clauses = Vec::new();
        for part in sort.split(',') {
            let mut words = part.split_whitespace();
            let (Some(field), Some(dir), None) = (words.next(), words.next(), words.next()) else {
                return Err(LecternError::invalid_query(format!(
                    "sort clause {part:?} must be `field asc|desc`"
                )));
            };
            let direction = match dir {
                "asc" => Direction::Asc,
                "desc" => Direction::Desc,
                other => {
                    return Err(LecternError::invalid_query(format!(
                        "unknown sort direction {other:?}"
                    )));
                }
            };
            clauses.push(SortClause::new(field, direction));
        }
        Ok(clauses)
    }
}

impl fmt::Display for SortClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.as_str())
    }
}

/// Offset/limit window over a result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPage")]
pub struct Page {
    offset: u64,
    limit: u64,
}

#[derive(Deserialize)]
struct RawPage {
    offset: u64,
    limit: u64,
}

impl TryFrom<RawPage> for Page {
    type Error = LecternError;

    fn try_from(raw: RawPage) -> Result<Self> {
        Page::new(raw.offset, raw.limit)
    }
}

impl Page {
    /// Create a page window. `limit` must be positive.
    pub fn new(offset: u64, limit: u64) -> Result<Self> {
        if limit == 0 {
            return Err(LecternError::invalid_query("page limit must be positive"));
        }
        Ok(Page { offset, limit })
    }

    /// The single-document window used by exact-key lookups.
    pub fn single() -> Self {
        Page { offset: 0, limit: 1 }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }
}

/// A facet field requested alongside the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetRequest {
    pub field: String,
    /// Number of values to display; the index is asked for one more.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// A complete query against the catalog index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free text; `None` matches every document.
    pub free_text: Option<String>,
    /// Exact-match filters, AND-combined, in order.
    pub filters: Vec<Filter>,
    /// Fields matched by the free text, with their boosts.
    pub field_weights: Vec<FieldWeight>,
    /// Fields given a phrase-proximity boost.
    #[serde(default)]
    pub phrase_fields: Vec<String>,
    /// Sort clauses; empty means the index default.
    pub sort: Vec<SortClause>,
    /// Result window.
    pub page: Page,
    /// Facets to count over the full result set.
    #[serde(default)]
    pub facets: Vec<FacetRequest>,
}

impl SearchQuery {
    /// Copy of this query with a different result window.
    pub fn with_page(&self, page: Page) -> SearchQuery {
        SearchQuery {
            page,
            ..self.clone()
        }
    }

    /// Whether this query is a single exact-match lookup.
    pub fn is_key_lookup(&self) -> bool {
        self.free_text.is_none()
            && self.field_weights.is_empty()
            && self.filters.len() == 1
            && !self.filters[0].negate
            && self.page == Page::single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_list() {
        let clauses = SortClause::parse_list("cobject_title_ssi asc, score desc").unwrap();
        assert_eq!(
            clauses,
            vec![
                SortClause::new("cobject_title_ssi", Direction::Asc),
                SortClause::relevance(),
            ]
        );
        assert_eq!(clauses[0].to_string(), "cobject_title_ssi asc");
    }

    #[test]
    fn test_parse_sort_rejects_garbage() {
        assert!(SortClause::parse_list("score").is_err());
        assert!(SortClause::parse_list("score up").is_err());
        assert!(SortClause::parse_list("score desc extra").is_err());
        assert!(SortClause::parse_list("").is_err());
    }

    #[test]
    fn test_page_requires_positive_limit() {
        assert!(Page::new(0, 0).is_err());
        let page = Page::new(30, 10).unwrap();
        assert_eq!((page.offset(), page.limit()), (30, 10));
    }

    #[test]
    fn test_page_deserialization_keeps_fields() {
        let page: Page = serde_json::from_str(r#"{"offset": 4, "limit": 3}"#).unwrap();
        assert_eq!(page, Page::new(4, 3).unwrap());
        assert!(serde_json::from_str::<Page>(r#"{"offset": 0, "limit": 0}"#).is_err());
    }
}
