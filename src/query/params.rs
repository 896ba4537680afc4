//! Raw search request parameters.

use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};

/// Parameters of a search request before validation.
///
/// Facet selections keep their request order; the builder validates field
/// names and values against the catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Free text.
    pub q: Option<String>,
    /// Search field key, e.g. `all_fields` or `creator`.
    pub search_field: Option<String>,
    /// `(facet field, value)` selections.
    pub facets: Vec<(String, String)>,
    /// Sort option key or sort string.
    pub sort: Option<String>,
    /// 1-based page number.
    pub page: Option<u64>,
    /// Rows per page.
    pub per_page: Option<u64>,
}

impl SearchParams {
    /// Create parameters for a free-text search.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query<S: Into<String>>(mut self, q: S) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn search_field<S: Into<String>>(mut self, key: S) -> Self {
        self.search_field = Some(key.into());
        self
    }

    /// Add a facet selection.
    pub fn facet<F: Into<String>, V: Into<String>>(mut self, field: F, value: V) -> Self {
        self.facets.push((field.into(), value.into()));
        self
    }

    pub fn sort<S: Into<String>>(mut self, sort: S) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    /// Parse a URL query string such as
    /// `q=climate&f[cobject_edition_ssi][]=/editions/any&sort=title&page=2`.
    ///
    /// Unrecognized keys are ignored.
    pub fn from_query_string(query: &str) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query.trim_start_matches('?'))
            .map_err(|e| LecternError::invalid_query(format!("bad query string: {e}")))?;

        let mut params = SearchParams::new();
        for (key, value) in pairs {
            match key.as_str() {
                "q" => params.q = Some(value),
                "search_field" => params.search_field = Some(value),
                "sort" => params.sort = Some(value),
                "page" => params.page = Some(parse_number("page", &value)?),
                "per_page" => params.per_page = Some(parse_number("per_page", &value)?),
                _ => {
                    if let Some(field) = facet_key(&key) {
                        params.facets.push((field.to_string(), value));
                    }
                }
            }
        }
        Ok(params)
    }

    /// Render back to a URL query string.
    pub fn to_query_string(&self) -> Result<String> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        if let Some(q) = &self.q {
            pairs.push(("q".to_string(), q.clone()));
        }
        if let Some(field) = &self.search_field {
            pairs.push(("search_field".to_string(), field.clone()));
        }
        for (field, value) in &self.facets {
            pairs.push((format!("f[{field}][]"), value.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page".to_string(), per_page.to_string()));
        }
        serde_urlencoded::to_string(&pairs)
            .map_err(|e| LecternError::invalid_query(format!("cannot encode parameters: {e}")))
    }
}

/// `f[field][]` or `f[field]` → `field`.
fn facet_key(key: &str) -> Option<&str> {
    let inner = key.strip_prefix("f[")?;
    let inner = inner.strip_suffix("[]").unwrap_or(inner);
    let field = inner.strip_suffix(']')?;
    if field.is_empty() || field.contains(['[', ']']) {
        return None;
    }
    Some(field)
}

fn parse_number(name: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        LecternError::invalid_query(format!(
            "{name} must be a non-negative integer, got {value:?}"
        ))
    })
}
