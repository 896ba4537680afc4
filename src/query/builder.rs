//! Translation of identifiers and request parameters into [`SearchQuery`] values.
//!
//! Exact-key lookups and free-text searches are built by separate entry
//! points: a key lookup never carries free text, boosts or sort clauses, so
//! the index treats it as a filter and not as a relevance-scored query.

use log::debug;

use crate::config::{CatalogConfig, FieldRole};
use crate::error::{LecternError, Result};
use crate::identifier::CatalogIdentifier;
use crate::query::{FacetRequest, Filter, Page, SearchParams, SearchQuery};
use crate::route::EditionScope;

/// Builds queries from a borrowed catalog configuration.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    config: &'a CatalogConfig,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(config: &'a CatalogConfig) -> Self {
        QueryBuilder { config }
    }

    pub fn config(&self) -> &'a CatalogConfig {
        self.config
    }

    /// Single-document lookup by document key.
    pub fn for_identifier(&self, id: &CatalogIdentifier) -> SearchQuery {
        SearchQuery {
            free_text: None,
            filters: vec![Filter::must(
                self.config.key_field.as_str(),
                id.to_document_key(),
            )],
            field_weights: Vec::new(),
            phrase_fields: Vec::new(),
            sort: Vec::new(),
            page: Page::single(),
            facets: Vec::new(),
        }
    }

    /// Free-text and faceted search.
    pub fn for_search(&self, params: &SearchParams) -> Result<SearchQuery> {
        let search_key = params
            .search_field
            .as_deref()
            .unwrap_or(self.config.default_search_field.as_str());
        let fragment = self.config.search_fragment(search_key).ok_or_else(|| {
            LecternError::invalid_query(format!("unknown search field {search_key:?}"))
        })?;

        let sort_key = params.sort.as_deref().unwrap_or(self.config.default_sort.as_str());
        let sort = self
            .config
            .sort_option(sort_key)
            .ok_or_else(|| LecternError::invalid_query(format!("unknown sort key {sort_key:?}")))?;

        let page = self.page(params)?;

        let mut filters = fragment.filters.clone();
        for exclusion in &self.config.standing_exclusions {
            if !filters.contains(exclusion) {
                filters.push(exclusion.clone());
            }
        }
        filters.extend(self.facet_filters(params)?);

        let free_text = params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        let query = SearchQuery {
            free_text,
            filters,
            field_weights: fragment.field_weights.clone(),
            phrase_fields: fragment.phrase_fields.clone(),
            sort: sort.clauses.clone(),
            page,
            facets: self
                .config
                .fields_with_role(FieldRole::Facet)
                .map(|f| FacetRequest {
                    field: f.field.clone(),
                    limit: f.limit,
                })
                .collect(),
        };
        debug!(
            "built search query: search_field={search_key} sort={} filters={}",
            sort.key,
            query.filters.len()
        );
        Ok(query)
    }

    /// Search scoped to one subject of one edition.
    pub fn for_subject(
        &self,
        scope: &EditionScope,
        subject_id: &str,
        params: &SearchParams,
    ) -> Result<SearchQuery> {
        let mut query = self.for_search(params)?;
        query
            .filters
            .push(Filter::must(self.config.edition_field.as_str(), scope.key()));
        query
            .filters
            .push(Filter::must(self.config.subject_field.as_str(), subject_id));
        Ok(query)
    }

    /// Search scoped to one edition.
    pub fn for_edition(&self, scope: &EditionScope, params: &SearchParams) -> Result<SearchQuery> {
        let mut query = self.for_search(params)?;
        query
            .filters
            .push(Filter::must(self.config.edition_field.as_str(), scope.key()));
        Ok(query)
    }

    /// Facet selections as positive filters, grouped in configured facet order.
    fn facet_filters(&self, params: &SearchParams) -> Result<Vec<Filter>> {
        if let Some((field, _)) = params
            .facets
            .iter()
            .find(|(field, _)| self.config.facet_field(field).is_none())
        {
            return Err(LecternError::invalid_query(format!(
                "unknown facet field {field:?}"
            )));
        }

        let mut filters = Vec::with_capacity(params.facets.len());
        for facet in self.config.fields_with_role(FieldRole::Facet) {
            for (field, value) in &params.facets {
                if *field != facet.field {
                    continue;
                }
                let filter = Filter::must(field.as_str(), value.as_str());
                if !filters.contains(&filter) {
                    filters.push(filter);
                }
            }
        }
        Ok(filters)
    }

    fn page(&self, params: &SearchParams) -> Result<Page> {
        let per_page = params.per_page.unwrap_or(self.config.default_per_page);
        if !self.config.per_page_options.contains(&per_page) {
            return Err(LecternError::invalid_query(format!(
                "per_page {per_page} is not one of {:?}",
                self.config.per_page_options
            )));
        }
        let page = params.page.unwrap_or(1);
        if page == 0 {
            return Err(LecternError::invalid_query("page numbers start at 1"));
        }
        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| LecternError::invalid_query(format!("page {page} is out of range")))?;
        Page::new(offset, per_page)
    }
}
