//! Previous/next navigation within an earlier search.
//!
//! When a user opens a document from a result list, the search that
//! produced the list and the document's position in it are kept as a
//! [`NavigationContext`]. [`NavigationResolver`] re-runs that search over a
//! three-document window around the position to find the neighbours. If the
//! result list has shifted since (documents added or removed), the resolver
//! scans a bounded number of pages to find the document again, and reports
//! no neighbours when it cannot.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};
use crate::gateway::{IndexBackend, ResultPage, SearchGateway};
use crate::identifier::CatalogIdentifier;
use crate::query::{Page, SearchQuery};

/// Limits for the drift-recovery scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Pages scanned before giving up on locating a shifted document.
    pub max_scan_pages: u64,
    /// Documents per scanned page.
    pub scan_page_size: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        NavigationConfig {
            max_scan_pages: 5,
            scan_page_size: 100,
        }
    }
}

impl NavigationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.scan_page_size == 0 {
            return Err(LecternError::invalid_config(
                "navigation.scan_page_size must be positive",
            ));
        }
        Ok(())
    }
}

/// The search a document was reached from, and its 0-based position in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationContext {
    pub originating_query: SearchQuery,
    pub position_in_results: u64,
}

impl NavigationContext {
    pub fn new(originating_query: SearchQuery, position_in_results: u64) -> Self {
        NavigationContext {
            originating_query,
            position_in_results,
        }
    }

    /// Context for the `index`-th document (0-based) of a result page.
    pub fn for_hit(page: &ResultPage, index: usize) -> Option<Self> {
        if index >= page.documents.len() {
            return None;
        }
        Some(NavigationContext::new(
            page.query_echo.clone(),
            page.query_echo.page.offset() + index as u64,
        ))
    }
}

/// Neighbours of a document within its originating search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub previous: Option<CatalogIdentifier>,
    pub next: Option<CatalogIdentifier>,
    /// Verified 0-based position, when known.
    pub position: Option<u64>,
    /// Size of the originating result list, when known.
    pub total_hits: Option<u64>,
}

impl Navigation {
    /// No ordering context: both neighbours absent.
    pub fn unknown() -> Self {
        Navigation::default()
    }

    pub fn is_unknown(&self) -> bool {
        self.position.is_none()
    }
}

/// Computes [`Navigation`] through a gateway.
pub struct NavigationResolver<'a, B> {
    gateway: &'a SearchGateway<B>,
    config: NavigationConfig,
}

impl<'a, B: IndexBackend> NavigationResolver<'a, B> {
    pub fn new(gateway: &'a SearchGateway<B>, config: NavigationConfig) -> Self {
        NavigationResolver { gateway, config }
    }

    /// Resolve the neighbours of `current`.
    ///
    /// Issues at most `max_scan_pages + 2` index queries.
    pub async fn resolve(
        &self,
        context: Option<&NavigationContext>,
        current: &CatalogIdentifier,
    ) -> Result<Navigation> {
        let Some(context) = context else {
            debug!("no navigation context for {current}");
            return Ok(Navigation::unknown());
        };
        let query = &context.originating_query;
        let expected = context.position_in_results;

        if let Some(navigation) = self.window(query, expected, current).await? {
            return Ok(navigation);
        }

        warn!("{current} is no longer at position {expected}; scanning for it");
        let Some(found) = self.scan(query, current).await? else {
            warn!(
                "{current} not found within {} pages of {}; navigation unavailable",
                self.config.max_scan_pages, self.config.scan_page_size
            );
            return Ok(Navigation::unknown());
        };

        match self.window(query, found, current).await? {
            Some(navigation) => Ok(navigation),
            None => {
                warn!("{current} moved again while resolving navigation");
                Ok(Navigation::unknown())
            }
        }
    }

    /// Fetch the document at `position` with its neighbours and check that it is `current`.
    async fn window(
        &self,
        query: &SearchQuery,
        position: u64,
        current: &CatalogIdentifier,
    ) -> Result<Option<Navigation>> {
        let (offset, limit, slot) = if position == 0 {
            (0, 2, 0)
        } else {
            (position - 1, 3, 1)
        };
        let page = self
            .gateway
            .execute(&query.with_page(Page::new(offset, limit)?))
            .await?;
        let docs = &page.documents;

        match docs.get(slot) {
            Some(doc) if doc.identifier() == current => {}
            _ => return Ok(None),
        }

        let previous = if slot > 0 {
            Some(docs[slot - 1].identifier().clone())
        } else {
            None
        };
        let next = if position + 1 < page.total_hits {
            docs.get(slot + 1).map(|d| d.identifier().clone())
        } else {
            None
        };

        Ok(Some(Navigation {
            previous,
            next,
            position: Some(position),
            total_hits: Some(page.total_hits),
        }))
    }

    /// Locate `current` by paging from the start of the results.
    async fn scan(&self, query: &SearchQuery, current: &CatalogIdentifier) -> Result<Option<u64>> {
        let size = self.config.scan_page_size;
        for page_no in 0..self.config.max_scan_pages {
            let offset = page_no * size;
            let page = self
                .gateway
                .execute(&query.with_page(Page::new(offset, size)?))
                .await?;
            if let Some(index) = page
                .documents
                .iter()
                .position(|d| d.identifier() == current)
            {
                return Ok(Some(offset + index as u64));
            }
            let seen = offset + page.documents.len() as u64;
            if page.documents.is_empty() || seen >= page.total_hits {
                break;
            }
        }
        Ok(None)
    }
}
