//! Search and show flow over one configured index.
//!
//! [`Catalog`] is what a front end talks to. It owns the configuration, the
//! gateway and the session store, and keeps each session's last search and
//! navigation context up to date as the user moves from a result list to a
//! document and on to its neighbours.

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::CatalogConfig;
use crate::document::DocumentRef;
use crate::error::{LecternError, Result};
use crate::gateway::{IndexBackend, ResultPage, SearchGateway};
use crate::identifier::CatalogIdentifier;
use crate::navigation::{Navigation, NavigationContext, NavigationResolver};
use crate::query::{QueryBuilder, SearchParams, SearchQuery};
use crate::route::EditionScope;
use crate::session::{SessionId, SessionStore};

/// A document together with its neighbours in the session's last search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowResult {
    pub document: DocumentRef,
    pub navigation: Navigation,
}

pub struct Catalog<B> {
    config: CatalogConfig,
    gateway: SearchGateway<B>,
    sessions: SessionStore,
}

impl<B: IndexBackend> Catalog<B> {
    /// Validate `config` and wrap `backend` in a gateway built from it.
    pub fn new(config: CatalogConfig, backend: B) -> Result<Self> {
        config.validate()?;
        let gateway = SearchGateway::new(
            backend,
            config.key_field.as_str(),
            config.gateway.clone(),
        );
        info!(
            "catalog ready: backend={} key_field={}",
            gateway.backend().name(),
            config.key_field
        );
        Ok(Catalog {
            config,
            gateway,
            sessions: SessionStore::new(),
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn gateway(&self) -> &SearchGateway<B> {
        &self.gateway
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.config)
    }

    /// Run a search and remember it as the session's last search.
    pub async fn search(&self, session: SessionId, params: &SearchParams) -> Result<ResultPage> {
        let query = self.builder().for_search(params)?;
        self.run_search(session, query).await
    }

    /// Documents of one edition.
    pub async fn edition(
        &self,
        session: SessionId,
        scope: &EditionScope,
        params: &SearchParams,
    ) -> Result<ResultPage> {
        let query = self.builder().for_edition(scope, params)?;
        self.run_search(session, query).await
    }

    /// Documents of one subject within an edition.
    pub async fn subject(
        &self,
        session: SessionId,
        scope: &EditionScope,
        subject_id: &str,
        params: &SearchParams,
    ) -> Result<ResultPage> {
        let query = self.builder().for_subject(scope, subject_id, params)?;
        self.run_search(session, query).await
    }

    async fn run_search(&self, session: SessionId, query: SearchQuery) -> Result<ResultPage> {
        let page = self.gateway.execute(&query).await?;
        self.sessions.update(session, |state| state.with_search(query));
        Ok(page)
    }

    /// Fetch a single document by identifier.
    pub async fn lookup(&self, id: &CatalogIdentifier) -> Result<DocumentRef> {
        self.gateway.fetch_one(&self.builder().for_identifier(id)).await
    }

    /// Fetch a document and resolve its neighbours.
    ///
    /// `counter` is the 1-based hit number from a result-list link. When it
    /// is given and the session has a last search, the session's navigation
    /// context is reset to that hit; otherwise the stored context is used.
    pub async fn show(
        &self,
        session: SessionId,
        id: &CatalogIdentifier,
        counter: Option<u64>,
    ) -> Result<ShowResult> {
        if counter == Some(0) {
            return Err(LecternError::invalid_query("result counters start at 1"));
        }

        let document = self.lookup(id).await?;

        let mut state = self.sessions.get(&session);
        if let Some(counter) = counter {
            match state.as_ref().and_then(|s| s.last_search.clone()) {
                Some(last) => {
                    let context = NavigationContext::new(last, counter - 1);
                    state = Some(self.sessions.update(session, |s| s.with_navigation(context)));
                }
                None => debug!("counter {counter} for {id} without a previous search"),
            }
        }

        let context = state.as_ref().and_then(|s| s.navigation.as_ref());
        let navigation = match self.navigate(context, id).await {
            Ok(navigation) => navigation,
            Err(e) if e.is_retryable() => {
                warn!("navigation for {id} unavailable: {e}");
                Navigation::unknown()
            }
            Err(e) => return Err(e),
        };

        if let Some(context) = context
            && let Some(found) = navigation.position
            && context.position_in_results != found
        {
            debug!(
                "{id} moved from position {} to {found}",
                context.position_in_results
            );
            let relocated = NavigationContext::new(context.originating_query.clone(), found);
            self.sessions.update(session, |s| s.with_navigation(relocated));
        }

        Ok(ShowResult {
            document,
            navigation,
        })
    }

    /// Resolve neighbours of `id` within an explicit context.
    pub async fn navigate(
        &self,
        context: Option<&NavigationContext>,
        id: &CatalogIdentifier,
    ) -> Result<Navigation> {
        NavigationResolver::new(&self.gateway, self.config.navigation.clone())
            .resolve(context, id)
            .await
    }
}
