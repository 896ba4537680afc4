//! # Lectern
//!
//! Catalog-object lookup, faceted search and previous/next navigation over
//! a Solr index.
//!
//! ## Features
//!
//! - Hierarchical catalog identifiers (`medium/collection/year/month/edition/object`)
//! - Typed parsing of the catalog's route surface
//! - Query building from a declarative catalog configuration
//! - A search gateway with per-attempt timeouts and bounded retries
//! - Previous/next navigation that survives result-list drift
//! - An in-memory index for tests and demos

pub mod catalog;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod identifier;
pub mod navigation;
pub mod query;
pub mod route;
pub mod session;

pub mod prelude {
    pub use crate::catalog::{Catalog, ShowResult};
    pub use crate::config::CatalogConfig;
    pub use crate::document::{DocumentRef, DocumentResponse, FieldValue};
    pub use crate::error::{LecternError, Result};
    pub use crate::gateway::memory::MemoryBackend;
    pub use crate::gateway::solr::SolrBackend;
    pub use crate::gateway::{GatewayConfig, IndexBackend, ResultPage, SearchGateway};
    pub use crate::identifier::CatalogIdentifier;
    pub use crate::navigation::{Navigation, NavigationContext, NavigationResolver};
    pub use crate::query::{QueryBuilder, SearchParams, SearchQuery};
    pub use crate::route::{EditionScope, Route};
    pub use crate::session::{SessionId, SessionStore};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
