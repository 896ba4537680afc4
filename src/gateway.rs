//! Execution of queries against the search index.
//!
//! [`SearchGateway`] wraps an [`IndexBackend`] with the gateway's own
//! timeout and retry policy and maps raw responses onto [`ResultPage`] and
//! [`DocumentRef`] values. Two backends are provided:
//!
//! - [`solr::SolrBackend`] talks to a Solr core over HTTP.
//! - [`memory::MemoryBackend`] evaluates queries over documents held in
//!   memory; it serves as the fixture index in tests and demos.

pub mod memory;
pub mod solr;

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;
use crate::error::{LecternError, Result};
use crate::query::SearchQuery;
use crate::query::solr::filter_query;

pub use crate::query::solr::IndexResponse;

/// A search index that can answer [`SearchQuery`] values.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Run one query, without retries.
    async fn query(&self, query: &SearchQuery) -> Result<IndexResponse>;

    /// Name used in log lines.
    fn name(&self) -> &str;
}

/// Connection, timeout and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Solr base URL, e.g. `http://localhost:8983/solr`.
    pub base_url: String,
    /// Solr core (collection) name.
    pub core: String,
    /// Per-attempt deadline in milliseconds.
    pub timeout_ms: u64,
    /// Total attempts for retryable failures, including the first.
    pub max_attempts: u32,
    /// Initial backoff in milliseconds; doubled on every retry.
    pub backoff_base_ms: u64,
    /// Upper bound for a single backoff in milliseconds.
    pub max_backoff_ms: u64,
    /// Add up to 50% random jitter to each backoff.
    pub jitter: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            base_url: "http://localhost:8983/solr".to_string(),
            core: "blacklight-core".to_string(),
            timeout_ms: 5_000,
            max_attempts: 3,
            backoff_base_ms: 100,
            max_backoff_ms: 2_000,
            jitter: true,
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(LecternError::invalid_config("gateway.timeout_ms must be positive"));
        }
        if self.max_attempts == 0 {
            return Err(LecternError::invalid_config("gateway.max_attempts must be at least 1"));
        }
        if self.max_backoff_ms < self.backoff_base_ms {
            return Err(LecternError::invalid_config(
                "gateway.max_backoff_ms is smaller than backoff_base_ms",
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay before retry number `retry` (0-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u64.checked_shl(retry).unwrap_or(u64::MAX);
        let millis = self
            .backoff_base_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }
}

/// Count of documents sharing one facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValue {
    pub value: String,
    pub count: u64,
}

/// Facet counts for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetField {
    pub field: String,
    pub values: Vec<FacetValue>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage {
    pub documents: Vec<DocumentRef>,
    pub facet_counts: Vec<FacetField>,
    pub total_hits: u64,
    pub query_echo: SearchQuery,
}

/// Runs queries through a backend with timeouts and bounded retries.
pub struct SearchGateway<B> {
    backend: B,
    key_field: String,
    config: GatewayConfig,
}

impl<B: IndexBackend> SearchGateway<B> {
    /// Create a gateway. `key_field` is the field holding document keys.
    pub fn new<S: Into<String>>(backend: B, key_field: S, config: GatewayConfig) -> Self {
        SearchGateway {
            backend,
            key_field: key_field.into(),
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Execute a query and return one page of results.
    pub async fn execute(&self, query: &SearchQuery) -> Result<ResultPage> {
        let response = self.query_with_retry(query).await?;

        let documents = response
            .docs
            .iter()
            .map(|raw| DocumentRef::from_raw(&self.key_field, raw))
            .collect::<Result<Vec<_>>>()?;

        let facet_counts = response
            .facet_counts
            .into_iter()
            .map(|(field, values)| FacetField {
                field,
                values: values
                    .into_iter()
                    .map(|(value, count)| FacetValue { value, count })
                    .collect(),
            })
            .collect();

        Ok(ResultPage {
            documents,
            facet_counts,
            total_hits: response.total_hits,
            query_echo: query.clone(),
        })
    }

    /// Execute a query that must match exactly one document.
    pub async fn fetch_one(&self, query: &SearchQuery) -> Result<DocumentRef> {
        let mut page = self.execute(query).await?;
        let described = describe(query);

        if page.documents.len() > 1 || page.total_hits > 1 {
            error!(
                "{} returned {} matches for {described}; document keys must be unique",
                self.backend.name(),
                page.total_hits.max(page.documents.len() as u64)
            );
            return Err(LecternError::ambiguous(format!(
                "{} documents match {described}",
                page.total_hits.max(page.documents.len() as u64)
            )));
        }

        page.documents
            .pop()
            .ok_or_else(|| LecternError::not_found(format!("no document matches {described}")))
    }

    async fn query_with_retry(&self, query: &SearchQuery) -> Result<IndexResponse> {
        let deadline = self.config.timeout();
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                "{} query attempt {attempt}/{}: {}",
                self.backend.name(),
                self.config.max_attempts,
                describe(query)
            );

            let error = match tokio::time::timeout(deadline, self.backend.query(query)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) if e.is_retryable() => e,
                Ok(Err(e)) => return Err(e),
                Err(_) => LecternError::timeout(format!(
                    "{} did not answer within {}ms",
                    self.backend.name(),
                    self.config.timeout_ms
                )),
            };

            if attempt >= self.config.max_attempts {
                warn!(
                    "{} unavailable after {attempt} attempts: {error}",
                    self.backend.name()
                );
                return Err(error);
            }

            let delay = self.retry_delay(attempt - 1);
            warn!(
                "{} attempt {attempt} failed ({error}); retrying in {}ms",
                self.backend.name(),
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn retry_delay(&self, retry: u32) -> Duration {
        let base = self.config.backoff(retry);
        if !self.config.jitter || base.is_zero() {
            return base;
        }
        let extra = rand::rng().random_range(0..=base.as_millis() as u64 / 2);
        base + Duration::from_millis(extra)
    }
}

/// Short description of a query for log lines and error messages.
fn describe(query: &SearchQuery) -> String {
    let filters = query
        .filters
        .iter()
        .map(filter_query)
        .collect::<Vec<_>>()
        .join(" AND ");
    match &query.free_text {
        Some(text) => format!("q={text:?} fq=[{filters}]"),
        None => format!("fq=[{filters}]"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;

    use super::*;
    use crate::config::CatalogConfig;
    use crate::identifier::CatalogIdentifier;
    use crate::query::QueryBuilder;

    /// Fails with `IndexUnavailable` a fixed number of times, then answers.
    struct Flaky {
        failures: u32,
        calls: Arc<AtomicU32>,
        hang: bool,
    }

    #[async_trait]
    impl IndexBackend for Flaky {
        async fn query(&self, _query: &SearchQuery) -> Result<IndexResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                if self.hang {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                return Err(LecternError::unavailable("connection refused"));
            }
            Ok(IndexResponse {
                total_hits: 1,
                docs: vec![
                    json!({"id": "/editions/any/2009/jul/01/42"})
                        .as_object()
                        .cloned()
                        .unwrap(),
                ],
                facet_counts: Vec::new(),
            })
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn fast_config(max_attempts: u32) -> GatewayConfig {
        GatewayConfig {
            timeout_ms: 50,
            max_attempts,
            backoff_base_ms: 1,
            max_backoff_ms: 4,
            jitter: false,
            ..GatewayConfig::default()
        }
    }

    fn key_query() -> SearchQuery {
        let config = CatalogConfig::default();
        let id = CatalogIdentifier::from_document_key("/editions/any/2009/jul/01/42").unwrap();
        QueryBuilder::new(&config).for_identifier(&id)
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = GatewayConfig {
            backoff_base_ms: 100,
            max_backoff_ms: 350,
            ..GatewayConfig::default()
        };
        assert_eq!(config.backoff(0), Duration::from_millis(100));
        assert_eq!(config.backoff(1), Duration::from_millis(200));
        assert_eq!(config.backoff(2), Duration::from_millis(350));
        assert_eq!(config.backoff(70), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let backend = Flaky {
            failures: 2,
            calls: calls.clone(),
            hang: false,
        };
        let gateway = SearchGateway::new(backend, "id", fast_config(3));

        let doc = gateway.fetch_one(&key_query()).await.unwrap();
        assert_eq!(doc.identifier().object_id(), "42");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let backend = Flaky {
            failures: 10,
            calls: calls.clone(),
            hang: false,
        };
        let gateway = SearchGateway::new(backend, "id", fast_config(2));

        let err = gateway.execute(&key_query()).await.unwrap_err();
        assert!(matches!(err, LecternError::IndexUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_timeout_maps_to_unavailable() {
        let calls = Arc::new(AtomicU32::new(0));
        let backend = Flaky {
            failures: 1,
            calls: calls.clone(),
            hang: true,
        };
        let gateway = SearchGateway::new(backend, "id", fast_config(1));

        let err = gateway.execute(&key_query()).await.unwrap_err();
        assert!(matches!(err, LecternError::IndexUnavailable(ref m) if m.starts_with("Timeout")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_then_recovery() {
        let calls = Arc::new(AtomicU32::new(0));
        let backend = Flaky {
            failures: 1,
            calls: calls.clone(),
            hang: true,
        };
        let gateway = SearchGateway::new(backend, "id", fast_config(2));

        assert!(gateway.execute(&key_query()).await.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&key_query()),
            "fq=[{!term f=id}/editions/any/2009/jul/01/42]"
        );
    }
}
