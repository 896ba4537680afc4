//! HTTP client for a Solr core.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use crate::error::{LecternError, Result};
use crate::gateway::{GatewayConfig, IndexBackend, IndexResponse};
use crate::query::SearchQuery;
use crate::query::solr::SolrParams;

/// Queries a Solr core's `select` handler.
#[derive(Clone, Debug)]
pub struct SolrBackend {
    http: reqwest::Client,
    select_url: String,
}

impl SolrBackend {
    /// Create a client for `{base_url}/{core}/select`.
    ///
    /// The HTTP client gets a slightly longer timeout than the gateway so the
    /// gateway's own deadline is the one that fires.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout() + Duration::from_millis(500))
            .build()?;
        let select_url = format!(
            "{}/{}/select",
            config.base_url.trim_end_matches('/'),
            config.core.trim_matches('/')
        );
        Ok(SolrBackend { http, select_url })
    }

    pub fn select_url(&self) -> &str {
        &self.select_url
    }
}

#[async_trait]
impl IndexBackend for SolrBackend {
    async fn query(&self, query: &SearchQuery) -> Result<IndexResponse> {
        let params = SolrParams::from_query(query);
        debug!("GET {} {:?}", self.select_url, params.pairs());

        let resp = self
            .http
            .get(&self.select_url)
            .query(params.pairs())
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;
        if status.is_server_error() {
            return Err(LecternError::unavailable(format!(
                "solr answered {status}: {body}"
            )));
        }
        if !status.is_success() {
            return Err(LecternError::invalid_query(format!(
                "solr rejected the query with {status}: {body}"
            )));
        }

        let facet_order: Vec<String> = query.facets.iter().map(|f| f.field.clone()).collect();
        IndexResponse::from_solr_json(&body, &facet_order).map_err(|e| match e {
            LecternError::Json(e) => {
                LecternError::unavailable(format!("undecodable solr response: {e}"))
            }
            other => other,
        })
    }

    fn name(&self) -> &str {
        "solr"
    }
}

/// Connection failures and timeouts are transient; anything else is not.
fn transport_error(e: reqwest::Error) -> LecternError {
    if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
        LecternError::unavailable(e.to_string())
    } else {
        LecternError::Http(e)
    }
}
