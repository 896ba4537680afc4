#[cfg(test)]
mod tests {
    use lectern::config::CatalogConfig;
    use lectern::error::LecternError;
    use lectern::gateway::solr::SolrBackend;
    use lectern::gateway::{GatewayConfig, SearchGateway};
    use lectern::identifier::CatalogIdentifier;
    use lectern::query::{QueryBuilder, SearchParams};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "/editions/any/2009/jul/01/42";

    fn gateway_config(server: &MockServer) -> GatewayConfig {
        GatewayConfig {
            base_url: format!("{}/solr", server.uri()),
            core: "catalog".to_string(),
            timeout_ms: 2_000,
            max_attempts: 3,
            backoff_base_ms: 1,
            max_backoff_ms: 5,
            jitter: false,
        }
    }

    fn gateway(server: &MockServer) -> SearchGateway<SolrBackend> {
        let config = gateway_config(server);
        SearchGateway::new(SolrBackend::new(&config).unwrap(), "id", config)
    }

    fn select_body(docs: serde_json::Value, num_found: u64) -> serde_json::Value {
        json!({
            "responseHeader": {"status": 0, "QTime": 1},
            "response": {"numFound": num_found, "start": 0, "docs": docs}
        })
    }

    fn key_query() -> lectern::query::SearchQuery {
        let config = CatalogConfig::default();
        let id = CatalogIdentifier::from_document_key(KEY).unwrap();
        QueryBuilder::new(&config).for_identifier(&id)
    }

    #[tokio::test]
    async fn test_key_lookup_sends_term_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .and(query_param("fq", format!("{{!term f=id}}{KEY}")))
            .and(query_param("rows", "1"))
            .and(query_param("wt", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(select_body(
                json!([{"id": KEY, "cobject_title_ssi": "Isbjørne"}]),
                1,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let doc = gateway(&server).fetch_one(&key_query()).await.unwrap();
        assert_eq!(doc.identifier().to_document_key(), KEY);
        assert_eq!(doc.get("cobject_title_ssi").and_then(|v| v.first()), Some("Isbjørne"));
    }

    #[tokio::test]
    async fn test_empty_response_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .respond_with(ResponseTemplate::new(200).set_body_json(select_body(json!([]), 0)))
            .mount(&server)
            .await;

        let err = gateway(&server).fetch_one(&key_query()).await.unwrap_err();
        assert!(matches!(err, LecternError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_ambiguous() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .respond_with(ResponseTemplate::new(200).set_body_json(select_body(
                json!([{"id": KEY}]),
                2,
            )))
            .mount(&server)
            .await;

        let err = gateway(&server).fetch_one(&key_query()).await.unwrap_err();
        assert!(matches!(err, LecternError::AmbiguousResult(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .respond_with(ResponseTemplate::new(503).set_body_string("core reloading"))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .respond_with(ResponseTemplate::new(200).set_body_json(select_body(
                json!([{"id": KEY}]),
                1,
            )))
            .expect(1)
            .mount(&server)
            .await;

        let doc = gateway(&server).fetch_one(&key_query()).await.unwrap();
        assert_eq!(doc.identifier().object_id(), "42");
    }

    #[tokio::test]
    async fn test_persistent_outage_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = gateway(&server).execute(&key_query()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 503);
    }

    #[tokio::test]
    async fn test_bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .respond_with(ResponseTemplate::new(400).set_body_string("undefined field"))
            .expect(1)
            .mount(&server)
            .await;

        let err = gateway(&server).execute(&key_query()).await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_slow_index_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(select_body(json!([]), 0))
                    .set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = GatewayConfig {
            timeout_ms: 50,
            max_attempts: 1,
            ..gateway_config(&server)
        };
        let gateway = SearchGateway::new(SolrBackend::new(&config).unwrap(), "id", config);
        let err = gateway.execute(&key_query()).await.unwrap_err();
        assert!(matches!(err, LecternError::IndexUnavailable(ref m) if m.starts_with("Timeout")));
    }

    #[tokio::test]
    async fn test_search_params_and_facets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/solr/catalog/select"))
            .and(query_param("q", "climate"))
            .and(query_param("defType", "edismax"))
            .and(query_param(
                "fq",
                "-cobject_edition_ssi:\"/images/luftfo/2011/maj/luftfoto\"",
            ))
            .and(query_param("fq", "{!term f=subject_topic_id_ssim}7"))
            .and(query_param("facet.field", "cobject_edition_ssi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": {"numFound": 14, "start": 10, "docs": [{"id": KEY}]},
                "facet_counts": {"facet_fields": {
                    "subject_topic_id_ssim": ["7", 14, "9", 3],
                    "cobject_edition_ssi": ["/editions/any/2009/jul/01", 14]
                }}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = CatalogConfig::default();
        let query = QueryBuilder::new(&config)
            .for_search(
                &SearchParams::new()
                    .query("climate")
                    .facet("subject_topic_id_ssim", "7")
                    .page(2),
            )
            .unwrap();
        let page = gateway(&server).execute(&query).await.unwrap();

        assert_eq!(page.total_hits, 14);
        assert_eq!(page.documents.len(), 1);
        // request order, not response order
        assert_eq!(page.facet_counts[0].field, "cobject_edition_ssi");
        assert_eq!(page.facet_counts[1].values[1].value, "9");
        assert_eq!(page.facet_counts[1].values[1].count, 3);
    }
}
