//! Command implementations for the lectern CLI.

use std::fs;
use std::path::Path;

use log::{debug, info};
use serde_json::Value;

use crate::catalog::Catalog;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::CatalogConfig;
use crate::error::{LecternError, Result};
use crate::gateway::IndexBackend;
use crate::gateway::memory::MemoryBackend;
use crate::gateway::solr::SolrBackend;
use crate::identifier::CatalogIdentifier;
use crate::navigation::NavigationContext;
use crate::query::{QueryBuilder, SearchParams};
use crate::route::Route;
use crate::session::SessionId;

/// Execute a CLI command.
pub async fn execute_command(args: LecternArgs) -> Result<()> {
    if let Command::Route(route_args) = &args.command {
        return show_route(route_args, &args);
    }

    let config = load_config(&args)?;
    match &args.fixture {
        Some(path) => {
            let backend = load_fixture(path)?;
            run(Catalog::new(config, backend)?, &args).await
        }
        None => {
            let backend = SolrBackend::new(&config.gateway)?;
            info!("using solr at {}", backend.select_url());
            run(Catalog::new(config, backend)?, &args).await
        }
    }
}

async fn run<B: IndexBackend>(catalog: Catalog<B>, args: &LecternArgs) -> Result<()> {
    match &args.command {
        Command::Show(show_args) => show_document(&catalog, show_args, args).await,
        Command::Search(search_args) => search_index(&catalog, search_args, args).await,
        Command::Navigate(nav_args) => navigate(&catalog, nav_args, args).await,
        Command::Route(route_args) => show_route(route_args, args),
    }
}

/// Configuration from `--config` (or defaults) with command line overrides.
pub fn load_config(args: &LecternArgs) -> Result<CatalogConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("loading catalog configuration from {}", path.display());
            CatalogConfig::from_file(path)?
        }
        None => CatalogConfig::default(),
    };
    if let Some(url) = &args.solr_url {
        config.gateway.base_url = url.clone();
    }
    if let Some(core) = &args.core {
        config.gateway.core = core.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Read fixture documents: a JSON array, or one JSON object per line.
pub fn load_fixture(path: &Path) -> Result<MemoryBackend> {
    let content = fs::read_to_string(path)?;
    let backend = MemoryBackend::new();

    if content.trim_start().starts_with('[') {
        let docs: Vec<Value> = serde_json::from_str(&content)
            .map_err(|e| LecternError::invalid_config(format!("{}: {e}", path.display())))?;
        for doc in docs {
            backend.add_document(doc)?;
        }
    } else {
        for (line_num, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let doc: Value = serde_json::from_str(line).map_err(|e| {
                LecternError::invalid_config(format!(
                    "{} line {}: {e}",
                    path.display(),
                    line_num + 1
                ))
            })?;
            backend.add_document(doc)?;
        }
    }

    info!("loaded {} fixture documents from {}", backend.len(), path.display());
    Ok(backend)
}

/// Identifier from an object route or a bare document key.
fn parse_target(target: &str) -> Result<CatalogIdentifier> {
    match Route::parse(target) {
        Ok(Route::Object { id, .. }) | Ok(Route::Track { id, .. }) => Ok(id),
        _ => CatalogIdentifier::from_document_key(target),
    }
}

async fn show_document<B: IndexBackend>(
    catalog: &Catalog<B>,
    show_args: &ShowArgs,
    cli_args: &LecternArgs,
) -> Result<()> {
    let id = parse_target(&show_args.target)?;
    let session = SessionId::new();

    if let Some(query) = &show_args.query {
        let params = SearchParams::from_query_string(query)?;
        catalog.search(session, &params).await?;
    }

    let result = catalog.show(session, &id, show_args.counter).await?;
    debug!("showing {}", document_label(&result.document, catalog.config()));
    output_result(&ShowOutput::new(&result, catalog.config()), cli_args)
}

async fn search_index<B: IndexBackend>(
    catalog: &Catalog<B>,
    search_args: &SearchArgs,
    cli_args: &LecternArgs,
) -> Result<()> {
    let mut params = SearchParams::new();
    params.q = search_args.query.clone();
    params.search_field = search_args.search_field.clone();
    params.facets = search_args.facets.clone();
    params.sort = search_args.sort.clone();
    params.page = search_args.page;
    params.per_page = search_args.per_page;

    let session = SessionId::new();
    let page = match &search_args.within {
        None => catalog.search(session, &params).await?,
        Some(path) => match Route::parse(path)? {
            Route::Index { .. } => catalog.search(session, &params).await?,
            Route::Edition { scope, .. } => catalog.edition(session, &scope, &params).await?,
            Route::Subject {
                scope, subject_id, ..
            } => catalog.subject(session, &scope, &subject_id, &params).await?,
            other => {
                return Err(LecternError::invalid_query(format!(
                    "{path:?} names a single {}, not a result list",
                    match other {
                        Route::Track { .. } => "tracking endpoint",
                        _ => "object",
                    }
                )));
            }
        },
    };

    output_result(&SearchOutput::new(&page, catalog.config()), cli_args)
}

async fn navigate<B: IndexBackend>(
    catalog: &Catalog<B>,
    nav_args: &NavigateArgs,
    cli_args: &LecternArgs,
) -> Result<()> {
    let id = CatalogIdentifier::from_document_key(&nav_args.key)?;
    let params = SearchParams::from_query_string(&nav_args.query)?;
    let query = QueryBuilder::new(catalog.config()).for_search(&params)?;
    let context = NavigationContext::new(query, nav_args.position);

    let navigation = catalog.navigate(Some(&context), &id).await?;
    output_result(&navigation, cli_args)
}

fn show_route(route_args: &RouteArgs, cli_args: &LecternArgs) -> Result<()> {
    let route = Route::parse(&route_args.path)?;
    output_result(&route, cli_args)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_load_fixture_jsonl_and_array() {
        let mut jsonl = NamedTempFile::new().unwrap();
        writeln!(jsonl, r#"{{"id": "/editions/any/2009/jul/01/1"}}"#).unwrap();
        writeln!(jsonl).unwrap();
        writeln!(jsonl, r#"{{"id": "/editions/any/2009/jul/01/2"}}"#).unwrap();
        assert_eq!(load_fixture(jsonl.path()).unwrap().len(), 2);

        let mut array = NamedTempFile::new().unwrap();
        write!(array, r#"[{{"id": "/a/b/c/d/e/1"}}]"#).unwrap();
        assert_eq!(load_fixture(array.path()).unwrap().len(), 1);

        let mut broken = NamedTempFile::new().unwrap();
        writeln!(broken, "{{not json").unwrap();
        assert!(matches!(
            load_fixture(broken.path()),
            Err(LecternError::Config(_))
        ));

        let mut truncated = NamedTempFile::new().unwrap();
        write!(truncated, r#"[{{"id":"#).unwrap();
        match load_fixture(truncated.path()) {
            Err(LecternError::Config(msg)) => {
                assert!(msg.contains(&truncated.path().display().to_string()));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_target() {
        let from_route = parse_target("/editions/any/2009/jul/01/object42/da").unwrap();
        let from_key = parse_target("/editions/any/2009/jul/01/42").unwrap();
        assert_eq!(from_route, from_key);
        assert!(parse_target("/editions/any").is_err());
    }

    #[test]
    fn test_load_config_overrides() {
        let args = LecternArgs::try_parse_from([
            "lectern",
            "--solr-url",
            "http://index.internal:8983/solr",
            "--core",
            "catalog",
            "route",
            "/",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.gateway.base_url, "http://index.internal:8983/solr");
        assert_eq!(config.gateway.core, "catalog");
    }

    #[tokio::test]
    async fn test_search_within_object_route_is_rejected() {
        let catalog = Catalog::new(CatalogConfig::default(), MemoryBackend::new()).unwrap();
        let args = LecternArgs::try_parse_from([
            "lectern",
            "search",
            "--within",
            "/editions/any/2009/jul/01/object42/da",
        ])
        .unwrap();
        let Command::Search(search_args) = &args.command else {
            panic!("Expected Search command");
        };
        let err = search_index(&catalog, search_args, &args).await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidQuery(_)));
    }
}
