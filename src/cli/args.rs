//! Command line argument parsing for the lectern CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Lectern - catalog lookup, search and result navigation over Solr
#[derive(Parser, Debug, Clone)]
#[command(name = "lectern")]
#[command(about = "Catalog lookup, faceted search and result navigation over a Solr index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct LecternArgs {
    /// Verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Catalog configuration file (JSON)
    #[arg(short, long, env = "LECTERN_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Solr base URL, overriding the configuration
    #[arg(long, env = "LECTERN_SOLR_URL", value_name = "URL")]
    pub solr_url: Option<String>,

    /// Solr core, overriding the configuration
    #[arg(long, value_name = "CORE")]
    pub core: Option<String>,

    /// Serve queries from a JSON or JSONL document file instead of Solr
    #[arg(long, value_name = "FILE", conflicts_with_all = ["solr_url", "core"])]
    pub fixture: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl LecternArgs {
    /// Effective verbosity: 0 quiet, 1 default, 2 verbose, 3+ debug.
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show one document by route path or document key
    Show(ShowArgs),

    /// Run a free-text or faceted search
    Search(SearchArgs),

    /// Resolve previous/next for a document within a search
    Navigate(NavigateArgs),

    /// Parse a route path and print what it names
    Route(RouteArgs),
}

/// Arguments for showing a document
#[derive(Parser, Debug, Clone)]
pub struct ShowArgs {
    /// Object route (`/m/c/y/mo/e/object42/da`) or document key (`/m/c/y/mo/e/42`)
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Query string of the search the document was opened from
    #[arg(long, value_name = "QUERYSTRING", requires = "counter")]
    pub query: Option<String>,

    /// 1-based hit number within that search
    #[arg(long)]
    pub counter: Option<u64>,
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Free text
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Facet selection as `field=value` (repeatable)
    #[arg(long = "facet", value_name = "FIELD=VALUE", value_parser = parse_facet)]
    pub facets: Vec<(String, String)>,

    /// Sort option key or sort string
    #[arg(long)]
    pub sort: Option<String>,

    /// 1-based page number
    #[arg(long)]
    pub page: Option<u64>,

    /// Rows per page
    #[arg(long)]
    pub per_page: Option<u64>,

    /// Search field key (e.g. all_fields, creator)
    #[arg(long)]
    pub search_field: Option<String>,

    /// Restrict to an edition or subject route
    #[arg(long, value_name = "ROUTE")]
    pub within: Option<String>,
}

/// Arguments for navigation
#[derive(Parser, Debug, Clone)]
pub struct NavigateArgs {
    /// Document key of the current document
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Query string of the originating search
    #[arg(long, value_name = "QUERYSTRING", default_value = "")]
    pub query: String,

    /// 0-based position of the document in that search
    #[arg(long)]
    pub position: u64,
}

/// Arguments for route parsing
#[derive(Parser, Debug, Clone)]
pub struct RouteArgs {
    /// Request path
    #[arg(value_name = "PATH")]
    pub path: String,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

fn parse_facet(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.is_empty() && !value.is_empty() => {
            Ok((field.to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got {raw:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_command() {
        let args = LecternArgs::try_parse_from([
            "lectern",
            "search",
            "climate",
            "--facet",
            "cobject_edition_ssi=/editions/any/2009/jul/01",
            "--facet",
            "subject_topic_id_ssim=7",
            "--sort",
            "title",
            "--page",
            "2",
        ])
        .unwrap();

        if let Command::Search(search_args) = args.command {
            assert_eq!(search_args.query.as_deref(), Some("climate"));
            assert_eq!(search_args.facets.len(), 2);
            assert_eq!(
                search_args.facets[1],
                ("subject_topic_id_ssim".to_string(), "7".to_string())
            );
            assert_eq!(search_args.sort.as_deref(), Some("title"));
            assert_eq!(search_args.page, Some(2));
        } else {
            panic!("Expected Search command");
        }
    }

    #[test]
    fn test_bad_facet_is_rejected() {
        let result = LecternArgs::try_parse_from(["lectern", "search", "--facet", "novalue"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_navigate_command() {
        let args = LecternArgs::try_parse_from([
            "lectern",
            "navigate",
            "/editions/any/2009/jul/01/42",
            "--query",
            "q=climate",
            "--position",
            "3",
        ])
        .unwrap();

        if let Command::Navigate(nav_args) = args.command {
            assert_eq!(nav_args.key, "/editions/any/2009/jul/01/42");
            assert_eq!(nav_args.query, "q=climate");
            assert_eq!(nav_args.position, 3);
        } else {
            panic!("Expected Navigate command");
        }
    }

    #[test]
    fn test_show_query_requires_counter() {
        let result = LecternArgs::try_parse_from([
            "lectern",
            "show",
            "/editions/any/2009/jul/01/42",
            "--query",
            "q=climate",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_fixture_conflicts_with_solr_url() {
        let result = LecternArgs::try_parse_from([
            "lectern",
            "--fixture",
            "docs.jsonl",
            "--solr-url",
            "http://localhost:8983/solr",
            "route",
            "/",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        let args = LecternArgs::try_parse_from(["lectern", "route", "/"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = LecternArgs::try_parse_from(["lectern", "-v", "route", "/"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = LecternArgs::try_parse_from(["lectern", "-vv", "route", "/"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args = LecternArgs::try_parse_from(["lectern", "--quiet", "-v", "route", "/"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            LecternArgs::try_parse_from(["lectern", "--format", "json", "route", "/"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
    }
}
