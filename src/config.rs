//! Catalog configuration.
//!
//! [`CatalogConfig`] is built once at startup, either from the defaults of
//! the library catalog or from a JSON file, and then shared read-only. It
//! holds the field tables used for display and faceting, the closed set of
//! search fields with their query fragments, the sort options, paging
//! defaults, and the gateway and navigation settings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LecternError, Result};
use crate::gateway::GatewayConfig;
use crate::navigation::NavigationConfig;
use crate::query::{Direction, FieldWeight, Filter, SortClause};

/// What a configured field is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    /// Shown in search result lists.
    Index,
    /// Shown on the single-document page.
    Show,
    /// Counted and offered as a filter.
    Facet,
}

/// One row of the field table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub field: String,
    pub label: String,
    pub role: FieldRole,
    /// For facets: how many values to display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl FieldEntry {
    pub fn new<F: Into<String>, L: Into<String>>(field: F, label: L, role: FieldRole) -> Self {
        FieldEntry {
            field: field.into(),
            label: label.into(),
            role,
            limit: None,
        }
    }
}

/// Query parameters contributed by a search field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFragment {
    /// Fields matched by free text, with boosts.
    #[serde(default)]
    pub field_weights: Vec<FieldWeight>,
    /// Phrase-boost fields.
    #[serde(default)]
    pub phrase_fields: Vec<String>,
    /// Filters always applied with this search field.
    #[serde(default)]
    pub filters: Vec<Filter>,
}

/// A selectable search field ("All Fields", "Creator", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFieldConfig {
    pub key: String,
    pub label: String,
    pub fragment: QueryFragment,
}

/// A selectable sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    pub key: String,
    pub label: String,
    pub clauses: Vec<SortClause>,
}

impl SortOption {
    /// The clauses rendered as a Solr sort string.
    pub fn sort_string(&self) -> String {
        self.clauses
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Configuration for the whole catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Field holding the document key.
    pub key_field: String,
    /// Field used as the document title.
    pub title_field: String,
    /// Field holding an object's edition key.
    pub edition_field: String,
    /// Field holding subject ids.
    pub subject_field: String,
    /// Display and facet field table, in display order.
    pub fields: Vec<FieldEntry>,
    /// Search fields, in menu order.
    pub search_fields: Vec<SearchFieldConfig>,
    /// Search field used when a request names none.
    pub default_search_field: String,
    /// Sort options, in menu order.
    pub sort_options: Vec<SortOption>,
    /// Sort option used when a request names none.
    pub default_sort: String,
    /// Filters applied to every free-text search.
    pub standing_exclusions: Vec<Filter>,
    /// Rows per page when a request names none.
    pub default_per_page: u64,
    /// Allowed rows-per-page values.
    pub per_page_options: Vec<u64>,
    /// Index connection settings.
    pub gateway: GatewayConfig,
    /// Previous/next resolution settings.
    pub navigation: NavigationConfig,
}

const TITLE_FIELD: &str = "cobject_title_ssi";
const CREATOR_FIELD: &str = "creator_tsim";
const DESCRIPTION_FIELD: &str = "description_tsim";
const EDITION_FIELD: &str = "cobject_edition_ssi";
const SUBJECT_FIELD: &str = "subject_topic_id_ssim";

impl Default for CatalogConfig {
    fn default() -> Self {
        let exclusion = Filter::must_not(EDITION_FIELD, "/images/luftfo/2011/maj/luftfoto");

        CatalogConfig {
            key_field: "id".to_string(),
            title_field: TITLE_FIELD.to_string(),
            edition_field: EDITION_FIELD.to_string(),
            subject_field: SUBJECT_FIELD.to_string(),
            fields: vec![
                FieldEntry::new(EDITION_FIELD, "Edition", FieldRole::Facet),
                FieldEntry::new(SUBJECT_FIELD, "Kategori", FieldRole::Facet),
                FieldEntry::new(TITLE_FIELD, "Title", FieldRole::Index),
                FieldEntry::new(CREATOR_FIELD, "Creator", FieldRole::Index),
                FieldEntry::new(DESCRIPTION_FIELD, "Description", FieldRole::Index),
                FieldEntry::new("pub_dat_tsim", "Pub date", FieldRole::Index),
                FieldEntry::new(TITLE_FIELD, "Title", FieldRole::Show),
                FieldEntry::new(CREATOR_FIELD, "Creator", FieldRole::Show),
                FieldEntry::new(DESCRIPTION_FIELD, "Description", FieldRole::Show),
            ],
            search_fields: vec![
                SearchFieldConfig {
                    key: "all_fields".to_string(),
                    label: "All Fields".to_string(),
                    fragment: QueryFragment {
                        field_weights: vec![
                            FieldWeight::new(TITLE_FIELD, 100.0),
                            FieldWeight::new(CREATOR_FIELD, 80.0),
                            FieldWeight::new(DESCRIPTION_FIELD, 50.0),
                        ],
                        phrase_fields: Vec::new(),
                        filters: vec![exclusion.clone()],
                    },
                },
                SearchFieldConfig {
                    key: "creator".to_string(),
                    label: "Creator".to_string(),
                    fragment: QueryFragment {
                        field_weights: vec![FieldWeight::new(CREATOR_FIELD, 1.0)],
                        phrase_fields: vec![CREATOR_FIELD.to_string()],
                        filters: vec![exclusion.clone()],
                    },
                },
            ],
            default_search_field: "all_fields".to_string(),
            sort_options: vec![
                SortOption {
                    key: "relevance".to_string(),
                    label: "relevance".to_string(),
                    clauses: vec![SortClause::relevance()],
                },
                SortOption {
                    key: "title".to_string(),
                    label: "title".to_string(),
                    clauses: vec![
                        SortClause::new(TITLE_FIELD, Direction::Asc),
                        SortClause::relevance(),
                    ],
                },
            ],
            default_sort: "relevance".to_string(),
            standing_exclusions: vec![exclusion],
            default_per_page: 10,
            per_page_options: vec![10, 20, 50, 100],
            gateway: GatewayConfig::default(),
            navigation: NavigationConfig::default(),
        }
    }
}

impl CatalogConfig {
    /// Load and validate a configuration from a JSON file.
    ///
    /// Keys missing from the file keep their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: CatalogConfig = serde_json::from_str(&content).map_err(|e| {
            LecternError::invalid_config(format!("{}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("key_field", &self.key_field),
            ("title_field", &self.title_field),
            ("edition_field", &self.edition_field),
            ("subject_field", &self.subject_field),
        ] {
            if value.is_empty() {
                return Err(LecternError::invalid_config(format!("{name} is empty")));
            }
        }
        if self.search_field(&self.default_search_field).is_none() {
            return Err(LecternError::invalid_config(format!(
                "default search field {:?} is not configured",
                self.default_search_field
            )));
        }
        if self.sort_option(&self.default_sort).is_none() {
            return Err(LecternError::invalid_config(format!(
                "default sort {:?} is not configured",
                self.default_sort
            )));
        }
        if let Some(option) = self.sort_options.iter().find(|o| o.clauses.is_empty()) {
            return Err(LecternError::invalid_config(format!(
                "sort option {:?} has no clauses",
                option.key
            )));
        }
        if self.per_page_options.contains(&0) {
            return Err(LecternError::invalid_config("per_page_options contains 0"));
        }
        if !self.per_page_options.contains(&self.default_per_page) {
            return Err(LecternError::invalid_config(format!(
                "default_per_page {} is not one of {:?}",
                self.default_per_page, self.per_page_options
            )));
        }
        self.gateway.validate()?;
        self.navigation.validate()?;
        Ok(())
    }

    /// Fields with a given role, in table order.
    pub fn fields_with_role(&self, role: FieldRole) -> impl Iterator<Item = &FieldEntry> {
        self.fields.iter().filter(move |f| f.role == role)
    }

    /// Facet field entry by name.
    pub fn facet_field(&self, field: &str) -> Option<&FieldEntry> {
        self.fields_with_role(FieldRole::Facet)
            .find(|f| f.field == field)
    }

    /// Search field definition by key.
    pub fn search_field(&self, key: &str) -> Option<&SearchFieldConfig> {
        self.search_fields.iter().find(|f| f.key == key)
    }

    /// Query fragment for a search field key.
    pub fn search_fragment(&self, key: &str) -> Option<&QueryFragment> {
        self.search_field(key).map(|f| &f.fragment)
    }

    /// Sort option by key or by its rendered sort string.
    pub fn sort_option(&self, key: &str) -> Option<&SortOption> {
        self.sort_options
            .iter()
            .find(|o| o.key == key)
            .or_else(|| self.sort_options.iter().find(|o| o.sort_string() == key))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CatalogConfig::default();
        config.validate().unwrap();
        assert_eq!(config.fields_with_role(FieldRole::Facet).count(), 2);
        assert_eq!(config.fields_with_role(FieldRole::Index).count(), 4);
        assert_eq!(config.fields_with_role(FieldRole::Show).count(), 3);
    }

    #[test]
    fn test_sort_lookup_by_key_or_string() {
        let config = CatalogConfig::default();
        assert_eq!(config.sort_option("title").unwrap().key, "title");
        assert_eq!(
            config
                .sort_option("cobject_title_ssi asc, score desc")
                .unwrap()
                .key,
            "title"
        );
        assert_eq!(config.sort_option("score desc").unwrap().key, "relevance");
        assert!(config.sort_option("price").is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"default_per_page": 20, "gateway": {{"base_url": "http://solr:8983/solr", "core": "catalog"}}}}"#
        )
        .unwrap();

        let config = CatalogConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_per_page, 20);
        assert_eq!(config.gateway.core, "catalog");
        assert_eq!(config.key_field, "id");
        assert_eq!(config.search_fields.len(), 2);
    }

    #[test]
    fn test_invalid_files_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_per_page": 15}}"#).unwrap();
        assert!(matches!(
            CatalogConfig::from_file(file.path()),
            Err(LecternError::Config(_))
        ));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            CatalogConfig::from_file(file.path()),
            Err(LecternError::Config(_))
        ));
    }

    #[test]
    fn test_missing_default_search_field() {
        let config = CatalogConfig {
            default_search_field: "subject".to_string(),
            ..CatalogConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
