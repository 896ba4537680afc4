//! Typed view of the catalog's route surface.
//!
//! The web layer owns the actual routing; this module only turns a request
//! path into one of the known route shapes so every segment goes through the
//! identifier codec before it reaches a query.

use serde::Serialize;

use crate::error::{LecternError, Result};
use crate::identifier::{self, CatalogIdentifier};

const SUBJECT_PREFIX: &str = "subject";
const TRACK_SUFFIX: &str = "track";

/// The five segments that name an edition, without an object id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EditionScope {
    pub medium: String,
    pub collection: String,
    pub year: String,
    pub month: String,
    pub edition: String,
}

impl EditionScope {
    /// Parse `medium/collection/year/month/edition` segments.
    pub fn parse(segments: &[&str]) -> Result<Self> {
        let names = ["medium", "collection", "year", "month", "edition"];
        if segments.len() != names.len() {
            return Err(LecternError::malformed(format!(
                "expected {} edition segments, got {}",
                names.len(),
                segments.len()
            )));
        }
        for (name, value) in names.iter().zip(segments) {
            identifier::validate_segment(name, value)?;
        }
        Ok(EditionScope {
            medium: segments[0].to_string(),
            collection: segments[1].to_string(),
            year: segments[2].to_string(),
            month: segments[3].to_string(),
            edition: segments[4].to_string(),
        })
    }

    /// Edition key as stored in the index's edition field.
    pub fn key(&self) -> String {
        format!(
            "/{}/{}/{}/{}/{}",
            self.medium, self.collection, self.year, self.month, self.edition
        )
    }

    /// Identifier of an object inside this edition.
    pub fn object(&self, object_id: &str) -> Result<CatalogIdentifier> {
        CatalogIdentifier::new(
            self.medium.as_str(),
            self.collection.as_str(),
            self.year.as_str(),
            self.month.as_str(),
            self.edition.as_str(),
            object_id,
        )
    }
}

/// A recognized catalog route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    /// `/` or `/{locale}`: the unscoped search page.
    Index { locale: Option<String> },
    /// `/{m}/{c}/{y}/{mo}/{e}/{locale}`: search scoped to an edition.
    Edition { scope: EditionScope, locale: String },
    /// `/{m}/{c}/{y}/{mo}/{e}/object{id}/{locale}`: single document view.
    Object { id: CatalogIdentifier, locale: String },
    /// `/{m}/{c}/{y}/{mo}/{e}/object{id}/{locale}/track`: analytics endpoint.
    Track { id: CatalogIdentifier, locale: String },
    /// `/{m}/{c}/{y}/{mo}/{e}/subject{sid}/{locale}`: search scoped to a subject.
    Subject {
        scope: EditionScope,
        subject_id: String,
        locale: String,
    },
}

impl Route {
    /// Parse a request path (query string excluded).
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Route::Index { locale: None });
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(LecternError::malformed(format!(
                "path {path:?} has an empty segment"
            )));
        }

        match segments.len() {
            1 => Ok(Route::Index {
                locale: Some(segments[0].to_string()),
            }),
            6 => Ok(Route::Edition {
                scope: EditionScope::parse(&segments[..5])?,
                locale: segments[5].to_string(),
            }),
            7 => {
                let scope = EditionScope::parse(&segments[..5])?;
                let locale = segments[6].to_string();
                if let Some(subject_id) = segments[5].strip_prefix(SUBJECT_PREFIX) {
                    if subject_id.is_empty() {
                        return Err(LecternError::malformed("subject segment has no id"));
                    }
                    return Ok(Route::Subject {
                        scope,
                        subject_id: subject_id.to_string(),
                        locale,
                    });
                }
                let object_id = identifier::parse_object_segment(segments[5])?;
                Ok(Route::Object {
                    id: scope.object(object_id)?,
                    locale,
                })
            }
            8 if segments[7] == TRACK_SUFFIX => {
                let scope = EditionScope::parse(&segments[..5])?;
                let object_id = identifier::parse_object_segment(segments[5])?;
                Ok(Route::Track {
                    id: scope.object(object_id)?,
                    locale: segments[6].to_string(),
                })
            }
            n => Err(LecternError::malformed(format!(
                "path {path:?} has {n} segments and matches no catalog route"
            ))),
        }
    }

    pub fn locale(&self) -> Option<&str> {
        match self {
            Route::Index { locale } => locale.as_deref(),
            Route::Edition { locale, .. }
            | Route::Object { locale, .. }
            | Route::Track { locale, .. }
            | Route::Subject { locale, .. } => Some(locale),
        }
    }
}
