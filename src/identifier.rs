//! Composite catalog-object identifiers.
//!
//! A catalog object is addressed by six path segments:
//! `medium/collection/year/month/edition/objectId`. The index stores the
//! same identifier as a document key with a leading slash, e.g.
//! `/editions/any/2009/jul/01/42`, and that key is looked up by exact match.
//!
//! ```
//! use lectern::identifier::CatalogIdentifier;
//!
//! let id = CatalogIdentifier::parse(&["editions", "any", "2009", "jul", "01", "42"]).unwrap();
//! assert_eq!(id.to_document_key(), "/editions/any/2009/jul/01/42");
//!
//! let back = CatalogIdentifier::from_document_key("/editions/any/2009/jul/01/42").unwrap();
//! assert_eq!(back, id);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LecternError, Result};

/// Number of path segments in a catalog identifier.
pub const SEGMENT_COUNT: usize = 6;

const SEPARATOR: char = '/';
const OBJECT_PREFIX: &str = "object";

/// Identifier of a single catalog object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogIdentifier {
    medium: String,
    collection: String,
    year: String,
    month: String,
    edition: String,
    object_id: String,
}

impl CatalogIdentifier {
    /// Create an identifier from its six components.
    pub fn new<S: Into<String>>(
        medium: S,
        collection: S,
        year: S,
        month: S,
        edition: S,
        object_id: S,
    ) -> Result<Self> {
        let id = CatalogIdentifier {
            medium: medium.into(),
            collection: collection.into(),
            year: year.into(),
            month: month.into(),
            edition: edition.into(),
            object_id: object_id.into(),
        };
        for (name, value) in id.components() {
            validate_segment(name, value)?;
        }
        Ok(id)
    }

    /// Parse an identifier from exactly six path segments.
    pub fn parse<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
        if segments.len() != SEGMENT_COUNT {
            return Err(LecternError::malformed(format!(
                "expected {SEGMENT_COUNT} path segments, got {}",
                segments.len()
            )));
        }
        let s: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();
        CatalogIdentifier::new(s[0], s[1], s[2], s[3], s[4], s[5])
    }

    /// Parse a document key of the form `/medium/collection/year/month/edition/id`.
    pub fn from_document_key(key: &str) -> Result<Self> {
        let rest = key
            .strip_prefix(SEPARATOR)
            .ok_or_else(|| {
                LecternError::malformed(format!("document key {key:?} lacks leading '/'"))
            })?;
        let segments: Vec<&str> = rest.split(SEPARATOR).collect();
        if segments.len() != SEGMENT_COUNT {
            return Err(LecternError::malformed(format!(
                "document key {key:?} has {} segments, expected {SEGMENT_COUNT}",
                segments.len()
            )));
        }
        CatalogIdentifier::parse(&segments)
    }

    /// Serialize to the index's document key.
    pub fn to_document_key(&self) -> String {
        format!(
            "/{}/{}/{}/{}/{}/{}",
            self.medium, self.collection, self.year, self.month, self.edition, self.object_id
        )
    }

    /// Key of the edition this object belongs to (the first five segments).
    pub fn edition_key(&self) -> String {
        format!(
            "/{}/{}/{}/{}/{}",
            self.medium, self.collection, self.year, self.month, self.edition
        )
    }

    pub fn medium(&self) -> &str {
        &self.medium
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn month(&self) -> &str {
        &self.month
    }

    pub fn edition(&self) -> &str {
        &self.edition
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    fn components(&self) -> [(&'static str, &str); SEGMENT_COUNT] {
        [
            ("medium", &self.medium),
            ("collection", &self.collection),
            ("year", &self.year),
            ("month", &self.month),
            ("edition", &self.edition),
            ("object id", &self.object_id),
        ]
    }
}

/// Strip the `object` prefix from a route segment such as `object42`.
pub fn parse_object_segment(segment: &str) -> Result<&str> {
    match segment.strip_prefix(OBJECT_PREFIX) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(LecternError::malformed(format!(
            "segment {segment:?} is not of the form object<id>"
        ))),
    }
}

pub(crate) fn validate_segment(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LecternError::malformed(format!("{name} segment is empty")));
    }
    if value.contains(SEPARATOR) {
        return Err(LecternError::malformed(format!(
            "{name} segment {value:?} contains '/'"
        )));
    }
    Ok(())
}

impl fmt::Display for CatalogIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_document_key())
    }
}

impl FromStr for CatalogIdentifier {
    type Err = LecternError;

    fn from_str(s: &str) -> Result<Self> {
        CatalogIdentifier::from_document_key(s)
    }
}

impl Serialize for CatalogIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_document_key())
    }
}

impl<'de> Deserialize<'de> for CatalogIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        CatalogIdentifier::from_document_key(&key).map_err(serde::de::Error::custom)
    }
}
