//! Solr select-request encoding and response decoding.
//!
//! Positive filters use the term query parser (`{!term f=FIELD}VALUE`) so a
//! document key is matched verbatim without query-syntax escaping. Negated
//! filters use the standard `-FIELD:"VALUE"` form.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{LecternError, Result};
use crate::query::{Filter, SearchQuery};

const MATCH_ALL: &str = "*:*";

/// Ordered Solr request parameters; keys may repeat (`fq`, `facet.field`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SolrParams {
    pairs: Vec<(String, String)>,
}

impl SolrParams {
    /// Encode a query.
    pub fn from_query(query: &SearchQuery) -> Self {
        let mut params = SolrParams::default();

        match &query.free_text {
            Some(text) => {
                params.push("q", text);
                if !query.field_weights.is_empty() {
                    params.push("defType", "edismax");
                    let qf = query
                        .field_weights
                        .iter()
                        .map(|w| format!("{}^{}", w.field, w.boost))
                        .collect::<Vec<_>>()
                        .join(" ");
                    params.push("qf", qf);
                }
                if !query.phrase_fields.is_empty() {
                    params.push("pf", query.phrase_fields.join(" "));
                }
            }
            None => params.push("q", MATCH_ALL),
        }

        for filter in &query.filters {
            params.push("fq", filter_query(filter));
        }

        if !query.sort.is_empty() {
            let sort = query
                .sort
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            params.push("sort", sort);
        }

        params.push("start", query.page.offset().to_string());
        params.push("rows", query.page.limit().to_string());
        params.push("wt", "json");

        if !query.facets.is_empty() {
            params.push("facet", "true");
            for facet in &query.facets {
                params.push("facet.field", &facet.field);
                if let Some(limit) = facet.limit {
                    params.push(
                        format!("f.{}.facet.limit", facet.field),
                        (limit + 1).to_string(),
                    );
                }
            }
        }

        params
    }

    fn push<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// All values for a key, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// First value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Render one filter as an `fq` value.
pub fn filter_query(filter: &Filter) -> String {
    if filter.negate {
        format!("-{}:\"{}\"", filter.field, escape_phrase(&filter.value))
    } else {
        format!("{{!term f={}}}{}", filter.field, filter.value)
    }
}

fn escape_phrase(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Backend-neutral response to one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexResponse {
    /// Total number of matching documents.
    pub total_hits: u64,
    /// Documents in the requested window, as raw stored fields.
    pub docs: Vec<Map<String, Value>>,
    /// Facet counts per field, in request order.
    pub facet_counts: Vec<(String, Vec<(String, u64)>)>,
}

#[derive(Debug, Deserialize)]
struct SolrSelect {
    response: SolrDocList,
    #[serde(default)]
    facet_counts: Option<SolrFacetCounts>,
}

#[derive(Debug, Deserialize)]
struct SolrDocList {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct SolrFacetCounts {
    #[serde(default)]
    facet_fields: BTreeMap<String, Vec<Value>>,
}

impl IndexResponse {
    /// Decode a Solr JSON select response.
    ///
    /// `facet_order` gives the order in which facet fields were requested.
    pub fn from_solr_json(body: &str, facet_order: &[String]) -> Result<Self> {
        let select: SolrSelect = serde_json::from_str(body)?;

        let mut facet_counts = Vec::new();
        if let Some(mut counts) = select.facet_counts.map(|c| c.facet_fields) {
            for field in facet_order {
                if let Some(flat) = counts.remove(field) {
                    facet_counts.push((field.clone(), decode_facet_values(field, &flat)?));
                }
            }
        }

        Ok(IndexResponse {
            total_hits: select.response.num_found,
            docs: select.response.docs,
            facet_counts,
        })
    }
}

/// Solr's flat `[value, count, value, count, ...]` facet list.
fn decode_facet_values(field: &str, flat: &[Value]) -> Result<Vec<(String, u64)>> {
    if flat.len() % 2 != 0 {
        return Err(LecternError::corrupt(format!(
            "facet {field} has an odd number of entries"
        )));
    }
    flat.chunks(2)
        .map(|pair| {
            let value = match &pair[0] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let count = pair[1].as_u64().ok_or_else(|| {
                LecternError::corrupt(format!("facet {field} value {value:?} has no count"))
            })?;
            Ok((value, count))
        })
        .collect()
}
