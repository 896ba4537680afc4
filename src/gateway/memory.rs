//! In-memory fixture index.
//!
//! Documents are raw JSON objects, kept in insertion order. Queries follow
//! the same semantics as the Solr encoding: positive filters require an
//! exact value, negated filters exclude it, free text is scored by weighted
//! term occurrence, and ties keep insertion order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{LecternError, Result};
use crate::gateway::{IndexBackend, IndexResponse};
use crate::query::{Direction, FieldWeight, Filter, SCORE_FIELD, SearchQuery};

/// A search index held in memory.
#[derive(Debug)]
pub struct MemoryBackend {
    docs: RwLock<Vec<Map<String, Value>>>,
    available: AtomicBool,
    queries: AtomicU64,
}

struct Scored<'a> {
    doc: &'a Map<String, Value>,
    score: f32,
    order: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            docs: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
            queries: AtomicU64::new(0),
        }
    }

    /// Create an index seeded with documents.
    pub fn with_documents<I: IntoIterator<Item = Value>>(docs: I) -> Result<Self> {
        let backend = MemoryBackend::new();
        for doc in docs {
            backend.add_document(doc)?;
        }
        Ok(backend)
    }

    /// Append a document. It must be a JSON object.
    pub fn add_document(&self, doc: Value) -> Result<()> {
        match doc {
            Value::Object(map) => {
                self.docs.write().push(map);
                Ok(())
            }
            other => Err(LecternError::invalid_query(format!(
                "fixture documents must be JSON objects, got {other}"
            ))),
        }
    }

    /// Insert a document at a position, shifting later documents.
    pub fn insert_document(&self, index: usize, doc: Value) -> Result<()> {
        let Value::Object(map) = doc else {
            return Err(LecternError::invalid_query("fixture documents must be JSON objects"));
        };
        let mut docs = self.docs.write();
        let index = index.min(docs.len());
        docs.insert(index, map);
        Ok(())
    }

    /// Remove every document whose `field` equals `value`. Returns the count.
    pub fn delete_documents(&self, field: &str, value: &str) -> usize {
        let mut docs = self.docs.write();
        let before = docs.len();
        docs.retain(|doc| !field_matches(doc, field, value));
        before - docs.len()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Simulate an outage: while unavailable every query fails as retryable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of queries answered or refused so far.
    pub fn query_count(&self) -> u64 {
        self.queries.load(AtomicOrdering::SeqCst)
    }

    fn evaluate(&self, query: &SearchQuery) -> IndexResponse {
        let docs = self.docs.read();
        let terms = query.free_text.as_deref().map(tokenize).unwrap_or_default();

        let mut hits: Vec<Scored> = docs
            .iter()
            .enumerate()
            .filter(|(_, doc)| query.filters.iter().all(|f| passes(doc, f)))
            .filter_map(|(order, doc)| {
                if query.free_text.is_none() {
                    return Some(Scored { doc, score: 1.0, order });
                }
                let score = text_score(doc, &terms, &query.field_weights);
                (score > 0.0).then_some(Scored { doc, score, order })
            })
            .collect();

        hits.sort_by(|a, b| compare(a, b, query));

        let facet_counts = query
            .facets
            .iter()
            .map(|facet| {
                let mut counts: HashMap<String, u64> = HashMap::new();
                for hit in &hits {
                    for value in field_values(hit.doc, &facet.field) {
                        *counts.entry(value).or_insert(0) += 1;
                    }
                }
                let mut values: Vec<(String, u64)> = counts.into_iter().collect();
                values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                if let Some(limit) = facet.limit {
                    values.truncate(limit + 1);
                }
                (facet.field.clone(), values)
            })
            .collect();

        let total_hits = hits.len() as u64;
        let page_docs = hits
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.limit() as usize)
            .map(|hit| hit.doc.clone())
            .collect();

        IndexResponse {
            total_hits,
            docs: page_docs,
            facet_counts,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexBackend for MemoryBackend {
    async fn query(&self, query: &SearchQuery) -> Result<IndexResponse> {
        self.queries.fetch_add(1, AtomicOrdering::SeqCst);
        if !self.available.load(AtomicOrdering::SeqCst) {
            return Err(LecternError::unavailable("memory index is offline"));
        }
        Ok(self.evaluate(query))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Stored values of a field as strings; scalars become one-element lists.
fn field_values(doc: &Map<String, Value>, field: &str) -> Vec<String> {
    match doc.get(field) {
        Some(Value::Array(items)) => items.iter().filter_map(scalar).collect(),
        Some(value) => scalar(value).into_iter().collect(),
        None => Vec::new(),
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn field_matches(doc: &Map<String, Value>, field: &str, value: &str) -> bool {
    field_values(doc, field).iter().any(|v| v == value)
}

fn passes(doc: &Map<String, Value>, filter: &Filter) -> bool {
    field_matches(doc, &filter.field, &filter.value) != filter.negate
}

fn text_score(doc: &Map<String, Value>, terms: &[String], weights: &[FieldWeight]) -> f32 {
    let weighted: Vec<(String, f32)> = if weights.is_empty() {
        doc.keys().map(|k| (k.clone(), 1.0)).collect()
    } else {
        weights.iter().map(|w| (w.field.clone(), w.boost)).collect()
    };

    weighted
        .iter()
        .map(|(field, boost)| {
            let tokens: Vec<String> = field_values(doc, field)
                .iter()
                .flat_map(|v| tokenize(v))
                .collect();
            let occurrences = terms
                .iter()
                .map(|t| tokens.iter().filter(|tok| *tok == t).count())
                .sum::<usize>();
            occurrences as f32 * boost
        })
        .sum()
}

fn compare(a: &Scored, b: &Scored, query: &SearchQuery) -> Ordering {
    for clause in &query.sort {
        let ordering = if clause.field == SCORE_FIELD {
            a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal)
        } else {
            let left = field_values(a.doc, &clause.field).into_iter().next();
            let right = field_values(b.doc, &clause.field).into_iter().next();
            match (left, right) {
                (Some(l), Some(r)) => l.cmp(&r),
                // Missing values sort last in either direction.
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        };
        let ordering = match clause.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    if query.sort.is_empty() && query.free_text.is_some() {
        let ordering = b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.order.cmp(&b.order)
}
