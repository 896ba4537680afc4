//! Output formatting for CLI commands.

use serde::Serialize;

use crate::catalog::ShowResult;
use crate::cli::args::{LecternArgs, OutputFormat};
use crate::config::CatalogConfig;
use crate::document::{DocumentRef, DocumentResponse};
use crate::error::Result;
use crate::gateway::ResultPage;
use crate::identifier::CatalogIdentifier;
use crate::navigation::Navigation;

/// Plain-text rendering of a command result.
pub trait HumanOutput {
    fn render_human(&self) -> String;
}

/// One labelled field value.
#[derive(Debug, Serialize)]
pub struct LabelledField {
    pub label: String,
    pub value: String,
}

fn labelled(fields: Vec<(&str, &crate::document::FieldValue)>) -> Vec<LabelledField> {
    fields
        .into_iter()
        .map(|(label, value)| LabelledField {
            label: label.to_string(),
            value: value.joined("; "),
        })
        .collect()
}

/// One entry of a result list.
#[derive(Debug, Serialize)]
pub struct HitView {
    /// 1-based hit number, usable as `show --counter`.
    pub counter: u64,
    pub key: String,
    pub title: String,
    pub fields: Vec<LabelledField>,
}

/// Facet counts with labels.
#[derive(Debug, Serialize)]
pub struct FacetView {
    pub field: String,
    pub label: String,
    pub values: Vec<(String, u64)>,
}

/// Result structure for search operations.
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub total_hits: u64,
    pub offset: u64,
    pub hits: Vec<HitView>,
    pub facets: Vec<FacetView>,
}

impl SearchOutput {
    pub fn new(page: &ResultPage, config: &CatalogConfig) -> Self {
        let offset = page.query_echo.page.offset();
        let hits = page
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| HitView {
                counter: offset + i as u64 + 1,
                key: doc.identifier().to_document_key(),
                title: doc.title(config),
                fields: labelled(doc.index_fields(config)),
            })
            .collect();
        let facets = page
            .facet_counts
            .iter()
            .map(|facet| FacetView {
                field: facet.field.clone(),
                label: config
                    .facet_field(&facet.field)
                    .map(|entry| entry.label.clone())
                    .unwrap_or_else(|| facet.field.clone()),
                values: facet
                    .values
                    .iter()
                    .map(|v| (v.value.clone(), v.count))
                    .collect(),
            })
            .collect();
        SearchOutput {
            total_hits: page.total_hits,
            offset,
            hits,
            facets,
        }
    }
}

impl HumanOutput for SearchOutput {
    fn render_human(&self) -> String {
        let mut out = String::new();
        if self.hits.is_empty() {
            out.push_str("No results.\n");
        } else {
            let last = self.offset + self.hits.len() as u64;
            out.push_str(&format!(
                "Results {}-{last} of {}\n",
                self.offset + 1,
                self.total_hits
            ));
        }
        for hit in &self.hits {
            out.push_str(&format!("\n{}. {}\n   {}\n", hit.counter, hit.title, hit.key));
            for field in &hit.fields {
                out.push_str(&format!("   {}: {}\n", field.label, field.value));
            }
        }
        for facet in self.facets.iter().filter(|f| !f.values.is_empty()) {
            out.push_str(&format!("\n{}:\n", facet.label));
            for (value, count) in &facet.values {
                out.push_str(&format!("  {value} ({count})\n"));
            }
        }
        out
    }
}

/// Result structure for `show`: the document envelope plus navigation.
#[derive(Debug, Serialize)]
pub struct ShowOutput<'a> {
    #[serde(flatten)]
    envelope: DocumentResponse<'a>,
    navigation: &'a Navigation,
    #[serde(skip)]
    title: String,
    #[serde(skip)]
    fields: Vec<LabelledField>,
}

impl<'a> ShowOutput<'a> {
    pub fn new(result: &'a ShowResult, config: &CatalogConfig) -> Self {
        ShowOutput {
            envelope: DocumentResponse::new(&result.document),
            navigation: &result.navigation,
            title: result.document.title(config),
            fields: labelled(result.document.show_fields(config)),
        }
    }
}

impl HumanOutput for ShowOutput<'_> {
    fn render_human(&self) -> String {
        let mut out = format!("{}\n", self.title);
        for field in &self.fields {
            out.push_str(&format!("{}: {}\n", field.label, field.value));
        }
        out.push('\n');
        out.push_str(&self.navigation.render_human());
        out
    }
}

impl HumanOutput for Navigation {
    fn render_human(&self) -> String {
        let key = |id: &Option<CatalogIdentifier>| {
            id.as_ref()
                .map(CatalogIdentifier::to_document_key)
                .unwrap_or_else(|| "-".to_string())
        };
        match (self.position, self.total_hits) {
            (Some(position), Some(total)) => format!(
                "Hit {} of {total}\nPrevious: {}\nNext: {}\n",
                position + 1,
                key(&self.previous),
                key(&self.next)
            ),
            _ => "No navigation context.\n".to_string(),
        }
    }
}

impl HumanOutput for crate::route::Route {
    fn render_human(&self) -> String {
        use crate::route::Route;
        let locale = self.locale().unwrap_or("-");
        match self {
            Route::Index { .. } => format!("search page (locale {locale})\n"),
            Route::Edition { scope, .. } => {
                format!("edition {} (locale {locale})\n", scope.key())
            }
            Route::Object { id, .. } => format!("object {id} (locale {locale})\n"),
            Route::Track { id, .. } => format!("track {id} (locale {locale})\n"),
            Route::Subject {
                scope, subject_id, ..
            } => format!("subject {subject_id} in {} (locale {locale})\n", scope.key()),
        }
    }
}

/// Output a result in the requested format.
pub fn output_result<T: Serialize + HumanOutput>(result: &T, args: &LecternArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            print!("{}", result.render_human());
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &LecternArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Key of a document, for log lines.
pub fn document_label(doc: &DocumentRef, config: &CatalogConfig) -> String {
    format!("{} ({})", doc.title(config), doc.identifier())
}
