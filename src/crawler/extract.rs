//! HTML to page record + markdown extraction
//!
//! Everything here is pure: the same HTML always yields the same `Page`
//! fields, content and links (apart from the `last_visited` timestamp).

use std::collections::HashSet;

use chrono::Utc;
use scraper::{Html, Selector};
use url::Url;

use crate::crawler::Page;
use crate::crawler::error::ExtractionError;
use crate::crawler::fetch::FetchedDocument;
use crate::crawler::visited::normalize_url;

/// Result of extracting one fetched document
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// Metadata record for the metadata store
    pub page: Page,

    /// Normalized markdown body; empty when the page has no text
    pub content: String,

    /// Absolute http(s) links found in the document, fragment-free, in order
    pub links: Vec<Url>,
}

/// Converts fetched HTML into a `Page`, markdown content and outgoing links
#[derive(Debug, Clone)]
pub struct Extractor {
    remove: Vec<Selector>,
    title: Selector,
    meta: Selector,
    anchor: Selector,
    body: Selector,
}

fn selector(raw: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(raw).map_err(|_| ExtractionError::Selector(raw.to_string()))
}

impl Extractor {
    /// Build an extractor stripping the given tag names from page bodies
    pub fn new(remove_tags: &[String]) -> Result<Self, ExtractionError> {
        let remove = remove_tags
            .iter()
            .map(|tag| selector(tag))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            remove,
            title: selector("title")?,
            meta: selector("meta[name]")?,
            anchor: selector("a[href]")?,
            body: selector("body")?,
        })
    }

    pub fn extract(&self, fetched: &FetchedDocument) -> Result<ExtractedPage, ExtractionError> {
        let mut document = Html::parse_document(&fetched.html);

        let title = document
            .select(&self.title)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());
        let description = self.meta_content(&document, "description");
        let keywords = self.meta_content(&document, "keywords");

        // Links are gathered before noise removal so nothing linkable is lost
        let links = self.links(&document, &fetched.final_url);

        let noise: Vec<_> = self
            .remove
            .iter()
            .flat_map(|sel| document.select(sel).map(|el| el.id()).collect::<Vec<_>>())
            .collect();
        for id in noise {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        let body_html = document
            .select(&self.body)
            .next()
            .map(|body| body.inner_html())
            .unwrap_or_default();
        let content = normalize_markdown(&htmd::convert(&body_html)?);

        Ok(ExtractedPage {
            page: Page {
                url: normalize_url(fetched.url.as_str()),
                title,
                description,
                keywords,
                last_visited: Utc::now(),
            },
            content,
            links,
        })
    }

    fn meta_content(&self, document: &Html, name: &str) -> Option<String> {
        document
            .select(&self.meta)
            .find(|el| {
                el.value()
                    .attr("name")
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
            .and_then(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }

    fn links(&self, document: &Html, base: &Url) -> Vec<Url> {
        let mut seen = HashSet::new();
        document
            .select(&self.anchor)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| base.join(href.trim()).ok())
            .filter(|url| url.scheme() == "http" || url.scheme() == "https")
            .map(|mut url| {
                url.set_fragment(None);
                url
            })
            .filter(|url| seen.insert(url.to_string()))
            .collect()
    }
}

/// Trim trailing whitespace and collapse runs of blank lines to one.
///
/// Idempotent: normalizing already-normalized text is a no-op.
pub fn normalize_markdown(markdown: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut pending_blank = false;

    for line in markdown.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push("");
            pending_blank = false;
        }
        lines.push(line);
    }

    lines.join("\n")
}
