//! Fragrantica scraper
//!
//! Two sequential requests per lookup: the search page, then the first
//! result's perfume page. The note pyramid is read as
//! `h3` heading -> next sibling `div` -> its immediate child `div`s.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::debug;

use super::{CatalogEntry, CatalogError, CatalogResult, NoteProfile, NoteSource};
use crate::config::CatalogConfig;

/// Fetches HTML pages
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` and return the body as text
    async fn fetch(&self, url: &Url) -> Result<String, CatalogError>;
}

/// `reqwest`-backed page fetcher with a browser user agent
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher from catalog settings
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create catalog HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, CatalogError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))
    }
}

/// Note source that scrapes fragrantica.com (or a site with the same layout)
pub struct FragranticaSource<F = HttpFetcher> {
    fetcher: F,
    base_url: Url,
}

impl FragranticaSource<HttpFetcher> {
    /// Create a scraper over HTTP from catalog settings
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Self::new(HttpFetcher::new(config)?, &config.base_url)
    }
}

impl<F: PageFetcher> FragranticaSource<F> {
    /// Create a scraper using `fetcher` against `base_url`
    pub fn new(fetcher: F, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid catalog base URL: {}", base_url))?;
        Ok(Self { fetcher, base_url })
    }

    /// Search page URL for a query
    pub fn search_url(&self, query: &str) -> Result<Url, CatalogError> {
        let mut url = self
            .base_url
            .join("/search/")
            .map_err(|e| CatalogError::Parse(format!("invalid search URL: {e}")))?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }
}

#[async_trait]
impl<F: PageFetcher> NoteSource for FragranticaSource<F> {
    async fn fetch_notes(&self, query: &str) -> CatalogResult {
        let search_url = self.search_url(query)?;
        let search_page = self.fetcher.fetch(&search_url).await?;
        let perfume_url = parse_search_results(&search_page, &self.base_url, query)?;

        let perfume_page = self.fetcher.fetch(&perfume_url).await?;
        let notes = parse_pyramid(&perfume_page)?;

        Ok(CatalogEntry {
            notes,
            url: perfume_url.to_string(),
        })
    }
}

fn selector(css: &str) -> Result<Selector, CatalogError> {
    Selector::parse(css).map_err(|e| CatalogError::Parse(format!("invalid selector '{css}': {e}")))
}

/// Find the first perfume link on a search results page
pub fn parse_search_results(html: &str, base_url: &Url, query: &str) -> Result<Url, CatalogError> {
    let document = Html::parse_document(html);
    let card_selector = selector("div.perfume-card-image")?;
    let link_selector = selector("a")?;

    let link = document
        .select(&card_selector)
        .next()
        .and_then(|card| card.select(&link_selector).next())
        .ok_or_else(|| CatalogError::NotFound {
            query: query.to_string(),
        })?;

    let href = link
        .value()
        .attr("href")
        .ok_or_else(|| CatalogError::Parse("search result link has no href".to_string()))?;

    base_url
        .join(href)
        .map_err(|e| CatalogError::Parse(format!("invalid perfume link '{href}': {e}")))
}

/// Parse the note pyramid of a perfume page.
///
/// Categories without any notes are left out.
pub fn parse_pyramid(html: &str) -> Result<NoteProfile, CatalogError> {
    let document = Html::parse_document(html);
    let pyramid_selector = selector("div#pyramid")?;
    let heading_selector = selector("h3")?;

    let pyramid = document
        .select(&pyramid_selector)
        .next()
        .ok_or(CatalogError::StructureMissing)?;

    let mut profile = NoteProfile::new();
    for heading in pyramid.select(&heading_selector) {
        let category = stripped_text(&heading);

        let notes: Vec<String> = next_sibling_div(&heading)
            .map(|container| {
                container
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|child| child.value().name() == "div")
                    .map(|child| stripped_text(&child))
                    .filter(|text| !text.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if !notes.is_empty() {
            profile.insert(category, notes);
        }
    }

    Ok(profile)
}

fn next_sibling_div<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "div")
}

/// Text of every descendant text node, each trimmed, joined without separators
fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
