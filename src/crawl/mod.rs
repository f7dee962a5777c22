//! Link-scoped web crawling
//!
//! This module provides:
//! - Sequential, depth-first page fetching from a seed URL
//! - Scope filtering: only links containing the base URL are followed
//! - A per-crawl visited set (each URL is fetched at most once)
//! - Page and time limits so a crawl always terminates

use crate::config::CrawlConfig;
use crate::error::{Error, Result};
use crate::parse::parse_page;
use reqwest::Client;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

/// A crawled page
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub links: Vec<String>,
    pub depth: u32,
}

/// Result of fetching one URL
#[derive(Debug, Clone)]
pub enum Fetched {
    Page(CrawledPage),
    /// Absolute target of a 3xx response
    Redirect(String),
    NotHtml,
}

/// URLs already visited during one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    visited: HashSet<String>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the URL was already visited
    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(&visit_key(url))
    }

    /// Mark a URL visited; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(visit_key(url))
    }

    /// Visited URLs in no particular order
    pub fn visited(&self) -> impl Iterator<Item = &str> {
        self.visited.iter().map(String::as_str)
    }
}

/// Why a crawl ended before exhausting its frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    MaxPages,
    TimeBudget,
}

/// Outcome of one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Successfully fetched pages in visitation order
    pub pages: Vec<CrawledPage>,
    /// URLs whose fetch failed
    pub failed: Vec<String>,
    /// Set when a limit cut the crawl short
    pub stopped: Option<StopReason>,
}

impl CrawlReport {
    /// Text of every visited page in visitation order, one blank line apart
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Web crawler
pub struct Crawler {
    client: Client,
    config: CrawlConfig,
}

impl Crawler {
    /// Create a new crawler
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            // Redirects go back through the visited set instead
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::Crawl(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Crawl from a seed URL, following links that contain `base_url`
    pub async fn crawl(&self, seed_url: &str, base_url: &str) -> Result<CrawlReport> {
        let mut state = CrawlState::new();
        self.crawl_with_state(&mut state, seed_url, base_url).await
    }

    /// Crawl using caller-owned visited state
    pub async fn crawl_with_state(
        &self,
        state: &mut CrawlState,
        seed_url: &str,
        base_url: &str,
    ) -> Result<CrawlReport> {
        Url::parse(seed_url)?;
        if base_url.is_empty() {
            return Err(Error::Crawl("Base URL must not be empty".to_string()));
        }

        let deadline = Instant::now() + Duration::from_secs(self.config.max_crawl_secs);
        let mut report = CrawlReport::default();
        let mut attempts = 0u32;

        // Links are pushed in reverse so pages pop in document order,
        // giving the same preorder as a recursive walk.
        let mut stack: Vec<(String, u32)> = vec![(seed_url.to_string(), 0)];

        while let Some((url, depth)) = stack.pop() {
            if state.is_visited(&url) {
                debug!("Already visited: {}", url);
                continue;
            }
            if attempts >= self.config.max_pages {
                warn!(
                    "Reached max pages limit ({}); {} URLs left unvisited",
                    self.config.max_pages,
                    stack.len() + 1
                );
                report.stopped = Some(StopReason::MaxPages);
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    "Reached crawl time budget ({}s); stopping",
                    self.config.max_crawl_secs
                );
                report.stopped = Some(StopReason::TimeBudget);
                break;
            }

            state.mark_visited(&url);
            attempts += 1;

            match self.fetch(&url).await {
                Ok(Fetched::Page(mut page)) => {
                    page.depth = depth;
                    match &page.title {
                        Some(title) => info!("Scraping: {} ({})", page.url, title),
                        None => info!("Scraping: {}", page.url),
                    }

                    for link in page.links.iter().rev() {
                        if in_scope(link, base_url) && !state.is_visited(link) {
                            stack.push((link.clone(), depth + 1));
                        }
                    }

                    report.pages.push(page);
                }
                Ok(Fetched::Redirect(target)) => {
                    if !in_scope(&target, base_url) {
                        debug!("{} redirects out of scope to {}", url, target);
                    } else if state.is_visited(&target) {
                        debug!("{} redirects to visited {}", url, target);
                    } else {
                        stack.push((target, depth));
                    }
                }
                Ok(Fetched::NotHtml) => {
                    debug!("Skipping non-HTML page: {}", url);
                }
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    report.failed.push(url);
                }
            }
        }

        info!(
            "Crawled {} pages from {} ({} failed)",
            report.pages.len(),
            seed_url,
            report.failed.len()
        );
        Ok(report)
    }

    /// Fetch one URL without following redirects
    pub async fn fetch(&self, url: &str) -> Result<Fetched> {
        debug!("Fetching: {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if status.is_redirection() {
            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| Error::Crawl(format!("HTTP {} without Location: {}", status, url)))?;
            let target = Url::parse(url)?.join(location)?;
            return Ok(Fetched::Redirect(target.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Crawl(format!("HTTP {}: {}", status, url)));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| {
                let ct = ct.to_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            })
            .unwrap_or(true);
        if !is_html {
            return Ok(Fetched::NotHtml);
        }

        let content = response.text().await?;
        let parsed = parse_page(&content, url);

        Ok(Fetched::Page(CrawledPage {
            url: url.to_string(),
            title: parsed.title,
            text: parsed.text,
            links: parsed.links,
            depth: 0,
        }))
    }
}

/// Whether a link falls under the crawl's base URL
pub fn in_scope(link: &str, base_url: &str) -> bool {
    link.contains(base_url)
}

/// Identity used for the visited set; fragments never name a new page
fn visit_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}
