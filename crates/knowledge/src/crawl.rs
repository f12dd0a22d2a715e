//! Web page sources: single-page fetch and breadth-first crawl.
//!
//! Pages are fetched one at a time. There is no robots.txt handling, rate
//! limiting or retry.

use crate::extract::extract_html;
use crate::types::{Skipped, SourceText};
use ragdesk_core::{AppError, AppResult};
use reqwest::Client;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Pages gathered by [`crawl`].
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Visible text of every page that produced some, in visit order
    pub documents: Vec<SourceText>,

    /// Pages that failed to fetch or had no text
    pub skipped: Vec<Skipped>,

    /// Number of distinct URLs requested
    pub visited: usize,
}

/// HTTP client with the configured request timeout.
pub fn http_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(timeout)
        .user_agent(concat!("ragdesk/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Extraction(format!("Failed to create HTTP client: {}", e)))
}

struct Page {
    text: String,
    links: Vec<Url>,
}

async fn fetch(client: &Client, url: &Url) -> AppResult<Page> {
    tracing::debug!("Fetching {}", url);

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| AppError::Extraction(format!("Failed to fetch {}: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Extraction(format!(
            "Failed to fetch {}: HTTP {}",
            url, status
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Extraction(format!("Failed to read {}: {}", url, e)))?;

    Ok(Page {
        text: extract_html(&body),
        links: extract_links(&body, url),
    })
}

/// Absolute http(s) targets of every `<a href>`, fragments removed.
fn extract_links(markup: &str, page: &Url) -> Vec<Url> {
    let document = Html::parse_document(markup);

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "a")
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| page.join(href.trim()).ok())
        .filter(|link| matches!(link.scheme(), "http" | "https"))
        .map(|mut link| {
            link.set_fragment(None);
            link
        })
        .collect()
}

/// Fetch one page and return its visible text, with the URL as source.
pub async fn fetch_page(client: &Client, url: &str) -> AppResult<SourceText> {
    let parsed = parse_url(url)?;
    let page = fetch(client, &parsed).await?;
    Ok(SourceText::new(parsed.to_string(), page.text))
}

/// Breadth-first crawl from `base_url`.
///
/// `depth` counts levels of pages fetched: `1` fetches only the start page,
/// `2` also fetches the pages it links to, and so on (`0` is treated as
/// `1`). Only links that start with `base_url` are followed; each URL is
/// requested at most once. Failures are logged and recorded in `skipped`.
pub async fn crawl(client: &Client, base_url: &str, depth: usize) -> AppResult<CrawlOutcome> {
    let base = parse_url(base_url)?;
    let prefix = base.as_str().to_string();
    let levels = depth.max(1);

    tracing::info!("Crawling {} to depth {}", base, levels);

    let mut outcome = CrawlOutcome::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier = vec![base];

    for level in 0..levels {
        let mut next = Vec::new();

        for url in frontier {
            if !visited.insert(url.as_str().to_string()) {
                continue;
            }

            match fetch(client, &url).await {
                Ok(page) => {
                    if level + 1 < levels {
                        next.extend(page.links.into_iter().filter(|link| {
                            link.as_str().starts_with(&prefix) && !visited.contains(link.as_str())
                        }));
                    }

                    if page.text.is_empty() {
                        tracing::warn!("No text on {}, skipping", url);
                        outcome
                            .skipped
                            .push(Skipped::new(url.to_string(), "no text extracted"));
                    } else {
                        outcome
                            .documents
                            .push(SourceText::new(url.to_string(), page.text));
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to crawl {}: {}", url, e);
                    outcome.skipped.push(Skipped::new(url.to_string(), e));
                }
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    outcome.visited = visited.len();
    tracing::info!(
        "Crawl of {} finished: {} pages, {} skipped",
        prefix,
        outcome.documents.len(),
        outcome.skipped.len()
    );

    Ok(outcome)
}

fn parse_url(url: &str) -> AppResult<Url> {
    let parsed =
        Url::parse(url).map_err(|e| AppError::Extraction(format!("Invalid URL '{}': {}", url, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::Extraction(format!(
            "Unsupported URL scheme '{}' in {}",
            parsed.scheme(),
            url
        )));
    }

    Ok(parsed)
}
