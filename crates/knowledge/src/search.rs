//! Web search sources for answers that are not grounded on an index.
//!
//! The DuckDuckGo provider scrapes the HTML results page; there is no API
//! key, paging or retry.

use ragdesk_core::{AppError, AppResult};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

/// Number of results requested when the caller does not say.
pub const DEFAULT_RESULT_COUNT: usize = 10;

/// One web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// Trait for web search backends.
#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    fn provider_name(&self) -> &str;

    /// At most `limit` results for `query`, best first.
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SearchResult>>;
}

/// Searches through DuckDuckGo's HTML results page.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: Url,
}

impl DuckDuckGoSearch {
    /// `endpoint` is the results page, queried as `GET <endpoint>?q=<query>`.
    pub fn new(client: Client, endpoint: &str) -> AppResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            AppError::Config(format!("Invalid search endpoint '{}': {}", endpoint, e))
        })?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn provider_name(&self) -> &str {
        "duckduckgo"
    }

    #[tracing::instrument(skip(self), fields(provider = "duckduckgo"))]
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<SearchResult>> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", query);
        tracing::debug!("Searching {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| {
                AppError::Network(format!("Failed to reach {}: {}", self.endpoint, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Knowledge(format!(
                "Search failed: HTTP {} from {}",
                status, self.endpoint
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Network(format!("Failed to read search results: {}", e)))?;

        let mut results = parse_results(&body, &self.endpoint)?;
        results.truncate(limit);

        tracing::info!("Search for '{}' returned {} results", query, results.len());
        Ok(results)
    }
}

fn selector(css: &str) -> AppResult<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::Knowledge(format!("Bad selector '{}': {}", css, e)))
}

/// Organic results of a DuckDuckGo HTML page, in page order. Ads and hits
/// without a title or an http(s) link are dropped.
fn parse_results(markup: &str, page: &Url) -> AppResult<Vec<SearchResult>> {
    let document = Html::parse_document(markup);
    let result_sel = selector(".result:not(.result--ad)")?;
    let title_sel = selector("a.result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();
    for hit in document.select(&result_sel) {
        let Some(anchor) = hit.select(&title_sel).next() else {
            continue;
        };

        let title = collapse(anchor.text());
        let Some(link) = anchor.value().attr("href").and_then(|h| resolve_link(h, page)) else {
            continue;
        };
        if title.is_empty() {
            continue;
        }

        let snippet = hit
            .select(&snippet_sel)
            .next()
            .map(|s| collapse(s.text()))
            .unwrap_or_default();

        results.push(SearchResult {
            title,
            link,
            snippet,
        });
    }

    Ok(results)
}

/// Target of a result link. DuckDuckGo wraps targets in a redirect whose
/// `uddg` parameter carries the real URL.
fn resolve_link(href: &str, page: &Url) -> Option<String> {
    let joined = page.join(href.trim()).ok()?;

    let target = joined
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .and_then(|(_, value)| Url::parse(&value).ok())
        .unwrap_or(joined);

    matches!(target.scheme(), "http" | "https").then(|| target.to_string())
}

fn collapse<'a>(text: impl Iterator<Item = &'a str>) -> String {
    text.collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawl::http_client;
    use crate::tests::server::serve;
    use std::collections::HashMap;
    use std::time::Duration;

    const RESULTS_PAGE: &str = r##"<html><body>
<div class="result results_links result--ad">
  <h2 class="result__title"><a class="result__a" href="https://ads.example/buy">Sponsored</a></h2>
  <a class="result__snippet">Buy now</a>
</div>
<div class="result results_links web-result">
  <h2 class="result__title">
    <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&amp;rut=abc">Rust <b>Programming</b> Language</a>
  </h2>
  <a class="result__snippet" href="#">A language empowering   everyone to build
    reliable &amp; efficient software.</a>
</div>
<div class="result results_links web-result">
  <h2 class="result__title"><a class="result__a" href="https://tokio.rs/">Tokio</a></h2>
</div>
<div class="result results_links web-result">
  <h2 class="result__title"><a class="result__a" href="javascript:void(0)">Broken</a></h2>
</div>
</body></html>"##;

    fn page() -> Url {
        Url::parse("https://html.duckduckgo.com/html/").unwrap()
    }

    #[test]
    fn test_parse_results_skips_ads_and_unwraps_redirects() {
        let results = parse_results(RESULTS_PAGE, &page()).unwrap();

        assert_eq!(
            results,
            vec![
                SearchResult {
                    title: "Rust Programming Language".to_string(),
                    link: "https://www.rust-lang.org/".to_string(),
                    snippet: "A language empowering everyone to build reliable & efficient software."
                        .to_string(),
                },
                SearchResult {
                    title: "Tokio".to_string(),
                    link: "https://tokio.rs/".to_string(),
                    snippet: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_results_empty_page() {
        let results = parse_results("<html><body>No results.</body></html>", &page()).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_invalid_endpoint() {
        let client = http_client(Duration::from_secs(5)).unwrap();
        assert!(matches!(
            DuckDuckGoSearch::new(client, "not a url"),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_search_sends_query_and_limits_results() {
        let addr = serve(HashMap::from([("/html/?q=rust+async", RESULTS_PAGE)])).await;
        let search = DuckDuckGoSearch::new(
            http_client(Duration::from_secs(5)).unwrap(),
            &format!("http://{}/html/", addr),
        )
        .unwrap();

        let results = search.search("rust async", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].link, "https://www.rust-lang.org/");
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let addr = serve(HashMap::new()).await;
        let search = DuckDuckGoSearch::new(
            http_client(Duration::from_secs(5)).unwrap(),
            &format!("http://{}/html/", addr),
        )
        .unwrap();

        let result = search.search("anything", 5).await;
        assert!(matches!(result, Err(AppError::Knowledge(_))));
    }

    #[tokio::test]
    async fn test_search_unreachable_is_network_error() {
        let search = DuckDuckGoSearch::new(
            http_client(Duration::from_secs(2)).unwrap(),
            "http://127.0.0.1:9/html/",
        )
        .unwrap();

        let result = search.search("anything", 5).await;
        assert!(matches!(result, Err(AppError::Network(_))));
    }
}
