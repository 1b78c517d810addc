//! DuckDuckGo search via the JS-free HTML endpoint.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use super::{SearchClient, SearchResult};
use crate::error::PipelineError;

const SEARCH_ENDPOINT: &str = "https://duckduckgo.com/html/";

/// Search client backed by `duckduckgo.com/html`.
pub struct DuckDuckGoClient {
    client: reqwest::Client,
}

impl Default for DuckDuckGoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoClient {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl SearchClient for DuckDuckGoClient {
    fn provider_id(&self) -> &'static str {
        "duckduckgo_html"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, PipelineError> {
        debug!("Searching DuckDuckGo for: {}", query);

        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::Transport(format!(
                "Search returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| PipelineError::Transport(e.to_string()))?;

        Ok(parse_results(&html, limit))
    }
}

/// Pull `(title, url)` pairs out of a results page.
fn parse_results(html: &str, limit: usize) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a.result__a").unwrap();

    let mut results = Vec::new();
    for anchor in document.select(&selector) {
        let title = anchor.text().collect::<String>().trim().to_string();
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.is_empty() {
            continue;
        }
        results.push(SearchResult {
            title,
            url: href.to_string(),
        });
        if results.len() >= limit {
            break;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="result">
            <a class="result__a" href="https://example.com/hydration">Why hydration <b>matters</b></a>
          </div>
          <div class="result">
            <a class="result__a" href="https://example.org/water">Water and focus</a>
          </div>
          <div class="result">
            <a class="result__a">No href here</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://example.net/extra">A third result</a>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_results_extracts_title_and_url() {
        let results = parse_results(RESULTS_PAGE, 5);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Why hydration matters");
        assert_eq!(results[0].url, "https://example.com/hydration");
        assert_eq!(results[1].url, "https://example.org/water");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let results = parse_results(RESULTS_PAGE, 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_parse_results_empty_page() {
        assert!(parse_results("<html><body>no hits</body></html>", 5).is_empty());
    }
}
