//! Search Client: the single point of entry for web search calls.
//!
//! `TavilyClient` is the production backend; the `SearchClient` trait lets the
//! collector run against any backend, including canned responses in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const TAVILY_API_URL: &str = "https://api.tavily.com/search";
pub const DEFAULT_SEARCH_DEPTH: &str = "advanced";
pub const DEFAULT_MAX_RESULTS: u32 = 5;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("search API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("search service is not configured: {0}")]
    NotConfigured(String),
}

/// One hit returned for a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Provider-written summary answer, when requested and available.
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

/// A research snippet paired with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub snippet: String,
    pub source_url: String,
}

impl SearchResponse {
    /// Non-empty snippets in result order.
    pub fn snippets(&self) -> Vec<Snippet> {
        self.results
            .iter()
            .filter(|r| !r.content.trim().is_empty())
            .map(|r| Snippet {
                snippet: r.content.trim().to_string(),
                source_url: r.url.clone(),
            })
            .collect()
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Tavily
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
    include_answer: bool,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct TavilyErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
}

impl TavilyClient {
    pub fn new(api_key: String) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()?,
            api_key,
        })
    }
}

#[async_trait]
impl SearchClient for TavilyClient {
    async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        if self.api_key.trim().is_empty() {
            return Err(SearchError::NotConfigured(
                "TAVILY_API_KEY is empty".to_string(),
            ));
        }

        let body = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth: DEFAULT_SEARCH_DEPTH,
            max_results: DEFAULT_MAX_RESULTS,
            include_answer: true,
            include_raw_content: false,
        };

        let response = self
            .client
            .post(TAVILY_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TavilyErrorBody>(&text)
                .ok()
                .and_then(|e| e.detail)
                .map(|detail| detail.to_string())
                .unwrap_or(text);
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: SearchResponse = response.json().await?;
        debug!(
            "Search '{}' returned {} results (answer: {})",
            query,
            parsed.results.len(),
            parsed.answer.is_some()
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_deserializes_with_missing_fields() {
        let json = r#"{
            "query": "content marketing",
            "results": [
                {"title": "Guide", "url": "https://example.com/guide", "content": "Content marketing is..."},
                {"url": "https://example.com/bare"}
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.answer.is_none());
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[1].title, "");
    }

    #[test]
    fn test_snippets_skip_empty_content() {
        let response = SearchResponse {
            answer: Some("Summary".to_string()),
            results: vec![
                SearchResult {
                    title: "A".to_string(),
                    url: "https://a.example".to_string(),
                    content: "Alpha".to_string(),
                },
                SearchResult {
                    title: "B".to_string(),
                    url: "https://b.example".to_string(),
                    content: "  ".to_string(),
                },
            ],
        };
        assert_eq!(
            response.snippets(),
            vec![Snippet {
                snippet: "Alpha".to_string(),
                source_url: "https://a.example".to_string(),
            }]
        );
    }

    #[test]
    fn test_request_serializes_expected_shape() {
        let body = TavilyRequest {
            api_key: "k",
            query: "q",
            search_depth: DEFAULT_SEARCH_DEPTH,
            max_results: DEFAULT_MAX_RESULTS,
            include_answer: true,
            include_raw_content: false,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["search_depth"], "advanced");
        assert_eq!(value["max_results"], 5);
        assert_eq!(value["include_answer"], true);
    }

    #[tokio::test]
    async fn test_empty_api_key_is_not_configured() {
        let client = TavilyClient::new(String::new()).unwrap();
        let err = client.search("anything").await.unwrap_err();
        assert!(matches!(err, SearchError::NotConfigured(_)));
    }
}
