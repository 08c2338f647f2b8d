//! Web search tool backed by the Tavily search API.

use super::{parse_query, query_schema, Tool, WEB_SEARCH};
use crate::config::SearchSettings;
use crate::error::{HjelperError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// A single ranked search hit as shown to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub url: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Proxies queries to the search provider and returns up to `max_results` hits.
pub struct WebSearchTool {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    max_results: u32,
    description: String,
}

impl WebSearchTool {
    /// Create a search tool. The API key must be non-empty.
    pub fn new(api_key: &str, settings: &SearchSettings, description: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(HjelperError::Config("Tavily requires an API key".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: settings.endpoint.clone(),
            max_results: settings.max_results,
            description: description.to_string(),
        })
    }

    /// Run a search and return the ranked hits.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<WebSearchResult>> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
            "search_depth": "advanced",
            "include_answer": false,
            "include_raw_content": false,
            "include_images": false,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| HjelperError::Search(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let err_body = response.text().await.unwrap_or_default();
            return Err(HjelperError::Search(format!(
                "API error ({}): {}",
                status.as_u16(),
                err_body
            )));
        }

        let data: TavilyResponse = response
            .json()
            .await
            .map_err(|e| HjelperError::Search(format!("failed to parse response: {}", e)))?;

        let results: Vec<WebSearchResult> = data
            .results
            .into_iter()
            .take(self.max_results as usize)
            .map(|r| WebSearchResult {
                url: r.url,
                content: r.content,
            })
            .collect();

        debug!("Search returned {} results", results.len());
        Ok(results)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        WEB_SEARCH
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema("search query to look up")
    }

    async fn call(&self, arguments: &str) -> Result<String> {
        let query = parse_query(arguments)?;
        let results = self.search(&query).await?;
        Ok(serde_json::to_string(&results)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    /// Serve a canned search response on an ephemeral port.
    async fn mock_server(status: axum::http::StatusCode, body: serde_json::Value) -> String {
        let app = Router::new().route(
            "/search",
            post(move |Json(req): Json<serde_json::Value>| {
                let body = body.clone();
                async move {
                    assert_eq!(req["api_key"], "tvly-test");
                    (status, Json(body))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/search", addr)
    }

    fn settings(endpoint: String, max_results: u32) -> SearchSettings {
        SearchSettings {
            endpoint,
            max_results,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = WebSearchTool::new(" ", &SearchSettings::default(), "search");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_results_truncated_and_serialized() {
        let hits: Vec<_> = (0..8)
            .map(|i| {
                serde_json::json!({
                    "title": format!("t{}", i),
                    "url": format!("https://example.com/{}", i),
                    "content": format!("result {}", i),
                    "score": 0.5
                })
            })
            .collect();
        let endpoint = mock_server(
            axum::http::StatusCode::OK,
            serde_json::json!({ "query": "q", "results": hits }),
        )
        .await;

        let tool = WebSearchTool::new("tvly-test", &settings(endpoint, 6), "search").unwrap();
        let observation = tool.call(r#"{"query": "KDN"}"#).await.unwrap();

        let parsed: Vec<WebSearchResult> = serde_json::from_str(&observation).unwrap();
        assert_eq!(parsed.len(), 6);
        assert_eq!(parsed[0].url, "https://example.com/0");
        assert_eq!(parsed[5].content, "result 5");
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let endpoint = mock_server(
            axum::http::StatusCode::TOO_MANY_REQUESTS,
            serde_json::json!({ "detail": "quota" }),
        )
        .await;

        let tool = WebSearchTool::new("tvly-test", &settings(endpoint, 6), "search").unwrap();
        let err = tool.call(r#"{"query": "KDN"}"#).await.unwrap_err();
        assert!(matches!(err, HjelperError::Search(_)));
        assert!(err.to_string().contains("429"));
    }
}
