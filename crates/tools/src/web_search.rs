//! Web search tool — stub that returns mock search results.
//!
//! In production this would call a real search API. The stub returns
//! deterministic results so the reasoning loop can be tested end-to-end
//! without network access; the tool still declares `requires_network` so
//! the registry's offline filter applies to it.

use async_trait::async_trait;
use vesper_core::error::ToolError;
use vesper_core::tool::{Tool, ToolOutput};

pub struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns result titles, URLs, and snippets."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default 3)",
                    "default": 3
                }
            },
            "required": ["query"]
        })
    }

    fn requires_network(&self) -> bool {
        true
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let query = arguments["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let num_results = arguments["num_results"].as_u64().unwrap_or(3).min(5) as usize;
        let results = generate_mock_results(query, num_results);
        let output = serde_json::to_string_pretty(&results).unwrap_or_default();

        Ok(ToolOutput::ok_with_data(
            output,
            serde_json::to_value(&results).unwrap_or_default(),
        ))
    }
}

#[derive(serde::Serialize)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

/// Generate deterministic mock results based on the query.
fn generate_mock_results(query: &str, count: usize) -> Vec<SearchResult> {
    (1..=count)
        .map(|i| SearchResult {
            title: format!("Result {i} for '{query}'"),
            url: format!(
                "https://example.com/search/{}/{i}",
                query.to_lowercase().replace(' ', "-")
            ),
            snippet: format!("A relevant snippet about {query} (result {i})."),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_requested_result_count() {
        let tool = WebSearchTool;
        let result = tool
            .execute(serde_json::json!({"query": "rust agents", "num_results": 2}))
            .await
            .unwrap();
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let tool = WebSearchTool;
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn declares_network_requirement() {
        assert!(WebSearchTool.requires_network());
    }
}
