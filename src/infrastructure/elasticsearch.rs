// Elasticsearch search client implementation
use crate::application::search_client::SearchClient;
use crate::domain::search::{SearchRequest, SearchResponse};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to send request to {url}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("search backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("failed to parse search backend response")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ElasticsearchClient {
    host: String,
    client: reqwest::Client,
}

impl ElasticsearchClient {
    pub fn new(host: String) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn indices_url(&self, indices: &[String], endpoint: &str) -> String {
        let path = indices
            .iter()
            .map(|index| urlencoding::encode(index).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        format!("{}/{}/{}", self.host, path, endpoint)
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Response, SearchError> {
        request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| SearchError::Transport {
                url: url.to_string(),
                source,
            })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SearchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(SearchError::Status { status, body })
    }
}

#[async_trait]
impl SearchClient for ElasticsearchClient {
    async fn existing_indices(&self, candidates: &[String]) -> Result<Vec<String>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.indices_url(candidates, "_aliases?ignore_unavailable=true");
        let response = self.send(self.client.get(&url), &url).await?;

        // None of the candidates exist
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let known = Self::check_status(response)
            .await?
            .json::<Map<String, Value>>()
            .await
            .map_err(SearchError::Decode)?;

        Ok(candidates
            .iter()
            .filter(|index| known.contains_key(index.as_str()))
            .cloned()
            .collect())
    }

    async fn search(&self, indices: &[String], request: &SearchRequest) -> Result<SearchResponse> {
        let url = self.indices_url(indices, "_search");
        let body = request.to_body();
        tracing::debug!("Executing search on {}: {}", url, body);

        let response = self.send(self.client.post(&url).json(&body), &url).await?;
        let data = Self::check_status(response)
            .await?
            .json::<SearchResponse>()
            .await
            .map_err(SearchError::Decode)?;

        tracing::debug!("Search returned {} facets", data.facets.len());
        Ok(data)
    }
}
