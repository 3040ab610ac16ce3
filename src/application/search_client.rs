// Search client trait for the statistics backend
use crate::domain::search::{SearchRequest, SearchResponse};
use async_trait::async_trait;

#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Of the candidate index names, those that exist on the backend
    async fn existing_indices(&self, candidates: &[String]) -> anyhow::Result<Vec<String>>;

    /// Run a facet request against the given indices
    async fn search(&self, indices: &[String], request: &SearchRequest) -> anyhow::Result<SearchResponse>;
}
