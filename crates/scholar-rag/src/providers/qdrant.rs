//! Qdrant vector store over its HTTP API
//!
//! The vector database stays an external service; this client covers the
//! collection lifecycle, batched upserts, scored search, and filtered
//! deletes the pipeline needs.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::config::QdrantConfig;
use crate::error::{Error, Result};
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Qdrant REST client scoped to a single collection
pub struct QdrantStore {
    http: reqwest::Client,
    base_url: String,
    collection: String,
    dimensions: usize,
    upsert_batch_size: usize,
}

impl QdrantStore {
    /// Create a new store from configuration
    pub fn new(config: &QdrantConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            collection: config.collection.clone(),
            dimensions: config.dimensions,
            upsert_batch_size: config.upsert_batch_size.max(1),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    /// The collection this store writes to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    async fn check_response(response: reqwest::Response, what: &str) -> Result<serde_json::Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::VectorDb(format!("{} failed ({}): {}", what, status, body)));
        }
        response
            .json()
            .await
            .map_err(|e| Error::VectorDb(format!("{}: invalid response: {}", what, e)))
    }

    fn document_filter_json(document_filter: Option<&[Uuid]>) -> Option<serde_json::Value> {
        document_filter.map(|ids| {
            json!({
                "must": [{
                    "key": "document_id",
                    "match": {
                        "any": ids.iter().map(|id| id.to_string()).collect::<Vec<_>>()
                    }
                }]
            })
        })
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantStore {
    async fn ensure_collection(&self) -> Result<()> {
        if self.collection_exists().await? {
            return Ok(());
        }

        tracing::info!(
            "Creating Qdrant collection '{}' ({} dimensions, cosine)",
            self.collection,
            self.dimensions
        );

        let body = json!({
            "vectors": {
                "size": self.dimensions,
                "distance": "Cosine"
            }
        });

        let response = self
            .http
            .put(self.collection_url())
            .json(&body)
            .send()
            .await?;

        Self::check_response(response, "Create collection").await?;
        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool> {
        let response = self.http.get(self.collection_url()).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::VectorDb(format!(
                    "Collection check failed ({}): {}",
                    status, body
                )))
            }
        }
    }

    async fn reset(&self) -> Result<()> {
        if self.collection_exists().await? {
            let response = self.http.delete(self.collection_url()).send().await?;
            Self::check_response(response, "Delete collection").await?;
            tracing::info!("Deleted Qdrant collection '{}'", self.collection);
        }
        self.ensure_collection().await
    }

    async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        for batch in chunks.chunks(self.upsert_batch_size) {
            let points: Vec<serde_json::Value> = batch
                .iter()
                .map(|chunk| {
                    if chunk.embedding.is_empty() {
                        return Err(Error::VectorDb(format!(
                            "Chunk {} has no embedding",
                            chunk.id
                        )));
                    }
                    Ok(json!({
                        "id": chunk.id.to_string(),
                        "vector": chunk.embedding,
                        "payload": chunk.to_payload(),
                    }))
                })
                .collect::<Result<_>>()?;

            let body = json!({ "points": points });
            let url = format!("{}/points?wait=true", self.collection_url());

            let response = self.http.put(&url).json(&body).send().await?;
            Self::check_response(response, "Upsert points").await?;

            tracing::debug!("Upserted {} points into '{}'", batch.len(), self.collection);
        }
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
        with_vectors: bool,
        document_filter: Option<&[Uuid]>,
    ) -> Result<Vec<VectorSearchResult>> {
        let mut body = json!({
            "vector": query_embedding,
            "limit": limit,
            "with_payload": true,
            "with_vector": with_vectors,
        });

        if let Some(filter) = Self::document_filter_json(document_filter) {
            body["filter"] = filter;
        }

        let url = format!("{}/points/search", self.collection_url());
        let response = self.http.post(&url).json(&body).send().await?;
        let value = Self::check_response(response, "Search").await?;

        let hits = value
            .get("result")
            .and_then(|r| r.as_array())
            .cloned()
            .unwrap_or_default();

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            let id = hit
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();

            let similarity = hit
                .get("score")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0) as f32;

            let payload: HashMap<String, serde_json::Value> = hit
                .get("payload")
                .and_then(|p| p.as_object())
                .map(|obj| obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default();

            let vector = hit.get("vector").and_then(|v| v.as_array()).map(|values| {
                values
                    .iter()
                    .filter_map(|x| x.as_f64())
                    .map(|x| x as f32)
                    .collect()
            });

            results.push(VectorSearchResult {
                chunk: Chunk::from_payload(&id, &payload),
                similarity,
                vector,
            });
        }

        Ok(results)
    }

    async fn delete_by_document(&self, document_id: &Uuid) -> Result<()> {
        let body = json!({
            "filter": {
                "must": [{
                    "key": "document_id",
                    "match": { "value": document_id.to_string() }
                }]
            }
        });

        let url = format!("{}/points/delete?wait=true", self.collection_url());
        let response = self.http.post(&url).json(&body).send().await?;
        Self::check_response(response, "Delete points").await?;

        tracing::info!(
            "Deleted chunks for document {} from '{}'",
            document_id,
            self.collection
        );
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        let body = json!({ "exact": true });
        let url = format!("{}/points/count", self.collection_url());

        let response = self.http.post(&url).json(&body).send().await?;
        let value = Self::check_response(response, "Count").await?;

        Ok(value
            .get("result")
            .and_then(|r| r.get("count"))
            .and_then(|c| c.as_u64())
            .unwrap_or(0) as usize)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/readyz", self.base_url);
        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_filter_uses_any_match() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let filter = QdrantStore::document_filter_json(Some(&ids)).unwrap();

        let any = &filter["must"][0]["match"]["any"];
        assert_eq!(any.as_array().unwrap().len(), 2);
        assert_eq!(filter["must"][0]["key"], "document_id");

        assert!(QdrantStore::document_filter_json(None).is_none());
    }

    #[test]
    fn store_normalizes_base_url() {
        let config = QdrantConfig {
            url: "http://localhost:6333/".to_string(),
            ..Default::default()
        };
        let store = QdrantStore::new(&config).unwrap();
        assert_eq!(store.collection_url(), "http://localhost:6333/collections/cs_textbooks");
    }
}
