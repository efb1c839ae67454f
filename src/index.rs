//! Vector index client.
//!
//! Thin HTTP client for an external vector database speaking the Qdrant
//! REST dialect at the configured host and port. Only the two capabilities
//! the pipeline needs are exposed: upsert and filtered top-k search. Index
//! internals (ANN structures, persistence) belong to the service.

use anyhow::{bail, Result};
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

use crate::config::IndexConfig;
use crate::models::{DocChunk, ScoredChunk};

/// Client for one collection of an external vector database.
pub struct VectorIndex {
    base_url: String,
    collection: String,
    client: reqwest::Client,
}

impl VectorIndex {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: format!("http://{}:{}", config.host, config.port),
            collection: config.collection.clone(),
            client,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Create the collection if it does not exist yet, along with the
    /// full-text payload index on `source` that filtered searches need.
    /// Idempotent.
    pub async fn ensure_collection(&self, dims: usize) -> Result<()> {
        let url = format!("{}/collections/{}", self.base_url, self.collection);

        let exists = self.client.get(&url).send().await?;
        if !exists.status().is_success() {
            let body = serde_json::json!({
                "vectors": { "size": dims, "distance": "Cosine" },
            });

            let response = self.client.put(&url).json(&body).send().await?;
            let status = response.status();
            if !status.is_success() {
                let body_text = response.text().await.unwrap_or_default();
                bail!(
                    "Failed to create collection '{}' ({}): {}",
                    self.collection,
                    status,
                    body_text
                );
            }
        }

        self.ensure_source_index().await
    }

    /// Text match filters reject payload fields without a full-text index,
    /// so `source` gets one up front. Re-running against a collection that
    /// already has the index is accepted.
    async fn ensure_source_index(&self) -> Result<()> {
        let url = format!(
            "{}/collections/{}/index?wait=true",
            self.base_url, self.collection
        );

        let response = self
            .client
            .put(&url)
            .json(&build_source_index_body())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            if !body_text.contains("already exists") {
                bail!(
                    "Failed to create 'source' payload index ({}): {}",
                    status,
                    body_text
                );
            }
        }

        Ok(())
    }

    /// Upsert one point per chunk, carrying the chunk text and source path
    /// as payload. `chunks` and `vectors` must be the same length.
    pub async fn upsert(&self, chunks: &[DocChunk], vectors: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != vectors.len() {
            bail!(
                "Chunk/vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            );
        }
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<serde_json::Value> = chunks
            .iter()
            .zip(vectors.iter())
            .map(|(chunk, vector)| {
                serde_json::json!({
                    "id": point_id(chunk).to_string(),
                    "vector": vector,
                    "payload": { "text": chunk.text, "source": chunk.source },
                })
            })
            .collect();

        let url = format!(
            "{}/collections/{}/points?wait=true",
            self.base_url, self.collection
        );
        let body = serde_json::json!({ "points": points });

        let response = self.client.put(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Vector upsert failed ({}): {}", status, body_text);
        }

        Ok(())
    }

    /// Top-k similarity search, optionally filtered to sources containing
    /// `source_filter`. Returns at most `k` scored chunks, best first.
    pub async fn search(
        &self,
        vector: &[f32],
        source_filter: Option<&str>,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let url = format!(
            "{}/collections/{}/points/search",
            self.base_url, self.collection
        );
        let body = build_search_body(vector, source_filter, k);

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Vector search failed ({}): {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let mut results = parse_search_results(&json)?;
        results.truncate(k);
        Ok(results)
    }
}

/// Deterministic point id derived from the chunk's source and text, so
/// re-ingesting the same documents on restart overwrites instead of
/// duplicating.
fn point_id(chunk: &DocChunk) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(chunk.source.as_bytes());
    hasher.update([0]);
    hasher.update(chunk.text.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

fn build_source_index_body() -> serde_json::Value {
    serde_json::json!({
        "field_name": "source",
        "field_schema": "text",
    })
}

fn build_search_body(
    vector: &[f32],
    source_filter: Option<&str>,
    k: usize,
) -> serde_json::Value {
    let mut body = serde_json::json!({
        "vector": vector,
        "limit": k,
        "with_payload": true,
    });

    if let Some(needle) = source_filter {
        body["filter"] = serde_json::json!({
            "must": [{ "key": "source", "match": { "text": needle } }],
        });
    }

    body
}

fn parse_search_results(json: &serde_json::Value) -> Result<Vec<ScoredChunk>> {
    let hits = json
        .get("result")
        .and_then(|r| r.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid search response: missing result array"))?;

    let mut results = Vec::with_capacity(hits.len());

    for hit in hits {
        let payload = hit
            .get("payload")
            .ok_or_else(|| anyhow::anyhow!("Invalid search response: missing payload"))?;
        let text = payload
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or_default()
            .to_string();
        let source = payload
            .get("source")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();
        let score = hit.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0) as f32;

        results.push(ScoredChunk {
            chunk: DocChunk { text, source },
            score,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_deterministic() {
        let chunk = DocChunk {
            text: "The sky is blue.".to_string(),
            source: "notes.txt".to_string(),
        };
        assert_eq!(point_id(&chunk), point_id(&chunk.clone()));

        let other = DocChunk {
            text: "The sky is blue.".to_string(),
            source: "other.txt".to_string(),
        };
        assert_ne!(point_id(&chunk), point_id(&other));
    }

    #[test]
    fn test_source_index_body_is_full_text() {
        // The text-match filter in search bodies only works against a
        // full-text payload index on the same field
        let body = build_source_index_body();
        assert_eq!(body["field_name"], "source");
        assert_eq!(body["field_schema"], "text");
        let search = build_search_body(&[0.1], Some("projects"), 4);
        assert_eq!(
            search["filter"]["must"][0]["key"],
            body["field_name"]
        );
    }

    #[test]
    fn test_search_body_without_filter() {
        let body = build_search_body(&[0.1, 0.2], None, 4);
        assert_eq!(body["limit"], 4);
        assert_eq!(body["with_payload"], true);
        assert!(body.get("filter").is_none());
    }

    #[test]
    fn test_search_body_with_source_filter() {
        let body = build_search_body(&[0.1], Some("projects"), 2);
        assert_eq!(body["filter"]["must"][0]["key"], "source");
        assert_eq!(body["filter"]["must"][0]["match"]["text"], "projects");
    }

    #[test]
    fn test_parse_search_results() {
        let json = serde_json::json!({
            "result": [
                { "id": "a", "score": 0.91, "payload": { "text": "The sky is blue.", "source": "notes.txt" } },
                { "id": "b", "score": 0.42, "payload": { "text": "Grass is green.", "source": "sub/other.md" } },
            ]
        });
        let results = parse_search_results(&json).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.source, "notes.txt");
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_parse_search_results_invalid() {
        assert!(parse_search_results(&serde_json::json!({})).is_err());
    }
}
