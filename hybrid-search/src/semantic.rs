//! Boundary to the external vector-similarity provider.
//!
//! The provider is the only stage that does I/O. [`SemanticAdapter`] bounds it
//! with a timeout and turns every failure into an empty signal so that hybrid
//! search degrades to keyword + BM25 ranking instead of failing.

use crate::config::HybridSearchOptions;
use crate::error::{HybridSearchError, Result};
use crate::result::{Evidence, ScoredCandidate};
use async_trait::async_trait;
use codeseek_chunk_model::{Chunk, SearchFilter};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Parameters forwarded to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticRequest {
    pub max_results: usize,
    pub filters: Vec<SearchFilter>,
    pub min_score: f32,
}

/// One hit from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    pub chunk_id: String,
    pub score: f32,
    pub chunk: Option<Chunk>,
}

impl SemanticMatch {
    pub fn new(chunk_id: impl Into<String>, score: f32) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            score,
            chunk: None,
        }
    }
}

/// External vector-search provider
#[async_trait]
pub trait SemanticSearch: Send + Sync {
    async fn search(&self, query: &str, request: &SemanticRequest) -> Result<Vec<SemanticMatch>>;
}

/// Provider for deployments without an embedding backend
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSemanticSearch;

#[async_trait]
impl SemanticSearch for NoopSemanticSearch {
    async fn search(&self, _query: &str, _request: &SemanticRequest) -> Result<Vec<SemanticMatch>> {
        Ok(Vec::new())
    }
}

/// Normalized semantic signal for one query
#[derive(Debug, Clone, Default)]
pub struct SemanticOutcome {
    pub candidates: Vec<ScoredCandidate>,
    /// Chunk payloads returned by the provider, keyed by chunk id
    pub payloads: HashMap<String, Chunk>,
    /// Set when the provider failed or timed out
    pub error: Option<String>,
}

impl SemanticOutcome {
    fn degraded(error: &HybridSearchError) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

/// Timeout and failure isolation around a [`SemanticSearch`] provider
#[derive(Clone)]
pub struct SemanticAdapter {
    provider: Arc<dyn SemanticSearch>,
}

impl SemanticAdapter {
    pub fn new(provider: Arc<dyn SemanticSearch>) -> Self {
        Self { provider }
    }

    /// Query the provider, never failing.
    ///
    /// Requests `max_results * semantic_overfetch` hits with `threshold` as
    /// the minimum score; errors and timeouts yield an empty outcome.
    pub async fn search(&self, query: &str, options: &HybridSearchOptions) -> SemanticOutcome {
        let request = SemanticRequest {
            max_results: options.semantic_request_size(),
            filters: options.filters.clone(),
            min_score: options.threshold,
        };
        let timeout = Duration::from_millis(options.semantic_timeout_ms);

        let result = match tokio::time::timeout(timeout, self.provider.search(query, &request)).await
        {
            Ok(result) => result,
            Err(_) => Err(HybridSearchError::SemanticTimeout {
                timeout_ms: options.semantic_timeout_ms,
            }),
        };

        match result {
            Ok(matches) => {
                debug!("Semantic provider returned {} matches", matches.len());
                Self::into_outcome(matches)
            }
            Err(err) => {
                warn!("Semantic search unavailable, continuing without it: {err}");
                SemanticOutcome::degraded(&err)
            }
        }
    }

    /// Like [`SemanticAdapter::search`], but returns
    /// [`HybridSearchError::Cancelled`] as soon as `cancel` fires.
    pub async fn search_cancellable(
        &self,
        query: &str,
        options: &HybridSearchOptions,
        cancel: &CancellationToken,
    ) -> Result<SemanticOutcome> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(HybridSearchError::Cancelled),
            outcome = self.search(query, options) => Ok(outcome),
        }
    }

    fn into_outcome(matches: Vec<SemanticMatch>) -> SemanticOutcome {
        let mut outcome = SemanticOutcome::default();
        for found in matches {
            if !found.score.is_finite() {
                continue;
            }
            if let Some(chunk) = found.chunk {
                outcome.payloads.insert(found.chunk_id.clone(), chunk);
            }
            outcome.candidates.push(ScoredCandidate::new(
                found.chunk_id,
                found.score,
                Evidence::Semantic,
            ));
        }
        crate::result::sort_candidates(&mut outcome.candidates);
        outcome
    }
}
