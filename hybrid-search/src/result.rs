use codeseek_chunk_model::Chunk;
use serde::{Deserialize, Serialize};

/// Why a scorer produced a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evidence {
    /// Returned by the semantic provider
    Semantic,
    /// Matched query terms and adjacent query phrases
    Keyword {
        terms: Vec<String>,
        phrases: Vec<String>,
    },
    /// Per-term BM25 contributions
    Bm25 { contributions: Vec<(String, f32)> },
}

/// Raw, unnormalized output of a single scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub chunk_id: String,
    pub raw_score: f32,
    pub evidence: Evidence,
}

impl ScoredCandidate {
    pub fn new(chunk_id: impl Into<String>, raw_score: f32, evidence: Evidence) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            raw_score,
            evidence,
        }
    }
}

/// Sort candidates by score, descending, keeping ties in input order
pub(crate) fn sort_candidates(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));
}

/// A fused search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridResult {
    pub chunk_id: String,

    /// Chunk payload, when the index or the semantic provider has it
    pub chunk: Option<Chunk>,

    /// Normalized signal scores in [0.0, 1.0]
    pub semantic_score: f32,
    pub keyword_score: f32,
    pub bm25_score: f32,

    /// Weighted sum of the signals plus any post-fusion boosts
    pub combined_score: f32,

    pub matching_keywords: Vec<String>,
    pub matching_phrases: Vec<String>,

    /// Additive boost from importance, recency and filter alignment
    pub context_relevance: f32,

    /// Additive boost from diversification
    pub diversity_bonus: f32,

    pub explanation: String,
}

impl HybridResult {
    pub fn new(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            chunk: None,
            semantic_score: 0.0,
            keyword_score: 0.0,
            bm25_score: 0.0,
            combined_score: 0.0,
            matching_keywords: Vec::new(),
            matching_phrases: Vec::new(),
            context_relevance: 0.0,
            diversity_bonus: 0.0,
            explanation: String::new(),
        }
    }

    pub fn with_chunk(mut self, chunk: Chunk) -> Self {
        self.chunk = Some(chunk);
        self
    }

    pub fn with_combined_score(mut self, score: f32) -> Self {
        self.combined_score = score;
        self
    }

    pub(crate) fn append_explanation(&mut self, note: &str) {
        if self.explanation.is_empty() {
            self.explanation.push_str(note);
        } else {
            self.explanation.push_str("; ");
            self.explanation.push_str(note);
        }
    }
}

/// Sort results by combined score, descending, keeping ties in input order
pub(crate) fn sort_results(results: &mut [HybridResult]) {
    results.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));
}

/// Per-query timings and counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total_time_ms: u64,
    pub semantic_time_ms: u64,
    pub keyword_time_ms: u64,
    pub bm25_time_ms: u64,
    pub fusion_time_ms: u64,
    /// Reranking, diversification and contextual boosting
    pub post_process_time_ms: u64,

    pub semantic_count: usize,
    pub keyword_count: usize,
    pub bm25_count: usize,

    /// Number of query terms after expansion
    pub expanded_terms: usize,

    /// The semantic provider failed or timed out
    pub semantic_degraded: bool,
    pub semantic_error: Option<String>,
}

/// Ordered results of one hybrid query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSearchResults {
    pub query: String,
    pub results: Vec<HybridResult>,
    pub stats: SearchStats,
}

impl HybridSearchResults {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    pub fn with_results(mut self, results: Vec<HybridResult>) -> Self {
        self.results = results;
        self
    }

    pub fn with_stats(mut self, stats: SearchStats) -> Self {
        self.stats = stats;
        self
    }

    /// Get top N results
    pub fn top(&self, n: usize) -> &[HybridResult] {
        &self.results[..n.min(self.results.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn chunk_ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .map(|result| result.chunk_id.as_str())
            .collect()
    }
}
