use crate::config::HybridSearchOptions;
use crate::result::{Evidence, HybridResult, ScoredCandidate, sort_results};
use indexmap::IndexMap;
use log::debug;

/// Weights applied to the normalized signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWeights {
    pub semantic: f32,
    pub keyword: f32,
    pub bm25: f32,
}

impl From<&HybridSearchOptions> for SignalWeights {
    fn from(options: &HybridSearchOptions) -> Self {
        Self {
            semantic: options.semantic_weight,
            keyword: options.keyword_weight,
            bm25: options.bm25_weight,
        }
    }
}

/// Divide each score by the list maximum.
///
/// An empty list or a non-positive maximum falls back to a divisor of 1;
/// results are clamped to [0, 1] so suppressed (negative) scores read as 0.
pub fn normalize(candidates: &[ScoredCandidate]) -> Vec<f32> {
    let max = candidates
        .iter()
        .map(|candidate| candidate.raw_score)
        .fold(f32::NEG_INFINITY, f32::max);
    let divisor = if max.is_finite() && max > 0.0 { max } else { 1.0 };
    candidates
        .iter()
        .map(|candidate| (candidate.raw_score / divisor).clamp(0.0, 1.0))
        .collect()
}

/// Weighted-sum fusion of the three signals
pub struct FusionEngine {
    weights: SignalWeights,
}

impl FusionEngine {
    pub fn new(weights: SignalWeights) -> Self {
        Self { weights }
    }

    /// Merge the three lists by chunk id.
    ///
    /// A chunk missing from a list scores 0 for that signal. First-seen order
    /// (semantic, keyword, BM25) breaks ties in the final stable sort.
    pub fn fuse(
        &self,
        semantic: &[ScoredCandidate],
        keyword: &[ScoredCandidate],
        bm25: &[ScoredCandidate],
    ) -> Vec<HybridResult> {
        debug!(
            "Fusing {} semantic + {} keyword + {} bm25 candidates",
            semantic.len(),
            keyword.len(),
            bm25.len()
        );

        let mut merged: IndexMap<String, HybridResult> = IndexMap::new();

        for (candidate, score) in semantic.iter().zip(normalize(semantic)) {
            Self::entry(&mut merged, candidate).semantic_score = score;
        }

        for (candidate, score) in keyword.iter().zip(normalize(keyword)) {
            let result = Self::entry(&mut merged, candidate);
            result.keyword_score = score;
            if let Evidence::Keyword { terms, phrases } = &candidate.evidence {
                result.matching_keywords = terms.clone();
                result.matching_phrases = phrases.clone();
            }
        }

        for (candidate, score) in bm25.iter().zip(normalize(bm25)) {
            Self::entry(&mut merged, candidate).bm25_score = score;
        }

        let mut results: Vec<HybridResult> = merged
            .into_values()
            .map(|mut result| {
                result.combined_score = result.semantic_score * self.weights.semantic
                    + result.keyword_score * self.weights.keyword
                    + result.bm25_score * self.weights.bm25;
                result.explanation = explain(&result);
                result
            })
            .collect();

        sort_results(&mut results);
        results
    }

    fn entry<'m>(
        merged: &'m mut IndexMap<String, HybridResult>,
        candidate: &ScoredCandidate,
    ) -> &'m mut HybridResult {
        merged
            .entry(candidate.chunk_id.clone())
            .or_insert_with(|| HybridResult::new(candidate.chunk_id.clone()))
    }
}

fn explain(result: &HybridResult) -> String {
    let mut parts = Vec::new();
    if result.semantic_score > 0.0 {
        parts.push(format!("semantic={:.2}", result.semantic_score));
    }
    if result.keyword_score > 0.0 {
        if result.matching_keywords.is_empty() {
            parts.push(format!("keyword={:.2}", result.keyword_score));
        } else {
            parts.push(format!(
                "keyword={:.2} ({})",
                result.keyword_score,
                result.matching_keywords.join(", ")
            ));
        }
    }
    if !result.matching_phrases.is_empty() {
        parts.push(format!("phrases: {}", result.matching_phrases.join(", ")));
    }
    if result.bm25_score > 0.0 {
        parts.push(format!("bm25={:.2}", result.bm25_score));
    }
    if parts.is_empty() {
        "no positive signal".to_string()
    } else {
        parts.join(", ")
    }
}
