use crate::query::QueryTerms;
use crate::result::{HybridResult, sort_results};
use crate::tokenizer::tokenize;
use codeseek_chunk_model::Chunk;
use log::debug;
use std::collections::HashSet;
use std::ops::RangeInclusive;

const DENSITY_FACTOR: f32 = 0.2;
const MAX_QUALITY_BOOST: f32 = 0.2;

const SWEET_SPOT: RangeInclusive<usize> = 100..=2000;
const SWEET_SPOT_BOOST: f32 = 0.05;

const STRUCTURAL_KEYWORDS: &[&str] = &["function", "class"];
const STRUCTURAL_BOOST: f32 = 0.05;

const COMMENT_MARKERS: &[&str] = &["//", "/*", "#"];
const COMMENT_BOOST: f32 = 0.03;

/// Second pass over fused results using the chunk payload.
///
/// Results without a payload are left untouched.
pub struct RerankEngine<'q> {
    query_terms: HashSet<&'q str>,
}

impl<'q> RerankEngine<'q> {
    pub fn new(terms: &'q QueryTerms) -> Self {
        Self {
            query_terms: terms.original_set(),
        }
    }

    pub fn rerank(&self, results: &mut [HybridResult]) {
        let mut adjusted = 0usize;
        for result in results.iter_mut() {
            let Some(chunk) = &result.chunk else {
                continue;
            };
            let density = self.term_density(chunk);
            let quality = quality_boost(chunk);
            let factor = (1.0 + density * DENSITY_FACTOR) * (1.0 + quality);
            if factor == 1.0 {
                continue;
            }

            result.combined_score *= factor;
            result.append_explanation(&format!(
                "rerank x{factor:.3} (density={density:.2}, quality={quality:.2})"
            ));
            adjusted += 1;
        }

        sort_results(results);
        debug!("Reranked {adjusted} of {} results", results.len());
    }

    /// Fraction of chunk tokens that are original query terms
    fn term_density(&self, chunk: &Chunk) -> f32 {
        let tokens = tokenize(&chunk.content);
        if tokens.is_empty() {
            return 0.0;
        }
        let hits = tokens
            .iter()
            .filter(|token| self.query_terms.contains(token.as_str()))
            .count();
        hits as f32 / tokens.len() as f32
    }
}

fn quality_boost(chunk: &Chunk) -> f32 {
    let mut boost = 0.0;

    if SWEET_SPOT.contains(&chunk.content_length()) {
        boost += SWEET_SPOT_BOOST;
    }

    let lowered = chunk.content.to_lowercase();
    if STRUCTURAL_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        boost += STRUCTURAL_BOOST;
    }

    if COMMENT_MARKERS
        .iter()
        .any(|marker| chunk.content.contains(marker))
    {
        boost += COMMENT_BOOST;
    }

    f32::min(boost, MAX_QUALITY_BOOST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(id: &str, content: &str, score: f32) -> HybridResult {
        HybridResult::new(id)
            .with_chunk(Chunk::new(id, content))
            .with_combined_score(score)
    }

    #[test]
    fn test_quality_boost_components() {
        assert_eq!(quality_boost(&Chunk::new("a", "x = 1")), 0.0);
        assert_eq!(quality_boost(&Chunk::new("a", "class A {}")), 0.05);
        assert_eq!(quality_boost(&Chunk::new("a", "# note")), 0.03);

        let long = format!("function f() {{}} // {}", "a".repeat(120));
        assert!((quality_boost(&Chunk::new("a", long)) - 0.13).abs() < 1e-6);
    }

    #[test]
    fn test_density_multiplier() {
        let terms = QueryTerms::parse("alpha");
        let mut results = vec![result("a", "alpha beta gamma delta", 1.0)];

        RerankEngine::new(&terms).rerank(&mut results);

        // 1/4 of tokens match, no quality signals
        assert!((results[0].combined_score - 1.05).abs() < 1e-6);
        assert!(results[0].explanation.starts_with("rerank x1.050"));
    }

    #[test]
    fn test_results_without_payload_are_untouched() {
        let terms = QueryTerms::parse("alpha");
        let mut results = vec![HybridResult::new("bare").with_combined_score(0.7)];

        RerankEngine::new(&terms).rerank(&mut results);

        assert_eq!(results[0].combined_score, 0.7);
        assert!(results[0].explanation.is_empty());
    }

    #[test]
    fn test_rerank_reorders() {
        let terms = QueryTerms::parse("user");
        let mut results = vec![
            result("plain", "x y z w", 0.50),
            result("dense", "user user other", 0.48),
        ];

        RerankEngine::new(&terms).rerank(&mut results);

        assert_eq!(results[0].chunk_id, "dense");
        assert!(results[0].combined_score > 0.5);
    }
}
