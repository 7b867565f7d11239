use crate::result::{HybridResult, sort_results};
use log::debug;
use std::collections::HashSet;

/// Bonus for the first result of a category or framework
const NOVELTY_BONUS: f32 = 0.1;

/// Rewards the first result of each category and framework so the head of
/// the list is not dominated by chunks of one kind.
///
/// Results are visited in their current order; bonuses only add, so no score
/// ever decreases.
#[derive(Debug, Default)]
pub struct Diversifier {
    categories: HashSet<String>,
    frameworks: HashSet<String>,
}

impl Diversifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diversify(mut self, results: &mut [HybridResult]) {
        let mut rewarded = 0usize;
        for result in results.iter_mut() {
            let Some(chunk) = &result.chunk else {
                continue;
            };

            let mut bonus = 0.0;
            if self.categories.insert(chunk.metadata.category.clone()) {
                bonus += NOVELTY_BONUS;
            }
            let new_framework = chunk
                .metadata
                .framework
                .as_ref()
                .is_some_and(|framework| self.frameworks.insert(framework.clone()));
            if new_framework {
                bonus += NOVELTY_BONUS;
            }

            if bonus > 0.0 {
                result.diversity_bonus += bonus;
                result.combined_score += bonus;
                result.append_explanation(&format!("diversity +{bonus:.2}"));
                rewarded += 1;
            }
        }

        sort_results(results);
        debug!(
            "Diversification rewarded {rewarded} results across {} categories",
            self.categories.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeseek_chunk_model::{Chunk, ChunkMetadata};
    use pretty_assertions::assert_eq;

    fn result(id: &str, category: &str, framework: Option<&str>, score: f32) -> HybridResult {
        let mut metadata = ChunkMetadata::new(category);
        if let Some(framework) = framework {
            metadata = metadata.with_framework(framework);
        }
        HybridResult::new(id)
            .with_chunk(Chunk::with_metadata(id, "body", metadata))
            .with_combined_score(score)
    }

    #[test]
    fn test_first_seen_bonuses() {
        let mut results = vec![
            result("a", "function", Some("react"), 0.9),
            result("b", "function", Some("react"), 0.8),
            result("c", "class", Some("vue"), 0.7),
            result("d", "class", None, 0.6),
        ];

        Diversifier::new().diversify(&mut results);

        let bonuses: Vec<(&str, f32)> = results
            .iter()
            .map(|r| (r.chunk_id.as_str(), r.diversity_bonus))
            .collect();
        assert_eq!(bonuses, vec![("a", 0.2), ("c", 0.2), ("b", 0.0), ("d", 0.0)]);
    }

    #[test]
    fn test_scores_never_decrease() {
        let originals = vec![
            result("a", "function", None, 0.5),
            result("b", "function", None, 0.5),
            result("c", "module", Some("express"), 0.1),
        ];
        let mut results = originals.clone();

        Diversifier::new().diversify(&mut results);

        for before in &originals {
            let after = results
                .iter()
                .find(|r| r.chunk_id == before.chunk_id)
                .unwrap();
            assert!(after.combined_score >= before.combined_score);
        }
    }

    #[test]
    fn test_tie_keeps_earlier_result_first() {
        let mut results = vec![
            result("a", "function", None, 0.5),
            result("b", "class", None, 0.5),
        ];

        Diversifier::new().diversify(&mut results);

        assert_eq!(results[0].chunk_id, "a");
        assert_eq!(results[0].combined_score, results[1].combined_score);
    }

    #[test]
    fn test_results_without_payload_are_skipped() {
        let mut results = vec![HybridResult::new("bare").with_combined_score(0.3)];
        Diversifier::new().diversify(&mut results);
        assert_eq!(results[0].diversity_bonus, 0.0);
    }
}
