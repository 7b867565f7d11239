use crate::index::SearchIndex;
use crate::query::QueryTerms;
use crate::result::{Evidence, ScoredCandidate, sort_candidates};
use log::debug;

/// Position boost for a term whose occurrences average at token 0
const MAX_POSITION_BOOST: f32 = 0.2;

/// Bonus per adjacent query-term pair found as a phrase in the chunk
const PHRASE_BONUS: f32 = 0.1;

/// Term-density keyword scorer over an index snapshot
pub struct KeywordScorer<'a> {
    index: &'a SearchIndex,
}

impl<'a> KeywordScorer<'a> {
    pub fn new(index: &'a SearchIndex) -> Self {
        Self { index }
    }

    /// Score every chunk containing at least one expanded query term.
    ///
    /// Each matched term adds `tf / total_terms * (1 + position_boost)`; each
    /// adjacent pair of original query terms present in the phrase index for
    /// the chunk adds a flat bonus.
    pub fn score(&self, terms: &QueryTerms) -> Vec<ScoredCandidate> {
        let pairs = terms.adjacent_pairs();
        let mut candidates: Vec<ScoredCandidate> = self
            .index
            .candidates(&terms.expanded)
            .into_iter()
            .filter_map(|chunk_id| self.score_chunk(chunk_id, terms, &pairs))
            .collect();

        sort_candidates(&mut candidates);
        debug!(
            "Keyword scoring matched {} chunks for {} terms",
            candidates.len(),
            terms.expanded.len()
        );
        candidates
    }

    fn score_chunk(
        &self,
        chunk_id: &str,
        terms: &QueryTerms,
        pairs: &[String],
    ) -> Option<ScoredCandidate> {
        let record = self.index.document(chunk_id)?;
        if record.total_term_count == 0 {
            return None;
        }
        let total = record.total_term_count as f32;

        let mut score = 0.0;
        let mut matched = Vec::new();
        for term in &terms.expanded {
            let Some(entry) = record.term(term) else {
                continue;
            };
            let density = entry.frequency as f32 / total;
            let position_boost = MAX_POSITION_BOOST * (1.0 - entry.average_position() / total);
            score += density * (1.0 + position_boost);
            matched.push(term.clone());
        }

        let phrases: Vec<String> = pairs
            .iter()
            .filter(|phrase| {
                self.index
                    .phrase_postings(phrase)
                    .is_some_and(|postings| postings.contains(chunk_id))
            })
            .cloned()
            .collect();
        score += PHRASE_BONUS * phrases.len() as f32;

        if matched.is_empty() {
            return None;
        }

        Some(ScoredCandidate::new(
            chunk_id,
            score,
            Evidence::Keyword {
                terms: matched,
                phrases,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::CorpusStatistics;
    use codeseek_chunk_model::Chunk;
    use pretty_assertions::assert_eq;

    fn build(chunks: Vec<Chunk>) -> SearchIndex {
        SearchIndex::build(chunks, CorpusStatistics::default())
    }

    #[test]
    fn test_density_and_position() {
        let index = build(vec![Chunk::new("a", "alpha beta gamma delta")]);
        let candidates = KeywordScorer::new(&index).score(&QueryTerms::parse("alpha"));

        assert_eq!(candidates.len(), 1);
        // 1/4 * (1 + 0.2 * (1 - 0/4))
        assert!((candidates[0].raw_score - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_earlier_terms_score_higher() {
        let index = build(vec![
            Chunk::new("late", "one two three target"),
            Chunk::new("early", "target one two three"),
        ]);
        let candidates = KeywordScorer::new(&index).score(&QueryTerms::parse("target"));
        assert_eq!(candidates[0].chunk_id, "early");
        assert_eq!(candidates[1].chunk_id, "late");
        assert!(candidates[0].raw_score > candidates[1].raw_score);
    }

    #[test]
    fn test_phrase_bonus() {
        let index = build(vec![
            Chunk::new("apart", "user data loaded from service"),
            Chunk::new("together", "user service loaded from data"),
        ]);
        let candidates = KeywordScorer::new(&index).score(&QueryTerms::parse("user service"));

        assert_eq!(candidates[0].chunk_id, "together");
        match &candidates[0].evidence {
            Evidence::Keyword { terms, phrases } => {
                assert_eq!(terms, &vec!["user".to_string(), "service".to_string()]);
                assert_eq!(phrases, &vec!["user service".to_string()]);
            }
            other => panic!("unexpected evidence {other:?}"),
        }
        let gap = candidates[0].raw_score - candidates[1].raw_score;
        assert!(gap > 0.09);
    }

    #[test]
    fn test_no_matches_is_empty() {
        let index = build(vec![Chunk::new("a", "const x = 5;")]);
        let candidates = KeywordScorer::new(&index).score(&QueryTerms::parse("getUser"));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_expanded_terms_are_scored() {
        let index = build(vec![Chunk::new("a", "fetch the record")]);
        let mut terms = QueryTerms::parse("get");
        terms.expanded.push("fetch".to_string());

        let candidates = KeywordScorer::new(&index).score(&terms);
        assert_eq!(candidates.len(), 1);
    }
}
