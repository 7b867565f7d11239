//! Okapi BM25 scoring over the shared index.
//!
//! ```text
//! idf(t)   = see IdfFormula
//! tf'(t,d) = tf * (k1 + 1) / (tf + k1 * (1 - b + b * |d| / avg|d|))
//! score(d) = Σ idf(t) * tf'(t,d)
//! ```
//!
//! `|d|` is the chunk's content length in characters, consistent with the
//! corpus average computed at indexing time.

use crate::index::{CorpusStatistics, DocumentRecord, SearchIndex};
use crate::query::QueryTerms;
use crate::result::{Evidence, ScoredCandidate, sort_candidates};
use log::debug;

pub struct Bm25Scorer<'a> {
    index: &'a SearchIndex,
}

impl<'a> Bm25Scorer<'a> {
    pub fn new(index: &'a SearchIndex) -> Self {
        Self { index }
    }

    /// Score every chunk containing at least one expanded query term
    pub fn score(&self, terms: &QueryTerms) -> Vec<ScoredCandidate> {
        let statistics = self.index.statistics();
        let mut candidates: Vec<ScoredCandidate> = self
            .index
            .candidates(&terms.expanded)
            .into_iter()
            .filter_map(|chunk_id| self.index.document(chunk_id))
            .map(|record| Self::score_document(record, &terms.expanded, statistics))
            .collect();

        sort_candidates(&mut candidates);
        debug!("BM25 scored {} chunks", candidates.len());
        candidates
    }

    fn score_document(
        record: &DocumentRecord,
        terms: &[String],
        statistics: &CorpusStatistics,
    ) -> ScoredCandidate {
        let average_length = if statistics.average_document_length > 0.0 {
            statistics.average_document_length
        } else {
            1.0
        };
        let length_ratio = record.content_length as f32 / average_length;
        let k1 = statistics.k1;
        let b = statistics.b;

        let contributions: Vec<(String, f32)> = terms
            .iter()
            .filter_map(|term| {
                let entry = record.term(term)?;
                let tf = entry.frequency as f32;
                let idf = statistics
                    .idf
                    .idf(statistics.total_document_count, entry.document_frequency);
                let tf_component = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio));
                Some((term.clone(), idf * tf_component))
            })
            .collect();

        let total = contributions.iter().map(|(_, score)| score).sum();
        ScoredCandidate::new(
            record.chunk_id.clone(),
            total,
            Evidence::Bm25 { contributions },
        )
    }
}
