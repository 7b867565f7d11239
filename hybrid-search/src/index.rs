//! In-memory document index: per-chunk term tables, the inverted index, the
//! phrase index and corpus statistics.
//!
//! A [`SearchIndex`] is built wholesale from a chunk list in two sequential
//! phases. Phase one records local term frequencies and positions per chunk;
//! phase two links the postings and writes each term's document frequency back
//! into every record containing it. Once built, the index is only read.

use crate::config::{Bm25ParametersUpdate, DEFAULT_B, DEFAULT_K1, IdfFormula};
use crate::tokenizer::{extract_keywords, extract_phrases, tokenize};
use codeseek_chunk_model::Chunk;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Occurrences of one term inside one chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermEntry {
    pub term: String,

    /// Occurrences in this chunk
    pub frequency: usize,

    /// Chunks in the corpus containing the term; filled in by phase two
    pub document_frequency: usize,

    /// Token ordinals, ascending
    pub positions: Vec<usize>,
}

impl TermEntry {
    /// Mean token ordinal of the term's occurrences
    pub fn average_position(&self) -> f32 {
        if self.positions.is_empty() {
            return 0.0;
        }
        self.positions.iter().sum::<usize>() as f32 / self.positions.len() as f32
    }
}

/// Indexed view of a single chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub chunk_id: String,
    pub terms: HashMap<String, TermEntry>,
    pub total_term_count: usize,
    pub unique_term_count: usize,
    /// Content length in characters
    pub content_length: usize,
    pub keywords: IndexSet<String>,
    pub phrases: IndexSet<String>,
}

impl DocumentRecord {
    /// Phase one: local statistics only, document frequencies left at zero
    pub fn from_chunk(chunk: &Chunk) -> Self {
        let tokens = tokenize(&chunk.content);
        let mut terms: HashMap<String, TermEntry> = HashMap::new();
        for (position, token) in tokens.iter().enumerate() {
            let entry = terms.entry(token.clone()).or_insert_with(|| TermEntry {
                term: token.clone(),
                frequency: 0,
                document_frequency: 0,
                positions: Vec::new(),
            });
            entry.frequency += 1;
            entry.positions.push(position);
        }

        Self {
            chunk_id: chunk.id.clone(),
            total_term_count: tokens.len(),
            unique_term_count: terms.len(),
            content_length: chunk.content_length(),
            keywords: extract_keywords(&chunk.content),
            phrases: extract_phrases(&tokens),
            terms,
        }
    }

    pub fn term(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }
}

/// Corpus-wide values consumed by the BM25 scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusStatistics {
    /// Mean chunk content length in characters
    pub average_document_length: f32,
    pub total_document_count: usize,
    pub k1: f32,
    pub b: f32,
    pub idf: IdfFormula,
}

impl Default for CorpusStatistics {
    fn default() -> Self {
        Self {
            average_document_length: 0.0,
            total_document_count: 0,
            k1: DEFAULT_K1,
            b: DEFAULT_B,
            idf: IdfFormula::default(),
        }
    }
}

impl CorpusStatistics {
    /// Merge a partial parameter update
    pub fn apply(&mut self, update: Bm25ParametersUpdate) {
        if let Some(k1) = update.k1 {
            self.k1 = k1;
        }
        if let Some(b) = update.b {
            self.b = b;
        }
        if let Some(idf) = update.idf {
            self.idf = idf;
        }
    }

    /// Keep the tunable parameters of `other`, discarding its derived values
    fn with_parameters_of(mut self, other: &CorpusStatistics) -> Self {
        self.k1 = other.k1;
        self.b = other.b;
        self.idf = other.idf;
        self
    }
}

/// Summary reported by `get_index_stats`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    /// Distinct terms in the inverted index
    pub total_terms: usize,
    pub avg_doc_length: f32,
    /// Distinct phrases in the phrase index
    pub total_phrases: usize,
}

/// Immutable snapshot of everything the lexical scorers read
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    generation: u64,
    chunks: IndexMap<String, Chunk>,
    documents: IndexMap<String, DocumentRecord>,
    inverted: HashMap<String, IndexSet<String>>,
    phrases: HashMap<String, IndexSet<String>>,
    statistics: CorpusStatistics,
}

impl SearchIndex {
    /// An empty index carrying the given BM25 parameters
    pub fn empty(statistics: CorpusStatistics) -> Self {
        Self {
            statistics: CorpusStatistics::default().with_parameters_of(&statistics),
            ..Default::default()
        }
    }

    /// Build a fresh index from `chunks`.
    ///
    /// A chunk whose id was already seen replaces the earlier one.
    pub fn build(chunks: Vec<Chunk>, parameters: CorpusStatistics) -> Self {
        let mut index = Self::empty(parameters);
        for chunk in chunks {
            index.ingest(chunk);
        }
        index.link_postings();
        index.assign_document_frequencies();
        index.recompute_statistics();
        index
    }

    fn ingest(&mut self, chunk: Chunk) {
        let record = DocumentRecord::from_chunk(&chunk);
        self.documents.insert(chunk.id.clone(), record);
        self.chunks.insert(chunk.id.clone(), chunk);
    }

    fn link_postings(&mut self) {
        for (chunk_id, record) in &self.documents {
            for term in record.terms.keys() {
                self.inverted
                    .entry(term.clone())
                    .or_default()
                    .insert(chunk_id.clone());
            }
            for phrase in &record.phrases {
                self.phrases
                    .entry(phrase.clone())
                    .or_default()
                    .insert(chunk_id.clone());
            }
        }
    }

    fn assign_document_frequencies(&mut self) {
        for record in self.documents.values_mut() {
            for entry in record.terms.values_mut() {
                entry.document_frequency = self
                    .inverted
                    .get(&entry.term)
                    .map_or(0, IndexSet::len);
            }
        }
    }

    fn recompute_statistics(&mut self) {
        let count = self.documents.len();
        let total_length: usize = self
            .documents
            .values()
            .map(|record| record.content_length)
            .sum();
        self.statistics.total_document_count = count;
        self.statistics.average_document_length = if count == 0 {
            0.0
        } else {
            total_length as f32 / count as f32
        };
    }

    pub(crate) fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub(crate) fn statistics_mut(&mut self) -> &mut CorpusStatistics {
        &mut self.statistics
    }

    /// Build counter of the engine that produced this snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn statistics(&self) -> &CorpusStatistics {
        &self.statistics
    }

    pub fn document(&self, chunk_id: &str) -> Option<&DocumentRecord> {
        self.documents.get(chunk_id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.documents.values()
    }

    pub fn chunk(&self, chunk_id: &str) -> Option<&Chunk> {
        self.chunks.get(chunk_id)
    }

    pub fn chunk_count(&self) -> usize {
        self.documents.len()
    }

    /// Insertion position of a chunk, used to keep candidate order stable
    pub fn ordinal(&self, chunk_id: &str) -> Option<usize> {
        self.documents.get_index_of(chunk_id)
    }

    /// Posting set of a term
    pub fn postings(&self, term: &str) -> Option<&IndexSet<String>> {
        self.inverted.get(term)
    }

    pub fn phrase_postings(&self, phrase: &str) -> Option<&IndexSet<String>> {
        self.phrases.get(phrase)
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.inverted.get(term).map_or(0, IndexSet::len)
    }

    /// All indexed terms
    pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
        self.inverted.keys().map(String::as_str)
    }

    /// Chunks containing at least one of `terms`, in indexing order
    pub fn candidates<'a>(&self, terms: impl IntoIterator<Item = &'a String>) -> Vec<&str> {
        let mut ordered: Vec<(usize, &str)> = terms
            .into_iter()
            .filter_map(|term| self.inverted.get(term))
            .flatten()
            .filter_map(|chunk_id| {
                self.ordinal(chunk_id)
                    .map(|ordinal| (ordinal, chunk_id.as_str()))
            })
            .collect();
        ordered.sort_unstable_by_key(|(ordinal, _)| *ordinal);
        ordered.dedup_by_key(|(ordinal, _)| *ordinal);
        ordered.into_iter().map(|(_, chunk_id)| chunk_id).collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_chunks: self.documents.len(),
            total_terms: self.inverted.len(),
            avg_doc_length: self.statistics.average_document_length,
            total_phrases: self.phrases.len(),
        }
    }

    /// Posting sets keyed by term, for comparing two builds
    pub fn inverted_index(&self) -> &HashMap<String, IndexSet<String>> {
        &self.inverted
    }
}
