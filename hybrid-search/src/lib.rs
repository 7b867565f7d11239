/*!
# Codeseek Hybrid Search

Retrieval core for code chunks, fusing three relevance signals:
- **Semantic similarity** from an external vector-search provider
- **Keyword matching** by term density, position and adjacent phrases, with
  synonym and edit-distance fuzzy expansion
- **BM25** probabilistic term weighting over the same inverted index

## Architecture

```text
index_chunks(chunks)
  └─> SearchIndex (term tables, inverted index, phrase index, corpus stats)

hybrid_search(query, options)
  ├─> Semantic provider (timeout, degrades to empty)
  ├─> Keyword scorer      ─┐ concurrent, over one
  └─> BM25 scorer         ─┘ index snapshot
        └─> Fusion (max-normalize, weighted sum)
              └─> Rerank → Diversify → Contextual boost
                    └─> Truncate to max_results
```

## Example

```rust,no_run
use codeseek_chunk_model::Chunk;
use codeseek_hybrid_search::{HybridSearchEngine, HybridSearchOptions};

#[tokio::main]
async fn main() -> codeseek_hybrid_search::Result<()> {
    let engine = HybridSearchEngine::lexical_only();
    engine
        .index_chunks(vec![
            Chunk::new("1", "function getUser(id) { return db.find(id); }"),
            Chunk::new("2", "class UserService { getUser() {} }"),
        ])
        .await?;

    let results = engine
        .hybrid_search("getUser", &HybridSearchOptions::lexical_only())
        .await?;
    for result in results.top(5) {
        println!("{} {:.3} {}", result.chunk_id, result.combined_score, result.explanation);
    }
    Ok(())
}
```

## Degradation

Nothing short of invalid options or cancellation fails a query. A semantic
provider that errors or exceeds `semantic_timeout_ms` is logged and treated
as an empty signal; [`SearchStats::semantic_degraded`] records that it
happened.
*/

mod bm25;
mod boost;
mod config;
mod diversify;
mod engine;
mod error;
mod fusion;
mod fuzzy;
mod index;
mod keyword;
mod query;
mod rerank;
mod result;
mod semantic;
mod synonyms;
mod tokenizer;

pub use bm25::Bm25Scorer;
pub use boost::ContextualBooster;
pub use config::{
    Bm25ParametersUpdate, DEFAULT_B, DEFAULT_K1, EngineConfig, HybridSearchOptions, IdfFormula,
};
pub use diversify::Diversifier;
pub use engine::HybridSearchEngine;
pub use error::{HybridSearchError, Result};
pub use fusion::{FusionEngine, SignalWeights, normalize};
pub use fuzzy::{FUZZY_SIMILARITY_THRESHOLD, fuzzy_matches, levenshtein, similarity};
pub use index::{CorpusStatistics, DocumentRecord, IndexStats, SearchIndex, TermEntry};
pub use keyword::KeywordScorer;
pub use query::QueryTerms;
pub use rerank::RerankEngine;
pub use result::{Evidence, HybridResult, HybridSearchResults, ScoredCandidate, SearchStats};
pub use semantic::{
    NoopSemanticSearch, SemanticAdapter, SemanticMatch, SemanticOutcome, SemanticRequest,
    SemanticSearch,
};
pub use synonyms::synonyms_for;
pub use tokenizer::{extract_keywords, extract_phrases, tokenize};
