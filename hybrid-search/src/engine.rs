use crate::boost::ContextualBooster;
use crate::bm25::Bm25Scorer;
use crate::config::{Bm25ParametersUpdate, EngineConfig, HybridSearchOptions};
use crate::diversify::Diversifier;
use crate::error::{HybridSearchError, Result};
use crate::fusion::{FusionEngine, SignalWeights};
use crate::fuzzy::fuzzy_matches;
use crate::index::{CorpusStatistics, IndexStats, SearchIndex};
use crate::keyword::KeywordScorer;
use crate::query::QueryTerms;
use crate::rerank::RerankEngine;
use crate::result::{HybridResult, HybridSearchResults, ScoredCandidate, SearchStats};
use crate::semantic::{NoopSemanticSearch, SemanticAdapter, SemanticOutcome, SemanticSearch};
use chrono::Utc;
use codeseek_chunk_model::{Chunk, FilterOperator, QueryComponent};
use futures::future::join_all;
use indexmap::IndexMap;
use log::{debug, info, warn};
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Weight sums further than this from 1.0 are reported
const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

/// Fuzzy expansions per query term, valid for one index generation
struct FuzzyCache {
    generation: u64,
    entries: LruCache<String, Vec<String>>,
}

impl FuzzyCache {
    fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            generation: 0,
            entries: LruCache::new(capacity),
        }
    }

    fn reset(&mut self, generation: u64) {
        self.generation = generation;
        self.entries.clear();
    }
}

/// Hybrid search over an in-memory index of code chunks.
///
/// Queries read an immutable snapshot of the index; `index_chunks` builds a
/// replacement off the async runtime and swaps it in under the write lock, so
/// a query never observes a half-built index.
pub struct HybridSearchEngine {
    index: RwLock<Arc<SearchIndex>>,
    semantic: SemanticAdapter,
    fuzzy_cache: Mutex<FuzzyCache>,
    generation: AtomicU64,
}

impl HybridSearchEngine {
    pub fn new(provider: Arc<dyn SemanticSearch>) -> Self {
        Self::with_config(provider, EngineConfig::default())
    }

    pub fn with_config(provider: Arc<dyn SemanticSearch>, config: EngineConfig) -> Self {
        Self {
            index: RwLock::new(Arc::new(SearchIndex::default())),
            semantic: SemanticAdapter::new(provider),
            fuzzy_cache: Mutex::new(FuzzyCache::new(config.fuzzy_cache_size)),
            generation: AtomicU64::new(0),
        }
    }

    /// Engine without a semantic backend
    pub fn lexical_only() -> Self {
        Self::new(Arc::new(NoopSemanticSearch))
    }

    /// Current index snapshot
    pub async fn snapshot(&self) -> Arc<SearchIndex> {
        self.index.read().await.clone()
    }

    pub async fn statistics(&self) -> CorpusStatistics {
        *self.index.read().await.statistics()
    }

    /// Replace the whole index with one built from `chunks`.
    ///
    /// BM25 parameters carry over from the current index.
    pub async fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<()> {
        let start = Instant::now();
        let submitted = chunks.len();
        let parameters = self.statistics().await;

        let mut index =
            tokio::task::spawn_blocking(move || SearchIndex::build(chunks, parameters))
                .await
                .map_err(|err| HybridSearchError::IndexBuild(err.to_string()))?;

        let generation = {
            let mut current = self.index.write().await;
            let latest = current.statistics();
            index.statistics_mut().apply(Bm25ParametersUpdate {
                k1: Some(latest.k1),
                b: Some(latest.b),
                idf: Some(latest.idf),
            });
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            index.set_generation(generation);
            *current = Arc::new(index);
            generation
        };
        self.fuzzy_cache.lock().await.reset(generation);

        let stats = self.get_index_stats().await;
        info!(
            "Indexed {} chunks ({} submitted, {} terms, {} phrases) in {}ms",
            stats.total_chunks,
            submitted,
            stats.total_terms,
            stats.total_phrases,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Drop every indexed chunk, keeping the BM25 parameters
    pub async fn clear_index(&self) {
        let generation = {
            let mut current = self.index.write().await;
            let mut empty = SearchIndex::empty(*current.statistics());
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            empty.set_generation(generation);
            *current = Arc::new(empty);
            generation
        };
        self.fuzzy_cache.lock().await.reset(generation);
        info!("Search index cleared");
    }

    pub async fn get_index_stats(&self) -> IndexStats {
        self.index.read().await.stats()
    }

    /// Merge a partial BM25 parameter update into the corpus statistics.
    ///
    /// An update with an out-of-range field is rejected whole and leaves the
    /// current parameters untouched.
    pub async fn update_bm25_parameters(&self, update: Bm25ParametersUpdate) -> Result<()> {
        update.validate().map_err(HybridSearchError::InvalidOptions)?;
        let mut current = self.index.write().await;
        Arc::make_mut(&mut *current).statistics_mut().apply(update);
        let statistics = current.statistics();
        debug!(
            "BM25 parameters now k1={}, b={}, idf={:?}",
            statistics.k1, statistics.b, statistics.idf
        );
        Ok(())
    }

    pub async fn hybrid_search(
        &self,
        query: &str,
        options: &HybridSearchOptions,
    ) -> Result<HybridSearchResults> {
        self.hybrid_search_with_cancel(query, options, &CancellationToken::new())
            .await
    }

    /// Run all three scorers, fuse, post-process and truncate.
    ///
    /// Fails only on invalid options or cancellation; a failing semantic
    /// provider degrades to keyword and BM25 ranking.
    pub async fn hybrid_search_with_cancel(
        &self,
        query: &str,
        options: &HybridSearchOptions,
        cancel: &CancellationToken,
    ) -> Result<HybridSearchResults> {
        let start = Instant::now();
        options.validate().map_err(HybridSearchError::InvalidOptions)?;
        warn_on_anomalies(options);
        if cancel.is_cancelled() {
            return Err(HybridSearchError::Cancelled);
        }

        let index = self.snapshot().await;
        let terms = QueryTerms::parse(query);
        if terms.is_empty() {
            debug!("Query '{query}' has no searchable terms");
            return Ok(HybridSearchResults::new(query));
        }

        let mut fuzzy = if options.fuzzy_matching {
            self.fuzzy_expansions(&index, &terms).await
        } else {
            HashMap::new()
        };
        let terms = Arc::new(terms.expand(options, |term| {
            fuzzy.remove(term).unwrap_or_default()
        }));
        debug!(
            "Hybrid search for '{query}' with {} expanded terms",
            terms.expanded.len()
        );

        let semantic = async {
            if options.semantic_weight <= 0.0 {
                return Ok::<_, HybridSearchError>((SemanticOutcome::default(), 0));
            }
            let started = Instant::now();
            let outcome = self
                .semantic
                .search_cancellable(query, options, cancel)
                .await?;
            Ok::<_, HybridSearchError>((outcome, elapsed_ms(started)))
        };
        let keyword = run_scorer("keyword", {
            let index = Arc::clone(&index);
            let terms = Arc::clone(&terms);
            move || KeywordScorer::new(&index).score(&terms)
        });
        let bm25 = run_scorer("bm25", {
            let index = Arc::clone(&index);
            let terms = Arc::clone(&terms);
            move || Bm25Scorer::new(&index).score(&terms)
        });

        let (semantic, (keyword, keyword_ms), (bm25, bm25_ms)) =
            tokio::join!(semantic, keyword, bm25);
        let (mut semantic, semantic_ms) = semantic?;
        if cancel.is_cancelled() {
            return Err(HybridSearchError::Cancelled);
        }

        let mut stats = SearchStats {
            semantic_time_ms: semantic_ms,
            keyword_time_ms: keyword_ms,
            bm25_time_ms: bm25_ms,
            semantic_count: semantic.candidates.len(),
            keyword_count: keyword.len(),
            bm25_count: bm25.len(),
            expanded_terms: terms.expanded.len(),
            semantic_degraded: semantic.is_degraded(),
            semantic_error: semantic.error.take(),
            ..Default::default()
        };

        let fusion_start = Instant::now();
        let mut results = FusionEngine::new(SignalWeights::from(options)).fuse(
            &semantic.candidates,
            &keyword,
            &bm25,
        );
        for result in &mut results {
            result.chunk = index
                .chunk(&result.chunk_id)
                .cloned()
                .or_else(|| semantic.payloads.remove(&result.chunk_id));
        }
        stats.fusion_time_ms = elapsed_ms(fusion_start);

        let post_start = Instant::now();
        if options.reranking {
            RerankEngine::new(&terms).rerank(&mut results);
        }
        if options.diversification {
            Diversifier::new().diversify(&mut results);
        }
        if options.contextual_boost {
            ContextualBooster::new(&options.filters, Utc::now()).boost(&mut results);
        }
        results.truncate(options.max_results);
        stats.post_process_time_ms = elapsed_ms(post_start);
        stats.total_time_ms = elapsed_ms(start);

        info!(
            "Hybrid search for '{query}' returned {} results in {}ms{}",
            results.len(),
            stats.total_time_ms,
            if stats.semantic_degraded {
                " (semantic degraded)"
            } else {
                ""
            }
        );

        Ok(HybridSearchResults::new(query)
            .with_results(results)
            .with_stats(stats))
    }

    /// One hybrid search per component, run concurrently, keyed by component
    /// id in input order.
    ///
    /// Structural components lean on keyword matching, semantic components
    /// on the semantic signal.
    /// Components sharing an id collapse into one entry at the first
    /// position, holding the results of the last such component.
    pub async fn component_based_search(
        &self,
        components: &[QueryComponent],
        options: &HybridSearchOptions,
    ) -> Result<IndexMap<String, Vec<HybridResult>>> {
        let searches = components.iter().map(|component| {
            let adjusted = options.for_component(component.kind);
            let query = component.derived_query();
            async move {
                let outcome = self.hybrid_search(&query, &adjusted).await;
                (component.id.clone(), outcome)
            }
        });

        let mut by_component = IndexMap::with_capacity(components.len());
        for (component_id, outcome) in join_all(searches).await {
            let results = outcome?.results;
            if by_component.insert(component_id.clone(), results).is_some() {
                warn!("Duplicate query component id '{component_id}', keeping the later results");
            }
        }
        Ok(by_component)
    }

    /// Fuzzy matches for every expanded term, served from the cache when the
    /// index generation still matches. Misses are scanned on the blocking
    /// pool without holding the cache lock.
    async fn fuzzy_expansions(
        &self,
        index: &Arc<SearchIndex>,
        terms: &QueryTerms,
    ) -> HashMap<String, Vec<String>> {
        let mut expansions = HashMap::new();
        let mut misses = Vec::new();
        {
            let mut cache = self.fuzzy_cache.lock().await;
            if cache.generation != index.generation() {
                cache.reset(index.generation());
            }
            for term in &terms.expanded {
                match cache.entries.get(term) {
                    Some(matches) => {
                        expansions.insert(term.clone(), matches.clone());
                    }
                    None => misses.push(term.clone()),
                }
            }
        }
        if misses.is_empty() {
            return expansions;
        }

        let scanned = tokio::task::spawn_blocking({
            let index = Arc::clone(index);
            move || {
                misses
                    .into_iter()
                    .map(|term| {
                        let matches = fuzzy_matches(&term, index.vocabulary());
                        (term, matches)
                    })
                    .collect::<Vec<_>>()
            }
        })
        .await;
        let scanned = match scanned {
            Ok(scanned) => scanned,
            Err(err) => {
                let err = HybridSearchError::ScoringTask(format!("fuzzy: {err}"));
                warn!("{err}, continuing without fuzzy matches");
                return expansions;
            }
        };

        let mut cache = self.fuzzy_cache.lock().await;
        let current = cache.generation == index.generation();
        for (term, matches) in scanned {
            if current {
                cache.entries.put(term.clone(), matches.clone());
            }
            expansions.insert(term, matches);
        }
        expansions
    }
}

async fn run_scorer<F>(stage: &'static str, scorer: F) -> (Vec<ScoredCandidate>, u64)
where
    F: FnOnce() -> Vec<ScoredCandidate> + Send + 'static,
{
    let started = Instant::now();
    let candidates = match tokio::task::spawn_blocking(scorer).await {
        Ok(candidates) => candidates,
        Err(err) => {
            let err = HybridSearchError::ScoringTask(format!("{stage}: {err}"));
            warn!("{err}, continuing without it");
            Vec::new()
        }
    };
    (candidates, elapsed_ms(started))
}

fn warn_on_anomalies(options: &HybridSearchOptions) {
    let deviation = options.weight_sum_deviation();
    if deviation > WEIGHT_SUM_TOLERANCE {
        warn!(
            "Signal weights sum to {:.3}, not 1.0; scores are computed as given",
            options.semantic_weight + options.keyword_weight + options.bm25_weight
        );
    }
    for filter in &options.filters {
        if filter.operator == FilterOperator::Unknown {
            warn!(
                "Ignoring filter on '{}' with an unrecognized operator",
                filter.field
            );
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdfFormula;
    use pretty_assertions::assert_eq;

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            Chunk::new("1", "function getUser(id) { return db.find(id); }"),
            Chunk::new("2", "class UserService { getUser() {} }"),
            Chunk::new("3", "const x = 5;"),
        ]
    }

    #[tokio::test]
    async fn test_index_and_search() {
        let engine = HybridSearchEngine::lexical_only();
        engine.index_chunks(sample_chunks()).await.unwrap();

        let results = engine
            .hybrid_search("getUser", &HybridSearchOptions::lexical_only())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(!results.chunk_ids().contains(&"3"));
        assert!(results.results.iter().all(|r| r.chunk.is_some()));
        assert_eq!(results.stats.semantic_count, 0);
        assert!(!results.stats.semantic_degraded);
    }

    #[tokio::test]
    async fn test_empty_query_returns_nothing() {
        let engine = HybridSearchEngine::lexical_only();
        engine.index_chunks(sample_chunks()).await.unwrap();

        let results = engine
            .hybrid_search("  ;; ", &HybridSearchOptions::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_options_rejected() {
        let engine = HybridSearchEngine::lexical_only();
        let options = HybridSearchOptions {
            max_results: 0,
            ..Default::default()
        };
        let err = engine.hybrid_search("query", &options).await.unwrap_err();
        assert!(matches!(err, HybridSearchError::InvalidOptions(_)));
    }

    #[tokio::test]
    async fn test_generation_advances() {
        let engine = HybridSearchEngine::lexical_only();
        assert_eq!(engine.snapshot().await.generation(), 0);

        engine.index_chunks(sample_chunks()).await.unwrap();
        assert_eq!(engine.snapshot().await.generation(), 1);

        engine.clear_index().await;
        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.generation(), 2);
        assert_eq!(snapshot.chunk_count(), 0);
    }

    #[tokio::test]
    async fn test_parameters_survive_reindex() {
        let engine = HybridSearchEngine::lexical_only();
        engine
            .update_bm25_parameters(Bm25ParametersUpdate {
                k1: Some(1.2),
                idf: Some(IdfFormula::Okapi),
                ..Default::default()
            })
            .await
            .unwrap();
        engine.index_chunks(sample_chunks()).await.unwrap();

        let statistics = engine.statistics().await;
        assert_eq!(statistics.k1, 1.2);
        assert_eq!(statistics.b, 0.75);
        assert_eq!(statistics.idf, IdfFormula::Okapi);
        assert_eq!(statistics.total_document_count, 3);
    }

    #[tokio::test]
    async fn test_fuzzy_cache_is_reset_on_reindex() {
        let engine = HybridSearchEngine::lexical_only();
        engine
            .index_chunks(vec![Chunk::new("a", "getusers here")])
            .await
            .unwrap();
        let options = HybridSearchOptions::lexical_only();

        let first = engine.hybrid_search("getuser", &options).await.unwrap();
        assert_eq!(first.chunk_ids(), vec!["a"]);

        engine
            .index_chunks(vec![Chunk::new("b", "getuserz there")])
            .await
            .unwrap();
        let second = engine.hybrid_search("getuser", &options).await.unwrap();
        assert_eq!(second.chunk_ids(), vec!["b"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_fuzzy_queries_fill_cache() {
        let engine = Arc::new(HybridSearchEngine::lexical_only());
        engine
            .index_chunks(vec![
                Chunk::new("a", "getusers here"),
                Chunk::new("b", "setusers there"),
            ])
            .await
            .unwrap();
        let options = HybridSearchOptions::lexical_only();

        let searches = ["getuser", "setuser"].map(|query| {
            let engine = Arc::clone(&engine);
            let options = options.clone();
            tokio::spawn(async move { engine.hybrid_search(query, &options).await })
        });
        let [getuser, setuser] = searches;
        let getuser = getuser.await.unwrap().unwrap();
        let setuser = setuser.await.unwrap().unwrap();
        assert!(getuser.chunk_ids().contains(&"a"));
        assert!(setuser.chunk_ids().contains(&"b"));

        let mut cache = engine.fuzzy_cache.lock().await;
        assert_eq!(cache.generation, 1);
        assert!(
            cache
                .entries
                .get("getuser")
                .is_some_and(|matches| matches.contains(&"getusers".to_string()))
        );
        assert!(cache.entries.get("setuser").is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let engine = HybridSearchEngine::lexical_only();
        engine.index_chunks(sample_chunks()).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = engine
            .hybrid_search_with_cancel("getUser", &HybridSearchOptions::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, HybridSearchError::Cancelled));
    }
}
