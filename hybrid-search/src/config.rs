use codeseek_chunk_model::{ComponentKind, SearchFilter};
use serde::{Deserialize, Serialize};

/// Term-frequency saturation
pub const DEFAULT_K1: f32 = 1.5;

/// Length normalization
pub const DEFAULT_B: f32 = 0.75;

/// Weight shifted between signals for structural / semantic query components
const COMPONENT_WEIGHT_SHIFT: f32 = 0.15;

/// Inverse document frequency formula used by the BM25 scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdfFormula {
    /// `ln(1 + (N - df + 0.5) / (df + 0.5))`, never negative
    #[default]
    Smoothed,
    /// `ln((N - df + 0.5) / (df + 0.5))`, negative for terms in more than half
    /// the corpus, which suppresses them
    Okapi,
}

impl IdfFormula {
    pub fn idf(self, total_documents: usize, document_frequency: usize) -> f32 {
        let n = total_documents as f32;
        let df = document_frequency as f32;
        let ratio = (n - df + 0.5) / (df + 0.5);
        match self {
            IdfFormula::Smoothed => (1.0 + ratio).ln(),
            IdfFormula::Okapi => ratio.ln(),
        }
    }
}

/// Partial update merged into the corpus statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bm25ParametersUpdate {
    #[serde(default)]
    pub k1: Option<f32>,

    #[serde(default)]
    pub b: Option<f32>,

    #[serde(default)]
    pub idf: Option<IdfFormula>,
}

impl Bm25ParametersUpdate {
    /// `k1` must be finite and non-negative, `b` must lie in `[0, 1]`
    pub fn validate(&self) -> Result<(), String> {
        if let Some(k1) = self.k1.filter(|k1| !k1.is_finite() || *k1 < 0.0) {
            return Err(format!("k1 must be a finite value >= 0.0, got {k1}"));
        }
        if let Some(b) = self.b.filter(|b| !(0.0..=1.0).contains(b)) {
            return Err(format!("b must be in [0.0, 1.0], got {b}"));
        }
        Ok(())
    }
}

/// Engine-level settings that outlive a single query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of query terms whose fuzzy expansions are remembered
    #[serde(default = "default_fuzzy_cache_size")]
    pub fuzzy_cache_size: usize,
}

fn default_fuzzy_cache_size() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuzzy_cache_size: default_fuzzy_cache_size(),
        }
    }
}

/// Per-query configuration for hybrid search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HybridSearchOptions {
    /// Weight of the semantic signal
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Weight of the keyword signal
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Weight of the BM25 signal
    #[serde(default = "default_bm25_weight")]
    pub bm25_weight: f32,

    /// Expand query terms with similar indexed terms (edit distance)
    #[serde(default = "default_true")]
    pub fuzzy_matching: bool,

    /// Expand query terms with the static synonym table
    #[serde(default = "default_true")]
    pub synonym_expansion: bool,

    /// Apply importance / recency / filter-alignment boosts
    #[serde(default = "default_true")]
    pub contextual_boost: bool,

    /// Apply the term-density and content-quality rerank pass
    #[serde(default = "default_true")]
    pub reranking: bool,

    /// Reward first-seen categories and frameworks
    #[serde(default = "default_true")]
    pub diversification: bool,

    /// Number of results returned
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum similarity requested from the semantic provider
    #[serde(default = "default_threshold")]
    pub threshold: f32,

    #[serde(default)]
    pub filters: Vec<SearchFilter>,

    /// Upper bound on the semantic provider call
    #[serde(default = "default_semantic_timeout_ms")]
    pub semantic_timeout_ms: u64,

    /// Factor applied to `max_results` when asking the semantic provider
    #[serde(default = "default_semantic_overfetch")]
    pub semantic_overfetch: f32,
}

fn default_semantic_weight() -> f32 {
    0.4
}

fn default_keyword_weight() -> f32 {
    0.35
}

fn default_bm25_weight() -> f32 {
    0.25
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> usize {
    20
}

fn default_threshold() -> f32 {
    0.1
}

fn default_semantic_timeout_ms() -> u64 {
    5_000
}

fn default_semantic_overfetch() -> f32 {
    1.5
}

impl Default for HybridSearchOptions {
    fn default() -> Self {
        Self {
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            bm25_weight: default_bm25_weight(),
            fuzzy_matching: true,
            synonym_expansion: true,
            contextual_boost: true,
            reranking: true,
            diversification: true,
            max_results: default_max_results(),
            threshold: default_threshold(),
            filters: Vec::new(),
            semantic_timeout_ms: default_semantic_timeout_ms(),
            semantic_overfetch: default_semantic_overfetch(),
        }
    }
}

impl HybridSearchOptions {
    /// Validate options that would make scoring meaningless.
    ///
    /// Weights that merely fail to sum to 1.0 are not an error; see
    /// [`HybridSearchOptions::weight_sum_deviation`].
    pub fn validate(&self) -> Result<(), String> {
        for (name, weight) in [
            ("semantic_weight", self.semantic_weight),
            ("keyword_weight", self.keyword_weight),
            ("bm25_weight", self.bm25_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("{name} must be a finite value >= 0.0, got {weight}"));
            }
        }

        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!(
                "threshold must be in [0.0, 1.0], got {}",
                self.threshold
            ));
        }

        if self.max_results == 0 {
            return Err("max_results must be > 0".to_string());
        }

        if self.semantic_timeout_ms == 0 {
            return Err("semantic_timeout_ms must be > 0".to_string());
        }

        if !self.semantic_overfetch.is_finite() || self.semantic_overfetch < 1.0 {
            return Err(format!(
                "semantic_overfetch must be >= 1.0, got {}",
                self.semantic_overfetch
            ));
        }

        Ok(())
    }

    /// Distance of the weight sum from 1.0
    pub fn weight_sum_deviation(&self) -> f32 {
        (self.semantic_weight + self.keyword_weight + self.bm25_weight - 1.0).abs()
    }

    /// Number of candidates requested from the semantic provider
    pub fn semantic_request_size(&self) -> usize {
        (self.max_results as f32 * self.semantic_overfetch).ceil() as usize
    }

    /// Keyword and BM25 only; the semantic provider is never called
    pub fn lexical_only() -> Self {
        Self {
            semantic_weight: 0.0,
            keyword_weight: 0.55,
            bm25_weight: 0.45,
            reranking: false,
            ..Default::default()
        }
    }

    /// Favor exact identifier matches
    pub fn keyword_focused() -> Self {
        Self {
            semantic_weight: 0.2,
            keyword_weight: 0.5,
            bm25_weight: 0.3,
            ..Default::default()
        }
    }

    /// Favor conceptual similarity
    pub fn semantic_focused() -> Self {
        Self {
            semantic_weight: 0.6,
            keyword_weight: 0.2,
            bm25_weight: 0.2,
            synonym_expansion: false,
            ..Default::default()
        }
    }

    /// Options adjusted for one component of a decomposed query
    pub fn for_component(&self, kind: ComponentKind) -> Self {
        let mut adjusted = self.clone();
        match kind {
            ComponentKind::Structural => {
                let shift = COMPONENT_WEIGHT_SHIFT.min(adjusted.semantic_weight);
                adjusted.semantic_weight -= shift;
                adjusted.keyword_weight += shift;
            }
            ComponentKind::Semantic => {
                let shift = COMPONENT_WEIGHT_SHIFT.min(adjusted.keyword_weight);
                adjusted.keyword_weight -= shift;
                adjusted.semantic_weight += shift;
            }
            ComponentKind::General => {}
        }
        adjusted
    }
}
