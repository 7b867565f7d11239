use thiserror::Error;

#[derive(Error, Debug)]
pub enum HybridSearchError {
    #[error("Semantic provider error: {0}")]
    SemanticProvider(String),

    #[error("Semantic search timed out after {timeout_ms}ms")]
    SemanticTimeout { timeout_ms: u64 },

    #[error("Invalid search options: {0}")]
    InvalidOptions(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Scoring task failed: {0}")]
    ScoringTask(String),

    #[error("Search cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, HybridSearchError>;
