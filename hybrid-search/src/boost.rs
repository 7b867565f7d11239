use crate::result::{HybridResult, sort_results};
use chrono::{DateTime, Utc};
use codeseek_chunk_model::{ChunkMetadata, SearchFilter};
use log::debug;

const IMPORTANCE_FACTOR: f32 = 0.1;
const MAX_RECENCY_BONUS: f32 = 0.05;
const RECENCY_WINDOW_DAYS: f32 = 365.0;
const FRAMEWORK_ALIGNMENT_BONUS: f32 = 0.15;

/// Metadata-driven boosts: importance, recency, and alignment with the
/// active framework filters.
pub struct ContextualBooster<'f> {
    filters: &'f [SearchFilter],
    now: DateTime<Utc>,
}

impl<'f> ContextualBooster<'f> {
    pub fn new(filters: &'f [SearchFilter], now: DateTime<Utc>) -> Self {
        Self { filters, now }
    }

    pub fn boost(&self, results: &mut [HybridResult]) {
        for result in results.iter_mut() {
            let Some(chunk) = &result.chunk else {
                continue;
            };
            let relevance = self.relevance(&chunk.metadata);
            if relevance > 0.0 {
                result.context_relevance += relevance;
                result.combined_score += relevance;
                result.append_explanation(&format!("context +{relevance:.2}"));
            }
        }

        sort_results(results);
        debug!("Applied contextual boost to {} results", results.len());
    }

    fn relevance(&self, metadata: &ChunkMetadata) -> f32 {
        let importance = metadata.importance.clamp(0.0, 1.0) * IMPORTANCE_FACTOR;
        let alignment = if self.aligns(metadata.framework.as_deref()) {
            FRAMEWORK_ALIGNMENT_BONUS
        } else {
            0.0
        };
        importance + self.recency(metadata.last_modified) + alignment
    }

    /// Linear decay from the full bonus today to zero after a year
    fn recency(&self, last_modified: Option<DateTime<Utc>>) -> f32 {
        let Some(last_modified) = last_modified else {
            return 0.0;
        };
        let age = self.now.signed_duration_since(last_modified);
        let days = (age.num_seconds().max(0) as f32) / 86_400.0;
        MAX_RECENCY_BONUS * (1.0 - days / RECENCY_WINDOW_DAYS).max(0.0)
    }

    fn aligns(&self, framework: Option<&str>) -> bool {
        self.filters
            .iter()
            .any(|filter| filter.matches_framework(framework))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use codeseek_chunk_model::Chunk;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn result(id: &str, metadata: ChunkMetadata, score: f32) -> HybridResult {
        HybridResult::new(id)
            .with_chunk(Chunk::with_metadata(id, "body", metadata))
            .with_combined_score(score)
    }

    #[test]
    fn test_importance() {
        let booster = ContextualBooster::new(&[], now());
        let metadata = ChunkMetadata::new("function").with_importance(1.0);
        assert!((booster.relevance(&metadata) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_recency_decay() {
        let booster = ContextualBooster::new(&[], now());

        assert!((booster.recency(Some(now())) - 0.05).abs() < 1e-6);
        let half_year = now() - Duration::days(182) - Duration::hours(12);
        assert!((booster.recency(Some(half_year)) - 0.025).abs() < 1e-4);
        assert_eq!(booster.recency(Some(now() - Duration::days(400))), 0.0);
        assert!((booster.recency(Some(now() + Duration::days(3))) - 0.05).abs() < 1e-6);
        assert_eq!(booster.recency(None), 0.0);
    }

    #[test]
    fn test_framework_alignment() {
        let filters = vec![SearchFilter::framework("React")];
        let booster = ContextualBooster::new(&filters, now());

        let mut results = vec![
            result(
                "vue",
                ChunkMetadata::new("component")
                    .with_framework("vue")
                    .with_importance(0.0),
                0.5,
            ),
            result(
                "react",
                ChunkMetadata::new("component")
                    .with_framework("react")
                    .with_importance(0.0),
                0.4,
            ),
        ];

        booster.boost(&mut results);

        assert_eq!(results[0].chunk_id, "react");
        assert!((results[0].context_relevance - 0.15).abs() < 1e-6);
        assert_eq!(results[1].context_relevance, 0.0);
        assert_eq!(results[1].combined_score, 0.5);
    }
}
