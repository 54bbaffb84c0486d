//! Batch-level aggregation of scored results

use serde::Serialize;

use crate::models::{QualityMetrics, SearchResult};
use crate::scoring::{calculate_quality_metrics, round_to_tenth};

/// A search result paired with its quality metrics
pub type ScoredResult = (SearchResult, QualityMetrics);

/// Score threshold of the "high" tier and of the high-quality count
pub const HIGH_QUALITY_SCORE: f64 = 70.0;
pub const MEDIUM_QUALITY_SCORE: f64 = 40.0;
pub const LOW_QUALITY_SCORE: f64 = 10.0;

/// Pair every result with freshly computed metrics
pub fn score_results(results: Vec<SearchResult>) -> Vec<ScoredResult> {
    results
        .into_iter()
        .map(|result| {
            let metrics = calculate_quality_metrics(&result);
            (result, metrics)
        })
        .collect()
}

/// Chemicals meeting both thresholds, highest score first
///
/// The sort is stable, so equal scores keep their input order. The usual
/// thresholds are a score of 70 and 20 publications.
pub fn identify_high_priority(
    results: &[ScoredResult],
    min_score: f64,
    min_publications: usize,
) -> Vec<&ScoredResult> {
    let mut high_priority: Vec<&ScoredResult> = results
        .iter()
        .filter(|(_, metrics)| {
            metrics.quality_score >= min_score && metrics.total_publications >= min_publications
        })
        .collect();

    high_priority.sort_by(|a, b| b.1.quality_score.total_cmp(&a.1.quality_score));
    high_priority
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SummaryStatistics {
    pub total_chemicals: usize,
    pub successful_searches: usize,
    pub failed_searches: usize,
    pub total_publications: usize,
    pub total_reviews: usize,
    /// Mean score over successful searches, rounded to one decimal
    pub avg_quality_score: f64,
    pub high_quality_count: usize,
    pub chemicals_with_reviews: usize,
    pub chemicals_with_recent_activity: usize,
}

pub fn generate_summary_statistics(results: &[ScoredResult]) -> SummaryStatistics {
    let mut stats = SummaryStatistics {
        total_chemicals: results.len(),
        ..SummaryStatistics::default()
    };

    let mut score_sum = 0.0;
    for (result, metrics) in results {
        if result.is_failed() {
            stats.failed_searches += 1;
        } else {
            stats.successful_searches += 1;
            score_sum += metrics.quality_score;
        }

        stats.total_publications += metrics.total_publications;
        stats.total_reviews += metrics.review_count;

        if metrics.quality_score >= HIGH_QUALITY_SCORE {
            stats.high_quality_count += 1;
        }
        if metrics.review_count > 0 {
            stats.chemicals_with_reviews += 1;
        }
        if metrics.recent_publications > 0 {
            stats.chemicals_with_recent_activity += 1;
        }
    }

    if stats.successful_searches > 0 {
        stats.avg_quality_score = round_to_tenth(score_sum / stats.successful_searches as f64);
    }

    stats
}

/// Results grouped by quality tier
///
/// A failed search is always in `failed`, whatever its metrics say.
#[derive(Debug, Default)]
pub struct QualityTiers<'a> {
    pub high: Vec<&'a ScoredResult>,
    pub medium: Vec<&'a ScoredResult>,
    pub low: Vec<&'a ScoredResult>,
    pub minimal: Vec<&'a ScoredResult>,
    pub failed: Vec<&'a ScoredResult>,
}

pub fn group_by_quality_tier(results: &[ScoredResult]) -> QualityTiers<'_> {
    let mut tiers = QualityTiers::default();

    for scored in results {
        let (result, metrics) = scored;
        let score = metrics.quality_score;

        let tier = if result.is_failed() {
            &mut tiers.failed
        } else if score >= HIGH_QUALITY_SCORE {
            &mut tiers.high
        } else if score >= MEDIUM_QUALITY_SCORE {
            &mut tiers.medium
        } else if score >= LOW_QUALITY_SCORE {
            &mut tiers.low
        } else {
            &mut tiers.minimal
        };
        tier.push(scored);
    }

    tiers
}
