//! Quality scoring of one chemical's search result
//!
//! The score (0 to 100) rewards volume, reviews, recent activity, a recent
//! review and a growing publication trend:
//!
//! | factor                                | points          |
//! |---------------------------------------|-----------------|
//! | publications (50+ for full marks)     | up to 40        |
//! | reviews (5+ for full marks)           | up to 20        |
//! | last 3 years (10+ for full marks)     | up to 20        |
//! | review within the last 5 years        | 10              |
//! | trend increasing / stable / decreasing| 10 / 5 / 0      |
//!
//! All counts use the fetched publications, never the server-reported total.

use std::collections::HashMap;

use chrono::{Datelike, Utc};

use crate::models::{Publication, PublicationTrend, QualityMetrics, SearchResult};

/// Score a result against the current calendar year
pub fn calculate_quality_metrics(result: &SearchResult) -> QualityMetrics {
    calculate_quality_metrics_at(result, Utc::now().year())
}

/// Score a result as if the current calendar year were `current_year`
///
/// # Example
///
/// ```
/// use chemscreen::{Chemical, SearchResult, PublicationTrend};
/// use chemscreen::scoring::calculate_quality_metrics_at;
///
/// let chemical = Chemical::new("Benzene", Some("71-43-2"))?;
/// let failed = SearchResult::failure(chemical, "Connection failed: refused", 0.1);
///
/// let metrics = calculate_quality_metrics_at(&failed, 2024);
/// assert_eq!(metrics.quality_score, 0.0);
/// assert_eq!(metrics.publication_trend, PublicationTrend::Stable);
/// # Ok::<(), chemscreen::ChemScreenError>(())
/// ```
pub fn calculate_quality_metrics_at(result: &SearchResult, current_year: i32) -> QualityMetrics {
    let publications = result.publications();
    if result.is_failed() || publications.is_empty() {
        return QualityMetrics::default();
    }

    let total_publications = publications.len();
    let review_count = publications.iter().filter(|p| p.is_review).count();

    let recent_publications = publications
        .iter()
        .filter(|p| p.year.is_some_and(|year| year >= current_year - 3))
        .count();

    let has_recent_review = publications
        .iter()
        .any(|p| p.is_review && p.year.is_some_and(|year| year >= current_year - 5));

    let publication_trend = calculate_publication_trend(publications, current_year);

    let quality_score = calculate_quality_score(
        total_publications,
        review_count,
        recent_publications,
        has_recent_review,
        publication_trend,
    );

    QualityMetrics {
        total_publications,
        review_count,
        recent_publications,
        publication_trend,
        quality_score,
        has_recent_review,
    }
}

/// Classify publication volume over the five years ending at `current_year`
///
/// Counts for `current_year - 4 ..= current_year` are split into the first two
/// years and the last two; the middle year belongs to neither half. Fewer than
/// three dated publications is always `Stable`.
pub fn calculate_publication_trend(
    publications: &[Publication],
    current_year: i32,
) -> PublicationTrend {
    let years: Vec<i32> = publications.iter().filter_map(|p| p.year).collect();
    if years.len() < 3 {
        return PublicationTrend::Stable;
    }

    let mut counts: HashMap<i32, u32> = HashMap::new();
    for year in years {
        *counts.entry(year).or_default() += 1;
    }

    let bucket = |offset: i32| counts.get(&(current_year - offset)).copied().unwrap_or(0);
    let first_half = f64::from(bucket(4) + bucket(3));
    let second_half = f64::from(bucket(1) + bucket(0));

    if second_half > first_half * 1.5 {
        PublicationTrend::Increasing
    } else if second_half < first_half * 0.5 {
        PublicationTrend::Decreasing
    } else {
        PublicationTrend::Stable
    }
}

/// Combine the scoring factors into a 0 to 100 score rounded to one decimal
pub fn calculate_quality_score(
    total_publications: usize,
    review_count: usize,
    recent_publications: usize,
    has_recent_review: bool,
    trend: PublicationTrend,
) -> f64 {
    let mut score = 0.0;

    score += (total_publications as f64 / 50.0 * 40.0).min(40.0);
    score += (review_count as f64 / 5.0 * 20.0).min(20.0);
    score += (recent_publications as f64 / 10.0 * 20.0).min(20.0);

    if has_recent_review {
        score += 10.0;
    }

    score += match trend {
        PublicationTrend::Increasing => 10.0,
        PublicationTrend::Stable => 5.0,
        PublicationTrend::Decreasing => 0.0,
    };

    round_to_tenth(score)
}

pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
