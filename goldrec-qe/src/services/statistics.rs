//! Statistics aggregation over a recipe's feedback history
//!
//! Records are taken in append order. Nothing here reorders by test date,
//! so the trend windows follow submission order.

use crate::models::{Metric, QualityFeedbackRecord, QualityStats, QualityTrend};

/// Minimum history length before a trend is classified
pub const TREND_MIN_RECORDS: usize = 5;

/// Upper bound on the size of each trend window
pub const TREND_WINDOW_CAP: usize = 10;

/// Yield delta (percentage points) separating stable from moving
pub const TREND_DELTA_THRESHOLD: f64 = 1.0;

/// Arithmetic mean of `metric` across `records`; 0.0 for an empty slice
pub fn average(records: &[QualityFeedbackRecord], metric: Metric) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let sum: f64 = records
        .iter()
        .map(|r| r.quality_metrics.value(metric))
        .sum();
    sum / records.len() as f64
}

/// Mean of `metric` over the last `count` records (or all, if fewer)
pub fn recent_average(records: &[QualityFeedbackRecord], metric: Metric, count: usize) -> f64 {
    let start = records.len().saturating_sub(count);
    average(&records[start..], metric)
}

/// Classify the yield trend
///
/// The most recent half of the history (capped at ten records) is compared
/// with the equally sized window immediately before it.
pub fn trend(records: &[QualityFeedbackRecord]) -> QualityTrend {
    let n = records.len();
    if n < TREND_MIN_RECORDS {
        return QualityTrend::InsufficientData;
    }

    let window = (n / 2).min(TREND_WINDOW_CAP);
    let recent = &records[n - window..];
    let previous = &records[n - 2 * window..n - window];

    let delta = average(recent, Metric::YieldRate) - average(previous, Metric::YieldRate);
    if delta > TREND_DELTA_THRESHOLD {
        QualityTrend::Improving
    } else if delta < -TREND_DELTA_THRESHOLD {
        QualityTrend::Declining
    } else {
        QualityTrend::Stable
    }
}

/// Reduce the full history into the snapshot stored on the recipe
pub fn aggregate(records: &[QualityFeedbackRecord]) -> QualityStats {
    QualityStats {
        total_executions: records.len(),
        avg_yield: average(records, Metric::YieldRate),
        avg_efficiency: average(records, Metric::FilterEfficiency),
        avg_lifespan: average(records, Metric::Lifespan),
        avg_cpk: average(records, Metric::Cpk),
        avg_defect_rate: average(records, Metric::DefectRate),
        avg_stability_score: average(records, Metric::StabilityScore),
        last_execution_date: records.last().map(|r| r.test_result.test_date),
        quality_trend: trend(records),
    }
}
