//! Auto-certification gate
//!
//! A recipe is certified without a human reviewer only when every criterion
//! holds at once:
//! 1. at least 10 feedback records
//! 2. first-to-last test date span of at least 30 days
//! 3. golden score of at least 92
//! 4. mean yield over the most recent 20 records of at least 97%
//! 5. lifetime mean CPK of at least 1.33
//! 6. no record carries an issue tag
//!
//! The certifying path short-circuits on the first failure. The report path
//! evaluates every criterion so callers can see all failing gates.
//!
//! A single historical issue blocks auto-certification permanently; there is
//! no decay or expiry.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::{
    CertificationEvent, CertificationEventKind, CertificationStatus, Metric,
    QualityFeedbackRecord, Recipe,
};
use crate::services::statistics::{average, recent_average};

pub const MIN_SAMPLE_SIZE: usize = 10;
pub const MIN_SPAN_DAYS: i64 = 30;
pub const MIN_GOLDEN_SCORE: f64 = 92.0;
pub const RECENT_YIELD_WINDOW: usize = 20;
pub const MIN_RECENT_YIELD: f64 = 97.0;
pub const MIN_AVG_CPK: f64 = 1.33;

/// Actor recorded on automatic certifications
pub const AUTO_CERTIFIED_BY: &str = "system";
pub const AUTO_CERTIFICATION_REASON: &str = "Auto-certified: all quality criteria met";

/// One auto-certification gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    SampleSize,
    TimeSpan,
    GoldenScore,
    RecentYield,
    ProcessCapability,
    NoIssues,
}

impl Criterion {
    /// Evaluation order of the certifying path
    pub const ALL: [Criterion; 6] = [
        Criterion::SampleSize,
        Criterion::TimeSpan,
        Criterion::GoldenScore,
        Criterion::RecentYield,
        Criterion::ProcessCapability,
        Criterion::NoIssues,
    ];
}

/// Result of checking one criterion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriterionOutcome {
    pub criterion: Criterion,
    pub required: f64,
    pub observed: f64,
    pub passed: bool,
}

/// Check a single criterion against the history and its score
pub fn check(criterion: Criterion, records: &[QualityFeedbackRecord], score: f64) -> CriterionOutcome {
    let (required, observed, passed) = match criterion {
        Criterion::SampleSize => {
            let n = records.len();
            (MIN_SAMPLE_SIZE as f64, n as f64, n >= MIN_SAMPLE_SIZE)
        }
        Criterion::TimeSpan => match (records.first(), records.last()) {
            (Some(first), Some(last)) => {
                let span = last.test_result.test_date - first.test_result.test_date;
                let observed = span.num_seconds() as f64 / 86_400.0;
                let passed = goldrec_common::time::spans_at_least(
                    first.test_result.test_date,
                    last.test_result.test_date,
                    MIN_SPAN_DAYS,
                );
                (MIN_SPAN_DAYS as f64, observed, passed)
            }
            _ => (MIN_SPAN_DAYS as f64, 0.0, false),
        },
        Criterion::GoldenScore => (MIN_GOLDEN_SCORE, score, score >= MIN_GOLDEN_SCORE),
        Criterion::RecentYield => {
            let recent = recent_average(records, Metric::YieldRate, RECENT_YIELD_WINDOW);
            (MIN_RECENT_YIELD, recent, !records.is_empty() && recent >= MIN_RECENT_YIELD)
        }
        Criterion::ProcessCapability => {
            let cpk = average(records, Metric::Cpk);
            (MIN_AVG_CPK, cpk, !records.is_empty() && cpk >= MIN_AVG_CPK)
        }
        Criterion::NoIssues => {
            let with_issues = records.iter().filter(|r| r.has_issues()).count();
            (0.0, with_issues as f64, with_issues == 0)
        }
    };

    CriterionOutcome {
        criterion,
        required,
        observed,
        passed,
    }
}

/// True when every criterion holds; stops at the first failure
pub fn meets_auto_criteria(records: &[QualityFeedbackRecord], score: f64) -> bool {
    Criterion::ALL
        .iter()
        .all(|criterion| check(*criterion, records, score).passed)
}

/// Every criterion's outcome, without short-circuit
pub fn evaluate_all(records: &[QualityFeedbackRecord], score: f64) -> Vec<CriterionOutcome> {
    Criterion::ALL
        .iter()
        .map(|criterion| check(*criterion, records, score))
        .collect()
}

/// Flip a qualifying recipe to golden
///
/// Returns true only when the recipe was newly certified. An already golden
/// recipe keeps its certification metadata untouched. Certification status
/// is left as it was; the automatic route does not pass through review, and
/// never overrides a review that is still open.
pub fn apply(recipe: &mut Recipe, meets_criteria: bool, now: DateTime<Utc>) -> bool {
    if !meets_criteria || recipe.is_golden {
        return false;
    }
    if recipe.certification_status == CertificationStatus::Pending {
        debug!(recipe_id = %recipe.id, "Auto-certification deferred to open review");
        return false;
    }

    recipe.is_golden = true;
    recipe.certified_at = Some(now);
    recipe.certified_by = Some(AUTO_CERTIFIED_BY.to_string());
    recipe.certification_reason = Some(AUTO_CERTIFICATION_REASON.to_string());
    recipe.record(
        CertificationEvent::new(CertificationEventKind::AutoCertified, AUTO_CERTIFIED_BY, now)
            .with_reason(Some(AUTO_CERTIFICATION_REASON.to_string())),
    );
    true
}
