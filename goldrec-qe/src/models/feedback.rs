//! Per-batch quality feedback
//!
//! A `QualityFeedbackRecord` is created once and never edited. Submissions
//! arrive as `FeedbackSubmission` whose metric fields are all optional;
//! missing or malformed values become zero instead of failing ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Source tag used when the submitter supplies none
pub const DEFAULT_FEEDBACK_SOURCE: &str = "manual";

/// One measurable quality dimension of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Percentage of good output (0-100)
    YieldRate,
    /// Filtration efficiency percentage (0-100)
    FilterEfficiency,
    /// Expected service life in months
    Lifespan,
    /// Percentage of defective output
    DefectRate,
    /// Process capability index
    Cpk,
    /// Stability score (0-100)
    StabilityScore,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::YieldRate,
        Metric::FilterEfficiency,
        Metric::Lifespan,
        Metric::DefectRate,
        Metric::Cpk,
        Metric::StabilityScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::YieldRate => "yield_rate",
            Metric::FilterEfficiency => "filter_efficiency",
            Metric::Lifespan => "lifespan",
            Metric::DefectRate => "defect_rate",
            Metric::Cpk => "cpk",
            Metric::StabilityScore => "stability_score",
        }
    }
}

/// Measured values of one batch, all non-negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub yield_rate: f64,
    pub filter_efficiency: f64,
    pub lifespan: f64,
    pub defect_rate: f64,
    pub cpk: f64,
    pub stability_score: f64,
}

impl QualityMetrics {
    /// Typed accessor used by the generic averaging functions
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::YieldRate => self.yield_rate,
            Metric::FilterEfficiency => self.filter_efficiency,
            Metric::Lifespan => self.lifespan,
            Metric::DefectRate => self.defect_rate,
            Metric::Cpk => self.cpk,
            Metric::StabilityScore => self.stability_score,
        }
    }
}

/// Metric values as submitted; any field may be absent or malformed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsInput {
    #[serde(default, deserialize_with = "lenient_metric")]
    pub yield_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub filter_efficiency: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub lifespan: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub defect_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub cpk: Option<f64>,
    #[serde(default, deserialize_with = "lenient_metric")]
    pub stability_score: Option<f64>,
}

/// Any JSON value is accepted; only numbers survive
///
/// Strings, booleans, arrays and objects read as absent and are later
/// defaulted to zero with the other missing metrics.
fn lenient_metric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

impl MetricsInput {
    fn raw(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::YieldRate => self.yield_rate,
            Metric::FilterEfficiency => self.filter_efficiency,
            Metric::Lifespan => self.lifespan,
            Metric::DefectRate => self.defect_rate,
            Metric::Cpk => self.cpk,
            Metric::StabilityScore => self.stability_score,
        }
    }

    /// Resolve to concrete metrics, reporting which ones were defaulted to zero
    ///
    /// Absent, negative and non-finite values all become 0.0.
    pub fn sanitize(&self) -> (QualityMetrics, Vec<Metric>) {
        let mut defaulted = Vec::new();
        let mut resolve = |metric: Metric| match self.raw(metric) {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                defaulted.push(metric);
                0.0
            }
        };

        let metrics = QualityMetrics {
            yield_rate: resolve(Metric::YieldRate),
            filter_efficiency: resolve(Metric::FilterEfficiency),
            lifespan: resolve(Metric::Lifespan),
            defect_rate: resolve(Metric::DefectRate),
            cpk: resolve(Metric::Cpk),
            stability_score: resolve(Metric::StabilityScore),
        };
        (metrics, defaulted)
    }
}

impl From<QualityMetrics> for MetricsInput {
    fn from(m: QualityMetrics) -> Self {
        Self {
            yield_rate: Some(m.yield_rate),
            filter_efficiency: Some(m.filter_efficiency),
            lifespan: Some(m.lifespan),
            defect_rate: Some(m.defect_rate),
            cpk: Some(m.cpk),
            stability_score: Some(m.stability_score),
        }
    }
}

/// Outcome of the batch inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub passed: bool,
    pub test_date: DateTime<Utc>,
    #[serde(default)]
    pub inspector: String,
}

/// Immutable record of one production batch executed against a recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityFeedbackRecord {
    pub id: Uuid,
    /// Back-reference to the recipe, not an ownership edge
    pub recipe_id: String,
    pub recipe_version: Option<String>,
    pub batch_no: Option<String>,
    pub quality_metrics: QualityMetrics,
    pub test_result: TestResult,
    /// Free-text anomaly tags in logging order
    #[serde(default)]
    pub issues: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub source: String,
}

impl QualityFeedbackRecord {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Store-side admission check
    pub fn validate(&self) -> goldrec_common::Result<()> {
        if self.recipe_id.trim().is_empty() {
            return Err(goldrec_common::Error::InvalidInput(
                "feedback record has an empty recipe id".to_string(),
            ));
        }
        Ok(())
    }
}

/// Caller-supplied feedback for one batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default)]
    pub recipe_version: Option<String>,
    #[serde(default)]
    pub batch_no: Option<String>,
    #[serde(default)]
    pub metrics: MetricsInput,
    pub test_result: TestResult,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl FeedbackSubmission {
    pub fn new(metrics: impl Into<MetricsInput>, test_result: TestResult) -> Self {
        Self {
            recipe_version: None,
            batch_no: None,
            metrics: metrics.into(),
            test_result,
            issues: Vec::new(),
            source: None,
        }
    }

    pub fn with_batch_no(mut self, batch_no: impl Into<String>) -> Self {
        self.batch_no = Some(batch_no.into());
        self
    }

    pub fn with_issues(mut self, issues: Vec<String>) -> Self {
        self.issues = issues;
        self
    }

    /// Build the immutable record; returns the metrics that were defaulted
    ///
    /// Blank issue tags are dropped.
    pub fn into_record(
        self,
        recipe_id: &str,
        created_at: DateTime<Utc>,
    ) -> (QualityFeedbackRecord, Vec<Metric>) {
        let (quality_metrics, defaulted) = self.metrics.sanitize();
        let issues = self
            .issues
            .into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        let source = self
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FEEDBACK_SOURCE.to_string());

        let record = QualityFeedbackRecord {
            id: Uuid::new_v4(),
            recipe_id: recipe_id.to_string(),
            recipe_version: self.recipe_version,
            batch_no: self.batch_no,
            quality_metrics,
            test_result: self.test_result,
            issues,
            created_at,
            source,
        };
        (record, defaulted)
    }
}
