//! Composite golden score
//!
//! ```text
//! lifespan_rate = avg_lifespan / 24 * 100
//! score = avg_yield         * 0.30
//!       + avg_efficiency    * 0.25
//!       + lifespan_rate     * 0.20
//!       + avg_cpk * 10      * 0.15
//!       + avg_stability     * 0.10
//! ```
//!
//! Rounded to one decimal place. The score has no upper clamp: lifespan above
//! the 24-month reference or CPK above 2 push it past 100.

use crate::models::QualityStats;

pub const YIELD_WEIGHT: f64 = 0.30;
pub const EFFICIENCY_WEIGHT: f64 = 0.25;
pub const LIFESPAN_WEIGHT: f64 = 0.20;
pub const CPK_WEIGHT: f64 = 0.15;
pub const STABILITY_WEIGHT: f64 = 0.10;

/// Lifespan (months) that counts as 100%
pub const LIFESPAN_REFERENCE_MONTHS: f64 = 24.0;

/// Rescales CPK (typically below 2) onto a 0-20 band
pub const CPK_SCALE: f64 = 10.0;

/// The five aggregated means the score is built from
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub avg_yield: f64,
    pub avg_efficiency: f64,
    pub avg_lifespan: f64,
    pub avg_cpk: f64,
    pub avg_stability_score: f64,
}

impl From<&QualityStats> for ScoreInputs {
    fn from(stats: &QualityStats) -> Self {
        Self {
            avg_yield: stats.avg_yield,
            avg_efficiency: stats.avg_efficiency,
            avg_lifespan: stats.avg_lifespan,
            avg_cpk: stats.avg_cpk,
            avg_stability_score: stats.avg_stability_score,
        }
    }
}

/// Weighted composite score, rounded to one decimal
pub fn golden_score(inputs: &ScoreInputs) -> f64 {
    let lifespan_rate = inputs.avg_lifespan / LIFESPAN_REFERENCE_MONTHS * 100.0;

    let raw = inputs.avg_yield * YIELD_WEIGHT
        + inputs.avg_efficiency * EFFICIENCY_WEIGHT
        + lifespan_rate * LIFESPAN_WEIGHT
        + inputs.avg_cpk * CPK_SCALE * CPK_WEIGHT
        + inputs.avg_stability_score * STABILITY_WEIGHT;

    round_one_decimal(raw)
}

/// Score straight from a statistics snapshot
pub fn score_stats(stats: &QualityStats) -> f64 {
    golden_score(&ScoreInputs::from(stats))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_inputs() -> ScoreInputs {
        ScoreInputs {
            avg_yield: 98.0,
            avg_efficiency: 96.0,
            avg_lifespan: 33.4,
            avg_cpk: 1.5,
            avg_stability_score: 95.0,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = YIELD_WEIGHT + EFFICIENCY_WEIGHT + LIFESPAN_WEIGHT + CPK_WEIGHT + STABILITY_WEIGHT;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reference_score() {
        // 29.4 + 24.0 + 27.83 + 2.25 + 9.5 = 92.98 -> 93.0
        assert_eq!(golden_score(&reference_inputs()), 93.0);
    }

    #[test]
    fn test_all_zero_scores_zero() {
        assert_eq!(golden_score(&ScoreInputs::default()), 0.0);
    }

    #[test]
    fn test_reference_lifespan_and_cpk_contribution() {
        let inputs = ScoreInputs {
            avg_lifespan: 24.0,
            avg_cpk: 2.0,
            ..Default::default()
        };
        // 100 * 0.20 + 20 * 0.15
        assert_eq!(golden_score(&inputs), 23.0);
    }

    #[test]
    fn test_score_is_unbounded_above_100() {
        let inputs = ScoreInputs {
            avg_yield: 100.0,
            avg_efficiency: 100.0,
            avg_lifespan: 48.0,
            avg_cpk: 3.0,
            avg_stability_score: 100.0,
        };
        assert!(golden_score(&inputs) > 100.0);
    }

    #[test]
    fn test_score_is_monotonic_in_each_input() {
        let base = reference_inputs();
        let bumps: [fn(&mut ScoreInputs, f64); 5] = [
            |i, d| i.avg_yield += d,
            |i, d| i.avg_efficiency += d,
            |i, d| i.avg_lifespan += d,
            |i, d| i.avg_cpk += d,
            |i, d| i.avg_stability_score += d,
        ];

        for bump in bumps {
            let mut previous = golden_score(&base);
            let mut inputs = base;
            for _ in 0..50 {
                bump(&mut inputs, 0.37);
                let next = golden_score(&inputs);
                assert!(next >= previous, "score decreased: {} -> {}", previous, next);
                previous = next;
            }
        }
    }

    #[test]
    fn test_rounds_to_one_decimal() {
        let inputs = ScoreInputs {
            avg_yield: 33.3333,
            ..Default::default()
        };
        // 9.99999 -> 10.0
        assert_eq!(golden_score(&inputs), 10.0);
    }
}
