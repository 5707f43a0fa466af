//! Golden recipe listings
//!
//! Candidates are non-golden recipes scoring at least 85, best first.

use std::cmp::Ordering;

use crate::models::Recipe;

/// Minimum score for the candidate list
pub const CANDIDATE_MIN_SCORE: f64 = 85.0;

fn is_candidate(recipe: &Recipe) -> bool {
    !recipe.is_golden
        && recipe
            .golden_score
            .map(|score| score >= CANDIDATE_MIN_SCORE)
            .unwrap_or(false)
}

/// Non-golden recipes scoring at least [`CANDIDATE_MIN_SCORE`], sorted by score descending
///
/// Ties keep repository order.
pub fn candidates(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let mut selected: Vec<Recipe> = recipes.into_iter().filter(is_candidate).collect();
    selected.sort_by(|a, b| {
        let a = a.golden_score.unwrap_or(0.0);
        let b = b.golden_score.unwrap_or(0.0);
        b.partial_cmp(&a).unwrap_or(Ordering::Equal)
    });
    selected
}

/// Every recipe currently flagged golden, in repository order
pub fn all_golden(recipes: Vec<Recipe>) -> Vec<Recipe> {
    recipes.into_iter().filter(|r| r.is_golden).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn recipe(id: &str, score: Option<f64>, golden: bool) -> Recipe {
        let mut r = Recipe::new(id, id, serde_json::Value::Null, Utc::now());
        r.golden_score = score;
        r.is_golden = golden;
        r
    }

    fn ids(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_candidates_filter_and_order() {
        let recipes = vec![
            recipe("low", Some(84.9), false),
            recipe("edge", Some(85.0), false),
            recipe("best", Some(96.2), false),
            recipe("golden", Some(99.0), true),
            recipe("unscored", None, false),
            recipe("mid", Some(90.4), false),
        ];
        let result = candidates(recipes);
        assert_eq!(ids(&result), vec!["best", "mid", "edge"]);
    }

    #[test]
    fn test_candidates_ties_are_stable() {
        let recipes = vec![
            recipe("first", Some(88.0), false),
            recipe("second", Some(88.0), false),
        ];
        assert_eq!(ids(&candidates(recipes)), vec!["first", "second"]);
    }

    #[test]
    fn test_all_golden_ignores_score() {
        let recipes = vec![
            recipe("a", Some(70.0), true),
            recipe("b", Some(99.0), false),
            recipe("c", None, true),
        ];
        assert_eq!(ids(&all_golden(recipes)), vec!["a", "c"]);
    }
}
