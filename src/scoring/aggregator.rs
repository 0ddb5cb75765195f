//! Weighted combination of dimension scores

use std::collections::{BTreeMap, HashMap};

use log::info;

use crate::data::records::{round2, DeveloperIdentity, Dimension, DimensionScore, FinalScore};
use crate::scoring::grade::Grade;
use crate::settings::{AnalysisWeights, GradingConfig};

/// Available dimension scores per developer email. Absence means the
/// dimension had no data for that developer, which is distinct from a
/// genuine score of zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSheet {
    scores: HashMap<String, BTreeMap<Dimension, f64>>,
}

impl ScoreSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, email: &str, dimension: Dimension, score: f64) {
        self.scores
            .entry(email.to_lowercase())
            .or_default()
            .insert(dimension, score.clamp(0.0, 10.0));
    }

    /// Record an analyzer result; unavailable results are ignored
    pub fn record(&mut self, score: &DimensionScore) {
        if let Some(value) = score.available_score() {
            self.insert(&score.email, score.dimension, value);
        }
    }

    pub fn get(&self, email: &str, dimension: Dimension) -> Option<f64> {
        self.scores.get(email).and_then(|dims| dims.get(&dimension)).copied()
    }

    pub fn available(&self, email: &str) -> Vec<(Dimension, f64)> {
        self.scores
            .get(email)
            .map(|dims| dims.iter().map(|(d, s)| (*d, *s)).collect())
            .unwrap_or_default()
    }
}

impl<'a> FromIterator<&'a DimensionScore> for ScoreSheet {
    fn from_iter<I: IntoIterator<Item = &'a DimensionScore>>(iter: I) -> Self {
        let mut sheet = ScoreSheet::new();
        for score in iter {
            sheet.record(score);
        }
        sheet
    }
}

pub struct ScoreAggregator<'a> {
    weights: &'a AnalysisWeights,
    grading: &'a GradingConfig,
}

impl<'a> ScoreAggregator<'a> {
    pub fn new(weights: &'a AnalysisWeights, grading: &'a GradingConfig) -> Self {
        Self { weights, grading }
    }

    /// Weighted mean over the available dimensions, renormalized by their
    /// weights; 0 when nothing is available. Rounded to two decimals.
    pub fn combine(&self, available: &[(Dimension, f64)]) -> f64 {
        let (weighted_sum, weight_sum) = available.iter().fold((0.0, 0.0), |(sum, norm), (dimension, score)| {
            let weight = self.weights.get(*dimension);
            (sum + score * weight, norm + weight)
        });

        if weight_sum > 0.0 {
            round2((weighted_sum / weight_sum).clamp(0.0, 10.0))
        } else {
            0.0
        }
    }

    /// One final score per identity, highest first (ties by email)
    pub fn aggregate(&self, identities: &[DeveloperIdentity], sheet: &ScoreSheet) -> Vec<FinalScore> {
        let mut results: Vec<FinalScore> = identities
            .iter()
            .map(|identity| {
                let final_score = self.combine(&sheet.available(&identity.email));
                let grade = Grade::for_score(final_score, self.grading);
                FinalScore {
                    email: identity.email.clone(),
                    username: identity.username.clone(),
                    name: identity.name.clone(),
                    dimension_scores: Dimension::ALL
                        .iter()
                        .map(|d| (*d, sheet.get(&identity.email, *d)))
                        .collect(),
                    final_score,
                    grade: grade.title().to_string(),
                    grade_level: grade.level().to_string(),
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then_with(|| a.email.cmp(&b.email))
        });

        let distribution = grade_distribution(&results);
        info!(
            "Grade distribution: senior {}, mid {}, junior {}",
            distribution.get(&Grade::Senior).unwrap_or(&0),
            distribution.get(&Grade::Mid).unwrap_or(&0),
            distribution.get(&Grade::Junior).unwrap_or(&0)
        );
        results
    }
}

/// Developer count per grade; every grade is present
pub fn grade_distribution(scores: &[FinalScore]) -> BTreeMap<Grade, usize> {
    let mut distribution: BTreeMap<Grade, usize> = Grade::ALL.iter().map(|g| (*g, 0)).collect();
    for score in scores {
        if let Some(grade) = Grade::from_level(&score.grade_level) {
            *distribution.entry(grade).or_default() += 1;
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::records::IdentitySource;

    fn identity(email: &str) -> DeveloperIdentity {
        DeveloperIdentity::new(email, "", IdentitySource::Git)
    }

    #[test]
    fn test_single_available_dimension_renormalizes() {
        let weights = AnalysisWeights::default();
        let grading = GradingConfig::default();
        let aggregator = ScoreAggregator::new(&weights, &grading);
        assert_eq!(aggregator.combine(&[(Dimension::CommitQuality, 7.0)]), 7.0);
    }

    #[test]
    fn test_nothing_available_scores_zero() {
        let weights = AnalysisWeights::default();
        let grading = GradingConfig::default();
        let aggregator = ScoreAggregator::new(&weights, &grading);
        assert_eq!(aggregator.combine(&[]), 0.0);
    }

    #[test]
    fn test_weighted_mean_over_available() {
        let weights = AnalysisWeights::default();
        let grading = GradingConfig::default();
        let aggregator = ScoreAggregator::new(&weights, &grading);
        // (10 * 0.23 + 4 * 0.12) / 0.35
        let expected = round2((10.0 * 0.23 + 4.0 * 0.12) / 0.35);
        assert_eq!(
            aggregator.combine(&[(Dimension::CommitQuality, 10.0), (Dimension::Contribution, 4.0)]),
            expected
        );
    }

    #[test]
    fn test_genuine_zero_is_not_missing() {
        let mut sheet = ScoreSheet::new();
        sheet.record(&DimensionScore::new("a@x.io", Dimension::CommitQuality, 8.0, 10, vec![]));
        sheet.record(&DimensionScore::new("a@x.io", Dimension::Contribution, 0.0, 3, vec![]));
        sheet.record(&DimensionScore::new("a@x.io", Dimension::CodeReview, 0.0, 0, vec![]));

        assert_eq!(sheet.get("a@x.io", Dimension::Contribution), Some(0.0));
        assert_eq!(sheet.get("a@x.io", Dimension::CodeReview), None);

        let weights = AnalysisWeights::default();
        let grading = GradingConfig::default();
        let results = ScoreAggregator::new(&weights, &grading).aggregate(&[identity("a@x.io")], &sheet);
        assert_eq!(results[0].final_score, round2(8.0 * 0.23 / 0.35));
        assert_eq!(results[0].available_dimensions(), 2);
        assert_eq!(results[0].dimension_score(Dimension::CodeReview), None);
    }

    #[test]
    fn test_results_sorted_and_graded() {
        let mut sheet = ScoreSheet::new();
        sheet.insert("low@x.io", Dimension::CommitQuality, 3.0);
        sheet.insert("high@x.io", Dimension::CommitQuality, 8.0);
        sheet.insert("mid@x.io", Dimension::CommitQuality, 5.0);

        let weights = AnalysisWeights::default();
        let grading = GradingConfig::default();
        let identities = vec![identity("low@x.io"), identity("high@x.io"), identity("mid@x.io"), identity("none@x.io")];
        let results = ScoreAggregator::new(&weights, &grading).aggregate(&identities, &sheet);

        let order: Vec<_> = results.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(order, vec!["high@x.io", "mid@x.io", "low@x.io", "none@x.io"]);
        let levels: Vec<_> = results.iter().map(|r| r.grade_level.as_str()).collect();
        assert_eq!(levels, vec!["senior", "mid", "junior", "junior"]);
        assert_eq!(results[0].grade, "🏆 Senior Engineer");

        let distribution = grade_distribution(&results);
        assert_eq!(distribution[&Grade::Senior], 1);
        assert_eq!(distribution[&Grade::Mid], 1);
        assert_eq!(distribution[&Grade::Junior], 2);
    }
}
