//! Collaboration: how often a developer's work gets reverted

use crate::analyzers::curve::{ratio, FallingCurve};
use crate::analyzers::{Analyzer, FactTables};
use crate::data::records::{round2, round4, CommitRecord, DeveloperIdentity, Dimension, DimensionScore, StatValue};
use crate::settings::CollaborationConfig;

const STAT_COLUMNS: &[&str] = &["total_commits", "revert_count", "revert_rate"];

pub struct CollaborationAnalyzer {
    curve: FallingCurve,
}

impl CollaborationAnalyzer {
    pub fn new(config: &CollaborationConfig) -> Self {
        Self {
            curve: FallingCurve::new(config.revert_good, config.revert_excellent, config.revert_good),
        }
    }

    pub fn is_revert(commit: &CommitRecord) -> bool {
        commit.title.to_lowercase().contains("revert")
    }
}

impl Analyzer for CollaborationAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Collaboration
    }

    fn stat_columns(&self) -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore {
        let commits = facts.commits_for(&identity.email);
        if commits.is_empty() {
            return self.empty_score(&identity.email);
        }

        let reverts = commits.iter().filter(|c| Self::is_revert(c)).count();
        let rate = ratio(reverts, commits.len());
        let stats = vec![
            ("total_commits", StatValue::Count(commits.len() as u64)),
            ("revert_count", StatValue::Count(reverts as u64)),
            ("revert_rate", StatValue::Rate(round4(rate))),
        ];
        DimensionScore::new(
            &identity.email,
            Dimension::Collaboration,
            round2(self.curve.score(rate)),
            commits.len() as u64,
            stats,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::fixtures::{commit, identity};

    #[test]
    fn test_revert_detection() {
        assert!(CollaborationAnalyzer::is_revert(&commit("a", "d@x.io", "Revert \"feat: cache\"", 1, "2024-01-01")));
        assert!(CollaborationAnalyzer::is_revert(&commit("b", "d@x.io", "revert: undo cache", 1, "2024-01-01")));
        assert!(!CollaborationAnalyzer::is_revert(&commit("c", "d@x.io", "feat: cache", 1, "2024-01-01")));
    }

    #[test]
    fn test_revert_rate_scoring() {
        let email = "dev@example.com";
        let analyzer = CollaborationAnalyzer::new(&CollaborationConfig::default());

        let clean: Vec<_> = (0..20)
            .map(|i| commit(&format!("c{}", i), email, "feat: work", 10, "2024-01-01"))
            .collect();
        let facts = FactTables::new(&clean, &[], &[]);
        assert_eq!(analyzer.analyze(&identity(email), &facts).score, 10.0);

        let mut noisy = clean.clone();
        for commit in noisy.iter_mut().take(4) {
            commit.title = "Revert \"feat: work\"".to_string();
        }
        let facts = FactTables::new(&noisy, &[], &[]);
        let score = analyzer.analyze(&identity(email), &facts);
        assert_eq!(score.stat("revert_rate"), Some(&StatValue::Rate(0.2)));
        assert_eq!(score.score, 1.0);
    }
}
