//! Contribution volume: step score over commit count

use std::collections::HashSet;

use crate::analyzers::{Analyzer, FactTables};
use crate::data::records::{DeveloperIdentity, Dimension, DimensionScore, StatValue};
use crate::settings::ContributionConfig;

const STAT_COLUMNS: &[&str] = &[
    "commit_count",
    "total_additions",
    "total_deletions",
    "total_lines",
    "unique_files",
    "active_days",
];

pub struct ContributionAnalyzer {
    high: usize,
    stable: usize,
    medium: usize,
}

impl ContributionAnalyzer {
    pub fn new(config: &ContributionConfig) -> Self {
        Self { high: config.high, stable: config.stable, medium: config.medium }
    }

    pub fn step_score(&self, commit_count: usize) -> f64 {
        if commit_count >= self.high {
            10.0
        } else if commit_count >= self.stable {
            8.0
        } else if commit_count >= self.medium {
            6.0
        } else {
            4.0
        }
    }
}

impl Analyzer for ContributionAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Contribution
    }

    fn stat_columns(&self) -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore {
        let commits = facts.commits_for(&identity.email);
        if commits.is_empty() {
            return self.empty_score(&identity.email);
        }

        let additions: u64 = commits.iter().map(|c| c.additions).sum();
        let deletions: u64 = commits.iter().map(|c| c.deletions).sum();
        let active_days: HashSet<_> = commits.iter().map(|c| c.authored_date.date_naive()).collect();
        let unique_files: HashSet<&str> = facts
            .file_changes_for(&identity.email)
            .iter()
            .map(|f| f.file_path.as_str())
            .collect();

        let stats = vec![
            ("commit_count", StatValue::Count(commits.len() as u64)),
            ("total_additions", StatValue::Count(additions)),
            ("total_deletions", StatValue::Count(deletions)),
            ("total_lines", StatValue::Count(additions + deletions)),
            ("unique_files", StatValue::Count(unique_files.len() as u64)),
            ("active_days", StatValue::Count(active_days.len() as u64)),
        ];
        DimensionScore::new(
            &identity.email,
            Dimension::Contribution,
            self.step_score(commits.len()),
            commits.len() as u64,
            stats,
        )
    }
}
