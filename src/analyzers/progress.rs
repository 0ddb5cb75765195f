//! Progress: commit quality trend between the early and late part of a
//! developer's activity span

use chrono::Duration;

use crate::analyzers::commit_quality::CommitQualityAnalyzer;
use crate::analyzers::{Analyzer, FactTables};
use crate::data::records::{round2, CommitRecord, DeveloperIdentity, Dimension, DimensionScore, StatValue};
use crate::settings::{CommitQualityConfig, ProgressConfig};

const STAT_COLUMNS: &[&str] = &["early_commits", "late_commits", "early_quality", "late_quality", "quality_delta"];

pub struct ProgressAnalyzer {
    quality: CommitQualityAnalyzer,
    split_ratio: f64,
    min_commits: usize,
}

impl ProgressAnalyzer {
    pub fn new(config: &ProgressConfig, quality: &CommitQualityConfig) -> Self {
        Self {
            quality: CommitQualityAnalyzer::new(quality),
            split_ratio: config.split_ratio,
            min_commits: config.min_commits_per_period,
        }
    }

    /// Split at `first + span * split_ratio`; commits at the split point are late
    pub fn split_periods<'a>(&self, commits: &[&'a CommitRecord]) -> (Vec<&'a CommitRecord>, Vec<&'a CommitRecord>) {
        let Some(first) = commits.iter().map(|c| c.authored_date).min() else {
            return (Vec::new(), Vec::new());
        };
        let last = commits.iter().map(|c| c.authored_date).max().unwrap_or(first);
        let span_ms = (last - first).num_milliseconds() as f64;
        let split = first + Duration::milliseconds((span_ms * self.split_ratio) as i64);

        commits.iter().copied().partition(|c| c.authored_date < split)
    }
}

impl Analyzer for ProgressAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::Progress
    }

    fn stat_columns(&self) -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore {
        let commits = facts.commits_for(&identity.email);
        let (early, late) = self.split_periods(commits);
        if early.len() < self.min_commits || late.len() < self.min_commits {
            return self.empty_score(&identity.email);
        }

        let (Some(early_quality), Some(late_quality)) = (self.quality.evaluate(&early), self.quality.evaluate(&late)) else {
            return self.empty_score(&identity.email);
        };
        let early_score = early_quality.overall();
        let late_score = late_quality.overall();
        let delta = late_score - early_score;

        let stats = vec![
            ("early_commits", StatValue::Count(early.len() as u64)),
            ("late_commits", StatValue::Count(late.len() as u64)),
            ("early_quality", StatValue::Rate(round2(early_score))),
            ("late_quality", StatValue::Rate(round2(late_score))),
            ("quality_delta", StatValue::Rate(round2(delta))),
        ];
        DimensionScore::new(
            &identity.email,
            Dimension::Progress,
            round2((5.0 + delta).clamp(0.0, 10.0)),
            commits.len() as u64,
            stats,
        )
    }
}
