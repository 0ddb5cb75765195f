//! Commit quality: message convention, change size and fix rate

use crate::analyzers::curve::{ratio, FallingCurve, RisingCurve};
use crate::analyzers::{Analyzer, FactTables};
use crate::data::records::{round2, round4, CommitRecord, DeveloperIdentity, Dimension, DimensionScore, StatValue};
use crate::rules::ConventionalCommitMatcher;
use crate::settings::CommitQualityConfig;

/// Fix rate above `fix_good` that costs two points
const FIX_RATE_DECAY: f64 = 0.1;

const STAT_COLUMNS: &[&str] = &[
    "total_commits",
    "message_score",
    "conventional_count",
    "conventional_rate",
    "size_score",
    "small_changes",
    "medium_changes",
    "large_changes",
    "small_rate",
    "fix_score",
    "fix_count",
    "fix_rate",
];

/// Change size bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSize {
    Small,
    Medium,
    Large,
}

/// Sub-scores for a set of commits
#[derive(Debug, Clone, PartialEq)]
pub struct QualityBreakdown {
    pub total_commits: usize,
    pub conventional_count: usize,
    pub small_changes: usize,
    pub medium_changes: usize,
    pub large_changes: usize,
    pub fix_count: usize,
    pub message_score: f64,
    pub size_score: f64,
    pub fix_score: f64,
}

impl QualityBreakdown {
    pub fn conventional_rate(&self) -> f64 {
        ratio(self.conventional_count, self.total_commits)
    }

    pub fn small_rate(&self) -> f64 {
        ratio(self.small_changes, self.total_commits)
    }

    pub fn fix_rate(&self) -> f64 {
        ratio(self.fix_count, self.total_commits)
    }

    /// Mean of the three sub-scores
    pub fn overall(&self) -> f64 {
        (self.message_score + self.size_score + self.fix_score) / 3.0
    }
}

pub struct CommitQualityAnalyzer {
    matcher: ConventionalCommitMatcher,
    small_cutoff: u64,
    medium_cutoff: u64,
    fix_keywords: Vec<String>,
    message_curve: RisingCurve,
    size_curve: RisingCurve,
    fix_curve: FallingCurve,
}

impl CommitQualityAnalyzer {
    /// Built from a validated configuration; an invalid pattern falls back to
    /// the built-in grammar.
    pub fn new(config: &CommitQualityConfig) -> Self {
        let matcher = ConventionalCommitMatcher::new(&config.conventional_pattern).unwrap_or_default();
        Self {
            matcher,
            small_cutoff: config.change_size_small,
            medium_cutoff: config.change_size_medium,
            fix_keywords: config.fix_keywords.iter().map(|k| k.to_lowercase()).collect(),
            message_curve: RisingCurve::new(config.message_good, config.message_excellent, 5.0),
            size_curve: RisingCurve::new(config.size_good, config.size_excellent, 6.0),
            fix_curve: FallingCurve::new(config.fix_good, config.fix_excellent, FIX_RATE_DECAY),
        }
    }

    pub fn classify_size(&self, total: u64) -> ChangeSize {
        if total <= self.small_cutoff {
            ChangeSize::Small
        } else if total <= self.medium_cutoff {
            ChangeSize::Medium
        } else {
            ChangeSize::Large
        }
    }

    pub fn is_fix(&self, commit: &CommitRecord) -> bool {
        let text = commit.searchable_text();
        self.fix_keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Score a commit set; `None` when it is empty
    pub fn evaluate(&self, commits: &[&CommitRecord]) -> Option<QualityBreakdown> {
        if commits.is_empty() {
            return None;
        }

        let mut breakdown = QualityBreakdown {
            total_commits: commits.len(),
            conventional_count: 0,
            small_changes: 0,
            medium_changes: 0,
            large_changes: 0,
            fix_count: 0,
            message_score: 0.0,
            size_score: 0.0,
            fix_score: 0.0,
        };

        for commit in commits {
            if self.matcher.is_match(&commit.title) {
                breakdown.conventional_count += 1;
            }
            match self.classify_size(commit.total) {
                ChangeSize::Small => breakdown.small_changes += 1,
                ChangeSize::Medium => breakdown.medium_changes += 1,
                ChangeSize::Large => breakdown.large_changes += 1,
            }
            if self.is_fix(commit) {
                breakdown.fix_count += 1;
            }
        }

        breakdown.message_score = self.message_curve.score(breakdown.conventional_rate());
        breakdown.size_score = self.size_curve.score(breakdown.small_rate());
        breakdown.fix_score = self.fix_curve.score(breakdown.fix_rate());
        Some(breakdown)
    }
}

impl Analyzer for CommitQualityAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::CommitQuality
    }

    fn stat_columns(&self) -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore {
        let commits = facts.commits_for(&identity.email);
        let Some(b) = self.evaluate(commits) else {
            return self.empty_score(&identity.email);
        };

        let stats = vec![
            ("total_commits", StatValue::Count(b.total_commits as u64)),
            ("message_score", StatValue::Rate(round2(b.message_score))),
            ("conventional_count", StatValue::Count(b.conventional_count as u64)),
            ("conventional_rate", StatValue::Rate(round4(b.conventional_rate()))),
            ("size_score", StatValue::Rate(round2(b.size_score))),
            ("small_changes", StatValue::Count(b.small_changes as u64)),
            ("medium_changes", StatValue::Count(b.medium_changes as u64)),
            ("large_changes", StatValue::Count(b.large_changes as u64)),
            ("small_rate", StatValue::Rate(round4(b.small_rate()))),
            ("fix_score", StatValue::Rate(round2(b.fix_score))),
            ("fix_count", StatValue::Count(b.fix_count as u64)),
            ("fix_rate", StatValue::Rate(round4(b.fix_rate()))),
        ];
        DimensionScore::new(
            &identity.email,
            Dimension::CommitQuality,
            round2(b.overall()),
            b.total_commits as u64,
            stats,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::fixtures::{commit, identity};

    fn analyzer() -> CommitQualityAnalyzer {
        CommitQualityAnalyzer::new(&CommitQualityConfig::default())
    }

    #[test]
    fn test_size_buckets_are_inclusive() {
        let analyzer = analyzer();
        assert_eq!(analyzer.classify_size(0), ChangeSize::Small);
        assert_eq!(analyzer.classify_size(100), ChangeSize::Small);
        assert_eq!(analyzer.classify_size(101), ChangeSize::Medium);
        assert_eq!(analyzer.classify_size(500), ChangeSize::Medium);
        assert_eq!(analyzer.classify_size(501), ChangeSize::Large);
    }

    #[test]
    fn test_fix_detection_uses_title_and_message() {
        let analyzer = analyzer();
        let mut c = commit("a", "dev@example.com", "chore: tidy", 5, "2024-01-01");
        assert!(!analyzer.is_fix(&c));
        c.message = "Resolves the login BUG".to_string();
        assert!(analyzer.is_fix(&c));
        let c = commit("b", "dev@example.com", "修正 登入流程", 5, "2024-01-01");
        assert!(analyzer.is_fix(&c));
    }

    /// 10 commits: 6 conventional, 7 small, 1 fix
    #[test]
    fn test_reference_developer_bands() {
        let email = "dev@example.com";
        let mut commits = Vec::new();
        for i in 0..10 {
            let title = match i {
                0 => "fix: null check".to_string(),
                1..=5 => format!("feat: feature {}", i),
                _ => format!("Update module {}", i),
            };
            let total = if i < 7 { 40 } else { 300 };
            commits.push(commit(&format!("c{}", i), email, &title, total, "2024-01-01"));
        }
        let facts = FactTables::new(&commits, &[], &[]);
        let score = analyzer().analyze(&identity(email), &facts);

        assert_eq!(score.sample_size, 10);
        assert_eq!(score.stat("conventional_rate"), Some(&StatValue::Rate(0.6)));
        assert_eq!(score.stat("small_rate"), Some(&StatValue::Rate(0.7)));
        assert_eq!(score.stat("fix_rate"), Some(&StatValue::Rate(0.1)));

        let message = score.stat("message_score").and_then(StatValue::as_f64).unwrap();
        let size = score.stat("size_score").and_then(StatValue::as_f64).unwrap();
        let fix = score.stat("fix_score").and_then(StatValue::as_f64).unwrap();
        assert!((5.0..9.0).contains(&message));
        assert!(size >= 9.0);
        assert!(fix >= 9.0);
        assert!((score.score - round2((7.0 + 9.25 + (9.0 + 0.05 / 0.15)) / 3.0)).abs() < 0.011);
    }

    #[test]
    fn test_no_commits_gives_empty_result() {
        let facts = FactTables::new(&[], &[], &[]);
        let score = analyzer().analyze(&identity("ghost@example.com"), &facts);
        assert_eq!(score.score, 0.0);
        assert_eq!(score.sample_size, 0);
        assert_eq!(score.available_score(), None);
        assert_eq!(score.stat("total_commits"), Some(&StatValue::Count(0)));
    }
}
