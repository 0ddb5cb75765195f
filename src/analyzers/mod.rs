//! Dimension Analyzers
//!
//! Each analyzer scores one facet of developer activity from the processed
//! tables. Analyzers share nothing but the read-only [`FactTables`] index, so
//! per-developer work fans out across the rayon pool.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::data::records::{
    CommitRecord, DeveloperIdentity, Dimension, DimensionScore, FileChangeRecord,
    ReviewCommentRecord, StatValue,
};
use crate::settings::ScoringConfig;

pub mod code_review;
pub mod collaboration;
pub mod commit_quality;
pub mod contribution;
pub mod curve;
pub mod progress;
pub mod tech_breadth;
pub mod work_pattern;

pub use code_review::CodeReviewAnalyzer;
pub use collaboration::CollaborationAnalyzer;
pub use commit_quality::CommitQualityAnalyzer;
pub use contribution::ContributionAnalyzer;
pub use progress::ProgressAnalyzer;
pub use tech_breadth::{DeveloperType, TechBreadthAnalyzer};
pub use work_pattern::WorkPatternAnalyzer;

/// Read-only per-author index over the processed tables
pub struct FactTables<'a> {
    commits: HashMap<&'a str, Vec<&'a CommitRecord>>,
    file_changes: HashMap<&'a str, Vec<&'a FileChangeRecord>>,
    reviews: &'a [ReviewCommentRecord],
    review_authors: usize,
}

impl<'a> FactTables<'a> {
    pub fn new(
        commits: &'a [CommitRecord],
        file_changes: &'a [FileChangeRecord],
        reviews: &'a [ReviewCommentRecord],
    ) -> Self {
        let mut commit_index: HashMap<&str, Vec<&CommitRecord>> = HashMap::new();
        for commit in commits {
            commit_index.entry(commit.author_email.as_str()).or_default().push(commit);
        }

        let mut change_index: HashMap<&str, Vec<&FileChangeRecord>> = HashMap::new();
        for change in file_changes {
            change_index.entry(change.author_email.as_str()).or_default().push(change);
        }

        let review_authors = reviews
            .iter()
            .map(|r| r.author.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect::<HashSet<_>>()
            .len();

        Self { commits: commit_index, file_changes: change_index, reviews, review_authors }
    }

    /// Commits authored under this email, in table order
    pub fn commits_for(&self, email: &str) -> &[&'a CommitRecord] {
        self.commits.get(email).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn file_changes_for(&self, email: &str) -> &[&'a FileChangeRecord] {
        self.file_changes.get(email).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Review comments whose author matches the identity's username, email or name
    pub fn reviews_for(&self, identity: &DeveloperIdentity) -> Vec<&'a ReviewCommentRecord> {
        self.reviews
            .iter()
            .filter(|r| identity.matches(&r.author) || (!r.author_name.is_empty() && identity.matches(&r.author_name)))
            .collect()
    }

    /// Mean review count per distinct reviewer
    pub fn team_review_average(&self) -> f64 {
        curve::ratio(self.reviews.len(), self.review_authors)
    }
}

/// One scored dimension
pub trait Analyzer: Send + Sync {
    fn dimension(&self) -> Dimension;

    /// Names of the supporting statistics, in output column order
    fn stat_columns(&self) -> &'static [&'static str];

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore;

    /// Result for a developer with no eligible rows
    fn empty_score(&self, email: &str) -> DimensionScore {
        let stats = self
            .stat_columns()
            .iter()
            .map(|name| (*name, StatValue::Count(0)))
            .collect();
        DimensionScore::new(email, self.dimension(), 0.0, 0, stats)
    }

    /// Score every identity in parallel; output follows identity order
    fn analyze_all(&self, identities: &[DeveloperIdentity], facts: &FactTables<'_>) -> Vec<DimensionScore> {
        identities
            .par_iter()
            .map(|identity| self.analyze(identity, facts))
            .collect()
    }
}

/// Build the analyzer for one dimension
pub fn analyzer_for(dimension: Dimension, config: &ScoringConfig) -> Box<dyn Analyzer> {
    match dimension {
        Dimension::CommitQuality => Box::new(CommitQualityAnalyzer::new(&config.commit_quality)),
        Dimension::Contribution => Box::new(ContributionAnalyzer::new(&config.contribution)),
        Dimension::TechBreadth => Box::new(TechBreadthAnalyzer::new(&config.tech_breadth)),
        Dimension::Collaboration => Box::new(CollaborationAnalyzer::new(&config.collaboration)),
        Dimension::CodeReview => Box::new(CodeReviewAnalyzer::new(&config.code_review)),
        Dimension::WorkPattern => Box::new(WorkPatternAnalyzer::new(&config.work_pattern)),
        Dimension::Progress => Box::new(ProgressAnalyzer::new(&config.progress, &config.commit_quality)),
    }
}
