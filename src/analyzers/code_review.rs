//! Code review: comment depth and participation relative to the team

use crate::analyzers::curve::{ratio, RelativeCurve, RisingCurve};
use crate::analyzers::{Analyzer, FactTables};
use crate::data::records::{round2, round4, DeveloperIdentity, Dimension, DimensionScore, ReviewCommentRecord, StatValue};
use crate::settings::CodeReviewConfig;

const STAT_COLUMNS: &[&str] = &[
    "review_count",
    "substantive_count",
    "substantive_rate",
    "participation_ratio",
    "critical_findings",
    "major_findings",
];

pub struct CodeReviewAnalyzer {
    depth_curve: RisingCurve,
    participation_curve: RelativeCurve,
    critical_keywords: Vec<String>,
    major_keywords: Vec<String>,
}

impl CodeReviewAnalyzer {
    pub fn new(config: &CodeReviewConfig) -> Self {
        let lowered = |keywords: &[String]| -> Vec<String> { keywords.iter().map(|k| k.to_lowercase()).collect() };
        Self {
            depth_curve: RisingCurve::new(config.depth_good, config.depth_excellent, 5.0),
            participation_curve: RelativeCurve {
                fair: config.participation_fair,
                good: config.participation_good,
                excellent: config.participation_excellent,
            },
            critical_keywords: lowered(&config.critical_keywords),
            major_keywords: lowered(&config.major_keywords),
        }
    }

    fn count_findings(comments: &[&ReviewCommentRecord], keywords: &[String]) -> usize {
        comments
            .iter()
            .filter(|c| {
                let body = c.body.to_lowercase();
                keywords.iter().any(|k| body.contains(k.as_str()))
            })
            .count()
    }
}

impl Analyzer for CodeReviewAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::CodeReview
    }

    fn stat_columns(&self) -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore {
        let comments = facts.reviews_for(identity);
        if comments.is_empty() {
            return self.empty_score(&identity.email);
        }

        let substantive = comments.iter().filter(|c| c.is_substantive).count();
        let depth = ratio(substantive, comments.len());
        let team_average = facts.team_review_average();
        let participation = if team_average > 0.0 { comments.len() as f64 / team_average } else { 0.0 };

        let score = (self.depth_curve.score(depth) + self.participation_curve.score(participation)) / 2.0;
        let stats = vec![
            ("review_count", StatValue::Count(comments.len() as u64)),
            ("substantive_count", StatValue::Count(substantive as u64)),
            ("substantive_rate", StatValue::Rate(round4(depth))),
            ("participation_ratio", StatValue::Rate(round4(participation))),
            (
                "critical_findings",
                StatValue::Count(Self::count_findings(&comments, &self.critical_keywords) as u64),
            ),
            ("major_findings", StatValue::Count(Self::count_findings(&comments, &self.major_keywords) as u64)),
        ];
        DimensionScore::new(&identity.email, Dimension::CodeReview, round2(score), comments.len() as u64, stats)
    }
}
