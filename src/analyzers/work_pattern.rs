//! Work pattern: share of commits authored inside working hours

use chrono::{Datelike, Timelike, Weekday};

use crate::analyzers::curve::{ratio, RisingCurve};
use crate::analyzers::{Analyzer, FactTables};
use crate::data::records::{round2, round4, DeveloperIdentity, Dimension, DimensionScore, StatValue};
use crate::settings::WorkPatternConfig;

const STAT_COLUMNS: &[&str] = &[
    "total_commits",
    "work_hours_commits",
    "work_hours_rate",
    "late_night_commits",
    "weekend_commits",
];

pub struct WorkPatternAnalyzer {
    config: WorkPatternConfig,
    curve: RisingCurve,
}

impl WorkPatternAnalyzer {
    pub fn new(config: &WorkPatternConfig) -> Self {
        Self {
            config: config.clone(),
            curve: RisingCurve::new(config.work_hours_good, config.work_hours_excellent, 6.0),
        }
    }
}

impl Analyzer for WorkPatternAnalyzer {
    fn dimension(&self) -> Dimension {
        Dimension::WorkPattern
    }

    fn stat_columns(&self) -> &'static [&'static str] {
        STAT_COLUMNS
    }

    fn analyze(&self, identity: &DeveloperIdentity, facts: &FactTables<'_>) -> DimensionScore {
        let commits = facts.commits_for(&identity.email);
        if commits.is_empty() {
            return self.empty_score(&identity.email);
        }

        let mut work_hours = 0;
        let mut late_night = 0;
        let mut weekend = 0;
        // Hours are read in the author's own offset
        for commit in commits {
            let hour = commit.authored_date.hour();
            if self.config.is_work_hour(hour) {
                work_hours += 1;
            }
            if self.config.is_late_night(hour) {
                late_night += 1;
            }
            if matches!(commit.authored_date.weekday(), Weekday::Sat | Weekday::Sun) {
                weekend += 1;
            }
        }

        let rate = ratio(work_hours, commits.len());
        let stats = vec![
            ("total_commits", StatValue::Count(commits.len() as u64)),
            ("work_hours_commits", StatValue::Count(work_hours as u64)),
            ("work_hours_rate", StatValue::Rate(round4(rate))),
            ("late_night_commits", StatValue::Count(late_night as u64)),
            ("weekend_commits", StatValue::Count(weekend as u64)),
        ];
        DimensionScore::new(
            &identity.email,
            Dimension::WorkPattern,
            round2(self.curve.score(rate)),
            commits.len() as u64,
            stats,
        )
    }
}
