//! Grade tiers

use std::fmt;

use serde::Serialize;

use crate::settings::GradingConfig;

/// Developer grade, ordered junior < mid < senior
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Junior,
    Mid,
    Senior,
}

impl Grade {
    /// Highest first
    pub const ALL: [Grade; 3] = [Grade::Senior, Grade::Mid, Grade::Junior];

    /// First tier whose threshold the score reaches, scanning high to low
    pub fn for_score(score: f64, config: &GradingConfig) -> Self {
        if score >= config.senior_threshold {
            Grade::Senior
        } else if score >= config.mid_threshold {
            Grade::Mid
        } else {
            Grade::Junior
        }
    }

    pub fn level(&self) -> &'static str {
        match self {
            Grade::Senior => "senior",
            Grade::Mid => "mid",
            Grade::Junior => "junior",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Grade::Senior => "🏆 Senior Engineer",
            Grade::Mid => "⭐ Mid-level Engineer",
            Grade::Junior => "🌱 Junior Engineer",
        }
    }

    pub fn from_level(level: &str) -> Option<Self> {
        Grade::ALL.into_iter().find(|g| g.level().eq_ignore_ascii_case(level.trim()))
    }

    /// Typical profile of a developer at this tier
    pub fn description(&self) -> &'static [&'static str] {
        match self {
            Grade::Senior => &[
                "Conventional message rate 90%+",
                "Small changes make up 80%+ of commits",
                "Works across 3+ tech stacks",
                "Fix rate below 15%",
                "Makes architecture-level changes",
                "Active reviewer who catches critical issues",
            ],
            Grade::Mid => &[
                "Conventional message rate 60-90%",
                "Reasonable change granularity",
                "Works across 2-3 tech stacks",
                "Fix rate 15-30%",
                "Mostly feature development",
                "Takes part in code review, with moderate depth",
            ],
            Grade::Junior => &[
                "Commit messages do not follow a convention",
                "Many corrective commits",
                "Single tech stack",
                "Changes concentrated in a narrow area",
                "Little code review, or LGTM only",
            ],
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        let config = GradingConfig::default();
        assert_eq!(Grade::for_score(10.0, &config), Grade::Senior);
        assert_eq!(Grade::for_score(8.0, &config), Grade::Senior);
        assert_eq!(Grade::for_score(7.99, &config), Grade::Mid);
        assert_eq!(Grade::for_score(5.0, &config), Grade::Mid);
        assert_eq!(Grade::for_score(4.99, &config), Grade::Junior);
        assert_eq!(Grade::for_score(0.0, &config), Grade::Junior);
    }

    #[test]
    fn test_level_round_trip() {
        for grade in Grade::ALL {
            assert_eq!(Grade::from_level(grade.level()), Some(grade));
        }
        assert_eq!(Grade::from_level("principal"), None);
    }
}
