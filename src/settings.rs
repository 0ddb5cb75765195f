//! Scoring Configuration
//!
//! Weights, thresholds and exclusion lists for every pipeline stage. The
//! defaults are the calibrated values; `ConfigManager::get_scoring_config`
//! overlays values from the configuration file and `ScoringConfig::validate`
//! rejects inconsistent settings before any stage runs.
//!
//! Every section serializes flat (scalars and string lists only) so that an
//! exported configuration round-trips through the flattened `section -> key`
//! view used by the configuration manager.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::records::Dimension;
use crate::rules::{ConventionalCommitMatcher, ExclusionRules};

/// Allowed deviation of the weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-3;

/// Configuration errors, always fatal at startup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Dimension weights must sum to 1.0 (got {total:.4})")]
    WeightSum { total: f64 },

    #[error("Weight for {dimension} must not be negative (got {weight})")]
    NegativeWeight { dimension: String, weight: f64 },

    #[error("Small change cutoff ({small}) must be below the medium cutoff ({medium})")]
    ChangeSizeCutoffs { small: u64, medium: u64 },

    #[error("Invalid thresholds for {name}: {message}")]
    InvalidThresholds { name: String, message: String },

    #[error("Invalid work hours: {message}")]
    InvalidWorkHours { message: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid value for {section}.{key}: {value}")]
    InvalidValue { section: String, key: String, value: String },
}

/// Complete scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScoringConfig {
    pub weights: AnalysisWeights,
    pub commit_quality: CommitQualityConfig,
    pub contribution: ContributionConfig,
    pub tech_breadth: TechBreadthConfig,
    pub collaboration: CollaborationConfig,
    pub code_review: CodeReviewConfig,
    pub work_pattern: WorkPatternConfig,
    pub progress: ProgressConfig,
    pub exclusions: ExclusionConfig,
    pub grading: GradingConfig,
}

impl ScoringConfig {
    /// Validate every section. Pattern lists are compiled once here so that a
    /// bad glob or regex is reported before the pipeline starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.commit_quality.validate()?;
        self.contribution.validate()?;
        self.tech_breadth.validate()?;
        check_lower_is_better("collaboration.revert", self.collaboration.revert_good, self.collaboration.revert_excellent)?;
        self.code_review.validate()?;
        self.work_pattern.validate()?;
        self.progress.validate()?;
        self.grading.validate()?;
        ExclusionRules::compile(&self.exclusions)?;
        Ok(())
    }
}

/// Dimension weights (must sum to 1.0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnalysisWeights {
    pub contribution: f64,
    pub commit_quality: f64,
    pub tech_breadth: f64,
    pub collaboration: f64,
    pub code_review: f64,
    pub work_pattern: f64,
    pub progress: f64,
}

impl Default for AnalysisWeights {
    fn default() -> Self {
        Self {
            contribution: 0.12,
            commit_quality: 0.23,
            tech_breadth: 0.18,
            collaboration: 0.12,
            code_review: 0.10,
            work_pattern: 0.10,
            progress: 0.15,
        }
    }
}

impl AnalysisWeights {
    /// Weight assigned to a dimension
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Contribution => self.contribution,
            Dimension::CommitQuality => self.commit_quality,
            Dimension::TechBreadth => self.tech_breadth,
            Dimension::Collaboration => self.collaboration,
            Dimension::CodeReview => self.code_review,
            Dimension::WorkPattern => self.work_pattern,
            Dimension::Progress => self.progress,
        }
    }

    pub fn set(&mut self, dimension: Dimension, weight: f64) {
        let slot = match dimension {
            Dimension::Contribution => &mut self.contribution,
            Dimension::CommitQuality => &mut self.commit_quality,
            Dimension::TechBreadth => &mut self.tech_breadth,
            Dimension::Collaboration => &mut self.collaboration,
            Dimension::CodeReview => &mut self.code_review,
            Dimension::WorkPattern => &mut self.work_pattern,
            Dimension::Progress => &mut self.progress,
        };
        *slot = weight;
    }

    pub fn total(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.get(*d)).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for dimension in Dimension::ALL {
            let weight = self.get(dimension);
            if weight < 0.0 || !weight.is_finite() {
                return Err(ConfigError::NegativeWeight {
                    dimension: dimension.key().to_string(),
                    weight,
                });
            }
        }

        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum { total });
        }
        Ok(())
    }
}

/// Commit quality thresholds: message convention, change size, fix rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CommitQualityConfig {
    pub conventional_pattern: String,
    pub message_good: f64,
    pub message_excellent: f64,
    pub change_size_small: u64,
    pub change_size_medium: u64,
    pub size_good: f64,
    pub size_excellent: f64,
    pub fix_keywords: Vec<String>,
    /// Fix rate below which a developer is "good" (lower is better)
    pub fix_good: f64,
    pub fix_excellent: f64,
}

impl Default for CommitQualityConfig {
    fn default() -> Self {
        Self {
            conventional_pattern: ConventionalCommitMatcher::DEFAULT_PATTERN.to_string(),
            message_good: 0.40,
            message_excellent: 0.80,
            change_size_small: 100,
            change_size_medium: 500,
            size_good: 0.40,
            size_excellent: 0.60,
            fix_keywords: strings(&["fix", "bug", "hotfix", "revert", "修復", "修正"]),
            fix_good: 0.30,
            fix_excellent: 0.15,
        }
    }
}

impl CommitQualityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.change_size_small >= self.change_size_medium {
            return Err(ConfigError::ChangeSizeCutoffs {
                small: self.change_size_small,
                medium: self.change_size_medium,
            });
        }
        check_higher_is_better("commit-quality.message", self.message_good, self.message_excellent)?;
        check_higher_is_better("commit-quality.size", self.size_good, self.size_excellent)?;
        check_lower_is_better("commit-quality.fix", self.fix_good, self.fix_excellent)?;
        ConventionalCommitMatcher::new(&self.conventional_pattern)?;
        Ok(())
    }
}

/// Commit count step thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ContributionConfig {
    pub high: usize,
    pub stable: usize,
    pub medium: usize,
}

impl Default for ContributionConfig {
    fn default() -> Self {
        Self { high: 200, stable: 100, medium: 50 }
    }
}

impl ContributionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.medium < self.stable && self.stable < self.high) {
            return Err(ConfigError::InvalidThresholds {
                name: "contribution".to_string(),
                message: format!(
                    "expected medium < stable < high, got {} / {} / {}",
                    self.medium, self.stable, self.high
                ),
            });
        }
        Ok(())
    }
}

/// Tech stack count thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TechBreadthConfig {
    pub excellent: usize,
    pub fullstack: usize,
}

impl Default for TechBreadthConfig {
    fn default() -> Self {
        Self { excellent: 5, fullstack: 3 }
    }
}

impl TechBreadthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fullstack == 0 || self.fullstack >= self.excellent {
            return Err(ConfigError::InvalidThresholds {
                name: "tech-breadth".to_string(),
                message: format!(
                    "expected 0 < fullstack < excellent, got {} / {}",
                    self.fullstack, self.excellent
                ),
            });
        }
        Ok(())
    }
}

/// Revert rate thresholds (lower is better)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CollaborationConfig {
    pub revert_good: f64,
    pub revert_excellent: f64,
}

impl Default for CollaborationConfig {
    fn default() -> Self {
        Self { revert_good: 0.05, revert_excellent: 0.02 }
    }
}

/// Review depth and participation thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CodeReviewConfig {
    pub lgtm_keywords: Vec<String>,
    /// Bodies shorter than this (after trimming) never count as substantive
    pub min_substantive_chars: usize,
    pub depth_good: f64,
    pub depth_excellent: f64,
    pub participation_fair: f64,
    pub participation_good: f64,
    pub participation_excellent: f64,
    pub critical_keywords: Vec<String>,
    pub major_keywords: Vec<String>,
}

impl Default for CodeReviewConfig {
    fn default() -> Self {
        Self {
            lgtm_keywords: strings(&[
                "lgtm", "looks good", "看起來不錯", "沒問題", "👍", "✅", "approve", "approved",
            ]),
            min_substantive_chars: 5,
            depth_good: 0.50,
            depth_excellent: 0.80,
            participation_fair: 0.5,
            participation_good: 1.0,
            participation_excellent: 1.5,
            critical_keywords: strings(&[
                "sql injection", "xss", "cross-site scripting", "security", "vulnerability",
                "data loss", "資料遺失", "安全漏洞",
            ]),
            major_keywords: strings(&[
                "n+1", "performance", "memory leak", "race condition", "deadlock",
                "logic error", "邏輯錯誤", "效能問題", "記憶體洩漏",
            ]),
        }
    }
}

impl CodeReviewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_higher_is_better("code-review.depth", self.depth_good, self.depth_excellent)?;
        if !(0.0 < self.participation_fair
            && self.participation_fair < self.participation_good
            && self.participation_good < self.participation_excellent)
        {
            return Err(ConfigError::InvalidThresholds {
                name: "code-review.participation".to_string(),
                message: format!(
                    "expected 0 < fair < good < excellent, got {} / {} / {}",
                    self.participation_fair, self.participation_good, self.participation_excellent
                ),
            });
        }
        Ok(())
    }
}

/// Working hour windows (local hour of the author's timestamp)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WorkPatternConfig {
    pub work_hours_start: u32,
    pub work_hours_end: u32,
    pub late_night_start: u32,
    pub late_night_end: u32,
    pub work_hours_good: f64,
    pub work_hours_excellent: f64,
}

impl Default for WorkPatternConfig {
    fn default() -> Self {
        Self {
            work_hours_start: 9,
            work_hours_end: 18,
            late_night_start: 22,
            late_night_end: 6,
            work_hours_good: 0.40,
            work_hours_excellent: 0.60,
        }
    }
}

impl WorkPatternConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.work_hours_start >= self.work_hours_end || self.work_hours_end > 24 {
            return Err(ConfigError::InvalidWorkHours {
                message: format!(
                    "work hours {}-{} must be an increasing window within 0-24",
                    self.work_hours_start, self.work_hours_end
                ),
            });
        }
        // Late night wraps past midnight
        if self.late_night_start <= self.late_night_end || self.late_night_start > 23 {
            return Err(ConfigError::InvalidWorkHours {
                message: format!(
                    "late night window {}-{} must wrap past midnight",
                    self.late_night_start, self.late_night_end
                ),
            });
        }
        check_higher_is_better("work-pattern.work-hours", self.work_hours_good, self.work_hours_excellent)
    }

    pub fn is_work_hour(&self, hour: u32) -> bool {
        hour >= self.work_hours_start && hour < self.work_hours_end
    }

    pub fn is_late_night(&self, hour: u32) -> bool {
        hour >= self.late_night_start || hour < self.late_night_end
    }
}

/// Early vs late period comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProgressConfig {
    pub split_ratio: f64,
    pub min_commits_per_period: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { split_ratio: 0.5, min_commits_per_period: 3 }
    }
}

impl ProgressConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(ConfigError::InvalidThresholds {
                name: "progress".to_string(),
                message: format!("split-ratio must be inside (0, 1), got {}", self.split_ratio),
            });
        }
        if self.min_commits_per_period == 0 {
            return Err(ConfigError::InvalidThresholds {
                name: "progress".to_string(),
                message: "min-commits-per-period must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Noise filters applied before any analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExclusionConfig {
    pub bots: Vec<String>,
    pub file_patterns: Vec<String>,
    pub commit_patterns: Vec<String>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            bots: strings(&[
                "renovate", "dependabot", "gitlab-bot", "github-bot", "bot", "ci",
                "automation", "jenkins", "travis",
            ]),
            file_patterns: strings(&[
                "package-lock.json", "yarn.lock", "pnpm-lock.yaml", "Gemfile.lock",
                "poetry.lock", "composer.lock", "Cargo.lock", "dist/*", "build/*",
                "node_modules/*", "vendor/*", ".next/*", "out/*", "target/*", "*.min.js",
                "*.min.css", "*.map", "*.bundle.js",
            ]),
            commit_patterns: strings(&[
                "^Merge branch", "^Merge pull request", "^Merge remote-tracking",
                "^Initial commit", "^WIP", "^wip",
            ]),
        }
    }
}

/// Grade tier cutoffs (inclusive, scanned high to low)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GradingConfig {
    pub senior_threshold: f64,
    pub mid_threshold: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self { senior_threshold: 8.0, mid_threshold: 5.0 }
    }
}

impl GradingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0 <= self.mid_threshold
            && self.mid_threshold < self.senior_threshold
            && self.senior_threshold <= 10.0)
        {
            return Err(ConfigError::InvalidThresholds {
                name: "grading".to_string(),
                message: format!(
                    "expected 0 <= mid < senior <= 10, got {} / {}",
                    self.mid_threshold, self.senior_threshold
                ),
            });
        }
        Ok(())
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidThresholds {
            name: name.to_string(),
            message: format!("rate {} must be within 0.0-1.0", value),
        });
    }
    Ok(())
}

/// Rate where a higher ratio scores better: requires `0 < good < excellent <= 1`
fn check_higher_is_better(name: &str, good: f64, excellent: f64) -> Result<(), ConfigError> {
    check_rate(name, good)?;
    check_rate(name, excellent)?;
    if !(good > 0.0 && good < excellent) {
        return Err(ConfigError::InvalidThresholds {
            name: name.to_string(),
            message: format!("expected 0 < good < excellent, got {} / {}", good, excellent),
        });
    }
    Ok(())
}

/// Rate where a lower ratio scores better: requires `0 < excellent < good < 1`
fn check_lower_is_better(name: &str, good: f64, excellent: f64) -> Result<(), ConfigError> {
    check_rate(name, good)?;
    check_rate(name, excellent)?;
    if !(excellent > 0.0 && excellent < good && good < 1.0) {
        return Err(ConfigError::InvalidThresholds {
            name: name.to_string(),
            message: format!("expected 0 < excellent < good < 1, got {} / {}", excellent, good),
        });
    }
    Ok(())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScoringConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = AnalysisWeights::default();
        assert!((weights.total() - 1.0).abs() < WEIGHT_TOLERANCE);
        assert_eq!(weights.get(Dimension::CommitQuality), 0.23);
    }

    #[test]
    fn test_weight_sum_outside_tolerance_rejected() {
        let mut weights = AnalysisWeights::default();
        weights.set(Dimension::Progress, 0.20);
        match weights.validate() {
            Err(ConfigError::WeightSum { total }) => assert!((total - 1.05).abs() < 1e-9),
            other => panic!("expected WeightSum error, got {:?}", other),
        }
    }

    #[test]
    fn test_weight_sum_within_tolerance_accepted() {
        let mut weights = AnalysisWeights::default();
        weights.set(Dimension::Progress, 0.1505);
        assert!(weights.validate().is_ok());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut weights = AnalysisWeights::default();
        weights.set(Dimension::WorkPattern, -0.10);
        weights.set(Dimension::Progress, 0.35);
        assert!(matches!(weights.validate(), Err(ConfigError::NegativeWeight { .. })));
    }

    #[test]
    fn test_inverted_change_size_cutoffs_rejected() {
        let mut config = ScoringConfig::default();
        config.commit_quality.change_size_small = 500;
        config.commit_quality.change_size_medium = 500;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ChangeSizeCutoffs { small: 500, medium: 500 })
        );
    }

    #[test]
    fn test_inverted_rate_bands_rejected() {
        let mut config = ScoringConfig::default();
        config.commit_quality.message_good = 0.9;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThresholds { .. })));

        let mut config = ScoringConfig::default();
        config.commit_quality.fix_excellent = 0.4;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidThresholds { .. })));
    }

    #[test]
    fn test_work_hours_validation() {
        let mut config = WorkPatternConfig::default();
        assert!(config.validate().is_ok());

        config.work_hours_start = 18;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWorkHours { .. })));

        let mut config = WorkPatternConfig::default();
        config.late_night_start = 4;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWorkHours { .. })));
    }

    #[test]
    fn test_work_hour_windows() {
        let config = WorkPatternConfig::default();
        assert!(config.is_work_hour(9));
        assert!(config.is_work_hour(17));
        assert!(!config.is_work_hour(18));
        assert!(config.is_late_night(23));
        assert!(config.is_late_night(5));
        assert!(!config.is_late_night(6));
    }

    #[test]
    fn test_invalid_exclusion_pattern_rejected() {
        let mut config = ScoringConfig::default();
        config.exclusions.commit_patterns.push("^(unclosed".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_grading_thresholds_validation() {
        let mut config = GradingConfig::default();
        assert!(config.validate().is_ok());
        config.mid_threshold = 9.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serializes_flat_sections() {
        let rendered = toml::to_string(&ScoringConfig::default()).unwrap();
        assert!(rendered.contains("[commit-quality]"));
        assert!(rendered.contains("change-size-small = 100"));
        assert!(rendered.contains("[weights]"));
        let parsed: ScoringConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, ScoringConfig::default());
    }
}
