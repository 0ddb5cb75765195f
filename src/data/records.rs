//! Table Row Types
//!
//! Typed rows for every table exchanged between pipeline stages. Defaults and
//! coercions happen here, at the parse boundary, so that downstream code only
//! sees validated values. A row that cannot be coerced (for example an
//! unparseable authored date) fails deserialization and is skipped by the
//! table loader.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Where an identity was first seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    #[default]
    Git,
    GitlabMr,
}

/// Canonical developer identity keyed by lower-cased email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeveloperIdentity {
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub commit_count: u64,
    #[serde(default)]
    pub source: IdentitySource,
}

impl DeveloperIdentity {
    pub const COLUMNS: &'static [&'static str] =
        &["email", "username", "name", "commit_count", "source"];

    pub fn new(email: &str, name: &str, source: IdentitySource) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            username: String::new(),
            name: name.trim().to_string(),
            commit_count: 0,
            source,
        }
    }

    /// Display label: name, falling back to username, then email
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if !self.username.is_empty() {
            &self.username
        } else {
            &self.email
        }
    }

    /// Whether `query` names this developer (email, username or name)
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        !query.is_empty()
            && (self.email.eq_ignore_ascii_case(query)
                || (!self.username.is_empty() && self.username.eq_ignore_ascii_case(query))
                || (!self.name.is_empty() && self.name.eq_ignore_ascii_case(query)))
    }
}

/// Row of `git_developers.csv` (local `git shortlog -sne`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitAuthorRow {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub commit_count: u64,
}

/// Author columns of `gitlab_merge_requests.csv`
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MergeRequestAuthorRow {
    pub author_email: String,
    pub author_username: String,
    pub author_name: String,
}

/// Origin of a commit row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSource {
    #[default]
    GitLocal,
    GitlabApi,
}

/// One commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub commit_sha: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub authored_date: DateTime<FixedOffset>,
    #[serde(
        default,
        serialize_with = "serialize_optional_timestamp",
        deserialize_with = "deserialize_optional_timestamp"
    )]
    pub committed_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub additions: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub deletions: u64,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub total: u64,
    #[serde(default)]
    pub source: CommitSource,
}

impl CommitRecord {
    pub const COLUMNS: &'static [&'static str] = &[
        "commit_sha", "author_email", "author_name", "authored_date", "committed_date", "title",
        "message", "additions", "deletions", "total", "source",
    ];

    /// Fill derived fields: lower-cased email, title from the message's first
    /// line, and `total` from additions + deletions when absent.
    pub fn normalized(mut self) -> Self {
        self.author_email = self.author_email.trim().to_lowercase();
        if self.title.trim().is_empty() {
            self.title = self.message.lines().next().unwrap_or("").trim().to_string();
        }
        if self.total == 0 {
            self.total = self.additions + self.deletions;
        }
        self
    }

    pub fn with_source(mut self, source: CommitSource) -> Self {
        self.source = source;
        self
    }

    /// Lower-cased title and message, for keyword scans
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.message).to_lowercase()
    }
}

/// One (commit, file) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChangeRecord {
    #[serde(default)]
    pub commit_sha: String,
    #[serde(default)]
    pub author_email: String,
    pub file_path: String,
    #[serde(default)]
    pub file_extension: String,
}

impl FileChangeRecord {
    pub const COLUMNS: &'static [&'static str] =
        &["commit_sha", "author_email", "file_path", "file_extension"];

    pub fn normalized(mut self) -> Self {
        self.author_email = self.author_email.trim().to_lowercase();
        self.file_path = self.file_path.trim().to_string();
        self.file_extension = crate::rules::file_extension(&self.file_path);
        self
    }
}

/// One non-system note on a merge request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCommentRecord {
    #[serde(alias = "author_username")]
    pub author: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, alias = "mr_iid", deserialize_with = "deserialize_optional_count")]
    pub merge_request_iid: Option<u64>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_lgtm_only: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_substantive: bool,
}

impl ReviewCommentRecord {
    pub const COLUMNS: &'static [&'static str] = &[
        "author", "author_name", "body", "merge_request_iid", "created_at", "is_lgtm_only",
        "is_substantive",
    ];
}

/// Scored facet of developer activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Contribution,
    CommitQuality,
    TechBreadth,
    Collaboration,
    CodeReview,
    WorkPattern,
    Progress,
}

impl Dimension {
    /// Every dimension, in report column order
    pub const ALL: [Dimension; 7] = [
        Dimension::CommitQuality,
        Dimension::Contribution,
        Dimension::TechBreadth,
        Dimension::Collaboration,
        Dimension::CodeReview,
        Dimension::WorkPattern,
        Dimension::Progress,
    ];

    /// Column and file name stem
    pub fn key(&self) -> &'static str {
        match self {
            Dimension::Contribution => "contribution",
            Dimension::CommitQuality => "commit_quality",
            Dimension::TechBreadth => "tech_breadth",
            Dimension::Collaboration => "collaboration",
            Dimension::CodeReview => "code_review",
            Dimension::WorkPattern => "work_pattern",
            Dimension::Progress => "progress",
        }
    }

    /// CLI stage name
    pub fn stage_name(&self) -> &'static str {
        match self {
            Dimension::Contribution => "contribution",
            Dimension::CommitQuality => "commit-quality",
            Dimension::TechBreadth => "tech-breadth",
            Dimension::Collaboration => "collaboration",
            Dimension::CodeReview => "code-review",
            Dimension::WorkPattern => "work-pattern",
            Dimension::Progress => "progress",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Contribution => "Contribution",
            Dimension::CommitQuality => "Commit Quality",
            Dimension::TechBreadth => "Tech Breadth",
            Dimension::Collaboration => "Collaboration",
            Dimension::CodeReview => "Code Review",
            Dimension::WorkPattern => "Work Pattern",
            Dimension::Progress => "Progress",
        }
    }

    pub fn score_column(&self) -> String {
        format!("{}_score", self.key())
    }

    pub fn file_name(&self) -> String {
        format!("{}_scores.csv", self.key())
    }

    pub fn from_stage_name(name: &str) -> Option<Dimension> {
        let name = name.trim().to_lowercase().replace('_', "-");
        Dimension::ALL.into_iter().find(|d| d.stage_name() == name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Supporting statistic value
#[derive(Debug, Clone, PartialEq)]
pub enum StatValue {
    Count(u64),
    Rate(f64),
    Text(String),
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Count(c) => Some(*c as f64),
            StatValue::Rate(r) => Some(*r),
            StatValue::Text(_) => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Count(c) => write!(f, "{}", c),
            StatValue::Rate(r) => write!(f, "{}", round4(*r)),
            StatValue::Text(t) => f.write_str(t),
        }
    }
}

/// One analyzer's verdict for one developer
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionScore {
    pub email: String,
    pub dimension: Dimension,
    /// Bounded to [0, 10]
    pub score: f64,
    /// Eligible events the score was derived from; 0 means "no data"
    pub sample_size: u64,
    pub stats: Vec<(&'static str, StatValue)>,
}

impl DimensionScore {
    pub fn new(
        email: &str,
        dimension: Dimension,
        score: f64,
        sample_size: u64,
        stats: Vec<(&'static str, StatValue)>,
    ) -> Self {
        Self {
            email: email.to_string(),
            dimension,
            score: score.clamp(0.0, 10.0),
            sample_size,
            stats,
        }
    }

    /// Score when the dimension had data for this developer
    pub fn available_score(&self) -> Option<f64> {
        (self.sample_size > 0).then_some(self.score)
    }

    pub fn stat(&self, name: &str) -> Option<&StatValue> {
        self.stats.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Weighted total and grade for one developer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalScore {
    pub email: String,
    pub username: String,
    pub name: String,
    /// `None` when the dimension had no data for this developer
    pub dimension_scores: Vec<(Dimension, Option<f64>)>,
    pub final_score: f64,
    pub grade: String,
    pub grade_level: String,
}

impl FinalScore {
    pub fn dimension_score(&self, dimension: Dimension) -> Option<f64> {
        self.dimension_scores
            .iter()
            .find(|(d, _)| *d == dimension)
            .and_then(|(_, s)| *s)
    }

    pub fn available_dimensions(&self) -> usize {
        self.dimension_scores.iter().filter(|(_, s)| s.is_some()).count()
    }
}

impl Serialize for Dimension {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Parse the timestamp layouts produced by `git log --date=iso` and the
/// GitLab API. Naive values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    for layout in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, layout) {
            return Some(dt);
        }
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, layout) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unparseable timestamp '{}'", raw)))
}

/// Optional timestamps are best effort: garbage becomes `None`
fn deserialize_optional_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn serialize_timestamp<S>(value: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339())
}

fn serialize_optional_timestamp<S>(
    value: &Option<DateTime<FixedOffset>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
        None => serializer.serialize_str(""),
    }
}

fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Some(0);
    }
    raw.parse::<u64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| *f >= 0.0 && f.is_finite()).map(|f| f as u64))
}

/// Integer count; empty and `NaN` cells read as 0, `12.0` reads as 12
fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_count(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid count '{}'", raw)))
}

fn deserialize_optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|r| !r.trim().is_empty())
        .and_then(|r| parse_count(&r)))
}

/// Boolean that also accepts `True`/`False`/`1`/`0`
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid boolean '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_git_iso_timestamp_keeps_offset() {
        let dt = parse_timestamp("2024-03-05 22:15:00 +0800").unwrap();
        assert_eq!(dt.hour(), 22);
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_parse_gitlab_api_timestamp() {
        let dt = parse_timestamp("2024-03-05T10:15:00.000+02:00").unwrap();
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_parse_naive_and_date_only_timestamps() {
        assert_eq!(parse_timestamp("2024-03-05 10:00:00").unwrap().hour(), 10);
        assert_eq!(parse_timestamp("2024-03-05").unwrap().hour(), 0);
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_count_coercion() {
        assert_eq!(parse_count("12"), Some(12));
        assert_eq!(parse_count("12.0"), Some(12));
        assert_eq!(parse_count(""), Some(0));
        assert_eq!(parse_count("NaN"), Some(0));
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("many"), None);
    }

    #[test]
    fn test_commit_normalization() {
        let commit = CommitRecord {
            commit_sha: "abc".to_string(),
            author_email: " Alice@Example.COM ".to_string(),
            author_name: "Alice".to_string(),
            authored_date: parse_timestamp("2024-01-01").unwrap(),
            committed_date: None,
            title: String::new(),
            message: "feat: add parser\n\nlong body".to_string(),
            additions: 10,
            deletions: 5,
            total: 0,
            source: CommitSource::GitLocal,
        }
        .normalized();

        assert_eq!(commit.author_email, "alice@example.com");
        assert_eq!(commit.title, "feat: add parser");
        assert_eq!(commit.total, 15);
    }

    #[test]
    fn test_dimension_names() {
        assert_eq!(Dimension::CommitQuality.score_column(), "commit_quality_score");
        assert_eq!(Dimension::TechBreadth.file_name(), "tech_breadth_scores.csv");
        assert_eq!(Dimension::from_stage_name("code-review"), Some(Dimension::CodeReview));
        assert_eq!(Dimension::from_stage_name("work_pattern"), Some(Dimension::WorkPattern));
        assert_eq!(Dimension::from_stage_name("unknown"), None);
    }

    #[test]
    fn test_dimension_score_is_clamped_and_availability_follows_sample_size() {
        let score = DimensionScore::new("a@x.io", Dimension::Progress, 12.5, 4, vec![]);
        assert_eq!(score.score, 10.0);
        assert_eq!(score.available_score(), Some(10.0));

        let empty = DimensionScore::new("a@x.io", Dimension::Progress, 0.0, 0, vec![]);
        assert_eq!(empty.available_score(), None);
    }

    #[test]
    fn test_identity_matching() {
        let mut identity = DeveloperIdentity::new("Alice@Example.com", "Alice Chen", IdentitySource::Git);
        identity.username = "achen".to_string();
        assert!(identity.matches("alice@example.com"));
        assert!(identity.matches("ACHEN"));
        assert!(identity.matches("alice chen"));
        assert!(!identity.matches("bob"));
        assert!(!identity.matches(""));
    }
}
