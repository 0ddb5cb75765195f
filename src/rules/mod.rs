//! Exclusion and Classification Rules
//!
//! Static lookup tables used to strip noise before analysis: bot accounts,
//! generated or vendored files, merge/WIP commits. Also maps file extensions
//! onto tech-stack categories. Patterns are compiled once; every lookup is a
//! pure function of its input.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{Regex, RegexSet};
use serde::{Deserialize, Serialize};

use crate::settings::{ConfigError, ExclusionConfig};

/// Compiled noise filters
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    bots: Vec<String>,
    file_globs: GlobSet,
    commit_titles: RegexSet,
}

impl ExclusionRules {
    /// Compile the configured patterns
    pub fn compile(config: &ExclusionConfig) -> Result<Self, ConfigError> {
        let bots = config
            .bots
            .iter()
            .map(|b| b.trim().to_lowercase())
            .filter(|b| !b.is_empty())
            .collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &config.file_patterns {
            for expanded in expand_file_pattern(pattern) {
                let glob = Glob::new(&expanded).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
                builder.add(glob);
            }
        }
        let file_globs = builder.build().map_err(|e| ConfigError::InvalidPattern {
            pattern: config.file_patterns.join(", "),
            message: e.to_string(),
        })?;

        let commit_titles = RegexSet::new(&config.commit_patterns).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: config.commit_patterns.join(", "),
                message: e.to_string(),
            }
        })?;

        Ok(Self { bots, file_globs, commit_titles })
    }

    /// True when the name or email contains any bot marker (case-insensitive)
    pub fn is_bot(&self, name: &str, email: &str) -> bool {
        let name = name.to_lowercase();
        let email = email.to_lowercase();
        self.bots
            .iter()
            .any(|bot| name.contains(bot.as_str()) || email.contains(bot.as_str()))
    }

    /// True for generated, vendored or lock files. The empty path is excluded.
    pub fn is_excluded_path(&self, path: &str) -> bool {
        let path = path.trim();
        if path.is_empty() {
            return true;
        }
        self.file_globs.is_match(path.trim_start_matches("./"))
    }

    pub fn is_excluded_commit_title(&self, title: &str) -> bool {
        self.commit_titles.is_match(title)
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        // The built-in pattern lists are constants and always compile
        Self::compile(&ExclusionConfig::default())
            .unwrap_or_else(|e| panic!("built-in exclusion patterns are invalid: {}", e))
    }
}

/// A pattern without a leading wildcard also applies inside nested
/// directories (`dist/*` matches `web/dist/app.js`).
fn expand_file_pattern(pattern: &str) -> Vec<String> {
    let pattern = pattern.trim().trim_start_matches("./");
    if pattern.is_empty() {
        return Vec::new();
    }
    if pattern.starts_with('*') || pattern.starts_with('/') {
        vec![pattern.trim_start_matches('/').to_string()]
    } else {
        vec![pattern.to_string(), format!("**/{}", pattern)]
    }
}

/// Conventional Commits title grammar
#[derive(Debug, Clone)]
pub struct ConventionalCommitMatcher {
    pattern: Regex,
}

impl ConventionalCommitMatcher {
    pub const DEFAULT_PATTERN: &'static str =
        r"^(feat|fix|docs|refactor|test|chore|style|perf|ci|build|revert)(\(.+\))?: .+";

    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn is_match(&self, title: &str) -> bool {
        self.pattern.is_match(title)
    }
}

impl Default for ConventionalCommitMatcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATTERN)
            .unwrap_or_else(|e| panic!("built-in conventional commit pattern is invalid: {}", e))
    }
}

/// Tech-stack category of a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TechCategory {
    Frontend,
    Backend,
    Database,
    Devops,
    Config,
    Documentation,
}

impl TechCategory {
    pub fn name(&self) -> &'static str {
        match self {
            TechCategory::Frontend => "frontend",
            TechCategory::Backend => "backend",
            TechCategory::Database => "database",
            TechCategory::Devops => "devops",
            TechCategory::Config => "config",
            TechCategory::Documentation => "documentation",
        }
    }
}

impl fmt::Display for TechCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extension table, scanned in order; first match wins
const CATEGORY_EXTENSIONS: &[(TechCategory, &[&str])] = &[
    (
        TechCategory::Frontend,
        &[".js", ".ts", ".jsx", ".tsx", ".vue", ".svelte", ".css", ".scss", ".sass", ".less", ".html", ".htm"],
    ),
    (
        TechCategory::Backend,
        &[".cs", ".java", ".py", ".go", ".rb", ".php", ".rs", ".scala", ".kt", ".swift"],
    ),
    (TechCategory::Database, &[".sql", ".prisma", ".graphql"]),
    (
        TechCategory::Devops,
        &[".yml", ".yaml", ".sh", ".bash", ".ps1", ".tf", ".dockerfile"],
    ),
    (TechCategory::Config, &[".json", ".toml", ".xml", ".ini", ".env"]),
    (TechCategory::Documentation, &[".md", ".rst", ".txt", ".adoc"]),
];

/// Category of an extension (with leading dot, case-insensitive)
pub fn classify_extension(ext: &str) -> Option<TechCategory> {
    let ext = ext.trim().to_lowercase();
    if ext.is_empty() {
        return None;
    }
    CATEGORY_EXTENSIONS
        .iter()
        .find(|(_, exts)| exts.contains(&ext.as_str()))
        .map(|(category, _)| *category)
}

/// Distinct categories touched by a set of extensions
pub fn classify_extensions<'a, I>(extensions: I) -> BTreeSet<TechCategory>
where
    I: IntoIterator<Item = &'a str>,
{
    extensions.into_iter().filter_map(classify_extension).collect()
}

/// Lower-cased extension of a path's file name, with leading dot
pub fn file_extension(path: &str) -> String {
    let file_name = Path::new(path.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if file_name.eq_ignore_ascii_case("dockerfile") {
        return ".dockerfile".to_string();
    }

    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}
