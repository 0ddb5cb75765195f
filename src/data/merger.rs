//! Data Merger
//!
//! Turns the raw collector tables into the canonical processed tables:
//! one identity per email, one commit per SHA, file changes without noise,
//! and review comments tagged as substantive or rubber-stamp.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use log::{debug, info};

use crate::data::records::{
    CommitRecord, DeveloperIdentity, FileChangeRecord, GitAuthorRow, IdentitySource,
    MergeRequestAuthorRow, ReviewCommentRecord,
};
use crate::rules::ExclusionRules;
use crate::settings::CodeReviewConfig;

/// Alias email -> canonical email, both lower-cased
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasMap {
    aliases: BTreeMap<String, String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: &str, canonical: &str) {
        let alias = alias.trim().to_lowercase();
        let canonical = canonical.trim().to_lowercase();
        if !alias.is_empty() && !canonical.is_empty() && alias != canonical {
            self.aliases.insert(alias, canonical);
        }
    }

    /// Canonical form of an email (itself when not aliased)
    ///
    /// Chains are followed to their end. A cycle resolves to its smallest
    /// member so every email on it lands on the same identity.
    pub fn resolve<'a>(&'a self, email: &'a str) -> &'a str {
        let mut path = vec![email];
        let mut current = email;
        while let Some(next) = self.aliases.get(current) {
            let next = next.as_str();
            if let Some(start) = path.iter().position(|seen| *seen == next) {
                return path[start..].iter().min().copied().unwrap_or(next);
            }
            path.push(next);
            current = next;
        }
        current
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.aliases.iter()
    }
}

impl<A: AsRef<str>, C: AsRef<str>> FromIterator<(A, C)> for AliasMap {
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        let mut map = AliasMap::new();
        for (alias, canonical) in iter {
            map.insert(alias.as_ref(), canonical.as_ref());
        }
        map
    }
}

/// The three identity sources, in precedence order
#[derive(Debug, Clone, Default)]
pub struct IdentitySources<'a> {
    pub git_authors: &'a [GitAuthorRow],
    pub merge_request_authors: &'a [MergeRequestAuthorRow],
    pub gitlab_commits: &'a [CommitRecord],
}

/// Merged commit table with drop counters
#[derive(Debug, Clone, PartialEq)]
pub struct CommitMerge {
    pub commits: Vec<CommitRecord>,
    pub duplicates: usize,
    pub excluded: usize,
}

/// Inclusive authored-date window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(since: Option<NaiveDate>, until: Option<NaiveDate>) -> Self {
        Self { since, until }
    }

    pub fn is_unbounded(&self) -> bool {
        self.since.is_none() && self.until.is_none()
    }

    /// Compares the author's local calendar date
    pub fn contains(&self, commit: &CommitRecord) -> bool {
        let date = commit.authored_date.date_naive();
        self.since.map_or(true, |since| date >= since) && self.until.map_or(true, |until| date <= until)
    }
}

/// Merge and clean operations over in-memory tables
pub struct DataMerger<'a> {
    rules: &'a ExclusionRules,
    review: &'a CodeReviewConfig,
    aliases: &'a AliasMap,
}

impl<'a> DataMerger<'a> {
    pub fn new(rules: &'a ExclusionRules, review: &'a CodeReviewConfig, aliases: &'a AliasMap) -> Self {
        Self { rules, review, aliases }
    }

    /// Build the identity table from the three sources, then collapse aliases.
    /// Sorted by commit count descending, then email.
    pub fn unify_developers(&self, sources: &IdentitySources<'_>) -> Vec<DeveloperIdentity> {
        let mut identities: HashMap<String, DeveloperIdentity> = HashMap::new();

        for row in sources.git_authors {
            let email = row.email.trim().to_lowercase();
            if email.is_empty() || self.rules.is_bot(&row.name, &email) {
                continue;
            }
            identities.entry(email).or_insert_with_key(|email| {
                let mut identity = DeveloperIdentity::new(email, &row.name, IdentitySource::Git);
                identity.commit_count = row.commit_count;
                identity
            });
        }

        for row in sources.merge_request_authors {
            let username = row.author_username.trim();
            if self.rules.is_bot(&row.author_name, &row.author_email)
                || self.rules.is_bot(username, "")
            {
                continue;
            }

            let email = row.author_email.trim().to_lowercase();
            if email.is_empty() {
                // GitLab hides emails on most MR payloads; fall back to the display name
                let name = row.author_name.trim();
                if let Some(identity) = identities
                    .values_mut()
                    .filter(|i| i.username.is_empty() && !i.name.is_empty() && i.name.eq_ignore_ascii_case(name))
                    .min_by(|a, b| a.email.cmp(&b.email))
                {
                    identity.username = username.to_string();
                }
                continue;
            }

            let identity = identities.entry(email).or_insert_with_key(|email| {
                DeveloperIdentity::new(email, &row.author_name, IdentitySource::GitlabMr)
            });
            if identity.username.is_empty() {
                identity.username = username.to_string();
            }
        }

        for commit in sources.gitlab_commits {
            let email = commit.author_email.trim().to_lowercase();
            if self.rules.is_bot(&commit.author_name, &email) {
                continue;
            }
            if let Some(identity) = identities.get_mut(&email) {
                identity.commit_count += 1;
            }
        }

        let mut unified = self.collapse_aliases(identities);
        unified.sort_by(|a, b| b.commit_count.cmp(&a.commit_count).then_with(|| a.email.cmp(&b.email)));
        info!("Unified {} developer identities", unified.len());
        unified
    }

    fn collapse_aliases(&self, mut identities: HashMap<String, DeveloperIdentity>) -> Vec<DeveloperIdentity> {
        for alias in self.aliases.iter().map(|(alias, _)| alias) {
            let canonical = self.aliases.resolve(alias);
            if canonical == alias.as_str() {
                continue;
            }
            let Some(alias_row) = identities.remove(alias) else {
                continue;
            };
            debug!("Collapsing identity {} into {}", alias, canonical);

            match identities.get_mut(canonical) {
                Some(target) => {
                    target.commit_count += alias_row.commit_count;
                    if target.username.is_empty() {
                        target.username = alias_row.username;
                    }
                    if target.name.is_empty() {
                        target.name = alias_row.name;
                    }
                }
                None => {
                    let mut target = alias_row;
                    target.email = canonical.to_string();
                    identities.insert(canonical.to_string(), target);
                }
            }
        }
        identities.into_values().collect()
    }

    /// Concatenate, keep the first row per SHA, then drop excluded titles
    pub fn merge_commits(&self, local: &[CommitRecord], api: &[CommitRecord]) -> CommitMerge {
        let mut seen = HashSet::new();
        let mut duplicates = 0;
        let mut excluded = 0;
        let mut commits = Vec::with_capacity(local.len() + api.len());

        for commit in local.iter().chain(api) {
            if !seen.insert(commit.commit_sha.as_str()) {
                duplicates += 1;
                continue;
            }
            if self.rules.is_excluded_commit_title(&commit.title) {
                excluded += 1;
                continue;
            }
            commits.push(commit.clone());
        }

        debug!(
            "Merged commits: {} kept, {} duplicate(s), {} excluded",
            commits.len(),
            duplicates,
            excluded
        );
        CommitMerge { commits, duplicates, excluded }
    }

    /// Drop generated/vendored paths and derive extensions. No dedup.
    pub fn clean_file_changes(&self, raw: &[FileChangeRecord]) -> Vec<FileChangeRecord> {
        raw.iter()
            .filter(|change| !self.rules.is_excluded_path(&change.file_path))
            .map(|change| change.clone().normalized())
            .collect()
    }

    /// Tag each comment; no row is dropped
    pub fn classify_reviews(&self, raw: &[ReviewCommentRecord]) -> Vec<ReviewCommentRecord> {
        raw.iter()
            .map(|comment| {
                let mut comment = comment.clone();
                comment.is_lgtm_only = self.is_lgtm_only(&comment.body);
                comment.is_substantive = !comment.is_lgtm_only;
                comment
            })
            .collect()
    }

    pub fn is_lgtm_only(&self, body: &str) -> bool {
        let trimmed = body.trim();
        if trimmed.chars().count() < self.review.min_substantive_chars {
            return true;
        }
        let lowered = trimmed.to_lowercase();
        self.review
            .lgtm_keywords
            .iter()
            .any(|keyword| lowered.contains(&keyword.to_lowercase()))
    }

    /// Rewrite author emails through the alias map
    pub fn apply_aliases(&self, commits: &mut [CommitRecord], changes: &mut [FileChangeRecord]) {
        if self.aliases.is_empty() {
            return;
        }
        for commit in commits.iter_mut() {
            let canonical = self.aliases.resolve(&commit.author_email).to_string();
            commit.author_email = canonical;
        }
        for change in changes.iter_mut() {
            let canonical = self.aliases.resolve(&change.author_email).to_string();
            change.author_email = canonical;
        }
    }
}

/// Keep commits inside the window, and the file changes of surviving commits
pub fn filter_by_date(
    commits: Vec<CommitRecord>,
    changes: Vec<FileChangeRecord>,
    window: &DateWindow,
) -> (Vec<CommitRecord>, Vec<FileChangeRecord>) {
    if window.is_unbounded() {
        return (commits, changes);
    }

    let commits: Vec<CommitRecord> = commits.into_iter().filter(|c| window.contains(c)).collect();
    let kept: HashSet<&str> = commits.iter().map(|c| c.commit_sha.as_str()).collect();
    let changes = changes
        .into_iter()
        .filter(|change| kept.contains(change.commit_sha.as_str()))
        .collect();
    (commits, changes)
}
