//! Pipeline Stages
//!
//! Stage orchestration over a raw input directory and a processed output
//! directory. Stages communicate only through the CSV tables on disk, so any
//! stage can be re-run on its own against the cached output of the previous
//! one.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::analyzers::{analyzer_for, FactTables};
use crate::data::merger::{filter_by_date, AliasMap, DataMerger, DateWindow, IdentitySources};
use crate::data::records::{
    round2, CommitRecord, CommitSource, DeveloperIdentity, Dimension, DimensionScore,
    FileChangeRecord, FinalScore, GitAuthorRow, MergeRequestAuthorRow, ReviewCommentRecord,
};
use crate::data::tables::{read_table, write_records, write_table, LoadedTable, TableError};
use crate::rules::ExclusionRules;
use crate::scoring::{ScoreAggregator, ScoreSheet};
use crate::settings::{ConfigError, ScoringConfig};

/// Raw collector tables
pub mod raw {
    pub const GIT_DEVELOPERS: &str = "git_developers.csv";
    pub const MERGE_REQUESTS: &str = "gitlab_merge_requests.csv";
    pub const GIT_COMMITS: &str = "git_commits.csv";
    pub const GITLAB_COMMITS: &str = "gitlab_commits.csv";
    pub const FILE_CHANGES: &str = "git_file_changes.csv";
    pub const REVIEW_COMMENTS: &str = "gitlab_review_comments.csv";
}

/// Processed tables written by the merge and score stages
pub mod processed {
    pub const DEVELOPERS: &str = "unified_developers.csv";
    pub const COMMITS: &str = "all_commits_merged.csv";
    pub const FILE_CHANGES: &str = "file_changes_cleaned.csv";
    pub const REVIEWS: &str = "all_reviews_merged.csv";
    pub const FINAL_SCORES: &str = "final_scores.csv";
}

pub const DEFAULT_INPUT_DIR: &str = "output/raw";
pub const DEFAULT_OUTPUT_DIR: &str = "output/processed";

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown stage '{name}' (see --list-stages)")]
    UnknownStage { name: String },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One runnable unit of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Merge,
    Analyze(Dimension),
    Score,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Merge => "merge",
            Stage::Analyze(dimension) => dimension.stage_name(),
            Stage::Score => "score",
        }
    }

    pub fn description(&self) -> String {
        match self {
            Stage::Merge => "Unify identities, merge commits, clean file changes, classify reviews".to_string(),
            Stage::Analyze(dimension) => format!("Score the {} dimension", dimension.label().to_lowercase()),
            Stage::Score => "Combine dimension scores into final scores and grades".to_string(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stage names with a one-line description, in pipeline order. Includes the
/// `analyze` and `all` groups.
pub fn list_stages() -> Vec<(String, String)> {
    let mut stages = vec![(Stage::Merge.name().to_string(), Stage::Merge.description())];
    stages.push(("analyze".to_string(), "Run every dimension analyzer".to_string()));
    stages.extend(
        Dimension::ALL
            .iter()
            .map(|d| (Stage::Analyze(*d).name().to_string(), Stage::Analyze(*d).description())),
    );
    stages.push((Stage::Score.name().to_string(), Stage::Score.description()));
    stages.push(("all".to_string(), "Run every stage (default)".to_string()));
    stages
}

/// Stages selected on the command line, always run in pipeline order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    stages: Vec<Stage>,
}

impl StagePlan {
    pub fn all() -> Self {
        let mut stages = vec![Stage::Merge];
        stages.extend(Dimension::ALL.iter().map(|d| Stage::Analyze(*d)));
        stages.push(Stage::Score);
        Self { stages }
    }

    /// Resolve stage names; no names means `all`
    pub fn parse<S: AsRef<str>>(names: &[S]) -> PipelineResult<Self> {
        if names.is_empty() {
            return Ok(Self::all());
        }

        let mut merge = false;
        let mut score = false;
        let mut dimensions = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_lowercase();
            match name.as_str() {
                "all" => return Ok(Self::all()),
                "merge" => merge = true,
                "score" => score = true,
                "analyze" => dimensions.extend(Dimension::ALL),
                other => match Dimension::from_stage_name(other) {
                    Some(dimension) => dimensions.push(dimension),
                    None => return Err(PipelineError::UnknownStage { name: other.to_string() }),
                },
            }
        }

        let mut stages = Vec::new();
        if merge {
            stages.push(Stage::Merge);
        }
        stages.extend(
            Dimension::ALL
                .iter()
                .filter(|d| dimensions.contains(d))
                .map(|d| Stage::Analyze(*d)),
        );
        if score {
            stages.push(Stage::Score);
        }
        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        self.stages
            .iter()
            .filter_map(|s| match s {
                Stage::Analyze(d) => Some(*d),
                _ => None,
            })
            .collect()
    }
}

/// Row and drop counters from the merge stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub developers: usize,
    pub commits: usize,
    pub duplicate_commits: usize,
    pub excluded_commits: usize,
    pub out_of_window_commits: usize,
    pub file_changes: usize,
    pub excluded_file_changes: usize,
    pub reviews: usize,
    pub lgtm_reviews: usize,
    /// Malformed raw rows across every input table
    pub skipped_rows: usize,
    /// Raw tables that were not found
    pub missing_tables: Vec<String>,
}

/// Outcome of one analyzer stage
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSummary {
    pub dimension: Dimension,
    pub developers: usize,
    /// Developers with data for this dimension
    pub available: usize,
    pub path: PathBuf,
}

/// Processed tables as read back from the output directory
#[derive(Debug, Clone, Default)]
pub struct ProcessedTables {
    pub developers: Vec<DeveloperIdentity>,
    pub commits: Vec<CommitRecord>,
    pub file_changes: Vec<FileChangeRecord>,
    pub reviews: Vec<ReviewCommentRecord>,
}

impl ProcessedTables {
    pub fn load(output_dir: &Path) -> PipelineResult<Self> {
        Ok(Self {
            developers: read_table(&output_dir.join(processed::DEVELOPERS))?.rows,
            commits: read_table(&output_dir.join(processed::COMMITS))?.rows,
            file_changes: read_table(&output_dir.join(processed::FILE_CHANGES))?.rows,
            reviews: read_table(&output_dir.join(processed::REVIEWS))?.rows,
        })
    }
}

/// Stage runner bound to one configuration and one pair of directories
pub struct Pipeline<'a> {
    config: &'a ScoringConfig,
    rules: ExclusionRules,
    aliases: AliasMap,
    window: DateWindow,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    /// Compiles the exclusion rules; pattern errors are fatal here
    pub fn new(config: &'a ScoringConfig, input_dir: &Path, output_dir: &Path) -> PipelineResult<Self> {
        Ok(Self {
            config,
            rules: ExclusionRules::compile(&config.exclusions)?,
            aliases: AliasMap::new(),
            window: DateWindow::default(),
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn with_aliases(mut self, aliases: AliasMap) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_window(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Merge stage: raw tables in, the four processed tables out
    pub fn process_all(&self) -> PipelineResult<MergeSummary> {
        let mut summary = MergeSummary::default();

        let git_authors: Vec<GitAuthorRow> = self.load_raw(raw::GIT_DEVELOPERS, &mut summary)?.rows;
        let merge_requests: Vec<MergeRequestAuthorRow> = self.load_raw(raw::MERGE_REQUESTS, &mut summary)?.rows;
        let local_commits = self.load_commits(raw::GIT_COMMITS, CommitSource::GitLocal, &mut summary)?;
        let api_commits = self.load_commits(raw::GITLAB_COMMITS, CommitSource::GitlabApi, &mut summary)?;
        let raw_changes: Vec<FileChangeRecord> = self.load_raw(raw::FILE_CHANGES, &mut summary)?.rows;
        let raw_reviews: Vec<ReviewCommentRecord> = self.load_raw(raw::REVIEW_COMMENTS, &mut summary)?.rows;

        let merger = DataMerger::new(&self.rules, &self.config.code_review, &self.aliases);

        let developers = merger.unify_developers(&IdentitySources {
            git_authors: &git_authors,
            merge_request_authors: &merge_requests,
            gitlab_commits: &api_commits,
        });

        let merged = merger.merge_commits(&local_commits, &api_commits);
        summary.duplicate_commits = merged.duplicates;
        summary.excluded_commits = merged.excluded;

        let mut file_changes = merger.clean_file_changes(&raw_changes);
        summary.excluded_file_changes = raw_changes.len() - file_changes.len();

        let mut commits = merged.commits;
        merger.apply_aliases(&mut commits, &mut file_changes);

        let before_window = commits.len();
        let (commits, file_changes) = filter_by_date(commits, file_changes, &self.window);
        summary.out_of_window_commits = before_window - commits.len();
        if !self.window.is_unbounded() {
            info!(
                "Date window {} to {} kept {} of {} commits",
                self.window.since.map_or_else(|| "start".to_string(), |d| d.to_string()),
                self.window.until.map_or_else(|| "now".to_string(), |d| d.to_string()),
                commits.len(),
                before_window
            );
        }

        let reviews = merger.classify_reviews(&raw_reviews);

        summary.developers = developers.len();
        summary.commits = commits.len();
        summary.file_changes = file_changes.len();
        summary.reviews = reviews.len();
        summary.lgtm_reviews = reviews.iter().filter(|r| r.is_lgtm_only).count();

        write_table(&self.output_path(processed::DEVELOPERS), DeveloperIdentity::COLUMNS, &developers)?;
        write_table(&self.output_path(processed::COMMITS), CommitRecord::COLUMNS, &commits)?;
        write_table(&self.output_path(processed::FILE_CHANGES), FileChangeRecord::COLUMNS, &file_changes)?;
        write_table(&self.output_path(processed::REVIEWS), ReviewCommentRecord::COLUMNS, &reviews)?;

        info!(
            "Merge complete: {} developers, {} commits, {} file changes, {} reviews",
            summary.developers, summary.commits, summary.file_changes, summary.reviews
        );
        Ok(summary)
    }

    /// Run one analyzer over the processed tables and write its score file
    pub fn run_analyzer(&self, dimension: Dimension, tables: &ProcessedTables) -> PipelineResult<DimensionSummary> {
        let analyzer = analyzer_for(dimension, self.config);
        let facts = FactTables::new(&tables.commits, &tables.file_changes, &tables.reviews);
        let scores = analyzer.analyze_all(&tables.developers, &facts);

        let path = self.output_path(&dimension.file_name());
        write_dimension_scores(&path, dimension, analyzer.stat_columns(), &tables.developers, &scores)?;

        let available = scores.iter().filter(|s| s.available_score().is_some()).count();
        info!(
            "{}: scored {} developer(s), {} with data",
            dimension.label(),
            scores.len(),
            available
        );
        Ok(DimensionSummary { dimension, developers: scores.len(), available, path })
    }

    /// Score stage: combine every dimension file found in the output directory
    pub fn run_score(&self) -> PipelineResult<Vec<FinalScore>> {
        let developers: Vec<DeveloperIdentity> = read_table(&self.output_path(processed::DEVELOPERS))?.rows;

        let mut sheet = ScoreSheet::new();
        for dimension in Dimension::ALL {
            let loaded = read_dimension_scores(&self.output_path(&dimension.file_name()), dimension)?;
            if loaded.missing {
                continue;
            }
            for (email, score) in loaded.rows {
                sheet.insert(&email, dimension, score);
            }
        }

        let aggregator = ScoreAggregator::new(&self.config.weights, &self.config.grading);
        let results = aggregator.aggregate(&developers, &sheet);
        write_final_scores(&self.output_path(processed::FINAL_SCORES), &results)?;
        Ok(results)
    }

    fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    fn load_raw<T: serde::de::DeserializeOwned>(
        &self,
        name: &str,
        summary: &mut MergeSummary,
    ) -> PipelineResult<LoadedTable<T>> {
        let loaded = read_table(&self.input_dir.join(name))?;
        summary.skipped_rows += loaded.skipped;
        if loaded.missing {
            summary.missing_tables.push(name.to_string());
        }
        Ok(loaded)
    }

    fn load_commits(
        &self,
        name: &str,
        source: CommitSource,
        summary: &mut MergeSummary,
    ) -> PipelineResult<Vec<CommitRecord>> {
        let loaded: LoadedTable<CommitRecord> = self.load_raw(name, summary)?;
        debug!("{}: {} commit row(s)", name, loaded.len());
        Ok(loaded.map_rows(|c| c.normalized().with_source(source)).rows)
    }
}

/// Columns: email, name, `<dimension>_score`, sample_size, then the stats
pub fn write_dimension_scores(
    path: &Path,
    dimension: Dimension,
    stat_columns: &[&str],
    developers: &[DeveloperIdentity],
    scores: &[DimensionScore],
) -> PipelineResult<()> {
    let mut headers = vec!["email".to_string(), "name".to_string(), dimension.score_column(), "sample_size".to_string()];
    headers.extend(stat_columns.iter().map(|c| c.to_string()));

    let names: HashMap<&str, &str> = developers.iter().map(|d| (d.email.as_str(), d.display_name())).collect();
    let records = scores.iter().map(|score| {
        let mut record = vec![
            score.email.clone(),
            names.get(score.email.as_str()).copied().unwrap_or("").to_string(),
            round2(score.score).to_string(),
            score.sample_size.to_string(),
        ];
        record.extend(stat_columns.iter().map(|column| {
            score.stat(column).map(|v| v.to_string()).unwrap_or_default()
        }));
        record
    });

    write_records(path, &headers, records)?;
    Ok(())
}

/// Available scores from one dimension file. A row is unavailable when its
/// score cell is empty or its sample size is zero.
pub fn read_dimension_scores(path: &Path, dimension: Dimension) -> PipelineResult<LoadedTable<(String, f64)>> {
    let loaded: LoadedTable<HashMap<String, String>> = read_table(path)?;
    let score_column = dimension.score_column();

    let mut rows = Vec::new();
    let mut skipped = loaded.skipped;
    for row in &loaded.rows {
        let email = row.get("email").map(|e| e.trim().to_lowercase()).unwrap_or_default();
        let cell = row.get(&score_column).map(|s| s.trim()).unwrap_or("");
        if email.is_empty() || cell.is_empty() {
            continue;
        }
        let sample_size = row
            .get("sample_size")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(1.0);
        if sample_size <= 0.0 {
            continue;
        }
        match cell.parse::<f64>() {
            Ok(score) if score.is_finite() => rows.push((email, score)),
            _ => {
                debug!("{}: unparseable score '{}' for {}", path.display(), cell, email);
                skipped += 1;
            }
        }
    }
    if skipped > loaded.skipped {
        warn!("{}: ignored {} unparseable score(s)", path.display(), skipped - loaded.skipped);
    }

    Ok(LoadedTable { rows, skipped, missing: loaded.missing })
}

/// Columns: email, username, name, one `<dimension>_score` per dimension,
/// final_score, grade, grade_level. Unavailable dimensions are empty cells.
pub fn write_final_scores(path: &Path, results: &[FinalScore]) -> PipelineResult<()> {
    let mut headers = vec!["email".to_string(), "username".to_string(), "name".to_string()];
    headers.extend(Dimension::ALL.iter().map(|d| d.score_column()));
    headers.extend(["final_score", "grade", "grade_level"].iter().map(|c| c.to_string()));

    let records = results.iter().map(|result| {
        let mut record = vec![result.email.clone(), result.username.clone(), result.name.clone()];
        record.extend(
            Dimension::ALL
                .iter()
                .map(|d| result.dimension_score(*d).map(|s| round2(s).to_string()).unwrap_or_default()),
        );
        record.push(result.final_score.to_string());
        record.push(result.grade.clone());
        record.push(result.grade_level.clone());
        record
    });

    write_records(path, &headers, records)?;
    Ok(())
}
