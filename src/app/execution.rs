//! Application execution and stage management

use anyhow::{Context, Result};
use log::{debug, info, warn};
use crate::data::records::FinalScore;
use crate::display::{ProgressIndicator, StatusType};
use crate::output::{
    find_developer, format_compact_table, format_developer_report, format_grade_distribution,
    format_results_table, results_json, developer_json,
};
use crate::pipeline::{list_stages, MergeSummary, Pipeline, ProcessedTables, Stage, StagePlan};
use crate::scoring::grade_distribution;
use crate::settings::ScoringConfig;
use crate::{cli, config, display};

/// Print the stage table for `--list-stages`
pub fn handle_list_stages(colour_manager: &display::ColourManager) {
    println!("{}", colour_manager.highlight("Available stages:"));
    let rows: Vec<Vec<String>> = list_stages()
        .into_iter()
        .map(|(name, description)| vec![name, description])
        .collect();
    print!("{}", format_compact_table(&["Stage", "Description"], &rows));
    println!();
    println!("{}", colour_manager.highlight("Usage:"));
    println!("  devscore                      # run every stage");
    println!("  devscore merge analyze        # refresh the cached tables and dimension scores");
    println!("  devscore commit-quality score # re-score one dimension from cached tables");
}

/// Report the effective scoring configuration for `--validate-config`
pub fn handle_validate_config(
    config_manager: &config::ConfigManager,
    scoring: &ScoringConfig,
    colour_manager: &display::ColourManager,
) {
    match config_manager.config_file_path() {
        Some(path) => println!("Configuration file: {}", path.display()),
        None => println!("Configuration file: (none, using defaults)"),
    }

    let weights = &scoring.weights;
    let rows = vec![
        vec!["commit-quality".to_string(), format!("{:.2}", weights.commit_quality)],
        vec!["contribution".to_string(), format!("{:.2}", weights.contribution)],
        vec!["tech-breadth".to_string(), format!("{:.2}", weights.tech_breadth)],
        vec!["collaboration".to_string(), format!("{:.2}", weights.collaboration)],
        vec!["code-review".to_string(), format!("{:.2}", weights.code_review)],
        vec!["work-pattern".to_string(), format!("{:.2}", weights.work_pattern)],
        vec!["progress".to_string(), format!("{:.2}", weights.progress)],
    ];
    println!("{}", colour_manager.highlight("Dimension weights:"));
    print!("{}", format_compact_table(&["Dimension", "Weight"], &rows));
    println!(
        "Grades: senior >= {:.1}, mid >= {:.1}",
        scoring.grading.senior_threshold, scoring.grading.mid_threshold
    );
    println!("{}", colour_manager.success("Configuration is valid"));
}

/// Build the pipeline from arguments and configuration
pub fn build_pipeline<'a>(
    args: &cli::Args,
    config_manager: &config::ConfigManager,
    scoring: &'a ScoringConfig,
) -> Result<Pipeline<'a>> {
    let aliases = super::initialization::build_alias_map(args, config_manager)?;
    let window = super::initialization::build_date_window(args)?;
    if !window.is_unbounded() {
        info!("Authored-date window: {:?} to {:?}", window.since, window.until);
    }

    let pipeline = Pipeline::new(scoring, &args.input, &args.output)
        .context("Failed to compile exclusion rules")?
        .with_aliases(aliases)
        .with_window(window);
    Ok(pipeline)
}

fn report_merge(summary: &MergeSummary, progress: &ProgressIndicator) {
    for table in &summary.missing_tables {
        progress.status(StatusType::Warning, &format!("Input table not found: {}", table));
    }
    if summary.skipped_rows > 0 {
        progress.status(
            StatusType::Warning,
            &format!("Skipped {} malformed row(s) in the raw tables", summary.skipped_rows),
        );
    }
    progress.status(
        StatusType::Success,
        &format!(
            "Merged {} developer(s), {} commit(s) ({} duplicate, {} excluded, {} outside window), {} file change(s), {} review(s)",
            summary.developers,
            summary.commits,
            summary.duplicate_commits,
            summary.excluded_commits,
            summary.out_of_window_commits,
            summary.file_changes,
            summary.reviews
        ),
    );
}

/// Run the selected stages in pipeline order. Returns the final scores when
/// the score stage ran.
pub fn run_stages(
    pipeline: &Pipeline<'_>,
    plan: &StagePlan,
    progress: &ProgressIndicator,
) -> Result<Option<Vec<FinalScore>>> {
    let mut tables: Option<ProcessedTables> = None;
    let mut results = None;

    for stage in plan.stages() {
        debug!("Running stage: {}", stage);
        match stage {
            Stage::Merge => {
                progress.status(StatusType::Info, &format!("Merging tables from {}", pipeline.input_dir().display()));
                let summary = pipeline.process_all().context("Merge stage failed")?;
                report_merge(&summary, progress);
            }
            Stage::Analyze(dimension) => {
                if tables.is_none() {
                    tables = Some(
                        ProcessedTables::load(pipeline.output_dir())
                            .context("Failed to load processed tables")?,
                    );
                }
                let Some(loaded) = tables.as_ref() else { continue };
                if loaded.developers.is_empty() {
                    warn!("No developers in {}; run the merge stage first", pipeline.output_dir().display());
                }
                let summary = pipeline
                    .run_analyzer(*dimension, loaded)
                    .with_context(|| format!("Stage '{}' failed", stage))?;
                progress.status(
                    StatusType::Success,
                    &format!(
                        "{}: {} of {} developer(s) with data",
                        dimension.label(),
                        summary.available,
                        summary.developers
                    ),
                );
            }
            Stage::Score => {
                let scores = pipeline.run_score().context("Score stage failed")?;
                progress.status(
                    StatusType::Success,
                    &format!("Scored {} developer(s)", scores.len()),
                );
                results = Some(scores);
            }
        }
    }

    Ok(results)
}

/// Show final results as text or JSON on stdout
pub fn display_results(args: &cli::Args, results: &[FinalScore], colour_manager: &display::ColourManager) -> Result<()> {
    let distribution = grade_distribution(results);

    let selected = match &args.user {
        Some(query) => Some(
            find_developer(results, query)
                .ok_or_else(|| anyhow::anyhow!("Developer '{}' not found in the final scores", query))?,
        ),
        None => None,
    };

    if args.json_output() {
        let value = match selected {
            Some((_, result)) => developer_json(result),
            None => results_json(results, &distribution, args.limit),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if let Some((rank, result)) = selected {
        print!("{}", format_developer_report(result, rank, results.len(), colour_manager));
        return Ok(());
    }

    if results.is_empty() {
        println!("No developers to score.");
        return Ok(());
    }

    println!("{}", colour_manager.highlight("Developer scores:"));
    print!("{}", format_results_table(results, args.limit));
    println!();
    println!("{}", colour_manager.highlight("Grade distribution:"));
    print!("{}", format_grade_distribution(&distribution, colour_manager));
    Ok(())
}

/// Options that the planned stages will not read
fn ignored_option_warnings(args: &cli::Args, plan: &StagePlan) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if args.user.is_some() && !plan.contains(Stage::Score) {
        warnings.push("--user only applies when the score stage runs");
    }
    if !plan.contains(Stage::Merge) {
        if args.since.is_some() || args.until.is_some() {
            warnings.push("--since/--until only apply when the merge stage runs; cached tables are used as merged");
        }
        if !args.alias.is_empty() {
            warnings.push("--alias only applies when the merge stage runs; cached tables are used as merged");
        }
    }
    warnings
}

/// Run the stages named on the command line and display the results
pub fn run_pipeline(
    args: &cli::Args,
    config_manager: &config::ConfigManager,
    scoring: &ScoringConfig,
    progress: &ProgressIndicator,
) -> Result<()> {
    let plan = StagePlan::parse(&args.stages)?;
    let pipeline = build_pipeline(args, config_manager, scoring)?;

    for message in ignored_option_warnings(args, &plan) {
        warn!("{}", message);
    }

    match run_stages(&pipeline, &plan, progress)? {
        Some(results) => display_results(args, &results, progress.colours()),
        None => Ok(()),
    }
}
