use clap::{Parser, ArgAction};
use anyhow::Result;
use std::path::PathBuf;
use log::{debug, info};

use super::date_parser::{parse_date, validate_date_range};
use super::enhanced_parser::{parse_alias_pairs, EnhancedParser};
use crate::pipeline::{StagePlan, DEFAULT_INPUT_DIR, DEFAULT_OUTPUT_DIR};

/// Developer Activity Scoring Tool
#[derive(Parser, Debug)]
#[command(name = "devscore")]
#[command(about = "Merges GitLab and git activity tables and grades developers across weighted quality dimensions")]
#[command(version)]
pub struct Args {
    /// Stages to run, in any order: merge, analyze, <analyzer>, score, all (default)
    #[arg(value_name = "STAGE")]
    pub stages: Vec<String>,

    /// Directory holding the raw collector tables
    #[arg(short = 'i', long = "input", value_name = "DIR", default_value = DEFAULT_INPUT_DIR)]
    pub input: PathBuf,

    /// Directory for the processed tables and score files
    #[arg(short = 'o', long = "output", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,

    /// Force coloured output even when not writing to a terminal
    #[arg(long, conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    // ============ FILTERING FLAGS ============

    /// Only merge commits authored on or after this date (ISO 8601 or relative like "3 months ago")
    #[arg(short = 'S', long = "since", visible_alias = "from", value_name = "DATE")]
    pub since: Option<String>,

    /// Only merge commits authored on or before this date (ISO 8601 or relative like "1 week ago")
    #[arg(short = 'U', long = "until", visible_alias = "to", value_name = "DATE")]
    pub until: Option<String>,

    /// Identity alias OLD_EMAIL=NEW_EMAIL - repeatable, supports comma-separated values
    #[arg(long = "alias", value_name = "OLD=NEW", action = ArgAction::Append)]
    pub alias: Vec<String>,

    // ============ RESULTS ============

    /// Show the detailed report for one developer (email, username or name)
    #[arg(short = 'u', long = "user", value_name = "USER")]
    pub user: Option<String>,

    /// Maximum number of developers shown in the results table
    #[arg(short = 'L', long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Result display format: text or json
    #[arg(long = "format", value_name = "FORMAT", default_value = "text")]
    pub format: String,

    // ============ UTILITY ============

    /// List the available stages and exit
    #[arg(long)]
    pub list_stages: bool,

    /// Validate the configuration and exit
    #[arg(long)]
    pub validate_config: bool,

    /// Write the complete effective configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    pub export_config: Option<PathBuf>,
}

impl Args {
    /// Apply enhanced parsing to vector fields that support comma-separated values
    pub fn apply_enhanced_parsing(mut self) -> Self {
        self.stages = EnhancedParser::parse_stages(self.stages);
        self.alias = EnhancedParser::parse_aliases(self.alias);
        self
    }

    /// Whether results go out as JSON
    pub fn json_output(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse().apply_enhanced_parsing();
    debug!("Parsed CLI arguments with enhanced parsing: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    match args.format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid output format '{}'. Valid options: text, json", args.format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if args.limit == Some(0) {
        return Err(anyhow::anyhow!("--limit must be at least 1"));
    }

    for date in [&args.since, &args.until].into_iter().flatten() {
        parse_date(date)?;
    }
    validate_date_range(args.since.as_deref(), args.until.as_deref())?;

    parse_alias_pairs(&args.alias).map_err(|e| anyhow::anyhow!(e))?;
    StagePlan::parse(&args.stages)?;

    info!("CLI arguments validated successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Create Args with default values for testing
    fn create_test_args() -> Args {
        Args {
            stages: Vec::new(),
            input: PathBuf::from(DEFAULT_INPUT_DIR),
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            verbose: false,
            quiet: false,
            debug: false,
            log_format: "text".to_string(),
            log_file: None,
            log_file_level: None,
            config_file: None,
            config_name: None,
            color: false,
            no_color: false,
            since: None,
            until: None,
            alias: Vec::new(),
            user: None,
            limit: None,
            format: "text".to_string(),
            list_stages: false,
            validate_config: false,
            export_config: None,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "devscore", "merge", "commit-quality,score", "-i", "raw", "--from", "2024-01-01",
            "--to", "2024-06-30", "--alias", "a@x.io=b@x.io,c@x.io=b@x.io", "-u", "alice", "-L", "5",
        ])
        .unwrap()
        .apply_enhanced_parsing();

        assert_eq!(args.stages, vec!["merge", "commit-quality", "score"]);
        assert_eq!(args.input, PathBuf::from("raw"));
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(args.since.as_deref(), Some("2024-01-01"));
        assert_eq!(args.until.as_deref(), Some("2024-06-30"));
        assert_eq!(args.alias.len(), 2);
        assert_eq!(args.user.as_deref(), Some("alice"));
        assert_eq!(args.limit, Some(5));
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_color_flags_conflict() {
        assert!(Args::try_parse_from(["devscore", "--color", "--no-color"]).is_err());
    }

    #[test]
    fn test_validate_args_success() {
        assert!(validate_args(&create_test_args()).is_ok());
    }

    #[test]
    fn test_validate_args_conflicting_flags() {
        let args = Args { verbose: true, quiet: true, ..create_test_args() };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_invalid_formats() {
        let args = Args { log_format: "xml".to_string(), ..create_test_args() };
        assert!(validate_args(&args).is_err());
        let args = Args { format: "csv".to_string(), ..create_test_args() };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_file_level_without_file() {
        let args = Args { log_file_level: Some("debug".to_string()), ..create_test_args() };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_dates() {
        let args = Args { since: Some("whenever".to_string()), ..create_test_args() };
        assert!(validate_args(&args).is_err());

        let args = Args {
            since: Some("2024-06-01".to_string()),
            until: Some("2024-01-01".to_string()),
            ..create_test_args()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_rejects_bad_alias_and_stage() {
        let args = Args { alias: vec!["nobody".to_string()], ..create_test_args() };
        assert!(validate_args(&args).is_err());

        let args = Args { stages: vec!["deploy".to_string()], ..create_test_args() };
        let err = validate_args(&args).unwrap_err();
        assert!(err.to_string().contains("deploy"));
    }

    #[test]
    fn test_validate_args_zero_limit() {
        let args = Args { limit: Some(0), ..create_test_args() };
        assert!(validate_args(&args).is_err());
    }
}
