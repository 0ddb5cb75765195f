//! Application initialization and configuration

use anyhow::{Context, Result};
use log::{debug, info};
use crate::cli::date_parser::parse_date;
use crate::cli::enhanced_parser::parse_alias_pairs;
use crate::data::merger::{AliasMap, DateWindow};
use crate::settings::ScoringConfig;
use crate::{cli, config, display, logging};

pub fn load_configuration(args: &cli::Args) -> Result<config::ConfigManager> {
    let mut manager = if let Some(config_file) = &args.config_file {
        debug!("Loading configuration from explicit file: {}", config_file.display());
        config::ConfigManager::load_from_file(config_file.clone())?
    } else {
        config::ConfigManager::load()?
    };

    if let Some(section_name) = &args.config_name {
        manager.select_section(section_name.clone());
    }

    Ok(manager)
}

/// Handle configuration export command
pub fn handle_export_config(config_manager: &config::ConfigManager, export_path: &std::path::Path) -> Result<()> {
    info!("Exporting configuration to: {}", export_path.display());

    let config_content = config_manager.export_complete_config()?;

    std::fs::write(export_path, config_content)
        .with_context(|| format!("Failed to write configuration to {}", export_path.display()))?;

    println!("Configuration exported to: {}", export_path.display());
    Ok(())
}

pub fn configure_logging(args: &cli::Args, config: &config::ConfigManager) -> Result<logging::LogConfig> {
    use log::LevelFilter;
    use std::str::FromStr;

    let console_level = if args.debug {
        LevelFilter::Trace
    } else if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Error
    } else {
        config.get_log_level("base", "console-level")?.unwrap_or(LevelFilter::Info)
    };

    let format = if !args.log_format.eq_ignore_ascii_case("text") {
        logging::LogFormat::from_str(&args.log_format).map_err(|e| anyhow::anyhow!(e))?
    } else {
        match config.get_value("base", "log-format") {
            Some(format_str) => logging::LogFormat::from_str(format_str).map_err(|e| anyhow::anyhow!(e))?,
            None => logging::LogFormat::Text,
        }
    };

    let log_file_path = args.log_file.clone()
        .or_else(|| config.get_path("base", "log-file"));

    let file_log_level = match &args.log_file_level {
        Some(level_str) => Some(logging::parse_log_level(level_str)?),
        None => config.get_log_level("base", "file-log-level")?,
    };

    let (destination, file_level) = match (log_file_path, file_log_level) {
        (Some(file_path), level) => {
            // Without an explicit file level the file mirrors the console
            (logging::LogDestination::Both(file_path), Some(level.unwrap_or(console_level)))
        }
        (None, None) => (logging::LogDestination::Console, None),
        (None, Some(_)) => {
            return Err(anyhow::anyhow!("file-log-level is set but no log file is configured"));
        }
    };

    // Precedence: --no-color > --color > config file > terminal detection
    let enable_colours = if args.no_color {
        false
    } else {
        let mut colour_config = config.get_colour_config()?;
        if args.color {
            colour_config.set_color_forced(true);
        }
        colour_config.should_use_colours() && std::io::IsTerminal::is_terminal(&std::io::stderr())
    };

    Ok(logging::LogConfig {
        console_level,
        file_level,
        format,
        destination,
        enable_colours,
    })
}

/// Create a ColourManager from CLI arguments and configuration file
pub fn create_colour_manager(args: &cli::Args, config: &config::ConfigManager) -> display::ColourManager {
    let colour_config = config.get_colour_config().ok();
    display::ColourManager::from_color_args(args.no_color, args.color, colour_config)
}

/// Scoring configuration, validated; any error is fatal before a stage runs
pub fn load_scoring_config(config: &config::ConfigManager) -> Result<ScoringConfig> {
    let scoring = config.get_scoring_config()
        .context("Invalid scoring configuration")?;
    debug!("Scoring weights: {:?}", scoring.weights);
    Ok(scoring)
}

/// Aliases from the `[aliases]` section, then `--alias` (which wins)
pub fn build_alias_map(args: &cli::Args, config: &config::ConfigManager) -> Result<AliasMap> {
    let mut aliases = config.get_aliases();
    for (alias, canonical) in parse_alias_pairs(&args.alias).map_err(|e| anyhow::anyhow!(e))? {
        aliases.insert(&alias, &canonical);
    }
    if !aliases.is_empty() {
        info!("Using {} identity alias(es)", aliases.len());
    }
    Ok(aliases)
}

pub fn build_date_window(args: &cli::Args) -> Result<DateWindow> {
    let since = args.since.as_deref().map(parse_date).transpose()?;
    let until = args.until.as_deref().map(parse_date).transpose()?;
    Ok(DateWindow::new(since, until))
}
