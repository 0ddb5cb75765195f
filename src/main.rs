use anyhow::Result;
use std::process;
use log::error;

use devscore::{app, cli, display, logging};

fn main() {
    if let Err(e) = run() {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();

    cli::validate_args(&args)?;

    let config_manager = app::load_configuration(&args)?;

    let log_config = app::configure_logging(&args, &config_manager)?;
    logging::init_logger(log_config)?;

    let colour_manager = app::create_colour_manager(&args, &config_manager);

    if args.list_stages {
        app::handle_list_stages(&colour_manager);
        return Ok(());
    }

    if let Some(export_path) = &args.export_config {
        return app::handle_export_config(&config_manager, export_path);
    }

    // A bad scoring configuration stops the run before any stage
    let scoring = app::load_scoring_config(&config_manager)?;

    if args.validate_config {
        app::handle_validate_config(&config_manager, &scoring, &colour_manager);
        return Ok(());
    }

    let progress = display::ProgressIndicator::new(colour_manager).quiet(args.quiet);
    app::run_pipeline(&args, &config_manager, &scoring, &progress)
}
