//! Application orchestration module

pub mod initialization;
pub mod execution;

pub use initialization::{
    load_configuration,
    configure_logging,
    create_colour_manager,
    handle_export_config,
    load_scoring_config,
};
pub use execution::{
    handle_list_stages,
    handle_validate_config,
    run_pipeline,
};
