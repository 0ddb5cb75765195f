//! Output formatting and display module

pub mod reports;

pub use reports::{
    developer_json,
    find_developer,
    format_compact_table,
    format_developer_report,
    format_grade_distribution,
    format_results_table,
    results_json,
};
