//! Display module for colour management and status output
//!
//! Colour support and stage status lines for CLI output, NO_COLOR aware and
//! degrading to plain text when stdout is not a terminal.

pub mod colours;
pub mod config;
pub mod progress;

pub use colours::*;
pub use config::*;
pub use progress::*;
