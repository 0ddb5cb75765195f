//! Core colour management for CLI output
//!
//! Provides colour support with terminal compatibility, NO_COLOR compliance,
//! and graceful degradation for non-colour terminals.

use colored::{Color, ColoredString, Colorize};

use super::config::{ColourConfig, ColourPalette};
use crate::scoring::Grade;
use crate::settings::GradingConfig;

/// Manages colour output for the CLI application
#[derive(Debug, Clone)]
pub struct ColourManager {
    config: ColourConfig,
    palette: ColourPalette,
    enabled: bool,
}

impl ColourManager {
    pub fn new() -> Self {
        Self::with_config(ColourConfig::default())
    }

    /// Create a ColourManager with explicit colour control
    pub fn with_colours(enabled: bool) -> Self {
        let mut config = ColourConfig::default();
        config.set_enabled(enabled);
        if enabled {
            config.set_color_forced(true);
        }
        Self::with_config(config)
    }

    pub fn with_config(config: ColourConfig) -> Self {
        let palette = config.get_palette();
        let enabled = config.should_use_colours();
        Self { config, palette, enabled }
    }

    /// Precedence: --no-color > --color > config file > terminal detection
    pub fn from_color_args(no_color: bool, color: bool, config: Option<ColourConfig>) -> Self {
        let mut final_config = config.unwrap_or_default();

        if no_color {
            final_config.set_enabled(false);
        } else if color {
            final_config.set_enabled(true);
            final_config.set_color_forced(true);
        }

        Self::with_config(final_config)
    }

    pub fn colours_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &ColourConfig {
        &self.config
    }

    pub fn error(&self, text: &str) -> ColoredString {
        self.paint(text, self.palette.error)
    }

    pub fn warning(&self, text: &str) -> ColoredString {
        self.paint(text, self.palette.warning)
    }

    pub fn info(&self, text: &str) -> ColoredString {
        self.paint(text, self.palette.info)
    }

    pub fn muted(&self, text: &str) -> ColoredString {
        self.paint(text, self.palette.muted)
    }

    pub fn success(&self, text: &str) -> ColoredString {
        self.paint(text, self.palette.success)
    }

    pub fn highlight(&self, text: &str) -> ColoredString {
        self.paint(text, self.palette.highlight)
    }

    pub fn grade(&self, text: &str, grade: Grade) -> ColoredString {
        let color = match grade {
            Grade::Senior => self.palette.senior,
            Grade::Mid => self.palette.mid,
            Grade::Junior => self.palette.junior,
        };
        self.paint(text, color)
    }

    /// Colour a 0-10 score in its grade band, using the default grade cutoffs
    pub fn score(&self, score: f64) -> ColoredString {
        let band = Grade::for_score(score, &GradingConfig::default());
        self.grade(&format!("{:.2}", score), band)
    }

    fn paint(&self, text: &str, color: Color) -> ColoredString {
        if !self.enabled {
            return text.normal();
        }
        text.color(color)
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::new()
    }
}
