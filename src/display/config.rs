//! Colour configuration and theme management
//!
//! Settings come from the `[colours]` configuration section and the
//! `--color`/`--no-color` flags.

use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;

use colored::Color;
use serde::{Deserialize, Serialize};

/// Colour configuration for the display system
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ColourConfig {
    /// Whether colours are enabled globally
    pub enabled: bool,
    pub theme: ColourTheme,
    /// Whether to respect NO_COLOR environment variable
    pub respect_no_color: bool,
    /// Force colours even when not in a TTY (--color flag)
    #[serde(skip, default)]
    pub color_forced: bool,
    /// Per-role colour overrides applied on top of the theme
    #[serde(skip, default)]
    pub overrides: Vec<(String, Color)>,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: ColourTheme::Auto,
            respect_no_color: true,
            color_forced: false,
            overrides: Vec::new(),
        }
    }
}

/// Available colour themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColourTheme {
    Auto,
    /// Optimised for light backgrounds
    Light,
    /// Optimised for dark backgrounds
    Dark,
}

impl FromStr for ColourTheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(ColourTheme::Auto),
            "light" => Ok(ColourTheme::Light),
            "dark" => Ok(ColourTheme::Dark),
            other => Err(format!("Invalid colour theme: {}. Valid themes: auto, light, dark", other)),
        }
    }
}

impl fmt::Display for ColourTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColourTheme::Auto => f.write_str("auto"),
            ColourTheme::Light => f.write_str("light"),
            ColourTheme::Dark => f.write_str("dark"),
        }
    }
}

/// Colours for message roles and the three grade bands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourPalette {
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub success: Color,
    pub muted: Color,
    pub highlight: Color,
    pub senior: Color,
    pub mid: Color,
    pub junior: Color,
}

/// Palette roles that `[colours]` may override by name
pub const PALETTE_ROLES: &[&str] = &["error", "warning", "info", "success", "muted", "highlight", "senior", "mid", "junior"];

impl ColourPalette {
    pub fn light() -> Self {
        Self {
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
            success: Color::Green,
            muted: Color::BrightBlack,
            highlight: Color::Magenta,
            senior: Color::Green,
            mid: Color::Yellow,
            junior: Color::Red,
        }
    }

    pub fn dark() -> Self {
        Self {
            error: Color::BrightRed,
            warning: Color::BrightYellow,
            info: Color::BrightBlue,
            success: Color::BrightGreen,
            muted: Color::BrightBlack,
            highlight: Color::BrightCyan,
            senior: Color::BrightGreen,
            mid: Color::BrightYellow,
            junior: Color::BrightRed,
        }
    }

    /// Replace one role's colour; false for an unknown role
    pub fn set_role(&mut self, role: &str, color: Color) -> bool {
        let slot = match role {
            "error" => &mut self.error,
            "warning" => &mut self.warning,
            "info" => &mut self.info,
            "success" => &mut self.success,
            "muted" => &mut self.muted,
            "highlight" => &mut self.highlight,
            "senior" => &mut self.senior,
            "mid" => &mut self.mid,
            "junior" => &mut self.junior,
            _ => return false,
        };
        *slot = color;
        true
    }

    /// Colour names as accepted by the `colored` crate ("red", "bright green", ...)
    pub fn parse_color(color_str: &str) -> Option<Color> {
        let name = color_str.trim().replace(['_', '-'], " ");
        if name.is_empty() {
            return None;
        }
        name.parse::<Color>().ok()
    }
}

impl ColourTheme {
    pub fn get_palette(&self) -> ColourPalette {
        match self {
            // No background detection; dark is the common terminal default
            ColourTheme::Auto | ColourTheme::Dark => ColourPalette::dark(),
            ColourTheme::Light => ColourPalette::light(),
        }
    }
}

impl ColourConfig {
    /// Create a colour configuration with colours disabled
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_theme(&mut self, theme: ColourTheme) {
        self.theme = theme;
    }

    pub fn set_respect_no_color(&mut self, respect: bool) {
        self.respect_no_color = respect;
    }

    /// Force colours to be enabled (--color flag)
    pub fn set_color_forced(&mut self, forced: bool) {
        self.color_forced = forced;
    }

    /// Check if colours should be enabled based on configuration and environment
    pub fn should_use_colours(&self) -> bool {
        if !self.enabled {
            return false;
        }

        // --color ignores TTY detection and NO_COLOR
        if self.color_forced {
            return true;
        }

        if self.respect_no_color && std::env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if !self.respect_no_color {
            return true;
        }

        std::io::stdout().is_terminal()
    }

    /// Override one palette role, e.g. `senior = "cyan"`
    pub fn set_role_colour(&mut self, role: &str, color: Color) {
        self.overrides.push((role.to_string(), color));
    }

    pub fn get_palette(&self) -> ColourPalette {
        let mut palette = self.theme.get_palette();
        for (role, color) in &self.overrides {
            palette.set_role(role, *color);
        }
        palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_colour_config() {
        let config = ColourConfig::default();
        assert!(config.enabled);
        assert_eq!(config.theme, ColourTheme::Auto);
        assert!(config.respect_no_color);
    }

    #[test]
    fn test_disabled_wins_over_forced() {
        let mut config = ColourConfig::disabled();
        config.set_color_forced(true);
        assert!(!config.should_use_colours());
    }

    #[test]
    fn test_forced_colours() {
        let mut config = ColourConfig::default();
        config.set_color_forced(true);
        assert!(config.should_use_colours());
    }

    #[test]
    fn test_theme_parsing_and_palettes() {
        assert_eq!("Light".parse::<ColourTheme>(), Ok(ColourTheme::Light));
        assert_eq!(" dark ".parse::<ColourTheme>(), Ok(ColourTheme::Dark));
        assert!("neon".parse::<ColourTheme>().is_err());

        assert_eq!(ColourTheme::Light.get_palette().senior, Color::Green);
        assert_eq!(ColourTheme::Auto.get_palette(), ColourPalette::dark());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(ColourPalette::parse_color("red"), Some(Color::Red));
        assert_eq!(ColourPalette::parse_color("Bright_Green"), Some(Color::BrightGreen));
        assert_eq!(ColourPalette::parse_color("bright-cyan"), Some(Color::BrightCyan));
        assert_eq!(ColourPalette::parse_color(""), None);
    }

    #[test]
    fn test_role_overrides() {
        let mut config = ColourConfig::default();
        config.set_theme(ColourTheme::Light);
        config.set_role_colour("junior", Color::Magenta);
        let palette = config.get_palette();
        assert_eq!(palette.junior, Color::Magenta);
        assert_eq!(palette.senior, Color::Green);
        let mut copy = palette;
        assert!(!copy.set_role("gold", Color::Yellow));
    }
}
